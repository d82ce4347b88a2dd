//! Pipeline entry points.
//!
//! - `run_fetch`: Mirror the remote posts tree locally
//! - `run_generate`: Validate posts and publish the content index
//! - `run_pipeline`: Fetch, then generate
//! - `run_check` / `check_remote`: Dry runs against local posts and the server

pub mod fetch;
pub mod frontmatter;
pub mod generate;
pub mod pipeline;
pub mod validate;

pub use fetch::{check_remote, fetch_posts, run_fetch};
pub use frontmatter::strip_front_matter;
pub use generate::{generate_content, index_posts, run_check, run_generate};
pub use pipeline::run_pipeline;
