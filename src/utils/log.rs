// src/utils/log.rs

//! Progress output helpers with server-style formatting.
//!
//! These sit on top of the `log` facade, so whatever logger the binary installs
//! decides where the lines go and which levels are shown.

const RULE_WIDTH: usize = 60;

/// Log a warning line
pub fn warn(message: &str) {
    log::warn!("{message}");
}

/// Log a header
pub fn header(title: &str) {
    let border = "═".repeat(RULE_WIDTH);
    log::info!("{border}");
    log::info!("  {title}");
    log::info!("{border}");
}

/// Log a step in a process
pub fn step(step_num: usize, total: usize, message: &str) {
    log::info!("[STEP {step_num}/{total}] {message}");
}

/// Log a success message
pub fn success(message: &str) {
    log::info!("✓ {message}");
}

/// Log a sub-item (indented)
pub fn sub_item(message: &str) {
    log::info!("    {message}");
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    log::info!("[SUMMARY] {title}");
    for (key, value) in items {
        log::info!("    {key}: {value}");
    }
}

