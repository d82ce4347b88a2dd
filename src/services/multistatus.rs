//! WebDAV multi-status parsing.
//!
//! Element names are matched on their local part, so `d:response`, `D:response` and
//! an unprefixed `response` are treated alike.

use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::RemoteEntry;

static OK_STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s200\s").expect("static regex is valid"));

#[derive(Default)]
struct PropStat {
    status: String,
    is_collection: bool,
}

#[derive(Default)]
struct ResponseBuilder {
    href: String,
    propstats: Vec<PropStat>,
}

impl ResponseBuilder {
    /// The first propstat reporting `200`, else the first one.
    fn finish(self) -> Option<RemoteEntry> {
        let href = self.href.trim().to_string();
        if href.is_empty() {
            return None;
        }

        let chosen = self
            .propstats
            .iter()
            .find(|p| OK_STATUS.is_match(&format!(" {} ", p.status.trim())))
            .or_else(|| self.propstats.first());

        Some(RemoteEntry {
            href,
            is_collection: chosen.is_some_and(|p| p.is_collection),
        })
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

/// Parse a `207 Multi-Status` body into listing entries, in document order.
pub fn parse_multistatus(source_url: &str, xml: &str) -> Result<Vec<RemoteEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut response: Option<ResponseBuilder> = None;
    let mut propstat: Option<PropStat> = None;
    let mut entries = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| AppError::xml(source_url, e))?;

        match event {
            Event::Start(e) => {
                let name = local_name(&e);
                match name.as_str() {
                    "response" if response.is_none() => {
                        response = Some(ResponseBuilder::default());
                    }
                    "propstat" if response.is_some() => {
                        propstat = Some(PropStat::default());
                    }
                    _ => mark_collection(&name, &stack, propstat.as_mut()),
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                let name = local_name(&e);
                mark_collection(&name, &stack, propstat.as_mut());
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| AppError::xml(source_url, e))?;
                match (stack.last().map(String::as_str), response.as_mut()) {
                    (Some("href"), Some(r)) if propstat.is_none() => r.href.push_str(&text),
                    (Some("status"), Some(_)) => {
                        if let Some(p) = propstat.as_mut() {
                            p.status.push_str(&text);
                        }
                    }
                    _ => {}
                }
            }
            Event::End(_) => {
                let Some(name) = stack.pop() else {
                    continue;
                };
                match name.as_str() {
                    "propstat" => {
                        if let (Some(p), Some(r)) = (propstat.take(), response.as_mut()) {
                            r.propstats.push(p);
                        }
                    }
                    "response" => {
                        if let Some(entry) = response.take().and_then(ResponseBuilder::finish) {
                            entries.push(entry);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

fn mark_collection(name: &str, stack: &[String], propstat: Option<&mut PropStat>) {
    if name != "collection" {
        return;
    }
    if let Some(p) = propstat {
        if stack.iter().any(|s| s == "resourcetype") {
            p.is_collection = true;
        }
    }
}
