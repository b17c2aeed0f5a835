//! `content.xml` descriptors shipped inside X4 extension folders.
//!
//! The descriptor is optional: a folder without one is still a mod, it just
//! has no display metadata.

use anyhow::{Context, Result, bail};
use log::warn;
use quick_xml::{Reader, events::Event};
use serde::Serialize;
use std::path::Path;

use crate::runtime::Runtime;

pub const DESCRIPTOR_FILE: &str = "content.xml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModInfo {
    pub id: String,
    pub name: String,
    pub author: String,
    pub version: String,
    pub description: String,
    pub date: String,
    pub enabled: bool,
}

/// Parse the attributes of the root `<content>` element.
pub fn parse_content_xml(xml: &str) -> Result<ModInfo> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event().context("parse content.xml")? {
            Event::Start(e) | Event::Empty(e) => {
                if e.name().as_ref() != b"content" {
                    bail!(
                        "unexpected root element <{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    );
                }
                let value = |key: &[u8], default: &str| {
                    attr_value(&e, key).unwrap_or_else(|| default.to_string())
                };
                return Ok(ModInfo {
                    id: value(b"id", "unknown"),
                    name: value(b"name", "Unknown Mod"),
                    author: value(b"author", "Unknown"),
                    version: value(b"version", "0"),
                    description: value(b"description", ""),
                    date: value(b"date", ""),
                    enabled: value(b"enabled", "1") == "1",
                });
            }
            Event::Eof => bail!("content.xml has no <content> element"),
            _ => {}
        }
    }
}

/// Read `<mod_dir>/content.xml` if present. Parse failures are logged and ignored.
#[tracing::instrument(skip(runtime))]
pub fn load_mod_info<R: Runtime>(runtime: &R, mod_dir: &Path) -> Option<ModInfo> {
    let descriptor = mod_dir.join(DESCRIPTOR_FILE);
    if !runtime.exists(&descriptor) {
        return None;
    }

    let parsed = runtime
        .read_to_string(&descriptor)
        .and_then(|raw| parse_content_xml(&raw));
    match parsed {
        Ok(info) => Some(info),
        Err(e) => {
            warn!("Ignoring {}: {:#}", descriptor.display(), e);
            None
        }
    }
}

fn attr_value(e: &quick_xml::events::BytesStart<'_>, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            if let Ok(value) = attr.unescape_value() {
                return Some(value.to_string());
            }
        }
    }
    None
}
