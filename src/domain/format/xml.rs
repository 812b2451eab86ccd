//! XML format: `<preference id=".." value=".."/>` elements under a `<preferences>` root

use std::collections::BTreeMap;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::domain::error::{DomainError, DomainResult};

const ROOT: &[u8] = b"preferences";
const ENTRY: &[u8] = b"preference";

pub(super) fn encode(entries: &BTreeMap<String, String>) -> DomainResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("preferences")))
        .map_err(write_err)?;
    for (id, value) in entries {
        let mut element = BytesStart::new("preference");
        element.push_attribute(("id", id.as_str()));
        element.push_attribute(("value", value.as_str()));
        writer.write_event(Event::Empty(element)).map_err(write_err)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("preferences")))
        .map_err(write_err)?;

    let mut out = String::from_utf8(writer.into_inner()).map_err(|e| malformed(e.to_string()))?;
    out.push('\n');
    Ok(out)
}

pub(super) fn decode(content: &str) -> DomainResult<BTreeMap<String, String>> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut entries = BTreeMap::new();
    let mut seen_root = false;
    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if depth == 0 {
                    check_root(e)?;
                    seen_root = true;
                } else if e.name().as_ref() == ENTRY {
                    let (id, value) = parse_entry(e)?;
                    entries.insert(id, value);
                }
                depth += 1;
            }
            Ok(Event::Empty(ref e)) => {
                if depth == 0 {
                    check_root(e)?;
                    seen_root = true;
                } else if e.name().as_ref() == ENTRY {
                    let (id, value) = parse_entry(e)?;
                    entries.insert(id, value);
                }
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(malformed(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(malformed("missing <preferences> root element".to_string()));
    }
    Ok(entries)
}

fn check_root(e: &BytesStart) -> DomainResult<()> {
    if e.name().as_ref() == ROOT {
        Ok(())
    } else {
        Err(malformed(format!(
            "unexpected root element <{}>",
            String::from_utf8_lossy(e.name().as_ref())
        )))
    }
}

fn parse_entry(e: &BytesStart) -> DomainResult<(String, String)> {
    let mut id = None;
    let mut value = None;

    for attr in e.attributes() {
        let attr = attr.map_err(|e| malformed(format!("attribute error: {e}")))?;
        let text = attr
            .unescape_value()
            .map_err(|e| malformed(format!("attribute error: {e}")))?
            .into_owned();
        match attr.key.as_ref() {
            b"id" => id = Some(text),
            b"value" => value = Some(text),
            _ => {}
        }
    }

    match (id, value) {
        (Some(id), Some(value)) => Ok((id, value)),
        (Some(id), None) => Err(malformed(format!("preference {id:?} missing value attribute"))),
        _ => Err(malformed("preference missing id attribute".to_string())),
    }
}

fn write_err(e: quick_xml::Error) -> DomainError {
    malformed(format!("write failed: {e}"))
}

fn malformed(message: String) -> DomainError {
    DomainError::MalformedStore {
        format: "xml",
        message,
    }
}
