//! Inline Embedding - SVG and Data URIs Pasted Straight into a Page

use base64::Engine;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InlineError {
    #[error("Unparsable SVG: {0}")]
    Xml(String),
}

/// SVG markup ready to be pasted into HTML more than once: the XML
/// declaration is dropped and so is every `id` attribute.
pub fn inline_svg(svg: &[u8]) -> Result<String, InlineError> {
    let mut reader = Reader::from_reader(svg);
    let mut writer = Writer::new(Vec::with_capacity(svg.len()));

    loop {
        let event = reader.read_event().map_err(|e| InlineError::Xml(e.to_string()))?;
        let event = match event {
            Event::Eof => break,
            Event::Decl(_) => continue,
            Event::Start(e) => Event::Start(without_ids(&e)?),
            Event::Empty(e) => Event::Empty(without_ids(&e)?),
            other => other,
        };
        writer
            .write_event(event)
            .map_err(|e| InlineError::Xml(e.to_string()))?;
    }

    let out = writer.into_inner();
    Ok(String::from_utf8_lossy(&out).trim().to_string())
}

fn without_ids<'a>(elem: &BytesStart<'a>) -> Result<BytesStart<'a>, InlineError> {
    let mut stripped = elem.clone();
    stripped.clear_attributes();
    for attr in elem.attributes() {
        let attr = attr.map_err(|e| InlineError::Xml(e.to_string()))?;
        if attr.key.as_ref() != b"id" {
            stripped.push_attribute(attr);
        }
    }
    Ok(stripped)
}

/// `data:<mime>;base64,<payload>`
pub fn data_uri(data: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    format!("data:{};base64,{}", sniff_mime(data), encoded)
}

/// Media type from leading magic bytes.
fn sniff_mime(data: &[u8]) -> &'static str {
    match data {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        [b'w', b'O', b'F', b'2', ..] => "font/woff2",
        [b'w', b'O', b'F', b'F', ..] => "font/woff",
        _ if looks_like_svg(data) => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn looks_like_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(512)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}
