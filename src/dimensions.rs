//! Dimension Extractor - Pixel Sizes from Rendered SVG
//!
//! Embedded figures carry explicit width/height so the browser can reserve
//! space before the image arrives. A figure without known dimensions is an
//! error, never a guessed default.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CSS pixels per PostScript point (96 dpi over 72 dpi).
pub const PX_PER_PT: f64 = 96.0 / 72.0;

#[derive(Debug, Error, PartialEq)]
pub enum DimensionError {
    #[error("SVG has no root <svg> element")]
    MissingRoot,

    #[error("Root <svg> element found <{0}> instead")]
    UnexpectedRoot(String),

    #[error("Root <svg> has no `{0}` attribute")]
    MissingAttribute(&'static str),

    #[error("Invalid `{attribute}` value `{value}`")]
    InvalidLength { attribute: &'static str, value: String },

    #[error("Unparsable SVG: {0}")]
    Xml(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Unitless,
    Pt,
    Px,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Length {
    value: f64,
    unit: Unit,
}

impl Length {
    fn parse(attribute: &'static str, raw: &str) -> Result<Self, DimensionError> {
        let invalid = || DimensionError::InvalidLength {
            attribute,
            value: raw.to_string(),
        };
        let trimmed = raw.trim();
        let (number, unit) = if let Some(n) = trimmed.strip_suffix("pt") {
            (n, Unit::Pt)
        } else if let Some(n) = trimmed.strip_suffix("px") {
            (n, Unit::Px)
        } else {
            (trimmed, Unit::Unitless)
        };
        let value: f64 = number.trim_end().parse().map_err(|_| invalid())?;
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid());
        }
        Ok(Self { value, unit })
    }

    /// Unitless lengths from the LaTeX toolchain are big points too.
    fn to_pixels(self) -> f64 {
        match self.unit {
            Unit::Pt | Unit::Unitless => self.value * PX_PER_PT,
            Unit::Px => self.value,
        }
    }
}

fn round_px(value: f64) -> u32 {
    value.round().max(1.0) as u32
}

/// Width and height of a rendered formula, converted to whole pixels.
pub fn extract_pixel_size(svg: &[u8]) -> Result<PixelSize, DimensionError> {
    let (w, h) = root_lengths(svg)?;
    Ok(PixelSize {
        width: round_px(w.to_pixels()),
        height: round_px(h.to_pixels()),
    })
}

/// Width and height exactly as declared, unit suffix dropped.
///
/// Charts come out of the plotting step already sized in pixels.
pub fn declared_size(svg: &[u8]) -> Result<PixelSize, DimensionError> {
    let (w, h) = root_lengths(svg)?;
    Ok(PixelSize {
        width: round_px(w.value),
        height: round_px(h.value),
    })
}

fn root_lengths(svg: &[u8]) -> Result<(Length, Length), DimensionError> {
    let mut reader = Reader::from_reader(svg);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => return lengths_of(&e),
            Ok(Event::Eof) => return Err(DimensionError::MissingRoot),
            Ok(_) => continue,
            Err(e) => return Err(DimensionError::Xml(e.to_string())),
        }
    }
}

fn lengths_of(root: &BytesStart<'_>) -> Result<(Length, Length), DimensionError> {
    let name = root.local_name();
    if name.as_ref() != b"svg" {
        return Err(DimensionError::UnexpectedRoot(
            String::from_utf8_lossy(name.as_ref()).into_owned(),
        ));
    }
    let width = Length::parse("width", &attribute(root, "width")?)?;
    let height = Length::parse("height", &attribute(root, "height")?)?;
    Ok((width, height))
}

fn attribute(root: &BytesStart<'_>, key: &'static str) -> Result<String, DimensionError> {
    let attr = root
        .try_get_attribute(key)
        .map_err(|e| DimensionError::Xml(e.to_string()))?
        .ok_or(DimensionError::MissingAttribute(key))?;
    Ok(String::from_utf8_lossy(&attr.value).into_owned())
}
