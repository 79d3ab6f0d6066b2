//! Figure Tag Options
//!
//! Grammar of the argument a page passes with each formula block:
//!
//! ```text
//! tag     = [ variant SP+ ] "fig-" digit digit
//! variant = digit
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::templates::PreambleVariant;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagError {
    #[error("Invalid figure tag `{0}`: expected `[<variant> ]fig-NN`")]
    Malformed(String),

    #[error("Invalid figure index `{0}`: expected two digits")]
    InvalidIndex(String),
}

/// Page-local figure number, 0..=99.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FigureIndex(u8);

impl FigureIndex {
    pub fn new(value: u8) -> Result<Self, TagError> {
        if value > 99 {
            return Err(TagError::InvalidIndex(value.to_string()));
        }
        Ok(Self(value))
    }

    /// Parse exactly two ASCII digits, e.g. `"01"`.
    pub fn parse(digits: &str) -> Result<Self, TagError> {
        if digits.len() != 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TagError::InvalidIndex(digits.to_string()));
        }
        digits
            .parse()
            .map(Self)
            .map_err(|_| TagError::InvalidIndex(digits.to_string()))
    }

    /// Recover the index from an asset name like `fig-03-histogram.svg`.
    ///
    /// Names that do not follow the scheme map to figure 0.
    pub fn from_file_name(name: &str) -> Self {
        name.strip_prefix("fig-")
            .filter(|_| name.ends_with(".svg"))
            .and_then(|rest| rest.get(..2))
            .and_then(|digits| Self::parse(digits).ok())
            .unwrap_or(Self(0))
    }

    /// Human figure number used in labels (no leading zero).
    pub fn number(self) -> u8 {
        self.0
    }
}

impl fmt::Display for FigureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Options attached to one formula block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureTag {
    pub variant: PreambleVariant,
    pub figure: FigureIndex,
}

impl FigureTag {
    pub fn parse(input: &str) -> Result<Self, TagError> {
        let malformed = || TagError::Malformed(input.to_string());
        let trimmed = input.trim();

        let (variant, fig) = match trimmed.split_once(char::is_whitespace) {
            Some((variant, rest)) => {
                let variant = match variant.as_bytes() {
                    [d] if d.is_ascii_digit() => d - b'0',
                    _ => return Err(malformed()),
                };
                (variant, rest.trim_start())
            }
            None => (0, trimmed),
        };

        let digits = fig.strip_prefix("fig-").ok_or_else(malformed)?;
        let figure = FigureIndex::parse(digits).map_err(|_| malformed())?;
        Ok(Self { variant, figure })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_figure_only() {
        let tag = FigureTag::parse("fig-07").unwrap();
        assert_eq!(tag.variant, 0);
        assert_eq!(tag.figure.to_string(), "07");
        assert_eq!(tag.figure.number(), 7);
    }

    #[test]
    fn test_parse_variant_and_figure() {
        let tag = FigureTag::parse("  1   fig-12 ").unwrap();
        assert_eq!(tag.variant, 1);
        assert_eq!(tag.figure.number(), 12);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "fig-1", "fig-123", "figure-01", "12 fig-01", "a fig-01", "1 fig-01 x", "fig-0a"] {
            assert!(FigureTag::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_index_bounds() {
        assert!(FigureIndex::new(99).is_ok());
        assert!(FigureIndex::new(100).is_err());
        assert_eq!(FigureIndex::new(3).unwrap().to_string(), "03");
    }

    #[test]
    fn test_index_from_file_name() {
        assert_eq!(FigureIndex::from_file_name("fig-04-chart.svg").number(), 4);
        assert_eq!(FigureIndex::from_file_name("fig-10.svg").number(), 10);
        assert_eq!(FigureIndex::from_file_name("chart.svg").number(), 0);
        assert_eq!(FigureIndex::from_file_name("fig-04-chart.png").number(), 0);
    }
}
