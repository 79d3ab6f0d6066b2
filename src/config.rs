//! Site Configuration
//!
//! ```toml
//! [render]
//! command = "latex2svg"
//! args = ["--quiet"]
//! font_flag = "--font"
//! font = "newcm"
//!
//! [assets]
//! root = "_assets"
//!
//! [[preamble]]
//! variant = 2
//! prologue = '''
//!     \documentclass[preview]{standalone}
//!     \usepackage{tikz}
//!     \begin{document}
//! '''
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::assets::AssetLayout;
use crate::templates::{PreambleRegistry, PreambleTemplate};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub command: String,
    pub args: Vec<String>,
    pub font_flag: String,
    pub font: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            command: "latex2svg".to_string(),
            args: vec![],
            font_flag: "--font".to_string(),
            font: "newcm".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub render: RenderConfig,
    pub assets: AssetLayout,
    #[serde(rename = "preamble")]
    pub preambles: Vec<PreambleTemplate>,
}

impl SiteConfig {
    /// Load from `path`; a missing file means all defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Built-in preambles with the configured ones layered on top.
    pub fn preamble_registry(&self) -> PreambleRegistry {
        let mut registry = PreambleRegistry::builtin();
        for template in &self.preambles {
            registry.register(template.clone());
        }
        registry
    }
}
