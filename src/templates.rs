//! Preamble Templates - Document Wrappers for Formula Bodies

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type PreambleVariant = u8;

/// A document wrapper selected per formula block.
///
/// The rendered document is `prologue`, then the formula body, then `epilogue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreambleTemplate {
    pub variant: PreambleVariant,
    pub prologue: String,
    #[serde(default = "default_epilogue")]
    pub epilogue: String,
}

fn default_epilogue() -> String {
    "\\end{document}".to_string()
}

const AMS_PROLOGUE: &str = r"
    \documentclass[preview]{standalone}
    \usepackage{amsmath}
    \usepackage{amssymb}
    \begin{document}
";

const AMS_PHYSICS_PROLOGUE: &str = r"
    \documentclass[preview]{standalone}
    \usepackage{amsmath}
    \usepackage{amssymb}
    \usepackage{bm}
    \usepackage{physics}
    \newcommand{\E}{\operatorname{E}}
    \newcommand{\Var}{\operatorname{Var}}
    \begin{document}
";

/// Template registry - built-in variants plus site overrides
#[derive(Debug, Clone)]
pub struct PreambleRegistry {
    templates: BTreeMap<PreambleVariant, PreambleTemplate>,
}

impl PreambleRegistry {
    pub fn new() -> Self {
        Self { templates: BTreeMap::new() }
    }

    /// Variants every site gets: 0 is plain AMS math, 1 adds bold vectors
    /// and physics helpers.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(PreambleTemplate {
            variant: 0,
            prologue: AMS_PROLOGUE.to_string(),
            epilogue: default_epilogue(),
        });
        registry.register(PreambleTemplate {
            variant: 1,
            prologue: AMS_PHYSICS_PROLOGUE.to_string(),
            epilogue: default_epilogue(),
        });
        registry
    }

    pub fn get(&self, variant: PreambleVariant) -> Option<&PreambleTemplate> {
        self.templates.get(&variant)
    }

    pub fn list(&self) -> Vec<&PreambleTemplate> {
        self.templates.values().collect()
    }

    /// Add a template, replacing any existing one with the same variant.
    pub fn register(&mut self, template: PreambleTemplate) {
        self.templates.insert(template.variant, template);
    }
}

impl Default for PreambleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
