//! texfig - LaTeX Figures for a Static Blog
//!
//! Formula blocks are rendered to SVG by an external toolchain once, stored
//! next to the page under a name derived from their normalized source, and
//! embedded with explicit pixel dimensions.
//!
//! # Guarantees
//! 1. Same normalized source, same file name
//! 2. An existing file is never re-rendered
//! 3. A failed render leaves no file behind
//! 4. Every emitted image carries its width and height

pub mod assets;
pub mod cache;
pub mod config;
pub mod dimensions;
pub mod hashing;
pub mod inline;
pub mod markup;
pub mod pipeline;
pub mod render;
pub mod tag;
pub mod templates;

pub use assets::{AssetLayout, Page, StaticFile, StaticFileRegistry, StaticFiles};
pub use cache::{ArtifactCache, ArtifactKey, CacheError, CachedArtifact};
pub use config::{ConfigError, SiteConfig};
pub use dimensions::{declared_size, extract_pixel_size, DimensionError, PixelSize, PX_PER_PT};
pub use hashing::{fingerprint, fingerprint_source, normalize, Fingerprint, Normalized};
pub use markup::{emit, emit_chart};
pub use pipeline::{FigurePipeline, FormulaBlock, PipelineError, RenderedFigure};
pub use render::{CommandInvoker, RenderError, RenderInvoker, RenderOptions};
pub use tag::{FigureIndex, FigureTag, TagError};
pub use templates::{PreambleRegistry, PreambleTemplate, PreambleVariant};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
