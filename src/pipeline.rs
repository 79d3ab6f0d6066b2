//! Figure Pipeline - Single Entry Point per Build
//!
//! formula text -> fingerprint -> cache (render on miss) -> dimensions -> markup
//!
//! One pipeline lives for one build and is handed every formula block in
//! page order. Any error aborts the build: no partially-correct markup.

use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::assets::{AssetLayout, Page, StaticFileRegistry};
use crate::cache::{ArtifactCache, CacheError, CachedArtifact};
use crate::config::{ConfigError, SiteConfig};
use crate::dimensions::{declared_size, extract_pixel_size, DimensionError, PixelSize};
use crate::hashing::fingerprint_source;
use crate::inline::{data_uri, inline_svg, InlineError};
use crate::markup::{emit, emit_chart};
use crate::render::{render, CommandInvoker, RenderError, RenderInvoker, RenderOptions};
use crate::tag::{FigureIndex, FigureTag, TagError};
use crate::templates::{PreambleRegistry, PreambleVariant};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Tag(#[from] TagError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Malformed artifact {}: {source}", path.display())]
    MalformedArtifact {
        path: PathBuf,
        #[source]
        source: DimensionError,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Inline(#[from] InlineError),
}

impl PipelineError {
    /// True for mistakes in the site setup rather than in one figure.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Tag(_)
                | Self::Config(_)
                | Self::Render(RenderError::UnknownPreamble(_) | RenderError::NotFound { .. })
        )
    }
}

/// One formula occurrence inside a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaBlock {
    pub source: String,
    pub figure: FigureIndex,
    pub variant: PreambleVariant,
}

impl FormulaBlock {
    pub fn new(source: impl Into<String>, tag: FigureTag) -> Self {
        Self {
            source: source.into(),
            figure: tag.figure,
            variant: tag.variant,
        }
    }
}

/// Everything produced for one formula block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFigure {
    pub markup: String,
    pub artifact: CachedArtifact,
    pub size: PixelSize,
}

/// The build context: configuration, renderer and cache for one build.
pub struct FigurePipeline<R: StaticFileRegistry> {
    preambles: PreambleRegistry,
    font: String,
    invoker: Box<dyn RenderInvoker>,
    cache: ArtifactCache<R>,
}

impl<R: StaticFileRegistry> FigurePipeline<R> {
    pub fn new(config: &SiteConfig, invoker: Box<dyn RenderInvoker>, registry: R) -> Self {
        Self {
            preambles: config.preamble_registry(),
            font: config.render.font.clone(),
            invoker,
            cache: ArtifactCache::new(config.assets.clone(), registry),
        }
    }

    /// Pipeline driving the configured external renderer.
    pub fn from_config(config: &SiteConfig, registry: R) -> Result<Self, PipelineError> {
        let invoker = CommandInvoker::new(
            &config.render.command,
            config.render.args.clone(),
            config.render.font_flag.clone(),
        )?;
        Ok(Self::new(config, Box::new(invoker), registry))
    }

    pub fn layout(&self) -> &AssetLayout {
        self.cache.layout()
    }

    pub fn registry(&self) -> &R {
        self.cache.registry()
    }

    pub fn into_registry(self) -> R {
        self.cache.into_registry()
    }

    /// Render a formula block given its raw tag argument, e.g. `"1 fig-03"`.
    pub fn latex(&mut self, page: &Page, tag: &str, source: &str) -> Result<RenderedFigure, PipelineError> {
        let tag = FigureTag::parse(tag)?;
        self.latex_block(page, &FormulaBlock::new(source, tag))
    }

    pub fn latex_block(&mut self, page: &Page, block: &FormulaBlock) -> Result<RenderedFigure, PipelineError> {
        let (normalized, fingerprint) = fingerprint_source(&block.source);
        debug!("fig-{} fingerprint {}", block.figure, fingerprint);

        let options = RenderOptions {
            font: self.font.clone(),
            preamble: block.variant,
        };
        let target = self.cache.key(page, block.figure, fingerprint).path();

        let preambles = &self.preambles;
        let invoker = self.invoker.as_ref();
        let mut fresh_size = None;
        let artifact = self.cache.get_or_create(page, block.figure, fingerprint, || {
            let svg = render(preambles, invoker, &normalized, &options)?;
            // Checked before the write: output without usable dimensions
            // must never land in the cache.
            let size = extract_pixel_size(&svg).map_err(|source| PipelineError::MalformedArtifact {
                path: target.clone(),
                source,
            })?;
            fresh_size = Some(size);
            Ok::<_, PipelineError>(svg)
        })?;

        let size = match fresh_size {
            Some(size) => size,
            None => measure(&artifact.path, extract_pixel_size)?,
        };

        let markup = emit(&page.url, &artifact.file_name, block.figure, size);
        Ok(RenderedFigure { markup, artifact, size })
    }

    /// Embed a chart already present in the page's asset directory.
    pub fn chart(&self, page: &Page, file_name: &str) -> Result<String, PipelineError> {
        let path = self.layout().page_dir(page).join(file_name);
        let size = measure(&path, declared_size)?;
        let figure = FigureIndex::from_file_name(file_name);
        Ok(emit_chart(&page.url, file_name, figure, size))
    }

    /// Markup of a file from the inline assets directory.
    pub fn inline_svg(&self, name: &str) -> Result<String, PipelineError> {
        let path = self.layout().inline_file(name);
        Ok(inline_svg(&read(&path)?)?)
    }

    pub fn data_uri(&self, path: &Path) -> Result<String, PipelineError> {
        Ok(data_uri(&read(path)?))
    }

    /// Register all existing static and page asset files.
    pub fn scan(&mut self, pages: &[Page]) -> Result<usize, PipelineError> {
        let layout = self.cache.layout().clone();
        layout
            .scan(pages, self.cache.registry_mut())
            .map_err(|source| PipelineError::Read {
                path: layout.root.clone(),
                source,
            })
    }
}

fn read(path: &Path) -> Result<Vec<u8>, PipelineError> {
    fs::read(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn measure(
    path: &Path,
    extract: fn(&[u8]) -> Result<PixelSize, DimensionError>,
) -> Result<PixelSize, PipelineError> {
    let data = read(path)?;
    extract(&data).map_err(|source| PipelineError::MalformedArtifact {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::StaticFiles;
    use std::cell::Cell;
    use std::rc::Rc;
    use tempfile::TempDir;

    struct FixedSvg {
        svg: &'static str,
        calls: Rc<Cell<usize>>,
    }

    impl RenderInvoker for FixedSvg {
        fn invoke(&self, _document: &str, _font: &str) -> Result<Vec<u8>, RenderError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.svg.as_bytes().to_vec())
        }
    }

    fn pipeline(root: &Path, svg: &'static str) -> (FigurePipeline<StaticFiles>, Rc<Cell<usize>>) {
        let mut config = SiteConfig::default();
        config.assets.root = root.to_path_buf();
        let calls = Rc::new(Cell::new(0));
        let invoker = FixedSvg { svg, calls: calls.clone() };
        (FigurePipeline::new(&config, Box::new(invoker), StaticFiles::new()), calls)
    }

    #[test]
    fn test_malformed_output_is_not_cached() {
        let tmp = TempDir::new().unwrap();
        let (mut pipeline, calls) = pipeline(tmp.path(), "<svg/>");
        let page = Page::new("_posts/p.md", "/p/");

        let err = pipeline.latex(&page, "fig-01", "x").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedArtifact { .. }));
        assert!(!err.is_configuration());
        assert_eq!(calls.get(), 1);
        assert_eq!(fs::read_dir(tmp.path().join("p")).unwrap().count(), 0);
        assert!(pipeline.registry().is_empty());
    }

    #[test]
    fn test_bad_tag_is_configuration_error() {
        let tmp = TempDir::new().unwrap();
        let (mut pipeline, calls) = pipeline(tmp.path(), "<svg/>");
        let err = pipeline.latex(&Page::new("p.md", "/p/"), "figure 1", "x").unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_chart_uses_declared_size() {
        let tmp = TempDir::new().unwrap();
        let (pipeline, calls) = pipeline(tmp.path(), "<svg/>");
        let page = Page::new("_posts/p.md", "/p/");
        fs::create_dir_all(tmp.path().join("p")).unwrap();
        fs::write(tmp.path().join("p/fig-02-hist.svg"), r#"<svg width="640" height="480"/>"#).unwrap();

        let html = pipeline.chart(&page, "fig-02-hist.svg").unwrap();
        assert!(html.contains("padding-top: 75%"));
        assert!(html.contains(r#"height="480" width="640""#));
        assert!(html.contains(r#"alt="Figure 2""#));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_missing_chart_is_error() {
        let tmp = TempDir::new().unwrap();
        let (pipeline, _) = pipeline(tmp.path(), "<svg/>");
        let err = pipeline.chart(&Page::new("p.md", "/p/"), "fig-01-none.svg").unwrap_err();
        assert!(matches!(err, PipelineError::Read { .. }));
    }

    #[test]
    fn test_inline_svg_from_inline_dir() {
        let tmp = TempDir::new().unwrap();
        let (pipeline, _) = pipeline(tmp.path(), "<svg/>");
        fs::create_dir_all(tmp.path().join("inline")).unwrap();
        fs::write(tmp.path().join("inline/logo.svg"), r#"<?xml version="1.0"?><svg id="a"/>"#).unwrap();
        assert_eq!(pipeline.inline_svg("logo.svg").unwrap(), "<svg/>");
    }
}
