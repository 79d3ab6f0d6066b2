//! Artifact Cache - Compute-If-Absent Figure Files
//!
//! The file name is derived from the key alone, so an unchanged formula is
//! found again by a later build without any index. An existing file is
//! trusted as-is: no re-render, no content check.

use log::{debug, info};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::assets::{AssetLayout, Page, StaticFileRegistry};
use crate::hashing::Fingerprint;
use crate::tag::FigureIndex;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Uniquely identifies one cached SVG file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub page_dir: PathBuf,
    pub figure: FigureIndex,
    pub fingerprint: Fingerprint,
}

impl ArtifactKey {
    pub fn new(page_dir: impl Into<PathBuf>, figure: FigureIndex, fingerprint: Fingerprint) -> Self {
        Self {
            page_dir: page_dir.into(),
            figure,
            fingerprint,
        }
    }

    /// `fig-NN-latex-DDDDDDDDDD.svg`
    pub fn file_name(&self) -> String {
        format!("fig-{}-latex-{}.svg", self.figure, self.fingerprint)
    }

    pub fn path(&self) -> PathBuf {
        self.page_dir.join(self.file_name())
    }
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
    pub path: PathBuf,
    pub file_name: String,
    /// False when the file was already on disk.
    pub created: bool,
}

/// Filesystem-backed figure cache for one build.
pub struct ArtifactCache<R: StaticFileRegistry> {
    layout: AssetLayout,
    registry: R,
}

impl<R: StaticFileRegistry> ArtifactCache<R> {
    pub fn new(layout: AssetLayout, registry: R) -> Self {
        Self { layout, registry }
    }

    pub fn layout(&self) -> &AssetLayout {
        &self.layout
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    pub fn into_registry(self) -> R {
        self.registry
    }

    pub fn key(&self, page: &Page, figure: FigureIndex, fingerprint: Fingerprint) -> ArtifactKey {
        ArtifactKey::new(self.layout.page_dir(page), figure, fingerprint)
    }

    /// Return the cached file for the key, rendering it first if absent.
    ///
    /// `render` runs only on a miss. On failure nothing is written or
    /// registered, so the next build retries instead of finding a stale file.
    pub fn get_or_create<F, E>(
        &mut self,
        page: &Page,
        figure: FigureIndex,
        fingerprint: Fingerprint,
        render: F,
    ) -> Result<CachedArtifact, E>
    where
        F: FnOnce() -> Result<Vec<u8>, E>,
        E: From<CacheError>,
    {
        let key = self.key(page, figure, fingerprint);
        let file_name = key.file_name();
        let path = key.path();

        ensure_dir(&key.page_dir)?;

        if path.is_file() {
            debug!("cache hit {}", path.display());
            return Ok(CachedArtifact { path, file_name, created: false });
        }

        info!("Generating {}...", path.display());
        let data = render()?;
        write_atomic(&key.page_dir, &path, &data)?;
        self.registry.register(&key.page_dir, &page.url, &file_name);

        Ok(CachedArtifact { path, file_name, created: true })
    }
}

fn ensure_dir(dir: &Path) -> Result<(), CacheError> {
    fs::create_dir_all(dir).map_err(|source| CacheError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Write to a temporary file in the same directory, then rename over `path`.
fn write_atomic(dir: &Path, path: &Path, data: &[u8]) -> Result<(), CacheError> {
    let write_error = |source| CacheError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_error)?;
    tmp.write_all(data).map_err(write_error)?;
    tmp.as_file().sync_all().map_err(write_error)?;
    tmp.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}
