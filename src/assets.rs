//! Asset Layout - Where Page Figures Live and How They Reach the Site
//!
//! ```text
//! _assets/
//!   static/...            copied to /static/...
//!   inline/...            pasted into pages, never copied
//!   <post-name>/fig-*.svg copied next to the post
//! ```

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Identity of the page being generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Source path, e.g. `_posts/2019-04-27-the-normal-distribution.md`.
    pub source_path: PathBuf,
    /// Output URL, e.g. `/2019/04/27/the-normal-distribution/`.
    pub url: String,
}

impl Page {
    pub fn new(source_path: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            url: url.into(),
        }
    }

    /// Name of the page's asset directory: the source file name without extension.
    pub fn slug(&self) -> String {
        self.source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Receives files that must be copied into the final site.
pub trait StaticFileRegistry {
    fn register(&mut self, base: &Path, output_url: &str, name: &str);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticFile {
    pub base: PathBuf,
    pub url: String,
    pub name: String,
}

impl StaticFile {
    /// Where the file is read from during the copy step.
    pub fn source(&self) -> PathBuf {
        self.base.join(&self.name)
    }
}

/// In-memory registry recording files in registration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticFiles {
    pub files: Vec<StaticFile>,
}

impl StaticFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl StaticFileRegistry for StaticFiles {
    fn register(&mut self, base: &Path, output_url: &str, name: &str) {
        debug!("register {} -> {}{}", base.join(name).display(), output_url, name);
        self.files.push(StaticFile {
            base: base.to_path_buf(),
            url: output_url.to_string(),
            name: name.to_string(),
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetLayout {
    pub root: PathBuf,
    pub static_dir: String,
    pub inline_dir: String,
}

impl Default for AssetLayout {
    fn default() -> Self {
        Self {
            root: PathBuf::from("_assets"),
            static_dir: "static".to_string(),
            inline_dir: "inline".to_string(),
        }
    }
}

impl AssetLayout {
    pub fn page_dir(&self, page: &Page) -> PathBuf {
        self.root.join(page.slug())
    }

    pub fn inline_file(&self, name: &str) -> PathBuf {
        self.root.join(&self.inline_dir).join(name)
    }

    pub fn static_root(&self) -> PathBuf {
        self.root.join(&self.static_dir)
    }

    /// Register every shared static file and every file in the given pages'
    /// asset directories.
    pub fn scan(&self, pages: &[Page], registry: &mut dyn StaticFileRegistry) -> io::Result<usize> {
        let mut count = 0;

        let base = self.static_root();
        let mut names = vec![];
        collect_relative(&base, Path::new(""), &mut names)?;
        for name in names {
            registry.register(&base, &self.static_dir, &name);
            count += 1;
        }

        for page in pages {
            let dir = self.page_dir(page);
            if !dir.is_dir() {
                continue;
            }
            let mut names = vec![];
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    names.push(entry.file_name().to_string_lossy().into_owned());
                }
            }
            names.sort();
            for name in names {
                registry.register(&dir, &page.url, &name);
                count += 1;
            }
        }

        Ok(count)
    }
}

/// Relative `/`-separated names of all files below `dir`, sorted.
fn collect_relative(dir: &Path, prefix: &Path, out: &mut Vec<String>) -> io::Result<()> {
    let here = dir.join(prefix);
    if !here.is_dir() {
        return Ok(());
    }
    let mut entries: Vec<_> = fs::read_dir(&here)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let rel = prefix.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            collect_relative(dir, &rel, out)?;
        } else {
            let name: Vec<_> = rel.iter().map(|c| c.to_string_lossy()).collect();
            out.push(name.join("/"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout(root: &Path) -> AssetLayout {
        AssetLayout {
            root: root.to_path_buf(),
            ..AssetLayout::default()
        }
    }

    #[test]
    fn test_page_dir_uses_file_stem() {
        let layout = AssetLayout::default();
        let page = Page::new("_posts/2019-04-27-normal.md", "/2019/04/27/normal/");
        assert_eq!(layout.page_dir(&page), PathBuf::from("_assets/2019-04-27-normal"));
        assert_eq!(layout.inline_file("logo.svg"), PathBuf::from("_assets/inline/logo.svg"));
    }

    #[test]
    fn test_scan_registers_static_and_page_files() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(tmp.path());
        fs::create_dir_all(tmp.path().join("static/fonts")).unwrap();
        fs::write(tmp.path().join("static/site.css"), "").unwrap();
        fs::write(tmp.path().join("static/fonts/a.woff2"), "").unwrap();
        fs::create_dir_all(tmp.path().join("post")).unwrap();
        fs::write(tmp.path().join("post/fig-01-latex-0000000001.svg"), "").unwrap();

        let pages = vec![
            Page::new("_posts/post.md", "/post/"),
            Page::new("_posts/empty.md", "/empty/"),
        ];
        let mut registry = StaticFiles::new();
        let count = layout.scan(&pages, &mut registry).unwrap();

        assert_eq!(count, 3);
        let names: Vec<_> = registry.files.iter().map(|f| (f.url.as_str(), f.name.as_str())).collect();
        assert_eq!(names, vec![
            ("static", "fonts/a.woff2"),
            ("static", "site.css"),
            ("/post/", "fig-01-latex-0000000001.svg"),
        ]);
        assert_eq!(registry.files[2].source(), tmp.path().join("post/fig-01-latex-0000000001.svg"));
    }

    #[test]
    fn test_scan_without_asset_dirs() {
        let tmp = TempDir::new().unwrap();
        let mut registry = StaticFiles::new();
        let count = layout(tmp.path()).scan(&[Page::new("a.md", "/a/")], &mut registry).unwrap();
        assert_eq!(count, 0);
        assert!(registry.is_empty());
    }
}
