//! Locating and loading the example file an include tag refers to.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::app::extract::{Extracted, extract};
use crate::domain::model::IncludeExampleTag;
use crate::infra::fs::read_text;

/// A resolved include: the example file that was read and the lines kept from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt {
    pub path: PathBuf,
    pub extracted: Extracted,
}

impl Excerpt {
    /// Extension of the example file, used as the fence language.
    pub fn language(&self) -> Option<&str> {
        self.path.extension().and_then(|ext| ext.to_str())
    }
}

/// Resolves tag values relative to a base directory and the commenting source file.
#[derive(Debug, Clone)]
pub struct ExampleLocator {
    base: PathBuf,
    suffix: String,
}

impl ExampleLocator {
    pub fn new(base: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            suffix: suffix.into(),
        }
    }

    /// The example file implied by a source file: `dir/Author.ts` -> `dir/Author.example.ts`.
    pub fn default_example_for(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match source.extension() {
            Some(ext) => format!("{stem}.{}.{}", self.suffix, ext.to_string_lossy()),
            None => format!("{stem}.{}", self.suffix),
        };
        source.with_file_name(name)
    }

    /// Find the file a tag path names: first relative to the base directory, then relative to the
    /// directory of the source file carrying the tag.
    pub fn locate(&self, path: &Path, source: Option<&Path>) -> Result<PathBuf> {
        let direct = self.base.join(path);
        if direct.is_file() {
            return Ok(direct);
        }

        if let Some(dir) = source.and_then(Path::parent) {
            let relative = dir.join(path);
            if relative.is_file() {
                return Ok(relative);
            }
        }

        bail!("example file not found: {}", path.display())
    }

    /// Parse a tag value, read the example it names, and apply its selector.
    pub fn load(&self, tag_value: &str, source: Option<&Path>) -> Result<Excerpt> {
        let default_path = source.map(|source| self.default_example_for(source));
        let tag = IncludeExampleTag::parse(tag_value, default_path.as_deref())?;
        let path = self.locate(&tag.path, source)?;

        tracing::debug!(example = %path.display(), "reading example");
        let content = read_text(&path)?;
        let extracted = extract(&content, tag.selector.as_ref())
            .with_context(|| format!("in example {}", path.display()))?;

        Ok(Excerpt { path, extracted })
    }
}
