//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::infra::fs::find_repo_root;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".excerpt/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub scan: Scan,
    #[serde(default)]
    pub ignore: Ignore,
    #[serde(default = "Render::unset")]
    pub render: Render,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    /// Block tag that introduces an include request inside a doc comment.
    #[serde(default = "Defaults::default_tag")]
    pub tag: String,
    /// Infix used to derive the default example file: `Author.ts` -> `Author.example.ts`.
    #[serde(default = "Defaults::default_example_suffix")]
    pub example_suffix: String,
    #[serde(default = "Defaults::default_heading")]
    pub heading: String,
    #[serde(default)]
    show_hidden: Option<bool>,
}

impl Defaults {
    fn default_tag() -> String {
        "@includeExample".to_owned()
    }

    fn default_example_suffix() -> String {
        "example".into()
    }

    fn default_heading() -> String {
        "Example".into()
    }

    /// Whether the scanner walks hidden files and directories.
    pub fn show_hidden(&self) -> bool {
        self.show_hidden.unwrap_or(false)
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            tag: Self::default_tag(),
            example_suffix: Self::default_example_suffix(),
            heading: Self::default_heading(),
            show_hidden: Some(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scan {
    /// File extensions searched for doc comments.
    #[serde(default = "Scan::default_extensions")]
    pub extensions: Vec<String>,
}

impl Scan {
    fn default_extensions() -> Vec<String> {
        ["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs", "rs"]
            .into_iter()
            .map(String::from)
            .collect()
    }
}

impl Default for Scan {
    fn default() -> Self {
        Self {
            extensions: Self::default_extensions(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ignore {
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub globs: Vec<String>,
}

impl Default for Ignore {
    fn default() -> Self {
        Self {
            paths: vec![
                "target/".into(),
                "node_modules/".into(),
                "dist/".into(),
                ".git/".into(),
            ],
            globs: vec!["*.min.js".into(), "*.d.ts".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Render {
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    template: Option<String>,
    #[serde(default)]
    fence_language: Option<bool>,
    #[serde(default)]
    line_numbers: Option<bool>,
}

impl Render {
    fn default_format() -> &'static str {
        "markdown"
    }

    fn default_fence_language() -> bool {
        true
    }

    /// An absent `[render]` section overrides nothing when layers merge.
    fn unset() -> Self {
        Self {
            format: None,
            template: None,
            fence_language: None,
            line_numbers: None,
        }
    }

    pub fn format(&self) -> &str {
        self.format.as_deref().unwrap_or(Self::default_format())
    }

    /// Template name or path overriding the one implied by the format.
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn fence_language(&self) -> bool {
        self.fence_language
            .unwrap_or_else(Self::default_fence_language)
    }

    pub fn line_numbers(&self) -> bool {
        self.line_numbers.unwrap_or(false)
    }
}

impl Default for Render {
    fn default() -> Self {
        Self {
            format: Some(Self::default_format().to_owned()),
            template: None,
            fence_language: Some(Self::default_fence_language()),
            line_numbers: Some(false),
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    tag: Option<String>,
    format: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            tag: env::var("EXCERPT_TAG").ok(),
            format: env::var("EXCERPT_FORMAT").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(tag: &str, format: &str) -> Self {
        Self {
            tag: Some(tag.to_owned()),
            format: Some(format.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user config, the workspace config of `root`, and env
    /// overrides.
    pub fn load_for(root: &Path) -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = Some(workspace_config_path(root));
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_toml(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading user config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_toml(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            defaults: merge_defaults(self.defaults, other.defaults),
            scan: merge_scan(self.scan, other.scan),
            ignore: merge_ignore(self.ignore, other.ignore),
            render: merge_render(self.render, other.render),
        }
    }
}

fn merge_defaults(base: Defaults, overlay: Defaults) -> Defaults {
    Defaults {
        tag: choose(base.tag, overlay.tag, Defaults::default_tag),
        example_suffix: choose(
            base.example_suffix,
            overlay.example_suffix,
            Defaults::default_example_suffix,
        ),
        heading: choose(base.heading, overlay.heading, Defaults::default_heading),
        show_hidden: overlay.show_hidden.or(base.show_hidden),
    }
}

fn merge_scan(base: Scan, overlay: Scan) -> Scan {
    Scan {
        extensions: choose(base.extensions, overlay.extensions, Scan::default_extensions),
    }
}

fn merge_ignore(base: Ignore, overlay: Ignore) -> Ignore {
    let mut paths: BTreeSet<String> = base.paths.into_iter().collect();
    paths.extend(overlay.paths);

    let mut globs: BTreeSet<String> = base.globs.into_iter().collect();
    globs.extend(overlay.globs);

    Ignore {
        paths: paths.into_iter().collect(),
        globs: globs.into_iter().collect(),
    }
}

fn merge_render(mut base: Render, overlay: Render) -> Render {
    if let Some(value) = overlay.format {
        base.format = Some(value);
    }
    if let Some(value) = overlay.template {
        base.template = Some(value);
    }
    if let Some(value) = overlay.fence_language {
        base.fence_language = Some(value);
    }
    if let Some(value) = overlay.line_numbers {
        base.line_numbers = Some(value);
    }
    base
}

/// Keep the overlay value unless it is just the serde default.
fn choose<T: PartialEq>(base: T, overlay: T, default_fn: fn() -> T) -> T {
    if overlay != default_fn() {
        overlay
    } else {
        base
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("excerpt/config.toml"))
}

fn workspace_config_path(start: &Path) -> PathBuf {
    let root = find_repo_root(start).unwrap_or_else(|| start.to_path_buf());
    root.join(DEFAULT_WORKSPACE_CONFIG_PATH)
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(tag) = env.tag {
        config.defaults.tag = tag;
    }
    if let Some(format) = env.format {
        config.render.format = Some(format);
    }
    config
}
