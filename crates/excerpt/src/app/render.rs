//! Rendering excerpts into documentation blocks and scan reports.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use minijinja::Environment;
use serde::{Deserialize, Serialize};

use crate::app::locate::Excerpt;
use crate::app::scan::ScanReport;
use crate::infra::config::Config;

/// Supported report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum RenderFormat {
    /// Markdown document with one fenced block per include.
    Markdown,
    /// Plain text report.
    Plain,
    /// Machine-readable JSON.
    Json,
}

impl RenderFormat {
    /// Name of the built-in template for the format, if it is template driven.
    pub fn template_name(&self) -> Option<&'static str> {
        match self {
            RenderFormat::Markdown => Some("markdown"),
            RenderFormat::Plain => Some("plain"),
            RenderFormat::Json => None,
        }
    }
}

impl FromStr for RenderFormat {
    type Err = RenderFormatParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(RenderFormat::Markdown),
            "plain" | "text" | "txt" => Ok(RenderFormat::Plain),
            "json" => Ok(RenderFormat::Json),
            other => Err(RenderFormatParseError::UnknownFormat(other.to_string())),
        }
    }
}

/// Error returned when parsing a [`RenderFormat`] fails.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RenderFormatParseError {
    #[error("unknown render format '{0}'")]
    UnknownFormat(String),
}

/// Runtime options controlling rendering.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub format: RenderFormat,
    /// Built-in template name or template file path; defaults to the format's template.
    pub template: Option<String>,
    pub heading: String,
    pub fence_language: bool,
    pub line_numbers: bool,
    pub output_path: Option<PathBuf>,
}

impl RenderOptions {
    /// Build options from configuration defaults.
    pub fn from_config(config: &Config) -> Result<Self> {
        let format = config.render.format().parse::<RenderFormat>()?;
        Ok(Self {
            format,
            template: config.render.template().map(str::to_owned),
            heading: config.defaults.heading.clone(),
            fence_language: config.render.fence_language(),
            line_numbers: config.render.line_numbers(),
            output_path: None,
        })
    }
}

/// The block appended to a doc comment for one excerpt.
pub fn example_block(heading: &str, language: Option<&str>, example: &str) -> String {
    format!(
        "\n\n### {heading}\n```{}\n{example}\n```",
        language.unwrap_or_default()
    )
}

/// Renders scan reports and writes them out.
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    /// Create a renderer with the built-in templates loaded.
    pub fn new() -> Result<Self> {
        Ok(Self {
            env: default_environment()?,
        })
    }

    /// Render the block for a single excerpt.
    pub fn render_excerpt(&self, excerpt: &Excerpt, options: &RenderOptions) -> String {
        let language = options.fence_language.then(|| excerpt.language()).flatten();
        example_block(&options.heading, language, &excerpt_text(excerpt, options))
    }

    /// Render a scan report in the configured format.
    pub fn render_report(&self, report: &ScanReport, options: &RenderOptions) -> Result<String> {
        let context = build_report_context(self, report, options);
        match (options.format, options.template.as_deref()) {
            (RenderFormat::Json, _) => {
                serde_json::to_string_pretty(&context).context("failed to serialize report")
            }
            (_, Some(template)) => self.render_with_template(&context, template),
            (format, None) => {
                let name = format.template_name().unwrap_or("markdown");
                self.render_with_template(&context, name)
            }
        }
    }

    /// Render the report and persist it when an output path is configured.
    pub fn write_report(&self, report: &ScanReport, options: &RenderOptions) -> Result<String> {
        let rendered = self.render_report(report, options)?;

        if let Some(path) = &options.output_path {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create output directory: {}", parent.display())
                })?;
            }
            fs::write(path, &rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
        }

        Ok(rendered)
    }

    fn render_with_template(&self, context: &ReportContext, template_name: &str) -> Result<String> {
        if let Ok(template) = self.env.get_template(template_name) {
            return template
                .render(context)
                .map_err(|err| anyhow!("failed to render template '{template_name}': {err}"));
        }

        let template_path = Path::new(template_name);
        if template_path.exists() {
            let source = fs::read_to_string(template_path).with_context(|| {
                format!(
                    "failed to load template from path {}",
                    template_path.display()
                )
            })?;
            let mut env = Environment::new();
            env.set_trim_blocks(true);
            env.set_lstrip_blocks(true);
            env.add_template("external", &source)
                .map_err(|err| anyhow!("invalid template '{template_name}': {err}"))?;
            return env
                .get_template("external")
                .and_then(|template| template.render(context))
                .map_err(|err| anyhow!("failed to render template '{template_name}': {err}"));
        }

        Err(anyhow!(
            "template '{}' not found (built-in or filesystem)",
            template_name
        ))
    }
}

fn default_environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template("markdown", DEFAULT_MARKDOWN_TEMPLATE)
        .map_err(|err| anyhow!("failed to register default markdown template: {err}"))?;
    env.add_template("plain", DEFAULT_PLAIN_TEMPLATE)
        .map_err(|err| anyhow!("failed to register default plain template: {err}"))?;
    Ok(env)
}

fn excerpt_text(excerpt: &Excerpt, options: &RenderOptions) -> String {
    if options.line_numbers {
        excerpt.extracted.with_line_numbers()
    } else {
        excerpt.extracted.text.clone()
    }
}

fn build_report_context(
    renderer: &Renderer,
    report: &ScanReport,
    options: &RenderOptions,
) -> ReportContext {
    let includes = report
        .includes
        .iter()
        .map(|include| ReportInclude {
            source: include.display_path.clone(),
            line: include.request.line,
            tag: include.request.value.clone(),
            example: include.excerpt.path.display().to_string(),
            language: include.excerpt.language().map(str::to_owned),
            lines: include.excerpt.extracted.line_numbers.clone(),
            contents: excerpt_text(&include.excerpt, options),
            block: renderer.render_excerpt(&include.excerpt, options),
        })
        .collect();

    let failures = report
        .failures
        .iter()
        .map(|failure| ReportFailure {
            source: failure.display_path.clone(),
            line: failure.request.line,
            tag: failure.request.value.clone(),
            message: failure.message.clone(),
        })
        .collect();

    ReportContext {
        root: report.root.display().to_string(),
        files_scanned: report.files_scanned,
        heading: options.heading.clone(),
        includes,
        failures,
    }
}

#[derive(Serialize)]
struct ReportContext {
    root: String,
    files_scanned: usize,
    heading: String,
    includes: Vec<ReportInclude>,
    failures: Vec<ReportFailure>,
}

#[derive(Serialize)]
struct ReportInclude {
    source: String,
    line: usize,
    tag: String,
    example: String,
    language: Option<String>,
    lines: Vec<usize>,
    contents: String,
    block: String,
}

#[derive(Serialize)]
struct ReportFailure {
    source: String,
    line: usize,
    tag: String,
    message: String,
}

const DEFAULT_MARKDOWN_TEMPLATE: &str = r#"# Included Examples

Scanned {{ files_scanned }} files under `{{ root }}`.

{% for include in includes %}
## {{ include.source }}:{{ include.line }}
_{{ include.example }}_
{{ include.block }}

{% endfor %}
{% if failures %}
## Failures

{% for failure in failures %}
- {{ failure.source }}:{{ failure.line }} `{{ failure.tag }}`: {{ failure.message }}
{% endfor %}
{% endif %}
"#;

const DEFAULT_PLAIN_TEMPLATE: &str = r#"Scanned {{ files_scanned }} files under {{ root }}

{% for include in includes %}
-- {{ include.source }}:{{ include.line }} ({{ include.example }})
{{ include.contents }}

{% endfor %}
{% for failure in failures %}
!! {{ failure.source }}:{{ failure.line }} {{ failure.tag }}: {{ failure.message }}
{% endfor %}
"#;
