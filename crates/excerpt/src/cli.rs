//! Command-line interface.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde::Serialize;

use crate::app::locate::ExampleLocator;
use crate::app::render::{RenderFormat, RenderOptions, Renderer};
use crate::app::resolve::resolve;
use crate::app::scan::{Scanner, ScannerConfig};
use crate::app::selector::parse;
use crate::domain::model::ParsedSelector;
use crate::infra::config::Config;

#[derive(Debug, Parser)]
#[command(
    name = "excerpt",
    author,
    version,
    about = "Extract documentation-ready code excerpts with line selectors",
    long_about = None
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the line numbers a selector picks from a file of the given length
    Resolve {
        /// Selector such as `2:8,!5` or `-3:`
        selector: String,
        /// Number of lines in the file
        #[arg(long)]
        lines: usize,
        /// Emit the parsed selector and lines as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the excerpt a tag value such as `src/demo.ts[2:8]` selects
    Show {
        tag: String,
        /// Source file carrying the tag; relative paths and the default example resolve from it
        #[arg(long)]
        source: Option<PathBuf>,
        /// Prefix each line with its number
        #[arg(long)]
        line_numbers: bool,
        /// Wrap the excerpt in the documentation example block
        #[arg(long)]
        block: bool,
    },
    /// Resolve every include tag under a directory and render a report
    Scan {
        /// Project root; defaults to the current directory
        root: Option<PathBuf>,
        #[arg(long, value_enum)]
        format: Option<RenderFormat>,
        /// Built-in template name or template file path
        #[arg(long)]
        template: Option<String>,
        /// Write the report to a file as well as stdout
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        line_numbers: bool,
    },
    /// Generate shell completions
    Completions { shell: Shell },
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    selector: &'a ParsedSelector,
    lines: &'a [usize],
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.run_with(&mut out)
    }

    pub fn run_with(self, out: &mut impl Write) -> Result<()> {
        match self.command {
            Commands::Resolve {
                selector,
                lines,
                json,
            } => run_resolve(&selector, lines, json, out),
            Commands::Show {
                tag,
                source,
                line_numbers,
                block,
            } => run_show(&tag, source, line_numbers, block, out),
            Commands::Scan {
                root,
                format,
                template,
                output,
                line_numbers,
            } => run_scan(root, format, template, output, line_numbers, out),
            Commands::Completions { shell } => {
                clap_complete::generate(shell, &mut Cli::command(), "excerpt", out);
                Ok(())
            }
        }
    }
}

fn run_resolve(selector: &str, total: usize, json: bool, out: &mut impl Write) -> Result<()> {
    let parsed = parse(selector)?;
    let lines = resolve(&parsed, total)?;

    if json {
        let payload = ResolveOutput {
            selector: &parsed,
            lines: &lines,
        };
        serde_json::to_writer_pretty(&mut *out, &payload)
            .context("failed to serialize resolved lines")?;
        writeln!(out)?;
    } else {
        let joined = lines
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        writeln!(out, "{joined}")?;
    }
    Ok(())
}

fn run_show(
    tag: &str,
    source: Option<PathBuf>,
    line_numbers: bool,
    block: bool,
    out: &mut impl Write,
) -> Result<()> {
    let cwd = std::env::current_dir().context("unable to determine working directory")?;
    let config = Config::load_for(&cwd)?;
    let locator = ExampleLocator::new(&cwd, config.defaults.example_suffix.clone());
    let excerpt = locator.load(tag, source.as_deref())?;

    let mut options = RenderOptions::from_config(&config)?;
    options.line_numbers |= line_numbers;

    if block {
        let renderer = Renderer::new()?;
        writeln!(out, "{}", renderer.render_excerpt(&excerpt, &options).trim_start())?;
    } else if options.line_numbers {
        writeln!(out, "{}", excerpt.extracted.with_line_numbers())?;
    } else {
        writeln!(out, "{}", excerpt.extracted.text)?;
    }
    Ok(())
}

fn run_scan(
    root: Option<PathBuf>,
    format: Option<RenderFormat>,
    template: Option<String>,
    output: Option<PathBuf>,
    line_numbers: bool,
    out: &mut impl Write,
) -> Result<()> {
    let root = match root {
        Some(root) => root,
        None => std::env::current_dir().context("unable to determine working directory")?,
    };
    let config = Config::load_for(&root)?;

    let mut options = RenderOptions::from_config(&config)?;
    if let Some(format) = format {
        options.format = format;
    }
    if template.is_some() {
        options.template = template;
    }
    options.output_path = output;
    options.line_numbers |= line_numbers;

    let scanner_cfg = ScannerConfig::from_root(root, config);
    let report = Scanner::new().scan(&scanner_cfg)?;

    let renderer = Renderer::new()?;
    let rendered = renderer.write_report(&report, &options)?;
    write!(out, "{rendered}")?;

    if !report.is_clean() {
        bail!("{} include(s) could not be resolved", report.failures.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("excerpt").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        cli.run_with(&mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn resolve_prints_comma_separated_lines() -> Result<()> {
        assert_eq!(run(&["resolve", "1:10,!5:7", "--lines", "10"])?, "1,2,3,4,8,9,10\n");
        assert_eq!(run(&["resolve", "2:-5", "--lines", "10"])?, "2,3,4,5,6\n");
        Ok(())
    }

    #[test]
    fn resolve_accepts_leading_dash_selectors() -> Result<()> {
        assert_eq!(run(&["resolve", "--lines", "4", "--", "-2:"])?, "3,4\n");
        Ok(())
    }

    #[test]
    fn resolve_json_includes_flags() -> Result<()> {
        let output = run(&["resolve", "!3,-1", "--lines", "5", "--json"])?;
        let value: serde_json::Value = serde_json::from_str(&output)?;
        assert_eq!(value["lines"], serde_json::json!([5]));
        assert_eq!(value["selector"]["has_exclusions"], true);
        assert_eq!(value["selector"]["has_negative_indexing"], true);
        Ok(())
    }

    #[test]
    fn resolve_surfaces_selector_errors() {
        let err = run(&["resolve", "2-4", "--lines", "10"]).unwrap_err();
        assert!(err.to_string().contains("'2:4'"));

        let err = run(&["resolve", "15", "--lines", "10"]).unwrap_err();
        assert_eq!(err.to_string(), "line 15 is out of range (file has 10 lines)");
    }

    #[test]
    fn completions_are_generated() -> Result<()> {
        let output = run(&["completions", "bash"])?;
        assert!(output.contains("excerpt"));
        Ok(())
    }
}
