//! Project scanning: finding include tags in doc comments and resolving them.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use rayon::prelude::*;
use regex::Regex;

use crate::app::locate::{Excerpt, ExampleLocator};
use crate::infra::config::Config;
use crate::infra::fs::{is_probably_binary, read_text};

const EXCERPT_IGNORE: &str = ".excerptignore";

/// An include tag found in a doc comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeRequest {
    /// 1-based line of the source file carrying the tag; 0 when the file itself could not be read.
    pub line: usize,
    /// Tag value, trimmed; empty when the tag names no file.
    pub value: String,
}

/// A successfully resolved include.
#[derive(Debug, Clone)]
pub struct ResolvedInclude {
    pub display_path: String,
    pub request: IncludeRequest,
    pub excerpt: Excerpt,
}

/// An include that could not be resolved, with the message to show the author.
#[derive(Debug, Clone)]
pub struct IncludeFailure {
    pub display_path: String,
    pub request: IncludeRequest,
    pub message: String,
}

/// Result of scanning a project root.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub root: PathBuf,
    pub files_scanned: usize,
    pub includes: Vec<ResolvedInclude>,
    pub failures: Vec<IncludeFailure>,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Configuration inputs for the scanner.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub root: PathBuf,
    pub max_file_size: u64,
    pub config: Config,
}

impl ScannerConfig {
    pub fn from_root(root: PathBuf, config: Config) -> Self {
        Self {
            root,
            max_file_size: 1024 * 1024,
            config,
        }
    }
}

/// Walks a project respecting ignore rules and resolves every include tag it finds.
#[derive(Debug, Default)]
pub struct Scanner;

impl Scanner {
    pub fn new() -> Self {
        Self
    }

    pub fn scan(&self, cfg: &ScannerConfig) -> Result<ScanReport> {
        let files = collect_sources(cfg)?;
        let tag = tag_pattern(&cfg.config.defaults.tag)?;
        let locator = ExampleLocator::new(&cfg.root, cfg.config.defaults.example_suffix.clone());

        let per_file: Vec<(Vec<ResolvedInclude>, Vec<IncludeFailure>)> = files
            .par_iter()
            .map(|path| process_file(path, cfg, &tag, &locator))
            .collect();

        let mut report = ScanReport {
            root: cfg.root.clone(),
            files_scanned: files.len(),
            ..ScanReport::default()
        };
        for (includes, failures) in per_file {
            report.includes.extend(includes);
            report.failures.extend(failures);
        }

        tracing::info!(
            files = report.files_scanned,
            includes = report.includes.len(),
            failures = report.failures.len(),
            "scan finished"
        );
        Ok(report)
    }
}

fn collect_sources(cfg: &ScannerConfig) -> Result<Vec<PathBuf>> {
    let matcher = build_ignore_matcher(&cfg.root, cfg)?;
    let mut builder = WalkBuilder::new(&cfg.root);
    builder
        .git_ignore(true)
        .hidden(!cfg.config.defaults.show_hidden());

    let root = cfg.root.clone();
    builder.filter_entry(move |entry| {
        if entry.depth() == 0 {
            return true;
        }
        let rel = entry.path().strip_prefix(&root).unwrap_or(entry.path());
        !matcher.should_skip(rel)
    });

    let mut files = Vec::new();
    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "scanner error");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_some_and(|kind| kind.is_file()) || !has_extension(path, cfg) {
            continue;
        }
        let size = entry.metadata().map(|meta| meta.len()).unwrap_or(0);
        if size > cfg.max_file_size || is_probably_binary(path) {
            tracing::debug!(path = %path.display(), size, "skipping file");
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, cfg: &ScannerConfig) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            cfg.config
                .scan
                .extensions
                .iter()
                .any(|wanted| wanted.eq_ignore_ascii_case(ext))
        })
}

fn process_file(
    path: &Path,
    cfg: &ScannerConfig,
    tag: &Regex,
    locator: &ExampleLocator,
) -> (Vec<ResolvedInclude>, Vec<IncludeFailure>) {
    let display_path = to_display_path(&cfg.root, path);
    let mut includes = Vec::new();
    let mut failures = Vec::new();

    let content = match read_text(path) {
        Ok(content) => content,
        Err(err) => {
            let message = format!("{err:#}");
            tracing::warn!(path = %display_path, "{message}");
            failures.push(IncludeFailure {
                display_path,
                request: IncludeRequest {
                    line: 0,
                    value: String::new(),
                },
                message,
            });
            return (includes, failures);
        }
    };

    for request in find_include_requests(&content, tag) {
        match locator.load(&request.value, Some(path)) {
            Ok(excerpt) => includes.push(ResolvedInclude {
                display_path: display_path.clone(),
                request,
                excerpt,
            }),
            Err(err) => {
                let message = format!("{err:#}");
                tracing::warn!(
                    source = %display_path,
                    line = request.line,
                    tag = %request.value,
                    "{message}"
                );
                failures.push(IncludeFailure {
                        display_path: display_path.clone(),
                    request,
                    message,
                });
            }
        }
    }

    (includes, failures)
}

fn to_display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Matches a tag at the start of a comment body or after whitespace, capturing its value.
pub fn tag_pattern(tag: &str) -> Result<Regex> {
    let pattern = format!(r"(?:^|\s){}(?:\s+(.*?))?\s*$", regex::escape(tag));
    Regex::new(&pattern).with_context(|| format!("invalid tag name '{tag}'"))
}

/// Find include tags inside `/** ... */` block comments and `///` or `//!` line comments.
pub fn find_include_requests(content: &str, tag: &Regex) -> Vec<IncludeRequest> {
    let mut requests = Vec::new();
    let mut in_block = false;

    for (index, raw) in content.lines().enumerate() {
        let trimmed = raw.trim_start();
        let body = if in_block {
            let (body, closed) = close_block(trimmed);
            in_block = !closed;
            body.trim_start()
                .strip_prefix('*')
                .unwrap_or(body.trim_start())
        } else if let Some(rest) = trimmed.strip_prefix("/**") {
            if rest.starts_with('/') {
                continue;
            }
            let (body, closed) = close_block(rest);
            in_block = !closed;
            body
        } else if let Some(rest) = trimmed
            .strip_prefix("///")
            .or_else(|| trimmed.strip_prefix("//!"))
        {
            rest
        } else {
            continue;
        };

        if let Some(captures) = tag.captures(body) {
            let value = captures.get(1).map_or("", |m| m.as_str().trim());
            requests.push(IncludeRequest {
                line: index + 1,
                value: value.to_owned(),
            });
        }
    }

    requests
}

fn close_block(text: &str) -> (&str, bool) {
    match text.find("*/") {
        Some(end) => (&text[..end], true),
        None => (text, false),
    }
}

#[derive(Debug, Clone)]
struct IgnoreMatcher {
    globs: GlobSet,
}

impl IgnoreMatcher {
    fn should_skip(&self, rel: &Path) -> bool {
        self.globs.is_match(rel)
    }
}

fn build_ignore_matcher(root: &Path, cfg: &ScannerConfig) -> Result<IgnoreMatcher> {
    let mut builder = GlobSetBuilder::new();

    for pattern in &cfg.config.ignore.paths {
        for expanded in expand_dir_pattern(pattern) {
            let glob = Glob::new(&expanded).context("invalid ignore path pattern")?;
            builder.add(glob);
        }
    }

    for glob in &cfg.config.ignore.globs {
        let glob = Glob::new(glob).context("invalid ignore glob")?;
        builder.add(glob);
    }

    for pattern in load_excerptignore(root)? {
        for expanded in expand_dir_pattern(&pattern) {
            let glob = Glob::new(&expanded).context("invalid .excerptignore pattern")?;
            builder.add(glob);
        }
    }

    let globs = builder.build().context("failed to build ignore matcher")?;
    Ok(IgnoreMatcher { globs })
}

fn expand_dir_pattern(raw: &str) -> Vec<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    vec![
        trimmed.to_owned(),
        format!("{trimmed}/**"),
        format!("**/{trimmed}"),
        format!("**/{trimmed}/**"),
    ]
}

fn load_excerptignore(root: &Path) -> Result<Vec<String>> {
    let path = root.join(EXCERPT_IGNORE);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut patterns = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        patterns.push(trimmed.to_owned());
    }
    Ok(patterns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn default_tag() -> Regex {
        tag_pattern("@includeExample").unwrap()
    }

    #[test]
    fn finds_tags_in_block_comments() {
        let source = r#"import type { Book } from "./Book";

/**
 * A class representing an author.
 *
 * @includeExample ./src/Author.example.ts[2:4, !3]
 */
export class Author {}

/** @includeExample */
export function helper() {}
"#;
        let requests = find_include_requests(source, &default_tag());
        assert_eq!(
            requests,
            vec![
                IncludeRequest {
                    line: 6,
                    value: "./src/Author.example.ts[2:4, !3]".into()
                },
                IncludeRequest {
                    line: 10,
                    value: String::new()
                },
            ]
        );
    }

    #[test]
    fn finds_tags_in_line_doc_comments() {
        let source = "/// Adds numbers.\n///\n/// @includeExample add.example.rs[-3:]\npub fn add() {}\n";
        let requests = find_include_requests(source, &default_tag());
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].line, 3);
        assert_eq!(requests[0].value, "add.example.rs[-3:]");
    }

    #[test]
    fn ignores_tags_outside_doc_comments_and_lookalikes() {
        let source = r#"// @includeExample not-a-doc-comment.ts
const tag = "@includeExample nope.ts";
/* @includeExample plain-block.ts */
/**
 * @includeExampleLater other.ts
 */
"#;
        assert!(find_include_requests(source, &default_tag()).is_empty());
    }

    #[test]
    fn custom_tag_names_are_escaped() {
        let tag = tag_pattern("@example.file").unwrap();
        let source = "/** @example.file demo.ts */\n/** @exampleXfile demo.ts */";
        let requests = find_include_requests(source, &tag);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].value, "demo.ts");
    }

    #[test]
    fn scan_resolves_includes_and_collects_failures() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join("src"))?;
        fs::write(
            root.join("src/Author.ts"),
            "/**\n * Author.\n * @includeExample\n */\nexport class Author {}\n",
        )?;
        fs::write(root.join("src/Author.example.ts"), "const a = 1;\nconst b = 2;")?;
        fs::write(
            root.join("src/Book.ts"),
            "/** @includeExample src/Author.example.ts[9] */\nexport class Book {}\n",
        )?;

        let cfg = ScannerConfig::from_root(root.to_path_buf(), Config::default());
        let report = Scanner::new().scan(&cfg)?;

        assert_eq!(report.includes.len(), 1);
        assert_eq!(report.includes[0].display_path, "src/Author.ts");
        assert_eq!(report.includes[0].request.line, 3);
        assert_eq!(
            report.includes[0].excerpt.extracted.text,
            "const a = 1;\nconst b = 2;"
        );

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].display_path, "src/Book.ts");
        assert!(
            report.failures[0]
                .message
                .contains("line 9 is out of range (file has 2 lines)")
        );
        assert!(!report.is_clean());
        Ok(())
    }

    #[test]
    fn respects_ignore_paths_and_excerptignore() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join("src"))?;
        fs::create_dir_all(root.join("generated"))?;
        fs::create_dir_all(root.join("node_modules/pkg"))?;
        let tagged = "/** @includeExample missing.ts */\n";
        fs::write(root.join("src/lib.ts"), "export {};\n")?;
        fs::write(root.join("generated/out.ts"), tagged)?;
        fs::write(root.join("node_modules/pkg/index.ts"), tagged)?;
        fs::write(root.join("src/notes.md"), tagged)?;
        fs::write(root.join(EXCERPT_IGNORE), "# generated code\ngenerated/\n")?;

        let cfg = ScannerConfig::from_root(root.to_path_buf(), Config::default());
        let report = Scanner::new().scan(&cfg)?;

        assert_eq!(report.files_scanned, 1);
        assert!(report.is_clean());
        Ok(())
    }

    #[test]
    fn undecodable_sources_are_reported_as_failures() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        let mut latin1 = b"/** @includeExample missing.ts */\n// caf".to_vec();
        latin1.push(0xE9);
        latin1.push(b'\n');
        fs::write(root.join("latin1.ts"), latin1)?;

        let cfg = ScannerConfig::from_root(root.to_path_buf(), Config::default());
        let report = Scanner::new().scan(&cfg)?;

        assert_eq!(report.files_scanned, 1);
        assert!(report.includes.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].display_path, "latin1.ts");
        assert_eq!(report.failures[0].request.line, 0);
        assert!(report.failures[0].message.contains("not valid UTF-8"));
        assert!(!report.is_clean());
        Ok(())
    }
}
