//! Splitting `@includeExample` tag values into a path and a selector.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::app::selector;
use crate::domain::errors::SelectorError;
use crate::domain::model::IncludeExampleTag;

/// Pre-bracket selectors were written after a colon: `path/to/file:2-4,15`.
static LEGACY_COLON_SELECTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\-,\s]+$").expect("valid legacy selector pattern"));

/// Raw pieces of a tag value before the selector is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagParts<'a> {
    pub path: &'a str,
    /// `None` when the value carries no bracket group.
    pub selector: Option<&'a str>,
}

/// Split a tag value of the form `path[selector]`.
///
/// The selector group is the bracket group that ends the value. Unbalanced brackets are rejected,
/// and so is an empty group, which is distinct from no group at all.
pub fn split(tag: &str) -> Result<TagParts<'_>, SelectorError> {
    let value = tag.trim();
    let malformed = || SelectorError::MalformedSelector {
        tag: value.to_owned(),
    };

    let Some(body) = value.strip_suffix(']') else {
        if value.contains(['[', ']']) {
            return Err(malformed());
        }
        return Ok(TagParts {
            path: value,
            selector: None,
        });
    };

    let open = body.rfind('[').ok_or_else(malformed)?;
    let path = body[..open].trim_end();
    let selector = &body[open + 1..];

    if path.is_empty() || selector.contains(']') || !brackets_balanced(path) {
        return Err(malformed());
    }
    if selector.trim().is_empty() {
        return Err(SelectorError::EmptySelector {
            tag: value.to_owned(),
        });
    }

    Ok(TagParts {
        path,
        selector: Some(selector),
    })
}

fn brackets_balanced(text: &str) -> bool {
    let mut depth = 0usize;
    for ch in text.chars() {
        match ch {
            '[' => depth += 1,
            ']' => match depth.checked_sub(1) {
                Some(next) => depth = next,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

/// Reject values written in the pre-bracket `path:2-4` form.
fn reject_colon_selector(value: &str) -> Result<(), SelectorError> {
    let Some((path, selector)) = value.rsplit_once(':') else {
        return Ok(());
    };
    if selector.trim().is_empty() || !LEGACY_COLON_SELECTOR.is_match(selector) {
        return Ok(());
    }
    Err(SelectorError::LegacyColonSyntax {
        tag: value.to_owned(),
        suggestion: format!("{path}[{}]", selector.replace('-', ":")),
    })
}

impl IncludeExampleTag {
    /// Parse a tag value, falling back to `default_path` when the value names no file.
    pub fn parse(tag: &str, default_path: Option<&Path>) -> Result<Self, SelectorError> {
        let parts = split(tag)?;

        let Some(raw_selector) = parts.selector else {
            reject_colon_selector(parts.path)?;
            let path = match (parts.path.is_empty(), default_path) {
                (true, Some(default)) => default.to_path_buf(),
                _ => PathBuf::from(parts.path),
            };
            return Ok(Self {
                path,
                selector: None,
            });
        };

        Ok(Self {
            path: PathBuf::from(parts.path),
            selector: Some(selector::parse(raw_selector)?),
        })
    }
}
