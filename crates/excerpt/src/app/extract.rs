//! Applying resolved selections to file content.

use crate::app::resolve::resolve;
use crate::domain::errors::SelectorError;
use crate::domain::model::ParsedSelector;

/// Split content into lines on `\n`, dropping a trailing `\r` from each.
///
/// A trailing newline yields a final empty line, so the count matches what authors see when
/// counting from the end of the file.
pub fn split_lines(content: &str) -> Vec<&str> {
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// A slice of a file produced by a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// 1-based numbers of the kept lines, ascending.
    pub line_numbers: Vec<usize>,
    pub text: String,
}

impl Extracted {
    /// Render with a right-aligned line-number gutter.
    pub fn with_line_numbers(&self) -> String {
        let width = self
            .line_numbers
            .last()
            .map_or(1, |last| last.to_string().len());
        self.line_numbers
            .iter()
            .zip(self.text.split('\n'))
            .map(|(number, line)| format!("{number:>width$} │ {line}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Keep the lines of `content` picked by `selector`. Without a selector the content is returned
/// unchanged.
pub fn extract(
    content: &str,
    selector: Option<&ParsedSelector>,
) -> Result<Extracted, SelectorError> {
    let lines = split_lines(content);

    let Some(selector) = selector else {
        return Ok(Extracted {
            line_numbers: (1..=lines.len()).collect(),
            text: content.to_owned(),
        });
    };

    let line_numbers = resolve(selector, lines.len())?;
    let text = line_numbers
        .iter()
        .filter_map(|number| lines.get(number - 1))
        .copied()
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Extracted { line_numbers, text })
}
