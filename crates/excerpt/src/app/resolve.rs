//! Resolution of parsed selectors into concrete line numbers.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::domain::errors::SelectorError;
use crate::domain::model::{LineRef, ParsedSelector, Selection};

/// Resolve `selector` against a file of `total_lines` lines.
///
/// The result is strictly ascending and every entry lies in `1..=total_lines`. Inclusion clauses
/// are unioned, then exclusion clauses are subtracted; a selector without inclusion clauses starts
/// from every line.
pub fn resolve(selector: &ParsedSelector, total_lines: usize) -> Result<Vec<usize>, SelectorError> {
    if total_lines == 0 {
        return Ok(Vec::new());
    }

    let mut included = BTreeSet::new();
    let mut excluded = BTreeSet::new();

    for selection in &selector.selections {
        let lines = resolve_selection(selection, total_lines)?
            .into_iter()
            .flatten();
        if selection.is_exclusion() {
            excluded.extend(lines);
        } else {
            included.extend(lines);
        }
    }

    if selector.selects_all_by_default() {
        included.extend(1..=total_lines);
    }

    Ok(included.difference(&excluded).copied().collect())
}

fn resolve_selection(
    selection: &Selection,
    total_lines: usize,
) -> Result<Option<RangeInclusive<usize>>, SelectorError> {
    match *selection {
        Selection::Single { line, .. } => {
            let position = resolve_single(line, total_lines)?;
            Ok(Some(position..=position))
        }
        Selection::Range { start, end, .. } => resolve_range(start, end, total_lines),
    }
}

fn resolve_single(line: LineRef, total_lines: usize) -> Result<usize, SelectorError> {
    in_bounds(line.position(total_lines), total_lines).ok_or(SelectorError::OutOfRange {
        line: line.signed(),
        total: total_lines,
    })
}

/// Resolve an inclusive range.
///
/// A start past the last line is an error; an end past the last line is clamped. Ranges whose
/// bounds invert once signs are resolved select nothing.
fn resolve_range(
    start: Option<LineRef>,
    end: Option<LineRef>,
    total_lines: usize,
) -> Result<Option<RangeInclusive<usize>>, SelectorError> {
    let total = i64::try_from(total_lines).unwrap_or(i64::MAX);
    let first = start.map_or(1, |side| side.position(total_lines));
    let last = end.map_or(total, |side| side.position(total_lines));

    if first > total {
        return Err(SelectorError::OutOfRange {
            line: start.map_or(first, LineRef::signed),
            total: total_lines,
        });
    }

    if last < 1 || first > last {
        return Ok(None);
    }

    let first = usize::try_from(first.max(1)).unwrap_or(1);
    let last = usize::try_from(last.min(total)).unwrap_or(total_lines);
    Ok(Some(first..=last))
}

fn in_bounds(position: i64, total_lines: usize) -> Option<usize> {
    usize::try_from(position)
        .ok()
        .filter(|line| (1..=total_lines).contains(line))
}
