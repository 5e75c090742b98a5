//! Domain models for line selectors and include tags.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use serde::Serialize;

/// A line reference as written in a selector: a 1-based magnitude plus a sign.
///
/// Negative references count from the end of the file, so `-1` is the last line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LineRef {
    pub magnitude: NonZeroUsize,
    pub negative: bool,
}

impl LineRef {
    /// The value exactly as the author wrote it, sign included.
    pub fn signed(self) -> i64 {
        let magnitude = i64::try_from(self.magnitude.get()).unwrap_or(i64::MAX);
        if self.negative { -magnitude } else { magnitude }
    }

    /// Concrete 1-based position against a file of `total` lines.
    ///
    /// The result may fall outside `1..=total`; callers decide whether that is an error or a clamp.
    pub fn position(self, total: usize) -> i64 {
        let total = i64::try_from(total).unwrap_or(i64::MAX);
        let magnitude = self.signed().abs();
        if self.negative {
            total - magnitude + 1
        } else {
            magnitude
        }
    }
}

/// One comma-separated clause of a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    /// Exactly one line.
    Single { exclusion: bool, line: LineRef },
    /// An inclusive span; a missing bound is open on that end.
    Range {
        exclusion: bool,
        start: Option<LineRef>,
        end: Option<LineRef>,
    },
}

impl Selection {
    pub fn is_exclusion(&self) -> bool {
        match self {
            Selection::Single { exclusion, .. } | Selection::Range { exclusion, .. } => *exclusion,
        }
    }

    pub fn has_negative_index(&self) -> bool {
        match self {
            Selection::Single { line, .. } => line.negative,
            Selection::Range { start, end, .. } => {
                start.is_some_and(|side| side.negative) || end.is_some_and(|side| side.negative)
            }
        }
    }
}

/// Result of parsing a selector string. An empty clause list selects every line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedSelector {
    pub selections: Vec<Selection>,
    pub has_negative_indexing: bool,
    pub has_exclusions: bool,
}

impl ParsedSelector {
    /// Build a selector from clauses, deriving the summary flags.
    pub fn from_selections(selections: Vec<Selection>) -> Self {
        let has_negative_indexing = selections.iter().any(Selection::has_negative_index);
        let has_exclusions = selections.iter().any(Selection::is_exclusion);
        Self {
            selections,
            has_negative_indexing,
            has_exclusions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Whether resolution starts from every line rather than from the inclusion clauses.
    pub fn selects_all_by_default(&self) -> bool {
        self.selections.iter().all(Selection::is_exclusion)
    }
}

/// A parsed `@includeExample` tag value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeExampleTag {
    pub path: PathBuf,
    /// `None` when the tag carried no selector and the whole file is wanted.
    pub selector: Option<ParsedSelector>,
}
