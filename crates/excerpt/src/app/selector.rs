//! Parsing of the line selector mini-language.
//!
//! A selector is a comma-separated list of clauses. Each clause is a single line (`7`, `-1`) or
//! an inclusive range (`2:8`, `5:`, `:-3`), optionally prefixed by `!` to exclude it.

use std::num::NonZeroUsize;

use crate::domain::errors::SelectorError;
use crate::domain::model::{LineRef, ParsedSelector, Selection};

/// Parse a selector string into its clauses.
///
/// An empty selector, or a lone `:`, selects every line.
pub fn parse(selector: &str) -> Result<ParsedSelector, SelectorError> {
    let trimmed = selector.trim();
    if trimmed.is_empty() || trimmed == ":" {
        return Ok(ParsedSelector::default());
    }

    reject_dash_ranges(trimmed)?;

    let mut selections = Vec::new();
    for part in trimmed.split(',').map(str::trim) {
        if part.is_empty() {
            continue;
        }
        let (exclusion, clause) = match part.strip_prefix('!') {
            Some(rest) => (true, rest.trim()),
            None => (false, part),
        };
        selections.push(parse_clause(clause, exclusion)?);
    }

    Ok(ParsedSelector::from_selections(selections))
}

/// Reject clauses written in the pre-v3 `start-end` dialect before anything else is interpreted.
fn reject_dash_ranges(selector: &str) -> Result<(), SelectorError> {
    for part in selector.split(',').map(str::trim) {
        let clause = part.strip_prefix('!').map_or(part, str::trim);
        if clause.contains(':') || !clause.contains('-') || is_negative_number(clause) {
            continue;
        }
        return Err(SelectorError::LegacyDashSyntax {
            literal: part.to_owned(),
            suggestion: colon_rewrite(part),
        });
    }
    Ok(())
}

fn is_negative_number(text: &str) -> bool {
    text.strip_prefix('-')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Rewrite the separating dash of a legacy clause as a colon, keeping a leading sign intact.
fn colon_rewrite(part: &str) -> String {
    let (prefix, clause) = match part.strip_prefix('!') {
        Some(rest) => ("!", rest.trim()),
        None => ("", part),
    };
    let separator = clause
        .char_indices()
        .skip(1)
        .find(|(_, ch)| *ch == '-')
        .map(|(idx, _)| idx);

    match separator {
        Some(idx) => format!("{prefix}{}:{}", &clause[..idx], &clause[idx + 1..]),
        None => format!("{prefix}{}", clause.replacen('-', ":", 1)),
    }
}

fn parse_clause(clause: &str, exclusion: bool) -> Result<Selection, SelectorError> {
    let Some((start_text, end_text)) = clause.split_once(':') else {
        let line = parse_line_ref(clause, "line number")?;
        return Ok(Selection::Single { exclusion, line });
    };

    let start = parse_side(start_text, "range start")?;
    let end = parse_side(end_text, "range end")?;

    // Ordering of ranges with a negative side depends on the file length.
    if let (Some(start), Some(end)) = (start, end)
        && !start.negative
        && !end.negative
        && start.magnitude > end.magnitude
    {
        return Err(SelectorError::InvalidRangeOrder {
            start: start.magnitude.get(),
            end: end.magnitude.get(),
        });
    }

    Ok(Selection::Range {
        exclusion,
        start,
        end,
    })
}

fn parse_side(text: &str, context: &'static str) -> Result<Option<LineRef>, SelectorError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    parse_line_ref(text, context).map(Some)
}

fn parse_line_ref(token: &str, context: &'static str) -> Result<LineRef, SelectorError> {
    let invalid = || SelectorError::InvalidLineNumber {
        context,
        token: token.to_owned(),
    };

    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let value: i64 = digits.parse().map_err(|_| invalid())?;
    let magnitude = usize::try_from(value).map_err(|_| invalid())?;
    let magnitude = NonZeroUsize::new(magnitude).ok_or(SelectorError::ZeroLineNumber { context })?;

    Ok(LineRef { magnitude, negative })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(value: i64) -> LineRef {
        let magnitude = NonZeroUsize::new(value.unsigned_abs() as usize).unwrap();
        LineRef {
            magnitude,
            negative: value < 0,
        }
    }

    #[test]
    fn empty_and_lone_colon_select_everything() {
        for input in ["", "   ", ":", " : "] {
            let parsed = parse(input).unwrap();
            assert!(parsed.is_empty(), "{input:?}");
            assert!(!parsed.has_negative_indexing);
            assert!(!parsed.has_exclusions);
        }
    }

    #[test]
    fn parses_single_lines() {
        let parsed = parse("3, -1").unwrap();
        assert_eq!(
            parsed.selections,
            vec![
                Selection::Single {
                    exclusion: false,
                    line: line(3)
                },
                Selection::Single {
                    exclusion: false,
                    line: line(-1)
                },
            ]
        );
        assert!(parsed.has_negative_indexing);
        assert!(!parsed.has_exclusions);
    }

    #[test]
    fn parses_ranges_with_open_ends() {
        let parsed = parse("2:8,5:,:4,-3:").unwrap();
        assert_eq!(
            parsed.selections,
            vec![
                Selection::Range {
                    exclusion: false,
                    start: Some(line(2)),
                    end: Some(line(8)),
                },
                Selection::Range {
                    exclusion: false,
                    start: Some(line(5)),
                    end: None,
                },
                Selection::Range {
                    exclusion: false,
                    start: None,
                    end: Some(line(4)),
                },
                Selection::Range {
                    exclusion: false,
                    start: Some(line(-3)),
                    end: None,
                },
            ]
        );
        assert!(parsed.has_negative_indexing);
    }

    #[test]
    fn parses_exclusions() {
        let parsed = parse("1:10,!5:7,!9").unwrap();
        assert!(parsed.has_exclusions);
        assert!(!parsed.has_negative_indexing);
        assert!(!parsed.selections[0].is_exclusion());
        assert!(parsed.selections[1].is_exclusion());
        assert!(parsed.selections[2].is_exclusion());
    }

    #[test]
    fn skips_empty_parts() {
        let parsed = parse("1,,3,").unwrap();
        assert_eq!(parsed.selections.len(), 2);
    }

    #[test]
    fn zero_is_rejected_everywhere() {
        assert_eq!(
            parse("0").unwrap_err(),
            SelectorError::ZeroLineNumber {
                context: "line number"
            }
        );
        assert_eq!(
            parse("0:4").unwrap_err(),
            SelectorError::ZeroLineNumber {
                context: "range start"
            }
        );
        assert_eq!(
            parse("2:-0").unwrap_err(),
            SelectorError::ZeroLineNumber {
                context: "range end"
            }
        );
        assert!(
            parse("!0")
                .unwrap_err()
                .to_string()
                .contains("must be positive or negative, not zero")
        );
    }

    #[test]
    fn non_numeric_tokens_are_echoed() {
        let err = parse("1,abc").unwrap_err();
        assert_eq!(
            err,
            SelectorError::InvalidLineNumber {
                context: "line number",
                token: "abc".into()
            }
        );
        assert!(err.to_string().contains("'abc'"));

        let err = parse("2:x").unwrap_err();
        assert!(err.to_string().contains("range end"));
        assert!(err.to_string().contains("'x'"));

        assert!(matches!(
            parse("+3").unwrap_err(),
            SelectorError::InvalidLineNumber { .. }
        ));
        assert!(matches!(
            parse("1:2:3").unwrap_err(),
            SelectorError::InvalidLineNumber { .. }
        ));
    }

    #[test]
    fn positive_inverted_range_fails_at_parse_time() {
        assert_eq!(
            parse("10:5").unwrap_err(),
            SelectorError::InvalidRangeOrder { start: 10, end: 5 }
        );
        assert!(parse("5:5").is_ok());
    }

    #[test]
    fn signed_ranges_defer_ordering() {
        assert!(parse("-2:3").is_ok());
        assert!(parse("2:-5").is_ok());
        assert!(parse("-1:-5").is_ok());
    }

    #[test]
    fn rejects_legacy_dash_ranges_with_rewrite() {
        let err = parse("2-4").unwrap_err();
        assert_eq!(
            err,
            SelectorError::LegacyDashSyntax {
                literal: "2-4".into(),
                suggestion: "2:4".into()
            }
        );
        let message = err.to_string();
        assert!(message.contains("'2-4'"));
        assert!(message.contains("v3.0.0"));
        assert!(message.contains("'2:4'"));
    }

    #[test]
    fn legacy_check_runs_before_other_parsing() {
        let err = parse("0,5-7,11").unwrap_err();
        assert_eq!(
            err,
            SelectorError::LegacyDashSyntax {
                literal: "5-7".into(),
                suggestion: "5:7".into()
            }
        );

        let err = parse("!-5--2").unwrap_err();
        assert_eq!(
            err,
            SelectorError::LegacyDashSyntax {
                literal: "!-5--2".into(),
                suggestion: "!-5:-2".into()
            }
        );
    }

    #[test]
    fn negative_singles_are_not_legacy() {
        let parsed = parse("-5,!-2").unwrap();
        assert_eq!(parsed.selections.len(), 2);
    }
}
