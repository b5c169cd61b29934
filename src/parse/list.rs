//! Bracketed list literals: a comma-separated mix of discrete tokens and
//! `start-end` numeric ranges, with an optional trailing uniqueness
//! modifier.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use winnow::error::{ContextError, ErrMode};
use winnow::{PResult, Parser};

use super::lexing::{atomic, find_closing_character_index_of, read_number};
use crate::error::ParseError;
use crate::session::ParseSession;

/// Closed interval of 64-bit integers. `start <= end` is not enforced
/// syntactically, callers normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: i64,
    pub end: i64,
}

impl Range {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Swaps the bounds if they are reversed.
    pub fn normalized(self) -> Self {
        if self.start <= self.end {
            self
        } else {
            Self::new(self.end, self.start)
        }
    }

    /// Number of values in the range, saturating when the range spans the
    /// whole `i64` domain.
    pub fn width(&self) -> u64 {
        self.end.abs_diff(self.start).saturating_add(1)
    }

    pub fn contains(&self, value: i64) -> bool {
        let normalized = self.normalized();
        normalized.start <= value && value <= normalized.end
    }

    pub fn values(&self) -> RangeInclusive<i64> {
        let normalized = self.normalized();
        normalized.start..=normalized.end
    }
}

/// Post-processing modifier attached to a parsed list literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOperator {
    #[default]
    None,
    Unique,
}

/// One element of a list literal.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEntry {
    Token(String),
    Span(Range),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListContent {
    pub entries: Vec<ListEntry>,
}

impl ListContent {
    /// Number of outcomes [`ListContent::expand`] would enumerate, without
    /// enumerating them. Saturates instead of overflowing.
    pub fn outcome_count(&self) -> u64 {
        self.entries.iter().fold(0u64, |total, entry| {
            let width = match entry {
                ListEntry::Token(_) => 1,
                ListEntry::Span(range) => range.width(),
            };
            total.saturating_add(width)
        })
    }

    /// Enumerates every numeric outcome the list can produce, in order of
    /// appearance. Non-numeric tokens are skipped. With
    /// [`ListOperator::Unique`] repeated values are dropped.
    pub fn expand(&self, operator: ListOperator) -> Vec<i64> {
        let mut values = Vec::new();
        for entry in &self.entries {
            match entry {
                ListEntry::Span(range) => values.extend(range.values()),
                ListEntry::Token(token) => {
                    if let Ok(value) = token.parse() {
                        values.push(value);
                    }
                }
            }
        }
        if operator == ListOperator::Unique {
            let mut seen = HashSet::new();
            values.retain(|value| seen.insert(*value));
        }
        values
    }
}

/// Parses the `N-M` sub-grammar used inside list literals and for die-face
/// ranges.
pub fn read_dice_range(input: &mut &str) -> PResult<(i64, i64)> {
    atomic(|input: &mut &str| {
        let start = read_number(input)?;
        '-'.void().parse_next(input)?;
        let end = read_number(input)?;
        Ok((start, end))
    })
    .parse_next(input)
}

/// Parses a bracket-delimited, comma-separated sequence of tokens and
/// ranges. Fails without consuming on a malformed element; unbalanced
/// brackets are a hard error carrying the opener's offset.
pub fn read_list(input: &mut &str, session: &mut ParseSession) -> PResult<ListContent> {
    if !input.starts_with('[') {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    let Some(close) = find_closing_character_index_of('[', ']', input, 0) else {
        let offset = session.offset_of(input);
        return Err(session.record(ParseError::Unbalanced { open: '[', offset }));
    };

    let inner = &input[1..close];
    let mut entries = Vec::new();
    for element in inner.split(',') {
        let element = element.trim();
        if element.is_empty() {
            return Err(ErrMode::Backtrack(ContextError::new()));
        }
        let mut cursor = element;
        match read_dice_range(&mut cursor) {
            Ok((start, end)) if cursor.is_empty() => {
                entries.push(ListEntry::Span(Range::new(start, end)));
            }
            _ => entries.push(ListEntry::Token(element.to_owned())),
        }
    }

    *input = &input[close + 1..];
    Ok(ListContent { entries })
}

/// Recognizes the optional trailing uniqueness modifier. Absence yields
/// [`ListOperator::None`], never a failure.
pub fn read_list_operator(input: &mut &str) -> ListOperator {
    if let Some(rest) = input.strip_prefix('u') {
        *input = rest;
        ListOperator::Unique
    } else {
        ListOperator::None
    }
}

/// Occurrence weight of each distinct outcome of the list, in order of first
/// appearance.
pub fn read_probability(content: &ListContent) -> Vec<(String, u64)> {
    let mut weights: Vec<(String, u64)> = Vec::new();
    for entry in &content.entries {
        match entry {
            ListEntry::Token(token) => bump(&mut weights, token.clone()),
            ListEntry::Span(range) => {
                for value in range.values() {
                    bump(&mut weights, value.to_string());
                }
            }
        }
    }
    weights
}

fn bump(weights: &mut Vec<(String, u64)>, outcome: String) {
    if let Some((_, weight)) = weights.iter_mut().find(|(seen, _)| *seen == outcome) {
        *weight += 1;
    } else {
        weights.push((outcome, 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ParseOptions;

    fn session() -> ParseSession {
        ParseSession::new(ParseOptions::default())
    }

    #[test]
    fn test_read_dice_range() {
        let mut input = "1-3]";
        assert_eq!(read_dice_range(&mut input), Ok((1, 3)));
        assert_eq!(input, "]");
    }

    #[test]
    fn test_read_dice_range_failure_leaves_cursor_untouched() {
        let mut input = "12,";
        assert!(read_dice_range(&mut input).is_err());
        assert_eq!(input, "12,");
    }

    #[test]
    fn test_read_list_mixing_tokens_and_ranges() {
        let mut session = session();
        let mut input = "[1-3,5,fire]u";
        let content = read_list(&mut input, &mut session).unwrap();
        assert_eq!(
            content.entries,
            vec![
                ListEntry::Span(Range::new(1, 3)),
                ListEntry::Token("5".to_owned()),
                ListEntry::Token("fire".to_owned()),
            ]
        );
        assert_eq!(input, "u");
    }

    #[test]
    fn test_read_list_unbalanced() {
        let mut session = session();
        session.begin("[1,2");
        let mut input = "[1,2";
        assert!(read_list(&mut input, &mut session).is_err());
        assert_eq!(
            session.first_error(),
            Some(ParseError::Unbalanced {
                open: '[',
                offset: 0
            })
        );
        assert_eq!(input, "[1,2");
    }

    #[test]
    fn test_read_list_empty_element() {
        let mut session = session();
        let mut input = "[1,,3]";
        assert!(read_list(&mut input, &mut session).is_err());
        assert_eq!(input, "[1,,3]");
    }

    #[test]
    fn test_list_expansion_round_trip() {
        let mut session = session();
        let mut input = "[1-3,5,7-8]";
        let content = read_list(&mut input, &mut session).unwrap();
        assert_eq!(content.expand(ListOperator::None), vec![1, 2, 3, 5, 7, 8]);
    }

    #[test]
    fn test_unique_expansion_drops_repeats() {
        let mut session = session();
        let mut input = "[1-3,2-4]";
        let content = read_list(&mut input, &mut session).unwrap();

        assert_eq!(
            content.expand(ListOperator::None),
            vec![1, 2, 3, 2, 3, 4]
        );
        assert_eq!(content.expand(ListOperator::Unique), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_read_list_operator() {
        let mut input = "u rest";
        assert_eq!(read_list_operator(&mut input), ListOperator::Unique);
        assert_eq!(input, " rest");

        let mut input = "x";
        assert_eq!(read_list_operator(&mut input), ListOperator::None);
        assert_eq!(input, "x");
    }

    #[test]
    fn test_read_probability_counts_overlaps() {
        let mut session = session();
        let mut input = "[1-3,2-4]";
        let content = read_list(&mut input, &mut session).unwrap();
        let weights = read_probability(&content);

        assert_eq!(
            weights,
            vec![
                ("1".to_owned(), 1),
                ("2".to_owned(), 2),
                ("3".to_owned(), 2),
                ("4".to_owned(), 1),
            ]
        );
    }

    #[test]
    fn test_read_probability_of_plain_tokens() {
        let content = ListContent {
            entries: vec![
                ListEntry::Token("fire".to_owned()),
                ListEntry::Token("ice".to_owned()),
                ListEntry::Token("fire".to_owned()),
            ],
        };
        let weights = read_probability(&content);
        assert_eq!(
            weights,
            vec![("fire".to_owned(), 2), ("ice".to_owned(), 1)]
        );
    }

    #[test]
    fn test_width_saturates_on_the_full_domain() {
        let range = Range::new(i64::MIN, i64::MAX);
        assert_eq!(range.width(), u64::MAX);
        assert!(range.contains(0));
    }

    #[test]
    fn test_outcome_count_matches_expansion_and_saturates() {
        let content = ListContent {
            entries: vec![
                ListEntry::Span(Range::new(1, 3)),
                ListEntry::Token("fire".to_owned()),
                ListEntry::Span(Range::new(7, 8)),
            ],
        };
        assert_eq!(content.outcome_count(), 6);

        let huge = ListContent {
            entries: vec![
                ListEntry::Span(Range::new(i64::MIN, i64::MAX)),
                ListEntry::Span(Range::new(1, 2)),
            ],
        };
        assert_eq!(huge.outcome_count(), u64::MAX);
    }

    #[test]
    fn test_range_normalization() {
        let range = Range::new(8, 3).normalized();
        assert_eq!((range.start, range.end), (3, 8));
        assert_eq!(range.width(), 6);
        assert!(range.contains(5));
        assert!(!range.contains(9));
    }
}
