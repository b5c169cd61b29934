//! Character-class scanners every higher-level grammar builds on. Each
//! primitive consumes a validated prefix on success and leaves the cursor
//! byte-for-byte untouched on failure.

use winnow::ascii::digit1;
use winnow::combinator::{delimited, opt};
use winnow::error::ContextError;
use winnow::stream::Stream;
use winnow::token::{one_of, take_till};
use winnow::{PResult, Parser};

/// Wraps a parser so the cursor is reset whenever it fails, even after a
/// partial match.
pub(crate) fn atomic<'i, O, P>(mut parser: P) -> impl FnMut(&mut &'i str) -> PResult<O>
where
    P: Parser<&'i str, O, ContextError>,
{
    move |input: &mut &'i str| {
        let start = input.checkpoint();
        parser.parse_next(input).map_err(|err| {
            input.reset(&start);
            err
        })
    }
}

/// Consumes an optional sign and a maximal run of digits.
pub fn read_number(input: &mut &str) -> PResult<i64> {
    atomic(
        (opt(one_of(['+', '-'])), digit1)
            .take()
            .try_map(str::parse::<i64>),
    )
    .parse_next(input)
}

/// Consumes a double-quoted literal. Fails on an unterminated quote.
pub fn read_string(input: &mut &str) -> PResult<String> {
    atomic(delimited('"', take_till(0.., '"'), '"').map(|text: &str| text.to_owned()))
        .parse_next(input)
}

pub fn read_open_parentheses(input: &mut &str) -> PResult<()> {
    '('.void().parse_next(input)
}

pub fn read_close_parentheses(input: &mut &str) -> PResult<()> {
    ')'.void().parse_next(input)
}

pub fn read_comma(input: &mut &str) -> PResult<()> {
    ','.void().parse_next(input)
}

/// Offset of the close matching the opener at or after `offset`, tracking
/// nesting depth so a close inside a nested literal is never picked up.
/// Returns `None` when the text ends with an opener still unmatched.
pub fn find_closing_character_index_of(
    open: char,
    closing: char,
    text: &str,
    offset: usize,
) -> Option<usize> {
    let mut depth = 0usize;
    for (index, character) in text.char_indices() {
        if index < offset {
            continue;
        }
        if character == open {
            depth += 1;
        } else if character == closing {
            if depth == 0 {
                return None;
            }
            depth -= 1;
            if depth == 0 {
                return Some(index);
            }
        }
    }
    None
}
