//! Named and indexed variable references. Named variables resolve against
//! the session table; indexed ones (`$1`, `$2`, ...) refer to the results of
//! earlier top-level expressions in the same session.

use winnow::error::{ContextError, ErrMode};
use winnow::PResult;

use super::lexing::{find_closing_character_index_of, read_number};
use crate::error::ParseError;
use crate::session::ParseSession;

/// Resolves a `${name}` reference to its last-known string value. Lookup
/// misses and malformed names are reported as distinct hard errors so the
/// reason can be surfaced verbatim.
pub fn read_variable(input: &mut &str, session: &mut ParseSession) -> PResult<String> {
    if !input.starts_with("${") {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    let Some(close) = find_closing_character_index_of('{', '}', input, 1) else {
        let offset = session.offset_of(input) + 1;
        return Err(session.record(ParseError::Unbalanced { open: '{', offset }));
    };
    let name = &input[2..close];
    if name.is_empty() {
        return Err(session.record(ParseError::MalformedVariable {
            reason: "empty variable name".to_owned(),
        }));
    }
    let starts_with_digit = name.chars().next().is_some_and(|c| c.is_ascii_digit());
    if starts_with_digit || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        let reason = format!("`{name}` is not a valid variable name");
        return Err(session.record(ParseError::MalformedVariable { reason }));
    }
    let Some(value) = session.variable(name) else {
        let name = name.to_owned();
        return Err(session.record(ParseError::UnknownVariable { name }));
    };
    let value = value.to_owned();
    *input = &input[close + 1..];
    Ok(value)
}

/// Parses `$N`, a 1-based reference to the result of an earlier top-level
/// expression, and returns the 0-based index.
pub fn read_dynamic_variable(input: &mut &str, session: &mut ParseSession) -> PResult<usize> {
    if !input.starts_with('$') || input.starts_with("${") {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    let mut rest = &input[1..];
    let Ok(number) = read_number(&mut rest) else {
        // a lone `$` is not a reference
        return Err(ErrMode::Backtrack(ContextError::new()));
    };
    if number < 1 {
        let reason = format!("`${number}` is not a valid result index");
        return Err(session.record(ParseError::MalformedVariable { reason }));
    }
    let index = (number - 1) as usize;
    if index >= session.start_nodes().len() {
        let name = format!("${number}");
        return Err(session.record(ParseError::UnknownVariable { name }));
    }
    *input = rest;
    Ok(index)
}
