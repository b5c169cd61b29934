//! `expression := term (arithmeticOp term)*`. Terms become chain roots in
//! the arena; every arithmetic operator appends a stage whose operand is
//! the root of its own sub-chain.

use winnow::ascii::multispace0;
use winnow::error::{ContextError, ErrMode};
use winnow::stream::Stream;
use winnow::{PResult, Parser};

use super::dice::{read_dice_modifiers, read_dice_roller};
use super::lexing::{
    find_closing_character_index_of, read_close_parentheses, read_number, read_open_parentheses,
    read_string,
};
use super::list::{read_list, read_list_operator};
use super::operators::read_arithmetic_operator;
use super::variable::{read_dynamic_variable, read_variable};
use crate::error::ParseError;
use crate::node::{NodeId, NodeKind};
use crate::session::ParseSession;

pub(crate) fn skip_spaces(input: &mut &str) {
    let _: PResult<&str> = multispace0.parse_next(input);
}

/// Parses one top-level expression and returns the root of its chain.
pub fn read_expression(input: &mut &str, session: &mut ParseSession) -> PResult<NodeId> {
    skip_spaces(input);
    let root = read_term(input, session)?;
    loop {
        skip_spaces(input);
        let before = input.checkpoint();
        let Ok(operator) = read_arithmetic_operator(input) else {
            break;
        };
        skip_spaces(input);
        let operand = match read_term(input, session) {
            Ok(operand) => operand,
            Err(err @ ErrMode::Cut(_)) => return Err(err),
            Err(_) => {
                input.reset(&before);
                return Err(session.syntax_error(input));
            }
        };
        let stage = session
            .arena_mut()
            .insert(NodeKind::Arithmetic { operator, operand });
        let tail = session.arena().get_latest_node(root);
        session.arena_mut().link(tail, stage);
    }
    Ok(root)
}

/// `term := diceRoller | number | string | variable | '(' expression ')'
/// | list`
pub fn read_term(input: &mut &str, session: &mut ParseSession) -> PResult<NodeId> {
    match read_dice_roller(input, session) {
        Ok(id) => return Ok(id),
        Err(err @ ErrMode::Cut(_)) => return Err(err),
        Err(_) => {}
    }
    if let Ok(number) = read_number(input) {
        return Ok(session.arena_mut().insert(NodeKind::Number(number)));
    }
    if let Ok(text) = read_string(input) {
        return Ok(session.arena_mut().insert(NodeKind::Text(text)));
    }
    match read_dynamic_variable(input, session) {
        Ok(index) => return Ok(session.arena_mut().insert(NodeKind::Variable { index })),
        Err(err @ ErrMode::Cut(_)) => return Err(err),
        Err(_) => {}
    }
    match read_variable(input, session) {
        Ok(value) => {
            // a variable holds its last string representation; numeric
            // values flow back into the grammar as numbers
            let kind = match value.parse::<i64>() {
                Ok(number) => NodeKind::Number(number),
                Err(_) => NodeKind::Text(value),
            };
            return Ok(session.arena_mut().insert(kind));
        }
        Err(err @ ErrMode::Cut(_)) => return Err(err),
        Err(_) => {}
    }
    if input.starts_with('(') {
        return read_parenthesized(input, session);
    }
    match read_list_roll(input, session) {
        Ok(id) => return Ok(id),
        Err(err @ ErrMode::Cut(_)) => return Err(err),
        Err(_) => {}
    }
    Err(ErrMode::Backtrack(ContextError::new()))
}

fn read_parenthesized(input: &mut &str, session: &mut ParseSession) -> PResult<NodeId> {
    if find_closing_character_index_of('(', ')', input, 0).is_none() {
        let offset = session.offset_of(input);
        return Err(session.record(ParseError::Unbalanced { open: '(', offset }));
    }
    session.enter()?;
    let result = parenthesized_body(input, session);
    session.leave();
    result
}

fn parenthesized_body(input: &mut &str, session: &mut ParseSession) -> PResult<NodeId> {
    read_open_parentheses(input)?;
    let root = read_expression(input, session)?;
    skip_spaces(input);
    if read_close_parentheses(input).is_err() {
        return Err(session.syntax_error(input));
    }
    Ok(root)
}

fn read_list_roll(input: &mut &str, session: &mut ParseSession) -> PResult<NodeId> {
    let content = read_list(input, session)?;
    let operator = read_list_operator(input);
    let id = session
        .arena_mut()
        .insert(NodeKind::ListRoll { content, operator });
    read_dice_modifiers(input, session, id)?;
    Ok(id)
}
