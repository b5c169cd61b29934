//! The dice-roller grammar: `NdM` or `Nd[a-b]` followed by any number of
//! modifiers (filters, conditionals, painter configuration, sorting, the
//! uniqueness flag).

use winnow::error::{ContextError, ErrMode};
use winnow::stream::Stream;
use winnow::{PResult, Parser};

use super::expression::{read_expression, skip_spaces};
use super::lexing::{find_closing_character_index_of, read_number, read_string};
use super::list::{read_dice_range, read_list_operator, ListOperator, Range};
use super::operators::{read_condition_kind, ConditionKind};
use super::validator::{is_valid_validator, matches_every_face, read_validator, ConditionState};
use crate::error::ParseError;
use crate::node::{FilterBehavior, NodeId, NodeKind, PainterParameter};
use crate::parse::Validator;
use crate::session::ParseSession;

/// `diceRoller := integer? 'd' faces modifier*`. The missing count defaults
/// to one die.
pub fn read_dice_roller(input: &mut &str, session: &mut ParseSession) -> PResult<NodeId> {
    let start = input.checkpoint();
    let count = read_number(input).unwrap_or(1);
    let marker: PResult<()> = 'd'.void().parse_next(input);
    if count < 1 || marker.is_err() {
        input.reset(&start);
        return Err(ErrMode::Backtrack(ContextError::new()));
    }

    let faces = match read_faces(input, session) {
        Ok(faces) => faces,
        Err(err) => {
            if matches!(err, ErrMode::Backtrack(_)) {
                input.reset(&start);
            }
            return Err(err);
        }
    };

    let roller = session.arena_mut().insert(NodeKind::Roller {
        count,
        faces,
        unique: false,
    });
    read_dice_modifiers(input, session, roller)?;
    Ok(roller)
}

/// `faces := integer | '[' range ']'`
fn read_faces(input: &mut &str, session: &mut ParseSession) -> PResult<Range> {
    if input.starts_with('[') {
        let Some(_) = find_closing_character_index_of('[', ']', input, 0) else {
            let offset = session.offset_of(input);
            return Err(session.record(ParseError::Unbalanced { open: '[', offset }));
        };
        *input = &input[1..];
        let Ok((range_start, range_end)) = read_dice_range(input) else {
            return Err(session.syntax_error(input));
        };
        let close: PResult<()> = ']'.void().parse_next(input);
        if close.is_err() {
            return Err(session.syntax_error(input));
        }
        return Ok(Range::new(range_start, range_end).normalized());
    }
    let Ok(faces) = read_number(input) else {
        return Err(ErrMode::Backtrack(ContextError::new()));
    };
    if faces < 1 {
        return Err(session.syntax_error(input));
    }
    Ok(Range::new(1, faces))
}

/// Consumes every modifier following a roller (or list roll) and appends
/// the matching stages to its chain.
pub(crate) fn read_dice_modifiers(
    input: &mut &str,
    session: &mut ParseSession,
    roller: NodeId,
) -> PResult<()> {
    loop {
        let before = input.checkpoint();

        if let Ok(behavior) = read_filter_behavior(input) {
            match read_validator(input, session, false) {
                Ok(validator) => {
                    attach_filter(session, roller, behavior, validator)?;
                    continue;
                }
                Err(err @ ErrMode::Cut(_)) => return Err(err),
                // the letter was not a filter after all
                Err(_) => input.reset(&before),
            }
        }

        match read_validator(input, session, false) {
            Ok(validator) => {
                attach_filter(session, roller, FilterBehavior::Filter, validator)?;
                continue;
            }
            Err(err @ ErrMode::Cut(_)) => return Err(err),
            Err(_) => {}
        }

        match read_conditional(input, session, roller) {
            Ok(true) => continue,
            Ok(false) => {}
            Err(err) => return Err(err),
        }

        match read_painter_parameter(input, session) {
            Ok(parameters) => {
                session
                    .arena_mut()
                    .append(roller, NodeKind::Painter { parameters });
                continue;
            }
            Err(err @ ErrMode::Cut(_)) => return Err(err),
            Err(_) => {}
        }

        if let Some(rest) = input.strip_prefix('s') {
            *input = rest;
            let ascending = read_ascending(input);
            session.arena_mut().add_sort(roller, ascending);
            continue;
        }

        if read_list_operator(input) == ListOperator::Unique {
            set_unique(session, roller);
            continue;
        }

        return Ok(());
    }
}

/// Reads the sort direction token. `a` sorts ascending, `d` or no token at
/// all sorts descending.
pub fn read_ascending(input: &mut &str) -> bool {
    if let Some(rest) = input.strip_prefix('a') {
        *input = rest;
        return true;
    }
    if let Some(rest) = input.strip_prefix('d') {
        *input = rest;
    }
    false
}

fn read_filter_behavior(input: &mut &str) -> PResult<FilterBehavior> {
    let behavior = match input.chars().next() {
        Some('e') => FilterBehavior::Explode,
        Some('r') => FilterBehavior::Reroll,
        Some('c') => FilterBehavior::Count,
        Some('f') => FilterBehavior::Filter,
        _ => return Err(ErrMode::Backtrack(ContextError::new())),
    };
    *input = &input[1..];
    Ok(behavior)
}

/// Binds a validator to the chain after checking it against the roll it
/// would filter. Incompatible validators and endless explodes abort the
/// parse; inapplicable ones abort or are dropped per the session options.
fn attach_filter(
    session: &mut ParseSession,
    roller: NodeId,
    behavior: FilterBehavior,
    validator: Validator,
) -> PResult<()> {
    let previous = Some(session.arena().get_latest_node(roller));
    match is_valid_validator(session.arena(), previous, &validator) {
        ConditionState::Incompatible => {
            return Err(session.record(ParseError::UnreachableValidator))
        }
        ConditionState::NotApplicable => {
            if session.options().drop_inapplicable_filters {
                return Ok(());
            }
            return Err(session.record(ParseError::InapplicableValidator));
        }
        ConditionState::Compatible => {}
    }
    if behavior == FilterBehavior::Explode
        && matches_every_face(session.arena(), previous, &validator)
    {
        return Err(session.record(ParseError::EndlessExplode));
    }
    session
        .arena_mut()
        .append(roller, NodeKind::Filter { behavior, validator });
    Ok(())
}

fn set_unique(session: &mut ParseSession, roller: NodeId) {
    match session.arena_mut().kind_mut(roller) {
        NodeKind::Roller { unique, .. } => *unique = true,
        NodeKind::ListRoll { operator, .. } => *operator = ListOperator::Unique,
        _ => {}
    }
}

/// `conditional := 'i' conditionKind? '[' validator ']' branch branch?`
/// Returns `Ok(false)` without consuming when the input is not a
/// conditional.
fn read_conditional(
    input: &mut &str,
    session: &mut ParseSession,
    roller: NodeId,
) -> PResult<bool> {
    if !input.starts_with('i') {
        return Ok(false);
    }
    let start = input.checkpoint();
    *input = &input[1..];
    let kind = read_condition_kind(input);
    if !input.starts_with('[') {
        input.reset(&start);
        return Ok(false);
    }
    let validator = match read_validator(input, session, false) {
        Ok(validator) => validator,
        Err(err @ ErrMode::Cut(_)) => return Err(err),
        Err(_) => {
            input.reset(&start);
            return Ok(false);
        }
    };

    session.enter()?;
    let result = read_branches(input, session, roller, kind, validator);
    session.leave();
    result.map(|()| true)
}

fn read_branches(
    input: &mut &str,
    session: &mut ParseSession,
    roller: NodeId,
    kind: ConditionKind,
    validator: Validator,
) -> PResult<()> {
    let Some(true_branch) = read_branch(input, session)? else {
        return Err(session.syntax_error(input));
    };
    let false_branch = read_branch(input, session)?;
    session.arena_mut().append(
        roller,
        NodeKind::Conditional {
            kind,
            validator,
            true_branch,
            false_branch,
        },
    );
    Ok(())
}

/// `branch := '{' (string | expression) '}'`
fn read_branch(input: &mut &str, session: &mut ParseSession) -> PResult<Option<NodeId>> {
    if !input.starts_with('{') {
        return Ok(None);
    }
    if find_closing_character_index_of('{', '}', input, 0).is_none() {
        let offset = session.offset_of(input);
        return Err(session.record(ParseError::Unbalanced { open: '{', offset }));
    }
    *input = &input[1..];
    skip_spaces(input);
    let node = if input.starts_with('"') {
        let text = read_string(input)?;
        session.arena_mut().insert(NodeKind::Text(text))
    } else {
        read_expression(input, session)?
    };
    skip_spaces(input);
    let close: PResult<()> = '}'.void().parse_next(input);
    if close.is_err() {
        return Err(session.syntax_error(input));
    }
    Ok(Some(node))
}

/// `painter := 'p' '[' count ':' color (',' count ':' color)* ']'`
/// Self-contained display configuration consumed by the painting stage.
pub fn read_painter_parameter(
    input: &mut &str,
    session: &mut ParseSession,
) -> PResult<Vec<PainterParameter>> {
    if !input.starts_with("p[") {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    let Some(close) = find_closing_character_index_of('[', ']', input, 1) else {
        let offset = session.offset_of(input) + 1;
        return Err(session.record(ParseError::Unbalanced { open: '[', offset }));
    };

    let inner = &input[2..close];
    let mut parameters = Vec::new();
    for element in inner.split(',') {
        let Some((count_text, color)) = element.split_once(':') else {
            return Err(ErrMode::Backtrack(ContextError::new()));
        };
        let mut cursor = count_text.trim();
        let Ok(count) = read_number(&mut cursor) else {
            return Err(ErrMode::Backtrack(ContextError::new()));
        };
        let color = color.trim();
        if !cursor.is_empty() || count < 1 || color.is_empty() {
            return Err(ErrMode::Backtrack(ContextError::new()));
        }
        parameters.push(PainterParameter {
            count,
            color: color.to_owned(),
        });
    }
    if parameters.is_empty() {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }

    *input = &input[close + 1..];
    Ok(parameters)
}
