//! Predicate trees over roll outcomes: a single comparison, a face range, a
//! modulo condition, or a bracketed AND/OR composite of those.

use winnow::error::{ContextError, ErrMode};
use winnow::stream::Stream;
use winnow::PResult;

use super::lexing::{find_closing_character_index_of, read_number};
use super::list::{read_dice_range, Range};
use super::operators::{
    read_compare_operator, read_condition_operator, read_logic_operation, CompareOperator,
    ConditionOperator, LogicOperation,
};
use crate::error::ParseError;
use crate::node::{NodeArena, NodeId, NodeKind};
use crate::session::ParseSession;

/// Ranges wider than this are assumed reachable instead of being probed
/// face by face.
const REACHABILITY_PROBE_LIMIT: u64 = 10_000;

/// Compatibility between a validator and the node it would attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionState {
    Compatible,
    Incompatible,
    /// The validator is meaningless against this node, e.g. a numeric
    /// threshold with no roll to bind to.
    NotApplicable,
}

/// Predicate over a produced roll value.
#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    /// One comparison against a threshold, e.g. `>=3`.
    Compare {
        operator: CompareOperator,
        value: i64,
    },
    /// Membership in a face range, e.g. `[2-5]`.
    Interval(Range),
    /// Comparison applied to `value % divisor`, e.g. `%2=0`.
    Operation {
        condition: ConditionOperator,
        divisor: i64,
        operator: CompareOperator,
        value: i64,
    },
    /// Children combined left-to-right; `operations` holds the joiner
    /// between each adjacent pair.
    Composite {
        children: Vec<Validator>,
        operations: Vec<LogicOperation>,
    },
}

impl Validator {
    /// Whether `value` passes the predicate. Composite children are
    /// evaluated left-to-right and short-circuit per the joining operator.
    pub fn check(&self, value: i64) -> bool {
        match self {
            Validator::Compare {
                operator,
                value: threshold,
            } => operator.compare(value, *threshold),
            Validator::Interval(range) => range.contains(value),
            Validator::Operation {
                condition: ConditionOperator::Modulo,
                divisor,
                operator,
                value: threshold,
            } => *divisor != 0 && operator.compare(value % divisor, *threshold),
            Validator::Composite {
                children,
                operations,
            } => {
                let mut children = children.iter();
                let Some(first) = children.next() else {
                    return false;
                };
                let mut result = first.check(value);
                for (operation, child) in operations.iter().zip(children) {
                    result = match operation {
                        LogicOperation::And => result && child.check(value),
                        LogicOperation::Or => result || child.check(value),
                        LogicOperation::ExclusiveOr => result ^ child.check(value),
                    };
                }
                result
            }
        }
    }
}

/// Parses one predicate: a modulo condition, a comparison + threshold, or —
/// when already inside brackets — a bare face range. A leading `[` opens a
/// composite. `has_square_brackets` tells whether the caller has already
/// consumed the surrounding brackets.
pub fn read_validator(
    input: &mut &str,
    session: &mut ParseSession,
    has_square_brackets: bool,
) -> PResult<Validator> {
    if input.starts_with('[') {
        return read_composite_validator(input, session);
    }
    match operation_condition(input, session) {
        Ok(validator) => return Ok(validator),
        Err(err @ ErrMode::Cut(_)) => return Err(err),
        Err(_) => {}
    }
    if let Ok(validator) = boolean_condition(input) {
        return Ok(validator);
    }
    if has_square_brackets {
        if let Ok((start, end)) = read_dice_range(input) {
            return Ok(Validator::Interval(Range::new(start, end).normalized()));
        }
    }
    Err(ErrMode::Backtrack(ContextError::new()))
}

fn boolean_condition(input: &mut &str) -> PResult<Validator> {
    let start = input.checkpoint();
    let operator = read_compare_operator(input)?;
    match read_number(input) {
        Ok(value) => Ok(Validator::Compare { operator, value }),
        Err(err) => {
            input.reset(&start);
            Err(err)
        }
    }
}

fn operation_condition(input: &mut &str, session: &mut ParseSession) -> PResult<Validator> {
    let start = input.checkpoint();
    let condition = read_condition_operator(input)?;
    let result = (|| {
        let divisor = read_number(input)?;
        if divisor == 0 {
            return Err(session.syntax_error(*input));
        }
        let operator = read_compare_operator(input)?;
        let value = read_number(input)?;
        Ok(Validator::Operation {
            condition,
            divisor,
            operator,
            value,
        })
    })();
    if result.is_err() {
        input.reset(&start);
    }
    result
}

/// Parses `[validator (logicOp validator)*]` into a composite tree,
/// left-to-right, no precedence beyond explicit bracketing. A single
/// bracketed validator is returned unwrapped.
pub fn read_composite_validator(
    input: &mut &str,
    session: &mut ParseSession,
) -> PResult<Validator> {
    if !input.starts_with('[') {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    if find_closing_character_index_of('[', ']', input, 0).is_none() {
        let offset = session.offset_of(input);
        return Err(session.record(ParseError::Unbalanced { open: '[', offset }));
    }
    session.enter()?;
    let result = composite_body(input, session);
    session.leave();
    result
}

fn composite_body(input: &mut &str, session: &mut ParseSession) -> PResult<Validator> {
    let start = input.checkpoint();
    *input = &input[1..];

    let mut children = Vec::new();
    let mut operations = Vec::new();
    loop {
        match read_validator(input, session, true) {
            Ok(validator) => children.push(validator),
            Err(err) => {
                if matches!(err, ErrMode::Backtrack(_)) {
                    input.reset(&start);
                }
                return Err(err);
            }
        }
        if let Some(rest) = input.strip_prefix(']') {
            *input = rest;
            break;
        }
        match read_logic_operation(input) {
            Ok(operation) => operations.push(operation),
            Err(_) => {
                input.reset(&start);
                return Err(ErrMode::Backtrack(ContextError::new()));
            }
        }
    }

    if operations.is_empty() {
        if let Some(only) = children.pop() {
            return Ok(only);
        }
    }
    Ok(Validator::Composite {
        children,
        operations,
    })
}

/// Checks whether `validator` can ever match a value produced by the
/// nearest roller preceding `previous`. [`ConditionState::NotApplicable`]
/// means there is no roll to bind to, which the caller may treat as an
/// error or as a silently dropped filter.
pub fn is_valid_validator(
    arena: &NodeArena,
    previous: Option<NodeId>,
    validator: &Validator,
) -> ConditionState {
    let Some(roller) = previous.and_then(|id| arena.get_dice_roller_node(id)) else {
        return ConditionState::NotApplicable;
    };
    match arena.kind(roller) {
        NodeKind::Roller { faces, .. } => {
            let faces = faces.normalized();
            if faces.width() > REACHABILITY_PROBE_LIMIT {
                return ConditionState::Compatible;
            }
            if faces.values().any(|value| validator.check(value)) {
                ConditionState::Compatible
            } else {
                ConditionState::Incompatible
            }
        }
        NodeKind::ListRoll { content, operator } => {
            if content.outcome_count() > REACHABILITY_PROBE_LIMIT {
                return ConditionState::Compatible;
            }
            let values = content.expand(*operator);
            if values.is_empty() {
                // nothing numeric to compare against
                return ConditionState::NotApplicable;
            }
            if values.iter().any(|value| validator.check(*value)) {
                ConditionState::Compatible
            } else {
                ConditionState::Incompatible
            }
        }
        _ => ConditionState::NotApplicable,
    }
}

/// True when every face of the bound roll passes the validator. An explode
/// condition with this property would never terminate.
pub(crate) fn matches_every_face(
    arena: &NodeArena,
    previous: Option<NodeId>,
    validator: &Validator,
) -> bool {
    let Some(roller) = previous.and_then(|id| arena.get_dice_roller_node(id)) else {
        return false;
    };
    match arena.kind(roller) {
        NodeKind::Roller { faces, .. } => {
            let faces = faces.normalized();
            faces.width() <= REACHABILITY_PROBE_LIMIT
                && faces.values().all(|value| validator.check(value))
        }
        NodeKind::ListRoll { content, operator } => {
            if content.outcome_count() > REACHABILITY_PROBE_LIMIT {
                return false;
            }
            let values = content.expand(*operator);
            !values.is_empty() && values.iter().all(|value| validator.check(*value))
        }
        _ => false,
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
    fn test_read_simple_validator() {
        let mut session = session();
        let mut input = ">=3rest";
        let validator = read_validator(&mut input, &mut session, false).unwrap();
        assert_eq!(
            validator,
            Validator::Compare {
                operator: CompareOperator::GreaterOrEqual,
                value: 3
            }
        );
        assert_eq!(input, "rest");
    }

    #[test]
    fn test_read_validator_failure_leaves_cursor_untouched() {
        let mut session = session();
        let mut input = ">x";
        assert!(read_validator(&mut input, &mut session, false).is_err());
        assert_eq!(input, ">x");
    }

    #[test]
    fn test_read_operation_condition() {
        let mut session = session();
        let mut input = "%2=0";
        let validator = read_validator(&mut input, &mut session, false).unwrap();
        assert!(validator.check(4));
        assert!(!validator.check(3));
        assert_eq!(input, "");
    }

    #[test]
    fn test_read_range_validator_requires_brackets() {
        let mut session = session();
        let mut input = "[2-5]";
        let validator = read_validator(&mut input, &mut session, false).unwrap();
        assert_eq!(validator, Validator::Interval(Range::new(2, 5)));
        assert_eq!(input, "");

        let mut input = "2-5";
        assert!(read_validator(&mut input, &mut session, false).is_err());
        assert_eq!(input, "2-5");
    }

    #[test]
    fn test_read_composite_validator() {
        let mut session = session();
        let mut input = "[=1|=10]";
        let validator = read_composite_validator(&mut input, &mut session).unwrap();

        assert!(validator.check(1));
        assert!(validator.check(10));
        assert!(!validator.check(5));
        assert_eq!(input, "");
    }

    #[test]
    fn test_composite_validator_left_to_right_without_precedence() {
        let mut session = session();
        // ((>2 & <5) | =10)
        let mut input = "[>2&<5|=10]";
        let validator = read_composite_validator(&mut input, &mut session).unwrap();

        assert!(validator.check(3));
        assert!(validator.check(10));
        assert!(!validator.check(6));
    }

    #[test]
    fn test_nested_composite_validator() {
        let mut session = session();
        let mut input = "[[=1|=2]&%2=0]";
        let validator = read_composite_validator(&mut input, &mut session).unwrap();

        assert!(validator.check(2));
        assert!(!validator.check(1));
        assert!(!validator.check(4));
    }

    #[test]
    fn test_composite_validator_unbalanced() {
        let mut session = session();
        session.begin("[=1|=10");
        let mut input = "[=1|=10";
        assert!(read_composite_validator(&mut input, &mut session).is_err());
        assert_eq!(
            session.first_error(),
            Some(ParseError::Unbalanced {
                open: '[',
                offset: 0
            })
        );
    }

    #[test]
    fn test_composite_nesting_depth_is_bounded() {
        let options = ParseOptions {
            max_depth: 3,
            ..ParseOptions::default()
        };
        let mut session = ParseSession::new(options);
        let source = "[[[[=1]]]]";
        session.begin(source);
        let mut input = source;
        assert!(read_composite_validator(&mut input, &mut session).is_err());
        assert_eq!(
            session.first_error(),
            Some(ParseError::TooComplex { max_depth: 3 })
        );
    }

    #[test]
    fn test_is_valid_validator_without_a_roller() {
        let mut arena = NodeArena::new();
        let number = arena.insert(NodeKind::Number(3));
        let validator = Validator::Compare {
            operator: CompareOperator::GreaterThan,
            value: 2,
        };

        assert_eq!(
            is_valid_validator(&arena, Some(number), &validator),
            ConditionState::NotApplicable
        );
        assert_eq!(
            is_valid_validator(&arena, None, &validator),
            ConditionState::NotApplicable
        );
    }

    #[test]
    fn test_is_valid_validator_reachability() {
        let mut arena = NodeArena::new();
        let roller = arena.insert(NodeKind::Roller {
            count: 2,
            faces: Range::new(1, 6),
            unique: false,
        });

        let reachable = Validator::Compare {
            operator: CompareOperator::GreaterThan,
            value: 4,
        };
        let unreachable = Validator::Compare {
            operator: CompareOperator::GreaterThan,
            value: 6,
        };

        assert_eq!(
            is_valid_validator(&arena, Some(roller), &reachable),
            ConditionState::Compatible
        );
        assert_eq!(
            is_valid_validator(&arena, Some(roller), &unreachable),
            ConditionState::Incompatible
        );
    }

    #[test]
    fn test_wide_ranges_are_assumed_reachable_without_probing() {
        use crate::parse::{ListContent, ListEntry, ListOperator};

        let mut arena = NodeArena::new();
        let content = ListContent {
            entries: vec![ListEntry::Span(Range::new(2, 50_000_000))],
        };
        let list = arena.insert(NodeKind::ListRoll {
            content,
            operator: ListOperator::None,
        });
        let roller = arena.insert(NodeKind::Roller {
            count: 1,
            faces: Range::new(i64::MIN, i64::MAX),
            unique: false,
        });
        let unreachable = Validator::Compare {
            operator: CompareOperator::GreaterThan,
            value: 99_999_999_999,
        };

        assert_eq!(
            is_valid_validator(&arena, Some(list), &unreachable),
            ConditionState::Compatible
        );
        assert!(!matches_every_face(&arena, Some(list), &unreachable));
        assert_eq!(
            is_valid_validator(&arena, Some(roller), &unreachable),
            ConditionState::Compatible
        );
        assert!(!matches_every_face(&arena, Some(roller), &unreachable));
    }

    #[test]
    fn test_matches_every_face() {
        let mut arena = NodeArena::new();
        let roller = arena.insert(NodeKind::Roller {
            count: 1,
            faces: Range::new(1, 6),
            unique: false,
        });

        let always = Validator::Compare {
            operator: CompareOperator::GreaterOrEqual,
            value: 1,
        };
        let sometimes = Validator::Compare {
            operator: CompareOperator::GreaterThan,
            value: 3,
        };

        assert!(matches_every_face(&arena, Some(roller), &always));
        assert!(!matches_every_face(&arena, Some(roller), &sometimes));
    }
}
