//! Ordered token tables. Each table is tried longest-token-first so a short
//! operator is never matched as a prefix of a longer one, and each is
//! consulted only at its own grammar position: `|` means integer division in
//! arithmetic position but OR inside a composite validator.

use winnow::error::{ContextError, ErrMode};
use winnow::PResult;

/// Comparison applied between a roll outcome and a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperator {
    Equal,
    NotEqual,
    GreaterThan,
    LesserThan,
    GreaterOrEqual,
    LesserOrEqual,
}

impl CompareOperator {
    pub fn compare(self, left: i64, right: i64) -> bool {
        match self {
            CompareOperator::Equal => left == right,
            CompareOperator::NotEqual => left != right,
            CompareOperator::GreaterThan => left > right,
            CompareOperator::LesserThan => left < right,
            CompareOperator::GreaterOrEqual => left >= right,
            CompareOperator::LesserOrEqual => left <= right,
        }
    }
}

/// Combines the children of a composite validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOperation {
    And,
    Or,
    ExclusiveOr,
}

/// Operator of a dice condition such as `%2=0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOperator {
    Modulo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    IntegerDivide,
    Pow,
}

/// How a conditional stage consumes the preceding roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    /// Every roll must pass.
    AllOfThem,
    /// At least one roll must pass.
    OneOfThem,
    /// The branch runs once per roll.
    OnEach,
    /// The condition applies to the summed result.
    OnScalar,
}

const COMPARE_OPERATORS: &[(&str, CompareOperator)] = &[
    (">=", CompareOperator::GreaterOrEqual),
    ("<=", CompareOperator::LesserOrEqual),
    ("!=", CompareOperator::NotEqual),
    ("==", CompareOperator::Equal),
    (">", CompareOperator::GreaterThan),
    ("<", CompareOperator::LesserThan),
    ("=", CompareOperator::Equal),
];

const LOGIC_OPERATIONS: &[(&str, LogicOperation)] = &[
    ("&", LogicOperation::And),
    ("|", LogicOperation::Or),
    ("^", LogicOperation::ExclusiveOr),
];

const CONDITION_OPERATORS: &[(&str, ConditionOperator)] = &[("%", ConditionOperator::Modulo)];

const ARITHMETIC_OPERATORS: &[(&str, ArithmeticOperator)] = &[
    ("**", ArithmeticOperator::Pow),
    ("+", ArithmeticOperator::Plus),
    ("-", ArithmeticOperator::Minus),
    ("*", ArithmeticOperator::Multiply),
    ("x", ArithmeticOperator::Multiply),
    ("|", ArithmeticOperator::IntegerDivide),
    ("/", ArithmeticOperator::Divide),
];

const CONDITION_KINDS: &[(&str, ConditionKind)] = &[
    ("a", ConditionKind::AllOfThem),
    ("u", ConditionKind::OneOfThem),
    ("e", ConditionKind::OnEach),
    ("s", ConditionKind::OnScalar),
];

fn read_from_table<T: Copy>(input: &mut &str, table: &[(&str, T)]) -> PResult<T> {
    for (token, operator) in table {
        if let Some(rest) = input.strip_prefix(token) {
            *input = rest;
            return Ok(*operator);
        }
    }
    Err(ErrMode::Backtrack(ContextError::new()))
}

pub fn read_compare_operator(input: &mut &str) -> PResult<CompareOperator> {
    read_from_table(input, COMPARE_OPERATORS)
}

pub fn read_logic_operation(input: &mut &str) -> PResult<LogicOperation> {
    read_from_table(input, LOGIC_OPERATIONS)
}

pub fn read_condition_operator(input: &mut &str) -> PResult<ConditionOperator> {
    read_from_table(input, CONDITION_OPERATORS)
}

pub fn read_arithmetic_operator(input: &mut &str) -> PResult<ArithmeticOperator> {
    read_from_table(input, ARITHMETIC_OPERATORS)
}

/// Absence of a kind token is not a failure, the condition applies to the
/// scalar result.
pub fn read_condition_kind(input: &mut &str) -> ConditionKind {
    read_from_table(input, CONDITION_KINDS).unwrap_or(ConditionKind::OnScalar)
}
