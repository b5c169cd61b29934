//! The notation grammar. Primitive scanners, the expression grammar and the
//! top-level [`NotationParser`] that turns a whole notation string into an
//! execution tree.

use std::collections::HashMap;

use crate::error::ParseError;
use crate::node::{NodeArena, NodeId};
use crate::session::{snippet, ParseOptions, ParseSession};

mod dice;
mod expression;
mod lexing;
mod list;
mod operators;
mod substitution;
mod validator;
mod variable;

pub use dice::{read_ascending, read_dice_roller, read_painter_parameter};
pub use expression::{read_expression, read_term};
pub use lexing::{
    find_closing_character_index_of, read_close_parentheses, read_comma, read_number,
    read_open_parentheses, read_string,
};
pub use list::{
    read_dice_range, read_list, read_list_operator, read_probability, ListContent, ListEntry,
    ListOperator, Range,
};
pub use operators::{
    read_arithmetic_operator, read_compare_operator, read_condition_kind, read_condition_operator,
    read_logic_operation, ArithmeticOperator, CompareOperator, ConditionKind, ConditionOperator,
    LogicOperation,
};
pub use substitution::{
    read_substitution_parameters, read_variable_from_string, replace_variable_to_value,
    SubstituteInfo,
};
pub use validator::{
    is_valid_validator, read_composite_validator, read_validator, ConditionState, Validator,
};
pub use variable::{read_dynamic_variable, read_variable};

pub(crate) use expression::skip_spaces;

/// Trailing free-text annotation of a notation, e.g. `2d6+3 # attack`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub marker: String,
    pub text: String,
}

/// Recognizes a trailing comment. The marker swallows everything up to the
/// end of the input.
pub fn read_comment(input: &mut &str) -> Option<Comment> {
    let rest = input.strip_prefix('#')?;
    let comment = Comment {
        marker: "#".to_owned(),
        text: rest.trim().to_owned(),
    };
    *input = "";
    Some(comment)
}

/// A fully parsed notation: the node arena, the root of each top-level
/// expression in source order, and the trailing comment if one was present.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedProgram {
    arena: NodeArena,
    roots: Vec<NodeId>,
    comment: Option<Comment>,
}

impl ParsedProgram {
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }
}

/// Reusable entry point. The parser itself is immutable; each call to
/// [`NotationParser::parse`] runs in its own [`ParseSession`], so one parser
/// can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct NotationParser {
    options: ParseOptions,
    variables: HashMap<String, String>,
}

impl NotationParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Seeds a named variable available to `${name}` references.
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Parses `instruction (';' instruction)* comment?` into a program.
    pub fn parse(&self, notation: &str) -> Result<ParsedProgram, ParseError> {
        if notation.len() > self.options.max_input_length {
            return Err(ParseError::InputTooLong {
                max_length: self.options.max_input_length,
            });
        }

        let mut session = ParseSession::new(self.options);
        for (name, value) in &self.variables {
            session.set_variable(name.clone(), value.clone());
        }
        session.begin(notation);

        let mut input = notation;
        loop {
            match read_expression(&mut input, &mut session) {
                Ok(root) => session.push_start_node(root),
                Err(_) => return Err(take_error(&mut session, input)),
            }
            skip_spaces(&mut input);
            match input.strip_prefix(';') {
                Some(rest) => input = rest,
                None => break,
            }
        }

        let comment = read_comment(&mut input);
        if !input.is_empty() {
            return Err(take_error(&mut session, input));
        }

        let (arena, roots) = session.into_parts();
        Ok(ParsedProgram {
            arena,
            roots,
            comment,
        })
    }
}

/// Prefers the most specific error the session recorded; a parse that failed
/// without recording one is a plain syntax error at the failure position.
fn take_error(session: &mut ParseSession, rest: &str) -> ParseError {
    if let Some(error) = session.first_error() {
        return error;
    }
    ParseError::Syntax {
        offset: session.offset_of(rest),
        fragment: snippet(rest),
    }
}
