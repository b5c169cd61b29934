//! Per-parse state. Every parse call owns exactly one [`ParseSession`];
//! nothing is shared between independent parses, so running them
//! concurrently is safe by construction.

use std::collections::HashMap;

use winnow::error::{ContextError, ErrMode};

use crate::error::ParseError;
use crate::node::{NodeArena, NodeId};

/// Limits and policy knobs for one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Inputs longer than this are rejected before parsing starts.
    pub max_input_length: usize,
    /// Bound on bracket/parenthesis/validator nesting. Exceeding it fails
    /// closed with [`ParseError::TooComplex`] instead of exhausting the
    /// call stack.
    pub max_depth: usize,
    /// When a validator has no roll to bind to, drop it silently instead of
    /// aborting the parse.
    pub drop_inapplicable_filters: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_input_length: 512,
            max_depth: 32,
            drop_inapplicable_filters: false,
        }
    }
}

/// State scoped to one parse invocation: the variable table, the node arena,
/// the registry of top-level roots and the recursion budget.
#[derive(Debug, Default)]
pub struct ParseSession {
    options: ParseOptions,
    variables: HashMap<String, String>,
    start_nodes: Vec<NodeId>,
    arena: NodeArena,
    errors: Vec<ParseError>,
    depth: usize,
    source_length: usize,
}

impl ParseSession {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Last-resolved string representation of a named variable.
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Roots of the independently-parsed top-level expressions, in order.
    pub fn start_nodes(&self) -> &[NodeId] {
        &self.start_nodes
    }

    pub fn push_start_node(&mut self, id: NodeId) {
        self.start_nodes.push(id);
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut NodeArena {
        &mut self.arena
    }

    pub(crate) fn into_parts(self) -> (NodeArena, Vec<NodeId>) {
        (self.arena, self.start_nodes)
    }

    /// Remembers the source length so primitives can report absolute offsets
    /// from the remaining slice.
    pub(crate) fn begin(&mut self, source: &str) {
        self.source_length = source.len();
    }

    pub(crate) fn offset_of(&self, rest: &str) -> usize {
        self.source_length.saturating_sub(rest.len())
    }

    /// Records a user-facing error and returns the hard failure that aborts
    /// the surrounding alternation.
    pub(crate) fn record(&mut self, error: ParseError) -> ErrMode<ContextError> {
        self.errors.push(error);
        ErrMode::Cut(ContextError::new())
    }

    pub(crate) fn syntax_error(&mut self, rest: &str) -> ErrMode<ContextError> {
        let offset = self.offset_of(rest);
        self.record(ParseError::Syntax {
            offset,
            fragment: snippet(rest),
        })
    }

    pub(crate) fn first_error(&mut self) -> Option<ParseError> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self.errors.remove(0))
        }
    }

    pub(crate) fn enter(&mut self) -> Result<(), ErrMode<ContextError>> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(self.record(ParseError::TooComplex {
                max_depth: self.options.max_depth,
            }));
        }
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

pub(crate) fn snippet(rest: &str) -> String {
    rest.chars().take(16).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    #[test]
    fn test_sessions_are_isolated() {
        let mut first = ParseSession::new(ParseOptions::default());
        let mut second = ParseSession::new(ParseOptions::default());

        first.set_variable("strength", "4");
        let id = first.arena_mut().insert(NodeKind::Number(4));
        first.push_start_node(id);

        assert_eq!(second.variable("strength"), None);
        assert!(second.start_nodes().is_empty());
        assert!(second.arena().is_empty());
    }

    #[test]
    fn test_depth_budget_fails_closed() {
        let options = ParseOptions {
            max_depth: 2,
            ..ParseOptions::default()
        };
        let mut session = ParseSession::new(options);

        assert!(session.enter().is_ok());
        assert!(session.enter().is_ok());
        assert!(session.enter().is_err());
        assert_eq!(
            session.first_error(),
            Some(ParseError::TooComplex { max_depth: 2 })
        );
    }

    #[test]
    fn test_offset_is_relative_to_the_original_source() {
        let mut session = ParseSession::new(ParseOptions::default());
        session.begin("2d6+3");
        assert_eq!(session.offset_of("+3"), 3);
        assert_eq!(session.offset_of(""), 5);
    }
}
