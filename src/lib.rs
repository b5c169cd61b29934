//! Parser for dice notation, the small language behind expressions such as
//! `2d6+3`, `4d10e>7sa` or `[1-3,5]u`. Parsing produces an execution tree
//! of chained stages that an evaluator can walk; no dice are rolled here.
//!
//! ```
//! use dice_notation::{parse, NodeKind};
//!
//! let program = parse("2d6+3 # attack roll").unwrap();
//! assert_eq!(program.roots().len(), 1);
//! assert!(matches!(
//!     program.arena().kind(program.roots()[0]),
//!     NodeKind::Roller { count: 2, .. }
//! ));
//! assert_eq!(program.comment().unwrap().text, "attack roll");
//! ```

pub mod error;
pub mod node;
pub mod parse;
pub mod session;

pub use error::ParseError;
pub use node::{ExecutionNode, FilterBehavior, NodeArena, NodeId, NodeKind, PainterParameter};
pub use parse::{Comment, NotationParser, ParsedProgram};
pub use session::{ParseOptions, ParseSession};

/// Parses a notation with the default options and no seeded variables.
pub fn parse(notation: &str) -> Result<ParsedProgram, ParseError> {
    NotationParser::new().parse(notation)
}

/// Parses a notation with explicit limits and policy knobs.
pub fn parse_with_options(
    notation: &str,
    options: ParseOptions,
) -> Result<ParsedProgram, ParseError> {
    NotationParser::with_options(options).parse(notation)
}
