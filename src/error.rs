use thiserror::Error;

/// Every way a parse can fail. All of these are ordinary return values,
/// nothing panics across the primitive boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input matched no grammar alternative at this position.
    #[error("unparsable expression at offset {offset}: `{fragment}`")]
    Syntax { offset: usize, fragment: String },

    /// A `${name}` or `$N` reference did not resolve in the session.
    #[error("unknown variable `{name}`")]
    UnknownVariable { name: String },

    /// A variable reference was found but its name/index is not well formed.
    #[error("malformed variable reference: {reason}")]
    MalformedVariable { reason: String },

    /// An opener without its matching closing character.
    #[error("unbalanced `{open}` at offset {offset}")]
    Unbalanced { open: char, offset: usize },

    /// The filter can never match a value produced by the roll it binds to.
    #[error("the filter can never match a value produced by the roll it applies to")]
    UnreachableValidator,

    /// There is no preceding roll the filter could bind to.
    #[error("the filter has no dice roll to apply to")]
    InapplicableValidator,

    /// An explode condition matching every face would roll forever.
    #[error("the explode condition matches every face and would roll forever")]
    EndlessExplode,

    /// Nesting exceeded the configured recursion budget.
    #[error("expression nested deeper than {max_depth} levels")]
    TooComplex { max_depth: usize },

    #[error("expression longer than {max_length} characters")]
    InputTooLong { max_length: usize },
}
