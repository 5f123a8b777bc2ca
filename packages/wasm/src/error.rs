//! Error types.
//!
//! Every failure is local to one call and recoverable by re-supplying valid
//! input. The wasm facade turns these into thrown JS errors.

/// A Newick string that could not be turned into a tree.
///
/// Positions are byte offsets into the trimmed input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeParseError {
    #[error("invalid tree format: empty input")]
    Empty,

    #[error("invalid tree format: unbalanced parentheses at byte {position}")]
    UnbalancedParentheses { position: usize },

    #[error("invalid tree format: unexpected '{found}' at byte {position}")]
    UnexpectedCharacter { found: char, position: usize },

    #[error("invalid tree format: unterminated quoted label starting at byte {position}")]
    UnterminatedQuote { position: usize },

    #[error("invalid tree format: content after ';' at byte {position}")]
    TrailingContent { position: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] TreeParseError),

    #[error("invalid engine config: {message}")]
    InvalidConfig { message: String },

    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_messages() {
        let err = TreeParseError::UnbalancedParentheses { position: 4 };
        assert_eq!(
            err.to_string(),
            "invalid tree format: unbalanced parentheses at byte 4"
        );
        assert_eq!(
            TreeParseError::Empty.to_string(),
            "invalid tree format: empty input"
        );
    }

    #[test]
    fn test_parse_error_is_transparent() {
        let err: Error = TreeParseError::TrailingContent { position: 9 }.into();
        assert_eq!(err.to_string(), "invalid tree format: content after ';' at byte 9");
    }
}
