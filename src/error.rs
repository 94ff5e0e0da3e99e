use nom::error::{VerboseError, VerboseErrorKind};
use nom::Offset;
use thiserror::Error;

/// Errors surfaced by parsing, queries, and the JSON projection.
#[derive(Debug, Error)]
pub enum Error {
    /// The input is not a well-formed Liberty file.
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// A lookup that requires exactly one match found zero or several.
    #[error("expected exactly one '{key}', found {count}")]
    NotUnique { key: String, count: usize },

    /// A selector missed; `available` lists the keys that would have matched.
    #[error("'{key}' not found, must be one of: {}", .available.join(", "))]
    NotFound { key: String, available: Vec<String> },

    /// A numeric table has rows of differing lengths.
    #[error("table rows must have equal length: expected {expected}, found {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// A pin function string is not a valid boolean expression.
    #[error("malformed boolean function: {message}")]
    BooleanFunction { message: String },

    /// A value of this kind cannot be used in the requested operation.
    #[error("value of kind {kind} is not usable here")]
    Type { kind: String },

    /// Writing the JSON document failed.
    #[error("failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Convert a nom error into a `Parse` error with 1-based line/column
    /// coordinates and the deepest grammar context that failed.
    pub(crate) fn from_nom(input: &str, err: nom::Err<VerboseError<&str>>) -> Self {
        let verbose = match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => e,
            nom::Err::Incomplete(_) => {
                return Error::Parse {
                    line: 0,
                    column: 0,
                    message: "input data is incomplete".to_string(),
                };
            }
        };
        let remaining = match verbose.errors.first() {
            Some(deepest) => deepest.0,
            None => {
                return Error::Parse {
                    line: 0,
                    column: 0,
                    message: "unknown parse error".to_string(),
                };
            }
        };
        let offset = input.offset(remaining);
        let consumed = &input[..offset];
        let line = consumed.matches('\n').count() + 1;
        let line_start = consumed.rfind('\n').map(|p| p + 1).unwrap_or(0);
        let column = consumed[line_start..].chars().count() + 1;

        let context = verbose
            .errors
            .iter()
            .find_map(|(_, kind)| match kind {
                VerboseErrorKind::Context(c) => Some(*c),
                _ => None,
            })
            .unwrap_or("input");
        let found: String = match remaining.lines().next() {
            Some(text) if !text.trim().is_empty() => {
                format!("'{}'", text.trim().chars().take(24).collect::<String>())
            }
            _ => "end of input".to_string(),
        };
        Error::Parse {
            line,
            column,
            message: format!("expected {}, found {}", context, found),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Error;

    #[test]
    fn test_display() {
        let err = Error::NotUnique {
            key: "fanout_length".to_string(),
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "expected exactly one 'fanout_length', found 2"
        );

        let err = Error::NotFound {
            key: "NAND3".to_string(),
            available: vec!["AND2".to_string(), "INV".to_string()],
        };
        assert_eq!(err.to_string(), "'NAND3' not found, must be one of: AND2, INV");
    }
}
