use std::fmt;

use crate::lexer::Token;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    UnexpectedToken(Token),
    TokenMismatch { expected: Token, found: Token },
    ExpectedIdentifier { found: Token },
    InvalidAssignment,
    MethodWithoutSelf { method: String, found: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnexpectedToken(token) => {
                write!(f, "Unexpected token {}", token)
            }
            Error::TokenMismatch { expected, found } => {
                write!(f, "Expected {} but found {}", expected, found)
            }
            Error::ExpectedIdentifier { found } => {
                write!(f, "Expected an identifier but found {}", found)
            }
            Error::InvalidAssignment => {
                write!(f, "Invalid assignment target")
            }
            Error::MethodWithoutSelf { method, found } => {
                write!(
                    f,
                    "First parameter of method '{}' must be 'self', found '{}'",
                    method, found
                )
            }
        }
    }
}
