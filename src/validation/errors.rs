//! Error families of the validation pipeline.
//!
//! - [`ExpressionError`]: the text is unsafe, a keyword, not an identifier, or does not parse
//!   into a usable expression.
//! - [`UnitMismatchError`]: the expression parses but its units are inconsistent,
//!   indeterminate or incompatible with the target.
//!
//! [`ValidationError`] wraps both so `?` works across the whole cycle.

use crate::symbolic::parse_expr::ParseError;
use crate::units::dimension_analysis::DimensionError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// a `.` outside a numeric literal
    UnsafeAttributeAccess,
    KeywordInUse,
    NotIdentifier,
    EmptySymbolName,
    UnknownFunction,
    Syntax,
    FunctionNotExpression,
    /// anything else the parser or renderer reported, by error kind
    Other { kind: String, detail: String },
}

impl ExpressionError {
    /// short machine-readable reason
    pub fn reason(&self) -> &str {
        match self {
            ExpressionError::UnsafeAttributeAccess => "Invalid use of '.'",
            ExpressionError::KeywordInUse => "Keyword in use",
            ExpressionError::NotIdentifier => "Not a valid identifier",
            ExpressionError::EmptySymbolName => "Empty string not a valid Symbol name",
            ExpressionError::UnknownFunction => "Unknown function call",
            ExpressionError::Syntax => "Syntax error",
            ExpressionError::FunctionNotExpression => "Function is not a valid expression",
            ExpressionError::Other { kind, .. } => kind,
        }
    }
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExpressionError::Other { kind, detail } => write!(f, "{}: {}", kind, detail),
            _ => write!(f, "{}", self.reason()),
        }
    }
}

impl std::error::Error for ExpressionError {}

impl From<ParseError> for ExpressionError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnknownFunction(_) => ExpressionError::UnknownFunction,
            ParseError::Syntax(_) => ExpressionError::Syntax,
            ParseError::FunctionNotExpression(_) => ExpressionError::FunctionNotExpression,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnitMismatchError {
    /// the structural check or the factoring found inconsistent terms
    InconsistentTerms(String),
    /// dimension could not be determined
    Indeterminate,
    /// dimension of the expression differs from the target's
    Incompatible { found: String, target: String },
    /// the target itself has no determinable dimension
    UnresolvedTarget(String),
}

impl fmt::Display for UnitMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnitMismatchError::InconsistentTerms(cause) => write!(f, "{}", cause),
            UnitMismatchError::Indeterminate => write!(f, "Dimension could not be determined"),
            UnitMismatchError::Incompatible { found, target } => {
                write!(f, "Dimension({}) incompatible with Dimension({})", found, target)
            }
            UnitMismatchError::UnresolvedTarget(target) => {
                write!(f, "Dimension of target {} could not be determined", target)
            }
        }
    }
}

impl std::error::Error for UnitMismatchError {}

impl From<DimensionError> for UnitMismatchError {
    fn from(err: DimensionError) -> Self {
        UnitMismatchError::InconsistentTerms(err.to_string())
    }
}

/// Any failure of one validation cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Expression(ExpressionError),
    UnitMismatch(UnitMismatchError),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationError::Expression(err) => write!(f, "ExpressionError: {}", err),
            ValidationError::UnitMismatch(err) => write!(f, "UnitMisMatchError: {}", err),
        }
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ValidationError::Expression(err) => Some(err),
            ValidationError::UnitMismatch(err) => Some(err),
        }
    }
}

impl From<ExpressionError> for ValidationError {
    fn from(err: ExpressionError) -> Self {
        ValidationError::Expression(err)
    }
}

impl From<UnitMismatchError> for ValidationError {
    fn from(err: UnitMismatchError) -> Self {
        ValidationError::UnitMismatch(err)
    }
}
