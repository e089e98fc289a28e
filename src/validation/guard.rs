//! Lexical checks run before any parse attempt: attribute-access style `.` usage,
//! reserved words and identifier rules. All functions are pure.

use crate::symbolic::symbolic_engine::Expr;
use crate::validation::errors::ExpressionError;
use log::trace;
use regex::Regex;
use std::sync::LazyLock;

/// a `.` preceded by a name-like run, or followed by one
static UNSAFE_DOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([^\d\s]+\d*)+[.]|[.]\d*[^\d\s]+").expect("unsafe-dot pattern is valid")
});

/// words that may never be used as a name or an expression
pub const RESERVED_WORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Whether `text` is free of attribute-access style `.` usage.
/// Parentheses and arithmetic operators are padded with spaces first so that only the
/// `.` inside a single token is judged: `1.5`, `.5`, `5.`, `(1.)` are safe, `a.b`, `x.`,
/// `.a`, `12a.5` are not.
pub fn expr_is_safe(text: &str) -> bool {
    let mut spaced = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if "()+-*/".contains(c) {
            spaced.push(' ');
            spaced.push(c);
            spaced.push(' ');
        } else {
            spaced.push(c);
        }
    }
    let safe = !UNSAFE_DOT.is_match(&spaced);
    trace!("expr_is_safe({:?}) -> {}", text, safe);
    safe
}

pub fn is_keyword(text: &str) -> bool {
    RESERVED_WORDS.contains(&text)
}

/// non-empty, starts with a letter or `_`, continues with letters, digits or `_`
pub fn is_valid_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

pub fn not_safe_error(text: &str) -> Result<(), ExpressionError> {
    if expr_is_safe(text) {
        Ok(())
    } else {
        Err(ExpressionError::UnsafeAttributeAccess)
    }
}

pub fn keyword_error(text: &str) -> Result<(), ExpressionError> {
    if is_keyword(text) {
        Err(ExpressionError::KeywordInUse)
    } else {
        Ok(())
    }
}

pub fn invalid_identifier_error(text: &str) -> Result<(), ExpressionError> {
    if is_valid_identifier(text) {
        Ok(())
    } else {
        Err(ExpressionError::NotIdentifier)
    }
}

/// safety and keyword checks, in that order
pub fn guard(text: &str) -> Result<(), ExpressionError> {
    not_safe_error(text)?;
    keyword_error(text)
}

/// Turns `text` into a bare symbol, checking emptiness, safety, keywords and identifier rules.
pub fn text_to_symbol(text: &str) -> Result<Expr, ExpressionError> {
    if text.is_empty() {
        return Err(ExpressionError::EmptySymbolName);
    }
    guard(text)?;
    invalid_identifier_error(text)?;
    Ok(Expr::Var(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_literals_are_safe() {
        for text in [
            "1.5", ".5", "5.", "(1.)", "(.1)", "2+4.1", "1.1 ", "1. ", ".1 ", "1.)", "1.1)", "",
        ] {
            assert!(expr_is_safe(text), "{:?} should be safe", text);
        }
    }

    #[test]
    fn test_attribute_access_is_unsafe() {
        for text in [
            ".a ", "1234a.", "12a.a", "1.a ", "a.1 ", "a.a", "12a12.12a", ".a12", "ab.", "text2.",
            "x.real",
        ] {
            assert!(!expr_is_safe(text), "{:?} should be unsafe", text);
        }
    }

    #[test]
    fn test_keywords() {
        assert!(is_keyword("lambda"));
        assert!(is_keyword("None"));
        assert!(!is_keyword("x"));
        assert!(!is_keyword("lambda x"));
        assert_eq!(guard("import"), Err(ExpressionError::KeywordInUse));
        assert_eq!(guard("a.b"), Err(ExpressionError::UnsafeAttributeAccess));
    }

    #[test]
    fn test_identifiers() {
        for text in ["abc", "a", "text_2", "_x", "sin", "error"] {
            assert!(is_valid_identifier(text), "{:?} should be an identifier", text);
        }
        for text in ["", "2a", "a b", "a)", "(a", "2+4.1", "a-b"] {
            assert!(!is_valid_identifier(text), "{:?} should not be an identifier", text);
        }
    }

    #[test]
    fn test_text_to_symbol() {
        assert_eq!(text_to_symbol("x"), Ok(Expr::Var("x".to_string())));
        assert_eq!(text_to_symbol(""), Err(ExpressionError::EmptySymbolName));
        assert_eq!(text_to_symbol("for"), Err(ExpressionError::KeywordInUse));
        assert_eq!(text_to_symbol("a.b"), Err(ExpressionError::UnsafeAttributeAccess));
        assert_eq!(text_to_symbol("2x"), Err(ExpressionError::NotIdentifier));
    }
}
