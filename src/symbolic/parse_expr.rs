//! Turns a string into an unevaluated symbolic expression.
//!
//! Tokens are recognised with nom, the token stream is then parsed by recursive descent:
//!
//! ```text
//!  expr  := term (('+' | '-') term)*
//!  term  := unary (('*' | '/') unary)*
//!  unary := ('+' | '-') unary | power
//!  power := atom ('**' unary)?
//!  atom  := number | name | name '(' expr (',' expr)* ')' | '(' expr ')'
//! ```
//!
//! Names resolve, in order, to a unit of the supplied table, to a named constant (`pi`, `E`)
//! or to a free symbol. Function names are only valid when called.
//!
//! Input is limited to [`MAX_TOKENS`] tokens, and both the nesting of the grammar and the
//! height of the produced tree to [`MAX_DEPTH`] levels, so that every recursive walker over
//! a parsed tree stays well inside a thread's stack.
//!
//!# Example
//! ```
//! use SymEntry::symbolic::symbolic_engine::Expr;
//! let parsed = Expr::parse_expression("x**2 + sin(y)").unwrap();
//! assert_eq!(parsed.extract_variables(), vec!["x", "y"]);
//! ```
use crate::symbolic::symbolic_engine::Expr;
use crate::units::unit_table::UnitTable;
use log::trace;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace0, one_of},
    combinator::{map, map_res, opt, recognize},
    multi::many0,
    sequence::pair,
};
use std::fmt;

pub const MAX_DEPTH: usize = 64;
pub const MAX_TOKENS: usize = 256;

fn too_deep() -> ParseError {
    ParseError::Syntax(format!("expression nested deeper than {} levels", MAX_DEPTH))
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// call of a name that is not a known function
    UnknownFunction(String),
    /// tokenizer or grammar failure, wrong number of arguments
    Syntax(String),
    /// function name used without a call
    FunctionNotExpression(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::UnknownFunction(name) => write!(f, "unknown function {}()", name),
            ParseError::Syntax(detail) => write!(f, "syntax error: {}", detail),
            ParseError::FunctionNotExpression(name) => {
                write!(f, "function {} is not a valid expression", name)
            }
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Name(String),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Num(val) => write!(f, "{}", val),
            Token::Name(name) => write!(f, "{}", name),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::DoubleStar => write!(f, "**"),
            Token::Slash => write!(f, "/"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
        }
    }
}

//___________________________________TOKENS____________________________________

/// `12`, `1.`, `1.5`, `.5`, each with an optional exponent part
fn parse_number(input: &str) -> IResult<&str, Token> {
    let mantissa = alt((
        recognize(pair(digit1, opt(pair(char('.'), digit0)))),
        recognize(pair(char('.'), digit1)),
    ));
    let exponent = opt((one_of("eE"), opt(one_of("+-")), digit1));
    map_res(recognize(pair(mantissa, exponent)), |s: &str| {
        s.parse::<f64>().map(Token::Num)
    })
    .parse(input)
}

/// Parses a name (letters, digits and underscores, not starting with a digit)
fn parse_name(input: &str) -> IResult<&str, Token> {
    let parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));
    map(parser, |s: &str| Token::Name(s.to_string())).parse(input)
}

fn parse_operator(input: &str) -> IResult<&str, Token> {
    alt((
        map(tag("**"), |_| Token::DoubleStar),
        map(tag("*"), |_| Token::Star),
        map(tag("/"), |_| Token::Slash),
        map(tag("+"), |_| Token::Plus),
        map(tag("-"), |_| Token::Minus),
        map(tag("("), |_| Token::LParen),
        map(tag(")"), |_| Token::RParen),
        map(tag(","), |_| Token::Comma),
    ))
    .parse(input)
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut rest = input;
    loop {
        let (after_space, _) = multispace0::<&str, nom::error::Error<&str>>(rest)
            .map_err(|e| ParseError::Syntax(e.to_string()))?;
        if after_space.is_empty() {
            break;
        }
        match alt((parse_number, parse_name, parse_operator)).parse(after_space) {
            Ok((remaining, token)) => {
                tokens.push(token);
                rest = remaining;
            }
            Err(_) => {
                let position = input.len() - after_space.len();
                return Err(ParseError::Syntax(format!(
                    "invalid token at position {}: {:?}",
                    position,
                    after_space.chars().next().unwrap_or(' ')
                )));
            }
        }
    }
    Ok(tokens)
}

//___________________________________GRAMMAR____________________________________

/// parsed sub-tree with its height
type Node = (Expr, usize);

struct ExprParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    units: Option<&'a UnitTable>,
}

impl<'a> ExprParser<'a> {
    fn new(tokens: Vec<Token>, units: Option<&'a UnitTable>) -> Self {
        ExprParser {
            tokens,
            pos: 0,
            depth: 0,
            units,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(ParseError::Syntax(format!(
                "expected '{}', found '{}'",
                expected, token
            ))),
            None => Err(ParseError::Syntax(format!(
                "expected '{}', found end of input",
                expected
            ))),
        }
    }

    /// one more level of grammar recursion
    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(too_deep());
        }
        Ok(())
    }

    /// `expr` as a node of height `height`, rejected above the limit
    fn node(expr: Expr, height: usize) -> Result<Node, ParseError> {
        if height > MAX_DEPTH {
            return Err(too_deep());
        }
        Ok((expr, height))
    }

    fn parse_all(&mut self) -> Result<Expr, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::Syntax("empty expression".to_string()));
        }
        let (expr, _) = self.parse_sum()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(ParseError::Syntax(format!("unexpected '{}'", token))),
        }
    }

    fn parse_sum(&mut self) -> Result<Node, ParseError> {
        let (mut lhs, mut height) = self.parse_term()?;
        loop {
            let add = match self.peek() {
                Some(Token::Plus) => true,
                Some(Token::Minus) => false,
                _ => return Ok((lhs, height)),
            };
            self.pos += 1;
            let (rhs, h) = self.parse_term()?;
            let expr = if add { lhs + rhs } else { lhs - rhs };
            (lhs, height) = Self::node(expr, 1 + height.max(h))?;
        }
    }

    fn parse_term(&mut self) -> Result<Node, ParseError> {
        let (mut lhs, mut height) = self.parse_unary()?;
        loop {
            let mul = match self.peek() {
                Some(Token::Star) => true,
                Some(Token::Slash) => false,
                _ => return Ok((lhs, height)),
            };
            self.pos += 1;
            let (rhs, h) = self.parse_unary()?;
            let expr = if mul { lhs * rhs } else { lhs / rhs };
            (lhs, height) = Self::node(expr, 1 + height.max(h))?;
        }
    }

    fn parse_unary(&mut self) -> Result<Node, ParseError> {
        self.enter()?;
        let result = match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                match self.parse_unary() {
                    Ok((Expr::Const(val), h)) => Ok((Expr::Const(-val), h)),
                    Ok((expr, h)) => Self::node(-expr, h + 1),
                    Err(err) => Err(err),
                }
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_power(),
        };
        self.depth -= 1;
        result
    }

    fn parse_power(&mut self) -> Result<Node, ParseError> {
        let (base, bh) = self.parse_atom()?;
        if let Some(Token::DoubleStar) = self.peek() {
            self.pos += 1;
            let (exponent, eh) = self.parse_unary()?;
            return Self::node(base.pow(exponent), 1 + bh.max(eh));
        }
        Ok((base, bh))
    }

    fn parse_atom(&mut self) -> Result<Node, ParseError> {
        match self.next() {
            Some(Token::Num(val)) => Ok((Expr::Const(val), 1)),
            Some(Token::LParen) => {
                let inner = self.parse_sum()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Name(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.pos += 1;
                    self.parse_call(name)
                } else {
                    Ok((self.resolve_name(name)?, 1))
                }
            }
            Some(token) => Err(ParseError::Syntax(format!("unexpected '{}'", token))),
            None => Err(ParseError::Syntax("unexpected end of input".to_string())),
        }
    }

    fn parse_call(&mut self, name: String) -> Result<Node, ParseError> {
        let mut args = Vec::new();
        if let Some(Token::RParen) = self.peek() {
            self.pos += 1;
        } else {
            loop {
                args.push(self.parse_sum()?);
                match self.next() {
                    Some(Token::Comma) => continue,
                    Some(Token::RParen) => break,
                    Some(token) => {
                        return Err(ParseError::Syntax(format!("unexpected '{}'", token)));
                    }
                    None => {
                        return Err(ParseError::Syntax("unclosed call".to_string()));
                    }
                }
            }
        }
        if !Expr::is_function_name(&name) {
            if self.is_unit(&name) || named_constant(&name).is_some() {
                return Err(ParseError::Syntax(format!("{} is not callable", name)));
            }
            return Err(ParseError::UnknownFunction(name));
        }
        if args.len() != 1 {
            return Err(ParseError::Syntax(format!(
                "{}() takes exactly one argument ({} given)",
                name,
                args.len()
            )));
        }
        let (arg, height) = args.remove(0);
        let call = Expr::function_from_name(&name, arg).ok_or(ParseError::UnknownFunction(name))?;
        Self::node(call, height + 1)
    }

    fn is_unit(&self, name: &str) -> bool {
        self.units.is_some_and(|table| table.contains(name))
    }

    fn resolve_name(&self, name: String) -> Result<Expr, ParseError> {
        if let Some(unit) = self.units.and_then(|table| table.get(&name)) {
            return Ok(unit.clone());
        }
        if let Some(constant) = named_constant(&name) {
            return Ok(constant);
        }
        if Expr::is_function_name(&name) {
            return Err(ParseError::FunctionNotExpression(name));
        }
        Ok(Expr::Var(name))
    }
}

fn named_constant(name: &str) -> Option<Expr> {
    match name {
        "pi" => Some(Expr::Pi),
        "E" => Some(Expr::Euler),
        _ => None,
    }
}

/// Parses `input` without evaluating it. With `units`, names found in the table become
/// unit atoms instead of free symbols.
pub fn parse_expression_func(input: &str, units: Option<&UnitTable>) -> Result<Expr, ParseError> {
    let tokens = tokenize(input)?;
    if tokens.len() > MAX_TOKENS {
        return Err(ParseError::Syntax(format!(
            "expression longer than {} tokens",
            MAX_TOKENS
        )));
    }
    let expr = ExprParser::new(tokens, units).parse_all()?;
    trace!("parsed '{}' into {}", input, expr);
    Ok(expr)
}

impl Expr {
    /// Parses a plain expression (no unit table).
    pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
        parse_expression_func(input, None)
    }

    /// Parses an expression whose names may refer to units of `units`.
    pub fn parse_expression_units(input: &str, units: &UnitTable) -> Result<Expr, ParseError> {
        parse_expression_func(input, Some(units))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_numbers() {
        let tokens = tokenize("1 1. .5 1.5e-3 2E2").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Num(1.0),
                Token::Num(1.0),
                Token::Num(0.5),
                Token::Num(1.5e-3),
                Token::Num(200.0)
            ]
        );
    }

    #[test]
    fn test_tokenize_rejects_stray_characters() {
        assert!(matches!(tokenize("a.b"), Err(ParseError::Syntax(_))));
        assert!(matches!(tokenize("2 @ 3"), Err(ParseError::Syntax(_))));
        assert!(matches!(tokenize("x = 1"), Err(ParseError::Syntax(_))));
    }

    #[test]
    fn test_unevaluated_tree() {
        let expr = Expr::parse_expression("2+2").unwrap();
        assert_eq!(
            expr,
            Expr::Add(Expr::Const(2.0).boxed(), Expr::Const(2.0).boxed())
        );
    }

    #[test]
    fn test_precedence_and_associativity() {
        let expr = Expr::parse_expression("1 + 2*3**2").unwrap();
        assert_eq!(expr.to_f64(), Some(19.0));
        let expr = Expr::parse_expression("2**3**2").unwrap();
        assert_eq!(expr.to_f64(), Some(512.0));
        let expr = Expr::parse_expression("-2**2").unwrap();
        assert_eq!(expr.to_f64(), Some(-4.0));
        let expr = Expr::parse_expression("8/4/2").unwrap();
        assert_eq!(expr.to_f64(), Some(1.0));
        let expr = Expr::parse_expression("2**-1").unwrap();
        assert_eq!(expr.to_f64(), Some(0.5));
    }

    #[test]
    fn test_functions_and_constants() {
        let expr = Expr::parse_expression("sin(pi/2) + log(E)").unwrap();
        assert_eq!(expr.to_f64(), Some(2.0));
        let expr = Expr::parse_expression("tan(x)").unwrap();
        assert_eq!(expr, Expr::tg(Expr::Var("x".to_string()).boxed()));
    }

    #[test]
    fn test_failure_classes() {
        assert!(matches!(
            Expr::parse_expression("foo(2)"),
            Err(ParseError::UnknownFunction(_))
        ));
        assert!(matches!(
            Expr::parse_expression("sin"),
            Err(ParseError::FunctionNotExpression(_))
        ));
        assert!(matches!(
            Expr::parse_expression("cos(2) + sin"),
            Err(ParseError::FunctionNotExpression(_))
        ));
        for bad in ["sin()", "(a", "a)", "1.1)", "1.)", "2 3", "sin(1, 2)", "pi(2)", "*"] {
            assert!(
                matches!(Expr::parse_expression(bad), Err(ParseError::Syntax(_))),
                "{} should be a syntax error",
                bad
            );
        }
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert!(matches!(
            Expr::parse_expression(&deep),
            Err(ParseError::Syntax(_))
        ));
        let shallow = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(Expr::parse_expression(&shallow).unwrap(), Expr::Const(1.0));
        let calls = format!("{}x{}", "sin(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert!(Expr::parse_expression(&calls).is_err());
        assert!(Expr::parse_expression(&"-".repeat(MAX_DEPTH + 1)).is_err());
    }

    #[test]
    fn test_tree_height_limit() {
        // a flat sum nests to the left, one level per operator
        let sum = vec!["1"; MAX_DEPTH].join("+");
        assert!(Expr::parse_expression(&sum).is_ok());
        let sum = vec!["1"; MAX_DEPTH + 1].join("+");
        assert!(matches!(
            Expr::parse_expression(&sum),
            Err(ParseError::Syntax(_))
        ));
        let product = vec!["x"; MAX_DEPTH + 1].join("*");
        assert!(Expr::parse_expression(&product).is_err());
        // short sums inside products stay low
        let grouped = vec!["(a+b)"; 40].join("*");
        assert!(Expr::parse_expression(&grouped).is_ok());
    }

    #[test]
    fn test_token_limit() {
        let long = vec!["(a+b)"; 60].join("*");
        assert!(matches!(
            Expr::parse_expression(&long),
            Err(ParseError::Syntax(_))
        ));
        let long = vec!["1"; 600].join("+");
        assert!(Expr::parse_expression(&long).is_err());
    }

    #[test]
    fn test_units_resolution() {
        let table = UnitTable::standard();
        let expr = Expr::parse_expression_units("2*mm", &table).unwrap();
        assert_eq!(expr.unit_atoms().len(), 1);
        let expr = Expr::parse_expression("2*mm").unwrap();
        assert_eq!(expr.extract_variables(), vec!["mm".to_string()]);
        assert!(matches!(
            Expr::parse_expression_units("mm(2)", &table),
            Err(ParseError::Syntax(_))
        ));
    }

    #[test]
    fn test_display_round_trip() {
        let table = UnitTable::standard();
        for text in [
            "2*mm + 3*inch",
            "-(a*b)",
            "a - (b - c)",
            "a/(b*c)",
            "(-2)**x",
            "x**(-2)",
            "sin(2*mm/(1*inch))",
            "mm**2/s",
        ] {
            let expr = Expr::parse_expression_units(text, &table).unwrap();
            let again = Expr::parse_expression_units(&expr.to_string(), &table).unwrap();
            assert_eq!(expr, again, "{} printed as {}", text, expr);
        }
    }
}
