//! Text formula to symbolic expression.
//!
//! Parsing happens in two passes. The grammar pass (nom combinators) turns text into a raw
//! [`Syntax`] tree where names are still plain strings. The resolution pass binds names: the
//! declared variable, the constant `e`, the two log function names fixed by the parser's
//! [`LogNames`], and the functions of its [`FunctionRegistry`].
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary | power)*        juxtaposition is multiplication
//! unary   := ('-' | '+') unary | power
//! power   := primary (('^' | '**') unary)?             right associative
//! primary := number | ident '(' args ')' | ident | '(' expr ')'
//! ```
//!
//! Nesting deeper than [`MAX_NESTING`] levels is a [`ParseError::TooDeep`] rather than a
//! stack overflow.
//!
//! # Example
//! ```
//! use RustedNewton::symbolic::parse_expr::{ExprParser, LogNames};
//! let parser = ExprParser::new(LogNames::default()).unwrap();
//! let implicit = parser.parse("2x^2+3", "x").unwrap();
//! let explicit = parser.parse("2*x^2+3", "x").unwrap();
//! assert_eq!(implicit, explicit);
//! ```
use crate::error::ParseError;
use crate::symbolic::symbolic_engine::{Expr, LN, LOG10};
use crate::symbolic::symbolic_functions::FunctionRegistry;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace0, one_of},
    combinator::{map, opt, recognize},
    error::ErrorKind,
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};

/// Raw syntax tree, names not yet resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Syntax {
    Number(String),
    Ident(String),
    Call(String, Vec<Syntax>),
    Neg(Box<Syntax>),
    /// operator is one of `+ - * / ^`
    Binary(char, Box<Syntax>, Box<Syntax>),
}

fn fold_binary(first: Syntax, rest: Vec<(char, Syntax)>) -> Syntax {
    rest.into_iter().fold(first, |acc, (op, rhs)| {
        Syntax::Binary(op, Box::new(acc), Box::new(rhs))
    })
}

/// identifier: letter or underscore, then letters, digits, underscores
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

/// Deepest accepted nesting of brackets, call arguments, signs and exponents.
pub const MAX_NESTING: usize = 64;

/// An exponent marker without digits after it is left alone, so `2e` reads as `2*e`.
/// A run of dots and digits glued to the literal stays part of it, so `1.5.3` is rejected
/// as a number instead of being read as `1.5 * .3`.
fn number(input: &str) -> IResult<&str, Syntax> {
    let mantissa = alt((
        recognize((digit1, opt((char('.'), digit0)))),
        recognize((char('.'), digit1)),
    ));
    let exponent = opt((one_of("eE"), opt(one_of("+-")), digit1));
    let trailing = take_while(|c: char| c == '.' || c.is_ascii_digit());
    map(recognize((mantissa, exponent, trailing)), |text: &str| {
        Syntax::Number(text.to_string())
    })
    .parse(input)
}

fn call(input: &str, depth: usize) -> IResult<&str, Syntax> {
    map(
        (
            identifier,
            preceded(multispace0, char('(')),
            separated_list0(preceded(multispace0, char(',')), move |i| {
                expr(i, depth + 1)
            }),
            preceded(multispace0, char(')')),
        ),
        |(name, _, args, _)| Syntax::Call(name.to_string(), args),
    )
    .parse(input)
}

fn primary(input: &str, depth: usize) -> IResult<&str, Syntax> {
    preceded(
        multispace0,
        alt((
            number,
            move |i| call(i, depth),
            map(identifier, |name: &str| Syntax::Ident(name.to_string())),
            delimited(
                char('('),
                move |i| expr(i, depth + 1),
                preceded(multispace0, char(')')),
            ),
        )),
    )
    .parse(input)
}

fn power(input: &str, depth: usize) -> IResult<&str, Syntax> {
    let (input, base) = primary(input, depth)?;
    let (input, exponent) = opt(preceded(
        preceded(multispace0, alt((tag("**"), tag("^")))),
        move |i| unary(i, depth + 1),
    ))
    .parse(input)?;
    let node = match exponent {
        Some(exponent) => Syntax::Binary('^', Box::new(base), Box::new(exponent)),
        None => base,
    };
    Ok((input, node))
}

/// Every nested level passes through here, so the depth cap lives here.
fn unary(input: &str, depth: usize) -> IResult<&str, Syntax> {
    if depth > MAX_NESTING {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }
    preceded(
        multispace0,
        alt((
            map(preceded(char('-'), move |i| unary(i, depth + 1)), |inner| {
                Syntax::Neg(Box::new(inner))
            }),
            preceded(char('+'), move |i| unary(i, depth + 1)),
            move |i| power(i, depth),
        )),
    )
    .parse(input)
}

fn term(input: &str, depth: usize) -> IResult<&str, Syntax> {
    let (input, first) = unary(input, depth)?;
    let (input, rest) = many0(alt((
        pair(preceded(multispace0, one_of("*/")), move |i| unary(i, depth)),
        // implicit multiplication: 2x, 2(x+1), (x+1)(x-1), x sin(x)
        map(move |i| power(i, depth), |factor| ('*', factor)),
    )))
    .parse(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn expr(input: &str, depth: usize) -> IResult<&str, Syntax> {
    let (input, first) = term(input, depth)?;
    let (input, rest) = many0(pair(preceded(multispace0, one_of("+-")), move |i| {
        term(i, depth)
    }))
    .parse(input)?;
    Ok((input, fold_binary(first, rest)))
}

/// Runs the grammar pass over the whole input.
pub fn parse_syntax(input: &str) -> Result<Syntax, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    match terminated(|i| expr(i, 0), multispace0).parse(input) {
        Ok(("", tree)) => Ok(tree),
        Ok((rest, _)) => Err(ParseError::UnexpectedInput {
            position: input.len() - rest.len(),
            fragment: rest.to_string(),
        }),
        Err(nom::Err::Failure(e)) if e.code == ErrorKind::TooLarge => Err(ParseError::TooDeep {
            position: input.len() - e.input.len(),
            limit: MAX_NESTING,
        }),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(ParseError::Syntax {
            position: input.len() - e.input.len(),
            fragment: e.input.to_string(),
        }),
        Err(nom::Err::Incomplete(_)) => Err(ParseError::Syntax {
            position: input.len(),
            fragment: String::new(),
        }),
    }
}

/// Which surface names denote the natural and the base-10 logarithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogNames {
    pub natural: String,
    pub base10: String,
}

impl Default for LogNames {
    /// `ln` is the natural logarithm, `log` is the base-10 logarithm.
    fn default() -> Self {
        LogNames::new("ln", "log")
    }
}

impl LogNames {
    pub fn new(natural: &str, base10: &str) -> LogNames {
        LogNames {
            natural: natural.to_string(),
            base10: base10.to_string(),
        }
    }

    /// `log` is the natural logarithm, `log10` is the base-10 logarithm.
    pub fn sympy_like() -> LogNames {
        LogNames::new("log", "log10")
    }

    fn validate(&self) -> Result<(), ParseError> {
        for name in [&self.natural, &self.base10] {
            let is_identifier = matches!(identifier(name), Ok(("", _)));
            if !is_identifier {
                return Err(ParseError::LogNames(format!("'{}' is not an identifier", name)));
            }
        }
        // `e` always denotes Euler's number
        if let Some(name) = [&self.natural, &self.base10].into_iter().find(|n| *n == "e") {
            return Err(ParseError::LogNames(format!(
                "'{}' is reserved for Euler's number",
                name
            )));
        }
        if self.natural == self.base10 {
            return Err(ParseError::LogNames(format!(
                "'{}' cannot name both logarithms",
                self.natural
            )));
        }
        Ok(())
    }
}

/// Parser with a fixed log convention and function registry.
#[derive(Debug, Clone)]
pub struct ExprParser {
    log_names: LogNames,
    registry: FunctionRegistry,
}

impl Default for ExprParser {
    fn default() -> Self {
        ExprParser {
            log_names: LogNames::default(),
            registry: FunctionRegistry::default(),
        }
    }
}

impl ExprParser {
    pub fn new(log_names: LogNames) -> Result<ExprParser, ParseError> {
        ExprParser::with_registry(log_names, FunctionRegistry::default())
    }

    pub fn with_registry(
        log_names: LogNames,
        registry: FunctionRegistry,
    ) -> Result<ExprParser, ParseError> {
        log_names.validate()?;
        Ok(ExprParser {
            log_names,
            registry,
        })
    }

    pub fn log_names(&self) -> &LogNames {
        &self.log_names
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Parses `input` as a function of `variable`.
    pub fn parse(&self, input: &str, variable: &str) -> Result<Expr, ParseError> {
        let variable_ok = matches!(identifier(variable), Ok(("", _)));
        if !variable_ok || self.function_name(variable).is_some() {
            return Err(ParseError::InvalidVariable(variable.to_string()));
        }
        let syntax = parse_syntax(input)?;
        self.resolve(syntax, variable)
    }

    /// Canonical registry name for a surface function name.
    fn function_name<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if name == self.log_names.natural {
            Some(LN)
        } else if name == self.log_names.base10 {
            Some(LOG10)
        } else if self.registry.contains(name) {
            Some(name)
        } else {
            None
        }
    }

    fn symbol(&self, name: &str, variable: &str) -> Option<Expr> {
        if name == variable {
            Some(Expr::Var(name.to_string()))
        } else if name == "e" {
            Some(Expr::Const(std::f64::consts::E))
        } else {
            None
        }
    }

    fn resolve(&self, syntax: Syntax, variable: &str) -> Result<Expr, ParseError> {
        match syntax {
            Syntax::Number(text) => match text.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Expr::Const(value)),
                _ => Err(ParseError::InvalidNumber(text)),
            },
            Syntax::Ident(name) => {
                self.symbol(&name, variable)
                    .ok_or_else(|| ParseError::UnboundSymbol {
                        symbol: name,
                        variable: variable.to_string(),
                    })
            }
            Syntax::Call(name, args) => {
                if let Some(canonical) = self.function_name(&name).map(str::to_string) {
                    let expected = self.registry.get(&canonical).map(|def| def.arity).unwrap_or(1);
                    if args.len() != expected {
                        return Err(ParseError::Arity {
                            name,
                            expected,
                            found: args.len(),
                        });
                    }
                    let args = args
                        .into_iter()
                        .map(|arg| self.resolve(arg, variable))
                        .collect::<Result<Vec<Expr>, ParseError>>()?;
                    return Ok(Expr::Func(canonical, args));
                }
                // `x(x+1)` is a product when `x` is a symbol
                let symbol = self
                    .symbol(&name, variable)
                    .ok_or_else(|| ParseError::UnknownFunction(name.clone()))?;
                let mut args = args.into_iter();
                match (args.next(), args.next()) {
                    (Some(factor), None) => Ok(Expr::Mul(
                        Box::new(symbol),
                        Box::new(self.resolve(factor, variable)?),
                    )),
                    _ => Err(ParseError::UnknownFunction(name)),
                }
            }
            Syntax::Neg(inner) => match self.resolve(*inner, variable)? {
                Expr::Const(value) => Ok(Expr::Const(-value)),
                other => Ok(-other),
            },
            Syntax::Binary(op, lhs, rhs) => {
                let lhs = Box::new(self.resolve(*lhs, variable)?);
                let rhs = Box::new(self.resolve(*rhs, variable)?);
                Ok(match op {
                    '+' => Expr::Add(lhs, rhs),
                    '-' => Expr::Sub(lhs, rhs),
                    '*' => Expr::Mul(lhs, rhs),
                    '/' => Expr::Div(lhs, rhs),
                    _ => Expr::Pow(lhs, rhs),
                })
            }
        }
    }
}

impl Expr {
    /// Parses a formula of `var` with the default parser (`ln` natural, `log` base 10).
    pub fn parse_expression(input: &str, var: &str) -> Result<Expr, ParseError> {
        ExprParser::default().parse(input, var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::E;

    fn x() -> Box<Expr> {
        Box::new(Expr::Var("x".to_string()))
    }

    fn parse(input: &str) -> Result<Expr, ParseError> {
        Expr::parse_expression(input, "x")
    }

    #[test]
    fn test_parse_constant() {
        assert_eq!(parse("42").unwrap(), Expr::Const(42.0));
        assert_eq!(parse("1.5e3").unwrap(), Expr::Const(1500.0));
        assert_eq!(parse(".25").unwrap(), Expr::Const(0.25));
    }

    #[test]
    fn test_parse_variable() {
        assert_eq!(parse("x").unwrap(), Expr::Var("x".to_string()));
    }

    #[test]
    fn test_parse_addition() {
        let expr = parse("x + 2").unwrap();
        assert_eq!(expr, Expr::Add(x(), Box::new(Expr::Const(2.0))));
    }

    #[test]
    fn test_parse_subtraction() {
        let expr = parse("x - 2").unwrap();
        assert_eq!(expr, Expr::Sub(x(), Box::new(Expr::Const(2.0))));
    }

    #[test]
    fn test_parse_division() {
        let expr = parse("x / 2").unwrap();
        assert_eq!(expr, Expr::Div(x(), Box::new(Expr::Const(2.0))));
    }

    #[test]
    fn test_parse_power() {
        let expected = Expr::Pow(x(), Box::new(Expr::Const(2.0)));
        assert_eq!(parse("x^2").unwrap(), expected);
        assert_eq!(parse("x**2").unwrap(), expected);
    }

    #[test]
    fn test_power_is_right_associative() {
        let expr = parse("x^2^3").unwrap();
        let expected = Expr::Pow(
            x(),
            Box::new(Expr::Pow(
                Box::new(Expr::Const(2.0)),
                Box::new(Expr::Const(3.0)),
            )),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_multiple_subtraction_is_left_associative() {
        let result = parse("x^2 - x - 1").unwrap();
        let to_check = Expr::Pow(x(), Box::new(Expr::Const(2.0))) - *x() - Expr::Const(1.0);
        assert_eq!(result, to_check);
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(parse("2x^2+3").unwrap(), parse("2*x^2+3").unwrap());
        assert_eq!(parse("2(x+1)").unwrap(), parse("2*(x+1)").unwrap());
        assert_eq!(parse("(x+1)(x-1)").unwrap(), parse("(x+1)*(x-1)").unwrap());
        assert_eq!(parse("x(x+1)").unwrap(), parse("x*(x+1)").unwrap());
        assert_eq!(parse("3x sin(x)").unwrap(), parse("3*x*sin(x)").unwrap());
    }

    #[test]
    fn test_euler_constant() {
        assert_eq!(parse("e").unwrap(), Expr::Const(E));
        assert_eq!(
            parse("2e").unwrap(),
            Expr::Mul(Box::new(Expr::Const(2.0)), Box::new(Expr::Const(E)))
        );
        assert_eq!(
            parse("2exp(x)").unwrap(),
            Expr::Mul(Box::new(Expr::Const(2.0)), Box::new(Expr::var("x").exp()))
        );
        // a declared variable named e shadows the constant
        assert_eq!(
            Expr::parse_expression("e + 1", "e").unwrap(),
            Expr::Add(Box::new(Expr::var("e")), Box::new(Expr::Const(1.0)))
        );
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(parse("-3").unwrap(), Expr::Const(-3.0));
        assert_eq!(parse("-x^2").unwrap(), -(Expr::Pow(x(), Box::new(Expr::Const(2.0)))));
        assert_eq!(
            parse("2^-1").unwrap(),
            Expr::Pow(Box::new(Expr::Const(2.0)), Box::new(Expr::Const(-1.0)))
        );
        assert_eq!(
            parse("x * -2").unwrap(),
            Expr::Mul(x(), Box::new(Expr::Const(-2.0)))
        );
    }

    #[test]
    fn test_parse_with_brackets() {
        let expr = parse("(x + 1) * x").unwrap();
        assert_eq!(
            expr,
            Expr::Mul(
                Box::new(Expr::Add(x(), Box::new(Expr::Const(1.0)))),
                x()
            )
        );
    }

    #[test]
    fn test_default_log_names() {
        assert_eq!(parse("ln(x)").unwrap(), Expr::var("x").ln());
        assert_eq!(parse("log(x)").unwrap(), Expr::var("x").log10());
        // canonical names stay available
        assert_eq!(parse("log10(x)").unwrap(), Expr::var("x").log10());
    }

    #[test]
    fn test_sympy_like_log_names() {
        let parser = ExprParser::new(LogNames::sympy_like()).unwrap();
        assert_eq!(parser.parse("log(x)", "x").unwrap(), Expr::var("x").ln());
        assert_eq!(parser.parse("log10(x)", "x").unwrap(), Expr::var("x").log10());
    }

    #[test]
    fn test_invalid_log_names() {
        assert!(matches!(
            ExprParser::new(LogNames::new("log", "log")),
            Err(ParseError::LogNames(_))
        ));
        assert!(matches!(
            ExprParser::new(LogNames::new("2log", "log")),
            Err(ParseError::LogNames(_))
        ));
        assert!(matches!(
            ExprParser::new(LogNames::new("e", "log")),
            Err(ParseError::LogNames(_))
        ));
        assert!(matches!(
            ExprParser::new(LogNames::new("ln", "e")),
            Err(ParseError::LogNames(_))
        ));
    }

    #[test]
    fn test_parse_nested_functions() {
        let expr = parse("sin(cos(x))").unwrap();
        assert_eq!(expr, Expr::func("sin", Expr::func("cos", *x())));
    }

    #[test]
    fn test_unbound_symbol() {
        assert_eq!(
            parse("x + y"),
            Err(ParseError::UnboundSymbol {
                symbol: "y".to_string(),
                variable: "x".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(parse("foo(x)"), Err(ParseError::UnknownFunction("foo".to_string())));
    }

    #[test]
    fn test_wrong_arity() {
        assert!(matches!(parse("sin(x, x)"), Err(ParseError::Arity { .. })));
        assert!(matches!(parse("sin()"), Err(ParseError::Arity { .. })));
    }

    #[test]
    fn test_invalid_expressions() {
        assert_eq!(parse(""), Err(ParseError::Empty));
        assert_eq!(parse("   "), Err(ParseError::Empty));
        assert!(parse("(x +").is_err());
        assert!(parse("(x + 1").is_err());
        assert!(matches!(parse("x + 1)"), Err(ParseError::UnexpectedInput { .. })));
        assert!(parse("x $ 2").is_err());
        assert!(parse("x *").is_err());
        assert!(matches!(parse("1e999"), Err(ParseError::InvalidNumber(_))));
    }

    #[test]
    fn test_malformed_numbers() {
        for input in ["1.5.3", "1..2", "2x + 1.5.3", "1e5.2", ".5.5"] {
            assert!(
                matches!(parse(input), Err(ParseError::InvalidNumber(_))),
                "{} should be rejected",
                input
            );
        }
        // separated literals are still a product
        assert_eq!(parse("2 .5").unwrap(), parse("2*0.5").unwrap());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(parse(&nested(MAX_NESTING)).unwrap(), *x());
        assert!(matches!(
            parse(&nested(1000)),
            Err(ParseError::TooDeep { limit: MAX_NESTING, .. })
        ));
        let signs = format!("{}x", "-".repeat(1000));
        assert!(matches!(parse(&signs), Err(ParseError::TooDeep { .. })));
        let tower = vec!["x"; 1000].join("^");
        assert!(matches!(parse(&tower), Err(ParseError::TooDeep { .. })));
        let calls = format!("{}x{}", "sin(".repeat(1000), ")".repeat(1000));
        assert!(matches!(parse(&calls), Err(ParseError::TooDeep { .. })));
        // long flat sums are not nesting
        let sum = vec!["x"; 200].join(" + ");
        assert!(parse(&sum).is_ok());
    }

    #[test]
    fn test_invalid_variable() {
        assert!(matches!(
            Expr::parse_expression("x", "sin"),
            Err(ParseError::InvalidVariable(_))
        ));
        assert!(matches!(
            Expr::parse_expression("x", "1x"),
            Err(ParseError::InvalidVariable(_))
        ));
    }

    #[test]
    fn test_same_text_same_tree() {
        let input = "x^3 - 2x + ln(x^2 + 1) / 3";
        assert_eq!(parse(input).unwrap(), parse(input).unwrap());
    }
}
