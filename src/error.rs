//! Error types of the crate.
//!
//! Only problems that make a session impossible are errors: a formula that does not parse,
//! a function without a derivative rule, a tree that cannot be compiled and an invalid solver
//! configuration. Degenerate derivatives, aborted sessions and iteration caps are ordinary
//! [`Outcome`](crate::numerical::NR::Outcome) values.
use thiserror::Error;

/// Failure to turn text into an expression tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,
    #[error("syntax error at position {position}: cannot parse '{fragment}'")]
    Syntax { position: usize, fragment: String },
    #[error("unexpected input at position {position}: '{fragment}'")]
    UnexpectedInput { position: usize, fragment: String },
    #[error("unbound symbol '{symbol}' (the only variable is '{variable}')")]
    UnboundSymbol { symbol: String, variable: String },
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("function '{name}' expects {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("expression nested deeper than {limit} levels at position {position}")]
    TooDeep { position: usize, limit: usize },
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
    #[error("invalid log function names: {0}")]
    LogNames(String),
    #[error("'{0}' cannot be used as the variable name")]
    InvalidVariable(String),
}

/// Failure of symbolic differentiation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DifferentiationError {
    #[error("function '{0}' has no derivative rule")]
    NoDerivativeRule(String),
    #[error("function '{0}' is not registered")]
    UnknownFunction(String),
    #[error("function '{name}' expects {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Failure to compile an expression tree into a numeric function.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("symbol '{symbol}' is not the compiled variable '{variable}'")]
    UnboundSymbol { symbol: String, variable: String },
    #[error("function '{0}' is not registered")]
    UnknownFunction(String),
    #[error("function '{name}' expects {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Invalid solver configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Everything that can stop a root finding session before the solver produces an outcome.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RootFinderError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("differentiation error: {0}")]
    Differentiation(#[from] DifferentiationError),
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
    #[error("{0}")]
    Config(#[from] ConfigError),
}
