//! # Symbolic Engine Module
//!
//! The expression tree every other part of the crate works on.
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! - **Variables**: `Var(String)` - the independent variable, e.g. "x"
//! - **Constants**: `Const(f64)` - numerical literals (Euler's number is stored as a constant)
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow` - basic arithmetic
//! - **Functions**: `Func(name, args)` - named functions resolved through a
//!   [`FunctionRegistry`](crate::symbolic::symbolic_functions::FunctionRegistry),
//!   including the two logarithms `ln` and `log10`
//!
//! ### Key Methods
//! - `parse_expression(input, var)` - text to tree with the default parser
//! - `diff(var, registry)` - analytical differentiation
//! - `simplify()` - light algebraic cleanup
//! - `lambdify(var, registry)` - conversion to a complex-valued Rust closure
//!
//! ## Interesting Code Features
//!
//! 1. **Recursive Expression Tree**: `Box<Expr>` children, structural equality via `PartialEq`,
//!    so two formulas that mean the same tree compare equal.
//!
//! 2. **Operator Overloading**: std::ops traits (Add, Sub, Mul, Div, Neg) give natural syntax
//!    for building trees in code: `x.clone() * x - Expr::Const(2.0)`.
//!
//! 3. **Name-based functions**: function nodes carry only a canonical name; what the name means
//!    numerically and how it is differentiated lives in the registry, not in the tree.

#![allow(non_camel_case_types)]

use itertools::Itertools;
use std::fmt;

/// Canonical registry name of the natural logarithm.
pub const LN: &str = "ln";
/// Canonical registry name of the base-10 logarithm.
pub const LOG10: &str = "log10";

/// Core symbolic expression enum representing a formula of one variable as a tree.
///
/// # Examples
/// ```
/// use RustedNewton::symbolic::symbolic_engine::Expr;
/// let x = Expr::Var("x".to_string());
/// let expr = Expr::Add(Box::new(x), Box::new(Expr::Const(2.0)));
/// assert_eq!(expr.to_string(), "(x + 2)");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Symbolic variable with a name
    Var(String),
    /// Numerical constant value
    Const(f64),
    /// Addition operation: left + right
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction operation: left - right
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication operation: left * right
    Mul(Box<Expr>, Box<Expr>),
    /// Division operation: left / right
    Div(Box<Expr>, Box<Expr>),
    /// Power operation: base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    /// Named function application, e.g. `ln(x)` is `Func("ln", [x])`
    Func(String, Vec<Expr>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            Expr::Sub(lhs, rhs) => write!(f, "({} - {})", lhs, rhs),
            Expr::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
            Expr::Div(lhs, rhs) => write!(f, "({} / {})", lhs, rhs),
            Expr::Pow(base, exp) => write!(f, "({} ^ {})", base, exp),
            Expr::Func(name, args) => write!(f, "{}({})", name, args.iter().join(", ")),
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(self))
    }
}

impl Expr {
    /// BASIC FEATURES

    /// Boxes the expression, handy when building trees by hand.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Creates a variable node.
    pub fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    /// Creates a function node of one argument.
    pub fn func(name: &str, arg: Expr) -> Expr {
        Expr::Func(name.to_string(), vec![arg])
    }

    /// Natural logarithm ln(self).
    pub fn ln(self) -> Expr {
        Expr::func(LN, self)
    }

    /// Base-10 logarithm log10(self).
    pub fn log10(self) -> Expr {
        Expr::func(LOG10, self)
    }

    /// Exponential exp(self).
    pub fn exp(self) -> Expr {
        Expr::func("exp", self)
    }

    /// Power self^rhs.
    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    /// Checks if expression is exactly the constant 0.0.
    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 0.0)
    }

    /// Returns the value of a constant node.
    pub fn as_const(&self) -> Option<f64> {
        match self {
            Expr::Const(val) => Some(*val),
            _ => None,
        }
    }

    /// Checks whether the variable occurs anywhere in the tree.
    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            Expr::Const(_) => false,
            Expr::Add(left, right)
            | Expr::Sub(left, right)
            | Expr::Mul(left, right)
            | Expr::Div(left, right)
            | Expr::Pow(left, right) => {
                left.contains_variable(var_name) || right.contains_variable(var_name)
            }
            Expr::Func(_, args) => args.iter().any(|arg| arg.contains_variable(var_name)),
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        match self {
            Expr::Var(_) | Expr::Const(_) => 1,
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => 1 + lhs.node_count() + rhs.node_count(),
            Expr::Func(_, args) => 1 + args.iter().map(Expr::node_count).sum::<usize>(),
        }
    }
}
