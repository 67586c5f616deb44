//! Registry of named functions.
//!
//! Every `Expr::Func` node is resolved by name through a [`FunctionRegistry`]. A registry entry
//! ([`FunctionDef`]) carries the arity, the numeric rule used by the compiler and, optionally,
//! the derivative rule used by the differentiator. The two logarithms are ordinary entries with
//! their own rules, so `ln` and `log10` can never be confused with each other by a generic
//! "log" of some numeric library.
//!
//! # Example
//! ```
//! use RustedNewton::symbolic::symbolic_functions::FunctionRegistry;
//! use num_complex::Complex64;
//! let registry = FunctionRegistry::default();
//! let log10 = registry.get("log10").unwrap();
//! let value = (log10.numeric)(&[Complex64::new(1000.0, 0.0)]);
//! assert!((value.re - 3.0).abs() < 1e-12);
//! ```
use crate::symbolic::symbolic_engine::{Expr, LN, LOG10};
use num_complex::Complex64;
use std::collections::HashMap;
use std::f64::consts::LN_10;
use std::fmt;
use std::sync::Arc;

/// Numeric rule: evaluates the function at already evaluated arguments.
pub type NumericRule = Arc<dyn Fn(&[Complex64]) -> Complex64 + Send + Sync>;
/// Derivative rule: receives the arguments and their derivatives and returns the full derivative
/// of the function node (chain rule included).
pub type DerivativeRule = Arc<dyn Fn(&[Expr], &[Expr]) -> Expr + Send + Sync>;

/// One named function known to the parser, the differentiator and the compiler.
#[derive(Clone)]
pub struct FunctionDef {
    pub name: String,
    pub arity: usize,
    pub numeric: NumericRule,
    pub derivative: Option<DerivativeRule>,
}

impl fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("has_derivative", &self.derivative.is_some())
            .finish()
    }
}

impl FunctionDef {
    /// Function of one argument.
    pub fn unary<N, D>(name: &str, numeric: N, derivative: Option<D>) -> FunctionDef
    where
        N: Fn(Complex64) -> Complex64 + Send + Sync + 'static,
        D: Fn(&Expr, &Expr) -> Expr + Send + Sync + 'static,
    {
        FunctionDef {
            name: name.to_string(),
            arity: 1,
            numeric: Arc::new(move |args: &[Complex64]| numeric(args[0])),
            derivative: derivative.map(|rule| {
                Arc::new(move |args: &[Expr], d_args: &[Expr]| rule(&args[0], &d_args[0]))
                    as DerivativeRule
            }),
        }
    }
}

/// Mapping from function name to its definition.
#[derive(Clone, Debug)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDef>,
}

type UnaryDerivative = fn(&Expr, &Expr) -> Expr;

fn mul(a: Expr, b: Expr) -> Expr {
    Expr::Mul(Box::new(a), Box::new(b))
}

fn div(a: Expr, b: Expr) -> Expr {
    Expr::Div(Box::new(a), Box::new(b))
}

fn square(a: Expr) -> Expr {
    Expr::Pow(Box::new(a), Box::new(Expr::Const(2.0)))
}

fn one_minus_square_root(g: &Expr) -> Expr {
    Expr::Pow(
        Box::new(Expr::Sub(
            Box::new(Expr::Const(1.0)),
            Box::new(square(g.clone())),
        )),
        Box::new(Expr::Const(0.5)),
    )
}

fn real_sign(z: Complex64) -> Complex64 {
    if z.im == 0.0 {
        let s = if z.re > 0.0 {
            1.0
        } else if z.re < 0.0 {
            -1.0
        } else {
            0.0
        };
        Complex64::new(s, 0.0)
    } else {
        z / z.norm()
    }
}

impl Default for FunctionRegistry {
    /// Standard functions plus the natural (`ln`) and base-10 (`log10`) logarithms.
    fn default() -> Self {
        let mut registry = FunctionRegistry::new();
        let standard: &[(&str, fn(Complex64) -> Complex64, Option<UnaryDerivative>)] = &[
            // d/dx ln(g) = g'/g
            (LN, |z: Complex64| z.ln(), Some(|g: &Expr, d: &Expr| div(d.clone(), g.clone()))),
            // d/dx log10(g) = g'/(g ln10)
            (
                LOG10,
                |z: Complex64| z.ln() / LN_10,
                Some(|g: &Expr, d: &Expr| div(d.clone(), mul(g.clone(), Expr::Const(LN_10)))),
            ),
            ("exp", |z: Complex64| z.exp(), Some(|g: &Expr, d: &Expr| mul(g.clone().exp(), d.clone()))),
            (
                "sqrt",
                |z: Complex64| z.sqrt(),
                Some(|g: &Expr, d: &Expr| {
                    div(
                        d.clone(),
                        mul(Expr::Const(2.0), Expr::func("sqrt", g.clone())),
                    )
                }),
            ),
            (
                "sin",
                |z: Complex64| z.sin(),
                Some(|g: &Expr, d: &Expr| mul(Expr::func("cos", g.clone()), d.clone())),
            ),
            (
                "cos",
                |z: Complex64| z.cos(),
                Some(|g: &Expr, d: &Expr| {
                    mul(
                        mul(Expr::Const(-1.0), Expr::func("sin", g.clone())),
                        d.clone(),
                    )
                }),
            ),
            (
                "tan",
                |z: Complex64| z.tan(),
                Some(|g: &Expr, d: &Expr| div(d.clone(), square(Expr::func("cos", g.clone())))),
            ),
            (
                "asin",
                |z: Complex64| z.asin(),
                Some(|g: &Expr, d: &Expr| div(d.clone(), one_minus_square_root(g))),
            ),
            (
                "acos",
                |z: Complex64| z.acos(),
                Some(|g: &Expr, d: &Expr| {
                    div(
                        mul(Expr::Const(-1.0), d.clone()),
                        one_minus_square_root(g),
                    )
                }),
            ),
            (
                "atan",
                |z: Complex64| z.atan(),
                Some(|g: &Expr, d: &Expr| {
                    div(
                        d.clone(),
                        Expr::Add(Box::new(Expr::Const(1.0)), Box::new(square(g.clone()))),
                    )
                }),
            ),
            (
                "sinh",
                |z: Complex64| z.sinh(),
                Some(|g: &Expr, d: &Expr| mul(Expr::func("cosh", g.clone()), d.clone())),
            ),
            (
                "cosh",
                |z: Complex64| z.cosh(),
                Some(|g: &Expr, d: &Expr| mul(Expr::func("sinh", g.clone()), d.clone())),
            ),
            (
                "tanh",
                |z: Complex64| z.tanh(),
                Some(|g: &Expr, d: &Expr| div(d.clone(), square(Expr::func("cosh", g.clone())))),
            ),
            (
                "abs",
                |z: Complex64| Complex64::new(z.norm(), 0.0),
                Some(|g: &Expr, d: &Expr| mul(Expr::func("sign", g.clone()), d.clone())),
            ),
            // derivative of sign is zero almost everywhere and undefined at 0
            ("sign", real_sign, None),
        ];
        for (name, numeric, derivative) in standard.iter().copied() {
            registry.register(FunctionDef::unary(name, numeric, derivative));
        }
        registry
    }
}

impl FunctionRegistry {
    /// Empty registry.
    pub fn new() -> FunctionRegistry {
        FunctionRegistry {
            functions: HashMap::new(),
        }
    }

    /// Adds or replaces a definition, returning the previous one.
    pub fn register(&mut self, def: FunctionDef) -> Option<FunctionDef> {
        self.functions.insert(def.name.clone(), def)
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Sorted names of all registered functions.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    /// Replaces the numeric rule of a registered function. Returns the replaced rule, or `None`
    /// (and changes nothing) when the name is not registered.
    pub fn override_numeric<N>(&mut self, name: &str, numeric: N) -> Option<NumericRule>
    where
        N: Fn(&[Complex64]) -> Complex64 + Send + Sync + 'static,
    {
        let def = self.functions.get_mut(name)?;
        Some(std::mem::replace(&mut def.numeric, Arc::new(numeric)))
    }

    /// Replaces (or removes, with `None`) the derivative rule of a registered function.
    /// Returns false when the name is not registered.
    pub fn override_derivative(&mut self, name: &str, derivative: Option<DerivativeRule>) -> bool {
        match self.functions.get_mut(name) {
            Some(def) => {
                def.derivative = derivative;
                true
            }
            None => false,
        }
    }
}
