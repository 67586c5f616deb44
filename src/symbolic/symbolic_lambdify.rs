//! # Lambdification
//!
//! Turns an [`Expr`] into a closure over `Complex64`. The closure tree mirrors the expression
//! tree; subtrees that do not depend on the variable are evaluated once, at compile time.
//!
//! Named functions are resolved through the [`FunctionRegistry`] passed in, so the meaning of
//! `ln`, `log10` or any other function can be changed by handing over another registry (see
//! [`FunctionRegistry::override_numeric`]).
//!
//! Values outside the real domain of a function are not errors: `ln(-1)` is `iπ` and the
//! imaginary part is carried along to the caller.
use crate::error::CompileError;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_functions::FunctionRegistry;
use num_complex::Complex64;
use num_traits::Zero;
use std::fmt;

type Compiled = Box<dyn Fn(Complex64) -> Complex64 + Send + Sync>;

/// Anything that can be evaluated at a complex point. Implemented by [`NumericFunction`] and by
/// plain closures, which is handy in tests and benchmarks.
pub trait NumericFn {
    fn evaluate(&self, z: Complex64) -> Complex64;
}

impl<F> NumericFn for F
where
    F: Fn(Complex64) -> Complex64,
{
    fn evaluate(&self, z: Complex64) -> Complex64 {
        self(z)
    }
}

/// Compiled single variable function. Stateless, reusable, `Send + Sync`.
pub struct NumericFunction {
    variable: String,
    func: Compiled,
}

impl fmt::Debug for NumericFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumericFunction")
            .field("variable", &self.variable)
            .finish_non_exhaustive()
    }
}

impl NumericFunction {
    /// Evaluates at a real point (promoted to complex).
    pub fn eval(&self, x: f64) -> Complex64 {
        (self.func)(Complex64::new(x, 0.0))
    }

    pub fn eval_complex(&self, z: Complex64) -> Complex64 {
        (self.func)(z)
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }
}

impl NumericFn for NumericFunction {
    fn evaluate(&self, z: Complex64) -> Complex64 {
        self.eval_complex(z)
    }
}

/// Power with the cheapest evaluation path that is still exact for the given operands.
pub fn complex_pow(base: Complex64, exp: Complex64) -> Complex64 {
    if exp.im == 0.0 {
        let p = exp.re;
        if p.fract() == 0.0 && p.abs() <= i32::MAX as f64 {
            if base.im == 0.0 {
                return Complex64::new(base.re.powi(p as i32), 0.0);
            }
            return base.powi(p as i32);
        }
        if base.im == 0.0 && base.re >= 0.0 {
            return Complex64::new(base.re.powf(p), 0.0);
        }
    }
    if base.is_zero() && exp.re > 0.0 {
        return Complex64::zero();
    }
    base.powc(exp)
}

fn compile(expr: &Expr, var: &str, registry: &FunctionRegistry) -> Result<Compiled, CompileError> {
    if !expr.contains_variable(var) && !matches!(expr, Expr::Const(_)) {
        // constant subtree: evaluate once
        let value = compile_node(expr, var, registry)?(Complex64::zero());
        return Ok(Box::new(move |_| value));
    }
    compile_node(expr, var, registry)
}

fn compile_node(
    expr: &Expr,
    var: &str,
    registry: &FunctionRegistry,
) -> Result<Compiled, CompileError> {
    let compiled: Compiled = match expr {
        Expr::Var(name) => {
            if name != var {
                return Err(CompileError::UnboundSymbol {
                    symbol: name.clone(),
                    variable: var.to_string(),
                });
            }
            Box::new(|z| z)
        }
        Expr::Const(c) => {
            let value = Complex64::new(*c, 0.0);
            Box::new(move |_| value)
        }
        Expr::Add(lhs, rhs) => {
            let lhs_fn = compile(lhs, var, registry)?;
            let rhs_fn = compile(rhs, var, registry)?;
            Box::new(move |z| lhs_fn(z) + rhs_fn(z))
        }
        Expr::Sub(lhs, rhs) => {
            let lhs_fn = compile(lhs, var, registry)?;
            let rhs_fn = compile(rhs, var, registry)?;
            Box::new(move |z| lhs_fn(z) - rhs_fn(z))
        }
        Expr::Mul(lhs, rhs) => {
            let lhs_fn = compile(lhs, var, registry)?;
            let rhs_fn = compile(rhs, var, registry)?;
            Box::new(move |z| lhs_fn(z) * rhs_fn(z))
        }
        Expr::Div(lhs, rhs) => {
            let lhs_fn = compile(lhs, var, registry)?;
            let rhs_fn = compile(rhs, var, registry)?;
            Box::new(move |z| lhs_fn(z) / rhs_fn(z))
        }
        Expr::Pow(base, exp) => {
            let base_fn = compile(base, var, registry)?;
            let exp_fn = compile(exp, var, registry)?;
            Box::new(move |z| complex_pow(base_fn(z), exp_fn(z)))
        }
        Expr::Func(name, args) => {
            let def = registry
                .get(name)
                .ok_or_else(|| CompileError::UnknownFunction(name.clone()))?;
            if def.arity != args.len() {
                return Err(CompileError::Arity {
                    name: name.clone(),
                    expected: def.arity,
                    found: args.len(),
                });
            }
            let numeric = def.numeric.clone();
            let mut arg_fns = args
                .iter()
                .map(|arg| compile(arg, var, registry))
                .collect::<Result<Vec<Compiled>, CompileError>>()?;
            if arg_fns.len() == 1 {
                let arg_fn = arg_fns.remove(0);
                Box::new(move |z| numeric(&[arg_fn(z)]))
            } else {
                Box::new(move |z| {
                    let values: Vec<Complex64> = arg_fns.iter().map(|f| f(z)).collect();
                    numeric(&values)
                })
            }
        }
    };
    Ok(compiled)
}

impl Expr {
    /// Compiles the expression into a [`NumericFunction`] of `var`.
    ///
    /// # Examples
    /// ```
    /// use RustedNewton::symbolic::symbolic_engine::Expr;
    /// use RustedNewton::symbolic::symbolic_functions::FunctionRegistry;
    /// let f = Expr::parse_expression("x^2 + 1", "x").unwrap();
    /// let func = f.lambdify("x", &FunctionRegistry::default()).unwrap();
    /// assert_eq!(func.eval(3.0).re, 10.0);
    /// ```
    pub fn lambdify(
        &self,
        var: &str,
        registry: &FunctionRegistry,
    ) -> Result<NumericFunction, CompileError> {
        Ok(NumericFunction {
            variable: var.to_string(),
            func: compile(self, var, registry)?,
        })
    }
}
