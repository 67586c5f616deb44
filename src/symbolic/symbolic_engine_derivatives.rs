//! # Symbolic Engine Derivatives Module
//!
//! Analytical differentiation of [`Expr`] trees.
//!
//! ## Key Methods
//! - `diff(var, registry)` - derivative with respect to `var`, unsimplified
//! - `diff_simplified(var, registry)` - the same followed by `simplify()`
//!
//! ## Rules
//! Sum, difference, product and quotient rules; the power rule in its three shapes (constant
//! exponent, constant base, both varying); the chain rule through function nodes. A function
//! node is never differentiated generically: the rule comes from the registry entry, and a
//! missing entry or a missing rule is a [`DifferentiationError`].

use crate::error::DifferentiationError;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_functions::FunctionRegistry;

impl Expr {
    /// DIFFERENTIATION

    /// Computes the analytical derivative of the expression with respect to a variable.
    ///
    /// - Power rule: d/dx(b^n) = n*b^(n-1)*b'
    /// - Exponential rule: d/dx(a^e) = a^e*ln(a)*e'
    /// - General power: d/dx(b^e) = b^e*(e'*ln(b) + e*b'/b)
    /// - Product rule: d/dx(f*g) = f'*g + f*g'
    /// - Quotient rule: d/dx(f/g) = (f'*g - g'*f)/(g*g)
    /// - Chain rule: through the registry's derivative rule of the function
    ///
    /// # Examples
    /// ```
    /// use RustedNewton::symbolic::symbolic_engine::Expr;
    /// use RustedNewton::symbolic::symbolic_functions::FunctionRegistry;
    /// let registry = FunctionRegistry::default();
    /// let f = Expr::parse_expression("x^2", "x").unwrap();
    /// let df_dx = f.diff_simplified("x", &registry).unwrap();
    /// assert_eq!(df_dx.to_string(), "(2 * x)");
    /// ```
    pub fn diff(&self, var: &str, registry: &FunctionRegistry) -> Result<Expr, DifferentiationError> {
        let derivative = match self {
            Expr::Var(name) => {
                if name == var {
                    Expr::Const(1.0)
                } else {
                    Expr::Const(0.0)
                }
            }
            Expr::Const(_) => Expr::Const(0.0),
            Expr::Add(lhs, rhs) => Expr::Add(
                Box::new(lhs.diff(var, registry)?),
                Box::new(rhs.diff(var, registry)?),
            ),
            Expr::Sub(lhs, rhs) => Expr::Sub(
                Box::new(lhs.diff(var, registry)?),
                Box::new(rhs.diff(var, registry)?),
            ),
            Expr::Mul(lhs, rhs) => Expr::Add(
                Box::new(Expr::Mul(Box::new(lhs.diff(var, registry)?), rhs.clone())),
                Box::new(Expr::Mul(lhs.clone(), Box::new(rhs.diff(var, registry)?))),
            ),
            Expr::Div(lhs, rhs) => Expr::Div(
                Box::new(Expr::Sub(
                    Box::new(Expr::Mul(Box::new(lhs.diff(var, registry)?), rhs.clone())),
                    Box::new(Expr::Mul(Box::new(rhs.diff(var, registry)?), lhs.clone())),
                )),
                Box::new(Expr::Mul(rhs.clone(), rhs.clone())),
            ),
            Expr::Pow(base, exp) => {
                let base_varies = base.contains_variable(var);
                let exp_varies = exp.contains_variable(var);
                match (base_varies, exp_varies) {
                    (_, false) => Expr::Mul(
                        Box::new(Expr::Mul(
                            exp.clone(),
                            Box::new(Expr::Pow(
                                base.clone(),
                                Box::new(Expr::Sub(exp.clone(), Box::new(Expr::Const(1.0)))),
                            )),
                        )),
                        Box::new(base.diff(var, registry)?),
                    ),
                    (false, true) => Expr::Mul(
                        Box::new(Expr::Mul(
                            Box::new(self.clone()),
                            Box::new(base.as_ref().clone().ln()),
                        )),
                        Box::new(exp.diff(var, registry)?),
                    ),
                    (true, true) => Expr::Mul(
                        Box::new(self.clone()),
                        Box::new(Expr::Add(
                            Box::new(Expr::Mul(
                                Box::new(exp.diff(var, registry)?),
                                Box::new(base.as_ref().clone().ln()),
                            )),
                            Box::new(Expr::Div(
                                Box::new(Expr::Mul(exp.clone(), Box::new(base.diff(var, registry)?))),
                                base.clone(),
                            )),
                        )),
                    ),
                }
            }
            Expr::Func(name, args) => {
                let def = registry
                    .get(name)
                    .ok_or_else(|| DifferentiationError::UnknownFunction(name.clone()))?;
                if def.arity != args.len() {
                    return Err(DifferentiationError::Arity {
                        name: name.clone(),
                        expected: def.arity,
                        found: args.len(),
                    });
                }
                let rule = def
                    .derivative
                    .as_ref()
                    .ok_or_else(|| DifferentiationError::NoDerivativeRule(name.clone()))?;
                let d_args = args
                    .iter()
                    .map(|arg| arg.diff(var, registry))
                    .collect::<Result<Vec<Expr>, DifferentiationError>>()?;
                rule(args.as_slice(), d_args.as_slice())
            }
        };
        Ok(derivative)
    }

    /// Derivative followed by algebraic cleanup.
    pub fn diff_simplified(
        &self,
        var: &str,
        registry: &FunctionRegistry,
    ) -> Result<Expr, DifferentiationError> {
        Ok(self.diff(var, registry)?.simplify())
    }
}
