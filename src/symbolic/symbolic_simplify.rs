//! # Symbolic Expression Simplification Module
//!
//! Light, value-preserving cleanup of expression trees. It exists to keep generated derivatives
//! readable and cheap to evaluate, not to find canonical forms.
//!
//! 1. **Constant Folding**: arithmetic on two constants is evaluated
//! 2. **Algebraic Identities**: x + 0 = x, x * 1 = x, x * 0 = 0, x ^ 1 = x, x ^ 0 = 1, x - x = 0
//! 3. **Coefficient Merging**: c1 * (c2 * x) = (c1 * c2) * x
//!
//! Function nodes are simplified argument-wise and are never folded here, because their
//! meaning lives in the registry; the numeric compiler folds constant calls instead.

use crate::symbolic::symbolic_engine::Expr;

fn fold_pow(base: f64, exp: f64) -> Option<f64> {
    let integral = exp.fract() == 0.0;
    if base < 0.0 && !integral {
        // complex result
        return None;
    }
    let value = if integral && exp.abs() <= i32::MAX as f64 {
        base.powi(exp as i32)
    } else {
        base.powf(exp)
    };
    value.is_finite().then_some(value)
}

impl Expr {
    //___________________________________SIMPLIFICATION____________________________________

    /// Simplifies the tree bottom-up.
    ///
    /// ## Examples
    ///
    /// - `0 * (x + 1)` → `0`
    /// - `(2 - 1) * x ^ 1` → `x`
    /// - `3 * (2 * x)` → `6 * x`
    pub fn simplify(&self) -> Expr {
        match self {
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                match (lhs.as_const(), rhs.as_const()) {
                    (Some(a), Some(b)) => Expr::Const(a + b),
                    (Some(a), None) if a == 0.0 => rhs,
                    (None, Some(b)) if b == 0.0 => lhs,
                    _ => Expr::Add(Box::new(lhs), Box::new(rhs)),
                }
            }
            Expr::Sub(lhs, rhs) => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                match (lhs.as_const(), rhs.as_const()) {
                    (Some(a), Some(b)) => Expr::Const(a - b),
                    (None, Some(b)) if b == 0.0 => lhs,
                    (Some(a), None) if a == 0.0 => (-rhs).simplify(),
                    _ if lhs == rhs => Expr::Const(0.0),
                    _ => Expr::Sub(Box::new(lhs), Box::new(rhs)),
                }
            }
            Expr::Mul(lhs, rhs) => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                match (lhs.as_const(), rhs.as_const()) {
                    (Some(a), Some(b)) => Expr::Const(a * b),
                    (Some(a), _) | (_, Some(a)) if a == 0.0 => Expr::Const(0.0),
                    (Some(a), None) if a == 1.0 => rhs,
                    (None, Some(b)) if b == 1.0 => lhs,
                    (Some(a), None) => Expr::merge_coefficient(a, rhs),
                    (None, Some(b)) => Expr::merge_coefficient(b, lhs),
                    (None, None) => Expr::Mul(Box::new(lhs), Box::new(rhs)),
                }
            }
            Expr::Div(lhs, rhs) => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                match (lhs.as_const(), rhs.as_const()) {
                    (Some(a), Some(b)) if b != 0.0 => Expr::Const(a / b),
                    (Some(a), None) if a == 0.0 => Expr::Const(0.0),
                    (None, Some(b)) if b == 1.0 => lhs,
                    _ if lhs == rhs && !lhs.is_zero() => Expr::Const(1.0),
                    _ => Expr::Div(Box::new(lhs), Box::new(rhs)),
                }
            }
            Expr::Pow(base, exp) => {
                let base = base.simplify();
                let exp = exp.simplify();
                match (base.as_const(), exp.as_const()) {
                    (_, Some(e)) if e == 0.0 => Expr::Const(1.0),
                    (_, Some(e)) if e == 1.0 => base,
                    (Some(b), Some(e)) => match fold_pow(b, e) {
                        Some(value) => Expr::Const(value),
                        None => Expr::Pow(Box::new(base), Box::new(exp)),
                    },
                    _ => Expr::Pow(Box::new(base), Box::new(exp)),
                }
            }
            Expr::Func(name, args) => {
                Expr::Func(name.clone(), args.iter().map(Expr::simplify).collect())
            }
        }
    }

    /// c * expr, folding c into a constant factor of expr when there is one.
    fn merge_coefficient(c: f64, expr: Expr) -> Expr {
        if let Expr::Mul(lhs, rhs) = &expr {
            if let Some(inner) = lhs.as_const() {
                return Expr::Mul(Box::new(Expr::Const(c * inner)), rhs.clone());
            }
            if let Some(inner) = rhs.as_const() {
                return Expr::Mul(Box::new(Expr::Const(c * inner)), lhs.clone());
            }
        }
        Expr::Mul(Box::new(Expr::Const(c)), Box::new(expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::var("x")
    }

    #[test]
    fn test_identities() {
        assert_eq!((x() + Expr::Const(0.0)).simplify(), x());
        assert_eq!((Expr::Const(0.0) + x()).simplify(), x());
        assert_eq!((x() * Expr::Const(1.0)).simplify(), x());
        assert_eq!((Expr::Const(0.0) * x()).simplify(), Expr::Const(0.0));
        assert_eq!((x() - x()).simplify(), Expr::Const(0.0));
        assert_eq!((x() / x()).simplify(), Expr::Const(1.0));
        assert_eq!(x().pow(Expr::Const(1.0)).simplify(), x());
        assert_eq!(x().pow(Expr::Const(0.0)).simplify(), Expr::Const(1.0));
    }

    #[test]
    fn test_constant_folding() {
        let expr = (Expr::Const(2.0) - Expr::Const(1.0)) * x().pow(Expr::Const(3.0) - Expr::Const(2.0));
        assert_eq!(expr.simplify(), x());
        assert_eq!(
            Expr::Const(2.0).pow(Expr::Const(10.0)).simplify(),
            Expr::Const(1024.0)
        );
        // negative base with fractional exponent stays symbolic
        let root = Expr::Const(-8.0).pow(Expr::Const(0.5));
        assert_eq!(root.simplify(), root);
        // division by a zero constant is left alone
        let div = Expr::Const(1.0) / Expr::Const(0.0);
        assert_eq!(div.simplify(), div);
    }

    #[test]
    fn test_coefficient_merging() {
        let expr = Expr::Const(3.0) * (Expr::Const(2.0) * x());
        assert_eq!(expr.simplify(), Expr::Const(6.0) * x());
        let expr = (x() * Expr::Const(2.0)) * Expr::Const(3.0);
        assert_eq!(expr.simplify(), Expr::Const(6.0) * x());
    }

    #[test]
    fn test_zero_minus() {
        assert_eq!((Expr::Const(0.0) - x()).simplify(), Expr::Const(-1.0) * x());
    }

    #[test]
    fn test_function_arguments_are_simplified() {
        let expr = (x() + Expr::Const(0.0)).ln();
        assert_eq!(expr.simplify(), x().ln());
    }
}
