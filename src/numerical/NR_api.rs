//! Root finding from a text formula.
//!
//! [`RootFindingTask`] runs the whole chain: text → expression tree → derivative tree →
//! two compiled functions → Newton iteration. Problems before the iteration (bad formula,
//! missing derivative rule, invalid settings) are [`RootFinderError`]s; everything that
//! happens during the iteration is an [`Outcome`].
//!
//! Example
//! ```
//! use RustedNewton::numerical::NR_api::RootFindingTask;
//! use RustedNewton::numerical::NR::NoReplacement;
//! use RustedNewton::numerical::NR_config::LogLevel;
//! let mut task = RootFindingTask::new("x^3 - 8", "x");
//! task.set_loglevel(LogLevel::Off, false);
//! let outcome = task.solve(3.0, &mut NoReplacement).unwrap();
//! assert!((outcome.root().unwrap().re() - 2.0).abs() < 1e-6);
//! ```
use crate::Utils::logger::init_logger;
use crate::error::RootFinderError;
use crate::numerical::NR::{GuessProvider, NewtonSolver, Outcome, SolverStatistics};
use crate::numerical::NR_config::{LogLevel, NewtonSettings, SolverConfig};
use crate::symbolic::parse_expr::{ExprParser, LogNames};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_functions::FunctionRegistry;
use crate::symbolic::symbolic_lambdify::NumericFunction;
use log::{error, info, warn};

/// f and f' in symbolic and in compiled form.
#[derive(Debug)]
pub struct PreparedFunctions {
    pub f: Expr,
    pub f_prime: Expr,
    pub f_fn: NumericFunction,
    pub f_prime_fn: NumericFunction,
}

pub struct RootFindingTask {
    formula: String,
    variable: String,
    log_names: LogNames,
    registry: FunctionRegistry,
    config: SolverConfig,
    loglevel: LogLevel,
    log_to_file: bool,
    prepared: Option<PreparedFunctions>,
    statistics: Option<SolverStatistics>,
}

impl RootFindingTask {
    /// Task with the default log names (`ln`, `log`), registry and configuration.
    pub fn new(formula: &str, variable: &str) -> RootFindingTask {
        RootFindingTask {
            formula: formula.to_string(),
            variable: variable.to_string(),
            log_names: LogNames::default(),
            registry: FunctionRegistry::default(),
            config: SolverConfig::default(),
            loglevel: LogLevel::Info,
            log_to_file: false,
            prepared: None,
            statistics: None,
        }
    }
    ////////////////////////////SETTERS///////////////////////////////////////////////////////////
    pub fn set_log_names(&mut self, log_names: LogNames) {
        self.log_names = log_names;
        self.prepared = None;
    }

    pub fn set_registry(&mut self, registry: FunctionRegistry) {
        self.registry = registry;
        self.prepared = None;
    }

    pub fn set_config(&mut self, config: SolverConfig) {
        self.config = config;
    }

    pub fn set_loglevel(&mut self, loglevel: LogLevel, log_to_file: bool) {
        self.loglevel = loglevel;
        self.log_to_file = log_to_file;
    }

    pub fn apply_settings(&mut self, settings: &NewtonSettings) {
        self.config = settings.solver;
        self.loglevel = settings.loglevel;
    }
    ////////////////////////////GETTERS///////////////////////////////////////////////////////////
    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Parsed f, available after [`prepare`](Self::prepare) or a solve.
    pub fn function(&self) -> Option<&Expr> {
        self.prepared.as_ref().map(|p| &p.f)
    }

    /// Simplified f', available after [`prepare`](Self::prepare) or a solve.
    pub fn derivative(&self) -> Option<&Expr> {
        self.prepared.as_ref().map(|p| &p.f_prime)
    }

    /// Statistics of the last solve.
    pub fn statistics(&self) -> Option<&SolverStatistics> {
        self.statistics.as_ref()
    }

    fn build(&self) -> Result<PreparedFunctions, RootFinderError> {
        let parser = ExprParser::with_registry(self.log_names.clone(), self.registry.clone())?;
        let f = parser.parse(&self.formula, &self.variable)?;
        let f_prime = f.diff_simplified(&self.variable, &self.registry)?;
        info!("f({}) = {}", self.variable, f);
        info!("f'({}) = {}", self.variable, f_prime);
        let f_fn = f.lambdify(&self.variable, &self.registry)?;
        let f_prime_fn = f_prime.lambdify(&self.variable, &self.registry)?;
        Ok(PreparedFunctions {
            f,
            f_prime,
            f_fn,
            f_prime_fn,
        })
    }

    /// Parses, differentiates and compiles. Called by `solve` when needed.
    pub fn prepare(&mut self) -> Result<&PreparedFunctions, RootFinderError> {
        let prepared = self.build()?;
        Ok(&*self.prepared.insert(prepared))
    }

    /// Finds a root starting from `initial_guess`; `provider` supplies new guesses whenever
    /// the derivative degenerates.
    pub fn solve<P>(
        &mut self,
        initial_guess: f64,
        provider: &mut P,
    ) -> Result<Outcome, RootFinderError>
    where
        P: GuessProvider + ?Sized,
    {
        if !self.loglevel.is_off() {
            init_logger(self.loglevel, self.log_to_file);
        }
        let prepared = match self.prepared.take() {
            Some(prepared) => prepared,
            None => self.build().inspect_err(|e| error!("{}", e))?,
        };

        let mut solver = NewtonSolver::new(self.config);
        solver.set_loglevel(self.loglevel, self.log_to_file);
        let outcome = solver.solver(&prepared.f_fn, &prepared.f_prime_fn, initial_guess, provider);
        match &outcome {
            Outcome::Converged { root, iterations } => {
                info!("root {} = {} found in {} iterations", self.variable, root, iterations)
            }
            Outcome::MaxIterationsReached {
                approx_root,
                iterations,
            } => warn!(
                "no convergence after {} iterations, last approximation {} = {}",
                iterations, self.variable, approx_root
            ),
            Outcome::Aborted => error!("root finding aborted"),
        }

        self.statistics = Some(solver.statistics().clone());
        self.prepared = Some(prepared);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DifferentiationError, ParseError};
    use crate::numerical::NR::{DegenerateEvent, FixedGuesses, NoReplacement};
    use crate::symbolic::symbolic_functions::DerivativeRule;
    use approx::assert_relative_eq;
    use num_complex::Complex64;
    use std::f64::consts::{LN_2, PI};
    use std::sync::Arc;

    fn quiet_task(formula: &str) -> RootFindingTask {
        let mut task = RootFindingTask::new(formula, "x");
        task.set_loglevel(LogLevel::Off, false);
        task
    }

    #[test]
    fn test_sqrt_two_from_text() {
        let mut task = quiet_task("x^2 - 2");
        let outcome = task.solve(1.0, &mut NoReplacement).unwrap();
        assert!(outcome.is_converged());
        assert_relative_eq!(outcome.root().unwrap().re(), 2.0_f64.sqrt(), epsilon = 1e-9);
        assert!(outcome.iterations().unwrap() <= 10);
        assert_eq!(task.derivative(), Some(&(Expr::Const(2.0) * Expr::var("x"))));
        assert_eq!(task.statistics().unwrap().attempts, 1);
    }

    #[test]
    fn test_implicit_multiplication_from_text() {
        let mut task = quiet_task("2x^2 - 8");
        let outcome = task.solve(3.0, &mut NoReplacement).unwrap();
        assert_relative_eq!(outcome.root().unwrap().re(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_deterministic_from_text() {
        let first = quiet_task("x^3 - 2x - 5").solve(2.0, &mut NoReplacement).unwrap();
        let second = quiet_task("x^3 - 2x - 5").solve(2.0, &mut NoReplacement).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_degenerate_recovery_from_text() {
        let mut task = quiet_task("x^3");
        let mut provider = FixedGuesses::new([1.0]);
        let outcome = task.solve(0.0, &mut provider).unwrap();
        assert!(outcome.is_converged());
        assert!(outcome.root().unwrap().re().abs() < 1e-5);
        assert_eq!(task.statistics().unwrap().degenerate_events, 1);
    }

    #[test]
    fn test_aborted_from_text() {
        let mut task = quiet_task("x^2 - 4");
        assert_eq!(task.solve(0.0, &mut NoReplacement).unwrap(), Outcome::Aborted);
        let mut give_up = |_: &DegenerateEvent| -> Option<f64> { None };
        assert_eq!(task.solve(0.0, &mut give_up).unwrap(), Outcome::Aborted);
    }

    #[test]
    fn test_max_iterations_from_text() {
        // no real root, the real iteration wanders
        let mut task = quiet_task("2x^2 + 3");
        task.set_config(SolverConfig::new(1e-6, 20, 1e-12).unwrap());
        match task.solve(1.0, &mut NoReplacement).unwrap() {
            Outcome::MaxIterationsReached {
                approx_root,
                iterations,
            } => {
                assert_eq!(iterations, 20);
                assert!(approx_root.is_real());
            }
            other => panic!("expected the cap, got {:?}", other),
        }
    }

    #[test]
    fn test_log_conventions() {
        let mut base10 = quiet_task("log(x) - 2");
        let outcome = base10.solve(50.0, &mut NoReplacement).unwrap();
        assert_relative_eq!(outcome.root().unwrap().re(), 100.0, epsilon = 1e-6);

        let mut natural = quiet_task("log(x) - 2");
        natural.set_log_names(LogNames::sympy_like());
        let outcome = natural.solve(5.0, &mut NoReplacement).unwrap();
        assert_relative_eq!(outcome.root().unwrap().re(), 2.0_f64.exp(), epsilon = 1e-6);

        let mut ln = quiet_task("ln(x)");
        let outcome = ln.solve(0.5, &mut NoReplacement).unwrap();
        let root = outcome.root().unwrap();
        assert!(root.is_real());
        assert_relative_eq!(root.re(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ln_of_negative_leaves_real_axis() {
        let mut task = quiet_task("ln(x)");
        task.set_config(SolverConfig::new(1e-6, 1, 1e-12).unwrap());
        let outcome = task.solve(-1.0, &mut NoReplacement).unwrap();
        match outcome {
            Outcome::MaxIterationsReached { approx_root, .. } => {
                assert!(!approx_root.is_real());
                let z = approx_root.as_complex();
                assert_relative_eq!(z.re, -1.0, epsilon = 1e-12);
                assert_relative_eq!(z.im, PI, epsilon = 1e-12);
            }
            other => panic!("expected the cap, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_registry() {
        // redefine ln as the binary logarithm, numeric and derivative rules together
        let mut registry = FunctionRegistry::default();
        registry.override_numeric("ln", |args: &[Complex64]| args[0].ln() / LN_2);
        let rule: DerivativeRule = Arc::new(|args: &[Expr], d_args: &[Expr]| {
            d_args[0].clone() / (args[0].clone() * Expr::Const(LN_2))
        });
        registry.override_derivative("ln", Some(rule));
        let mut task = quiet_task("ln(x) - 3");
        task.set_registry(registry);
        let outcome = task.solve(6.0, &mut NoReplacement).unwrap();
        assert_relative_eq!(outcome.root().unwrap().re(), 8.0, epsilon = 1e-6);
    }

    #[test]
    fn test_errors_before_iteration() {
        let mut task = quiet_task("2x^");
        assert!(matches!(
            task.solve(1.0, &mut NoReplacement),
            Err(RootFinderError::Parse(_))
        ));
        let mut task = quiet_task("x + y");
        assert!(matches!(
            task.solve(1.0, &mut NoReplacement),
            Err(RootFinderError::Parse(ParseError::UnboundSymbol { .. }))
        ));
        let mut task = quiet_task("sign(x) - 1");
        assert_eq!(
            task.solve(1.0, &mut NoReplacement),
            Err(RootFinderError::Differentiation(
                DifferentiationError::NoDerivativeRule("sign".to_string())
            ))
        );
        assert!(task.function().is_none());
    }

    #[test]
    fn test_prepare_and_settings() {
        let mut task = quiet_task("exp(x) - 2");
        let prepared = task.prepare().unwrap();
        assert_relative_eq!(prepared.f_fn.eval(0.0).re, -1.0);
        assert_relative_eq!(prepared.f_prime_fn.eval(0.0).re, 1.0);
        assert!(task.function().is_some());

        let settings = NewtonSettings::from_toml_str(
            "loglevel = \"off\"\n[solver]\ntolerance = 1e-10\nmax_iterations = 40",
        )
        .unwrap();
        task.apply_settings(&settings);
        assert_eq!(task.config().max_iterations(), 40);
        let outcome = task.solve(1.0, &mut NoReplacement).unwrap();
        assert_relative_eq!(outcome.root().unwrap().re(), LN_2, epsilon = 1e-10);
        assert_eq!(task.formula(), "exp(x) - 2");
    }
}
