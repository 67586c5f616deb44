//! Newton-Raphson iteration for one complex valued function of one variable.
//!
//! The iteration runs on `Complex64`: a real formula such as `ln(x)` may leave the real axis
//! and the iterate follows it. When the derivative becomes degenerate (`|f'| < threshold`) the
//! solver asks a [`GuessProvider`] for a new starting point and begins a new attempt with its
//! own iteration count; there is no limit on the number of attempts. Roots whose imaginary
//! part is below [`IMAGINARY_EPSILON`] are reported as real.
//!
//! Example
//! ```
//! use RustedNewton::numerical::NR::{newton_raphson, NoReplacement, Outcome};
//! use RustedNewton::numerical::NR_config::SolverConfig;
//! use num_complex::Complex64;
//! let f = |x: Complex64| x * x - 2.0;
//! let f_prime = |x: Complex64| x * 2.0;
//! let outcome = newton_raphson(&f, &f_prime, 1.0, &SolverConfig::default(), &mut NoReplacement);
//! match outcome {
//!     Outcome::Converged { root, iterations } => {
//!         assert!((root.re() - 2.0_f64.sqrt()).abs() < 1e-9);
//!         assert!(iterations <= 10);
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```
use crate::Utils::logger::init_logger;
use crate::numerical::NR_config::{LogLevel, SolverConfig};
use crate::symbolic::symbolic_lambdify::NumericFn;
use log::{error, info, warn};
use num_complex::Complex64;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::{Duration, Instant};
use tabled::{builder::Builder, settings::Style};

/// Imaginary parts smaller than this are treated as rounding noise.
pub const IMAGINARY_EPSILON: f64 = 1e-10;

/// A root as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Root {
    Real(f64),
    Complex(Complex64),
}

impl Root {
    /// Drops a negligible imaginary part.
    pub fn from_complex(z: Complex64) -> Root {
        if z.im.abs() < IMAGINARY_EPSILON {
            Root::Real(z.re)
        } else {
            Root::Complex(z)
        }
    }

    pub fn re(&self) -> f64 {
        match self {
            Root::Real(x) => *x,
            Root::Complex(z) => z.re,
        }
    }

    pub fn is_real(&self) -> bool {
        matches!(self, Root::Real(_))
    }

    pub fn as_complex(&self) -> Complex64 {
        match self {
            Root::Real(x) => Complex64::new(*x, 0.0),
            Root::Complex(z) => *z,
        }
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Root::Real(x) => write!(f, "{}", x),
            Root::Complex(z) => write!(f, "{}", z),
        }
    }
}

/// Terminal state of a Newton run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// `iterations` counts the steps of the final attempt, starting at 1.
    Converged { root: Root, iterations: usize },
    /// The iteration cap of the final attempt was hit; `approx_root` is the last iterate.
    MaxIterationsReached { approx_root: Root, iterations: usize },
    /// Degenerate derivative and no usable replacement guess.
    Aborted,
}

impl Outcome {
    pub fn root(&self) -> Option<Root> {
        match self {
            Outcome::Converged { root, .. } => Some(*root),
            Outcome::MaxIterationsReached { approx_root, .. } => Some(*approx_root),
            Outcome::Aborted => None,
        }
    }

    pub fn iterations(&self) -> Option<usize> {
        match self {
            Outcome::Converged { iterations, .. }
            | Outcome::MaxIterationsReached { iterations, .. } => Some(*iterations),
            Outcome::Aborted => None,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, Outcome::Converged { .. })
    }
}

/// What the solver knows when it runs into a degenerate derivative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegenerateEvent {
    /// 1 for the initial guess, incremented with every replacement guess.
    pub attempt: usize,
    pub point: Complex64,
    pub derivative: Complex64,
}

/// Source of replacement guesses after a degenerate derivative. `None` ends the run.
pub trait GuessProvider {
    fn replacement_guess(&mut self, event: &DegenerateEvent) -> Option<f64>;
}

/// Never offers a replacement: the first degenerate derivative aborts the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReplacement;

impl GuessProvider for NoReplacement {
    fn replacement_guess(&mut self, _event: &DegenerateEvent) -> Option<f64> {
        None
    }
}

/// Hands out a fixed list of guesses in order, then gives up.
#[derive(Debug, Clone, Default)]
pub struct FixedGuesses {
    guesses: VecDeque<f64>,
}

impl FixedGuesses {
    pub fn new<I: IntoIterator<Item = f64>>(guesses: I) -> FixedGuesses {
        FixedGuesses {
            guesses: guesses.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.guesses.len()
    }
}

impl GuessProvider for FixedGuesses {
    fn replacement_guess(&mut self, _event: &DegenerateEvent) -> Option<f64> {
        self.guesses.pop_front()
    }
}

impl<F> GuessProvider for F
where
    F: FnMut(&DegenerateEvent) -> Option<f64>,
{
    fn replacement_guess(&mut self, event: &DegenerateEvent) -> Option<f64> {
        self(event)
    }
}

/// Counters collected over one solve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverStatistics {
    pub attempts: usize,
    pub total_iterations: usize,
    pub function_evaluations: usize,
    pub degenerate_events: usize,
    pub elapsed: Duration,
}

/// Newton step `f/f'`, computed in real arithmetic when both values are real.
fn newton_step(f_val: Complex64, fp_val: Complex64) -> Complex64 {
    if f_val.im == 0.0 && fp_val.im == 0.0 {
        Complex64::new(f_val.re / fp_val.re, 0.0)
    } else {
        f_val / fp_val
    }
}

/// Runs Newton-Raphson without logger setup or statistics output.
pub fn newton_raphson<F, D, P>(
    f: &F,
    f_prime: &D,
    initial_guess: f64,
    config: &SolverConfig,
    provider: &mut P,
) -> Outcome
where
    F: NumericFn + ?Sized,
    D: NumericFn + ?Sized,
    P: GuessProvider + ?Sized,
{
    NewtonSolver::new(*config).main_loop(f, f_prime, initial_guess, provider)
}

/// Stateful solver: keeps the configuration, the result of the last run and its statistics.
pub struct NewtonSolver {
    pub config: SolverConfig,
    pub loglevel: LogLevel,
    pub log_to_file: bool,
    pub i: usize, // iteration counter of the current attempt
    result: Option<Outcome>,
    statistics: SolverStatistics,
}

impl NewtonSolver {
    pub fn new(config: SolverConfig) -> NewtonSolver {
        NewtonSolver {
            config,
            loglevel: LogLevel::Info,
            log_to_file: false,
            i: 0,
            result: None,
            statistics: SolverStatistics::default(),
        }
    }
    ////////////////////////////SETTERS///////////////////////////////////////////////////////////
    pub fn set_config(&mut self, config: SolverConfig) {
        self.config = config;
    }

    pub fn set_loglevel(&mut self, loglevel: LogLevel, log_to_file: bool) {
        self.loglevel = loglevel;
        self.log_to_file = log_to_file;
    }

    /// The iteration itself. Resets the statistics of a previous run.
    pub fn main_loop<F, D, P>(
        &mut self,
        f: &F,
        f_prime: &D,
        initial_guess: f64,
        provider: &mut P,
    ) -> Outcome
    where
        F: NumericFn + ?Sized,
        D: NumericFn + ?Sized,
        P: GuessProvider + ?Sized,
    {
        let tolerance = self.config.tolerance();
        let max_iterations = self.config.max_iterations();
        let threshold = self.config.derivative_threshold();

        self.statistics = SolverStatistics {
            attempts: 1,
            ..SolverStatistics::default()
        };
        self.i = 0;
        let mut guess = Complex64::new(initial_guess, 0.0);
        let mut last_step = f64::INFINITY;

        let outcome = loop {
            if self.i >= max_iterations {
                warn!(
                    "Maximum number of iterations ({}) reached, last iterate x = {}",
                    max_iterations, guess
                );
                break Outcome::MaxIterationsReached {
                    approx_root: Root::from_complex(guess),
                    iterations: self.i,
                };
            }

            let f_val = f.evaluate(guess);
            let fp_val = f_prime.evaluate(guess);
            self.statistics.function_evaluations += 2;

            if fp_val.norm() < threshold {
                self.statistics.degenerate_events += 1;
                warn!(
                    "Derivative is too small at x = {} (f' = {}), a new initial guess is needed",
                    guess, fp_val
                );
                let event = DegenerateEvent {
                    attempt: self.statistics.attempts,
                    point: guess,
                    derivative: fp_val,
                };
                match provider.replacement_guess(&event) {
                    Some(new_guess) if new_guess.is_finite() => {
                        info!("restarting from x = {}", new_guess);
                        guess = Complex64::new(new_guess, 0.0);
                        self.i = 0;
                        last_step = f64::INFINITY;
                        self.statistics.attempts += 1;
                        continue;
                    }
                    Some(new_guess) => {
                        error!("replacement guess {} is not finite, aborting", new_guess);
                        break Outcome::Aborted;
                    }
                    None => {
                        error!("no replacement guess, aborting");
                        break Outcome::Aborted;
                    }
                }
            }

            let x_new = guess - newton_step(f_val, fp_val);
            self.i += 1;
            self.statistics.total_iterations += 1;
            let step = (x_new - guess).norm();
            if !(x_new.re.is_finite() && x_new.im.is_finite()) {
                warn!("iterate is not finite: x = {}", x_new);
            } else if step > last_step && self.i > 1 {
                warn!("Step is increasing: {:e} > {:e}", step, last_step);
            }
            info!("iteration = {}, x = {}, step = {:e}", self.i, x_new, step);

            if step < tolerance {
                break Outcome::Converged {
                    root: Root::from_complex(x_new),
                    iterations: self.i,
                };
            }
            guess = x_new;
            last_step = step;
        };
        self.result = Some(outcome);
        outcome
    }
    ////////////////////////////////////////////////////////////////////////////////////////////////
    //                     main functions to start the solver and calculate statistics
    ////////////////////////////////////////////////////////////////////////////////////////////////

    pub fn solver<F, D, P>(
        &mut self,
        f: &F,
        f_prime: &D,
        initial_guess: f64,
        provider: &mut P,
    ) -> Outcome
    where
        F: NumericFn + ?Sized,
        D: NumericFn + ?Sized,
        P: GuessProvider + ?Sized,
    {
        info!("solver started: {}, initial guess x0 = {}", self.config, initial_guess);
        let begin = Instant::now();
        let outcome = self.main_loop(f, f_prime, initial_guess, provider);
        self.statistics.elapsed = begin.elapsed();
        self.calc_statistics();
        outcome
    }

    /// Wrapper around [`NewtonSolver::solver`] that installs the logger first.
    pub fn solve<F, D, P>(
        &mut self,
        f: &F,
        f_prime: &D,
        initial_guess: f64,
        provider: &mut P,
    ) -> Outcome
    where
        F: NumericFn + ?Sized,
        D: NumericFn + ?Sized,
        P: GuessProvider + ?Sized,
    {
        if self.loglevel.is_off() {
            return self.main_loop(f, f_prime, initial_guess, provider);
        }
        init_logger(self.loglevel, self.log_to_file);
        let outcome = self.solver(f, f_prime, initial_guess, provider);
        info!("Program ended");
        outcome
    }

    pub fn get_result(&self) -> Option<Outcome> {
        self.result
    }

    pub fn statistics(&self) -> &SolverStatistics {
        &self.statistics
    }

    /// Statistics rendered as a table, `None` when logging is off.
    fn statistics_table(&self) -> Option<String> {
        if self.loglevel.is_off() {
            return None;
        }
        let mut stats: HashMap<String, usize> = HashMap::new();
        stats.insert("attempts".to_string(), self.statistics.attempts);
        stats.insert(
            "number of iterations".to_string(),
            self.statistics.total_iterations,
        );
        stats.insert(
            "function evaluations".to_string(),
            self.statistics.function_evaluations,
        );
        stats.insert(
            "degenerate derivatives".to_string(),
            self.statistics.degenerate_events,
        );
        stats.insert(
            "time elapsed, us".to_string(),
            self.statistics.elapsed.as_micros() as usize,
        );
        let mut table = Builder::from(stats).build();
        table.with(Style::modern_rounded());
        Some(table.to_string())
    }

    fn calc_statistics(&self) {
        if let Some(table) = self.statistics_table() {
            info!("\n \n CALC STATISTICS \n \n {}", table);
        }
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////
//                                     TESTS
///////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_minus_two(x: Complex64) -> Complex64 {
        x * x - 2.0
    }

    fn two_x(x: Complex64) -> Complex64 {
        x * 2.0
    }

    fn cube(x: Complex64) -> Complex64 {
        x * x * x
    }

    fn three_x_squared(x: Complex64) -> Complex64 {
        x * x * 3.0
    }

    #[test]
    fn test_sqrt_two() {
        let outcome = newton_raphson(
            &square_minus_two,
            &two_x,
            1.0,
            &SolverConfig::default(),
            &mut NoReplacement,
        );
        match outcome {
            Outcome::Converged { root, iterations } => {
                assert!(root.is_real());
                assert_relative_eq!(root.re(), 1.41421356, epsilon = 1e-8);
                assert!(iterations <= 10);
            }
            other => panic!("expected convergence, got {:?}", other),
        }
    }

    #[test]
    fn test_deterministic() {
        let config = SolverConfig::default();
        let first = newton_raphson(&square_minus_two, &two_x, 3.7, &config, &mut NoReplacement);
        let second = newton_raphson(&square_minus_two, &two_x, 3.7, &config, &mut NoReplacement);
        assert_eq!(first, second);
    }

    #[test]
    fn test_degenerate_derivative_recovery() {
        let mut events = Vec::new();
        let mut provider = |event: &DegenerateEvent| {
            events.push(*event);
            Some(1.0)
        };
        let outcome = newton_raphson(
            &cube,
            &three_x_squared,
            0.0,
            &SolverConfig::default(),
            &mut provider,
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].attempt, 1);
        assert_eq!(events[0].point, Complex64::new(0.0, 0.0));
        match outcome {
            Outcome::Converged { root, iterations } => {
                assert!(root.re().abs() < 1e-5);
                assert!(iterations <= 100);
            }
            other => panic!("expected convergence, got {:?}", other),
        }
    }

    #[test]
    fn test_no_replacement_aborts() {
        let outcome = newton_raphson(
            &cube,
            &three_x_squared,
            0.0,
            &SolverConfig::default(),
            &mut NoReplacement,
        );
        assert_eq!(outcome, Outcome::Aborted);
        assert_eq!(outcome.root(), None);
    }

    #[test]
    fn test_non_finite_replacement_aborts() {
        let mut provider = FixedGuesses::new([f64::NAN, 1.0]);
        let outcome = newton_raphson(
            &cube,
            &three_x_squared,
            0.0,
            &SolverConfig::default(),
            &mut provider,
        );
        assert_eq!(outcome, Outcome::Aborted);
        assert_eq!(provider.remaining(), 1);
    }

    #[test]
    fn test_fixed_guesses_restart_repeatedly() {
        // the first two replacements are degenerate as well
        let mut provider = FixedGuesses::new([0.0, 0.0, 2.0]);
        let mut solver = NewtonSolver::new(SolverConfig::default());
        let outcome = solver.main_loop(&cube, &three_x_squared, 0.0, &mut provider);
        assert!(outcome.is_converged());
        assert_eq!(solver.statistics().degenerate_events, 3);
        assert_eq!(solver.statistics().attempts, 4);
        assert_eq!(provider.remaining(), 0);
    }

    #[test]
    fn test_iteration_cap_is_per_attempt() {
        // f'(0) = 0, so the first attempt ends immediately and the second one hits the cap
        let config = SolverConfig::new(1e-6, 3, 1e-12).unwrap();
        let mut provider = FixedGuesses::new([1.0]);
        let outcome = newton_raphson(&square_minus_two, &two_x, 0.0, &config, &mut provider);
        match outcome {
            Outcome::MaxIterationsReached { iterations, .. } => assert_eq!(iterations, 3),
            other => panic!("expected the cap, got {:?}", other),
        }
    }

    #[test]
    fn test_max_iterations_reached() {
        let config = SolverConfig::new(1e-6, 1, 1e-12).unwrap();
        let outcome = newton_raphson(&square_minus_two, &two_x, 1000.0, &config, &mut NoReplacement);
        match outcome {
            Outcome::MaxIterationsReached {
                approx_root,
                iterations,
            } => {
                assert_eq!(iterations, 1);
                assert_relative_eq!(approx_root.re(), 500.001, epsilon = 1e-9);
            }
            other => panic!("expected the cap, got {:?}", other),
        }
    }

    #[test]
    fn test_negligible_imaginary_part_is_dropped() {
        let root = Root::from_complex(Complex64::new(0.9999999999, 1e-12));
        assert!(root.is_real());
        assert_relative_eq!(root.re(), 1.0, epsilon = 1e-9);
        let root = Root::from_complex(Complex64::new(1.0, 1e-3));
        assert_eq!(root, Root::Complex(Complex64::new(1.0, 1e-3)));
        assert_eq!(root.as_complex(), Complex64::new(1.0, 1e-3));
    }

    #[test]
    fn test_complex_root() {
        // x^2 + 1 has no real root; starting off the real axis finds i
        let f = |x: Complex64| x * x + 1.0;
        let f_prime = |x: Complex64| x * 2.0;
        let mut solver = NewtonSolver::new(SolverConfig::default());
        let outcome = solver.main_loop(&f, &f_prime, 0.0, &mut NoReplacement);
        // f'(0) = 0
        assert_eq!(outcome, Outcome::Aborted);
        let g = |x: Complex64| x * x + 1.0;
        let shifted = |x: Complex64| g(x + Complex64::new(0.0, 0.5));
        let shifted_prime = |x: Complex64| (x + Complex64::new(0.0, 0.5)) * 2.0;
        let outcome = solver.main_loop(&shifted, &shifted_prime, 1.0, &mut NoReplacement);
        let root = outcome.root().unwrap();
        assert!(!root.is_real());
        assert_relative_eq!(shifted(root.as_complex()).norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_solver_statistics_and_result() {
        let mut solver = NewtonSolver::new(SolverConfig::default());
        solver.set_loglevel(LogLevel::Off, false);
        let outcome = solver.solve(&square_minus_two, &two_x, 1.0, &mut NoReplacement);
        assert_eq!(solver.get_result(), Some(outcome));
        let stats = solver.statistics();
        assert_eq!(stats.attempts, 1);
        assert_eq!(stats.total_iterations, outcome.iterations().unwrap());
        assert_eq!(stats.function_evaluations, 2 * stats.total_iterations);
        assert_eq!(stats.degenerate_events, 0);
    }

    #[test]
    fn test_statistics_table_skipped_when_logging_is_off() {
        let mut solver = NewtonSolver::new(SolverConfig::default());
        solver.set_loglevel(LogLevel::Off, false);
        let outcome = solver.solver(&square_minus_two, &two_x, 1.0, &mut NoReplacement);
        assert!(outcome.is_converged());
        assert_eq!(solver.statistics().attempts, 1);
        assert!(solver.statistics_table().is_none());

        solver.set_loglevel(LogLevel::Info, false);
        let table = solver.statistics_table().unwrap();
        assert!(table.contains("attempts"));
        assert!(table.contains("number of iterations"));
    }

    #[test]
    fn test_solver_with_logging() {
        let mut solver = NewtonSolver::new(SolverConfig::default());
        solver.set_loglevel(LogLevel::Warn, false);
        let outcome = solver.solve(&square_minus_two, &two_x, 1.0, &mut NoReplacement);
        assert!(outcome.is_converged());
    }
}
