#![allow(non_snake_case)]
use RustedNewton::numerical::NR::{DegenerateEvent, GuessProvider, Outcome};
use RustedNewton::numerical::NR_api::RootFindingTask;
use RustedNewton::numerical::NR_config::{LogLevel, NewtonSettings, SolverConfig};
use std::io::{self, Write};
use std::str::FromStr;

/// Reads one trimmed line after printing `message`; `None` on a closed or broken stdin.
fn prompt(message: &str) -> Option<String> {
    print!("{}", message);
    io::stdout().flush().ok()?;
    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

/// Empty or unparsable answers fall back to `default`.
fn read_or<T: FromStr>(message: &str, default: T) -> T {
    prompt(message)
        .and_then(|answer| answer.parse::<T>().ok())
        .unwrap_or(default)
}

/// Asks the user for a new initial guess whenever the derivative vanishes.
struct StdinGuesses;

impl GuessProvider for StdinGuesses {
    fn replacement_guess(&mut self, event: &DegenerateEvent) -> Option<f64> {
        println!(
            "The derivative is too close to zero at x = {} (f' = {}).",
            event.point, event.derivative
        );
        let answer = prompt("Enter a new initial guess (empty to abort): ")?;
        match answer.parse::<f64>() {
            Ok(guess) if guess.is_finite() => Some(guess),
            _ => {
                println!("Invalid initial guess.");
                None
            }
        }
    }
}

fn main() {
    // optional first argument: TOML settings whose values become the defaults below
    let settings = match std::env::args().nth(1) {
        Some(path) => match NewtonSettings::from_toml_file(&path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        None => NewtonSettings {
            solver: SolverConfig::default(),
            loglevel: LogLevel::Warn,
        },
    };

    let Some(formula) = prompt("Enter the function f(x): ").filter(|f| !f.is_empty()) else {
        println!("No function given.");
        return;
    };
    let mut task = RootFindingTask::new(&formula, "x");
    task.apply_settings(&settings);
    match task.prepare() {
        Ok(prepared) => {
            println!("f(x) = {}", prepared.f);
            println!("f'(x) = {}", prepared.f_prime);
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }

    let initial_guess = match prompt("Enter the initial guess: ").map(|s| s.parse::<f64>()) {
        Some(Ok(guess)) if guess.is_finite() => guess,
        _ => {
            println!("Invalid initial guess.");
            return;
        }
    };

    let defaults = settings.solver;
    let tolerance = read_or(
        &format!("Enter the tolerance (default {:e}): ", defaults.tolerance()),
        defaults.tolerance(),
    );
    let max_iterations = read_or(
        &format!(
            "Enter the maximum number of iterations (default {}): ",
            defaults.max_iterations()
        ),
        defaults.max_iterations(),
    );
    let threshold = read_or(
        &format!(
            "Enter the derivative threshold (default {:e}): ",
            defaults.derivative_threshold()
        ),
        defaults.derivative_threshold(),
    );
    // non-positive answers are invalid and keep the default
    let config = defaults.with_tolerance(tolerance).unwrap_or(defaults);
    let config = config.with_max_iterations(max_iterations).unwrap_or(config);
    let config = config.with_derivative_threshold(threshold).unwrap_or(config);
    task.set_config(config);

    match task.solve(initial_guess, &mut StdinGuesses) {
        Ok(Outcome::Converged { root, iterations }) => {
            println!("Approximated root: {}", root);
            println!("Iterations: {}", iterations);
        }
        Ok(Outcome::MaxIterationsReached {
            approx_root,
            iterations,
        }) => {
            println!(
                "Warning: maximum number of iterations ({}) reached without convergence.",
                iterations
            );
            println!("Last approximation: {}", approx_root);
        }
        Ok(Outcome::Aborted) => println!("Root finding aborted."),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
