//! Solver configuration.
//!
//! [`SolverConfig`] holds the three numbers that steer a Newton run. It can only be built
//! through validating constructors, so a value of this type is always usable. Settings may also
//! be read from a TOML document:
//!
//! ```toml
//! loglevel = "warn"
//!
//! [solver]
//! tolerance = 1e-8
//! max_iterations = 50
//! derivative_threshold = 1e-14
//! ```
//!
//! Every key is optional; missing keys take the defaults.
use crate::error::ConfigError;
use log::LevelFilter;
use std::fmt;
use std::path::Path;
use strum_macros::{Display, EnumString};

pub const DEFAULT_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_MAX_ITERATIONS: usize = 100;
pub const DEFAULT_DERIVATIVE_THRESHOLD: f64 = 1e-12;

/// Verbosity of the solver log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum LogLevel {
    #[strum(to_string = "off", serialize = "none")]
    Off,
    #[strum(to_string = "error")]
    Error,
    #[strum(to_string = "warn")]
    Warn,
    #[default]
    #[strum(to_string = "info")]
    Info,
    #[strum(to_string = "debug")]
    Debug,
}

impl LogLevel {
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
        }
    }

    pub fn is_off(&self) -> bool {
        *self == LogLevel::Off
    }
}

/// Tolerance, iteration cap per attempt and degeneracy threshold of a Newton run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    tolerance: f64,
    max_iterations: usize,
    derivative_threshold: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            derivative_threshold: DEFAULT_DERIVATIVE_THRESHOLD,
        }
    }
}

impl fmt::Display for SolverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tolerance = {:e}, max_iterations = {}, derivative_threshold = {:e}",
            self.tolerance, self.max_iterations, self.derivative_threshold
        )
    }
}

fn check_positive(name: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidConfiguration(format!(
            "{} must be a positive finite number, got {}",
            name, value
        )))
    }
}

fn check_iterations(value: usize) -> Result<usize, ConfigError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidConfiguration(
            "max_iterations must be positive".to_string(),
        ))
    }
}

impl SolverConfig {
    pub fn new(
        tolerance: f64,
        max_iterations: usize,
        derivative_threshold: f64,
    ) -> Result<SolverConfig, ConfigError> {
        Ok(SolverConfig {
            tolerance: check_positive("tolerance", tolerance)?,
            max_iterations: check_iterations(max_iterations)?,
            derivative_threshold: check_positive("derivative_threshold", derivative_threshold)?,
        })
    }
    ////////////////////////////SETTERS///////////////////////////////////////////////////////////
    pub fn with_tolerance(self, tolerance: f64) -> Result<SolverConfig, ConfigError> {
        Ok(SolverConfig {
            tolerance: check_positive("tolerance", tolerance)?,
            ..self
        })
    }

    pub fn with_max_iterations(self, max_iterations: usize) -> Result<SolverConfig, ConfigError> {
        Ok(SolverConfig {
            max_iterations: check_iterations(max_iterations)?,
            ..self
        })
    }

    pub fn with_derivative_threshold(
        self,
        derivative_threshold: f64,
    ) -> Result<SolverConfig, ConfigError> {
        Ok(SolverConfig {
            derivative_threshold: check_positive("derivative_threshold", derivative_threshold)?,
            ..self
        })
    }
    ////////////////////////////GETTERS///////////////////////////////////////////////////////////
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn derivative_threshold(&self) -> f64 {
        self.derivative_threshold
    }

    /// Reads the `[solver]` table of a TOML document.
    pub fn from_toml_str(text: &str) -> Result<SolverConfig, ConfigError> {
        Ok(NewtonSettings::from_toml_str(text)?.solver)
    }
}

/// Everything a TOML settings file may carry: the solver configuration and the log level.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NewtonSettings {
    pub solver: SolverConfig,
    pub loglevel: LogLevel,
}

fn invalid(message: String) -> ConfigError {
    ConfigError::InvalidConfiguration(message)
}

fn read_float(table: &toml::Table, key: &str) -> Result<Option<f64>, ConfigError> {
    match table.get(key) {
        None => Ok(None),
        Some(toml::Value::Float(value)) => Ok(Some(*value)),
        Some(toml::Value::Integer(value)) => Ok(Some(*value as f64)),
        Some(other) => Err(invalid(format!(
            "'{}' must be a number, got {}",
            key,
            other.type_str()
        ))),
    }
}

fn read_count(table: &toml::Table, key: &str) -> Result<Option<usize>, ConfigError> {
    match table.get(key) {
        None => Ok(None),
        Some(toml::Value::Integer(value)) => usize::try_from(*value)
            .map(Some)
            .map_err(|_| invalid(format!("'{}' must be a positive integer, got {}", key, value))),
        Some(other) => Err(invalid(format!(
            "'{}' must be an integer, got {}",
            key,
            other.type_str()
        ))),
    }
}

impl NewtonSettings {
    pub fn from_toml_str(text: &str) -> Result<NewtonSettings, ConfigError> {
        let document = text
            .parse::<toml::Table>()
            .map_err(|e| invalid(format!("malformed TOML: {}", e)))?;

        let loglevel = match document.get("loglevel") {
            None => LogLevel::default(),
            Some(toml::Value::String(level)) => level.parse::<LogLevel>().map_err(|_| {
                invalid(format!(
                    "loglevel must be off, none, error, warn, info or debug, got '{}'",
                    level
                ))
            })?,
            Some(other) => {
                return Err(invalid(format!(
                    "loglevel must be a string, got {}",
                    other.type_str()
                )));
            }
        };

        let mut solver = SolverConfig::default();
        match document.get("solver") {
            None => {}
            Some(toml::Value::Table(table)) => {
                if let Some(tolerance) = read_float(table, "tolerance")? {
                    solver = solver.with_tolerance(tolerance)?;
                }
                if let Some(max_iterations) = read_count(table, "max_iterations")? {
                    solver = solver.with_max_iterations(max_iterations)?;
                }
                if let Some(threshold) = read_float(table, "derivative_threshold")? {
                    solver = solver.with_derivative_threshold(threshold)?;
                }
            }
            Some(other) => {
                return Err(invalid(format!(
                    "'solver' must be a table, got {}",
                    other.type_str()
                )));
            }
        }
        Ok(NewtonSettings { solver, loglevel })
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<NewtonSettings, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| invalid(format!("cannot read {}: {}", path.display(), e)))?;
        NewtonSettings::from_toml_str(&text)
    }
}
