use crate::numerical::NR_config::LogLevel;
use chrono::Local;
use simplelog::*;
use std::fs::File;

/// Name of the log file written next to the working directory, stamped with the local time.
pub fn log_file_name() -> String {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("log_{}.txt", date_and_time)
}

/// Initializes the global logger: terminal output and, when `log_to_file` is set, a log file.
///
/// Returns `false` when nothing was installed, either because the level is `off`/`none` or
/// because a logger is already installed (a second initialization is not an error).
pub fn init_logger(level: LogLevel, log_to_file: bool) -> bool {
    if level.is_off() {
        return false;
    }
    let level = level.level_filter();
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if log_to_file {
        let name = log_file_name();
        match File::create(&name) {
            Ok(file) => loggers.push(WriteLogger::new(level, Config::default(), file)),
            Err(e) => eprintln!("cannot create log file {}: {}", name, e),
        }
    }
    CombinedLogger::init(loggers).is_ok()
}
