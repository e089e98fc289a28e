//! Logger set-up: a terminal logger and, optionally, a log file named after the start time.

use chrono::Local;
use log::{info, warn};
use simplelog::*;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum LoggerError {
    UnknownLevel(String),
    Io(std::io::Error),
}

impl fmt::Display for LoggerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoggerError::UnknownLevel(level) => write!(
                f,
                "loglevel must be debug, info, warn, error, trace or off, got {}",
                level
            ),
            LoggerError::Io(err) => write!(f, "cannot create log file: {}", err),
        }
    }
}

impl std::error::Error for LoggerError {}

impl From<std::io::Error> for LoggerError {
    fn from(err: std::io::Error) -> Self {
        LoggerError::Io(err)
    }
}

pub fn parse_level(level: &str) -> Result<LevelFilter, LoggerError> {
    match level.to_lowercase().as_str() {
        "debug" => Ok(LevelFilter::Debug),
        "info" => Ok(LevelFilter::Info),
        "warn" => Ok(LevelFilter::Warn),
        "error" => Ok(LevelFilter::Error),
        "trace" => Ok(LevelFilter::Trace),
        "off" => Ok(LevelFilter::Off),
        _ => Err(LoggerError::UnknownLevel(level.to_string())),
    }
}

/// `<prefix>_<date>_<time>.log`
pub fn log_file_name(prefix: &str) -> String {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("{}_{}.log", prefix, date_and_time)
}

/// Terminal logger plus a file logger inside `log_dir` when one is given.
/// Returns the loggers and the path of the log file.
pub fn build_loggers(
    level: LevelFilter,
    log_dir: Option<&Path>,
    prefix: &str,
) -> Result<(Vec<Box<dyn SharedLogger>>, Option<PathBuf>), LoggerError> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    let path = match log_dir {
        Some(dir) => {
            let path = dir.join(log_file_name(prefix));
            loggers.push(WriteLogger::new(
                level,
                Config::default(),
                File::create(&path)?,
            ));
            Some(path)
        }
        None => None,
    };
    Ok((loggers, path))
}

/// Installs the global logger. A second initialisation is reported and ignored.
pub fn init_logger(level: &str, log_dir: Option<&Path>) -> Result<Option<PathBuf>, LoggerError> {
    let level = parse_level(level)?;
    let (loggers, path) = build_loggers(level, log_dir, "symentry")?;
    match CombinedLogger::init(loggers) {
        Ok(()) => {
            info!("logger initialised at level {}", level);
            if let Some(path) = &path {
                info!("logging to {}", path.display());
            }
        }
        Err(err) => warn!("logger already initialised: {}", err),
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level("WARN").unwrap(), LevelFilter::Warn);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::Off);
        assert!(matches!(
            parse_level("loud"),
            Err(LoggerError::UnknownLevel(_))
        ));
    }

    #[test]
    fn test_log_file_name() {
        let name = log_file_name("run");
        assert!(name.starts_with("run_"));
        assert!(name.ends_with(".log"));
        // run_YYYY-MM-DD_HH-MM-SS.log
        assert_eq!(name.len(), "run_".len() + 19 + ".log".len());
    }

    #[test]
    fn test_build_loggers_with_file() {
        let dir = tempfile::tempdir().unwrap();
        let (loggers, path) = build_loggers(LevelFilter::Info, Some(dir.path()), "test").unwrap();
        assert_eq!(loggers.len(), 2);
        let path = path.unwrap();
        assert!(path.exists());
        assert!(path.starts_with(dir.path()));

        let (loggers, path) = build_loggers(LevelFilter::Info, None, "test").unwrap();
        assert_eq!(loggers.len(), 1);
        assert!(path.is_none());
    }

    #[test]
    fn test_missing_log_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no").join("such").join("dir");
        assert!(matches!(
            build_loggers(LevelFilter::Info, Some(&missing), "test"),
            Err(LoggerError::Io(_))
        ));
    }
}
