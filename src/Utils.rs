//! different utility modules used throughout the project
/// logger initialisation: terminal output and an optional timestamped log file
pub mod logger;
/// parse a TOML document with one table per entry into entry configurations and build
/// validators from them
pub mod entry_config;
