//! TOML description of entry validators, one table per entry:
//!
//! ```toml
//! [thickness]
//! kind = "entry"
//! text = "2*mm"
//! options = "length"
//!
//! [load]
//! kind = "dimension"
//! dimension = "force"
//! live_error_checking = false
//!
//! [span]
//! kind = "entry"
//! options = ["ft", "m"]
//! option_fixed = true
//! ```
//!
//! `kind` is one of `symbol`, `expression`, `unit`, `dimension` and `entry` (an expression
//! with units paired with an option selector, so `options` is required).

use crate::units::dimension::Dimension;
use crate::units::unit_table::UnitTable;
use crate::validation::orchestrator::EntryValidator;
use crate::validation::policy::{
    DimensionPolicy, ExpressionPolicy, Policy, SymbolPolicy, UnitPolicy,
};
use crate::validation::selector::{SelectionError, UnitSelector};
use log::{info, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use strum_macros::{Display, EnumIter, EnumString};

const KNOWN_KEYS: &[&str] = &[
    "kind",
    "text",
    "options",
    "option_fixed",
    "live_error_checking",
    "dimension",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum EntryKind {
    Symbol,
    Expression,
    Unit,
    Dimension,
    Entry,
}

/// options offered by the selector
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOptions {
    /// a unit group of the table
    Group(String),
    /// unit labels looked up in the table
    Labels(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryConfig {
    pub kind: EntryKind,
    pub text: String,
    pub options: Option<UnitOptions>,
    pub option_fixed: bool,
    pub live_error_checking: bool,
    /// required dimension name for the dimension kind
    pub dimension: Option<String>,
}

impl Default for EntryConfig {
    fn default() -> Self {
        EntryConfig {
            kind: EntryKind::Expression,
            text: String::new(),
            options: None,
            option_fixed: false,
            live_error_checking: true,
            dimension: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Toml(toml::de::Error),
    Io(std::io::Error),
    /// the value of an entry name is not a table
    NotATable(String),
    UnknownKind(String),
    WrongType { key: String, expected: &'static str },
    UnknownDimension(String),
    /// an `entry` without `options`
    MissingOptions,
    Selection(SelectionError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Toml(err) => write!(f, "invalid TOML: {}", err),
            ConfigError::Io(err) => write!(f, "cannot read configuration: {}", err),
            ConfigError::NotATable(name) => write!(f, "entry {} must be a table", name),
            ConfigError::UnknownKind(kind) => write!(f, "unknown entry kind {}", kind),
            ConfigError::WrongType { key, expected } => {
                write!(f, "key {} must be {}", key, expected)
            }
            ConfigError::UnknownDimension(name) => write!(f, "unknown dimension {}", name),
            ConfigError::MissingOptions => write!(f, "entry kind needs options"),
            ConfigError::Selection(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err)
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<SelectionError> for ConfigError {
    fn from(err: SelectionError) -> Self {
        ConfigError::Selection(err)
    }
}

fn wrong_type(key: &str, expected: &'static str) -> ConfigError {
    ConfigError::WrongType {
        key: key.to_string(),
        expected,
    }
}

fn get_str(table: &toml::Table, key: &str) -> Result<Option<String>, ConfigError> {
    match table.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| wrong_type(key, "a string")),
    }
}

fn get_bool(table: &toml::Table, key: &str, default: bool) -> Result<bool, ConfigError> {
    match table.get(key) {
        None => Ok(default),
        Some(value) => value.as_bool().ok_or_else(|| wrong_type(key, "a boolean")),
    }
}

fn get_options(table: &toml::Table) -> Result<Option<UnitOptions>, ConfigError> {
    let expected = "a group name or an array of unit labels";
    match table.get("options") {
        None => Ok(None),
        Some(toml::Value::String(group)) => Ok(Some(UnitOptions::Group(group.clone()))),
        Some(toml::Value::Array(labels)) => labels
            .iter()
            .map(|label| {
                label
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| wrong_type("options", expected))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|labels| Some(UnitOptions::Labels(labels))),
        Some(_) => Err(wrong_type("options", expected)),
    }
}

impl EntryConfig {
    pub fn from_table(name: &str, table: &toml::Table) -> Result<EntryConfig, ConfigError> {
        for key in table.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                warn!("entry {}: unknown key {} ignored", name, key);
            }
        }
        let kind = match get_str(table, "kind")? {
            Some(kind) => {
                EntryKind::from_str(&kind).map_err(|_| ConfigError::UnknownKind(kind.clone()))?
            }
            None => EntryKind::Expression,
        };
        Ok(EntryConfig {
            kind,
            text: get_str(table, "text")?.unwrap_or_default(),
            options: get_options(table)?,
            option_fixed: get_bool(table, "option_fixed", false)?,
            live_error_checking: get_bool(table, "live_error_checking", true)?,
            dimension: get_str(table, "dimension")?,
        })
    }

    fn policy(&self) -> Result<Policy, ConfigError> {
        Ok(match self.kind {
            EntryKind::Symbol => SymbolPolicy.into(),
            EntryKind::Expression => ExpressionPolicy.into(),
            EntryKind::Unit | EntryKind::Entry => UnitPolicy.into(),
            EntryKind::Dimension => {
                let name = self.dimension.as_deref().unwrap_or("length");
                let required = Dimension::from_name(name)
                    .ok_or_else(|| ConfigError::UnknownDimension(name.to_string()))?;
                DimensionPolicy::new(required).into()
            }
        })
    }

    fn selector(&self, table: &UnitTable) -> Result<Option<UnitSelector>, ConfigError> {
        let selector = match &self.options {
            None if self.kind == EntryKind::Entry => return Err(ConfigError::MissingOptions),
            None => return Ok(None),
            Some(UnitOptions::Group(group)) => UnitSelector::from_group_name(group, table)?,
            Some(UnitOptions::Labels(labels)) => {
                let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
                UnitSelector::from_labels(&labels, table)?
            }
        };
        Ok(Some(selector.with_fixed(self.option_fixed)))
    }
}

/// Parses a TOML document into entry configurations keyed by entry name.
pub fn parse_entries(document: &str) -> Result<BTreeMap<String, EntryConfig>, ConfigError> {
    let root: toml::Table = document.parse()?;
    let mut entries = BTreeMap::new();
    for (name, value) in root.iter() {
        let table = value
            .as_table()
            .ok_or_else(|| ConfigError::NotATable(name.clone()))?;
        entries.insert(name.clone(), EntryConfig::from_table(name, table)?);
    }
    info!("{} entries configured", entries.len());
    Ok(entries)
}

pub fn load_entries(path: &Path) -> Result<BTreeMap<String, EntryConfig>, ConfigError> {
    let document = std::fs::read_to_string(path)?;
    parse_entries(&document)
}

impl EntryValidator {
    /// Builds a validator from its configuration; the first cycle runs on the configured text.
    pub fn from_config(
        config: &EntryConfig,
        table: Arc<UnitTable>,
    ) -> Result<EntryValidator, ConfigError> {
        let policy = config.policy()?;
        let selector = config.selector(&table)?;
        let mut builder = EntryValidator::builder(policy)
            .table(table)
            .text(&config.text)
            .live_error_checking(config.live_error_checking);
        if let Some(selector) = selector {
            builder = builder.selector(selector);
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOCUMENT: &str = r#"
[thickness]
kind = "entry"
text = "2*mm"
options = "length"

[load]
kind = "dimension"
dimension = "force"
text = "3*lbf"
live_error_checking = false

[span]
kind = "entry"
options = ["ft", "m"]
option_fixed = true

[name]
kind = "symbol"
text = "x"
"#;

    #[test]
    fn test_parse_entries() {
        let entries = parse_entries(DOCUMENT).unwrap();
        assert_eq!(entries.len(), 4);
        let thickness = &entries["thickness"];
        assert_eq!(thickness.kind, EntryKind::Entry);
        assert_eq!(thickness.options, Some(UnitOptions::Group("length".to_string())));
        assert!(thickness.live_error_checking);
        let load = &entries["load"];
        assert_eq!(load.dimension.as_deref(), Some("force"));
        assert!(!load.live_error_checking);
        assert_eq!(
            entries["span"].options,
            Some(UnitOptions::Labels(vec!["ft".to_string(), "m".to_string()]))
        );
        assert!(entries["span"].option_fixed);
        assert_eq!(entries["name"].kind.to_string(), "symbol");
    }

    #[test]
    fn test_validators_from_config() {
        let table = UnitTable::shared();
        let entries = parse_entries(DOCUMENT).unwrap();
        let thickness = EntryValidator::from_config(&entries["thickness"], table.clone()).unwrap();
        assert!(thickness.outcome().is_valid());
        assert_eq!(thickness.selector().unwrap().current_label(), Some("mm"));
        let load = EntryValidator::from_config(&entries["load"], table.clone()).unwrap();
        assert_eq!(load.dimension(), Dimension::from_name("force"));
        assert!(!load.live_error_checking());
        let mut span = EntryValidator::from_config(&entries["span"], table.clone()).unwrap();
        assert_eq!(span.set_units("m"), Err(SelectionError::Fixed));
        let name = EntryValidator::from_config(&entries["name"], table).unwrap();
        assert!(name.outcome().is_valid());
    }

    #[test]
    fn test_config_errors() {
        assert!(matches!(
            parse_entries("[a]\nkind = \"slider\""),
            Err(ConfigError::UnknownKind(_))
        ));
        assert!(matches!(
            parse_entries("[a]\noption_fixed = \"yes\""),
            Err(ConfigError::WrongType { .. })
        ));
        assert!(matches!(parse_entries("a = 1"), Err(ConfigError::NotATable(_))));
        assert!(matches!(parse_entries("[a"), Err(ConfigError::Toml(_))));

        let table = UnitTable::shared();
        let document = r#"
            [a]
            kind = "entry"
            [b]
            kind = "dimension"
            dimension = "colour"
            [c]
            kind = "unit"
            options = "colour"
        "#;
        let entries = parse_entries(document).unwrap();
        assert!(matches!(
            EntryValidator::from_config(&entries["a"], table.clone()),
            Err(ConfigError::MissingOptions)
        ));
        assert!(matches!(
            EntryValidator::from_config(&entries["b"], table.clone()),
            Err(ConfigError::UnknownDimension(_))
        ));
        assert!(matches!(
            EntryValidator::from_config(&entries["c"], table),
            Err(ConfigError::Selection(SelectionError::UnknownGroup(_)))
        ));
    }

    #[test]
    fn test_load_entries_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOCUMENT.as_bytes()).unwrap();
        let entries = load_entries(file.path()).unwrap();
        assert!(entries.contains_key("span"));
        assert!(matches!(
            load_entries(Path::new("/definitely/not/here.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
