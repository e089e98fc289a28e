#![allow(non_snake_case)]

use crate::Utils::entry_config::parse_entries;
use crate::units::dimension::Dimension;
use crate::units::unit_table::UnitTable;
use crate::validation::guard::{expr_is_safe, is_valid_identifier};
use crate::validation::orchestrator::{EntryValidator, Outcome, ValidationEvent};
use crate::validation::pipeline::UnitTarget;
use crate::validation::policy::UnitPolicy;
use itertools::Itertools;
use log::info;
use tabled::settings::Style;
use tabled::{Table, Tabled, builder::Builder};

#[derive(Tabled)]
pub struct OutcomeRow {
    text: String,
    outcome: String,
    value: String,
    dimension: String,
    status: String,
}

impl OutcomeRow {
    pub fn from_entry(entry: &EntryValidator) -> OutcomeRow {
        let outcome = match entry.outcome() {
            Outcome::Valid(_) => "valid".to_string(),
            Outcome::Empty => "empty".to_string(),
            Outcome::Error(err) => err.to_string(),
        };
        OutcomeRow {
            text: entry.text().to_string(),
            outcome,
            value: entry
                .value()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "None".to_string()),
            dimension: entry
                .dimension()
                .map(|d| d.name())
                .unwrap_or_else(|| "None".to_string()),
            status: entry.status().to_string(),
        }
    }
}

/// Validates `text` as an expression with units, converted to `target` when one is given.
pub fn validate_text(text: &str, target: Option<&str>) -> Table {
    let table = UnitTable::shared();
    let entry = EntryValidator::builder(UnitPolicy)
        .table(table.clone())
        .text(text)
        .build();
    let mut rows = vec![OutcomeRow::from_entry(&entry)];
    if let Some(target) = target {
        if entry.expr().is_some() {
            let target = UnitTarget::from(target);
            let converted = entry.convert_to(target.clone(), true);
            let mut row = OutcomeRow::from_entry(&entry);
            row.text = format!("{} -> {}", text, target);
            match converted {
                Ok(Some(expr)) => row.value = expr.to_string(),
                Ok(None) => row.value = "None".to_string(),
                Err(err) => row.outcome = err.to_string(),
            }
            rows.push(row);
        }
    }
    let mut table = Table::new(rows);
    table.with(Style::modern_rounded());
    table
}

/// every unit group with its option labels
pub fn unit_groups_table(table: &UnitTable) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["group", "options"]);
    for group in table.groups() {
        builder.push_record([group.name.clone(), group.labels().iter().join(", ")]);
    }
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table
}

pub fn validation_examples(example: usize) {
    match example {
        0 => {
            // UNIT GROUPS offered by the option selectors
            let table = UnitTable::shared();
            println!("{}", unit_groups_table(&table));
            for name in ["length", "force", "pressure"] {
                let dimension = Dimension::from_name(name).unwrap_or_default();
                println!("{}: {}", name, table.find_units(&dimension).join(" "));
            }
        }
        1 => {
            // SAFETY GUARD: attribute access and keywords are rejected before parsing
            let mut builder = Builder::default();
            builder.push_record(["text", "safe", "identifier"]);
            for text in ["1.5", ".5", "x.real", "12a.5", "text_2", "lambda", "sin(pi/4)"] {
                builder.push_record([
                    text.to_string(),
                    expr_is_safe(text).to_string(),
                    is_valid_identifier(text).to_string(),
                ]);
            }
            let mut table = builder.build();
            table.with(Style::modern_rounded());
            println!("{}", table);
        }
        2 => {
            // ENTRY WITH A SELECTOR: changing the option rechecks the same text
            let Ok(mut entry) = EntryValidator::entry("2*mm + 3*inch", "length") else {
                return;
            };
            let labels: Vec<String> = entry
                .selector()
                .map(|s| s.labels().iter().map(|l| l.to_string()).collect())
                .unwrap_or_default();
            let mut rows = Vec::new();
            for label in labels {
                if entry.set_units(&label).is_ok() {
                    let mut row = OutcomeRow::from_entry(&entry);
                    row.text = format!("{} [{}]", entry.text(), label);
                    rows.push(row);
                }
            }
            entry.set_text("2*mm + 3*kg");
            rows.push(OutcomeRow::from_entry(&entry));
            let mut table = Table::new(rows);
            table.with(Style::modern_rounded());
            println!("{}", table);
        }
        3 => {
            // DIMENSION ENTRY: the required dimension can be changed afterwards
            let length = Dimension::from_name("length").unwrap_or_default();
            let force = Dimension::from_name("force").unwrap_or_default();
            let mut entry = EntryValidator::dimensioned("2*mm", length);
            let mut rows = vec![OutcomeRow::from_entry(&entry)];
            entry.set_dimension(force);
            rows.push(OutcomeRow::from_entry(&entry));
            for text in ["2*lbf", "sin(3*pi)", "5*kN + 2*lbf"] {
                entry.set_text(text);
                rows.push(OutcomeRow::from_entry(&entry));
            }
            let mut table = Table::new(rows);
            table.with(Style::modern_rounded());
            println!("{}", table);
        }
        4 => {
            // EVENTS emitted by one cycle
            let mut entry = EntryValidator::symbol("");
            entry.subscribe(|event: &ValidationEvent| println!("event: {:?}", event));
            for text in ["text", "for", "", "x2"] {
                println!("set_text({:?})", text);
                entry.set_text(text);
            }
        }
        5 => {
            // CONFIGURED ENTRIES
            let document = r#"
                [thickness]
                kind = "entry"
                text = "2*mm + 1*inch"
                options = "length"

                [load]
                kind = "dimension"
                dimension = "force"
                text = "3*lbf"

                [volume]
                kind = "entry"
                text = "2*USgal"
                options = ["liter", "ml"]
            "#;
            match parse_entries(document) {
                Ok(entries) => {
                    let table = UnitTable::shared();
                    let mut rows = Vec::new();
                    for (name, config) in entries.iter() {
                        match EntryValidator::from_config(config, table.clone()) {
                            Ok(entry) => {
                                let mut row = OutcomeRow::from_entry(&entry);
                                row.text = format!("{}: {}", name, row.text);
                                rows.push(row);
                            }
                            Err(err) => info!("{}: {}", name, err),
                        }
                    }
                    let mut table = Table::new(rows);
                    table.with(Style::modern_rounded());
                    println!("{}", table);
                }
                Err(err) => println!("{}", err),
            }
        }
        _ => {
            println!("no such example: {}", example);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text_rows() {
        let rendered = validate_text("5*mm + 1*inch", Some("ft")).to_string();
        assert!(rendered.contains("5*mm + 1*inch -> ft"));
        assert!(rendered.contains("valid"));
        let rendered = validate_text("2*mm + 3*kg", Some("ft")).to_string();
        assert!(rendered.contains("UnitMisMatchError"));
    }

    #[test]
    fn test_unit_groups_table_lists_groups() {
        let table = UnitTable::standard();
        let rendered = unit_groups_table(&table).to_string();
        for group in table.groups() {
            assert!(rendered.contains(&group.name));
        }
    }
}
