//! # Entry validator
//!
//! [`EntryValidator`] owns the state of one input entry: its text, the optional paired
//! [`UnitSelector`], the stored expression and value and the stored error. Every validation
//! cycle runs the same skeleton:
//!
//! 1. clear the stored expression and value
//! 2. empty text gives [`Outcome::Empty`]
//! 3. otherwise the [`Policy`] evaluates the text against the selector's current unit
//! 4. on success store the expression and value
//! 5. emit `ExprChanged` and `ValueChanged` once, then the error transition events
//!
//! A cycle runs on text change (live checking), on [`EntryValidator::finish_editing`], on
//! selector changes and on explicit [`EntryValidator::revalidate`].
//!
//! ```rust, ignore
//! use SymEntry::validation::orchestrator::EntryValidator;
//! let mut entry = EntryValidator::entry("2*mm + 3*inch", "length")?;
//! entry.set_units("inch")?;
//! assert!(entry.outcome().is_valid());
//! ```

use crate::symbolic::symbolic_engine::Expr;
use crate::units::dimension::Dimension;
use crate::units::dimension_analysis::magnitude_and_units;
use crate::units::unit_table::UnitTable;
use crate::validation::errors::{ExpressionError, ValidationError};
use crate::validation::pipeline::{UnitTarget, convert_to, get_dimension};
use crate::validation::policy::{
    DimensionPolicy, Evaluation, ExpressionPolicy, Policy, SymbolPolicy, UnitPolicy,
    ValidationPolicy,
};
use crate::validation::selector::{SelectionError, UnitSelector};
use log::{debug, trace};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Result of one validation cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Valid(Evaluation),
    /// the text is empty, nothing is stored
    Empty,
    Error(ValidationError),
}

impl Outcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Outcome::Valid(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            Outcome::Error(err) => Some(err),
            _ => None,
        }
    }
}

/// Status key used to pick the entry's colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum EntryStatus {
    Error,
    ErrorReadonly,
    Disabled,
    Readonly,
    Blank,
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationEvent {
    ExprChanged(Option<Expr>),
    ValueChanged(Option<Expr>),
    /// the stored error differs from the previous one
    ErrorChanged(Option<ValidationError>),
    HasError(ValidationError),
    ErrorCleared,
    /// label of the newly selected option
    OptionChanged(String),
}

pub type Listener = Box<dyn FnMut(&ValidationEvent)>;

pub struct EntryValidator {
    table: Arc<UnitTable>,
    policy: Policy,
    text: String,
    selector: Option<UnitSelector>,
    live_error_checking: bool,
    enabled: bool,
    read_only: bool,
    expr: Option<Expr>,
    value: Option<Expr>,
    error: Option<ValidationError>,
    outcome: Outcome,
    listeners: Vec<Listener>,
}

pub struct EntryBuilder {
    policy: Policy,
    table: Option<Arc<UnitTable>>,
    text: String,
    selector: Option<UnitSelector>,
    live_error_checking: bool,
    enabled: bool,
    read_only: bool,
}

impl EntryBuilder {
    pub fn table(mut self, table: Arc<UnitTable>) -> Self {
        self.table = Some(table);
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn selector(mut self, selector: UnitSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn live_error_checking(mut self, live: bool) -> Self {
        self.live_error_checking = live;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Builds the validator and runs the first cycle on the initial text.
    pub fn build(self) -> EntryValidator {
        let mut entry = EntryValidator {
            table: self.table.unwrap_or_else(UnitTable::shared),
            policy: self.policy,
            text: self.text,
            selector: self.selector,
            live_error_checking: self.live_error_checking,
            enabled: self.enabled,
            read_only: self.read_only,
            expr: None,
            value: None,
            error: None,
            outcome: Outcome::Empty,
            listeners: Vec::new(),
        };
        entry.revalidate();
        entry
    }
}

impl EntryValidator {
    pub fn builder(policy: impl Into<Policy>) -> EntryBuilder {
        EntryBuilder {
            policy: policy.into(),
            table: None,
            text: String::new(),
            selector: None,
            live_error_checking: true,
            enabled: true,
            read_only: false,
        }
    }

    /// bare symbol name entry
    pub fn symbol(text: &str) -> EntryValidator {
        EntryValidator::builder(SymbolPolicy).text(text).build()
    }

    /// expression entry without units
    pub fn expression(text: &str) -> EntryValidator {
        EntryValidator::builder(ExpressionPolicy).text(text).build()
    }

    /// expression entry with units typed into the text
    pub fn unit(text: &str) -> EntryValidator {
        EntryValidator::builder(UnitPolicy).text(text).build()
    }

    /// expression entry whose dimension must be `dimension`
    pub fn dimensioned(text: &str, dimension: Dimension) -> EntryValidator {
        EntryValidator::builder(DimensionPolicy::new(dimension))
            .text(text)
            .build()
    }

    /// expression entry paired with a selector offering the unit group `group`
    pub fn entry(text: &str, group: &str) -> Result<EntryValidator, SelectionError> {
        let table = UnitTable::shared();
        let selector = UnitSelector::from_group_name(group, &table)?;
        Ok(EntryValidator::builder(UnitPolicy)
            .table(table)
            .selector(selector)
            .text(text)
            .build())
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ValidationEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, event: ValidationEvent) {
        trace!("emit {:?}", event);
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    //___________________________________VALIDATION CYCLE____________________________________

    /// Runs one validation cycle on the current text and selection.
    pub fn revalidate(&mut self) -> &Outcome {
        self.expr = None;
        self.value = None;
        let outcome = if self.text.is_empty() {
            Outcome::Empty
        } else {
            // a selector only targets policies that resolve units
            let target = self
                .selector
                .as_ref()
                .filter(|_| self.policy.uses_units())
                .and_then(|s| s.current_data());
            match self.policy.evaluate(&self.text, target, &self.table) {
                Ok(evaluation) => Outcome::Valid(evaluation),
                Err(err) => Outcome::Error(err),
            }
        };
        if let Outcome::Valid(evaluation) = &outcome {
            self.expr = Some(evaluation.expr.clone());
            self.value = Some(evaluation.value.clone());
        }
        debug!(
            "{} entry {:?}: {}",
            self.policy.name(),
            self.text,
            match &outcome {
                Outcome::Valid(evaluation) => evaluation.expr.to_string(),
                Outcome::Empty => "empty".to_string(),
                Outcome::Error(err) => err.to_string(),
            }
        );
        let error = outcome.error().cloned();
        self.outcome = outcome;
        self.emit(ValidationEvent::ExprChanged(self.expr.clone()));
        self.emit(ValidationEvent::ValueChanged(self.value.clone()));
        self.set_error(error);
        &self.outcome
    }

    fn set_error(&mut self, error: Option<ValidationError>) {
        if error == self.error {
            return;
        }
        self.error = error.clone();
        self.emit(ValidationEvent::ErrorChanged(error.clone()));
        match error {
            Some(err) => self.emit(ValidationEvent::HasError(err)),
            None => self.emit(ValidationEvent::ErrorCleared),
        }
    }

    /// Replaces the text; runs a cycle when live checking is on and the text changed.
    pub fn set_text(&mut self, text: &str) {
        if self.text == text {
            return;
        }
        self.text = text.to_string();
        if self.live_error_checking {
            self.revalidate();
        }
    }

    /// end of an edit, always validates
    pub fn finish_editing(&mut self) -> &Outcome {
        self.revalidate()
    }

    pub fn set_live_error_checking(&mut self, live: bool) {
        self.live_error_checking = live;
        if live {
            self.revalidate();
        }
    }

    pub fn live_error_checking(&self) -> bool {
        self.live_error_checking
    }

    /// Selects the option `label` of the paired selector and revalidates the unchanged text.
    pub fn set_units(&mut self, label: &str) -> Result<(), SelectionError> {
        let selector = self.selector.as_mut().ok_or(SelectionError::NoSelector)?;
        if selector.select(label)? {
            self.emit(ValidationEvent::OptionChanged(label.to_string()));
            self.revalidate();
        }
        Ok(())
    }

    /// Selects the option holding `unit`.
    pub fn set_unit_value(&mut self, unit: &Expr) -> Result<(), SelectionError> {
        let selector = self.selector.as_mut().ok_or(SelectionError::NoSelector)?;
        if selector.select_value(unit)? {
            let label = selector.current_label().unwrap_or_default().to_string();
            self.emit(ValidationEvent::OptionChanged(label));
            self.revalidate();
        }
        Ok(())
    }

    /// Changes the required dimension and revalidates. Returns `false` when the entry does
    /// not enforce a dimension.
    pub fn set_dimension(&mut self, dimension: Dimension) -> bool {
        let Policy::Dimension(policy) = &mut self.policy else {
            return false;
        };
        policy.required = dimension;
        self.revalidate();
        true
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    //___________________________________ACCESSORS____________________________________

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn table(&self) -> &UnitTable {
        &self.table
    }

    pub fn selector(&self) -> Option<&UnitSelector> {
        self.selector.as_ref()
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    pub fn expr(&self) -> Option<&Expr> {
        self.expr.as_ref()
    }

    pub fn value(&self) -> Option<&Expr> {
        self.value.as_ref()
    }

    /// free symbols of the stored expression by name
    pub fn symbols(&self) -> BTreeMap<String, Expr> {
        self.expr
            .as_ref()
            .map(|expr| expr.free_symbols())
            .unwrap_or_default()
    }

    /// Required dimension for dimension entries, otherwise the stored expression's dimension.
    pub fn dimension(&self) -> Option<Dimension> {
        match &self.policy {
            Policy::Dimension(policy) => Some(policy.required),
            _ => get_dimension(self.expr.as_ref()),
        }
    }

    /// scalar part of the stored expression relative to its first unit
    pub fn magnitude(&self) -> Option<Expr> {
        self.expr.as_ref().map(|expr| magnitude_and_units(expr).0)
    }

    /// Selected unit for selector entries, otherwise the unit part of the stored expression
    /// (`1` when it has none).
    pub fn units(&self) -> Option<Expr> {
        if let Some(selector) = &self.selector {
            return selector.current_data().cloned();
        }
        self.expr.as_ref().map(|expr| magnitude_and_units(expr).1)
    }

    /// Stored expression rewritten in `unit`, numerically evaluated when `eval` is set.
    pub fn convert_to(
        &self,
        unit: impl Into<UnitTarget>,
        eval: bool,
    ) -> Result<Option<Expr>, ExpressionError> {
        let converted = convert_to(self.expr.as_ref(), &unit.into(), &self.table)?;
        Ok(if eval {
            converted.map(|expr| expr.evalf())
        } else {
            converted
        })
    }

    /// stored expression with symbols replaced by numbers, then evaluated
    pub fn substitute(&self, values: &HashMap<String, f64>) -> Option<Expr> {
        self.expr
            .as_ref()
            .map(|expr| expr.set_variable_from_map(values).evalf())
    }

    pub fn status(&self) -> EntryStatus {
        if self.error.is_some() {
            if !self.enabled || self.read_only {
                EntryStatus::ErrorReadonly
            } else {
                EntryStatus::Error
            }
        } else if !self.enabled {
            EntryStatus::Disabled
        } else if self.read_only {
            EntryStatus::Readonly
        } else if self.text.is_empty() {
            EntryStatus::Blank
        } else {
            EntryStatus::Default
        }
    }
}
