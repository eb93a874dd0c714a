//! Property editor
//!
//! Applies validated attribute and property edits to live elements and
//! keeps an undo history. Edits a component setter rejects are surfaced
//! and never recorded.

use serde_json::Value;
use tracing::{debug, warn};
use wclens_dom::{Document, DomError, NodeId};

use crate::undo::UndoManager;
use crate::DevtoolsError;

/// Expected type of a raw edit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpectedType {
    /// Infer from the text itself
    #[default]
    Auto,
    Boolean,
    Number,
    String,
    Array,
    Object,
    Null,
    Undefined,
}

/// Outcome of validating a raw edit
#[derive(Debug, Clone, PartialEq)]
pub enum Validated {
    Valid(Value),
    Invalid(String),
}

/// Parse raw editor input against the expected type. `Auto` never fails:
/// anything that is not a literal, number, or JSON shape stays a string.
pub fn validate_value(raw: &str, expected: ExpectedType) -> Validated {
    let trimmed = raw.trim();
    match expected {
        ExpectedType::Auto => Validated::Valid(auto_value(raw)),
        ExpectedType::Boolean => match trimmed {
            "true" => Validated::Valid(Value::Bool(true)),
            "false" => Validated::Valid(Value::Bool(false)),
            _ => Validated::Invalid(format!("not a boolean: {trimmed}")),
        },
        ExpectedType::Number => match parse_number(trimmed) {
            Some(n) => Validated::Valid(Value::Number(n)),
            None => Validated::Invalid(format!("not a finite number: {trimmed}")),
        },
        ExpectedType::String => Validated::Valid(Value::String(raw.to_string())),
        ExpectedType::Array => match serde_json::from_str::<Value>(trimmed) {
            Ok(v @ Value::Array(_)) => Validated::Valid(v),
            _ => Validated::Invalid(format!("not a JSON array: {trimmed}")),
        },
        ExpectedType::Object => match serde_json::from_str::<Value>(trimmed) {
            Ok(v @ Value::Object(_)) => Validated::Valid(v),
            _ => Validated::Invalid(format!("not a JSON object: {trimmed}")),
        },
        ExpectedType::Null => match trimmed {
            "null" => Validated::Valid(Value::Null),
            _ => Validated::Invalid(format!("not null: {trimmed}")),
        },
        // The value model has no undefined; it folds to null.
        ExpectedType::Undefined => match trimmed {
            "undefined" => Validated::Valid(Value::Null),
            _ => Validated::Invalid(format!("not undefined: {trimmed}")),
        },
    }
}

fn auto_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    match trimmed {
        "null" | "undefined" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Some(n) = parse_number(trimmed) {
        return Value::Number(n);
    }
    if trimmed.starts_with(['[', '{', '"']) {
        if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
            return v;
        }
    }
    Value::String(raw.to_string())
}

fn parse_number(text: &str) -> Option<serde_json::Number> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(i.into());
    }
    text.parse::<f64>().ok().and_then(serde_json::Number::from_f64)
}

/// What a change touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Attribute,
    Property,
}

/// One recorded edit
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub element: NodeId,
    pub kind: ChangeKind,
    pub name: String,
    /// Value before the edit; absent when the attribute or property was unset
    pub old: Option<Value>,
    /// Value after the edit; absent when the edit removed an attribute
    pub new: Option<Value>,
    pub at: u64,
}

/// Property editor
#[derive(Debug, Default)]
pub struct PropertyEditor {
    history: UndoManager,
    edits_applied: u64,
    edits_rejected: u64,
    update_pending: bool,
}

impl PropertyEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, or remove it with `None`. Always recorded.
    pub fn set_attribute(
        &mut self,
        doc: &mut Document,
        el: NodeId,
        name: &str,
        value: Option<&str>,
    ) -> Change {
        let old = match value {
            Some(v) => doc.set_attribute(el, name, v),
            None => doc.remove_attribute(el, name),
        };
        let change = Change {
            element: el,
            kind: ChangeKind::Attribute,
            name: name.to_string(),
            old: old.map(Value::String),
            new: value.map(|v| Value::String(v.to_string())),
            at: doc.now_ms(),
        };
        self.history.record(change.clone());
        self.edits_applied += 1;
        self.update_pending = true;
        debug!(element = ?el, name, "attribute edit applied");
        change
    }

    /// Set a component property. A throwing setter rejects the edit, which
    /// then never reaches the history.
    pub fn set_property(
        &mut self,
        doc: &mut Document,
        el: NodeId,
        name: &str,
        value: Value,
    ) -> Result<Change, DevtoolsError> {
        let old = doc.property(el, name).ok().flatten();
        if let Err(err) = doc.set_property(el, name, value.clone()) {
            self.edits_rejected += 1;
            warn!(element = ?el, name, %err, "property edit rejected");
            return Err(match err {
                DomError::NotAnElement(id) => DevtoolsError::NotAnElement(id),
                _ => DevtoolsError::SetterFailed {
                    tag: doc.tag_name(el).unwrap_or_default().to_string(),
                    property: name.to_string(),
                },
            });
        }
        let change = Change {
            element: el,
            kind: ChangeKind::Property,
            name: name.to_string(),
            old,
            new: Some(value),
            at: doc.now_ms(),
        };
        self.history.record(change.clone());
        self.edits_applied += 1;
        self.update_pending = true;
        debug!(element = ?el, name, "property edit applied");
        Ok(change)
    }

    /// Revert the most recent change. Returns the change stepped over.
    pub fn undo(&mut self, doc: &mut Document) -> Option<Change> {
        let change = self.history.pop_undo()?;
        apply_change(doc, &change, true);
        self.update_pending = true;
        Some(change)
    }

    /// Reapply the most recently undone change.
    pub fn redo(&mut self, doc: &mut Document) -> Option<Change> {
        let change = self.history.pop_redo()?;
        apply_change(doc, &change, false);
        self.update_pending = true;
        Some(change)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn edits_applied(&self) -> u64 {
        self.edits_applied
    }

    pub fn edits_rejected(&self) -> u64 {
        self.edits_rejected
    }

    /// True once any edit or history step changed the page since last asked
    pub fn take_update(&mut self) -> bool {
        std::mem::take(&mut self.update_pending)
    }
}

/// Walk a change in either direction. `backwards` restores the old side.
fn apply_change(doc: &mut Document, change: &Change, backwards: bool) {
    let value = if backwards { &change.old } else { &change.new };
    match change.kind {
        ChangeKind::Attribute => match value {
            Some(v) => {
                doc.set_attribute(change.element, &change.name, &attr_text(v));
            }
            None => {
                doc.remove_attribute(change.element, &change.name);
            }
        },
        ChangeKind::Property => match value {
            Some(v) => {
                if doc
                    .set_property(change.element, &change.name, v.clone())
                    .is_err()
                {
                    warn!(
                        element = ?change.element,
                        name = %change.name,
                        "history replay hit a failing setter"
                    );
                }
            }
            None => {
                doc.remove_property(change.element, &change.name);
            }
        },
    }
}

fn attr_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
