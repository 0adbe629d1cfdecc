// src/etl/row.rs
use serde_json::{Map, Value};

static NULL: Value = Value::Null;

/// A loosely-typed listing in the middle of the pipeline: the projected raw
/// columns, progressively rewritten by the field normalizers until type
/// coercion turns it into a `CoercedListing`.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub property_code: String,
    cells: Map<String, Value>,
}

impl Row {
    pub fn new(property_code: impl Into<String>) -> Self {
        Self {
            property_code: property_code.into(),
            cells: Map::new(),
        }
    }

    /// Missing cells read as null.
    pub fn get(&self, column: &str) -> &Value {
        self.cells.get(column).unwrap_or(&NULL)
    }

    pub fn set(&mut self, column: &str, value: impl Into<Value>) {
        self.cells.insert(column.to_string(), value.into());
    }

    /// Removes a cell, returning null if it was never there.
    pub fn take(&mut self, column: &str) -> Value {
        self.cells.remove(column).unwrap_or(Value::Null)
    }

    pub fn has(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }
}
