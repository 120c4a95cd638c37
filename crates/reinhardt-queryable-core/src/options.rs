//! Per-call execution options and update modifications

use crate::field::FieldRef;
use crate::flags::IsolationLevel;
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Options threaded through every terminal call
///
/// Executors seed a fresh value from their settings, then the caller's
/// `configure` callback may override any of it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
	pub isolation_level: IsolationLevel,
	pub timeout: Option<Duration>,
	/// Fail an update/delete that touches no rows
	pub must_affect_data: bool,
	/// Executor-specific settings this crate does not interpret
	pub properties: BTreeMap<String, serde_json::Value>,
}

impl QueryOptions {
	pub fn with_isolation_level(mut self, level: IsolationLevel) -> Self {
		self.isolation_level = level;
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);
		self
	}

	pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
		self.properties.insert(key.into(), value.into());
	}

	pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
		self.properties.get(key)
	}
}

/// How an update changes one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModificationValue {
	Set(Value),
	Add(Value),
	Subtract(Value),
	Multiply(Value),
	Divide(Value),
}

impl ModificationValue {
	pub fn value(&self) -> &Value {
		match self {
			ModificationValue::Set(v)
			| ModificationValue::Add(v)
			| ModificationValue::Subtract(v)
			| ModificationValue::Multiply(v)
			| ModificationValue::Divide(v) => v,
		}
	}
}

/// Column changes applied by an update terminal, in insertion order
///
/// Setting the same column twice keeps its first position and the last value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Modification {
	changes: IndexMap<String, ModificationValue>,
}

impl Modification {
	pub fn new() -> Self {
		Self::default()
	}

	fn push(mut self, field: impl Into<FieldRef>, change: ModificationValue) -> Self {
		self.changes.insert(field.into().name, change);
		self
	}

	pub fn set(self, field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
		self.push(field, ModificationValue::Set(value.into()))
	}

	pub fn add(self, field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
		self.push(field, ModificationValue::Add(value.into()))
	}

	pub fn subtract(self, field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
		self.push(field, ModificationValue::Subtract(value.into()))
	}

	pub fn multiply(self, field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
		self.push(field, ModificationValue::Multiply(value.into()))
	}

	pub fn divide(self, field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
		self.push(field, ModificationValue::Divide(value.into()))
	}

	pub fn get(&self, column: &str) -> Option<&ModificationValue> {
		self.changes.get(column)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &ModificationValue)> {
		self.changes.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn len(&self) -> usize {
		self.changes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}
}
