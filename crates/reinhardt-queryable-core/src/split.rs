//! Table-splitting behavior

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A split-key value, in whatever shape the split strategy expects
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SplitValue {
	Int(i64),
	UInt(u64),
	String(String),
	Uuid(Uuid),
	Date(NaiveDate),
	DateTime(DateTime<Utc>),
}

impl From<i64> for SplitValue {
	fn from(v: i64) -> Self {
		SplitValue::Int(v)
	}
}

impl From<u64> for SplitValue {
	fn from(v: u64) -> Self {
		SplitValue::UInt(v)
	}
}

impl From<&str> for SplitValue {
	fn from(v: &str) -> Self {
		SplitValue::String(v.to_string())
	}
}

impl From<String> for SplitValue {
	fn from(v: String) -> Self {
		SplitValue::String(v)
	}
}

impl From<Uuid> for SplitValue {
	fn from(v: Uuid) -> Self {
		SplitValue::Uuid(v)
	}
}

impl From<NaiveDate> for SplitValue {
	fn from(v: NaiveDate) -> Self {
		SplitValue::Date(v)
	}
}

impl From<DateTime<Utc>> for SplitValue {
	fn from(v: DateTime<Utc>) -> Self {
		SplitValue::DateTime(v)
	}
}

/// How split values select physical tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitSelection {
	/// Only the tables the values map to exactly
	#[default]
	Precise,
	/// Every table whose name matches the values
	Fuzzy,
}

/// Which physical tables a query over a split model should touch
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SplitTableBehavior {
	pub values: Vec<SplitValue>,
	pub selection: SplitSelection,
}

impl SplitTableBehavior {
	pub fn precise<V: Into<SplitValue>>(values: impl IntoIterator<Item = V>) -> Self {
		Self {
			values: values.into_iter().map(Into::into).collect(),
			selection: SplitSelection::Precise,
		}
	}

	pub fn fuzzy<V: Into<SplitValue>>(values: impl IntoIterator<Item = V>) -> Self {
		Self {
			values: values.into_iter().map(Into::into).collect(),
			selection: SplitSelection::Fuzzy,
		}
	}
}
