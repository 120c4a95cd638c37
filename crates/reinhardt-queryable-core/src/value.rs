//! Scalar values carried by criteria, modifications and aggregate results

use crate::error::{QueryError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A value bound into a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Decimal(Decimal),
	String(String),
	Uuid(Uuid),
	Date(NaiveDate),
	DateTime(DateTime<Utc>),
}

impl Value {
	/// Name of the variant, used in conversion errors
	pub fn kind(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Bool(_) => "bool",
			Value::Int(_) => "int",
			Value::Float(_) => "float",
			Value::Decimal(_) => "decimal",
			Value::String(_) => "string",
			Value::Uuid(_) => "uuid",
			Value::Date(_) => "date",
			Value::DateTime(_) => "datetime",
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::String(s)
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::String(s.to_string())
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Value::Bool(b)
	}
}

impl From<i64> for Value {
	fn from(i: i64) -> Self {
		Value::Int(i)
	}
}

impl From<i32> for Value {
	fn from(i: i32) -> Self {
		Value::Int(i as i64)
	}
}

impl From<u32> for Value {
	fn from(i: u32) -> Self {
		Value::Int(i as i64)
	}
}

impl From<f64> for Value {
	fn from(f: f64) -> Self {
		Value::Float(f)
	}
}

impl From<Decimal> for Value {
	fn from(d: Decimal) -> Self {
		Value::Decimal(d)
	}
}

impl From<Uuid> for Value {
	fn from(u: Uuid) -> Self {
		Value::Uuid(u)
	}
}

impl From<NaiveDate> for Value {
	fn from(d: NaiveDate) -> Self {
		Value::Date(d)
	}
}

impl From<DateTime<Utc>> for Value {
	fn from(dt: DateTime<Utc>) -> Self {
		Value::DateTime(dt)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(v: Option<T>) -> Self {
		v.map(Into::into).unwrap_or(Value::Null)
	}
}

/// Conversion from an executor-provided [`Value`] into a typed result
///
/// Used by the typed aggregate and scalar terminals of the façade.
pub trait FromValue: Sized {
	fn from_value(value: Value) -> Result<Self>;
}

fn mismatch<T>(expected: &'static str, value: &Value) -> Result<T> {
	Err(QueryError::ValueConversion {
		expected,
		actual: value.kind(),
	})
}

impl FromValue for Value {
	fn from_value(value: Value) -> Result<Self> {
		Ok(value)
	}
}

impl FromValue for i64 {
	fn from_value(value: Value) -> Result<Self> {
		match value {
			Value::Int(i) => Ok(i),
			Value::Decimal(d) if d.fract().is_zero() => match d.to_i64() {
				Some(i) => Ok(i),
				None => mismatch("i64", &Value::Decimal(d)),
			},
			other => mismatch("i64", &other),
		}
	}
}

impl FromValue for f64 {
	fn from_value(value: Value) -> Result<Self> {
		match value {
			Value::Float(f) => Ok(f),
			Value::Int(i) => Ok(i as f64),
			Value::Decimal(d) => match d.to_f64() {
				Some(f) => Ok(f),
				None => mismatch("f64", &Value::Decimal(d)),
			},
			other => mismatch("f64", &other),
		}
	}
}

impl FromValue for Decimal {
	fn from_value(value: Value) -> Result<Self> {
		match value {
			Value::Decimal(d) => Ok(d),
			Value::Int(i) => Ok(Decimal::from(i)),
			Value::Float(f) => match Decimal::from_f64(f) {
				Some(d) => Ok(d),
				None => mismatch("decimal", &Value::Float(f)),
			},
			other => mismatch("decimal", &other),
		}
	}
}

impl FromValue for bool {
	fn from_value(value: Value) -> Result<Self> {
		match value {
			Value::Bool(b) => Ok(b),
			other => mismatch("bool", &other),
		}
	}
}

impl FromValue for String {
	fn from_value(value: Value) -> Result<Self> {
		match value {
			Value::String(s) => Ok(s),
			other => mismatch("string", &other),
		}
	}
}

impl FromValue for DateTime<Utc> {
	fn from_value(value: Value) -> Result<Self> {
		match value {
			Value::DateTime(dt) => Ok(dt),
			other => mismatch("datetime", &other),
		}
	}
}

impl<T: FromValue> FromValue for Option<T> {
	fn from_value(value: Value) -> Result<Self> {
		match value {
			Value::Null => Ok(None),
			other => T::from_value(other).map(Some),
		}
	}
}
