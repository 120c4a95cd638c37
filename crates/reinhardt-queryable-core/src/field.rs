//! Field references, projection fields and sort entries

use serde::{Deserialize, Serialize};
use std::fmt;

/// A column reference, optionally qualified by the owning model's name
///
/// Owners matter once a query joins several sources; for a single-source
/// query they are informative only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
	pub owner: Option<String>,
	pub name: String,
}

impl FieldRef {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			owner: None,
			name: name.into(),
		}
	}

	pub fn qualified(owner: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			owner: Some(owner.into()),
			name: name.into(),
		}
	}
}

impl fmt::Display for FieldRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.owner {
			Some(owner) => write!(f, "{}.{}", owner, self.name),
			None => f.write_str(&self.name),
		}
	}
}

impl From<&str> for FieldRef {
	fn from(s: &str) -> Self {
		match s.split_once('.') {
			Some((owner, name)) => FieldRef::qualified(owner, name),
			None => FieldRef::new(s),
		}
	}
}

/// A plain column projected as-is
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnField {
	pub field: FieldRef,
	pub alias: Option<String>,
}

/// A column passed through an executor-side formatter (e.g. `lower`, `count`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormattedField {
	pub field: FieldRef,
	pub formatter: String,
	pub alias: Option<String>,
}

/// A field taking part in projection or grouping
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataField {
	Column(ColumnField),
	Formatted(FormattedField),
}

impl DataField {
	pub fn column(field: impl Into<FieldRef>) -> Self {
		DataField::Column(ColumnField {
			field: field.into(),
			alias: None,
		})
	}

	pub fn formatted(field: impl Into<FieldRef>, formatter: impl Into<String>) -> Self {
		DataField::Formatted(FormattedField {
			field: field.into(),
			formatter: formatter.into(),
			alias: None,
		})
	}

	/// Attach an output alias
	#[must_use]
	pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
		let alias = Some(alias.into());
		match &mut self {
			DataField::Column(c) => c.alias = alias,
			DataField::Formatted(f) => f.alias = alias,
		}
		self
	}

	pub fn field_ref(&self) -> &FieldRef {
		match self {
			DataField::Column(c) => &c.field,
			DataField::Formatted(f) => &f.field,
		}
	}

	/// Column name, without owner or alias
	pub fn name(&self) -> &str {
		&self.field_ref().name
	}

	pub fn alias(&self) -> Option<&str> {
		match self {
			DataField::Column(c) => c.alias.as_deref(),
			DataField::Formatted(f) => f.alias.as_deref(),
		}
	}

	pub fn is_formatted(&self) -> bool {
		matches!(self, DataField::Formatted(_))
	}

	/// Whether both fields project the same value, ignoring alias
	///
	/// Owners must agree once an unqualified name is read as belonging to
	/// `default_owner`. Formatted fields also need the same formatter, and a
	/// formatted field never matches a plain column.
	pub(crate) fn same_column(&self, other: &DataField, default_owner: Option<&str>) -> bool {
		let (a, b) = (self.field_ref(), other.field_ref());
		if a.name != b.name || a.owner.as_deref().or(default_owner) != b.owner.as_deref().or(default_owner) {
			return false;
		}
		match (self, other) {
			(DataField::Column(_), DataField::Column(_)) => true,
			(DataField::Formatted(x), DataField::Formatted(y)) => x.formatter == y.formatter,
			_ => false,
		}
	}
}

impl From<&str> for DataField {
	fn from(s: &str) -> Self {
		DataField::column(s)
	}
}

impl From<FieldRef> for DataField {
	fn from(field: FieldRef) -> Self {
		DataField::column(field)
	}
}

/// One ORDER BY entry; the position in the sort list is its priority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortEntry {
	pub field: DataField,
	pub desc: bool,
}

impl SortEntry {
	pub fn asc(field: impl Into<DataField>) -> Self {
		Self {
			field: field.into(),
			desc: false,
		}
	}

	pub fn desc(field: impl Into<DataField>) -> Self {
		Self {
			field: field.into(),
			desc: true,
		}
	}
}

/// Anything a projection or grouping closure may return
///
/// Implemented for single fields, arrays and vectors of [`DataField`], and
/// tuples of up to six field-like values.
pub trait IntoDataFields {
	fn into_data_fields(self) -> Vec<DataField>;
}

impl IntoDataFields for DataField {
	fn into_data_fields(self) -> Vec<DataField> {
		vec![self]
	}
}

impl IntoDataFields for Vec<DataField> {
	fn into_data_fields(self) -> Vec<DataField> {
		self
	}
}

impl<const N: usize> IntoDataFields for [DataField; N] {
	fn into_data_fields(self) -> Vec<DataField> {
		self.into()
	}
}

macro_rules! impl_into_data_fields_for_tuple {
	($($name:ident),+) => {
		impl<$($name: Into<DataField>),+> IntoDataFields for ($($name,)+) {
			#[allow(non_snake_case)]
			fn into_data_fields(self) -> Vec<DataField> {
				let ($($name,)+) = self;
				vec![$($name.into()),+]
			}
		}
	};
}

impl_into_data_fields_for_tuple!(A, B);
impl_into_data_fields_for_tuple!(A, B, C);
impl_into_data_fields_for_tuple!(A, B, C, D);
impl_into_data_fields_for_tuple!(A, B, C, D, E);
impl_into_data_fields_for_tuple!(A, B, C, D, E, F);
