//! Model descriptors and typed column references
//!
//! Field reflection is owned by whoever implements [`Model`]; this crate
//! only asks a model for its name, its column names and the columns an
//! executor always needs (primary keys by default).
//!
//! # Examples
//!
//! ```
//! use reinhardt_queryable_core::{Field, Model};
//!
//! struct Order;
//!
//! #[derive(Clone, Copy)]
//! struct OrderFields {
//!     id: Field<Order, i64>,
//!     total: Field<Order, f64>,
//! }
//!
//! impl Model for Order {
//!     type Fields = OrderFields;
//!     fn model_name() -> &'static str { "Order" }
//!     fn new_fields() -> Self::Fields {
//!         OrderFields { id: Field::new("id"), total: Field::new("total") }
//!     }
//!     fn field_names() -> &'static [&'static str] { &["id", "total"] }
//! }
//!
//! let criterion = Order::new_fields().total.gt(100.0);
//! assert_eq!(criterion.field.to_string(), "Order.total");
//! ```

use crate::condition::{Criterion, CriterionOperator, CriterionValue};
use crate::context::QueryContext;
use crate::field::{DataField, FieldRef, IntoDataFields, SortEntry};
use crate::queryable::Queryable;
use crate::value::Value;
use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A queryable entity type
pub trait Model: Send + Sync + 'static {
	/// Typed column references handed to query closures
	type Fields;

	/// Name used to qualify field references
	fn model_name() -> &'static str;

	fn new_fields() -> Self::Fields;

	/// Every column known for this model, in declaration order
	fn field_names() -> &'static [&'static str];

	fn primary_keys() -> &'static [&'static str] {
		&["id"]
	}

	/// Columns that are always projected when requested, regardless of exclusions
	fn necessary_fields() -> &'static [&'static str] {
		Self::primary_keys()
	}

	/// Start a query over this model
	fn query() -> Queryable<(Self,)>
	where
		Self: Sized,
	{
		Queryable::new()
	}
}

/// Runtime descriptor of a [`Model`] type
#[derive(Clone, Copy)]
pub struct ModelType {
	id: TypeId,
	name: &'static str,
	fields: fn() -> &'static [&'static str],
	necessary: fn() -> &'static [&'static str],
}

impl ModelType {
	pub fn of<M: Model>() -> Self {
		Self {
			id: TypeId::of::<M>(),
			name: M::model_name(),
			fields: M::field_names,
			necessary: M::necessary_fields,
		}
	}

	pub fn type_id(&self) -> TypeId {
		self.id
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn is<M: Model>(&self) -> bool {
		self.id == TypeId::of::<M>()
	}

	pub fn all_fields(&self) -> Vec<DataField> {
		(self.fields)().iter().map(|name| DataField::column(*name)).collect()
	}

	pub fn necessary_fields(&self) -> Vec<DataField> {
		(self.necessary)()
			.iter()
			.map(|name| DataField::column(*name))
			.collect()
	}
}

impl PartialEq for ModelType {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for ModelType {}

impl fmt::Debug for ModelType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ModelType").field(&self.name).finish()
	}
}

/// Typed reference to a column of model `M` holding values of type `V`
pub struct Field<M, V> {
	name: &'static str,
	_marker: PhantomData<fn() -> (M, V)>,
}

impl<M, V> Clone for Field<M, V> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<M, V> Copy for Field<M, V> {}

impl<M, V> fmt::Debug for Field<M, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Field").field(&self.name).finish()
	}
}

impl<M: Model, V> Field<M, V> {
	pub const fn new(name: &'static str) -> Self {
		Self {
			name,
			_marker: PhantomData,
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn field_ref(&self) -> FieldRef {
		FieldRef::qualified(M::model_name(), self.name)
	}

	pub fn asc(&self) -> SortEntry {
		SortEntry::asc(self.field_ref())
	}

	pub fn desc(&self) -> SortEntry {
		SortEntry::desc(self.field_ref())
	}

	/// Projection through an executor-side formatter
	pub fn formatted(&self, formatter: impl Into<String>) -> DataField {
		DataField::formatted(self.field_ref(), formatter)
	}

	pub fn alias(&self, alias: impl Into<String>) -> DataField {
		DataField::column(self.field_ref()).with_alias(alias)
	}

	pub fn is_null(&self) -> Criterion {
		Criterion::unary(self.field_ref(), CriterionOperator::IsNull)
	}

	pub fn not_null(&self) -> Criterion {
		Criterion::unary(self.field_ref(), CriterionOperator::NotNull)
	}

	/// Compare against a column of another (or the same) model
	pub fn eq_field<N: Model>(&self, other: Field<N, V>) -> Criterion {
		Criterion::new(
			self.field_ref(),
			CriterionOperator::Equal,
			CriterionValue::Field(other.field_ref()),
		)
	}

	pub fn in_subquery(&self, query: impl Into<QueryContext>) -> Criterion {
		Criterion::new(
			self.field_ref(),
			CriterionOperator::In,
			CriterionValue::Subquery(Arc::new(query.into())),
		)
	}

	pub fn not_in_subquery(&self, query: impl Into<QueryContext>) -> Criterion {
		Criterion::new(
			self.field_ref(),
			CriterionOperator::NotIn,
			CriterionValue::Subquery(Arc::new(query.into())),
		)
	}
}

impl<M: Model, V: Into<Value>> Field<M, V> {
	fn compare<T: Into<V>>(&self, operator: CriterionOperator, value: T) -> Criterion {
		let value: V = value.into();
		Criterion::new(self.field_ref(), operator, CriterionValue::Value(value.into()))
	}

	pub fn eq<T: Into<V>>(&self, value: T) -> Criterion {
		self.compare(CriterionOperator::Equal, value)
	}

	pub fn ne<T: Into<V>>(&self, value: T) -> Criterion {
		self.compare(CriterionOperator::NotEqual, value)
	}

	pub fn gt<T: Into<V>>(&self, value: T) -> Criterion {
		self.compare(CriterionOperator::GreaterThan, value)
	}

	pub fn gte<T: Into<V>>(&self, value: T) -> Criterion {
		self.compare(CriterionOperator::GreaterThanOrEqual, value)
	}

	pub fn lt<T: Into<V>>(&self, value: T) -> Criterion {
		self.compare(CriterionOperator::LessThan, value)
	}

	pub fn lte<T: Into<V>>(&self, value: T) -> Criterion {
		self.compare(CriterionOperator::LessThanOrEqual, value)
	}

	pub fn is_in<T: Into<V>>(&self, values: impl IntoIterator<Item = T>) -> Criterion {
		let values = values.into_iter().map(|v| v.into().into());
		Criterion::list(self.field_ref(), CriterionOperator::In, values.collect::<Vec<Value>>())
	}

	pub fn not_in<T: Into<V>>(&self, values: impl IntoIterator<Item = T>) -> Criterion {
		let values = values.into_iter().map(|v| v.into().into());
		Criterion::list(
			self.field_ref(),
			CriterionOperator::NotIn,
			values.collect::<Vec<Value>>(),
		)
	}
}

impl<M: Model> Field<M, String> {
	/// Contains `pattern`
	pub fn like(&self, pattern: impl Into<String>) -> Criterion {
		self.compare(CriterionOperator::Like, pattern.into())
	}

	pub fn begin_like(&self, prefix: impl Into<String>) -> Criterion {
		self.compare(CriterionOperator::BeginLike, prefix.into())
	}

	pub fn end_like(&self, suffix: impl Into<String>) -> Criterion {
		self.compare(CriterionOperator::EndLike, suffix.into())
	}
}

impl<M: Model> Field<M, bool> {
	pub fn is_true(&self) -> Criterion {
		Criterion::unary(self.field_ref(), CriterionOperator::True)
	}

	pub fn is_false(&self) -> Criterion {
		Criterion::unary(self.field_ref(), CriterionOperator::False)
	}
}

impl<M: Model, V> From<Field<M, V>> for DataField {
	fn from(field: Field<M, V>) -> Self {
		DataField::column(field.field_ref())
	}
}

impl<M: Model, V> IntoDataFields for Field<M, V> {
	fn into_data_fields(self) -> Vec<DataField> {
		vec![self.into()]
	}
}

impl<M: Model, V> From<Field<M, V>> for FieldRef {
	fn from(field: Field<M, V>) -> Self {
		field.field_ref()
	}
}
