//! Condition model: single criteria and connector-joined groups
//!
//! Every [`Condition`] records the [`Connector`] that joins it to the entry
//! before it in its containing list, so one list can mix AND and OR. The
//! connector of the first entry in a list is not used.
//!
//! # Examples
//!
//! ```
//! use reinhardt_queryable_core::{Condition, Criterion, CriterionOperator};
//!
//! // (status = 'active') AND (name LIKE 'a%' OR email LIKE 'a%')
//! let search = Condition::from(Criterion::new("name", CriterionOperator::BeginLike, "a"))
//!     .or(Criterion::new("email", CriterionOperator::BeginLike, "a"));
//! let condition = Condition::from(Criterion::new("status", CriterionOperator::Equal, "active"))
//!     .and(search);
//!
//! assert_eq!(condition.len(), 2);
//! ```

use crate::context::QueryContext;
use crate::field::FieldRef;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Boolean connector between conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Connector {
	#[default]
	And,
	Or,
}

/// Comparison applied by a [`Criterion`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CriterionOperator {
	Equal,
	NotEqual,
	LessThan,
	LessThanOrEqual,
	GreaterThan,
	GreaterThanOrEqual,
	In,
	NotIn,
	/// Contains the value
	Like,
	NotLike,
	/// Starts with the value
	BeginLike,
	NotBeginLike,
	/// Ends with the value
	EndLike,
	NotEndLike,
	IsNull,
	NotNull,
	True,
	False,
}

impl CriterionOperator {
	/// The operator matching exactly the rows this one rejects
	pub fn negated(self) -> Self {
		use CriterionOperator::*;
		match self {
			Equal => NotEqual,
			NotEqual => Equal,
			LessThan => GreaterThanOrEqual,
			LessThanOrEqual => GreaterThan,
			GreaterThan => LessThanOrEqual,
			GreaterThanOrEqual => LessThan,
			In => NotIn,
			NotIn => In,
			Like => NotLike,
			NotLike => Like,
			BeginLike => NotBeginLike,
			NotBeginLike => BeginLike,
			EndLike => NotEndLike,
			NotEndLike => EndLike,
			IsNull => NotNull,
			NotNull => IsNull,
			True => False,
			False => True,
		}
	}

	/// Operators that take no right-hand value
	pub fn is_unary(self) -> bool {
		matches!(
			self,
			CriterionOperator::IsNull
				| CriterionOperator::NotNull
				| CriterionOperator::True
				| CriterionOperator::False
		)
	}
}

/// Right-hand side of a criterion
#[derive(Debug, Clone, PartialEq)]
pub enum CriterionValue {
	/// Unary operators carry no value
	None,
	Value(Value),
	List(Vec<Value>),
	/// Field-to-field comparison (join connections, `WHERE a.x = b.y`)
	Field(FieldRef),
	/// Sub-query predicate, e.g. `author_id IN (SELECT id ...)`
	Subquery(Arc<QueryContext>),
}

impl CriterionValue {
	pub fn is_subquery(&self) -> bool {
		matches!(self, CriterionValue::Subquery(_))
	}

	fn deep_clone(&self) -> Self {
		match self {
			CriterionValue::Subquery(query) => CriterionValue::Subquery(Arc::new(query.deep_clone())),
			other => other.clone(),
		}
	}
}

macro_rules! criterion_value_from {
	($($ty:ty),+ $(,)?) => {
		$(
			impl From<$ty> for CriterionValue {
				fn from(value: $ty) -> Self {
					CriterionValue::Value(value.into())
				}
			}
		)+
	};
}

criterion_value_from!(
	Value,
	bool,
	i32,
	i64,
	u32,
	f64,
	&str,
	String,
	rust_decimal::Decimal,
	uuid::Uuid,
	chrono::NaiveDate,
	chrono::DateTime<chrono::Utc>,
);

impl From<FieldRef> for CriterionValue {
	fn from(field: FieldRef) -> Self {
		CriterionValue::Field(field)
	}
}

/// A single field/operator/value predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
	pub connector: Connector,
	pub field: FieldRef,
	pub operator: CriterionOperator,
	pub value: CriterionValue,
	pub negated: bool,
}

impl Criterion {
	pub fn new(
		field: impl Into<FieldRef>,
		operator: CriterionOperator,
		value: impl Into<CriterionValue>,
	) -> Self {
		Self {
			connector: Connector::And,
			field: field.into(),
			operator,
			value: value.into(),
			negated: false,
		}
	}

	/// Criterion for a unary operator such as `IsNull`
	pub fn unary(field: impl Into<FieldRef>, operator: CriterionOperator) -> Self {
		Self::new(field, operator, CriterionValue::None)
	}

	pub fn list<V: Into<Value>>(
		field: impl Into<FieldRef>,
		operator: CriterionOperator,
		values: impl IntoIterator<Item = V>,
	) -> Self {
		let values = values.into_iter().map(Into::into).collect();
		Self::new(field, operator, CriterionValue::List(values))
	}

	/// Operator as it should be applied, taking the negation flag into account
	pub fn effective_operator(&self) -> CriterionOperator {
		if self.negated {
			self.operator.negated()
		} else {
			self.operator
		}
	}
}

/// An ordered list of conditions evaluated as one unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionGroup {
	pub connector: Connector,
	pub conditions: Vec<Condition>,
	pub negated: bool,
}

impl ConditionGroup {
	/// Group whose members are all joined by `connector`
	pub fn joined(connector: Connector, conditions: impl IntoIterator<Item = Condition>) -> Self {
		Self {
			connector: Connector::And,
			conditions: conditions
				.into_iter()
				.map(|c| c.with_connector(connector))
				.collect(),
			negated: false,
		}
	}

	/// Group that keeps the connector each condition already carries
	pub fn from_entries(conditions: impl IntoIterator<Item = Condition>) -> Self {
		Self {
			connector: Connector::And,
			conditions: conditions.into_iter().collect(),
			negated: false,
		}
	}

	/// Whether appending with `connector` keeps the group's meaning
	fn extends_with(&self, connector: Connector) -> bool {
		!self.negated
			&& self
				.conditions
				.iter()
				.skip(1)
				.all(|c| c.connector() == connector)
	}

	pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
		Self::joined(Connector::And, conditions)
	}

	pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
		Self::joined(Connector::Or, conditions)
	}
}

/// A predicate: either a single criterion or a nested group
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
	Criterion(Criterion),
	Group(ConditionGroup),
}

impl Condition {
	/// Connector joining this condition to its predecessor
	pub fn connector(&self) -> Connector {
		match self {
			Condition::Criterion(c) => c.connector,
			Condition::Group(g) => g.connector,
		}
	}

	#[must_use]
	pub fn with_connector(mut self, connector: Connector) -> Self {
		match &mut self {
			Condition::Criterion(c) => c.connector = connector,
			Condition::Group(g) => g.connector = connector,
		}
		self
	}

	/// Combine with `other` using AND
	#[must_use]
	pub fn and(self, other: impl Into<Condition>) -> Self {
		self.combine(Connector::And, other.into())
	}

	/// Combine with `other` using OR
	#[must_use]
	pub fn or(self, other: impl Into<Condition>) -> Self {
		self.combine(Connector::Or, other.into())
	}

	fn combine(self, connector: Connector, other: Condition) -> Self {
		match self {
			// Extend a group already joined by `connector`; anything else nests
			Condition::Group(mut group) if group.extends_with(connector) => {
				group.conditions.push(other.with_connector(connector));
				Condition::Group(group)
			}
			first => {
				let outer = first.connector();
				Condition::Group(ConditionGroup {
					connector: outer,
					conditions: vec![first, other.with_connector(connector)],
					negated: false,
				})
			}
		}
	}

	/// Flip the negation flag; children are left untouched
	#[must_use]
	pub fn negate(mut self) -> Self {
		match &mut self {
			Condition::Criterion(c) => c.negated = !c.negated,
			Condition::Group(g) => g.negated = !g.negated,
		}
		self
	}

	pub fn is_negated(&self) -> bool {
		match self {
			Condition::Criterion(c) => c.negated,
			Condition::Group(g) => g.negated,
		}
	}

	/// Number of direct members (1 for a criterion)
	pub fn len(&self) -> usize {
		match self {
			Condition::Criterion(_) => 1,
			Condition::Group(g) => g.conditions.len(),
		}
	}

	/// True for a group with no criteria anywhere below it
	pub fn is_empty(&self) -> bool {
		match self {
			Condition::Criterion(_) => false,
			Condition::Group(g) => g.conditions.iter().all(Condition::is_empty),
		}
	}

	/// Whether a sub-query appears anywhere in this condition
	pub fn contains_subquery(&self) -> bool {
		match self {
			Condition::Criterion(c) => c.value.is_subquery(),
			Condition::Group(g) => g.conditions.iter().any(Condition::contains_subquery),
		}
	}

	/// Every field this condition mentions, field-valued right-hand sides included
	pub fn referenced_fields(&self) -> Vec<&FieldRef> {
		let mut fields = Vec::new();
		self.collect_fields(&mut fields);
		fields
	}

	fn collect_fields<'a>(&'a self, out: &mut Vec<&'a FieldRef>) {
		match self {
			Condition::Criterion(c) => {
				out.push(&c.field);
				if let CriterionValue::Field(other) = &c.value {
					out.push(other);
				}
			}
			Condition::Group(g) => g.conditions.iter().for_each(|c| c.collect_fields(out)),
		}
	}

	/// Copy that re-allocates every nested sub-query
	pub fn deep_clone(&self) -> Self {
		match self {
			Condition::Criterion(c) => Condition::Criterion(Criterion {
				value: c.value.deep_clone(),
				..c.clone()
			}),
			Condition::Group(g) => Condition::Group(ConditionGroup {
				connector: g.connector,
				conditions: g.conditions.iter().map(Condition::deep_clone).collect(),
				negated: g.negated,
			}),
		}
	}
}

impl From<Criterion> for Condition {
	fn from(criterion: Criterion) -> Self {
		Condition::Criterion(criterion)
	}
}

impl From<ConditionGroup> for Condition {
	fn from(group: ConditionGroup) -> Self {
		Condition::Group(group)
	}
}
