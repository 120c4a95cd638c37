//! Typed fluent query builder
//!
//! [`Queryable<S>`] is a zero-cost typed view over one owned
//! [`QueryContext`]. `S` is the tuple of source models; closures receive the
//! [`Model::Fields`] of the sources they refer to, so every predicate and
//! selector is checked at compile time. Builders consume and return the
//! queryable; joins return a queryable of one more source wrapping the same
//! context.
//!
//! # Examples
//!
//! ```
//! use reinhardt_queryable_core::prelude::*;
//!
//! struct Order;
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
//! let query = Order::query()
//!     .filter(|o| o.total.gt(100.0))
//!     .order_by_desc(|o| o.id)
//!     .take(20, 0);
//!
//! assert_eq!(query.context().conditions().len(), 1);
//! assert_eq!(query.context().take_count(), Some(20));
//! ```

mod sources;
mod terminal;

pub use sources::{Append, HasSource, I0, I1, I2, I3, I4, I5, I6, SourceList};

use crate::combine::CombineType;
use crate::condition::{Condition, Connector};
use crate::context::QueryContext;
use crate::error::{QueryError, Result};
use crate::field::{DataField, FieldRef, IntoDataFields, SortEntry};
use crate::flags::{ExecutionMode, IsolationLevel, OutputType, ScriptType};
use crate::join::JoinType;
use crate::model::{Model, ModelType};
use crate::paging::PagingFilter;
use crate::repository::RepositoryBinding;
use crate::split::SplitTableBehavior;
use crate::translator::{ExpressionTranslator, TextTranslator};
use crate::tree::TreeDirection;
use crate::value::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed column references of the primary source
pub type PrimaryFields<S> = <<S as SourceList>::Primary as Model>::Fields;

/// Fluent, typed view over a [`QueryContext`]
pub struct Queryable<S> {
	context: QueryContext,
	_sources: PhantomData<fn() -> S>,
}

impl<M: Model> Queryable<(M,)> {
	/// Start a query over `M`
	pub fn new() -> Self {
		Self::wrap(QueryContext::for_model::<M>())
	}
}

impl<M: Model> Default for Queryable<(M,)> {
	fn default() -> Self {
		Self::new()
	}
}

impl<S: SourceList> Queryable<S> {
	fn wrap(context: QueryContext) -> Self {
		Self {
			context,
			_sources: PhantomData,
		}
	}

	/// Re-type an existing context, binding it to the primary source
	pub fn from_context(mut context: QueryContext) -> Result<Self> {
		context.bind_model_type(ModelType::of::<S::Primary>())?;
		Ok(Self::wrap(context))
	}

	/// Number of typed sources
	pub fn arity(&self) -> usize {
		S::ARITY
	}

	pub fn model_types(&self) -> Vec<ModelType> {
		S::model_types()
	}

	pub fn context(&self) -> &QueryContext {
		&self.context
	}

	pub fn context_mut(&mut self) -> &mut QueryContext {
		&mut self.context
	}

	pub fn into_context(self) -> QueryContext {
		self.context
	}

	/// Copy sharing sub-queries with this one
	pub fn light_clone(&self) -> Self {
		Self::wrap(self.context.light_clone())
	}

	/// Fully independent copy
	pub fn deep_clone(&self) -> Self {
		Self::wrap(self.context.deep_clone())
	}

	fn check_source(&self, field: &FieldRef) -> Result<()> {
		match &field.owner {
			Some(owner) if !S::model_types().iter().any(|m| m.name() == owner) => {
				Err(QueryError::UnknownSource(owner.clone()))
			}
			_ => Ok(()),
		}
	}

	// ----- conditions -----

	/// Connector used by later `filter*` calls; AND until changed
	pub fn default_connector(mut self, connector: Connector) -> Self {
		self.context.set_connector(connector);
		self
	}

	/// Add a predicate over the primary source, joined with the default connector
	pub fn filter<C: Into<Condition>>(mut self, predicate: impl FnOnce(PrimaryFields<S>) -> C) -> Self {
		self.context.add_condition(predicate(S::Primary::new_fields()));
		self
	}

	/// Add a predicate over the primary source, joined with OR
	pub fn or_filter<C: Into<Condition>>(mut self, predicate: impl FnOnce(PrimaryFields<S>) -> C) -> Self {
		let condition: Condition = predicate(S::Primary::new_fields()).into();
		self.context.add_conditions(Connector::Or, [condition]);
		self
	}

	/// Add a predicate over any source, e.g. `filter_on::<Customer, _, _>(...)`
	pub fn filter_on<M, I, C>(mut self, predicate: impl FnOnce(M::Fields) -> C) -> Self
	where
		M: Model,
		S: HasSource<M, I>,
		C: Into<Condition>,
	{
		self.context.add_condition(predicate(M::new_fields()));
		self
	}

	/// Add a prebuilt condition, keeping its own connector
	pub fn filter_condition(mut self, condition: impl Into<Condition>) -> Self {
		let condition: Condition = condition.into();
		self.context.add_conditions(condition.connector(), [condition]);
		self
	}

	/// Add a textual predicate, translated by [`TextTranslator`]
	pub fn filter_expr(self, expression: &str) -> Result<Self> {
		self.filter_expr_with(&TextTranslator, expression)
	}

	pub fn filter_expr_with(mut self, translator: &dyn ExpressionTranslator, expression: &str) -> Result<Self> {
		let condition = translator.translate_predicate(expression, Connector::And)?;
		for field in condition.referenced_fields() {
			self.check_source(field)?;
		}
		self.context.add_condition(condition);
		Ok(self)
	}

	/// Post-aggregation filter over the primary source
	pub fn having<C: Into<Condition>>(mut self, predicate: impl FnOnce(PrimaryFields<S>) -> C) -> Self {
		self.context
			.add_having_condition(predicate(S::Primary::new_fields()));
		self
	}

	// ----- sorting -----

	pub fn order_by<F: Into<DataField>>(mut self, selector: impl FnOnce(PrimaryFields<S>) -> F) -> Self {
		self.context
			.add_sort(SortEntry::asc(selector(S::Primary::new_fields())));
		self
	}

	pub fn order_by_desc<F: Into<DataField>>(mut self, selector: impl FnOnce(PrimaryFields<S>) -> F) -> Self {
		self.context
			.add_sort(SortEntry::desc(selector(S::Primary::new_fields())));
		self
	}

	/// Sort by a column of any source: `order_by_on::<Customer, _>(|c| c.name.desc())`
	pub fn order_by_on<M, I>(mut self, sort: impl FnOnce(M::Fields) -> SortEntry) -> Self
	where
		M: Model,
		S: HasSource<M, I>,
	{
		self.context.add_sort(sort(M::new_fields()));
		self
	}

	// ----- projection and grouping -----

	pub fn select<D: IntoDataFields>(mut self, selector: impl FnOnce(PrimaryFields<S>) -> D) -> Self {
		let fields = selector(S::Primary::new_fields()).into_data_fields();
		self.context.select_fields(fields);
		self
	}

	pub fn select_on<M, I, D>(mut self, selector: impl FnOnce(M::Fields) -> D) -> Self
	where
		M: Model,
		S: HasSource<M, I>,
		D: IntoDataFields,
	{
		self.context
			.select_fields(selector(M::new_fields()).into_data_fields());
		self
	}

	/// Select comma separated textual selectors, e.g. `"id, lower(name) AS n"`
	pub fn select_expr(self, selectors: &str) -> Result<Self> {
		self.select_expr_with(&TextTranslator, selectors)
	}

	pub fn select_expr_with(mut self, translator: &dyn ExpressionTranslator, selectors: &str) -> Result<Self> {
		let fields = selectors
			.split(',')
			.map(|selector| translator.translate_field(selector))
			.collect::<Result<Vec<_>>>()?;
		for field in &fields {
			self.check_source(field.field_ref())?;
		}
		self.context.select_fields(fields);
		Ok(self)
	}

	pub fn unselect<D: IntoDataFields>(mut self, selector: impl FnOnce(PrimaryFields<S>) -> D) -> Self {
		let fields = selector(S::Primary::new_fields()).into_data_fields();
		self.context.unselect_fields(fields);
		self
	}

	pub fn unselect_on<M, I, D>(mut self, selector: impl FnOnce(M::Fields) -> D) -> Self
	where
		M: Model,
		S: HasSource<M, I>,
		D: IntoDataFields,
	{
		self.context
			.unselect_fields(selector(M::new_fields()).into_data_fields());
		self
	}

	pub fn group_by<D: IntoDataFields>(mut self, selector: impl FnOnce(PrimaryFields<S>) -> D) -> Self {
		let fields = selector(S::Primary::new_fields()).into_data_fields();
		self.context.group_by(fields);
		self
	}

	// ----- joins -----

	fn join_with<N: Model>(
		mut self,
		join_type: JoinType,
		target: Queryable<(N,)>,
		connection: Option<Condition>,
	) -> Queryable<<S as Append<N>>::Output>
	where
		S: Append<N>,
	{
		self.context
			.add_join(join_type, target.into_context(), connection);
		Queryable::wrap(self.context)
	}

	/// Inner join `target`, connected to the primary source by `on`
	pub fn inner_join<N, C>(
		self,
		target: Queryable<(N,)>,
		on: impl FnOnce(PrimaryFields<S>, N::Fields) -> C,
	) -> Queryable<<S as Append<N>>::Output>
	where
		N: Model,
		C: Into<Condition>,
		S: Append<N>,
	{
		let connection = on(S::Primary::new_fields(), N::new_fields()).into();
		self.join_with(JoinType::InnerJoin, target, Some(connection))
	}

	pub fn left_join<N, C>(
		self,
		target: Queryable<(N,)>,
		on: impl FnOnce(PrimaryFields<S>, N::Fields) -> C,
	) -> Queryable<<S as Append<N>>::Output>
	where
		N: Model,
		C: Into<Condition>,
		S: Append<N>,
	{
		let connection = on(S::Primary::new_fields(), N::new_fields()).into();
		self.join_with(JoinType::LeftJoin, target, Some(connection))
	}

	pub fn right_join<N, C>(
		self,
		target: Queryable<(N,)>,
		on: impl FnOnce(PrimaryFields<S>, N::Fields) -> C,
	) -> Queryable<<S as Append<N>>::Output>
	where
		N: Model,
		C: Into<Condition>,
		S: Append<N>,
	{
		let connection = on(S::Primary::new_fields(), N::new_fields()).into();
		self.join_with(JoinType::RightJoin, target, Some(connection))
	}

	pub fn full_join<N, C>(
		self,
		target: Queryable<(N,)>,
		on: impl FnOnce(PrimaryFields<S>, N::Fields) -> C,
	) -> Queryable<<S as Append<N>>::Output>
	where
		N: Model,
		C: Into<Condition>,
		S: Append<N>,
	{
		let connection = on(S::Primary::new_fields(), N::new_fields()).into();
		self.join_with(JoinType::FullJoin, target, Some(connection))
	}

	pub fn cross_join<N>(self, target: Queryable<(N,)>) -> Queryable<<S as Append<N>>::Output>
	where
		N: Model,
		S: Append<N>,
	{
		self.join_with(JoinType::CrossJoin, target, None)
	}

	/// Join `target` to the source `M` rather than the primary one
	pub fn join_on<M, I, N, C>(
		self,
		join_type: JoinType,
		target: Queryable<(N,)>,
		on: impl FnOnce(M::Fields, N::Fields) -> C,
	) -> Queryable<<S as Append<N>>::Output>
	where
		M: Model,
		N: Model,
		C: Into<Condition>,
		S: HasSource<M, I> + Append<N>,
	{
		let connection = match join_type {
			JoinType::CrossJoin => None,
			_ => Some(on(M::new_fields(), N::new_fields()).into()),
		};
		self.join_with(join_type, target, connection)
	}

	// ----- set combinations -----

	fn combine_with(mut self, combine_type: CombineType, other: Queryable<S>) -> Self {
		self.context.add_combine(combine_type, other.into_context());
		self
	}

	pub fn union(self, other: Queryable<S>) -> Self {
		self.combine_with(CombineType::Union, other)
	}

	pub fn union_all(self, other: Queryable<S>) -> Self {
		self.combine_with(CombineType::UnionAll, other)
	}

	pub fn except(self, other: Queryable<S>) -> Self {
		self.combine_with(CombineType::Except, other)
	}

	pub fn intersect(self, other: Queryable<S>) -> Self {
		self.combine_with(CombineType::Intersect, other)
	}

	// ----- paging and flags -----

	/// Keep `take` rows after skipping `skip`
	pub fn take(mut self, take: i64, skip: i64) -> Self {
		self.context.take(Some(take), skip);
		self
	}

	pub fn paginate(mut self, filter: PagingFilter) -> Self {
		self.context.paginate(filter);
		self
	}

	pub fn distinct(mut self) -> Self {
		self.context.distinct();
		self
	}

	/// Toggle negation of the whole predicate
	pub fn negate(mut self) -> Self {
		self.context.negate();
		self
	}

	pub fn include_archived(mut self) -> Self {
		self.context.include_archived();
		self
	}

	pub fn unisolated(mut self) -> Self {
		self.context.unisolated();
		self
	}

	pub fn output(mut self, output_type: OutputType) -> Self {
		self.context.output(output_type);
		self
	}

	pub fn execution_mode(mut self, mode: ExecutionMode) -> Self {
		self.context.set_execution_mode(mode);
		self
	}

	/// Run `text` instead of a generated script
	pub fn script(
		mut self,
		text: impl Into<String>,
		script_type: ScriptType,
		parameters: impl IntoIterator<Item = (String, Value)>,
	) -> Self {
		self.context.set_script(text, script_type, parameters);
		self
	}

	pub fn split_table(mut self, behavior: SplitTableBehavior) -> Self {
		self.context.split_table(behavior);
		self
	}

	/// Match rows recursively through `(data_field, parent_field)` of the primary source
	pub fn tree_matching<D, P>(
		mut self,
		fields: impl FnOnce(PrimaryFields<S>) -> (D, P),
		direction: TreeDirection,
	) -> Self
	where
		D: Into<DataField>,
		P: Into<DataField>,
	{
		let (data_field, parent_field) = fields(S::Primary::new_fields());
		self.context
			.tree_matching(data_field, parent_field, direction);
		self
	}

	/// Select from `source` as a derived table
	pub fn from_queryable<T: SourceList>(mut self, source: Queryable<T>) -> Self {
		self.context.from_queryable(source.into_context());
		self
	}

	pub fn isolation(mut self, level: IsolationLevel) -> Self {
		self.context.set_isolation_level(level);
		self
	}

	pub fn bind_repository(mut self, binding: Arc<RepositoryBinding>) -> Self {
		self.context.bind_repository(binding);
		self
	}
}

impl<A: Model, B: Model> Queryable<(A, B)> {
	/// Predicate over both sources of a two-source query
	pub fn filter_pair<C: Into<Condition>>(mut self, predicate: impl FnOnce(A::Fields, B::Fields) -> C) -> Self {
		self.context
			.add_condition(predicate(A::new_fields(), B::new_fields()));
		self
	}
}

impl<S: SourceList> Clone for Queryable<S> {
	/// Light clone, see [`QueryContext::light_clone`]
	fn clone(&self) -> Self {
		self.light_clone()
	}
}

impl<S: SourceList> fmt::Debug for Queryable<S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Queryable")
			.field("sources", &S::model_types())
			.field("context", &self.context)
			.finish()
	}
}

impl<S> From<Queryable<S>> for QueryContext {
	fn from(query: Queryable<S>) -> Self {
		query.context
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::condition::{CriterionOperator, CriterionValue};
	use crate::model::Field;
	use rstest::rstest;

	struct Post;
	struct PostFields {
		id: Field<Post, i64>,
		title: Field<Post, String>,
		author_id: Field<Post, i64>,
		parent_id: Field<Post, i64>,
	}

	impl Model for Post {
		type Fields = PostFields;

		fn model_name() -> &'static str {
			"Post"
		}

		fn new_fields() -> Self::Fields {
			PostFields {
				id: Field::new("id"),
				title: Field::new("title"),
				author_id: Field::new("author_id"),
				parent_id: Field::new("parent_id"),
			}
		}

		fn field_names() -> &'static [&'static str] {
			&["id", "title", "author_id", "parent_id"]
		}
	}

	struct Author;
	struct AuthorFields {
		id: Field<Author, i64>,
		name: Field<Author, String>,
	}

	impl Model for Author {
		type Fields = AuthorFields;

		fn model_name() -> &'static str {
			"Author"
		}

		fn new_fields() -> Self::Fields {
			AuthorFields {
				id: Field::new("id"),
				name: Field::new("name"),
			}
		}

		fn field_names() -> &'static [&'static str] {
			&["id", "name"]
		}
	}

	#[rstest]
	fn test_filter_connectors() {
		let query = Post::query()
			.filter(|p| p.id.gt(1))
			.or_filter(|p| p.title.like("rust"));

		let conditions = query.context().conditions();
		assert_eq!(conditions.len(), 2);
		assert_eq!(conditions[0].connector(), Connector::And);
		assert_eq!(conditions[1].connector(), Connector::Or);
	}

	#[rstest]
	fn test_default_connector_joins_later_filters() {
		let query = Post::query()
			.filter(|p| p.id.gt(1))
			.default_connector(Connector::Or)
			.filter(|p| p.id.lt(0))
			.filter_condition(Condition::from(Post::new_fields().title.eq("rust")).with_connector(Connector::And));

		let conditions = query.context().conditions();
		assert_eq!(query.context().connector(), Connector::Or);
		assert_eq!(conditions[0].connector(), Connector::And);
		assert_eq!(conditions[1].connector(), Connector::Or);
		assert_eq!(conditions[2].connector(), Connector::And);
	}

	#[rstest]
	fn test_join_increases_arity_and_keeps_state() {
		let base = Post::query()
			.filter(|p| p.id.gt(1))
			.order_by(|p| p.title);
		assert_eq!(base.arity(), 1);

		let joined = base.inner_join(Author::query(), |p, a| p.author_id.eq_field(a.id));
		assert_eq!(joined.arity(), 2);
		assert_eq!(joined.model_types(), vec![ModelType::of::<Post>(), ModelType::of::<Author>()]);
		assert_eq!(joined.context().conditions().len(), 1);
		assert_eq!(joined.context().sorts().len(), 1);
		assert_eq!(joined.context().joins()[0].join_type, JoinType::InnerJoin);
	}

	#[rstest]
	fn test_filter_on_second_source() {
		let query = Post::query()
			.left_join(Author::query(), |p, a| p.author_id.eq_field(a.id))
			.filter_on::<Author, _, _>(|a| a.name.begin_like("A"))
			.order_by_on::<Author, _>(|a| a.name.desc());

		let Condition::Criterion(c) = &query.context().conditions()[0] else {
			panic!("Expected criterion");
		};
		assert_eq!(c.field, FieldRef::qualified("Author", "name"));
		assert!(query.context().sorts()[0].desc);
	}

	#[rstest]
	fn test_filter_pair() {
		let query = Post::query()
			.cross_join(Author::query())
			.filter_pair(|p, a| p.author_id.eq_field(a.id));

		let Condition::Criterion(c) = &query.context().conditions()[0] else {
			panic!("Expected criterion");
		};
		assert!(matches!(&c.value, CriterionValue::Field(f) if f.name == "id"));
		assert!(query.context().joins()[0].connection.is_none());
	}

	#[rstest]
	fn test_filter_expr_checks_sources() {
		let query = Post::query().filter_expr("Post.id > 3 AND title LIKE 'a%'").unwrap();
		assert_eq!(query.context().conditions().len(), 1);

		let err = Post::query().filter_expr("Author.id = 1").unwrap_err();
		assert!(matches!(err, QueryError::UnknownSource(ref name) if name == "Author"));
	}

	#[rstest]
	fn test_select_expr() {
		let query = Post::query().select_expr("id, lower(title) AS t").unwrap();
		let selected = query.context().selected_fields();
		assert_eq!(selected.len(), 2);
		assert!(query.context().is_complex());
	}

	#[rstest]
	fn test_select_tuple_and_unselect() {
		let query = Post::query()
			.select(|p| (p.id, p.title, p.author_id))
			.unselect(|p| p.author_id);

		let fields = query
			.context()
			.get_finally_fields(&ModelType::of::<Post>(), false);
		let names: Vec<&str> = fields.iter().map(DataField::name).collect();
		assert_eq!(names, vec!["id", "title"]);
	}

	#[rstest]
	fn test_group_by_having() {
		let query = Post::query()
			.group_by(|p| p.author_id)
			.having(|p| p.id.gt(2))
			.having(|p| p.id.lt(10));

		assert!(query.context().check_use_for_group());
		let having = query.context().having().unwrap();
		assert_eq!(having.conditions().len(), 2);
		assert!(having
			.conditions()
			.iter()
			.all(|c| matches!(c, Condition::Group(_))));
	}

	#[rstest]
	fn test_tree_matching_and_from_queryable() {
		let inner = Post::query().filter(|p| p.id.gt(0));
		let query = Post::query()
			.tree_matching(|p| (p.id, p.parent_id), TreeDirection::Down)
			.from_queryable(inner);

		assert!(query.context().has_tree());
		assert!(query.context().has_sub_query());
	}

	#[rstest]
	fn test_in_subquery_marks_complex() {
		let authors = Author::query().filter(|a| a.name.end_like("son")).select(|a| a.id);
		let query = Post::query().filter(|p| p.author_id.in_subquery(authors));

		let Condition::Criterion(c) = &query.context().conditions()[0] else {
			panic!("Expected criterion");
		};
		assert_eq!(c.operator, CriterionOperator::In);
		assert!(query.context().is_complex());
	}

	#[rstest]
	fn test_combines_preserve_type() {
		let query = Post::query()
			.union(Post::query())
			.except(Post::query().filter(|p| p.id.eq(1)));

		let types: Vec<CombineType> = query.context().combines().iter().map(|c| c.combine_type).collect();
		assert_eq!(types, vec![CombineType::Union, CombineType::Except]);
	}

	#[rstest]
	fn test_from_context_rejects_other_model() {
		let context = QueryContext::for_model::<Author>();
		assert!(Queryable::<(Post,)>::from_context(context).is_err());

		let context = QueryContext::new();
		assert!(Queryable::<(Post,)>::from_context(context).is_ok());
	}

	#[rstest]
	fn test_clone_gets_new_identity() {
		let query = Post::query().filter(|p| p.id.gt(1));
		let copy = query.clone().filter(|p| p.id.lt(5));

		assert_ne!(query.context().id(), copy.context().id());
		assert_eq!(query.context().conditions().len(), 1);
		assert_eq!(copy.context().conditions().len(), 2);
	}
}
