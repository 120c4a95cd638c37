//! The mutable state of one query
//!
//! [`QueryContext`] accumulates everything a fluent chain says about a query
//! and is what executors read. Mutators never fail: whatever they are given is
//! stored, and an executor rejects impossible combinations at run time.
//!
//! Sub-queries (join, combine and having targets, a wrapped source, sub-query
//! criteria) are held behind [`Arc`]. A light clone shares them; a deep clone
//! re-allocates the whole graph. Mutation of a shared target always goes
//! through copy-on-write, so no clone observes another clone's changes.

use crate::combine::{CombineEntry, CombineType};
use crate::condition::{Condition, ConditionGroup, Connector};
use crate::error::{QueryError, Result};
use crate::field::{DataField, SortEntry};
use crate::flags::{ExecutionMode, IsolationLevel, OutputType, ScriptType};
use crate::join::{JoinEntry, JoinType};
use crate::model::{Model, ModelType};
use crate::paging::PagingFilter;
use crate::repository::RepositoryBinding;
use crate::split::SplitTableBehavior;
use crate::tree::{TreeDirection, TreeInfo};
use crate::value::Value;
use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;
use std::sync::Arc;
use uuid::Uuid;

/// Where the rows of a query come from
#[derive(Debug, Clone, Default)]
pub enum QuerySource {
	/// The table(s) of the bound model
	#[default]
	Model,
	/// Another query used as a derived table
	Queryable(Arc<QueryContext>),
}

/// A raw script that overrides structural generation
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
	pub text: String,
	pub script_type: ScriptType,
	pub parameters: IndexMap<String, Value>,
}

/// Accumulated state of one query
#[derive(Debug)]
pub struct QueryContext {
	id: Uuid,
	model_type: Option<ModelType>,
	connector: Connector,
	conditions: Vec<Condition>,
	sorts: SmallVec<[SortEntry; 4]>,
	selected_fields: IndexSet<DataField>,
	reincluded_fields: IndexSet<DataField>,
	unselected_fields: IndexSet<DataField>,
	group_fields: Vec<DataField>,
	joins: Vec<JoinEntry>,
	combines: Vec<CombineEntry>,
	having: Option<Arc<QueryContext>>,
	tree_info: Option<TreeInfo>,
	source: QuerySource,
	skip_count: i64,
	take_count: Option<i64>,
	script: Option<Script>,
	execution_mode: ExecutionMode,
	output_type: OutputType,
	split_table: Option<SplitTableBehavior>,
	isolation_level: IsolationLevel,
	include_archived: bool,
	unisolated: bool,
	distinct: bool,
	negated: bool,
	repository: Option<Arc<RepositoryBinding>>,
}

impl Default for QueryContext {
	fn default() -> Self {
		Self::new()
	}
}

impl QueryContext {
	/// Create an empty context with no model bound
	pub fn new() -> Self {
		Self {
			id: Uuid::new_v4(),
			model_type: None,
			connector: Connector::And,
			conditions: Vec::new(),
			sorts: SmallVec::new(),
			selected_fields: IndexSet::new(),
			reincluded_fields: IndexSet::new(),
			unselected_fields: IndexSet::new(),
			group_fields: Vec::new(),
			joins: Vec::new(),
			combines: Vec::new(),
			having: None,
			tree_info: None,
			source: QuerySource::Model,
			skip_count: 0,
			take_count: None,
			script: None,
			execution_mode: ExecutionMode::Regular,
			output_type: OutputType::Rows,
			split_table: None,
			isolation_level: IsolationLevel::Unspecified,
			include_archived: false,
			unisolated: false,
			distinct: false,
			negated: false,
			repository: None,
		}
	}

	/// Create an empty context bound to `M`
	pub fn for_model<M: Model>() -> Self {
		let mut context = Self::new();
		context.model_type = Some(ModelType::of::<M>());
		context
	}

	// ----- model binding -----

	/// Bind the primary model type
	///
	/// Binding the type that is already bound is a no-op; binding a different
	/// one fails with [`QueryError::ModelTypeMismatch`].
	pub fn bind_model_type(&mut self, model_type: ModelType) -> Result<()> {
		match self.model_type {
			Some(bound) if bound != model_type => Err(QueryError::ModelTypeMismatch {
				expected: bound.name(),
				actual: model_type.name(),
			}),
			Some(_) => Ok(()),
			None => {
				self.model_type = Some(model_type);
				Ok(())
			}
		}
	}

	pub fn bind_repository(&mut self, repository: Arc<RepositoryBinding>) {
		self.repository = Some(repository);
	}

	// ----- conditions -----

	/// Connector that [`QueryContext::add_condition`] joins new conditions with
	pub fn set_connector(&mut self, connector: Connector) {
		self.connector = connector;
	}

	/// Append a condition joined to the existing ones by the context connector
	pub fn add_condition(&mut self, condition: impl Into<Condition>) {
		let condition: Condition = condition.into();
		self.conditions.push(condition.with_connector(self.connector));
	}

	/// Append several conditions joined to the existing ones by `connector`
	pub fn add_conditions(
		&mut self,
		connector: Connector,
		conditions: impl IntoIterator<Item = Condition>,
	) {
		self.conditions
			.extend(conditions.into_iter().map(|c| c.with_connector(connector)));
	}

	// ----- sorting and projection -----

	pub fn add_sort(&mut self, entry: SortEntry) {
		self.sorts.push(entry);
	}

	/// Owner that unqualified field names resolve to
	fn primary_owner(&self) -> Option<&'static str> {
		self.model_type.map(|m| m.name())
	}

	/// Include fields in the projection
	///
	/// Selections accumulate. A field that was unselected is no longer
	/// excluded. While nothing narrows the projection, a call that only
	/// re-includes unselected fields keeps it at "all fields"; those fields
	/// join the selection once a later call narrows it.
	pub fn select_fields(&mut self, fields: impl IntoIterator<Item = DataField>) {
		let fields: Vec<DataField> = fields.into_iter().collect();
		if fields.is_empty() {
			return;
		}
		let owner = self.primary_owner();

		let mut narrows = false;
		for field in &fields {
			let before = self.unselected_fields.len();
			self.unselected_fields.retain(|u| !u.same_column(field, owner));
			narrows |= self.unselected_fields.len() == before;
		}

		if self.selected_fields.is_empty() {
			if !narrows {
				for field in fields {
					insert_distinct(&mut self.reincluded_fields, field, owner);
				}
				return;
			}
			for field in std::mem::take(&mut self.reincluded_fields) {
				insert_distinct(&mut self.selected_fields, field, owner);
			}
		}
		for field in fields {
			insert_distinct(&mut self.selected_fields, field, owner);
		}
	}

	/// Exclude fields from the projection
	///
	/// The selection itself is kept, so unselecting every selected field
	/// leaves an empty projection rather than all fields.
	pub fn unselect_fields(&mut self, fields: impl IntoIterator<Item = DataField>) {
		let owner = self.primary_owner();
		for field in fields {
			insert_distinct(&mut self.unselected_fields, field, owner);
		}
	}

	/// Effective projection for `model_type`
	///
	/// `selected` (or every field of the model when nothing is selected)
	/// minus `unselected`, plus, with `include_necessary`, the model's
	/// necessary fields. Unqualified names belong to the primary model, or
	/// to `model_type` when the context has none.
	pub fn get_finally_fields(&self, model_type: &ModelType, include_necessary: bool) -> Vec<DataField> {
		let owner = Some(self.primary_owner().unwrap_or(model_type.name()));
		let base: Vec<DataField> = if self.selected_fields.is_empty() {
			model_type.all_fields()
		} else {
			self.selected_fields.iter().cloned().collect()
		};

		let mut result: Vec<DataField> = base
			.into_iter()
			.filter(|f| !self.unselected_fields.iter().any(|u| u.same_column(f, owner)))
			.collect();

		if include_necessary {
			for necessary in model_type.necessary_fields() {
				if !result.iter().any(|f| f.same_column(&necessary, owner)) {
					result.push(necessary);
				}
			}
		}
		result
	}

	pub fn group_by(&mut self, fields: impl IntoIterator<Item = DataField>) {
		self.group_fields.extend(fields);
	}

	/// True when grouping is in effect
	pub fn check_use_for_group(&self) -> bool {
		!self.group_fields.is_empty()
	}

	// ----- composition graph -----

	pub fn join(&mut self, entry: JoinEntry) {
		self.joins.push(entry);
	}

	pub fn add_join(&mut self, join_type: JoinType, target: QueryContext, connection: Option<Condition>) {
		self.join(JoinEntry::new(join_type, target, connection));
	}

	pub fn combine(&mut self, entry: CombineEntry) {
		self.combines.push(entry);
	}

	pub fn add_combine(&mut self, combine_type: CombineType, target: QueryContext) {
		self.combine(CombineEntry::new(combine_type, target));
	}

	/// Attach a post-aggregation filter
	///
	/// The first call sets the having query. Later calls keep that single
	/// slot: its conditions become `(existing) AND (new)`, each side wrapped
	/// in its own group. Only conditions merge; the rest of a later having
	/// query (joins, sorts, flags) is discarded.
	pub fn add_having(&mut self, having: QueryContext) {
		match &mut self.having {
			None => self.having = Some(Arc::new(having)),
			Some(existing) => {
				tracing::trace!(query = %self.id, "merging having conditions");
				let merged = Arc::make_mut(existing);
				let previous = std::mem::take(&mut merged.conditions);
				merged.conditions = vec![
					Condition::Group(ConditionGroup::from_entries(previous)),
					Condition::Group(ConditionGroup::from_entries(having.conditions))
						.with_connector(Connector::And),
				];
			}
		}
	}

	/// Attach a having condition, creating the having query on first use
	pub fn add_having_condition(&mut self, condition: impl Into<Condition>) {
		let mut having = QueryContext::new();
		having.model_type = self.model_type;
		having.add_condition(condition);
		self.add_having(having);
	}

	/// Replace any earlier tree matching
	pub fn tree_matching(
		&mut self,
		data_field: impl Into<DataField>,
		parent_field: impl Into<DataField>,
		direction: TreeDirection,
	) {
		self.tree_info = Some(TreeInfo::new(data_field, parent_field, direction));
	}

	/// Select from another query instead of the model's table
	pub fn from_queryable(&mut self, source: QueryContext) {
		self.source = QuerySource::Queryable(Arc::new(source));
	}

	// ----- paging -----

	/// Set the paging window; `None` leaves the take unbounded
	pub fn take(&mut self, take: Option<i64>, skip: i64) {
		self.take_count = take;
		self.skip_count = skip;
	}

	pub fn paginate(&mut self, filter: PagingFilter) {
		self.take(Some(filter.take()), filter.skip());
	}

	/// Reject negative skip or take
	///
	/// Never called by the builders; executors call it when they want the
	/// check.
	pub fn validate_paging(&self) -> Result<()> {
		if self.skip_count < 0 || self.take_count.is_some_and(|t| t < 0) {
			return Err(QueryError::InvalidPaging {
				skip: self.skip_count,
				take: self.take_count,
			});
		}
		Ok(())
	}

	// ----- flags -----

	pub fn distinct(&mut self) {
		self.distinct = true;
	}

	/// Toggle negation of the whole query's predicate
	pub fn negate(&mut self) {
		self.negated = !self.negated;
	}

	pub fn include_archived(&mut self) {
		self.include_archived = true;
	}

	pub fn unisolated(&mut self) {
		self.unisolated = true;
	}

	pub fn output(&mut self, output_type: OutputType) {
		self.output_type = output_type;
	}

	pub fn set_execution_mode(&mut self, mode: ExecutionMode) {
		self.execution_mode = mode;
	}

	/// Attach a raw script; structural state stays readable
	pub fn set_script(
		&mut self,
		text: impl Into<String>,
		script_type: ScriptType,
		parameters: impl IntoIterator<Item = (String, Value)>,
	) {
		self.script = Some(Script {
			text: text.into(),
			script_type,
			parameters: parameters.into_iter().collect(),
		});
	}

	pub fn split_table(&mut self, behavior: SplitTableBehavior) {
		self.split_table = Some(behavior);
	}

	pub fn set_isolation_level(&mut self, level: IsolationLevel) {
		self.isolation_level = level;
	}

	// ----- cloning -----

	/// Copy with new outer collections that shares every sub-query
	pub fn light_clone(&self) -> Self {
		let id = Uuid::new_v4();
		tracing::trace!(from = %self.id, to = %id, "light clone");
		Self {
			id,
			model_type: self.model_type,
			connector: self.connector,
			conditions: self.conditions.clone(),
			sorts: self.sorts.clone(),
			selected_fields: self.selected_fields.clone(),
			reincluded_fields: self.reincluded_fields.clone(),
			unselected_fields: self.unselected_fields.clone(),
			group_fields: self.group_fields.clone(),
			joins: self.joins.clone(),
			combines: self.combines.clone(),
			having: self.having.clone(),
			tree_info: self.tree_info.clone(),
			source: self.source.clone(),
			skip_count: self.skip_count,
			take_count: self.take_count,
			script: self.script.clone(),
			execution_mode: self.execution_mode,
			output_type: self.output_type,
			split_table: self.split_table.clone(),
			isolation_level: self.isolation_level,
			include_archived: self.include_archived,
			unisolated: self.unisolated,
			distinct: self.distinct,
			negated: self.negated,
			repository: self.repository.clone(),
		}
	}

	/// Fully independent copy, sub-queries included
	///
	/// The repository binding is an executor handle and stays shared.
	pub fn deep_clone(&self) -> Self {
		let mut copy = self.light_clone();
		tracing::trace!(from = %self.id, to = %copy.id, "deep clone");
		copy.conditions = self.conditions.iter().map(Condition::deep_clone).collect();
		copy.joins = self.joins.iter().map(JoinEntry::deep_clone).collect();
		copy.combines = self.combines.iter().map(CombineEntry::deep_clone).collect();
		copy.having = self.having.as_ref().map(|h| Arc::new(h.deep_clone()));
		copy.source = match &self.source {
			QuerySource::Model => QuerySource::Model,
			QuerySource::Queryable(q) => QuerySource::Queryable(Arc::new(q.deep_clone())),
		};
		copy
	}

	// ----- accessors -----

	pub fn id(&self) -> Uuid {
		self.id
	}

	pub fn model_type(&self) -> Option<ModelType> {
		self.model_type
	}

	pub fn connector(&self) -> Connector {
		self.connector
	}

	pub fn conditions(&self) -> &[Condition] {
		&self.conditions
	}

	pub fn sorts(&self) -> &[SortEntry] {
		&self.sorts
	}

	pub fn selected_fields(&self) -> &IndexSet<DataField> {
		&self.selected_fields
	}

	/// Fields re-included while the projection was still "all fields"
	pub fn reincluded_fields(&self) -> &IndexSet<DataField> {
		&self.reincluded_fields
	}

	pub fn unselected_fields(&self) -> &IndexSet<DataField> {
		&self.unselected_fields
	}

	pub fn group_fields(&self) -> &[DataField] {
		&self.group_fields
	}

	pub fn joins(&self) -> &[JoinEntry] {
		&self.joins
	}

	/// Join entries, for reaching their targets; the list itself stays append-only
	pub fn joins_mut(&mut self) -> &mut [JoinEntry] {
		&mut self.joins
	}

	pub fn combines(&self) -> &[CombineEntry] {
		&self.combines
	}

	pub fn combines_mut(&mut self) -> &mut [CombineEntry] {
		&mut self.combines
	}

	pub fn having(&self) -> Option<&QueryContext> {
		self.having.as_deref()
	}

	pub fn having_mut(&mut self) -> Option<&mut QueryContext> {
		self.having.as_mut().map(Arc::make_mut)
	}

	pub fn tree_info(&self) -> Option<&TreeInfo> {
		self.tree_info.as_ref()
	}

	pub fn source(&self) -> &QuerySource {
		&self.source
	}

	pub fn skip_count(&self) -> i64 {
		self.skip_count
	}

	pub fn take_count(&self) -> Option<i64> {
		self.take_count
	}

	pub fn script(&self) -> Option<&Script> {
		self.script.as_ref()
	}

	pub fn execution_mode(&self) -> ExecutionMode {
		self.execution_mode
	}

	pub fn output_type(&self) -> OutputType {
		self.output_type
	}

	pub fn split_table_behavior(&self) -> Option<&SplitTableBehavior> {
		self.split_table.as_ref()
	}

	pub fn isolation_level(&self) -> IsolationLevel {
		self.isolation_level
	}

	pub fn includes_archived(&self) -> bool {
		self.include_archived
	}

	pub fn is_unisolated(&self) -> bool {
		self.unisolated
	}

	pub fn is_distinct(&self) -> bool {
		self.distinct
	}

	pub fn is_negated(&self) -> bool {
		self.negated
	}

	pub fn repository(&self) -> Option<&Arc<RepositoryBinding>> {
		self.repository.as_ref()
	}

	pub fn has_condition(&self) -> bool {
		!self.conditions.is_empty()
	}

	pub fn has_sort(&self) -> bool {
		!self.sorts.is_empty()
	}

	pub fn has_join(&self) -> bool {
		!self.joins.is_empty()
	}

	pub fn has_combine(&self) -> bool {
		!self.combines.is_empty()
	}

	pub fn has_having(&self) -> bool {
		self.having.is_some()
	}

	pub fn has_tree(&self) -> bool {
		self.tree_info.is_some()
	}

	pub fn has_script(&self) -> bool {
		self.script.is_some()
	}

	/// Whether a sub-query appears in the conditions or as the source
	pub fn has_sub_query(&self) -> bool {
		matches!(self.source, QuerySource::Queryable(_))
			|| self.conditions.iter().any(Condition::contains_subquery)
	}

	pub fn has_field_formatter(&self) -> bool {
		self.selected_fields
			.iter()
			.chain(self.group_fields.iter())
			.chain(self.sorts.iter().map(|s| &s.field))
			.any(DataField::is_formatted)
	}

	/// Whether a single-table fast path is ruled out
	pub fn is_complex(&self) -> bool {
		self.has_sub_query() || self.has_tree() || self.has_join() || self.has_field_formatter()
	}
}

fn insert_distinct(set: &mut IndexSet<DataField>, field: DataField, owner: Option<&str>) {
	if !set.iter().any(|f| f.same_column(&field, owner)) {
		set.insert(field);
	}
}

impl Clone for QueryContext {
	/// Same as [`QueryContext::light_clone`]
	fn clone(&self) -> Self {
		self.light_clone()
	}
}

impl PartialEq for QueryContext {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for QueryContext {}
