//! # reinhardt-queryable-core
//!
//! A fluent, strongly-typed query model with repository-aware execution.
//!
//! Queries are described, not run: every builder call records intent on a
//! [`QueryContext`] (conditions, sorts, projections, joins, set operations,
//! paging and execution flags). Terminal operations hand the finished
//! context to a [`QueryExecutor`], which routes the call to a repository
//! bound on the query when one exists for the result type and to the
//! [`DataGateway`] otherwise.
//!
//! ## Architecture
//!
//! - [`context`]: the untyped query description and its mutators
//! - [`queryable`]: the typed façade ([`Queryable<S>`]) over up to seven
//!   source models, with async terminal operations
//! - [`condition`], [`field`], [`model`]: predicates, columns and the
//!   [`Model`] trait that gives closures typed [`Field`] references
//! - [`translator`]: textual predicates and selectors ([`TextTranslator`])
//! - [`repository`], [`gateway`], [`dispatch`]: execution collaborators and
//!   the routing rule between them
//! - [`options`], [`settings`]: per-call options and executor defaults
//!
//! ## Quick Start
//!
//! ```rust
//! use reinhardt_queryable_core::prelude::*;
//!
//! struct Customer;
//! struct CustomerFields {
//!     id: Field<Customer, i64>,
//!     name: Field<Customer, String>,
//! }
//!
//! impl Model for Customer {
//!     type Fields = CustomerFields;
//!     fn model_name() -> &'static str { "Customer" }
//!     fn new_fields() -> Self::Fields {
//!         CustomerFields { id: Field::new("id"), name: Field::new("name") }
//!     }
//!     fn field_names() -> &'static [&'static str] { &["id", "name"] }
//! }
//!
//! let query = Customer::query()
//!     .filter(|c| c.name.begin_like("A"))
//!     .order_by(|c| c.id)
//!     .paginate(PagingFilter::create(2, 10));
//!
//! assert_eq!(query.context().skip_count(), 10);
//! assert_eq!(query.context().take_count(), Some(10));
//! assert!(query.context().has_condition());
//! ```

// Query model
pub mod combine;
pub mod condition;
pub mod context;
pub mod field;
pub mod flags;
pub mod join;
pub mod model;
pub mod split;
pub mod tree;
pub mod value;

// Typed façade
pub mod queryable;

// Textual expressions
pub mod translator;

// Execution
pub mod dispatch;
pub mod gateway;
pub mod options;
pub mod paging;
pub mod repository;
pub mod settings;

pub mod error;

/// Prelude module for convenient imports.
///
/// ```rust
/// use reinhardt_queryable_core::prelude::*;
/// ```
pub mod prelude {
	// Query model
	pub use crate::combine::{CombineEntry, CombineType};
	pub use crate::condition::{
		Condition, ConditionGroup, Connector, Criterion, CriterionOperator, CriterionValue,
	};
	pub use crate::context::{QueryContext, QuerySource, Script};
	pub use crate::field::{DataField, FieldRef, IntoDataFields, SortEntry};
	pub use crate::flags::{ExecutionMode, IsolationLevel, OutputType, ScriptType};
	pub use crate::join::{JoinEntry, JoinType};
	pub use crate::model::{Field, Model, ModelType};
	pub use crate::split::{SplitSelection, SplitTableBehavior, SplitValue};
	pub use crate::tree::{TreeDirection, TreeInfo};
	pub use crate::value::{FromValue, Value};
	// Typed façade
	pub use crate::queryable::{Append, HasSource, PrimaryFields, Queryable, SourceList};
	// Textual expressions
	pub use crate::translator::{ExpressionTranslator, TextTranslator};
	// Execution
	pub use crate::dispatch::{QueryExecutor, Route, route_for};
	pub use crate::gateway::DataGateway;
	pub use crate::options::{Modification, ModificationValue, QueryOptions};
	pub use crate::paging::{PagingFilter, PagingInfo};
	pub use crate::repository::{Repository, RepositoryBinding};
	pub use crate::settings::QuerySettings;
	// Errors
	pub use crate::error::{QueryError, Result};
}

// Re-export commonly used types at crate root
pub use prelude::*;
