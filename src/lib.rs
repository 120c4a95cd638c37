//! # Reinhardt Queryable
//!
//! A fluent, strongly-typed query layer for Rust.
//!
//! Build a query from a [`Model`], compose filters, sorts, projections,
//! joins and set operations with closures over typed [`Field`] references,
//! then run it through a [`QueryExecutor`]. Each terminal call goes to the
//! repository bound on the query for its result type, or to the
//! [`DataGateway`] when no such repository exists.
//!
//! ## Quick Start
//!
//! ```rust
//! use reinhardt_queryable::prelude::*;
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
//!     .filter(|o| o.total.gte(10.0))
//!     .select(|o| (o.id, o.total))
//!     .take(5, 0);
//!
//! assert_eq!(query.context().selected_fields().len(), 2);
//! ```
//!
//! See [`reinhardt_queryable_core`] for the full API.

pub use reinhardt_queryable_core::*;

/// Prelude module for convenient imports.
pub mod prelude {
	pub use reinhardt_queryable_core::prelude::*;
}
