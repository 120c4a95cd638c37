//! Join entries of the query composition graph

use crate::condition::Condition;
use crate::context::QueryContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of join between the query and a target sub-query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
	InnerJoin,
	LeftJoin,
	RightJoin,
	FullJoin,
	/// Cartesian product; carries no connection condition
	CrossJoin,
}

/// One join to another queryable
///
/// The target is a complete sub-query (it may carry its own conditions and
/// sorts). It is held behind an [`Arc`] so light clones can share it;
/// [`JoinEntry::target_mut`] detaches a shared target before mutating it.
#[derive(Debug, Clone)]
pub struct JoinEntry {
	pub join_type: JoinType,
	target: Arc<QueryContext>,
	pub connection: Option<Condition>,
}

impl JoinEntry {
	pub fn new(join_type: JoinType, target: QueryContext, connection: Option<Condition>) -> Self {
		Self {
			join_type,
			target: Arc::new(target),
			connection,
		}
	}

	pub fn target(&self) -> &QueryContext {
		&self.target
	}

	/// Mutable access to the target, copying it first if another clone shares it
	pub fn target_mut(&mut self) -> &mut QueryContext {
		Arc::make_mut(&mut self.target)
	}

	/// Whether both entries point at the same target allocation
	pub fn shares_target_with(&self, other: &JoinEntry) -> bool {
		Arc::ptr_eq(&self.target, &other.target)
	}

	pub(crate) fn deep_clone(&self) -> Self {
		Self {
			join_type: self.join_type,
			target: Arc::new(self.target.deep_clone()),
			connection: self.connection.as_ref().map(Condition::deep_clone),
		}
	}
}
