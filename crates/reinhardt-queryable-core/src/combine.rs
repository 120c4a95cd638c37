//! Set combinations (UNION, EXCEPT, INTERSECT) with other queryables

use crate::context::QueryContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Set operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombineType {
	UnionAll,
	Union,
	Except,
	Intersect,
}

impl fmt::Display for CombineType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			CombineType::UnionAll => "union all",
			CombineType::Union => "union",
			CombineType::Except => "except",
			CombineType::Intersect => "intersect",
		})
	}
}

/// One set combination with another queryable
#[derive(Debug, Clone)]
pub struct CombineEntry {
	pub combine_type: CombineType,
	target: Arc<QueryContext>,
}

impl CombineEntry {
	pub fn new(combine_type: CombineType, target: QueryContext) -> Self {
		Self {
			combine_type,
			target: Arc::new(target),
		}
	}

	pub fn target(&self) -> &QueryContext {
		&self.target
	}

	/// Mutable access to the target, copying it first if another clone shares it
	pub fn target_mut(&mut self) -> &mut QueryContext {
		Arc::make_mut(&mut self.target)
	}

	pub fn shares_target_with(&self, other: &CombineEntry) -> bool {
		Arc::ptr_eq(&self.target, &other.target)
	}

	pub(crate) fn deep_clone(&self) -> Self {
		Self {
			combine_type: self.combine_type,
			target: Arc::new(self.target.deep_clone()),
		}
	}
}
