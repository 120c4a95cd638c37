//! Hierarchical self-join specification

use crate::field::DataField;
use serde::{Deserialize, Serialize};

/// Traversal direction of a tree match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreeDirection {
	/// From the matched rows towards their ancestors
	Up,
	/// From the matched rows towards their descendants
	Down,
}

/// Recursive parent/child matching over one model
///
/// Rows are linked when `parent_field` of a child equals `data_field` of
/// its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeInfo {
	pub data_field: DataField,
	pub parent_field: DataField,
	pub direction: TreeDirection,
}

impl TreeInfo {
	pub fn new(
		data_field: impl Into<DataField>,
		parent_field: impl Into<DataField>,
		direction: TreeDirection,
	) -> Self {
		Self {
			data_field: data_field.into(),
			parent_field: parent_field.into(),
			direction,
		}
	}
}
