//! Scalar execution flags carried by a query context

use serde::{Deserialize, Serialize};

/// How the executor should treat the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
	/// Build and run the query
	#[default]
	Regular,
	/// Hand the query object itself to the executor without generating a script
	QueryObject,
}

/// Kind of raw script attached with `script`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptType {
	#[default]
	Text,
	StoredProcedure,
}

/// Shape of the result the executor should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
	#[default]
	Rows,
	Scalar,
	/// No result set (commands)
	None,
}

/// Transaction isolation requested for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
	/// Leave the executor's default in place
	#[default]
	Unspecified,
	ReadUncommitted,
	ReadCommitted,
	RepeatableRead,
	Serializable,
	Snapshot,
}
