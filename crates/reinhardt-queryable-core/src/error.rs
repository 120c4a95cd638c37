//! Error types for query construction and execution
//!
//! Building a query never fails: mutators store whatever they are given and
//! leave validation to the executor. The variants here cover the few places
//! that can fail inline (expression translation, model rebinding, settings
//! loading, typed value conversion) plus an opaque wrapper for collaborator
//! failures, which are propagated unchanged.

/// Errors raised by the queryable layer
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
	/// The expression translator could not turn an expression into a condition or field
	#[error("Cannot translate expression `{expression}`: {reason}")]
	Translation { expression: String, reason: String },

	/// The context is already bound to a different model type
	#[error("Query is bound to model `{expected}`, cannot rebind to `{actual}`")]
	ModelTypeMismatch {
		expected: &'static str,
		actual: &'static str,
	},

	/// Negative skip or take, reported only by `QueryContext::validate_paging`
	#[error("Invalid paging window (skip: {skip}, take: {take:?})")]
	InvalidPaging { skip: i64, take: Option<i64> },

	/// A textual selector referenced a model that is not a source of the query
	#[error("Unknown query source: {0}")]
	UnknownSource(String),

	/// An aggregate or scalar result could not be converted to the requested type
	#[error("Cannot convert {actual} value to {expected}")]
	ValueConversion {
		expected: &'static str,
		actual: &'static str,
	},

	/// Executor settings could not be parsed
	#[error("Invalid query settings: {0}")]
	Settings(String),

	/// Failure reported by a repository or the data gateway
	#[error(transparent)]
	Executor(#[from] anyhow::Error),
}

impl QueryError {
	pub(crate) fn translation(expression: impl Into<String>, reason: impl Into<String>) -> Self {
		Self::Translation {
			expression: expression.into(),
			reason: reason.into(),
		}
	}
}

impl From<toml::de::Error> for QueryError {
	fn from(err: toml::de::Error) -> Self {
		Self::Settings(err.to_string())
	}
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, QueryError>;
