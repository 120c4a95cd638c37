//! Model-specific executors bound to a query

use crate::context::QueryContext;
use crate::error::Result;
use crate::field::DataField;
use crate::options::{Modification, QueryOptions};
use crate::paging::{PagingFilter, PagingInfo};
use crate::value::Value;
use async_trait::async_trait;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Executor capability for queries whose results are `T`
///
/// A repository owns script generation and data access for its model. The
/// query layer only reads from `query`; it never inspects what the
/// repository does with it.
#[async_trait]
pub trait Repository<T: Send + 'static>: Send + Sync {
	async fn get(&self, query: &QueryContext, options: QueryOptions) -> Result<Option<T>>;

	async fn get_list(&self, query: &QueryContext, options: QueryOptions) -> Result<Vec<T>>;

	async fn get_paging(
		&self,
		query: &QueryContext,
		filter: PagingFilter,
		options: QueryOptions,
	) -> Result<PagingInfo<T>>;

	/// Defaults to a count greater than zero
	async fn exists(&self, query: &QueryContext, options: QueryOptions) -> Result<bool> {
		Ok(self.count(query, options).await? > 0)
	}

	async fn count(&self, query: &QueryContext, options: QueryOptions) -> Result<i64>;

	async fn max(&self, query: &QueryContext, field: &DataField, options: QueryOptions) -> Result<Value>;

	async fn min(&self, query: &QueryContext, field: &DataField, options: QueryOptions) -> Result<Value>;

	async fn sum(&self, query: &QueryContext, field: &DataField, options: QueryOptions) -> Result<Value>;

	async fn avg(&self, query: &QueryContext, field: &DataField, options: QueryOptions) -> Result<Value>;

	/// First column of the first row
	async fn scalar(&self, query: &QueryContext, options: QueryOptions) -> Result<Value>;

	/// Returns the number of affected rows
	async fn update(
		&self,
		query: &QueryContext,
		modification: &Modification,
		options: QueryOptions,
	) -> Result<u64>;

	/// Returns the number of affected rows
	async fn delete(&self, query: &QueryContext, options: QueryOptions) -> Result<u64>;
}

struct Entry {
	type_name: &'static str,
	repository: Box<dyn Any + Send + Sync>,
}

/// Set of repository capabilities, one per result type
///
/// Resolving a type that has no repository is not an error; the caller
/// falls back to the data gateway.
#[derive(Default)]
pub struct RepositoryBinding {
	entries: HashMap<TypeId, Entry>,
}

impl RepositoryBinding {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add the repository for `T`, replacing any earlier one
	pub fn with<T: Send + 'static>(mut self, repository: Arc<dyn Repository<T>>) -> Self {
		self.register(repository);
		self
	}

	pub fn register<T: Send + 'static>(&mut self, repository: Arc<dyn Repository<T>>) {
		self.entries.insert(
			TypeId::of::<T>(),
			Entry {
				type_name: std::any::type_name::<T>(),
				repository: Box::new(repository),
			},
		);
	}

	/// Repository for `T`, if one is bound
	pub fn resolve<T: Send + 'static>(&self) -> Option<Arc<dyn Repository<T>>> {
		self.entries
			.get(&TypeId::of::<T>())?
			.repository
			.downcast_ref::<Arc<dyn Repository<T>>>()
			.cloned()
	}

	pub fn supports<T: Send + 'static>(&self) -> bool {
		self.entries.contains_key(&TypeId::of::<T>())
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl fmt::Debug for RepositoryBinding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut types: Vec<&str> = self.entries.values().map(|e| e.type_name).collect();
		types.sort_unstable();
		f.debug_struct("RepositoryBinding").field("types", &types).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	struct Fixed(i64);

	#[async_trait]
	impl Repository<String> for Fixed {
		async fn get(&self, _query: &QueryContext, _options: QueryOptions) -> Result<Option<String>> {
			Ok(Some(self.0.to_string()))
		}

		async fn get_list(&self, _query: &QueryContext, _options: QueryOptions) -> Result<Vec<String>> {
			Ok(vec![self.0.to_string()])
		}

		async fn get_paging(
			&self,
			_query: &QueryContext,
			filter: PagingFilter,
			_options: QueryOptions,
		) -> Result<PagingInfo<String>> {
			Ok(PagingInfo::new(filter, 1, vec![self.0.to_string()]))
		}

		async fn count(&self, _query: &QueryContext, _options: QueryOptions) -> Result<i64> {
			Ok(self.0)
		}

		async fn max(&self, _q: &QueryContext, _f: &DataField, _o: QueryOptions) -> Result<Value> {
			Ok(Value::Int(self.0))
		}

		async fn min(&self, _q: &QueryContext, _f: &DataField, _o: QueryOptions) -> Result<Value> {
			Ok(Value::Int(self.0))
		}

		async fn sum(&self, _q: &QueryContext, _f: &DataField, _o: QueryOptions) -> Result<Value> {
			Ok(Value::Int(self.0))
		}

		async fn avg(&self, _q: &QueryContext, _f: &DataField, _o: QueryOptions) -> Result<Value> {
			Ok(Value::Float(self.0 as f64))
		}

		async fn scalar(&self, _query: &QueryContext, _options: QueryOptions) -> Result<Value> {
			Ok(Value::Int(self.0))
		}

		async fn update(
			&self,
			_query: &QueryContext,
			_modification: &Modification,
			_options: QueryOptions,
		) -> Result<u64> {
			Ok(0)
		}

		async fn delete(&self, _query: &QueryContext, _options: QueryOptions) -> Result<u64> {
			Ok(0)
		}
	}

	#[rstest]
	fn test_resolve_by_result_type() {
		let binding = RepositoryBinding::new().with::<String>(Arc::new(Fixed(3)));

		assert!(binding.supports::<String>());
		assert!(binding.resolve::<String>().is_some());
		assert!(!binding.supports::<i64>());
		assert!(binding.resolve::<i64>().is_none());
		assert_eq!(binding.len(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_exists_defaults_to_count() {
		let query = QueryContext::new();
		let present: Arc<dyn Repository<String>> = Arc::new(Fixed(2));
		let absent: Arc<dyn Repository<String>> = Arc::new(Fixed(0));

		assert!(present.exists(&query, QueryOptions::default()).await.unwrap());
		assert!(!absent.exists(&query, QueryOptions::default()).await.unwrap());
	}

	#[rstest]
	fn test_debug_lists_bound_types() {
		let binding = RepositoryBinding::new().with::<String>(Arc::new(Fixed(1)));
		assert!(format!("{binding:?}").contains("String"));
	}
}
