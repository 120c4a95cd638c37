//! The generic data-access gateway

use crate::context::QueryContext;
use crate::error::Result;
use crate::field::DataField;
use crate::options::{Modification, QueryOptions};
use crate::paging::{PagingFilter, PagingInfo};
use crate::value::Value;
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Type-agnostic executor used whenever no repository handles a call
///
/// Row-returning methods are generic over the row type so one gateway can
/// serve every model and every ad hoc projection. The model a call is about
/// is `query.model_type()`.
#[async_trait]
pub trait DataGateway: Send + Sync {
	async fn get<T>(&self, query: &QueryContext, options: QueryOptions) -> Result<Option<T>>
	where
		T: DeserializeOwned + Send + 'static;

	async fn get_list<T>(&self, query: &QueryContext, options: QueryOptions) -> Result<Vec<T>>
	where
		T: DeserializeOwned + Send + 'static;

	async fn get_paging<T>(
		&self,
		query: &QueryContext,
		filter: PagingFilter,
		options: QueryOptions,
	) -> Result<PagingInfo<T>>
	where
		T: DeserializeOwned + Send + 'static;

	async fn exists(&self, query: &QueryContext, options: QueryOptions) -> Result<bool>;

	async fn count(&self, query: &QueryContext, options: QueryOptions) -> Result<i64>;

	async fn max(&self, query: &QueryContext, field: &DataField, options: QueryOptions) -> Result<Value>;

	async fn min(&self, query: &QueryContext, field: &DataField, options: QueryOptions) -> Result<Value>;

	async fn sum(&self, query: &QueryContext, field: &DataField, options: QueryOptions) -> Result<Value>;

	async fn avg(&self, query: &QueryContext, field: &DataField, options: QueryOptions) -> Result<Value>;

	async fn scalar(&self, query: &QueryContext, options: QueryOptions) -> Result<Value>;

	async fn update(
		&self,
		query: &QueryContext,
		modification: &Modification,
		options: QueryOptions,
	) -> Result<u64>;

	async fn delete(&self, query: &QueryContext, options: QueryOptions) -> Result<u64>;
}
