//! Terminal-call dispatch between a bound repository and the data gateway
//!
//! Every terminal operation follows the same rule: if the query carries a
//! [`RepositoryBinding`](crate::RepositoryBinding) with a repository for the
//! result type, that repository runs the call; otherwise the gateway does.
//! A missing capability is a routing decision, never an error, and whatever
//! the chosen collaborator returns is passed back unchanged.

use crate::context::QueryContext;
use crate::error::Result;
use crate::field::DataField;
use crate::gateway::DataGateway;
use crate::options::{Modification, QueryOptions};
use crate::paging::{PagingFilter, PagingInfo};
use crate::repository::Repository;
use crate::settings::QuerySettings;
use crate::value::Value;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Which collaborator handled a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
	Repository,
	Gateway,
}

impl Route {
	fn as_str(self) -> &'static str {
		match self {
			Route::Repository => "repository",
			Route::Gateway => "gateway",
		}
	}
}

/// Runs terminal operations for queries
///
/// Owns the fallback gateway and the settings every call's options are
/// seeded from.
pub struct QueryExecutor<G> {
	gateway: Arc<G>,
	settings: QuerySettings,
}

impl<G> Clone for QueryExecutor<G> {
	fn clone(&self) -> Self {
		Self {
			gateway: Arc::clone(&self.gateway),
			settings: self.settings.clone(),
		}
	}
}

fn resolve<T: Send + 'static>(query: &QueryContext) -> Option<Arc<dyn Repository<T>>> {
	query.repository()?.resolve::<T>()
}

/// Which collaborator a call producing `T` would use
pub fn route_for<T: Send + 'static>(query: &QueryContext) -> Route {
	match query.repository() {
		Some(binding) if binding.supports::<T>() => Route::Repository,
		_ => Route::Gateway,
	}
}

fn trace_route(operation: &'static str, query: &QueryContext, route: Route) {
	tracing::debug!(
		operation,
		query = %query.id(),
		model = query.model_type().map(|m| m.name()).unwrap_or("<unbound>"),
		route = route.as_str(),
		"dispatching terminal call"
	);
}

impl<G: DataGateway> QueryExecutor<G> {
	pub fn new(gateway: G) -> Self {
		Self::from_arc(Arc::new(gateway))
	}

	/// Share a gateway that is already reference counted
	pub fn from_arc(gateway: Arc<G>) -> Self {
		Self {
			gateway,
			settings: QuerySettings::default(),
		}
	}

	pub fn with_settings(mut self, settings: QuerySettings) -> Self {
		self.settings = settings;
		self
	}

	pub fn gateway(&self) -> &G {
		&self.gateway
	}

	pub fn settings(&self) -> &QuerySettings {
		&self.settings
	}

	/// Fresh options from the settings, then the caller's overrides
	pub fn options(&self, configure: impl FnOnce(&mut QueryOptions)) -> QueryOptions {
		let mut options = self.settings.default_options();
		configure(&mut options);
		options
	}

	pub async fn first<T>(
		&self,
		query: &QueryContext,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<Option<T>>
	where
		T: DeserializeOwned + Send + 'static,
	{
		let options = self.options(configure);
		match resolve::<T>(query) {
			Some(repository) => {
				trace_route("first", query, Route::Repository);
				repository.get(query, options).await
			}
			None => {
				trace_route("first", query, Route::Gateway);
				self.gateway.get::<T>(query, options).await
			}
		}
	}

	pub async fn to_list<T>(
		&self,
		query: &QueryContext,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<Vec<T>>
	where
		T: DeserializeOwned + Send + 'static,
	{
		let options = self.options(configure);
		match resolve::<T>(query) {
			Some(repository) => {
				trace_route("to_list", query, Route::Repository);
				repository.get_list(query, options).await
			}
			None => {
				trace_route("to_list", query, Route::Gateway);
				self.gateway.get_list::<T>(query, options).await
			}
		}
	}

	/// The page size is replaced by the settings' default when 0 and capped at the maximum
	pub async fn to_paging<T>(
		&self,
		query: &QueryContext,
		filter: PagingFilter,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<PagingInfo<T>>
	where
		T: DeserializeOwned + Send + 'static,
	{
		let options = self.options(configure);
		let filter = PagingFilter {
			page_size: self.settings.effective_page_size(filter.page_size),
			..filter
		};
		match resolve::<T>(query) {
			Some(repository) => {
				trace_route("to_paging", query, Route::Repository);
				repository.get_paging(query, filter, options).await
			}
			None => {
				trace_route("to_paging", query, Route::Gateway);
				self.gateway.get_paging::<T>(query, filter, options).await
			}
		}
	}

	/// Rows of an ad hoc projection; always runs on the gateway
	pub async fn to_list_as<R>(
		&self,
		query: &QueryContext,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<Vec<R>>
	where
		R: DeserializeOwned + Send + 'static,
	{
		let options = self.options(configure);
		trace_route("to_list_as", query, Route::Gateway);
		self.gateway.get_list::<R>(query, options).await
	}

	/// First row of an ad hoc projection; always runs on the gateway
	pub async fn first_as<R>(
		&self,
		query: &QueryContext,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<Option<R>>
	where
		R: DeserializeOwned + Send + 'static,
	{
		let options = self.options(configure);
		trace_route("first_as", query, Route::Gateway);
		self.gateway.get::<R>(query, options).await
	}

	/// `M` selects the repository; the gateway only sees the query
	pub async fn count<M: Send + 'static>(
		&self,
		query: &QueryContext,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<i64> {
		let options = self.options(configure);
		match resolve::<M>(query) {
			Some(repository) => {
				trace_route("count", query, Route::Repository);
				repository.count(query, options).await
			}
			None => {
				trace_route("count", query, Route::Gateway);
				self.gateway.count(query, options).await
			}
		}
	}

	pub async fn any<M: Send + 'static>(
		&self,
		query: &QueryContext,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<bool> {
		let options = self.options(configure);
		match resolve::<M>(query) {
			Some(repository) => {
				trace_route("any", query, Route::Repository);
				repository.exists(query, options).await
			}
			None => {
				trace_route("any", query, Route::Gateway);
				self.gateway.exists(query, options).await
			}
		}
	}

	pub async fn max<M: Send + 'static>(
		&self,
		query: &QueryContext,
		field: &DataField,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<Value> {
		let options = self.options(configure);
		match resolve::<M>(query) {
			Some(repository) => {
				trace_route("max", query, Route::Repository);
				repository.max(query, field, options).await
			}
			None => {
				trace_route("max", query, Route::Gateway);
				self.gateway.max(query, field, options).await
			}
		}
	}

	pub async fn min<M: Send + 'static>(
		&self,
		query: &QueryContext,
		field: &DataField,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<Value> {
		let options = self.options(configure);
		match resolve::<M>(query) {
			Some(repository) => {
				trace_route("min", query, Route::Repository);
				repository.min(query, field, options).await
			}
			None => {
				trace_route("min", query, Route::Gateway);
				self.gateway.min(query, field, options).await
			}
		}
	}

	pub async fn sum<M: Send + 'static>(
		&self,
		query: &QueryContext,
		field: &DataField,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<Value> {
		let options = self.options(configure);
		match resolve::<M>(query) {
			Some(repository) => {
				trace_route("sum", query, Route::Repository);
				repository.sum(query, field, options).await
			}
			None => {
				trace_route("sum", query, Route::Gateway);
				self.gateway.sum(query, field, options).await
			}
		}
	}

	pub async fn avg<M: Send + 'static>(
		&self,
		query: &QueryContext,
		field: &DataField,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<Value> {
		let options = self.options(configure);
		match resolve::<M>(query) {
			Some(repository) => {
				trace_route("avg", query, Route::Repository);
				repository.avg(query, field, options).await
			}
			None => {
				trace_route("avg", query, Route::Gateway);
				self.gateway.avg(query, field, options).await
			}
		}
	}

	pub async fn scalar<M: Send + 'static>(
		&self,
		query: &QueryContext,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<Value> {
		let options = self.options(configure);
		match resolve::<M>(query) {
			Some(repository) => {
				trace_route("scalar", query, Route::Repository);
				repository.scalar(query, options).await
			}
			None => {
				trace_route("scalar", query, Route::Gateway);
				self.gateway.scalar(query, options).await
			}
		}
	}

	pub async fn update<M: Send + 'static>(
		&self,
		query: &QueryContext,
		modification: &Modification,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<u64> {
		let options = self.options(configure);
		match resolve::<M>(query) {
			Some(repository) => {
				trace_route("update", query, Route::Repository);
				repository.update(query, modification, options).await
			}
			None => {
				trace_route("update", query, Route::Gateway);
				self.gateway.update(query, modification, options).await
			}
		}
	}

	pub async fn delete<M: Send + 'static>(
		&self,
		query: &QueryContext,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<u64> {
		let options = self.options(configure);
		match resolve::<M>(query) {
			Some(repository) => {
				trace_route("delete", query, Route::Repository);
				repository.delete(query, options).await
			}
			None => {
				trace_route("delete", query, Route::Gateway);
				self.gateway.delete(query, options).await
			}
		}
	}
}
