//! Terminal operations of the typed builder
//!
//! Each operation hands the accumulated context to a [`QueryExecutor`],
//! which picks the bound repository or the gateway. The `_with` variants take
//! a callback that adjusts the per-call [`QueryOptions`].

use super::{PrimaryFields, Queryable, SourceList};
use crate::dispatch::QueryExecutor;
use crate::error::Result;
use crate::field::DataField;
use crate::gateway::DataGateway;
use crate::model::Model;
use crate::options::{Modification, QueryOptions};
use crate::paging::{PagingFilter, PagingInfo};
use crate::value::FromValue;
use serde::de::DeserializeOwned;

fn primary_field<S: SourceList, F: Into<DataField>>(selector: impl FnOnce(PrimaryFields<S>) -> F) -> DataField {
	selector(S::Primary::new_fields()).into()
}

impl<S: SourceList> Queryable<S> {
	pub async fn first<G: DataGateway>(&self, executor: &QueryExecutor<G>) -> Result<Option<S::Primary>>
	where
		S::Primary: DeserializeOwned,
	{
		self.first_with(executor, |_| {}).await
	}

	pub async fn first_with<G: DataGateway>(
		&self,
		executor: &QueryExecutor<G>,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<Option<S::Primary>>
	where
		S::Primary: DeserializeOwned,
	{
		executor.first::<S::Primary>(&self.context, configure).await
	}

	pub async fn to_list<G: DataGateway>(&self, executor: &QueryExecutor<G>) -> Result<Vec<S::Primary>>
	where
		S::Primary: DeserializeOwned,
	{
		self.to_list_with(executor, |_| {}).await
	}

	pub async fn to_list_with<G: DataGateway>(
		&self,
		executor: &QueryExecutor<G>,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<Vec<S::Primary>>
	where
		S::Primary: DeserializeOwned,
	{
		executor.to_list::<S::Primary>(&self.context, configure).await
	}

	/// One page of results; the context's own skip/take are left untouched
	pub async fn to_paging<G: DataGateway>(
		&self,
		executor: &QueryExecutor<G>,
		filter: PagingFilter,
	) -> Result<PagingInfo<S::Primary>>
	where
		S::Primary: DeserializeOwned,
	{
		self.to_paging_with(executor, filter, |_| {}).await
	}

	pub async fn to_paging_with<G: DataGateway>(
		&self,
		executor: &QueryExecutor<G>,
		filter: PagingFilter,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<PagingInfo<S::Primary>>
	where
		S::Primary: DeserializeOwned,
	{
		executor
			.to_paging::<S::Primary>(&self.context, filter, configure)
			.await
	}

	/// Same as [`to_paging`](Self::to_paging) with `PagingFilter::create(page, page_size)`
	pub async fn to_paging_page<G: DataGateway>(
		&self,
		executor: &QueryExecutor<G>,
		page: u64,
		page_size: u64,
	) -> Result<PagingInfo<S::Primary>>
	where
		S::Primary: DeserializeOwned,
	{
		self.to_paging_page_with(executor, page, page_size, |_| {})
			.await
	}

	pub async fn to_paging_page_with<G: DataGateway>(
		&self,
		executor: &QueryExecutor<G>,
		page: u64,
		page_size: u64,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<PagingInfo<S::Primary>>
	where
		S::Primary: DeserializeOwned,
	{
		self.to_paging_with(executor, PagingFilter::create(page, page_size), configure)
			.await
	}

	/// Rows of any shape; never routed to a repository
	pub async fn to_list_as<R, G>(&self, executor: &QueryExecutor<G>) -> Result<Vec<R>>
	where
		R: DeserializeOwned + Send + 'static,
		G: DataGateway,
	{
		executor.to_list_as::<R>(&self.context, |_| {}).await
	}

	/// First row of any shape; never routed to a repository
	pub async fn first_as<R, G>(&self, executor: &QueryExecutor<G>) -> Result<Option<R>>
	where
		R: DeserializeOwned + Send + 'static,
		G: DataGateway,
	{
		executor.first_as::<R>(&self.context, |_| {}).await
	}

	pub async fn count<G: DataGateway>(&self, executor: &QueryExecutor<G>) -> Result<i64> {
		self.count_with(executor, |_| {}).await
	}

	pub async fn count_with<G: DataGateway>(
		&self,
		executor: &QueryExecutor<G>,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<i64> {
		executor.count::<S::Primary>(&self.context, configure).await
	}

	pub async fn any<G: DataGateway>(&self, executor: &QueryExecutor<G>) -> Result<bool> {
		self.any_with(executor, |_| {}).await
	}

	pub async fn any_with<G: DataGateway>(
		&self,
		executor: &QueryExecutor<G>,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<bool> {
		executor.any::<S::Primary>(&self.context, configure).await
	}

	pub async fn sum<V, F, G>(
		&self,
		executor: &QueryExecutor<G>,
		selector: impl FnOnce(PrimaryFields<S>) -> F,
	) -> Result<V>
	where
		V: FromValue,
		F: Into<DataField>,
		G: DataGateway,
	{
		self.sum_with(executor, selector, |_| {}).await
	}

	pub async fn sum_with<V, F, G>(
		&self,
		executor: &QueryExecutor<G>,
		selector: impl FnOnce(PrimaryFields<S>) -> F,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<V>
	where
		V: FromValue,
		F: Into<DataField>,
		G: DataGateway,
	{
		let field = primary_field::<S, F>(selector);
		let value = executor
			.sum::<S::Primary>(&self.context, &field, configure)
			.await?;
		V::from_value(value)
	}

	pub async fn avg<V, F, G>(
		&self,
		executor: &QueryExecutor<G>,
		selector: impl FnOnce(PrimaryFields<S>) -> F,
	) -> Result<V>
	where
		V: FromValue,
		F: Into<DataField>,
		G: DataGateway,
	{
		self.avg_with(executor, selector, |_| {}).await
	}

	pub async fn avg_with<V, F, G>(
		&self,
		executor: &QueryExecutor<G>,
		selector: impl FnOnce(PrimaryFields<S>) -> F,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<V>
	where
		V: FromValue,
		F: Into<DataField>,
		G: DataGateway,
	{
		let field = primary_field::<S, F>(selector);
		let value = executor
			.avg::<S::Primary>(&self.context, &field, configure)
			.await?;
		V::from_value(value)
	}

	pub async fn max<V, F, G>(
		&self,
		executor: &QueryExecutor<G>,
		selector: impl FnOnce(PrimaryFields<S>) -> F,
	) -> Result<V>
	where
		V: FromValue,
		F: Into<DataField>,
		G: DataGateway,
	{
		self.max_with(executor, selector, |_| {}).await
	}

	pub async fn max_with<V, F, G>(
		&self,
		executor: &QueryExecutor<G>,
		selector: impl FnOnce(PrimaryFields<S>) -> F,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<V>
	where
		V: FromValue,
		F: Into<DataField>,
		G: DataGateway,
	{
		let field = primary_field::<S, F>(selector);
		let value = executor
			.max::<S::Primary>(&self.context, &field, configure)
			.await?;
		V::from_value(value)
	}

	pub async fn min<V, F, G>(
		&self,
		executor: &QueryExecutor<G>,
		selector: impl FnOnce(PrimaryFields<S>) -> F,
	) -> Result<V>
	where
		V: FromValue,
		F: Into<DataField>,
		G: DataGateway,
	{
		self.min_with(executor, selector, |_| {}).await
	}

	pub async fn min_with<V, F, G>(
		&self,
		executor: &QueryExecutor<G>,
		selector: impl FnOnce(PrimaryFields<S>) -> F,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<V>
	where
		V: FromValue,
		F: Into<DataField>,
		G: DataGateway,
	{
		let field = primary_field::<S, F>(selector);
		let value = executor
			.min::<S::Primary>(&self.context, &field, configure)
			.await?;
		V::from_value(value)
	}

	/// First column of the first row, converted to `V`
	pub async fn scalar<V: FromValue, G: DataGateway>(&self, executor: &QueryExecutor<G>) -> Result<V> {
		self.scalar_with(executor, |_| {}).await
	}

	pub async fn scalar_with<V: FromValue, G: DataGateway>(
		&self,
		executor: &QueryExecutor<G>,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<V> {
		let value = executor
			.scalar::<S::Primary>(&self.context, configure)
			.await?;
		V::from_value(value)
	}

	/// Apply the modification built by `modify` to every matching row
	pub async fn update<G: DataGateway>(
		&self,
		executor: &QueryExecutor<G>,
		modify: impl FnOnce(PrimaryFields<S>) -> Modification,
	) -> Result<u64> {
		self.update_with(executor, modify, |_| {}).await
	}

	pub async fn update_with<G: DataGateway>(
		&self,
		executor: &QueryExecutor<G>,
		modify: impl FnOnce(PrimaryFields<S>) -> Modification,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<u64> {
		let modification = modify(S::Primary::new_fields());
		executor
			.update::<S::Primary>(&self.context, &modification, configure)
			.await
	}

	pub async fn delete<G: DataGateway>(&self, executor: &QueryExecutor<G>) -> Result<u64> {
		self.delete_with(executor, |_| {}).await
	}

	pub async fn delete_with<G: DataGateway>(
		&self,
		executor: &QueryExecutor<G>,
		configure: impl FnOnce(&mut QueryOptions) + Send,
	) -> Result<u64> {
		executor
			.delete::<S::Primary>(&self.context, configure)
			.await
	}
}
