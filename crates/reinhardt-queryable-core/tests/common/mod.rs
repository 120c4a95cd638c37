//! Shared models and recording collaborators for the integration tests

// Each test binary compiles this module separately, so not every item is used everywhere.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use reinhardt_queryable_core::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	pub id: i64,
	pub customer_id: i64,
	pub total: f64,
	pub status: String,
}

pub struct OrderFields {
	pub id: Field<Order, i64>,
	pub customer_id: Field<Order, i64>,
	pub total: Field<Order, f64>,
	pub status: Field<Order, String>,
}

impl Model for Order {
	type Fields = OrderFields;

	fn model_name() -> &'static str {
		"Order"
	}

	fn new_fields() -> Self::Fields {
		OrderFields {
			id: Field::new("id"),
			customer_id: Field::new("customer_id"),
			total: Field::new("total"),
			status: Field::new("status"),
		}
	}

	fn field_names() -> &'static [&'static str] {
		&["id", "customer_id", "total", "status"]
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
	pub id: i64,
	pub name: String,
	pub vip: bool,
}

pub struct CustomerFields {
	pub id: Field<Customer, i64>,
	pub name: Field<Customer, String>,
	pub vip: Field<Customer, bool>,
}

impl Model for Customer {
	type Fields = CustomerFields;

	fn model_name() -> &'static str {
		"Customer"
	}

	fn new_fields() -> Self::Fields {
		CustomerFields {
			id: Field::new("id"),
			name: Field::new("name"),
			vip: Field::new("vip"),
		}
	}

	fn field_names() -> &'static [&'static str] {
		&["id", "name", "vip"]
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
	pub id: i64,
	pub sku: String,
	pub price: f64,
}

pub struct ProductFields {
	pub id: Field<Product, i64>,
	pub sku: Field<Product, String>,
	pub price: Field<Product, f64>,
}

impl Model for Product {
	type Fields = ProductFields;

	fn model_name() -> &'static str {
		"Product"
	}

	fn new_fields() -> Self::Fields {
		ProductFields {
			id: Field::new("id"),
			sku: Field::new("sku"),
			price: Field::new("price"),
		}
	}

	fn field_names() -> &'static [&'static str] {
		&["id", "sku", "price"]
	}

	fn necessary_fields() -> &'static [&'static str] {
		&["id", "sku"]
	}
}

pub fn order(id: i64, customer_id: i64, total: f64) -> Order {
	Order {
		id,
		customer_id,
		total,
		status: "open".to_string(),
	}
}

/// One call observed by a recording collaborator
#[derive(Debug, Clone)]
pub struct Call {
	pub operation: &'static str,
	pub query_id: Uuid,
	pub model: Option<&'static str>,
	pub options: QueryOptions,
	pub field: Option<DataField>,
	pub filter: Option<PagingFilter>,
	pub modification: Option<Modification>,
}

impl Call {
	fn new(operation: &'static str, query: &QueryContext, options: QueryOptions) -> Self {
		Self {
			operation,
			query_id: query.id(),
			model: query.model_type().map(|m| m.name()),
			options,
			field: None,
			filter: None,
			modification: None,
		}
	}
}

/// Gateway answering from canned JSON rows and recording every call
#[derive(Default)]
pub struct RecordingGateway {
	rows: Vec<serde_json::Value>,
	aggregate: Option<Value>,
	affected: u64,
	calls: Mutex<Vec<Call>>,
}

impl RecordingGateway {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_rows<T: Serialize>(mut self, rows: &[T]) -> Self {
		self.rows = rows
			.iter()
			.map(|row| serde_json::to_value(row).unwrap())
			.collect();
		self
	}

	pub fn with_aggregate(mut self, value: impl Into<Value>) -> Self {
		self.aggregate = Some(value.into());
		self
	}

	pub fn with_affected(mut self, affected: u64) -> Self {
		self.affected = affected;
		self
	}

	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().clone()
	}

	pub fn operations(&self) -> Vec<&'static str> {
		self.calls.lock().iter().map(|c| c.operation).collect()
	}

	fn record(&self, call: Call) {
		self.calls.lock().push(call);
	}

	fn decode<T: DeserializeOwned>(&self) -> reinhardt_queryable_core::Result<Vec<T>> {
		self.rows
			.iter()
			.map(|row| serde_json::from_value(row.clone()).map_err(|e| QueryError::from(anyhow::Error::from(e))))
			.collect()
	}

	fn aggregate(&self) -> Value {
		self.aggregate.clone().unwrap_or(Value::Null)
	}
}

#[async_trait]
impl DataGateway for RecordingGateway {
	async fn get<T>(&self, query: &QueryContext, options: QueryOptions) -> reinhardt_queryable_core::Result<Option<T>>
	where
		T: DeserializeOwned + Send + 'static,
	{
		self.record(Call::new("get", query, options));
		Ok(self.decode::<T>()?.into_iter().next())
	}

	async fn get_list<T>(&self, query: &QueryContext, options: QueryOptions) -> reinhardt_queryable_core::Result<Vec<T>>
	where
		T: DeserializeOwned + Send + 'static,
	{
		self.record(Call::new("get_list", query, options));
		self.decode::<T>()
	}

	async fn get_paging<T>(
		&self,
		query: &QueryContext,
		filter: PagingFilter,
		options: QueryOptions,
	) -> reinhardt_queryable_core::Result<PagingInfo<T>>
	where
		T: DeserializeOwned + Send + 'static,
	{
		self.record(Call {
			filter: Some(filter),
			..Call::new("get_paging", query, options)
		});
		let rows = self.decode::<T>()?;
		let total = rows.len() as u64;
		let skip = usize::try_from(filter.skip()).unwrap_or(usize::MAX);
		let take = usize::try_from(filter.take()).unwrap_or(usize::MAX);
		let items = rows.into_iter().skip(skip).take(take).collect();
		Ok(PagingInfo::new(filter, total, items))
	}

	async fn exists(&self, query: &QueryContext, options: QueryOptions) -> reinhardt_queryable_core::Result<bool> {
		self.record(Call::new("exists", query, options));
		Ok(!self.rows.is_empty())
	}

	async fn count(&self, query: &QueryContext, options: QueryOptions) -> reinhardt_queryable_core::Result<i64> {
		self.record(Call::new("count", query, options));
		Ok(self.rows.len() as i64)
	}

	async fn max(
		&self,
		query: &QueryContext,
		field: &DataField,
		options: QueryOptions,
	) -> reinhardt_queryable_core::Result<Value> {
		self.record(Call {
			field: Some(field.clone()),
			..Call::new("max", query, options)
		});
		Ok(self.aggregate())
	}

	async fn min(
		&self,
		query: &QueryContext,
		field: &DataField,
		options: QueryOptions,
	) -> reinhardt_queryable_core::Result<Value> {
		self.record(Call {
			field: Some(field.clone()),
			..Call::new("min", query, options)
		});
		Ok(self.aggregate())
	}

	async fn sum(
		&self,
		query: &QueryContext,
		field: &DataField,
		options: QueryOptions,
	) -> reinhardt_queryable_core::Result<Value> {
		self.record(Call {
			field: Some(field.clone()),
			..Call::new("sum", query, options)
		});
		Ok(self.aggregate())
	}

	async fn avg(
		&self,
		query: &QueryContext,
		field: &DataField,
		options: QueryOptions,
	) -> reinhardt_queryable_core::Result<Value> {
		self.record(Call {
			field: Some(field.clone()),
			..Call::new("avg", query, options)
		});
		Ok(self.aggregate())
	}

	async fn scalar(&self, query: &QueryContext, options: QueryOptions) -> reinhardt_queryable_core::Result<Value> {
		self.record(Call::new("scalar", query, options));
		Ok(self.aggregate())
	}

	async fn update(
		&self,
		query: &QueryContext,
		modification: &Modification,
		options: QueryOptions,
	) -> reinhardt_queryable_core::Result<u64> {
		self.record(Call {
			modification: Some(modification.clone()),
			..Call::new("update", query, options)
		});
		Ok(self.affected)
	}

	async fn delete(&self, query: &QueryContext, options: QueryOptions) -> reinhardt_queryable_core::Result<u64> {
		self.record(Call::new("delete", query, options));
		Ok(self.affected)
	}
}

/// In-memory repository of orders that records every call
#[derive(Default)]
pub struct OrderRepository {
	orders: Vec<Order>,
	calls: Mutex<Vec<Call>>,
}

impl OrderRepository {
	pub fn new(orders: Vec<Order>) -> Self {
		Self {
			orders,
			calls: Mutex::new(Vec::new()),
		}
	}

	pub fn operations(&self) -> Vec<&'static str> {
		self.calls.lock().iter().map(|c| c.operation).collect()
	}

	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().clone()
	}

	fn record(&self, call: Call) {
		self.calls.lock().push(call);
	}

	fn total_of(&self, reduce: impl Fn(f64, f64) -> f64) -> Value {
		self.orders
			.iter()
			.map(|o| o.total)
			.reduce(reduce)
			.map(Value::Float)
			.unwrap_or(Value::Null)
	}
}

#[async_trait]
impl Repository<Order> for OrderRepository {
	async fn get(&self, query: &QueryContext, options: QueryOptions) -> reinhardt_queryable_core::Result<Option<Order>> {
		self.record(Call::new("get", query, options));
		Ok(self.orders.first().cloned())
	}

	async fn get_list(&self, query: &QueryContext, options: QueryOptions) -> reinhardt_queryable_core::Result<Vec<Order>> {
		self.record(Call::new("get_list", query, options));
		Ok(self.orders.clone())
	}

	async fn get_paging(
		&self,
		query: &QueryContext,
		filter: PagingFilter,
		options: QueryOptions,
	) -> reinhardt_queryable_core::Result<PagingInfo<Order>> {
		self.record(Call {
			filter: Some(filter),
			..Call::new("get_paging", query, options)
		});
		let skip = usize::try_from(filter.skip()).unwrap_or(usize::MAX);
		let take = usize::try_from(filter.take()).unwrap_or(usize::MAX);
		let items = self.orders.iter().skip(skip).take(take).cloned().collect();
		Ok(PagingInfo::new(filter, self.orders.len() as u64, items))
	}

	async fn count(&self, query: &QueryContext, options: QueryOptions) -> reinhardt_queryable_core::Result<i64> {
		self.record(Call::new("count", query, options));
		Ok(self.orders.len() as i64)
	}

	async fn max(
		&self,
		query: &QueryContext,
		field: &DataField,
		options: QueryOptions,
	) -> reinhardt_queryable_core::Result<Value> {
		self.record(Call {
			field: Some(field.clone()),
			..Call::new("max", query, options)
		});
		Ok(self.total_of(f64::max))
	}

	async fn min(
		&self,
		query: &QueryContext,
		field: &DataField,
		options: QueryOptions,
	) -> reinhardt_queryable_core::Result<Value> {
		self.record(Call {
			field: Some(field.clone()),
			..Call::new("min", query, options)
		});
		Ok(self.total_of(f64::min))
	}

	async fn sum(
		&self,
		query: &QueryContext,
		field: &DataField,
		options: QueryOptions,
	) -> reinhardt_queryable_core::Result<Value> {
		self.record(Call {
			field: Some(field.clone()),
			..Call::new("sum", query, options)
		});
		Ok(self.total_of(|a, b| a + b))
	}

	async fn avg(
		&self,
		query: &QueryContext,
		field: &DataField,
		options: QueryOptions,
	) -> reinhardt_queryable_core::Result<Value> {
		self.record(Call {
			field: Some(field.clone()),
			..Call::new("avg", query, options)
		});
		let sum = self.orders.iter().map(|o| o.total).sum::<f64>();
		Ok(Value::Float(sum / self.orders.len().max(1) as f64))
	}

	async fn scalar(&self, query: &QueryContext, options: QueryOptions) -> reinhardt_queryable_core::Result<Value> {
		self.record(Call::new("scalar", query, options));
		Ok(self
			.orders
			.first()
			.map(|o| Value::Int(o.id))
			.unwrap_or(Value::Null))
	}

	async fn update(
		&self,
		query: &QueryContext,
		modification: &Modification,
		options: QueryOptions,
	) -> reinhardt_queryable_core::Result<u64> {
		self.record(Call {
			modification: Some(modification.clone()),
			..Call::new("update", query, options)
		});
		Ok(self.orders.len() as u64)
	}

	async fn delete(&self, query: &QueryContext, options: QueryOptions) -> reinhardt_queryable_core::Result<u64> {
		self.record(Call::new("delete", query, options));
		Ok(self.orders.len() as u64)
	}
}
