//! Page requests and page results
//!
//! A [`PagingFilter`] is the caller-facing form of a paging window;
//! [`QueryContext::paginate`](crate::QueryContext::paginate) turns it into
//! skip/take counts. [`PagingInfo`] is what an executor hands back.

use serde::{Deserialize, Serialize};

/// A 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PagingFilter {
	pub page: u64,
	pub page_size: u64,
}

impl PagingFilter {
	/// Page 0 is treated as page 1
	pub fn create(page: u64, page_size: u64) -> Self {
		Self { page, page_size }
	}

	/// Rows to skip before this page
	pub fn skip(&self) -> i64 {
		let skipped = self.page.max(1).saturating_sub(1).saturating_mul(self.page_size);
		i64::try_from(skipped).unwrap_or(i64::MAX)
	}

	/// Rows on this page
	pub fn take(&self) -> i64 {
		i64::try_from(self.page_size).unwrap_or(i64::MAX)
	}
}

/// One materialized page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagingInfo<T> {
	pub page: u64,
	pub page_size: u64,
	pub total_count: u64,
	pub items: Vec<T>,
}

impl<T> PagingInfo<T> {
	pub fn new(filter: PagingFilter, total_count: u64, items: Vec<T>) -> Self {
		Self {
			page: filter.page.max(1),
			page_size: filter.page_size,
			total_count,
			items,
		}
	}

	/// Number of pages needed for `total_count` rows
	pub fn page_count(&self) -> u64 {
		if self.page_size == 0 {
			return 0;
		}
		self.total_count.div_ceil(self.page_size)
	}

	pub fn has_next(&self) -> bool {
		self.page < self.page_count()
	}

	pub fn has_previous(&self) -> bool {
		self.page > 1
	}

	/// Convert the items, keeping the paging numbers
	pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagingInfo<U> {
		PagingInfo {
			page: self.page,
			page_size: self.page_size,
			total_count: self.total_count,
			items: self.items.into_iter().map(f).collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(1, 10, 0, 10)]
	#[case(2, 10, 10, 10)]
	#[case(5, 25, 100, 25)]
	#[case(0, 10, 0, 10)]
	fn test_skip_and_take(
		#[case] page: u64,
		#[case] page_size: u64,
		#[case] skip: i64,
		#[case] take: i64,
	) {
		let filter = PagingFilter::create(page, page_size);
		assert_eq!(filter.skip(), skip);
		assert_eq!(filter.take(), take);
	}

	#[rstest]
	fn test_skip_saturates() {
		let filter = PagingFilter::create(u64::MAX, u64::MAX);
		assert_eq!(filter.skip(), i64::MAX);
	}

	#[rstest]
	#[case(0, 0)]
	#[case(10, 1)]
	#[case(11, 2)]
	#[case(40, 4)]
	fn test_page_count(#[case] total: u64, #[case] expected: u64) {
		let info = PagingInfo::<()>::new(PagingFilter::create(1, 10), total, Vec::new());
		assert_eq!(info.page_count(), expected);
	}

	#[rstest]
	fn test_navigation_flags() {
		let info = PagingInfo::new(PagingFilter::create(2, 10), 25, vec![1, 2, 3]);
		assert!(info.has_next());
		assert!(info.has_previous());

		let last = info.map(|n| n * 2);
		assert_eq!(last.items, vec![2, 4, 6]);
		assert_eq!(last.page, 2);
	}
}
