//! Executor defaults loaded from TOML

use crate::error::{QueryError, Result};
use crate::flags::IsolationLevel;
use crate::options::QueryOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Defaults an executor applies to every call
///
/// # Examples
///
/// ```
/// use reinhardt_queryable_core::QuerySettings;
///
/// let settings = QuerySettings::from_toml_str(r#"
/// default_timeout_ms = 1500
/// isolation_level = "read_committed"
/// "#).unwrap();
///
/// assert_eq!(settings.default_page_size, 20);
/// assert!(settings.default_options().timeout.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
	pub default_timeout_ms: Option<u64>,
	pub isolation_level: IsolationLevel,
	/// Page size used when a request leaves it at 0
	pub default_page_size: u64,
	pub max_page_size: u64,
}

impl Default for QuerySettings {
	fn default() -> Self {
		Self {
			default_timeout_ms: None,
			isolation_level: IsolationLevel::Unspecified,
			default_page_size: 20,
			max_page_size: 100,
		}
	}
}

impl QuerySettings {
	/// Parse settings from a TOML string
	pub fn from_toml_str(content: &str) -> Result<Self> {
		let settings: Self = toml::from_str(content)?;
		settings.validate()?;
		Ok(settings)
	}

	pub fn validate(&self) -> Result<()> {
		if self.default_page_size == 0 {
			return Err(QueryError::Settings(
				"default_page_size must be greater than zero".to_string(),
			));
		}
		if self.default_page_size > self.max_page_size {
			return Err(QueryError::Settings(format!(
				"default_page_size ({}) exceeds max_page_size ({})",
				self.default_page_size, self.max_page_size
			)));
		}
		Ok(())
	}

	/// Fresh per-call options carrying these defaults
	pub fn default_options(&self) -> QueryOptions {
		QueryOptions {
			isolation_level: self.isolation_level,
			timeout: self.default_timeout_ms.map(Duration::from_millis),
			..QueryOptions::default()
		}
	}

	/// Page size to use for a request, falling back to the default and capped at the maximum
	pub fn effective_page_size(&self, requested: u64) -> u64 {
		match requested {
			0 => self.default_page_size,
			n => n.min(self.max_page_size),
		}
	}
}
