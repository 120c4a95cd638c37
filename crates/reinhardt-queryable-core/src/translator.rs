//! Expression translation into the condition model
//!
//! Typed closures over [`Field`](crate::Field) columns never need a
//! translator. Textual predicates and selectors go through an
//! [`ExpressionTranslator`]; [`TextTranslator`] is the default, a regex based
//! parser for the common shapes:
//!
//! - comparisons: `total > 100`, `Order.status = 'paid'`, `a.x = b.y`
//! - `IS [NOT] NULL`, `[NOT] IN (...)`, `[NOT] LIKE '...'`, `[NOT] BETWEEN x AND y`
//! - `AND`/`OR` with the usual precedence, parentheses and a leading `NOT`
//!
//! Selectors are a column (`total`, `Order.total AS t`) or a formatter applied
//! to a column (`lower(name) AS lname`).

use crate::condition::{Condition, ConditionGroup, Connector, Criterion, CriterionOperator, CriterionValue};
use crate::error::{QueryError, Result};
use crate::field::{DataField, FieldRef};
use crate::value::Value;
use regex::Regex;
use std::sync::OnceLock;

/// Turns textual expressions into conditions and data fields
///
/// Implementations must be deterministic and must not touch any query state.
pub trait ExpressionTranslator: Send + Sync {
	/// Translate a predicate; the result is joined to its predecessor by `connector`
	fn translate_predicate(&self, expression: &str, connector: Connector) -> Result<Condition>;

	fn translate_field(&self, selector: &str) -> Result<DataField>;
}

/// Compiled regex patterns for predicate and selector parsing
struct Patterns {
	is_null: Regex,
	between: Regex,
	in_clause: Regex,
	like: Regex,
	comparison: Regex,
	column: Regex,
	formatted: Regex,
	number: Regex,
}

const FIELD: &str = r"[A-Za-z_]\w*(?:\.[A-Za-z_]\w*)?";

impl Patterns {
	fn new() -> Self {
		let compile = |pattern: String| Regex::new(&pattern).expect("translator pattern is valid");
		Self {
			// "field IS [NOT] NULL"
			is_null: compile(format!(r"(?i)^({FIELD})\s+IS\s+(NOT\s+)?NULL$")),
			// "field [NOT] BETWEEN low AND high"
			between: compile(format!(r"(?i)^({FIELD})\s+(NOT\s+)?BETWEEN\s+(.+?)\s+AND\s+(.+)$")),
			// "field [NOT] IN (v1, v2, ...)"
			in_clause: compile(format!(r"(?i)^({FIELD})\s+(NOT\s+)?IN\s*\((.*)\)$")),
			// "field [NOT] LIKE 'pattern'"
			like: compile(format!(r"(?i)^({FIELD})\s+(NOT\s+)?LIKE\s+(.+)$")),
			// "field op value"
			comparison: compile(format!(r"^({FIELD})\s*(==|=|!=|<>|<=|>=|<|>)\s*(.+)$")),
			// "field [AS alias]"
			column: compile(format!(r"(?i)^({FIELD})(?:\s+AS\s+(\w+))?$")),
			// "formatter(field) [AS alias]"
			formatted: compile(format!(r"(?i)^(\w+)\(\s*({FIELD})\s*\)(?:\s+AS\s+(\w+))?$")),
			number: compile(r"^-?\d+(\.\d+)?$".to_string()),
		}
	}
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn patterns() -> &'static Patterns {
	PATTERNS.get_or_init(Patterns::new)
}

/// Regex based translator for textual predicates and selectors
///
/// # Examples
///
/// ```
/// use reinhardt_queryable_core::{Connector, ExpressionTranslator, TextTranslator};
///
/// let translator = TextTranslator;
/// let condition = translator
///     .translate_predicate("status = 'paid' AND total > 100", Connector::And)
///     .unwrap();
/// assert_eq!(condition.len(), 2);
///
/// assert!(translator.translate_predicate("total >>> 1", Connector::And).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TextTranslator;

impl ExpressionTranslator for TextTranslator {
	fn translate_predicate(&self, expression: &str, connector: Connector) -> Result<Condition> {
		let condition = Self::parse(expression.trim(), expression)?;
		Ok(condition.with_connector(connector))
	}

	fn translate_field(&self, selector: &str) -> Result<DataField> {
		let selector = selector.trim();
		let p = patterns();

		if let Some(caps) = p.formatted.captures(selector) {
			let field = DataField::formatted(FieldRef::from(&caps[2]), &caps[1]);
			return Ok(match caps.get(3) {
				Some(alias) => field.with_alias(alias.as_str()),
				None => field,
			});
		}
		if let Some(caps) = p.column.captures(selector) {
			let field = DataField::column(FieldRef::from(&caps[1]));
			return Ok(match caps.get(2) {
				Some(alias) => field.with_alias(alias.as_str()),
				None => field,
			});
		}
		Err(QueryError::translation(selector, "unsupported field selector"))
	}
}

impl TextTranslator {
	fn parse(expr: &str, original: &str) -> Result<Condition> {
		if expr.is_empty() {
			return Err(QueryError::translation(original, "empty expression"));
		}

		// OR binds loosest, so split on it first
		let ors = split_top_level(expr, b"OR", original)?;
		if ors.len() > 1 {
			let parts = ors
				.into_iter()
				.map(|part| Self::parse(part, original))
				.collect::<Result<Vec<_>>>()?;
			return Ok(ConditionGroup::any(parts).into());
		}

		let ands = split_top_level(expr, b"AND", original)?;
		if ands.len() > 1 {
			let parts = ands
				.into_iter()
				.map(|part| Self::parse(part, original))
				.collect::<Result<Vec<_>>>()?;
			return Ok(ConditionGroup::all(parts).into());
		}

		if let Some(inner) = strip_wrapping_parens(expr) {
			let inner = Self::parse(inner.trim(), original)?;
			// Keep the grouping visible even around a single criterion
			return Ok(match inner {
				Condition::Criterion(_) => ConditionGroup::all([inner]).into(),
				group => group,
			});
		}

		if let Some(rest) = strip_keyword(expr, "NOT") {
			return Ok(Self::parse(rest, original)?.negate());
		}

		Self::parse_predicate(expr, original)
	}

	fn parse_predicate(expr: &str, original: &str) -> Result<Condition> {
		let p = patterns();

		if let Some(caps) = p.is_null.captures(expr) {
			let operator = if caps.get(2).is_some() {
				CriterionOperator::NotNull
			} else {
				CriterionOperator::IsNull
			};
			return Ok(Criterion::unary(FieldRef::from(&caps[1]), operator).into());
		}

		if let Some(caps) = p.between.captures(expr) {
			let field = FieldRef::from(&caps[1]);
			let low = parse_literal(&caps[3], original)?;
			let high = parse_literal(&caps[4], original)?;
			let range: Condition = ConditionGroup::all([
				Criterion::new(field.clone(), CriterionOperator::GreaterThanOrEqual, low).into(),
				Criterion::new(field, CriterionOperator::LessThanOrEqual, high).into(),
			])
			.into();
			return Ok(if caps.get(2).is_some() { range.negate() } else { range });
		}

		if let Some(caps) = p.in_clause.captures(expr) {
			let values = split_list(&caps[3])
				.into_iter()
				.map(|item| match parse_literal(item, original)? {
					CriterionValue::Value(v) => Ok(v),
					_ => Err(QueryError::translation(original, "IN lists accept literals only")),
				})
				.collect::<Result<Vec<Value>>>()?;
			let operator = if caps.get(2).is_some() {
				CriterionOperator::NotIn
			} else {
				CriterionOperator::In
			};
			return Ok(Criterion::list(FieldRef::from(&caps[1]), operator, values).into());
		}

		if let Some(caps) = p.like.captures(expr) {
			let CriterionValue::Value(Value::String(pattern)) = parse_literal(&caps[3], original)? else {
				return Err(QueryError::translation(original, "LIKE expects a quoted pattern"));
			};
			let (operator, text) = like_operator(&pattern, original)?;
			let criterion = Criterion::new(FieldRef::from(&caps[1]), operator, text);
			let condition = Condition::from(criterion);
			return Ok(if caps.get(2).is_some() {
				condition.negate()
			} else {
				condition
			});
		}

		if let Some(caps) = p.comparison.captures(expr) {
			let field = FieldRef::from(&caps[1]);
			let value = parse_literal(&caps[3], original)?;
			let operator = match &caps[2] {
				"=" | "==" => CriterionOperator::Equal,
				"!=" | "<>" => CriterionOperator::NotEqual,
				"<" => CriterionOperator::LessThan,
				"<=" => CriterionOperator::LessThanOrEqual,
				">" => CriterionOperator::GreaterThan,
				">=" => CriterionOperator::GreaterThanOrEqual,
				other => {
					return Err(QueryError::translation(original, format!("unknown operator `{other}`")));
				}
			};
			// `x = null` means IS NULL
			if let CriterionValue::Value(Value::Null) = value {
				return match operator {
					CriterionOperator::Equal => Ok(Criterion::unary(field, CriterionOperator::IsNull).into()),
					CriterionOperator::NotEqual => Ok(Criterion::unary(field, CriterionOperator::NotNull).into()),
					_ => Err(QueryError::translation(original, "null only compares with = or !=")),
				};
			}
			return Ok(Criterion::new(field, operator, value).into());
		}

		Err(QueryError::translation(original, format!("unsupported expression `{expr}`")))
	}
}

/// Map a SQL LIKE pattern onto the begin/end/contains operators
///
/// Only leading and trailing `%` have an operator to map to; any other
/// wildcard is rejected.
fn like_operator(pattern: &str, original: &str) -> Result<(CriterionOperator, String)> {
	let starts = pattern.starts_with('%');
	let ends = pattern.len() > 1 && pattern.ends_with('%');
	let text = pattern.trim_start_matches('%').trim_end_matches('%');
	if text.contains(['%', '_']) {
		return Err(QueryError::translation(
			original,
			format!("LIKE pattern `{pattern}` has a wildcard that only a leading or trailing `%` can express"),
		));
	}
	let operator = match (starts, ends) {
		(true, true) => CriterionOperator::Like,
		(false, true) => CriterionOperator::BeginLike,
		(true, false) => CriterionOperator::EndLike,
		(false, false) => CriterionOperator::Equal,
	};
	Ok((operator, text.to_string()))
}

fn parse_literal(raw: &str, original: &str) -> Result<CriterionValue> {
	let raw = raw.trim();
	let p = patterns();

	if let Some(quote) = raw.chars().next().filter(|c| *c == '\'' || *c == '"') {
		if raw.len() < 2 || !raw.ends_with(quote) {
			return Err(QueryError::translation(original, "unterminated string literal"));
		}
		let doubled = format!("{quote}{quote}");
		let text = raw[1..raw.len() - 1].replace(&doubled, &quote.to_string());
		return Ok(CriterionValue::Value(Value::String(text)));
	}

	match raw.to_ascii_lowercase().as_str() {
		"null" => return Ok(CriterionValue::Value(Value::Null)),
		"true" => return Ok(CriterionValue::Value(Value::Bool(true))),
		"false" => return Ok(CriterionValue::Value(Value::Bool(false))),
		_ => {}
	}

	if p.number.is_match(raw) {
		let value = match raw.parse::<i64>() {
			Ok(i) => Value::Int(i),
			Err(_) => raw
				.parse::<f64>()
				.map(Value::Float)
				.map_err(|e| QueryError::translation(original, e.to_string()))?,
		};
		return Ok(CriterionValue::Value(value));
	}

	if p.column.is_match(raw) && !raw.contains(char::is_whitespace) {
		return Ok(CriterionValue::Field(FieldRef::from(raw)));
	}

	Err(QueryError::translation(original, format!("unsupported value `{raw}`")))
}

/// Split on `keyword` where it stands alone at parenthesis depth 0, outside quotes
///
/// The AND belonging to a BETWEEN is not a split point.
fn split_top_level<'a>(expr: &'a str, keyword: &[u8], original: &str) -> Result<Vec<&'a str>> {
	let bytes = expr.as_bytes();
	let mut parts = Vec::new();
	let mut depth = 0usize;
	let mut quote: Option<u8> = None;
	let mut pending_between = false;
	let mut start = 0;
	let mut i = 0;

	while i < bytes.len() {
		let b = bytes[i];
		if let Some(q) = quote {
			if b == q {
				quote = None;
			}
			i += 1;
			continue;
		}
		match b {
			b'\'' | b'"' => quote = Some(b),
			b'(' => depth += 1,
			b')' => {
				depth = depth
					.checked_sub(1)
					.ok_or_else(|| QueryError::translation(original, "unbalanced parentheses"))?;
			}
			_ if depth == 0 && is_word_at(bytes, i, b"BETWEEN") => {
				pending_between = true;
				i += b"BETWEEN".len();
				continue;
			}
			_ if depth == 0 && is_word_at(bytes, i, keyword) => {
				if keyword == b"AND" && pending_between {
					pending_between = false;
				} else {
					parts.push(expr[start..i].trim());
					start = i + keyword.len();
				}
				i += keyword.len();
				continue;
			}
			_ => {}
		}
		i += 1;
	}

	if quote.is_some() {
		return Err(QueryError::translation(original, "unterminated string literal"));
	}
	if depth != 0 {
		return Err(QueryError::translation(original, "unbalanced parentheses"));
	}
	parts.push(expr[start..].trim());
	Ok(parts)
}

fn is_word_at(bytes: &[u8], i: usize, word: &[u8]) -> bool {
	let end = i + word.len();
	end <= bytes.len()
		&& bytes[i..end].eq_ignore_ascii_case(word)
		&& (i == 0 || bytes[i - 1].is_ascii_whitespace() || bytes[i - 1] == b')')
		&& bytes
			.get(end)
			.is_none_or(|c| c.is_ascii_whitespace() || *c == b'(')
}

/// Inner text when the whole expression is one parenthesized group
fn strip_wrapping_parens(expr: &str) -> Option<&str> {
	let inner = expr.strip_prefix('(')?.strip_suffix(')')?;
	let mut depth = 0usize;
	let mut quote: Option<char> = None;
	for c in inner.chars() {
		match (quote, c) {
			(Some(q), c) if c == q => quote = None,
			(Some(_), _) => {}
			(None, '\'' | '"') => quote = Some(c),
			(None, '(') => depth += 1,
			// The opening parenthesis closes before the end
			(None, ')') => depth = depth.checked_sub(1)?,
			_ => {}
		}
	}
	(depth == 0).then_some(inner)
}

fn strip_keyword<'a>(expr: &'a str, keyword: &str) -> Option<&'a str> {
	let bytes = expr.as_bytes();
	if !is_word_at(bytes, 0, keyword.as_bytes()) {
		return None;
	}
	Some(expr[keyword.len()..].trim_start())
}

/// Split an IN list on commas outside quotes
fn split_list(list: &str) -> Vec<&str> {
	let mut items = Vec::new();
	let mut quote: Option<char> = None;
	let mut start = 0;
	for (i, c) in list.char_indices() {
		match (quote, c) {
			(Some(q), c) if c == q => quote = None,
			(Some(_), _) => {}
			(None, '\'' | '"') => quote = Some(c),
			(None, ',') => {
				items.push(list[start..i].trim());
				start = i + 1;
			}
			_ => {}
		}
	}
	let last = list[start..].trim();
	if !last.is_empty() || !items.is_empty() {
		items.push(last);
	}
	items
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn translate(expr: &str) -> Condition {
		TextTranslator.translate_predicate(expr, Connector::And).unwrap()
	}

	fn criterion(condition: &Condition) -> &Criterion {
		match condition {
			Condition::Criterion(c) => c,
			Condition::Group(_) => panic!("Expected criterion"),
		}
	}

	#[rstest]
	#[case("total > 100", CriterionOperator::GreaterThan)]
	#[case("total >= 100", CriterionOperator::GreaterThanOrEqual)]
	#[case("total <> 100", CriterionOperator::NotEqual)]
	#[case("total == 100", CriterionOperator::Equal)]
	fn test_comparison(#[case] expr: &str, #[case] operator: CriterionOperator) {
		let condition = translate(expr);
		let c = criterion(&condition);
		assert_eq!(c.field, FieldRef::new("total"));
		assert_eq!(c.operator, operator);
		assert!(matches!(c.value, CriterionValue::Value(Value::Int(100))));
	}

	#[rstest]
	fn test_qualified_field_and_field_value() {
		let condition = translate("Order.customer_id = Customer.id");
		let c = criterion(&condition);
		assert_eq!(c.field, FieldRef::qualified("Order", "customer_id"));
		assert!(matches!(&c.value, CriterionValue::Field(f) if *f == FieldRef::qualified("Customer", "id")));
	}

	#[rstest]
	#[case("email IS NULL", CriterionOperator::IsNull)]
	#[case("email is not null", CriterionOperator::NotNull)]
	#[case("email = null", CriterionOperator::IsNull)]
	#[case("email != NULL", CriterionOperator::NotNull)]
	fn test_null_checks(#[case] expr: &str, #[case] operator: CriterionOperator) {
		let condition = translate(expr);
		assert_eq!(criterion(&condition).operator, operator);
	}

	#[rstest]
	#[case("name LIKE 'ab%'", CriterionOperator::BeginLike)]
	#[case("name LIKE '%ab'", CriterionOperator::EndLike)]
	#[case("name LIKE '%ab%'", CriterionOperator::Like)]
	#[case("name LIKE 'ab'", CriterionOperator::Equal)]
	fn test_like_patterns(#[case] expr: &str, #[case] operator: CriterionOperator) {
		let condition = translate(expr);
		let c = criterion(&condition);
		assert_eq!(c.operator, operator);
		assert!(matches!(&c.value, CriterionValue::Value(Value::String(s)) if s == "ab"));
	}

	#[rstest]
	fn test_not_like_is_negated() {
		let condition = translate("name NOT LIKE 'x%'");
		let c = criterion(&condition);
		assert!(c.negated);
		assert_eq!(c.effective_operator(), CriterionOperator::NotBeginLike);
	}

	#[rstest]
	fn test_in_list_with_quoted_commas() {
		let condition = translate("status IN ('a,b', 'it''s', \"c\")");
		let c = criterion(&condition);
		assert_eq!(c.operator, CriterionOperator::In);
		let CriterionValue::List(values) = &c.value else {
			panic!("Expected list");
		};
		assert_eq!(
			values,
			&vec![
				Value::String("a,b".into()),
				Value::String("it's".into()),
				Value::String("c".into())
			]
		);
	}

	#[rstest]
	fn test_between_is_a_range_group() {
		let condition = translate("age BETWEEN 18 AND 65 AND active = true");
		let Condition::Group(outer) = &condition else {
			panic!("Expected group");
		};
		assert_eq!(outer.conditions.len(), 2);
		assert_eq!(outer.conditions[0].len(), 2);
	}

	#[rstest]
	fn test_and_binds_tighter_than_or() {
		let condition = translate("a = 1 OR b = 2 AND c = 3");
		let Condition::Group(group) = &condition else {
			panic!("Expected group");
		};
		assert_eq!(group.conditions.len(), 2);
		assert_eq!(group.conditions[1].connector(), Connector::Or);
		assert_eq!(group.conditions[1].len(), 2);
	}

	#[rstest]
	fn test_parentheses_and_not() {
		let condition = translate("NOT (a = 1 OR b = 2) AND c = 'x'");
		let Condition::Group(group) = &condition else {
			panic!("Expected group");
		};
		assert!(group.conditions[0].is_negated());
		assert_eq!(group.conditions[0].len(), 2);
		assert!(!group.conditions[1].is_negated());
	}

	#[rstest]
	fn test_connector_is_applied() {
		let condition = TextTranslator
			.translate_predicate("a = 1", Connector::Or)
			.unwrap();
		assert_eq!(condition.connector(), Connector::Or);
	}

	#[rstest]
	#[case("")]
	#[case("total >>> 1")]
	#[case("name = 'open")]
	#[case("(a = 1")]
	#[case("a = 1 AND")]
	#[case("name LIKE other")]
	#[case("id IN (other.id)")]
	#[case("just words here")]
	#[case("name LIKE 'a%b'")]
	#[case("name LIKE '%a%b%'")]
	#[case("name LIKE 'a_c'")]
	#[case("name NOT LIKE '_bc%'")]
	fn test_rejects_unsupported_shapes(#[case] expr: &str) {
		let err = TextTranslator
			.translate_predicate(expr, Connector::And)
			.unwrap_err();
		assert!(matches!(err, QueryError::Translation { .. }));
	}

	#[rstest]
	fn test_translate_field_selectors() {
		let plain = TextTranslator.translate_field("Order.total AS t").unwrap();
		assert_eq!(plain.field_ref(), &FieldRef::qualified("Order", "total"));
		assert_eq!(plain.alias(), Some("t"));

		let formatted = TextTranslator.translate_field("lower(name)").unwrap();
		assert!(formatted.is_formatted());
		assert_eq!(formatted.name(), "name");

		assert!(TextTranslator.translate_field("a + b").is_err());
	}
}
