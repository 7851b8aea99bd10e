//! Dynamically typed values held by a store and produced by expressions.

use std::fmt;

use serde_json::Value as JsonValue;

use crate::store::Store;

/// A store or expression value.
///
/// Coercions follow the loose rules template authors expect: empty strings
/// and zero are falsy, strings convert to numbers when compared with them,
/// and numbers print without a trailing `.0`.
#[derive(Debug, Clone, Default)]
pub enum Value {
	/// No value.
	#[default]
	Undefined,
	/// Explicit empty value.
	Null,
	/// Boolean.
	Bool(bool),
	/// Double precision number.
	Number(f64),
	/// String.
	String(String),
	/// Nested store (read-only reference).
	Object(Store),
}

impl Value {
	/// Returns the name of this value's type, as used in error messages.
	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Undefined => "undefined",
			Self::Null => "null",
			Self::Bool(_) => "boolean",
			Self::Number(_) => "number",
			Self::String(_) => "string",
			Self::Object(_) => "object",
		}
	}

	/// Returns true for `undefined` and `null`.
	pub fn is_nullish(&self) -> bool {
		matches!(self, Self::Undefined | Self::Null)
	}

	/// Coerces to a boolean.
	pub fn is_truthy(&self) -> bool {
		match self {
			Self::Undefined | Self::Null => false,
			Self::Bool(value) => *value,
			Self::Number(number) => *number != 0.0 && !number.is_nan(),
			Self::String(text) => !text.is_empty(),
			Self::Object(_) => true,
		}
	}

	/// Coerces to a number.
	pub fn to_number(&self) -> f64 {
		match self {
			Self::Undefined => f64::NAN,
			Self::Null => 0.0,
			Self::Bool(value) => f64::from(u8::from(*value)),
			Self::Number(number) => *number,
			Self::String(text) => parse_number(text),
			Self::Object(_) => f64::NAN,
		}
	}

	/// Converts objects to their string form and leaves primitives alone.
	pub(crate) fn to_primitive(&self) -> Value {
		match self {
			Self::Object(_) => Self::String(self.to_string()),
			other => other.clone(),
		}
	}

	/// Strict equality: same type and same value; objects by identity.
	pub fn strict_equals(&self, other: &Value) -> bool {
		match (self, other) {
			(Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Number(a), Self::Number(b)) => a == b,
			(Self::String(a), Self::String(b)) => a == b,
			(Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
			_ => false,
		}
	}

	/// Loose equality with type coercion.
	pub fn loose_equals(&self, other: &Value) -> bool {
		match (self, other) {
			(a, b) if std::mem::discriminant(a) == std::mem::discriminant(b) => a.strict_equals(b),
			(a, b) if a.is_nullish() && b.is_nullish() => true,
			(a, b) if a.is_nullish() || b.is_nullish() => false,
			(Self::Number(a), Self::String(_)) => *a == other.to_number(),
			(Self::String(_), Self::Number(b)) => self.to_number() == *b,
			(Self::Bool(_), _) => Self::Number(self.to_number()).loose_equals(other),
			(_, Self::Bool(_)) => self.loose_equals(&Self::Number(other.to_number())),
			(Self::Object(_), _) => self.to_primitive().loose_equals(other),
			(_, Self::Object(_)) => self.loose_equals(&other.to_primitive()),
			_ => false,
		}
	}

	/// Builds a value from JSON. Objects and arrays become detached stores.
	pub fn from_json(json: &JsonValue) -> Self {
		match json {
			JsonValue::Null => Self::Null,
			JsonValue::Bool(value) => Self::Bool(*value),
			JsonValue::Number(number) => Self::Number(number.as_f64().unwrap_or(f64::NAN)),
			JsonValue::String(text) => Self::String(text.clone()),
			JsonValue::Array(_) | JsonValue::Object(_) => Self::Object(Store::from_json(json)),
		}
	}

	/// Exports the value as JSON. `undefined` and non-finite numbers become
	/// `null`.
	pub fn to_json(&self) -> JsonValue {
		match self {
			Self::Undefined | Self::Null => JsonValue::Null,
			Self::Bool(value) => JsonValue::Bool(*value),
			Self::Number(number) => number_to_json(*number),
			Self::String(text) => JsonValue::String(text.clone()),
			Self::Object(store) => store.to_json(),
		}
	}
}

fn parse_number(text: &str) -> f64 {
	let trimmed = text.trim();
	if trimmed.is_empty() {
		return 0.0;
	}
	let (negative, unsigned) = match trimmed.strip_prefix('-') {
		Some(rest) => (true, rest),
		None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
	};
	if unsigned == "Infinity" {
		return if negative {
			f64::NEG_INFINITY
		} else {
			f64::INFINITY
		};
	}
	// `str::parse` also takes `inf` and `nan`; only exponents may use letters.
	if unsigned
		.bytes()
		.any(|byte| byte.is_ascii_alphabetic() && byte != b'e' && byte != b'E')
	{
		return f64::NAN;
	}
	trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn number_to_json(number: f64) -> JsonValue {
	if number.fract() == 0.0 && number.abs() < 9_007_199_254_740_992.0 {
		return JsonValue::from(number as i64);
	}
	serde_json::Number::from_f64(number)
		.map(JsonValue::Number)
		.unwrap_or(JsonValue::Null)
}

fn format_number(number: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
	if number.is_nan() {
		f.write_str("NaN")
	} else if number.is_infinite() {
		f.write_str(if number > 0.0 { "Infinity" } else { "-Infinity" })
	} else if number == 0.0 {
		f.write_str("0")
	} else if number.fract() == 0.0 {
		write!(f, "{number:.0}")
	} else {
		write!(f, "{number}")
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Undefined => f.write_str("undefined"),
			Self::Null => f.write_str("null"),
			Self::Bool(value) => write!(f, "{value}"),
			Self::Number(number) => format_number(*number, f),
			Self::String(text) => f.write_str(text),
			Self::Object(_) => f.write_str("[object Object]"),
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		self.strict_equals(other)
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Number(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Self::Number(f64::from(value))
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Number(value as f64)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::String(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}

impl From<Store> for Value {
	fn from(store: Store) -> Self {
		Self::Object(store)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case(Value::Undefined, false)]
	#[case(Value::Null, false)]
	#[case(Value::Bool(false), false)]
	#[case(Value::Number(0.0), false)]
	#[case(Value::Number(f64::NAN), false)]
	#[case(Value::from(""), false)]
	#[case(Value::Number(-1.5), true)]
	#[case(Value::from("0"), true)]
	#[case(Value::Object(Store::empty()), true)]
	fn test_truthiness(#[case] value: Value, #[case] expected: bool) {
		assert_eq!(value.is_truthy(), expected);
	}

	#[rstest]
	#[case("", 0.0)]
	#[case("  42 ", 42.0)]
	#[case("1.5e2", 150.0)]
	#[case("-Infinity", f64::NEG_INFINITY)]
	fn test_string_to_number(#[case] text: &str, #[case] expected: f64) {
		assert_eq!(Value::from(text).to_number(), expected);
	}

	#[rstest]
	#[case("abc")]
	#[case("inf")]
	#[case("nan")]
	#[case("12px")]
	fn test_string_to_number_not_a_number(#[case] text: &str) {
		assert!(Value::from(text).to_number().is_nan());
	}

	#[rstest]
	#[case(Value::Number(5.0), "5")]
	#[case(Value::Number(-0.0), "0")]
	#[case(Value::Number(2.25), "2.25")]
	#[case(Value::Number(f64::NAN), "NaN")]
	#[case(Value::Number(f64::INFINITY), "Infinity")]
	#[case(Value::Bool(true), "true")]
	#[case(Value::Undefined, "undefined")]
	#[case(Value::Object(Store::empty()), "[object Object]")]
	fn test_display(#[case] value: Value, #[case] expected: &str) {
		assert_eq!(value.to_string(), expected);
	}

	#[rstest]
	#[case(Value::Null, Value::Undefined, true)]
	#[case(Value::Null, Value::Number(0.0), false)]
	#[case(Value::Number(1.0), Value::from("1"), true)]
	#[case(Value::Bool(true), Value::Number(1.0), true)]
	#[case(Value::Bool(false), Value::from(""), true)]
	#[case(Value::from("a"), Value::from("b"), false)]
	#[case(Value::Number(f64::NAN), Value::Number(f64::NAN), false)]
	fn test_loose_equality(#[case] left: Value, #[case] right: Value, #[case] expected: bool) {
		assert_eq!(left.loose_equals(&right), expected);
		assert_eq!(right.loose_equals(&left), expected);
	}

	#[rstest]
	fn test_strict_equality_does_not_coerce() {
		assert!(!Value::Number(1.0).strict_equals(&Value::from("1")));
		assert!(!Value::Null.strict_equals(&Value::Undefined));

		let store = Store::empty();
		assert!(Value::Object(store.clone()).strict_equals(&Value::Object(store)));
		assert!(!Value::Object(Store::empty()).strict_equals(&Value::Object(Store::empty())));
	}

	#[rstest]
	fn test_json_round_trip_keeps_integers() {
		let value = Value::from_json(&json!({"count": 3, "ratio": 0.5, "tags": ["a"]}));

		assert_eq!(
			value.to_json(),
			json!({"count": 3, "ratio": 0.5, "tags": {"0": "a"}})
		);
		assert_eq!(Value::Number(f64::NAN).to_json(), JsonValue::Null);
	}
}
