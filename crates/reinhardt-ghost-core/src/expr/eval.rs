//! Tree-walking evaluation against a store scope.

use crate::error::EvalError;
use crate::expr::parser::{BinaryOp, Expr, Literal, LogicalOp, UnaryOp};
use crate::store::{Incoming, Store};
use crate::value::Value;

pub(crate) fn evaluate(expr: &Expr, scope: &Store) -> Result<Value, EvalError> {
	match expr {
		Expr::Literal(literal) => Ok(match literal {
			Literal::Undefined => Value::Undefined,
			Literal::Null => Value::Null,
			Literal::Bool(value) => Value::Bool(*value),
			Literal::Number(number) => Value::Number(*number),
			Literal::String(text) => Value::String(text.clone()),
		}),
		Expr::Identifier(name) => lookup(name, scope),
		Expr::Member { object, property } => {
			let target = evaluate(object, scope)?;
			read_property(&target, property)
		}
		Expr::Index { object, index } => {
			let target = evaluate(object, scope)?;
			let key = evaluate(index, scope)?.to_string();
			read_property(&target, &key)
		}
		Expr::Unary { op, operand } => {
			let value = evaluate(operand, scope)?;
			Ok(match op {
				UnaryOp::Not => Value::Bool(!value.is_truthy()),
				UnaryOp::Negate => Value::Number(-value.to_number()),
				UnaryOp::Plus => Value::Number(value.to_number()),
			})
		}
		Expr::Logical { op, left, right } => {
			let left = evaluate(left, scope)?;
			let short_circuit = match op {
				LogicalOp::And => !left.is_truthy(),
				LogicalOp::Or => left.is_truthy(),
			};
			if short_circuit {
				Ok(left)
			} else {
				evaluate(right, scope)
			}
		}
		Expr::Conditional {
			test,
			consequent,
			alternate,
		} => {
			if evaluate(test, scope)?.is_truthy() {
				evaluate(consequent, scope)
			} else {
				evaluate(alternate, scope)
			}
		}
		Expr::Binary { op, left, right } => {
			let left = evaluate(left, scope)?;
			let right = evaluate(right, scope)?;
			Ok(binary(*op, &left, &right))
		}
	}
}

/// Writes `incoming` through the place denoted by `expr`.
pub(crate) fn assign(
	expr: &Expr,
	source: &str,
	scope: &Store,
	incoming: Incoming,
) -> Result<(), EvalError> {
	let (target, key) = match expr {
		Expr::Identifier(name) => (scope.clone(), name.clone()),
		Expr::Member { object, property } => (place_owner(object, scope)?, property.clone()),
		Expr::Index { object, index } => {
			let owner = place_owner(object, scope)?;
			(owner, evaluate(index, scope)?.to_string())
		}
		_ => return Err(EvalError::InvalidAssignmentTarget(source.to_string())),
	};
	if let Some(Value::Object(_)) = target.get(&key) {
		return Err(EvalError::InvalidAssignmentTarget(source.to_string()));
	}
	target.set(&key, incoming)?;
	Ok(())
}

fn place_owner(object: &Expr, scope: &Store) -> Result<Store, EvalError> {
	match evaluate(object, scope)? {
		Value::Object(store) => Ok(store),
		other => Err(EvalError::Type(format!(
			"cannot set properties of {}",
			describe_value(&other)
		))),
	}
}

fn lookup(name: &str, scope: &Store) -> Result<Value, EvalError> {
	if let Some(value) = scope.get(name) {
		return Ok(value);
	}
	match name {
		"NaN" => Ok(Value::Number(f64::NAN)),
		"Infinity" => Ok(Value::Number(f64::INFINITY)),
		_ => Err(EvalError::UndefinedIdentifier(name.to_string())),
	}
}

fn describe_value(value: &Value) -> String {
	match value {
		Value::Undefined | Value::Null => value.to_string(),
		other => format!("a {}", other.type_name()),
	}
}

fn read_property(target: &Value, key: &str) -> Result<Value, EvalError> {
	match target {
		Value::Undefined | Value::Null => Err(EvalError::Type(format!(
			"cannot read properties of {target} (reading '{key}')"
		))),
		Value::Object(store) => Ok(store.get(key).unwrap_or_default()),
		Value::String(text) => Ok(string_property(text, key)),
		Value::Bool(_) | Value::Number(_) => Ok(Value::Undefined),
	}
}

fn string_property(text: &str, key: &str) -> Value {
	if key == "length" {
		return Value::Number(text.encode_utf16().count() as f64);
	}
	key.parse::<usize>()
		.ok()
		.and_then(|index| text.chars().nth(index))
		.map(|c| Value::String(c.to_string()))
		.unwrap_or_default()
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
	match op {
		BinaryOp::Add => add(left, right),
		BinaryOp::Subtract => Value::Number(left.to_number() - right.to_number()),
		BinaryOp::Multiply => Value::Number(left.to_number() * right.to_number()),
		BinaryOp::Divide => Value::Number(left.to_number() / right.to_number()),
		BinaryOp::Remainder => Value::Number(left.to_number() % right.to_number()),
		BinaryOp::Less => Value::Bool(compare(left, right, |a, b| a < b, |a, b| a < b)),
		BinaryOp::LessEqual => Value::Bool(compare(left, right, |a, b| a <= b, |a, b| a <= b)),
		BinaryOp::Greater => Value::Bool(compare(left, right, |a, b| a > b, |a, b| a > b)),
		BinaryOp::GreaterEqual => Value::Bool(compare(left, right, |a, b| a >= b, |a, b| a >= b)),
		BinaryOp::LooseEqual => Value::Bool(left.loose_equals(right)),
		BinaryOp::LooseNotEqual => Value::Bool(!left.loose_equals(right)),
		BinaryOp::StrictEqual => Value::Bool(left.strict_equals(right)),
		BinaryOp::StrictNotEqual => Value::Bool(!left.strict_equals(right)),
	}
}

fn add(left: &Value, right: &Value) -> Value {
	let left = left.to_primitive();
	let right = right.to_primitive();
	if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
		return Value::String(format!("{left}{right}"));
	}
	Value::Number(left.to_number() + right.to_number())
}

fn compare(
	left: &Value,
	right: &Value,
	strings: fn(&str, &str) -> bool,
	numbers: fn(f64, f64) -> bool,
) -> bool {
	match (left.to_primitive(), right.to_primitive()) {
		(Value::String(a), Value::String(b)) => strings(&a, &b),
		(a, b) => numbers(a.to_number(), b.to_number()),
	}
}
