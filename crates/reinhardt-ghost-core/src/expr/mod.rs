//! Binding expressions.
//!
//! Templates reference store fields through a small, sandboxed expression
//! language: literals, identifiers bound to the top-level store keys, member
//! and index access, arithmetic, comparison, logical operators and the
//! conditional operator. Nothing else is reachable from an expression.
//!
//! An [`Expression`] is parsed on first use and the tree is kept, so a
//! malformed expression surfaces as [`EvalError::Parse`] when it is first
//! evaluated rather than when the template is rendered.
//!
//! ```
//! use reinhardt_ghost_core::expr::Expression;
//! use reinhardt_ghost_core::store::Store;
//! use reinhardt_ghost_core::value::Value;
//! use serde_json::json;
//!
//! let data = json!({"count": 2, "user": {"name": "Ada"}});
//! let store = Store::wrap(data.as_object().unwrap());
//!
//! let expression = Expression::new("count > 1 ? user.name : 'nobody'");
//! assert_eq!(expression.evaluate(&store).unwrap(), Value::from("Ada"));
//! ```

mod eval;
mod lexer;
mod parser;

use std::cell::OnceCell;
use std::fmt;

use crate::error::EvalError;
use crate::store::{Incoming, Store};
use crate::value::Value;

use self::parser::Expr;

/// A binding expression with its lazily parsed tree.
pub struct Expression {
	source: String,
	tree: OnceCell<Expr>,
}

impl Expression {
	/// Wraps `source` without parsing it.
	pub fn new(source: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			tree: OnceCell::new(),
		}
	}

	/// Parses `source` immediately.
	pub fn parse(source: impl Into<String>) -> Result<Self, EvalError> {
		let expression = Self::new(source);
		expression.tree()?;
		Ok(expression)
	}

	/// Returns the source text.
	pub fn source(&self) -> &str {
		&self.source
	}

	/// Returns true once the expression has been parsed successfully.
	pub fn is_parsed(&self) -> bool {
		self.tree.get().is_some()
	}

	fn tree(&self) -> Result<&Expr, EvalError> {
		if let Some(tree) = self.tree.get() {
			return Ok(tree);
		}
		let parsed = parser::parse(&self.source)?;
		Ok(self.tree.get_or_init(|| parsed))
	}

	/// Evaluates the expression with every top-level key of `scope` in
	/// scope under its own name.
	pub fn evaluate(&self, scope: &Store) -> Result<Value, EvalError> {
		eval::evaluate(self.tree()?, scope)
	}

	/// Treats the expression as an assignment target and writes `incoming`
	/// into it, running the leaf's reactive setter.
	pub fn assign(&self, scope: &Store, incoming: impl Into<Incoming>) -> Result<(), EvalError> {
		eval::assign(self.tree()?, &self.source, scope, incoming.into())
	}
}

impl fmt::Debug for Expression {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Expression")
			.field("source", &self.source)
			.field("parsed", &self.is_parsed())
			.finish()
	}
}

impl fmt::Display for Expression {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.source)
	}
}
