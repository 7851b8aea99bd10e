//! Node to expression associations collected while rendering.

use std::cell::Cell;

use reinhardt_ghost_dom::{DomResult, Node};

use crate::expr::Expression;

/// A node shown or hidden according to an expression.
///
/// While hidden, the node is replaced in the tree by its anchor comment.
#[derive(Debug)]
pub struct VisibilityBinding {
	node: Node,
	expression: Expression,
	anchor: Node,
	hidden: Cell<bool>,
}

/// Outcome of applying a visibility decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityChange {
	/// The node was put back in place of its anchor.
	Shown,
	/// The node was replaced by its anchor.
	Hidden,
	/// The node was already in the requested state.
	Unchanged,
}

impl VisibilityBinding {
	fn new(node: Node, expression: Expression, anchor_text: &str) -> Self {
		Self {
			node,
			expression,
			anchor: Node::comment(anchor_text),
			hidden: Cell::new(false),
		}
	}

	/// The bound node.
	pub fn node(&self) -> &Node {
		&self.node
	}

	/// The bound expression.
	pub fn expression(&self) -> &Expression {
		&self.expression
	}

	/// The placeholder used while the node is hidden.
	pub fn anchor(&self) -> &Node {
		&self.anchor
	}

	/// Returns true while the node is replaced by its anchor.
	pub fn is_hidden(&self) -> bool {
		self.hidden.get()
	}

	/// Moves the node or its anchor into the tree so that the node is
	/// visible exactly when `visible` is true.
	pub(crate) fn apply(&self, visible: bool) -> DomResult<VisibilityChange> {
		match (visible, self.hidden.get()) {
			(true, true) => {
				self.anchor.replace_with(&self.node)?;
				self.hidden.set(false);
				Ok(VisibilityChange::Shown)
			}
			(false, false) => {
				self.node.replace_with(&self.anchor)?;
				self.hidden.set(true);
				Ok(VisibilityChange::Hidden)
			}
			_ => Ok(VisibilityChange::Unchanged),
		}
	}
}

/// A node whose value or text follows an expression.
#[derive(Debug)]
pub struct ValueBinding {
	node: Node,
	expression: Expression,
}

impl ValueBinding {
	/// The bound node.
	pub fn node(&self) -> &Node {
		&self.node
	}

	/// The bound expression.
	pub fn expression(&self) -> &Expression {
		&self.expression
	}
}

/// The two binding tables of a component, in registration order.
#[derive(Debug, Default)]
pub struct BindingRegistry {
	visibility: Vec<VisibilityBinding>,
	values: Vec<ValueBinding>,
}

impl BindingRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a visibility binding. Returns false if `node` already has one.
	pub fn register_visibility(
		&mut self,
		node: Node,
		expression: impl Into<String>,
		anchor_text: &str,
	) -> bool {
		if self.visibility.iter().any(|binding| binding.node == node) {
			return false;
		}
		self.visibility.push(VisibilityBinding::new(
			node,
			Expression::new(expression),
			anchor_text,
		));
		true
	}

	/// Registers a value binding. Returns false if `node` already has one.
	pub fn register_value(&mut self, node: Node, expression: impl Into<String>) -> bool {
		if self.value_binding(&node).is_some() {
			return false;
		}
		self.values.push(ValueBinding {
			node,
			expression: Expression::new(expression),
		});
		true
	}

	/// Visibility bindings in registration order.
	pub fn visibility(&self) -> &[VisibilityBinding] {
		&self.visibility
	}

	/// Value bindings in registration order.
	pub fn values(&self) -> &[ValueBinding] {
		&self.values
	}

	/// Returns the value binding registered for `node`.
	pub fn value_binding(&self, node: &Node) -> Option<&ValueBinding> {
		self.values.iter().find(|binding| &binding.node == node)
	}

	/// Total number of bindings.
	pub fn len(&self) -> usize {
		self.visibility.len() + self.values.len()
	}

	/// Returns true when nothing is bound.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
