//! Visibility and value passes over a component's bindings.

use reinhardt_ghost_dom::Node;

use crate::binding::{BindingRegistry, VisibilityChange};
use crate::error::EvalError;
use crate::store::Store;

/// What a reconciliation changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
	/// Nodes put back in place of their anchors.
	pub shown: usize,
	/// Nodes replaced by their anchors.
	pub hidden: usize,
	/// Value bindings whose node received a value or text.
	pub values_written: usize,
}

impl ReconcileReport {
	/// Number of node moves performed by the visibility pass.
	pub fn node_moves(&self) -> usize {
		self.shown + self.hidden
	}
}

/// Runs the visibility pass, then the value pass.
///
/// `origin` is the node whose input caused the write; its own value
/// binding is skipped so the field being edited is left alone.
pub fn reconcile(
	registry: &BindingRegistry,
	store: &Store,
	origin: Option<&Node>,
) -> Result<ReconcileReport, EvalError> {
	let mut report = ReconcileReport::default();
	reconcile_visibility(registry, store, &mut report)?;
	reconcile_values(registry, store, origin, &mut report)?;
	tracing::trace!(
		shown = report.shown,
		hidden = report.hidden,
		values_written = report.values_written,
		"reconciled bindings"
	);
	Ok(report)
}

/// Shows or hides every visibility-bound node according to its expression.
pub fn reconcile_visibility(
	registry: &BindingRegistry,
	store: &Store,
	report: &mut ReconcileReport,
) -> Result<(), EvalError> {
	for binding in registry.visibility() {
		let visible = binding.expression().evaluate(store)?.is_truthy();
		match binding.apply(visible) {
			Ok(VisibilityChange::Shown) => report.shown += 1,
			Ok(VisibilityChange::Hidden) => report.hidden += 1,
			Ok(VisibilityChange::Unchanged) => {}
			Err(error) => tracing::warn!(
				node = %binding.node().id(),
				expression = binding.expression().source(),
				%error,
				"could not move node for visibility binding"
			),
		}
	}
	Ok(())
}

/// Pushes every value-bound expression into its node, except `origin`.
pub fn reconcile_values(
	registry: &BindingRegistry,
	store: &Store,
	origin: Option<&Node>,
	report: &mut ReconcileReport,
) -> Result<(), EvalError> {
	for binding in registry.values() {
		let node = binding.node();
		if origin.is_some_and(|origin| origin == node) {
			continue;
		}
		let value = binding.expression().evaluate(store)?;
		let rendered = if value.is_nullish() {
			String::new()
		} else {
			value.to_string()
		};
		if node.is_input_capable() {
			node.set_value(rendered);
		} else {
			node.set_text_content(rendered);
		}
		report.values_written += 1;
	}
	Ok(())
}
