//! The render pass: markup to a bound, detached subtree.

use std::rc::Rc;

use futures::future::join_all;
use reinhardt_ghost_dom::{DomResult, EventType, Node, parse_fragment};

use crate::component::{Component, ComponentInner};
use crate::error::RenderError;
use crate::loader::{self, AncestorChain};

/// Renders `markup` for `component`.
///
/// Bindings and listeners are registered once, here. Sub-components are
/// loaded with `chain`, which already includes `component`. The subtree is
/// reconciled and returned only after every sub-component load settled.
pub(crate) async fn render(
	component: &Rc<ComponentInner>,
	markup: &str,
	chain: &AncestorChain,
) -> Result<Node, RenderError> {
	let fragment = template_content(parse_fragment(markup)?)?;

	register_bindings(component, &fragment);
	register_handlers(component, &fragment);
	let children = create_children(component, &fragment)?;

	if !children.is_empty() {
		tracing::debug!(
			component = %component.name,
			count = children.len(),
			chain = %chain,
			"loading sub components"
		);
	}
	let loads = children
		.iter()
		.map(|child| loader::load(Rc::clone(&child.0), chain.clone()));
	let results = join_all(loads).await;

	for (child, result) in children.iter().zip(results) {
		if let Err(error) = result {
			tracing::error!(
				component = %component.name,
				sub_component = %child.name(),
				error = %error,
				"sub component failed to load"
			);
			return Err(RenderError::SubComponent {
				name: child.name().to_string(),
				source: Box::new(error),
			});
		}
	}

	component.run_reconcile(None)?;
	Ok(fragment)
}

/// Unwraps a template whose only top-level element is `<template>`.
fn template_content(fragment: Node) -> DomResult<Node> {
	let significant: Vec<Node> = fragment
		.children()
		.into_iter()
		.filter(|node| !(node.is_text() && node.text_content().trim().is_empty()))
		.collect();

	match significant.as_slice() {
		[only] if only.tag_name().as_deref() == Some("template") => {
			let content = Node::fragment();
			for child in only.children() {
				content.append_child(&child)?;
			}
			Ok(content)
		}
		_ => Ok(fragment),
	}
}

fn register_bindings(component: &Rc<ComponentInner>, fragment: &Node) {
	let markers = &component.context.config.markers;
	let show_if = markers.show_if();
	let value = markers.value();
	let mut bindings = component.bindings.borrow_mut();

	for node in fragment.query_all_with_attribute(&show_if) {
		let Some(expression) = node.get_attribute(&show_if) else {
			continue;
		};
		bindings.register_visibility(node, expression, &markers.anchor_text);
	}

	for node in fragment.query_all_with_attribute(&value) {
		let Some(expression) = node.get_attribute(&value) else {
			continue;
		};
		if bindings.register_value(node.clone(), expression) && node.is_input_capable() {
			subscribe_input(component, &node);
		}
	}
}

fn subscribe_input(component: &Rc<ComponentInner>, node: &Node) {
	let component = Rc::downgrade(component);
	let target = node.downgrade();
	node.add_event_listener(EventType::Input, move |_event| {
		let (Some(component), Some(node)) = (component.upgrade(), target.upgrade()) else {
			return;
		};
		// Failures are logged by `handle_input`.
		let _ = component.handle_input(&node);
	});
}

fn register_handlers(component: &Rc<ComponentInner>, fragment: &Node) {
	let markers = &component.context.config.markers;
	for event in &markers.events {
		let attribute = markers.on(event);
		for node in fragment.query_all_with_attribute(&attribute) {
			let Some(method) = node.get_attribute(&attribute) else {
				continue;
			};
			let weak = Rc::downgrade(component);
			node.add_event_listener(event.as_str(), move |dispatched| {
				if let Some(component) = weak.upgrade() {
					// Failures are logged by `handle_event`.
					let _ = component.handle_event(&method, dispatched);
				}
			});
		}
	}
}

fn create_children(
	component: &Rc<ComponentInner>,
	fragment: &Node,
) -> Result<Vec<Component>, RenderError> {
	let attribute = component.context.config.markers.component();
	let mut children = Vec::new();
	for node in fragment.query_all_with_attribute(&attribute) {
		let name = node.get_attribute(&attribute).unwrap_or_default();
		let name = name.trim();
		if name.is_empty() {
			return Err(RenderError::InvalidMarker { attribute });
		}
		children.push(Component::child(&component.context, node, name));
	}
	component
		.children
		.borrow_mut()
		.extend(children.iter().cloned());
	Ok(children)
}
