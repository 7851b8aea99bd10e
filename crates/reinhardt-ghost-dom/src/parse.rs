//! Markup parsing into a detached fragment.
//!
//! Parsing goes through `scraper` (html5ever), so the usual HTML error
//! recovery applies: unclosed tags are closed, stray end tags are dropped.
//! The parsed tree is then copied into mutable [`Node`]s.

use scraper::Html;
use scraper::Node as HtmlNode;

use crate::error::DomResult;
use crate::node::Node;

/// Parses `markup` into a detached fragment.
///
/// Elements, text and comments are kept. Doctypes and processing
/// instructions are dropped. The content of a `<template>` element stays
/// attached to it as ordinary children.
///
/// # Example
///
/// ```
/// use reinhardt_ghost_dom::parse_fragment;
///
/// let fragment = parse_fragment(r#"<p data-show-if="open">Hi</p>"#).unwrap();
/// let paragraph = fragment.first_child().unwrap();
///
/// assert_eq!(paragraph.tag_name().as_deref(), Some("p"));
/// assert_eq!(paragraph.get_attribute("data-show-if").as_deref(), Some("open"));
/// ```
pub fn parse_fragment(markup: &str) -> DomResult<Node> {
	let html = Html::parse_fragment(markup);
	if !html.errors.is_empty() {
		tracing::debug!(errors = ?html.errors, "markup parsed with recoverable errors");
	}

	let fragment = Node::fragment();
	let root = html.root_element();

	// Depth-first walk; children are pushed in reverse so they pop in order.
	let mut pending: Vec<_> = root
		.children()
		.map(|child| (child, fragment.clone()))
		.collect();
	pending.reverse();

	while let Some((html_node, parent)) = pending.pop() {
		let converted = match html_node.value() {
			HtmlNode::Element(element) => {
				let node = Node::element(element.name());
				for (name, value) in element.attrs() {
					node.set_attribute(name, value);
				}
				Some(node)
			}
			HtmlNode::Text(text) => Some(Node::text(&**text)),
			HtmlNode::Comment(comment) => Some(Node::comment(&**comment)),
			HtmlNode::Document | HtmlNode::Fragment => None,
			_ => continue,
		};

		let container = match converted {
			Some(node) => {
				parent.append_child(&node)?;
				node
			}
			None => parent,
		};

		let mut children: Vec<_> = html_node
			.children()
			.map(|child| (child, container.clone()))
			.collect();
		children.reverse();
		pending.extend(children);
	}

	Ok(fragment)
}
