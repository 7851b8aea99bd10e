//! HTML serialization of node trees.

use crate::node::{Node, NodeKind};

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
	"track", "wbr",
];

fn escape_text(text: &str) -> String {
	text.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
	value
		.replace('&', "&amp;")
		.replace('"', "&quot;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

fn write_node(node: &Node, out: &mut String) {
	match node.kind() {
		NodeKind::Text(text) => out.push_str(&escape_text(&text)),
		NodeKind::Comment(text) => {
			out.push_str("<!--");
			out.push_str(&text);
			out.push_str("-->");
		}
		NodeKind::Fragment => write_children(node, out),
		NodeKind::Element(element) => {
			out.push('<');
			out.push_str(element.tag());
			for (name, value) in element.attributes() {
				out.push(' ');
				out.push_str(name);
				out.push_str("=\"");
				out.push_str(&escape_attr(value));
				out.push('"');
			}
			out.push('>');
			if VOID_ELEMENTS.contains(&element.tag()) {
				return;
			}
			write_children(node, out);
			out.push_str("</");
			out.push_str(element.tag());
			out.push('>');
		}
	}
}

fn write_children(node: &Node, out: &mut String) {
	for child in node.children() {
		write_node(&child, out);
	}
}

impl Node {
	/// Serializes this node and its subtree.
	pub fn outer_html(&self) -> String {
		let mut out = String::new();
		write_node(self, &mut out);
		out
	}

	/// Serializes the children of this node.
	pub fn inner_html(&self) -> String {
		let mut out = String::new();
		write_children(self, &mut out);
		out
	}
}
