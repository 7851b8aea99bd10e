//! The mutable node tree.
//!
//! A [`Node`] is a reference-counted handle; cloning it yields another handle
//! to the same node, and equality is identity. Parents own their children,
//! children only hold a weak back reference, so a detached subtree is freed
//! as soon as the last handle to its root goes away.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{DomError, DomResult};
use crate::event::{Event, EventType, ListenerId};

/// Global counter for node identifiers.
static NODE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Global counter for listener identifiers.
static LISTENER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Elements whose editable value is distinct from their text.
const INPUT_CAPABLE_TAGS: &[&str] = &["input", "textarea", "select"];

/// Process-unique node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
	fn next() -> Self {
		Self(NODE_COUNTER.fetch_add(1, Ordering::SeqCst))
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "node-{}", self.0)
	}
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
	/// An element with a tag, attributes and children.
	Element(ElementData),
	/// A run of text.
	Text(String),
	/// An inert comment, used as a placeholder marker.
	Comment(String),
	/// A detached container whose children move as a group.
	Fragment,
}

/// Element payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
	tag: String,
	attributes: Vec<(String, String)>,
	/// Live editable value; `None` until written, falling back to the
	/// `value` attribute.
	value: Option<String>,
}

impl ElementData {
	/// Returns the lowercase tag name.
	pub fn tag(&self) -> &str {
		&self.tag
	}

	/// Returns the attributes in source order.
	pub fn attributes(&self) -> &[(String, String)] {
		&self.attributes
	}
}

type ListenerFn = Rc<dyn Fn(&Event)>;

struct Listener {
	id: ListenerId,
	event_type: EventType,
	handler: ListenerFn,
}

struct NodeData {
	id: NodeId,
	kind: NodeKind,
	parent: Weak<RefCell<NodeData>>,
	children: Vec<Node>,
	listeners: Vec<Listener>,
}

/// Handle to a node in a tree.
#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

/// Non-owning handle to a node.
#[derive(Clone, Default)]
pub struct WeakNode(Weak<RefCell<NodeData>>);

impl WeakNode {
	/// Returns the node if it is still alive.
	pub fn upgrade(&self) -> Option<Node> {
		self.0.upgrade().map(Node)
	}
}

impl fmt::Debug for WeakNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.upgrade() {
			Some(node) => write!(f, "WeakNode({})", node.id()),
			None => f.write_str("WeakNode(<dropped>)"),
		}
	}
}

impl Node {
	fn from_kind(kind: NodeKind) -> Self {
		Self(Rc::new(RefCell::new(NodeData {
			id: NodeId::next(),
			kind,
			parent: Weak::new(),
			children: Vec::new(),
			listeners: Vec::new(),
		})))
	}

	/// Creates a detached element.
	pub fn element(tag: impl Into<String>) -> Self {
		Self::from_kind(NodeKind::Element(ElementData {
			tag: tag.into().to_ascii_lowercase(),
			attributes: Vec::new(),
			value: None,
		}))
	}

	/// Creates a detached text node.
	pub fn text(text: impl Into<String>) -> Self {
		Self::from_kind(NodeKind::Text(text.into()))
	}

	/// Creates a detached comment node.
	pub fn comment(text: impl Into<String>) -> Self {
		Self::from_kind(NodeKind::Comment(text.into()))
	}

	/// Creates an empty fragment.
	pub fn fragment() -> Self {
		Self::from_kind(NodeKind::Fragment)
	}

	/// Returns the identifier of this node.
	pub fn id(&self) -> NodeId {
		self.0.borrow().id
	}

	/// Returns a copy of this node's kind and payload.
	pub fn kind(&self) -> NodeKind {
		self.0.borrow().kind.clone()
	}

	/// Returns true if both handles refer to the same node.
	pub fn ptr_eq(&self, other: &Node) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// Creates a non-owning handle.
	pub fn downgrade(&self) -> WeakNode {
		WeakNode(Rc::downgrade(&self.0))
	}

	/// Returns true for element nodes.
	pub fn is_element(&self) -> bool {
		matches!(self.0.borrow().kind, NodeKind::Element(_))
	}

	/// Returns true for text nodes.
	pub fn is_text(&self) -> bool {
		matches!(self.0.borrow().kind, NodeKind::Text(_))
	}

	/// Returns true for comment nodes.
	pub fn is_comment(&self) -> bool {
		matches!(self.0.borrow().kind, NodeKind::Comment(_))
	}

	/// Returns true for fragments.
	pub fn is_fragment(&self) -> bool {
		matches!(self.0.borrow().kind, NodeKind::Fragment)
	}

	/// Returns the tag name of an element.
	pub fn tag_name(&self) -> Option<String> {
		match &self.0.borrow().kind {
			NodeKind::Element(element) => Some(element.tag.clone()),
			_ => None,
		}
	}

	/// Returns true if the element's value is user-editable.
	pub fn is_input_capable(&self) -> bool {
		match &self.0.borrow().kind {
			NodeKind::Element(element) => INPUT_CAPABLE_TAGS.contains(&element.tag.as_str()),
			_ => false,
		}
	}

	// ---------------------------------------------------------------------
	// Attributes
	// ---------------------------------------------------------------------

	/// Reads an attribute.
	pub fn get_attribute(&self, name: &str) -> Option<String> {
		match &self.0.borrow().kind {
			NodeKind::Element(element) => element
				.attributes
				.iter()
				.find(|(key, _)| key == name)
				.map(|(_, value)| value.clone()),
			_ => None,
		}
	}

	/// Returns true if the attribute is present.
	pub fn has_attribute(&self, name: &str) -> bool {
		match &self.0.borrow().kind {
			NodeKind::Element(element) => element.attributes.iter().any(|(key, _)| key == name),
			_ => false,
		}
	}

	/// Sets an attribute, keeping its position if it already exists.
	///
	/// Has no effect on non-element nodes.
	pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();
		let value = value.into();
		if let NodeKind::Element(element) = &mut self.0.borrow_mut().kind {
			match element.attributes.iter_mut().find(|(key, _)| *key == name) {
				Some(slot) => slot.1 = value,
				None => element.attributes.push((name, value)),
			}
		}
	}

	/// Removes an attribute and returns its previous value.
	pub fn remove_attribute(&self, name: &str) -> Option<String> {
		if let NodeKind::Element(element) = &mut self.0.borrow_mut().kind {
			let index = element.attributes.iter().position(|(key, _)| key == name)?;
			return Some(element.attributes.remove(index).1);
		}
		None
	}

	/// Returns all attributes in source order.
	pub fn attributes(&self) -> Vec<(String, String)> {
		match &self.0.borrow().kind {
			NodeKind::Element(element) => element.attributes.clone(),
			_ => Vec::new(),
		}
	}

	// ---------------------------------------------------------------------
	// Tree structure
	// ---------------------------------------------------------------------

	/// Returns the parent node.
	pub fn parent(&self) -> Option<Node> {
		self.0.borrow().parent.upgrade().map(Node)
	}

	/// Returns the direct children.
	pub fn children(&self) -> Vec<Node> {
		self.0.borrow().children.clone()
	}

	/// Returns the first direct child.
	pub fn first_child(&self) -> Option<Node> {
		self.0.borrow().children.first().cloned()
	}

	/// Returns the number of direct children.
	pub fn child_count(&self) -> usize {
		self.0.borrow().children.len()
	}

	/// Returns true if `other` is this node or one of its descendants.
	pub fn contains(&self, other: &Node) -> bool {
		let mut current = Some(other.clone());
		while let Some(node) = current {
			if node.ptr_eq(self) {
				return true;
			}
			current = node.parent();
		}
		false
	}

	fn can_have_children(&self) -> bool {
		matches!(
			self.0.borrow().kind,
			NodeKind::Element(_) | NodeKind::Fragment
		)
	}

	/// Appends `child` as the last child, detaching it from its old parent.
	///
	/// Appending a fragment moves the fragment's children instead, leaving
	/// the fragment empty.
	pub fn append_child(&self, child: &Node) -> DomResult<()> {
		if !self.can_have_children() {
			return Err(DomError::HierarchyRequest(
				"text and comment nodes cannot have children".to_string(),
			));
		}

		if child.is_fragment() && !child.ptr_eq(self) {
			for grandchild in child.children() {
				self.append_child(&grandchild)?;
			}
			return Ok(());
		}

		if child.contains(self) {
			return Err(DomError::HierarchyRequest(
				"a node cannot be inserted into its own subtree".to_string(),
			));
		}

		child.remove();
		child.0.borrow_mut().parent = Rc::downgrade(&self.0);
		self.0.borrow_mut().children.push(child.clone());
		Ok(())
	}

	/// Detaches this node from its parent. No-op for detached nodes.
	pub fn remove(&self) {
		let parent = self.0.borrow().parent.upgrade();
		if let Some(parent) = parent {
			parent
				.borrow_mut()
				.children
				.retain(|sibling| !Rc::ptr_eq(&sibling.0, &self.0));
		}
		self.0.borrow_mut().parent = Weak::new();
	}

	/// Puts `replacement` where this node is and detaches this node.
	///
	/// No-op when this node has no parent.
	pub fn replace_with(&self, replacement: &Node) -> DomResult<()> {
		if self.ptr_eq(replacement) {
			return Ok(());
		}
		let Some(parent) = self.parent() else {
			return Ok(());
		};
		if replacement.is_fragment() {
			return Err(DomError::HierarchyRequest(
				"a fragment cannot replace a node".to_string(),
			));
		}
		if replacement.contains(&parent) {
			return Err(DomError::HierarchyRequest(
				"a node cannot be inserted into its own subtree".to_string(),
			));
		}

		replacement.remove();

		{
			let mut parent_data = parent.0.borrow_mut();
			let Some(index) = parent_data
				.children
				.iter()
				.position(|sibling| sibling.ptr_eq(self))
			else {
				return Ok(());
			};
			parent_data.children[index] = replacement.clone();
		}

		replacement.0.borrow_mut().parent = Rc::downgrade(&parent.0);
		self.0.borrow_mut().parent = Weak::new();
		Ok(())
	}

	/// Returns every descendant in document order, excluding this node.
	pub fn descendants(&self) -> Vec<Node> {
		let mut ordered = Vec::new();
		let mut stack: Vec<Node> = self.children().into_iter().rev().collect();
		while let Some(node) = stack.pop() {
			stack.extend(node.children().into_iter().rev());
			ordered.push(node);
		}
		ordered
	}

	/// Returns descendant elements carrying `attribute`, in document order.
	pub fn query_all_with_attribute(&self, attribute: &str) -> Vec<Node> {
		self.descendants()
			.into_iter()
			.filter(|node| node.has_attribute(attribute))
			.collect()
	}

	// ---------------------------------------------------------------------
	// Content
	// ---------------------------------------------------------------------

	/// Returns the concatenated text of this node and its descendants.
	pub fn text_content(&self) -> String {
		let data = self.0.borrow();
		match &data.kind {
			NodeKind::Text(text) | NodeKind::Comment(text) => text.clone(),
			NodeKind::Element(_) | NodeKind::Fragment => data
				.children
				.iter()
				.filter(|child| !child.is_comment())
				.map(Node::text_content)
				.collect(),
		}
	}

	/// Replaces this node's content with a single text node.
	pub fn set_text_content(&self, text: impl Into<String>) {
		let text = text.into();
		let removed = {
			let mut guard = self.0.borrow_mut();
			let data = &mut *guard;
			match &mut data.kind {
				NodeKind::Text(current) | NodeKind::Comment(current) => {
					*current = text;
					return;
				}
				NodeKind::Element(_) | NodeKind::Fragment => std::mem::take(&mut data.children),
			}
		};
		for child in removed {
			child.0.borrow_mut().parent = Weak::new();
		}
		if !text.is_empty() {
			let text_node = Node::text(text);
			text_node.0.borrow_mut().parent = Rc::downgrade(&self.0);
			self.0.borrow_mut().children.push(text_node);
		}
	}

	/// Returns the editable value of an input-capable element.
	///
	/// Falls back to the `value` attribute (or the text of a `textarea`)
	/// until a value has been written.
	pub fn value(&self) -> Option<String> {
		if !self.is_input_capable() {
			return None;
		}
		let live = match &self.0.borrow().kind {
			NodeKind::Element(element) => element.value.clone(),
			_ => None,
		};
		if live.is_some() {
			return live;
		}
		if self.tag_name().as_deref() == Some("textarea") {
			return Some(self.text_content());
		}
		Some(self.get_attribute("value").unwrap_or_default())
	}

	/// Writes the editable value. Returns false for nodes that have none.
	pub fn set_value(&self, value: impl Into<String>) -> bool {
		if !self.is_input_capable() {
			return false;
		}
		if let NodeKind::Element(element) = &mut self.0.borrow_mut().kind {
			element.value = Some(value.into());
		}
		true
	}

	// ---------------------------------------------------------------------
	// Events
	// ---------------------------------------------------------------------

	/// Subscribes `handler` to events of `event_type` reaching this node.
	pub fn add_event_listener<F>(&self, event_type: impl Into<EventType>, handler: F) -> ListenerId
	where
		F: Fn(&Event) + 'static,
	{
		let id = ListenerId(LISTENER_COUNTER.fetch_add(1, Ordering::SeqCst));
		self.0.borrow_mut().listeners.push(Listener {
			id,
			event_type: event_type.into(),
			handler: Rc::new(handler),
		});
		id
	}

	/// Unsubscribes a listener. Returns false if it was not registered here.
	pub fn remove_event_listener(&self, id: ListenerId) -> bool {
		let mut data = self.0.borrow_mut();
		let before = data.listeners.len();
		data.listeners.retain(|listener| listener.id != id);
		data.listeners.len() != before
	}

	/// Returns the number of listeners registered for `event_type`.
	pub fn listener_count(&self, event_type: &EventType) -> usize {
		self.0
			.borrow()
			.listeners
			.iter()
			.filter(|listener| &listener.event_type == event_type)
			.count()
	}

	/// Dispatches `event` at this node and bubbles it through the ancestors.
	///
	/// Returns false if a listener prevented the default action.
	pub fn dispatch_event(&self, event: &Event) -> bool {
		event.set_target(self);
		tracing::trace!(target_node = %self.id(), event = %event.event_type(), "dispatching event");

		let mut current = Some(self.clone());
		while let Some(node) = current {
			let handlers: Vec<ListenerFn> = node
				.0
				.borrow()
				.listeners
				.iter()
				.filter(|listener| &listener.event_type == event.event_type())
				.map(|listener| listener.handler.clone())
				.collect();

			if !handlers.is_empty() {
				event.set_current_target(Some(&node));
				for handler in handlers {
					handler(event);
				}
			}

			if event.propagation_stopped() {
				break;
			}
			current = node.parent();
		}

		event.set_current_target(None);
		!event.default_prevented()
	}
}

impl PartialEq for Node {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl Eq for Node {}

impl Hash for Node {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id().hash(state);
	}
}

impl fmt::Debug for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.0.try_borrow() {
			Ok(data) => f
				.debug_struct("Node")
				.field("id", &data.id)
				.field("kind", &data.kind)
				.field("children", &data.children.len())
				.finish(),
			Err(_) => f.write_str("Node(<borrowed>)"),
		}
	}
}
