//! Interaction events dispatched through the node tree.
//!
//! Events are created by the caller (a test, a host integration, or a
//! synthetic input source) and handed to [`Node::dispatch_event`], which
//! runs listeners on the target and then bubbles through its ancestors.
//!
//! [`Node::dispatch_event`]: crate::Node::dispatch_event

use std::cell::{Cell, RefCell};
use std::fmt;

use crate::node::Node;

/// Event types understood by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
	/// Pointer activation.
	Click,
	/// Form submission.
	Submit,
	/// User edited the value of an input-capable element.
	Input,
	/// Any other event name.
	Custom(String),
}

impl EventType {
	/// Returns the event name as used in markup and listener registration.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Click => "click",
			Self::Submit => "submit",
			Self::Input => "input",
			Self::Custom(name) => name,
		}
	}
}

impl From<&str> for EventType {
	fn from(name: &str) -> Self {
		match name {
			"click" => Self::Click,
			"submit" => Self::Submit,
			"input" => Self::Input,
			other => Self::Custom(other.to_string()),
		}
	}
}

impl fmt::Display for EventType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Identifies a registered listener so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// A dispatched event.
pub struct Event {
	event_type: EventType,
	target: RefCell<Option<Node>>,
	current_target: RefCell<Option<Node>>,
	default_prevented: Cell<bool>,
	propagation_stopped: Cell<bool>,
}

impl Event {
	/// Creates a new, not yet dispatched event.
	pub fn new(event_type: impl Into<EventType>) -> Self {
		Self {
			event_type: event_type.into(),
			target: RefCell::new(None),
			current_target: RefCell::new(None),
			default_prevented: Cell::new(false),
			propagation_stopped: Cell::new(false),
		}
	}

	/// Returns the event type.
	pub fn event_type(&self) -> &EventType {
		&self.event_type
	}

	/// The node the event was dispatched on.
	pub fn target(&self) -> Option<Node> {
		self.target.borrow().clone()
	}

	/// The node whose listener is currently running.
	pub fn current_target(&self) -> Option<Node> {
		self.current_target.borrow().clone()
	}

	/// Marks the default action as cancelled.
	pub fn prevent_default(&self) {
		self.default_prevented.set(true);
	}

	/// Returns true if a listener called [`Event::prevent_default`].
	pub fn default_prevented(&self) -> bool {
		self.default_prevented.get()
	}

	/// Stops bubbling after the current node's listeners have run.
	pub fn stop_propagation(&self) {
		self.propagation_stopped.set(true);
	}

	/// Returns true if a listener called [`Event::stop_propagation`].
	pub fn propagation_stopped(&self) -> bool {
		self.propagation_stopped.get()
	}

	pub(crate) fn set_target(&self, node: &Node) {
		*self.target.borrow_mut() = Some(node.clone());
	}

	pub(crate) fn set_current_target(&self, node: Option<&Node>) {
		*self.current_target.borrow_mut() = node.cloned();
	}
}

impl From<EventType> for Event {
	fn from(event_type: EventType) -> Self {
		Self::new(event_type)
	}
}

impl fmt::Debug for Event {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Event")
			.field("event_type", &self.event_type)
			.field("target", &self.target.borrow().as_ref().map(Node::id))
			.field("default_prevented", &self.default_prevented.get())
			.field("propagation_stopped", &self.propagation_stopped.get())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("click", EventType::Click)]
	#[case("submit", EventType::Submit)]
	#[case("input", EventType::Input)]
	#[case("keydown", EventType::Custom("keydown".to_string()))]
	fn test_event_type_from_name(#[case] name: &str, #[case] expected: EventType) {
		let parsed = EventType::from(name);

		assert_eq!(parsed, expected);
		assert_eq!(parsed.as_str(), name);
	}

	#[rstest]
	fn test_event_flags_start_cleared() {
		let event = Event::new(EventType::Submit);

		assert!(!event.default_prevented());
		assert!(!event.propagation_stopped());
		assert!(event.target().is_none());

		event.prevent_default();
		event.stop_propagation();

		assert!(event.default_prevented());
		assert!(event.propagation_stopped());
	}
}
