//! The sealed reactive store ("ghost").
//!
//! A [`Store`] mirrors a JSON object. Nested objects become nested stores
//! exposed as read-only references; every other value becomes a leaf cell.
//! The key set is fixed at construction: writes to unknown keys fail, and
//! nested stores cannot be replaced.
//!
//! Each leaf write runs the owning component's reconciliation before
//! returning. The component is reached through a weak hook shared by every
//! level of the store, so a store outliving its component degrades to plain
//! storage.
//!
//! ```
//! use reinhardt_ghost_core::store::Store;
//! use reinhardt_ghost_core::value::Value;
//! use serde_json::json;
//!
//! let data = json!({"user": {"name": "Ada"}, "count": 1});
//! let store = Store::wrap(data.as_object().unwrap());
//!
//! store.set_path("user.name", "Grace").unwrap();
//! assert_eq!(store.get_path("user.name"), Some(Value::from("Grace")));
//! assert!(store.set("missing", 1).is_err());
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use reinhardt_ghost_dom::Node;
use serde_json::{Map, Value as JsonValue};

use crate::error::{EvalError, StoreError};
use crate::reconcile::ReconcileReport;
use crate::value::Value;

/// Receives the notification that follows every leaf write.
pub(crate) trait ReconcileHook {
	/// Runs a full reconciliation, skipping value push-back to `origin`.
	fn reconcile(&self, origin: Option<&Node>) -> Result<ReconcileReport, EvalError>;
}

#[derive(Default)]
struct HookCell(RefCell<Option<Weak<dyn ReconcileHook>>>);

impl HookCell {
	fn get(&self) -> Option<Rc<dyn ReconcileHook>> {
		self.0.borrow().as_ref().and_then(Weak::upgrade)
	}
}

enum Slot {
	Leaf(RefCell<Value>),
	Branch(Store),
}

struct StoreInner {
	slots: IndexMap<String, Slot>,
	hook: Rc<HookCell>,
}

/// A value written into a store leaf.
#[derive(Debug, Clone)]
pub enum Incoming {
	/// A plain value.
	Value(Value),
	/// A node whose current value (or text) is stored instead of the node.
	Node(Node),
}

impl Incoming {
	fn resolve(self) -> (Value, Option<Node>) {
		match self {
			Self::Value(value) => (value, None),
			Self::Node(node) => {
				let extracted = node.value().unwrap_or_else(|| node.text_content());
				(Value::String(extracted), Some(node))
			}
		}
	}
}

impl From<Value> for Incoming {
	fn from(value: Value) -> Self {
		Self::Value(value)
	}
}

impl From<Node> for Incoming {
	fn from(node: Node) -> Self {
		Self::Node(node)
	}
}

impl From<&Node> for Incoming {
	fn from(node: &Node) -> Self {
		Self::Node(node.clone())
	}
}

impl From<bool> for Incoming {
	fn from(value: bool) -> Self {
		Self::Value(value.into())
	}
}

impl From<f64> for Incoming {
	fn from(value: f64) -> Self {
		Self::Value(value.into())
	}
}

impl From<i32> for Incoming {
	fn from(value: i32) -> Self {
		Self::Value(value.into())
	}
}

impl From<&str> for Incoming {
	fn from(value: &str) -> Self {
		Self::Value(value.into())
	}
}

impl From<String> for Incoming {
	fn from(value: String) -> Self {
		Self::Value(value.into())
	}
}

/// Handle to a sealed reactive store. Cloning shares the same store.
#[derive(Clone)]
pub struct Store(Rc<StoreInner>);

impl Store {
	/// Wraps `data` into a store with a fixed key set.
	pub fn wrap(data: &Map<String, JsonValue>) -> Self {
		Self::build_object(data, Rc::new(HookCell::default()))
	}

	/// Creates a store without keys.
	pub fn empty() -> Self {
		Self::wrap(&Map::new())
	}

	/// Builds a store from a JSON object or array. Array indices become
	/// the keys `"0"`, `"1"`, and so on; any other value yields an empty store.
	pub fn from_json(json: &JsonValue) -> Self {
		Self::build(json, Rc::new(HookCell::default()))
	}

	fn build(json: &JsonValue, hook: Rc<HookCell>) -> Self {
		match json {
			JsonValue::Object(map) => Self::build_object(map, hook),
			JsonValue::Array(items) => Self::build_entries(
				items
					.iter()
					.enumerate()
					.map(|(index, item)| (index.to_string(), item)),
				hook,
			),
			_ => Self::build_object(&Map::new(), hook),
		}
	}

	fn build_object(data: &Map<String, JsonValue>, hook: Rc<HookCell>) -> Self {
		Self::build_entries(data.iter().map(|(key, value)| (key.clone(), value)), hook)
	}

	fn build_entries<'a>(
		entries: impl Iterator<Item = (String, &'a JsonValue)>,
		hook: Rc<HookCell>,
	) -> Self {
		let mut slots = IndexMap::new();
		for (key, value) in entries {
			let slot = match value {
				JsonValue::Object(_) | JsonValue::Array(_) => {
					Slot::Branch(Self::build(value, hook.clone()))
				}
				scalar => Slot::Leaf(RefCell::new(Value::from_json(scalar))),
			};
			slots.insert(key, slot);
		}
		Self(Rc::new(StoreInner { slots, hook }))
	}

	/// Connects the store to a reconciliation hook. Nested stores share the
	/// hook cell, so this covers every level.
	pub(crate) fn attach(&self, hook: Weak<dyn ReconcileHook>) {
		*self.0.hook.0.borrow_mut() = Some(hook);
	}

	/// Returns true if both handles refer to the same store.
	pub fn ptr_eq(&self, other: &Store) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// Returns the keys in construction order.
	pub fn keys(&self) -> Vec<String> {
		self.0.slots.keys().cloned().collect()
	}

	/// Returns the number of keys.
	pub fn len(&self) -> usize {
		self.0.slots.len()
	}

	/// Returns true if the store has no keys.
	pub fn is_empty(&self) -> bool {
		self.0.slots.is_empty()
	}

	/// Returns true if `key` exists at this level.
	pub fn contains_key(&self, key: &str) -> bool {
		self.0.slots.contains_key(key)
	}

	/// Reads a key. Nested stores are returned as [`Value::Object`].
	pub fn get(&self, key: &str) -> Option<Value> {
		self.0.slots.get(key).map(|slot| match slot {
			Slot::Leaf(cell) => cell.borrow().clone(),
			Slot::Branch(nested) => Value::Object(nested.clone()),
		})
	}

	/// Reads a dotted path such as `"user.name"`.
	pub fn get_path(&self, path: &str) -> Option<Value> {
		let (parent, key) = self.resolve_parent(path)?;
		parent.get(key)
	}

	/// Returns the nested store under `key`.
	pub fn nested(&self, key: &str) -> Option<Store> {
		match self.0.slots.get(key)? {
			Slot::Branch(nested) => Some(nested.clone()),
			Slot::Leaf(_) => None,
		}
	}

	/// Writes a leaf and reconciles the owning component.
	///
	/// The value is stored before reconciliation runs; if reconciliation
	/// fails the write is kept and [`StoreError::Reconcile`] is returned.
	pub fn set(&self, key: &str, incoming: impl Into<Incoming>) -> Result<(), StoreError> {
		let slot = self
			.0
			.slots
			.get(key)
			.ok_or_else(|| StoreError::NotExtensible {
				key: key.to_string(),
			})?;
		let cell = match slot {
			Slot::Leaf(cell) => cell,
			Slot::Branch(_) => {
				return Err(StoreError::ReadOnly {
					key: key.to_string(),
				});
			}
		};

		let (value, origin) = incoming.into().resolve();
		if matches!(value, Value::Object(_)) {
			return Err(StoreError::NotAScalar {
				key: key.to_string(),
			});
		}
		*cell.borrow_mut() = value;

		if let Some(hook) = self.0.hook.get() {
			hook.reconcile(origin.as_ref())
				.map_err(|error| StoreError::Reconcile(Box::new(error)))?;
		}
		Ok(())
	}

	/// Writes the leaf at a dotted path.
	pub fn set_path(&self, path: &str, incoming: impl Into<Incoming>) -> Result<(), StoreError> {
		let (parent, key) = self
			.resolve_parent(path)
			.ok_or_else(|| StoreError::NotExtensible {
				key: path.to_string(),
			})?;
		parent.set(key, incoming)
	}

	fn resolve_parent<'p>(&self, path: &'p str) -> Option<(Store, &'p str)> {
		let mut segments = path.split('.');
		let mut key = segments.next()?;
		let mut current = self.clone();
		for next in segments {
			current = current.nested(key)?;
			key = next;
		}
		Some((current, key))
	}

	/// Exports the current contents as a JSON object.
	pub fn to_json(&self) -> JsonValue {
		let map = self
			.0
			.slots
			.iter()
			.map(|(key, slot)| {
				let value = match slot {
					Slot::Leaf(cell) => cell.borrow().to_json(),
					Slot::Branch(nested) => nested.to_json(),
				};
				(key.clone(), value)
			})
			.collect::<Map<_, _>>();
		JsonValue::Object(map)
	}
}

impl fmt::Debug for Store {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut map = f.debug_map();
		for (key, slot) in &self.0.slots {
			match slot {
				Slot::Leaf(cell) => match cell.try_borrow() {
					Ok(value) => map.entry(key, &*value),
					Err(_) => map.entry(key, &"<borrowed>"),
				},
				Slot::Branch(nested) => map.entry(key, nested),
			};
		}
		map.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::{fixture, rstest};
	use serde_json::json;
	use std::cell::Cell;

	#[fixture]
	fn store() -> Store {
		let data = json!({
			"count": 0,
			"user": {"name": "Ada", "address": {"city": "London"}},
			"tags": ["a", "b"],
		});
		Store::wrap(data.as_object().unwrap())
	}

	struct CountingHook {
		calls: Cell<usize>,
		origins: RefCell<Vec<Option<Node>>>,
	}

	impl ReconcileHook for CountingHook {
		fn reconcile(&self, origin: Option<&Node>) -> Result<ReconcileReport, EvalError> {
			self.calls.set(self.calls.get() + 1);
			self.origins.borrow_mut().push(origin.cloned());
			Ok(ReconcileReport::default())
		}
	}

	#[rstest]
	fn test_keys_follow_input_order(store: Store) {
		assert_eq!(store.keys(), vec!["count", "user", "tags"]);
		assert_eq!(store.nested("tags").unwrap().keys(), vec!["0", "1"]);
	}

	#[rstest]
	fn test_write_then_read(store: Store) {
		store.set("count", 5).unwrap();
		assert_eq!(store.get("count"), Some(Value::Number(5.0)));

		store.set_path("user.address.city", "Paris").unwrap();
		assert_eq!(store.get_path("user.address.city"), Some(Value::from("Paris")));
	}

	#[rstest]
	fn test_unknown_keys_are_rejected(store: Store) {
		assert_eq!(
			store.set("extra", 1),
			Err(StoreError::NotExtensible {
				key: "extra".to_string()
			})
		);
		assert!(matches!(
			store.set_path("user.missing.deeper", 1),
			Err(StoreError::NotExtensible { .. })
		));
		assert!(!store.contains_key("extra"));
	}

	#[rstest]
	fn test_nested_stores_are_read_only(store: Store) {
		assert_eq!(
			store.set("user", "replaced"),
			Err(StoreError::ReadOnly {
				key: "user".to_string()
			})
		);
		assert!(matches!(store.get("user"), Some(Value::Object(_))));
	}

	#[rstest]
	fn test_objects_cannot_be_written_into_leaves(store: Store) {
		let result = store.set("count", Value::Object(Store::empty()));

		assert!(matches!(result, Err(StoreError::NotAScalar { .. })));
		assert_eq!(store.get("count"), Some(Value::Number(0.0)));
	}

	#[rstest]
	fn test_node_writes_store_the_extracted_value(store: Store) {
		let input = Node::element("input");
		input.set_value("typed");
		store.set("count", &input).unwrap();
		assert_eq!(store.get("count"), Some(Value::from("typed")));

		let span = Node::element("span");
		span.set_text_content("text");
		store.set("count", span).unwrap();
		assert_eq!(store.get("count"), Some(Value::from("text")));
	}

	#[rstest]
	fn test_every_write_notifies_the_hook_with_its_origin(store: Store) {
		let hook = Rc::new(CountingHook {
			calls: Cell::new(0),
			origins: RefCell::new(Vec::new()),
		});
		let weak: Weak<CountingHook> = Rc::downgrade(&hook);
		let weak: Weak<dyn ReconcileHook> = weak;
		store.attach(weak);
		let input = Node::element("input");

		store.set("count", 1).unwrap();
		store.set_path("user.name", &input).unwrap();
		store.nested("tags").unwrap().set("0", "z").unwrap();

		assert_eq!(hook.calls.get(), 3);
		let origins = hook.origins.borrow();
		assert_eq!(origins[0], None);
		assert_eq!(origins[1], Some(input));
	}

	#[rstest]
	fn test_dropped_hook_degrades_to_plain_storage(store: Store) {
		let hook = Rc::new(CountingHook {
			calls: Cell::new(0),
			origins: RefCell::new(Vec::new()),
		});
		let weak: Weak<CountingHook> = Rc::downgrade(&hook);
		let weak: Weak<dyn ReconcileHook> = weak;
		store.attach(weak);
		drop(hook);

		store.set("count", 2).unwrap();

		assert_eq!(store.get("count"), Some(Value::Number(2.0)));
	}

	#[rstest]
	fn test_snapshot(store: Store) {
		store.set("count", 3).unwrap();

		assert_eq!(
			store.to_json(),
			json!({
				"count": 3,
				"user": {"name": "Ada", "address": {"city": "London"}},
				"tags": {"0": "a", "1": "b"},
			})
		);
	}

	fn json_object(
		value: impl Strategy<Value = JsonValue>,
		size: std::ops::Range<usize>,
	) -> impl Strategy<Value = Map<String, JsonValue>> {
		// Keys are kept in generation order, which is rarely sorted.
		prop::collection::vec(("[a-z]{1,4}", value), size).prop_map(|entries| {
			let mut map = Map::new();
			for (key, value) in entries {
				map.entry(key).or_insert(value);
			}
			map
		})
	}

	fn json_tree() -> impl Strategy<Value = JsonValue> {
		let leaf = prop_oneof![
			Just(JsonValue::Null),
			any::<bool>().prop_map(JsonValue::Bool),
			any::<i32>().prop_map(JsonValue::from),
			"[a-z]{0,6}".prop_map(JsonValue::String),
		];
		leaf.prop_recursive(4, 32, 4, |inner| {
			json_object(inner, 0..4).prop_map(JsonValue::Object)
		})
	}

	fn assert_same_shape(store: &Store, map: &Map<String, JsonValue>) {
		assert_eq!(store.keys(), map.keys().cloned().collect::<Vec<_>>());
		assert_eq!(
			store.set("__added__", 1),
			Err(StoreError::NotExtensible {
				key: "__added__".to_string()
			})
		);
		for (key, value) in map {
			match value {
				JsonValue::Object(nested) => assert_same_shape(&store.nested(key).unwrap(), nested),
				_ => assert!(store.nested(key).is_none()),
			}
		}
	}

	proptest! {
		#[test]
		fn prop_store_mirrors_the_shape_of_its_data(data in json_object(json_tree(), 0..5)) {
			let store = Store::wrap(&data);

			assert_same_shape(&store, &data);
			prop_assert_eq!(store.to_json(), JsonValue::Object(data));
		}
	}
}
