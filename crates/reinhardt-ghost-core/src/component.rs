//! Components: a store, its bindings and a mount node.
//!
//! A [`Component`] is built from a mount node, a name, initial data and a
//! frozen map of event handlers. Loading it fetches its template, renders it
//! against the store, loads every sub-component declared in the template and
//! finally moves the rendered nodes into the mount node.
//!
//! ```no_run
//! use std::rc::Rc;
//!
//! use reinhardt_ghost_core::cache::TemplateCache;
//! use reinhardt_ghost_core::component::Component;
//! use reinhardt_ghost_core::transport::DirectoryTransport;
//! use reinhardt_ghost_dom::Node;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = Rc::new(TemplateCache::new(Rc::new(DirectoryTransport::new("templates"))));
//! let host = Node::element("main");
//!
//! let counter = Component::builder(host)
//! 	.name("counter")
//! 	.data(json!({"count": 0}))
//! 	.method("increment", |_event, store| {
//! 		let count = store.get("count").map(|value| value.to_number()).unwrap_or(0.0);
//! 		store.set("count", count + 1.0)
//! 	})
//! 	.build(cache)?;
//!
//! counter.load().await?;
//! # Ok(())
//! # }
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use reinhardt_ghost_dom::{Event, Node};
use serde_json::{Map, Value as JsonValue};
use tokio::task::JoinHandle;

use crate::binding::BindingRegistry;
use crate::cache::TemplateCache;
use crate::config::GhostConfig;
use crate::error::{ComponentError, EvalError, LoadError, LoadResult, StoreError};
use crate::expr::Expression;
use crate::loader::{self, AncestorChain, LoadState};
use crate::reconcile::{self, ReconcileReport};
use crate::store::{ReconcileHook, Store};
use crate::value::Value;

/// An event handler: receives the triggering event and the component's store.
pub type Handler = Rc<dyn Fn(&Event, &Store) -> Result<(), StoreError>>;

type MethodMap = HashMap<String, Handler>;

/// What [`Component::evaluate`] should run.
#[derive(Debug, Clone, Copy)]
pub enum EvalRequest<'a> {
	/// Evaluate an expression against the store and return its value.
	Expression(&'a str),
	/// Assign the node's current value through its value binding.
	Node(&'a Node),
}

/// Data and handlers for sub-components loaded under a name.
///
/// Every instance created from a definition gets its own store built from
/// the definition's data.
#[derive(Clone, Default)]
pub struct ComponentDefinition {
	data: Map<String, JsonValue>,
	methods: MethodMap,
}

impl ComponentDefinition {
	/// Creates a definition from initial data, which must be an object.
	pub fn new(data: JsonValue) -> Result<Self, ComponentError> {
		Ok(Self {
			data: object_data(data)?,
			methods: MethodMap::new(),
		})
	}

	/// Adds a handler.
	pub fn method<F>(mut self, name: impl Into<String>, handler: F) -> Self
	where
		F: Fn(&Event, &Store) -> Result<(), StoreError> + 'static,
	{
		self.methods.insert(name.into(), Rc::new(handler));
		self
	}
}

impl fmt::Debug for ComponentDefinition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentDefinition")
			.field("data", &self.data)
			.field("methods", &self.methods.keys().collect::<Vec<_>>())
			.finish()
	}
}

fn object_data(data: JsonValue) -> Result<Map<String, JsonValue>, ComponentError> {
	match data {
		JsonValue::Object(map) => Ok(map),
		JsonValue::Array(_) => Err(ComponentError::InvalidData("array".to_string())),
		other => Err(ComponentError::InvalidData(
			Value::from_json(&other).type_name().to_string(),
		)),
	}
}

/// State shared by every component of one tree.
pub(crate) struct LoadContext {
	pub(crate) cache: Rc<TemplateCache>,
	pub(crate) config: GhostConfig,
	pub(crate) definitions: HashMap<String, ComponentDefinition>,
}

pub(crate) struct ComponentInner {
	pub(crate) name: String,
	pub(crate) mount: Node,
	pub(crate) store: Store,
	methods: MethodMap,
	pub(crate) bindings: RefCell<BindingRegistry>,
	pub(crate) children: RefCell<Vec<Component>>,
	state: Cell<LoadState>,
	pub(crate) started: Cell<bool>,
	pub(crate) context: Rc<LoadContext>,
}

impl ComponentInner {
	pub(crate) fn transition(&self, to: LoadState) {
		let from = self.state.replace(to);
		tracing::debug!(component = %self.name, %from, %to, "load state changed");
	}

	pub(crate) fn run_reconcile(&self, origin: Option<&Node>) -> Result<ReconcileReport, EvalError> {
		reconcile::reconcile(&self.bindings.borrow(), &self.store, origin)
	}

	fn evaluate(&self, request: EvalRequest<'_>) -> Result<Value, EvalError> {
		match request {
			EvalRequest::Expression(source) => Expression::new(source).evaluate(&self.store),
			EvalRequest::Node(node) => {
				let bindings = self.bindings.borrow();
				let binding = bindings
					.value_binding(node)
					.ok_or_else(|| EvalError::UnboundNode(node.id().to_string()))?;
				binding.expression().assign(&self.store, node)?;
				binding.expression().evaluate(&self.store)
			}
		}
	}

	pub(crate) fn handle_event(&self, method: &str, event: &Event) -> Result<(), StoreError> {
		let Some(handler) = self.methods.get(method).cloned() else {
			tracing::warn!(
				component = %self.name,
				method,
				event = %event.event_type(),
				"no handler registered under this name"
			);
			return Ok(());
		};

		tracing::debug!(component = %self.name, method, event = %event.event_type(), "invoking handler");
		handler(event, &self.store).inspect_err(|error| {
			tracing::error!(component = %self.name, method, %error, "handler failed");
		})
	}

	pub(crate) fn handle_input(&self, node: &Node) -> Result<(), EvalError> {
		self.evaluate(EvalRequest::Node(node))
			.map(|_| ())
			.inspect_err(|error| {
				tracing::error!(
					component = %self.name,
					node = %node.id(),
					%error,
					"input could not be written to the store"
				);
			})
	}
}

impl ReconcileHook for ComponentInner {
	fn reconcile(&self, origin: Option<&Node>) -> Result<ReconcileReport, EvalError> {
		self.run_reconcile(origin)
	}
}

/// Handle to a component. Cloning shares the same component.
#[derive(Clone)]
pub struct Component(pub(crate) Rc<ComponentInner>);

impl Component {
	/// Starts building a component mounted at `mount`.
	pub fn builder(mount: Node) -> ComponentBuilder {
		ComponentBuilder::new(mount)
	}

	fn assemble(
		name: String,
		mount: Node,
		store: Store,
		methods: MethodMap,
		context: Rc<LoadContext>,
	) -> Self {
		let inner = Rc::new(ComponentInner {
			name,
			mount,
			store,
			methods,
			bindings: RefCell::new(BindingRegistry::new()),
			children: RefCell::new(Vec::new()),
			state: Cell::new(LoadState::Requested),
			started: Cell::new(false),
			context,
		});
		let weak: Weak<ComponentInner> = Rc::downgrade(&inner);
		let hook: Weak<dyn ReconcileHook> = weak;
		inner.store.attach(hook);
		Self(inner)
	}

	/// Creates the sub-component declared by a marker on `mount`.
	pub(crate) fn child(context: &Rc<LoadContext>, mount: Node, name: &str) -> Self {
		let definition = context.definitions.get(name);
		let store = definition
			.map(|definition| Store::wrap(&definition.data))
			.unwrap_or_else(Store::empty);
		let methods = definition
			.map(|definition| definition.methods.clone())
			.unwrap_or_default();
		Self::assemble(name.to_string(), mount, store, methods, Rc::clone(context))
	}

	/// Loads the component as a root.
	///
	/// Fails with [`LoadError::AlreadyStarted`] if loading already started.
	pub fn load(&self) -> LocalBoxFuture<'static, LoadResult<()>> {
		if self.0.started.get() {
			tracing::warn!(component = %self.0.name, "load requested twice");
			return futures::future::ready(Err(LoadError::AlreadyStarted(self.0.name.clone())))
				.boxed_local();
		}
		loader::load(Rc::clone(&self.0), AncestorChain::new())
	}

	/// Starts loading on the current [`tokio::task::LocalSet`].
	///
	/// A failure is logged in addition to being returned through the handle.
	pub fn spawn(&self) -> JoinHandle<LoadResult<()>> {
		let load = self.load();
		let name = self.0.name.clone();
		tokio::task::spawn_local(async move {
			let result = load.await;
			if let Err(error) = &result {
				tracing::error!(component = %name, %error, "component load rejected");
			}
			result
		})
	}

	/// Evaluates an expression, or writes a node's value through its binding.
	pub fn evaluate(&self, request: EvalRequest<'_>) -> Result<Value, EvalError> {
		self.0.evaluate(request)
	}

	/// Invokes handler `method` with `event`.
	///
	/// Unknown handlers are logged and ignored.
	pub fn handle_event(&self, method: &str, event: &Event) -> Result<(), StoreError> {
		self.0.handle_event(method, event)
	}

	/// Writes the value of an input-capable `node` into the store.
	pub fn handle_input(&self, node: &Node) -> Result<(), EvalError> {
		self.0.handle_input(node)
	}

	/// Runs a full reconciliation.
	pub fn reconcile(&self) -> Result<ReconcileReport, EvalError> {
		self.0.run_reconcile(None)
	}

	/// Component name.
	pub fn name(&self) -> &str {
		&self.0.name
	}

	/// The component's store.
	pub fn store(&self) -> &Store {
		&self.0.store
	}

	/// The node the component mounts into.
	pub fn mount_node(&self) -> &Node {
		&self.0.mount
	}

	/// Current load state.
	pub fn state(&self) -> LoadState {
		self.0.state.get()
	}

	/// Sub-components created by the render pass, in document order.
	pub fn children(&self) -> Vec<Component> {
		self.0.children.borrow().clone()
	}

	/// Number of bindings registered by the render pass.
	pub fn binding_count(&self) -> usize {
		self.0.bindings.borrow().len()
	}
}

impl fmt::Debug for Component {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Component")
			.field("name", &self.0.name)
			.field("mount", &self.0.mount.id())
			.field("state", &self.0.state.get())
			.field("store", &self.0.store)
			.finish()
	}
}

/// Builder for [`Component`].
pub struct ComponentBuilder {
	mount: Node,
	name: Option<String>,
	data: JsonValue,
	methods: MethodMap,
	definitions: HashMap<String, ComponentDefinition>,
	config: GhostConfig,
}

impl ComponentBuilder {
	fn new(mount: Node) -> Self {
		Self {
			mount,
			name: None,
			data: JsonValue::Object(Map::new()),
			methods: MethodMap::new(),
			definitions: HashMap::new(),
			config: GhostConfig::default(),
		}
	}

	/// Sets the component name. Defaults to the mount node's marker.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Sets the initial data. Must be an object.
	pub fn data(mut self, data: JsonValue) -> Self {
		self.data = data;
		self
	}

	/// Adds a handler.
	pub fn method<F>(mut self, name: impl Into<String>, handler: F) -> Self
	where
		F: Fn(&Event, &Store) -> Result<(), StoreError> + 'static,
	{
		self.methods.insert(name.into(), Rc::new(handler));
		self
	}

	/// Registers the definition used for sub-components named `name`.
	pub fn definition(mut self, name: impl Into<String>, definition: ComponentDefinition) -> Self {
		self.definitions.insert(name.into(), definition);
		self
	}

	/// Sets the configuration shared by the whole component tree.
	pub fn config(mut self, config: GhostConfig) -> Self {
		self.config = config;
		self
	}

	/// Builds the component. Nothing is fetched until it is loaded.
	pub fn build(self, cache: Rc<TemplateCache>) -> Result<Component, ComponentError> {
		let marker = self.config.markers.component();
		let name = self
			.name
			.filter(|name| !name.trim().is_empty())
			.or_else(|| {
				self.mount
					.get_attribute(&marker)
					.filter(|name| !name.trim().is_empty())
			})
			.ok_or(ComponentError::MissingComponentName)?;
		let data = object_data(self.data)?;

		self.mount.set_attribute(marker, name.clone());
		let context = Rc::new(LoadContext {
			cache,
			config: self.config,
			definitions: self.definitions,
		});
		Ok(Component::assemble(
			name,
			self.mount,
			Store::wrap(&data),
			self.methods,
			context,
		))
	}
}
