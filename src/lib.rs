//! # Reinhardt Ghost
//!
//! Reactive component templating for Reinhardt: sealed data stores bound to
//! node trees, assembled from named templates fetched asynchronously.
//!
//! This crate re-exports the two building blocks:
//!
//! - [`dom`] (`reinhardt-ghost-dom`): the node tree, events and markup parsing
//! - [`core`] (`reinhardt-ghost-core`): store, expressions, bindings,
//!   reconciliation, template cache and component loading
//!
//! ## Feature Flags
//!
//! - `http` - fetch templates over HTTP with `reqwest`
//! - `full` - all features enabled
//!
//! ## Quick Example
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use reinhardt_ghost::prelude::*;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let transport = MemoryTransport::new().with_template(
//! 	"counter",
//! 	r#"<p data-show-if="count > 0">positive</p><span data-value="count"></span>"#,
//! );
//! let cache = Rc::new(TemplateCache::new(Rc::new(transport)));
//!
//! let host = Node::element("main");
//! let counter = Component::builder(host.clone())
//! 	.name("counter")
//! 	.data(json!({"count": 0}))
//! 	.build(cache)
//! 	.unwrap();
//! counter.load().await.unwrap();
//! assert_eq!(host.text_content(), "0");
//!
//! counter.store().set("count", 5).unwrap();
//! assert_eq!(host.text_content(), "positive5");
//! # }
//! ```

pub mod core;
pub mod dom;

pub use reinhardt_ghost_core::{
	AncestorChain, BindingRegistry, CacheStatistics, Component, ComponentBuilder,
	ComponentDefinition, ComponentError, ConfigError, DirectoryTransport, EvalError, EvalRequest,
	Expression, GhostConfig, Handler, Incoming, LoadError, LoadFailure, LoadResult, LoadState,
	MarkerConfig, MemoryTransport, ReconcileReport, RenderError, Store, StoreError,
	TemplateCache, TemplateConfig, TemplateTransport, TransportError, Value,
	transport_from_config,
};
#[cfg(feature = "http")]
pub use reinhardt_ghost_core::HttpTransport;
pub use reinhardt_ghost_dom::{DomError, Event, EventType, Node, NodeId, WeakNode, parse_fragment};

/// Commonly used types.
pub mod prelude {
	pub use crate::{
		Component, ComponentDefinition, DirectoryTransport, EvalRequest, Event, EventType,
		GhostConfig, LoadError, LoadState, MemoryTransport, Node, Store, StoreError,
		TemplateCache, TemplateTransport, Value, parse_fragment,
	};

	#[cfg(feature = "http")]
	pub use crate::HttpTransport;
}
