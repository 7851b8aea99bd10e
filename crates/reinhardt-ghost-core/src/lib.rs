//! # Reinhardt Ghost Core
//!
//! The reactive binding and component composition engine.
//!
//! ## Overview
//!
//! - [`Store`]: a sealed mirror of a JSON object. Every leaf write runs the
//!   owning component's reconciliation before returning.
//! - [`Expression`]: a small sandboxed expression language evaluated against
//!   a store, usable as a value or as an assignment target.
//! - [`BindingRegistry`] and [`reconcile`]: visibility and value bindings and
//!   the two passes that apply them.
//! - [`TemplateCache`] over a [`TemplateTransport`]: at most one in-flight
//!   fetch per component name, failures evicted.
//! - [`Component`]: construction, loading (with cycle detection) and event
//!   dispatch.
//!
//! ## Marker attributes
//!
//! With the default configuration, templates use:
//!
//! | Attribute | Meaning |
//! |-----------|---------|
//! | `data-show-if="expr"` | node is present only while `expr` is truthy |
//! | `data-value="expr"` | node text (or input value) follows `expr`; inputs write back |
//! | `data-on-click="method"` / `data-on-submit="method"` | event dispatch to a handler |
//! | `data-component="name"` | sub-component mount point |
//!
//! ## Runtime model
//!
//! Everything is single threaded. Loading is asynchronous only while
//! templates are fetched; store writes, evaluation and reconciliation are
//! synchronous. Futures are `!Send` and run on a current-thread runtime or a
//! [`tokio::task::LocalSet`].

pub mod binding;
pub mod cache;
pub mod component;
pub mod config;
pub mod error;
pub mod expr;
pub mod loader;
pub mod reconcile;
mod render;
pub mod store;
pub mod transport;
pub mod value;

pub use binding::{BindingRegistry, ValueBinding, VisibilityBinding, VisibilityChange};
pub use cache::{CacheStatistics, TemplateCache};
pub use component::{Component, ComponentBuilder, ComponentDefinition, EvalRequest, Handler};
pub use config::{GhostConfig, MarkerConfig, TemplateConfig};
pub use error::{
	ComponentError, ConfigError, EvalError, LoadError, LoadFailure, LoadResult, RenderError,
	StoreError, TransportError,
};
pub use expr::Expression;
pub use loader::{AncestorChain, LoadState};
pub use reconcile::{ReconcileReport, reconcile};
pub use store::{Incoming, Store};
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use transport::{DirectoryTransport, MemoryTransport, TemplateTransport, transport_from_config};
pub use value::Value;
