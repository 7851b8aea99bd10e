//! Error types for the ghost runtime.
//!
//! Each concern has its own enum. Load and render failures are reported
//! upward as a coarse error whose `Display` hides the cause; the cause stays
//! reachable through [`std::error::Error::source`].

use std::path::PathBuf;

use reinhardt_ghost_dom::DomError;
use thiserror::Error;

/// Result type for component loading.
pub type LoadResult<T> = Result<T, LoadError>;

/// A template could not be fetched.
///
/// Cloneable so that every waiter on a shared fetch observes the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to fetch template '{name}': {message}")]
pub struct TransportError {
	/// Component name that was requested.
	pub name: String,
	/// Transport specific description.
	pub message: String,
}

impl TransportError {
	/// Creates a transport error for `name`.
	pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			message: message.into(),
		}
	}
}

/// Errors raised by reactive store access.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum StoreError {
	/// The key does not exist and the store cannot grow.
	#[error("cannot add property '{key}': store is not extensible")]
	NotExtensible {
		/// Requested key.
		key: String,
	},

	/// The key holds a nested store, which cannot be replaced.
	#[error("cannot assign to read only property '{key}'")]
	ReadOnly {
		/// Requested key.
		key: String,
	},

	/// Only scalars can be written into a leaf.
	#[error("cannot store an object in leaf '{key}'")]
	NotAScalar {
		/// Requested key.
		key: String,
	},

	/// The value was stored but the reconciliation that followed failed.
	#[error("reconciliation after write failed")]
	Reconcile(#[source] Box<EvalError>),
}

/// Errors raised while evaluating a binding expression.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum EvalError {
	/// The expression is not well formed.
	#[error("syntax error in '{expression}': {message}")]
	Parse {
		/// Source text.
		expression: String,
		/// What went wrong.
		message: String,
	},

	/// An identifier is not a store key or known global.
	#[error("{0} is not defined")]
	UndefinedIdentifier(String),

	/// An operation was applied to a value that does not support it.
	#[error("type error: {0}")]
	Type(String),

	/// Node mode requires the bound expression to be a store leaf.
	#[error("invalid assignment target: '{0}'")]
	InvalidAssignmentTarget(String),

	/// Node mode was requested for a node without a value binding.
	#[error("node {0} has no value binding")]
	UnboundNode(String),

	/// Writing through an assignment failed.
	#[error("assignment failed")]
	Store(#[source] Box<StoreError>),
}

impl From<StoreError> for EvalError {
	fn from(error: StoreError) -> Self {
		Self::Store(Box::new(error))
	}
}

/// Errors raised while rendering a template.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RenderError {
	/// One of the declared sub-components failed to load.
	#[error("sub component error")]
	SubComponent {
		/// Name of the first sub-component that failed.
		name: String,
		/// Why it failed.
		#[source]
		source: Box<LoadError>,
	},

	/// The markup could not be turned into nodes.
	#[error("invalid template markup")]
	Markup(#[from] DomError),

	/// A marker attribute carries an unusable value.
	#[error("invalid value for marker '{attribute}'")]
	InvalidMarker {
		/// Attribute name.
		attribute: String,
	},

	/// The reconciliation that completes the render failed.
	#[error("binding evaluation failed during render")]
	Evaluation(#[from] EvalError),
}

/// Why a component could not be loaded.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadFailure {
	/// Fetching the template failed.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Rendering the template failed.
	#[error(transparent)]
	Render(#[from] RenderError),

	/// Moving the rendered nodes into the mount node failed.
	#[error(transparent)]
	Mount(#[from] DomError),
}

/// Errors raised by the component loader.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
	/// The component already appears in its own ancestor chain.
	#[error("a component cycle was detected while loading '{name}'")]
	Cycle {
		/// Name that recurred.
		name: String,
		/// Ancestor chain at the time, root first.
		chain: Vec<String>,
	},

	/// Fetching, rendering or mounting failed.
	#[error("can't get component '{name}'")]
	CannotLoad {
		/// Component that failed.
		name: String,
		/// Underlying failure.
		#[source]
		source: LoadFailure,
	},

	/// `load` was called on a component that already started loading.
	#[error("component '{0}' was already loaded")]
	AlreadyStarted(String),
}

impl LoadError {
	/// Returns true if this error is a cycle error.
	pub fn is_cycle(&self) -> bool {
		matches!(self, Self::Cycle { .. })
	}

	/// Follows nested sub-component failures down to the load error that
	/// started the cascade.
	pub fn root_cause(&self) -> &LoadError {
		match self {
			Self::CannotLoad {
				source: LoadFailure::Render(RenderError::SubComponent { source, .. }),
				..
			} => source.root_cause(),
			other => other,
		}
	}

	/// Returns the underlying transport error, if the root cause is one.
	pub fn transport_error(&self) -> Option<&TransportError> {
		match self.root_cause() {
			Self::CannotLoad {
				source: LoadFailure::Transport(error),
				..
			} => Some(error),
			_ => None,
		}
	}
}

/// Errors raised when constructing a component.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ComponentError {
	/// Neither the builder nor the mount node names the component.
	#[error("component name is missing: set it on the builder or on the mount node")]
	MissingComponentName,

	/// Initial data must be an object.
	#[error("component data must be an object, got {0}")]
	InvalidData(String),

	/// The store rejected an operation.
	#[error(transparent)]
	Store(#[from] StoreError),
}

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
	/// The configuration file could not be read.
	#[error("failed to read config file {path}: {source}")]
	Io {
		/// File path.
		path: PathBuf,
		/// IO error.
		#[source]
		source: std::io::Error,
	},

	/// The configuration is not valid TOML for this schema.
	#[error("invalid configuration: {0}")]
	Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn nested_failure(inner: LoadError) -> LoadError {
		LoadError::CannotLoad {
			name: "parent".to_string(),
			source: LoadFailure::Render(RenderError::SubComponent {
				name: "child".to_string(),
				source: Box::new(inner),
			}),
		}
	}

	#[rstest]
	fn test_root_cause_unwraps_sub_component_failures() {
		let cycle = LoadError::Cycle {
			name: "root".to_string(),
			chain: vec!["root".to_string(), "child".to_string()],
		};
		let error = nested_failure(nested_failure(cycle));

		assert!(!error.is_cycle());
		assert!(error.root_cause().is_cycle());
		assert_eq!(error.to_string(), "can't get component 'parent'");
	}

	#[rstest]
	fn test_transport_error_is_reachable_from_the_top() {
		let error = nested_failure(LoadError::CannotLoad {
			name: "missing".to_string(),
			source: LoadFailure::Transport(TransportError::new("missing", "not found")),
		});

		let transport = error.transport_error().unwrap();
		assert_eq!(transport.name, "missing");
	}

	#[rstest]
	fn test_source_chain_keeps_the_cause() {
		use std::error::Error as _;

		let error = nested_failure(LoadError::AlreadyStarted("x".to_string()));

		let render = error.source().unwrap();
		assert_eq!(render.to_string(), "sub component error");
		let inner = render.source().unwrap();
		assert_eq!(inner.to_string(), "component 'x' was already loaded");
	}
}
