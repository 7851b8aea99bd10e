//! Component loading state machine.
//!
//! ```text
//! Requested -> FetchingTemplate -> Rendering -> Mounted
//!     \______________\________________\______-> Failed
//! ```
//!
//! A load is requested with the chain of component names currently loading
//! above it. A name that already appears in that chain fails immediately with
//! a cycle error and is never fetched, which bounds recursion by the number of
//! distinct component names.

use std::fmt;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::component::ComponentInner;
use crate::error::{LoadError, LoadFailure, LoadResult};
use crate::render;

/// Where a component is in its load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadState {
	/// Created, waiting for its load to run.
	Requested,
	/// Waiting on the template cache.
	FetchingTemplate,
	/// Rendering the template and loading sub-components.
	Rendering,
	/// Rendered nodes were moved into the mount node.
	Mounted,
	/// The load failed. Terminal.
	Failed,
}

impl LoadState {
	/// Returns true for `Mounted` and `Failed`.
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Mounted | Self::Failed)
	}

	/// Lowercase name used in log fields.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Requested => "requested",
			Self::FetchingTemplate => "fetching_template",
			Self::Rendering => "rendering",
			Self::Mounted => "mounted",
			Self::Failed => "failed",
		}
	}
}

impl fmt::Display for LoadState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Names of the components currently loading, root first.
///
/// Each recursive load receives its own extended copy; there is no shared
/// mutable chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AncestorChain(Vec<String>);

impl AncestorChain {
	/// An empty chain, used for a root load.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns true if `name` is already loading on this chain.
	pub fn contains(&self, name: &str) -> bool {
		self.0.iter().any(|ancestor| ancestor == name)
	}

	/// Returns a copy of this chain with `name` appended.
	pub fn extended(&self, name: &str) -> Self {
		let mut names = self.0.clone();
		names.push(name.to_string());
		Self(names)
	}

	/// Names on the chain, root first.
	pub fn names(&self) -> &[String] {
		&self.0
	}

	/// Number of names on the chain.
	pub fn depth(&self) -> usize {
		self.0.len()
	}
}

impl fmt::Display for AncestorChain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0.join(" > "))
	}
}

/// Drives `component` from `Requested` to a terminal state.
///
/// The future is boxed because rendering loads sub-components through this
/// same function.
pub(crate) fn load(
	component: Rc<ComponentInner>,
	chain: AncestorChain,
) -> LocalBoxFuture<'static, LoadResult<()>> {
	component.started.set(true);
	async move {
		let name = component.name.clone();

		if chain.contains(&name) {
			return Err(fail(
				&component,
				LoadError::Cycle {
					name,
					chain: chain.names().to_vec(),
				},
			));
		}

		component.transition(LoadState::FetchingTemplate);
		let markup = match component.context.cache.fetch(&name).await {
			Ok(markup) => markup,
			Err(error) => {
				return Err(fail(
					&component,
					LoadError::CannotLoad {
						name,
						source: LoadFailure::Transport(error),
					},
				));
			}
		};

		component.transition(LoadState::Rendering);
		let fragment = match render::render(&component, &markup, &chain.extended(&name)).await {
			Ok(fragment) => fragment,
			Err(error) => {
				return Err(fail(
					&component,
					LoadError::CannotLoad {
						name,
						source: LoadFailure::Render(error),
					},
				));
			}
		};

		if let Err(error) = component.mount.append_child(&fragment) {
			return Err(fail(
				&component,
				LoadError::CannotLoad {
					name,
					source: LoadFailure::Mount(error),
				},
			));
		}

		component.transition(LoadState::Mounted);
		tracing::info!(
			component = %name,
			mount = %component.mount.id(),
			depth = chain.depth(),
			"component mounted"
		);
		Ok(())
	}
	.boxed_local()
}

fn fail(component: &ComponentInner, error: LoadError) -> LoadError {
	component.transition(LoadState::Failed);
	tracing::error!(
		component = %component.name,
		error = %error,
		root_cause = %error.root_cause(),
		detail = ?std::error::Error::source(&error).map(ToString::to_string),
		"failed to load component"
	);
	error
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_chain_is_extended_by_copy() {
		let root = AncestorChain::new().extended("root");
		let child = root.extended("child");

		assert!(child.contains("root"));
		assert!(child.contains("child"));
		assert!(!root.contains("child"));
		assert_eq!(child.depth(), 2);
		assert_eq!(child.to_string(), "root > child");
	}

	#[rstest]
	#[case(LoadState::Requested, false)]
	#[case(LoadState::FetchingTemplate, false)]
	#[case(LoadState::Rendering, false)]
	#[case(LoadState::Mounted, true)]
	#[case(LoadState::Failed, true)]
	fn test_terminal_states(#[case] state: LoadState, #[case] terminal: bool) {
		assert_eq!(state.is_terminal(), terminal);
	}
}
