//! Error types for tree manipulation and markup parsing.

use thiserror::Error;

/// Result type for node tree operations.
pub type DomResult<T> = Result<T, DomError>;

/// Errors raised by the node tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DomError {
	/// The requested insertion would break the tree shape.
	#[error("hierarchy request error: {0}")]
	HierarchyRequest(String),

	/// Markup could not be turned into a node tree.
	#[error("failed to parse markup: {0}")]
	Parse(String),
}
