//! Node tree, events and markup parsing.
//!
//! # Examples
//!
//! ```rust
//! use reinhardt_ghost::dom::node::NodeKind;
//! use reinhardt_ghost::dom::parse_fragment;
//! ```

pub use reinhardt_ghost_dom::*;
