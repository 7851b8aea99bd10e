//! Store, expressions, bindings, template cache and component loading.
//!
//! # Examples
//!
//! ```rust
//! use reinhardt_ghost::core::expr::Expression;
//! use reinhardt_ghost::core::store::Store;
//! ```

pub use reinhardt_ghost_core::*;
