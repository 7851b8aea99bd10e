//! # Reinhardt Ghost DOM
//!
//! A small, single-threaded node tree used by the ghost component runtime.
//!
//! ## Features
//!
//! - Element, text, comment and fragment nodes behind cheap [`Node`] handles
//! - Attribute access, tree moves and in-place replacement
//! - Editable values for `input`, `textarea` and `select`
//! - Event listeners with bubbling ([`Event`], [`EventType`])
//! - Markup parsing through `scraper` ([`parse_fragment`]) and HTML output
//!
//! ## Example
//!
//! ```
//! use reinhardt_ghost_dom::{Event, EventType, Node, parse_fragment};
//!
//! let fragment = parse_fragment("<button>Go</button>").unwrap();
//! let host = Node::element("div");
//! host.append_child(&fragment).unwrap();
//!
//! let button = host.first_child().unwrap();
//! button.add_event_listener(EventType::Click, |event| event.prevent_default());
//!
//! assert!(!button.dispatch_event(&Event::new(EventType::Click)));
//! assert_eq!(host.inner_html(), "<button>Go</button>");
//! ```

pub mod error;
pub mod event;
pub mod node;
pub mod parse;
mod serialize;

pub use error::{DomError, DomResult};
pub use event::{Event, EventType, ListenerId};
pub use node::{ElementData, Node, NodeId, NodeKind, WeakNode};
pub use parse::parse_fragment;
