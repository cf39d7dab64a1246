//! # vela
//!
//! Parser front end for the vela declarative UI language.
//!
//! A vela module declares UI component types and wires their attributes to
//! values or live expressions:
//!
//! ```text
//! MainWindow(Window):
//!     """A window with a greeting."""
//!     attr message = "hello"
//!     Label:
//!         id: lbl
//!         text << message.upper()
//! ```
//!
//! The crate turns source text like the above into a [`vela::ast::Module`]
//! tree, or fails with a single located [`vela::error::ParseError`]. It
//! performs no object instantiation, no layout, and no widget binding;
//! those belong to the runtime that consumes the tree.

pub mod vela;

pub use crate::vela::error::ParseError;
pub use crate::vela::parse;
