//! The vela parser.
//!
//! A deterministic single-pass parser over the token stream. The
//! declarative layer (modules, declarations, instantiations, bindings)
//! lives in [`parser`]; the embedded expression language is one parsing
//! function per precedence layer in [`expressions`]; the embedded
//! statement forms and raw-block re-parsing live in [`statements`];
//! assignment-target validation is the pure transform in [`targets`].
//!
//! Error policy: the first unexpected token aborts with a located
//! syntax error. There is no recovery and no partial result.

pub mod expressions;
pub mod parser;
pub mod statements;
pub mod targets;

pub use parser::Parser;
