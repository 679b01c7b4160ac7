//! Compiler for JSight Schema, a JSON-by-example schema notation.
//!
//! A schema is written as an example JSON value whose nodes carry rule
//! annotations:
//!
//! ```text
//! {
//!   "id": 1,          // {min: 1}
//!   "name": "Tom",    // {minLength: 1} - pet name
//!   "owner": @Person | @Company
//! }
//! ```
//!
//! [`compile`] scans, loads and reconciles one schema body against a
//! [`TypeRegistry`] of named types and a [`RuleRegistry`] of named enums.
//! [`resolve`] then expands `allOf` inheritance once the referenced types are
//! registered. Compiled schemas validate documents ([`validate_value`]),
//! describe themselves ([`Schema::doc`]) and regenerate their example
//! ([`Schema::example`]).
pub mod compiler;
pub mod config;
pub mod constraint;
pub mod doc;
pub mod error;
pub mod example;
pub mod json_type;
pub mod lexeme;
pub mod literal;
pub mod node;
pub mod scanner;
pub mod schema;
pub mod validate;

mod loader;

pub use compiler::{AllOfCompiler, CompileOptions, Compiler, collect_user_types, compile, resolve};
pub use constraint::{Constraint, ConstraintKind, Constraints};
pub use doc::DocElement;
pub use error::{ErrorKind, Location, Result, SchemaError, Violation};
pub use json_type::JsonType;
pub use literal::{Literal, Number};
pub use node::{Key, Node, NodeKind, Span};
pub use schema::{RuleRegistry, Schema, TypeRegistry};
pub use validate::{Validator, validate_value};
