//! TSol type engine: the type model, conversions, storage layout and
//! ABI encoding rules of the compiler.
//!
//! Every type of one compilation lives in a [`TypeCtx`] arena and is named
//! by a copyable [`TypeId`]. Declarations (contracts, structs, enums,
//! functions, state variables) live in the context's [`decl::DeclStore`]
//! and are referenced by id, so types never own each other.
//!
//! # Architecture
//!
//! - [`ty`]: the [`Type`] sum type and its payloads
//! - [`ctx`]: the interning arena, primitives and cache lifecycle
//! - [`decl`]: declarations the types refer to
//! - [`names`]: rich identifiers, canonical names and display strings
//! - [`identifier`]: escaping rich identifiers into plain identifiers
//! - [`convert`]: equality, implicit/explicit conversion, mobile and common types
//! - [`operators`]: unary and binary operator result types
//! - [`rational`]: literal parsing and exact constant arithmetic
//! - [`layout`]: storage slots and offsets
//! - [`members`]: member lookup, including `using ... for` bound functions
//! - [`abi`]: interface and encoding types, calldata sizes, selectors
//! - [`cell`]: bit and reference budgets for cell encoding
//! - [`error`] and [`diagnostics`]: type errors and their rendering

pub mod abi;
pub mod cell;
pub mod convert;
pub mod ctx;
pub mod decl;
pub mod diagnostics;
pub mod error;
pub mod identifier;
pub mod layout;
pub mod members;
pub mod names;
pub mod operators;
pub mod rational;
pub mod ty;

pub use ctx::{Primitives, TypeCtx, TypeCtxConfig};
pub use error::{BoolResult, TypeError, TypeResult};
pub use members::{Member, MemberList};
pub use operators::Token;
pub use ty::{Category, FunctionKind, FunctionType, Type, TypeId};
