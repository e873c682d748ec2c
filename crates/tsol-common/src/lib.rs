//! Shared types for the TSol compiler.
//!
//! Everything here is a leaf dependency of the type engine and the
//! surrounding passes:
//!
//! - [`span`]: byte ranges into a source file, used when rendering diagnostics
//! - [`error`]: the fatal [`InternalError`] raised by [`tsol_assert!`]
//! - [`inheritance`]: the contract inheritance graph and its C3 linearization

pub mod error;
pub mod inheritance;
pub mod span;

pub use error::InternalError;
pub use inheritance::{ContractGraph, ContractId, LinearizationError};
pub use span::Span;
