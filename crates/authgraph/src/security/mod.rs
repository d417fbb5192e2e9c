//! Visibility labels and caller authorizations.
//!
//! Every element, property, metadata entry and marker row carries a [`Visibility`].
//! Reads evaluate it against the caller's [`Authorizations`] and drop anything the
//! caller cannot read.

mod authorizations;
mod visibility;

pub use authorizations::Authorizations;
pub use visibility::{Visibility, VisibilityExpr};
