//! Distributed metadata store and its coordination seam.

mod coordination;
mod store;

pub use coordination::{CoordinationService, CoordinationWatcher, InProcessCoordinator};
pub use store::{MetadataStore, PROPERTY_DEFINITION_PREFIX};
