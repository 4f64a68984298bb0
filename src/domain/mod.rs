//! Domain layer types and invariants.

pub mod documents;
pub mod error;
pub mod image;
pub mod portable;
pub mod slug;
