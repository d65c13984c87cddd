//! Part definitions and the library that resolves them

pub mod info;
pub mod library;

pub use info::{PartInfo, PartKind};
pub use library::{PartCatalog, PartLibrary};
