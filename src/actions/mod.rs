mod catalog;
mod store;
mod types;

pub use catalog::ActionCatalog;
pub use store::{ActionStore, FileActionStore, MemoryActionStore};
pub use types::{ActionDefinition, PaletteMetadata, validate_identifier};
