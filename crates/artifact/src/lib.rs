pub mod error;
pub mod fs;
pub mod memory;
pub mod store;
pub mod template;

pub use error::ArtifactError;
pub use fs::{FsArtifactStore, FsTemplateSource};
pub use memory::{MemoryArtifactStore, MemoryTemplateSource};
pub use store::{ArtifactStore, validate_name};
pub use template::TemplateSource;
