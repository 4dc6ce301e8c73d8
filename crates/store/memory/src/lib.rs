mod file;
mod snapshot;
mod store;

pub use file::FileCertificateStore;
pub use snapshot::MemorySnapshot;
pub use store::MemoryCertificateStore;
