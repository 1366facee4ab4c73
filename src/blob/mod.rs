// Public API - what other modules can use
pub use store::{BlobError, BlobStore, InMemoryBlobStore, LocalBlobStore};

// Internal modules
mod store;
