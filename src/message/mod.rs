// Public API - what other modules can use
pub use handlers::upload_file;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
mod types;
