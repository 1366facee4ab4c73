// Public API - what other modules can use
pub use registry::{Membership, PresenceRegistry};

// Internal modules
mod registry;
