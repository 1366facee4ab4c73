pub mod actions;
pub mod assertions;
pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use assertions::{room_users, stored_message, system_text, updated_message, MessageAssertion};
#[allow(unused_imports)]
pub use mocks::MockConnectionManager;
#[allow(unused_imports)]
pub use setup::{TestSetup, TestSetupBuilder};
