//! Action Adapters - Implementations of the ActionExecutor port.

mod mock_action_executor;

pub use mock_action_executor::{ActionCallRecord, MockActionExecutor};
