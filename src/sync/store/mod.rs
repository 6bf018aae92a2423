//! Conversation/message store: state, events and transitions.

pub mod events;
pub mod handle;
pub mod reducer;
pub mod state;

pub use events::ChatEvent;
pub use handle::ChatStore;
pub use reducer::{Applied, apply, reduce};
pub use state::{ChatState, OperationKey, OperationStatus, SyncState};
