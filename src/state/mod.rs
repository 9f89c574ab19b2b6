pub mod reactivity;
pub mod sync_state;

pub use reactivity::EventBus;
pub use sync_state::SyncStatusHandle;
