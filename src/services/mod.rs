pub mod api_client;
pub mod network_monitor;
pub mod offline_queue;
pub mod sw_manager;
pub mod sync_engine;

pub use api_client::ApiClient;
pub use network_monitor::{NetworkMonitor, NetworkStatus};
pub use offline_queue::{ActionStore, LocalStorageStore, OfflineQueue};
pub use sw_manager::{BrowserPlatform, ServiceWorkerManager, SwPlatform};
pub use sync_engine::{ActionTransport, SyncEngine};
