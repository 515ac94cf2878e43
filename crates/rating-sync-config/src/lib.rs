pub mod config;
pub mod paths;

pub use config::{Config, LocalConfig, RemoteConfig, StoreBackend, OTHERS_SENTINEL};
pub use paths::PathManager;
