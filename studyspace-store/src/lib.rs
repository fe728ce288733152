pub mod app_config;
pub mod collections;
pub mod kv;

pub use app_config::{Config, SimulatorConfig, StorageConfig};
pub use collections::{
    load_bookings, load_favorites, save_bookings, save_favorites, BOOKINGS_KEY, FAVORITES_KEY,
};
pub use kv::{FileStore, KvStore, MemoryStore};
