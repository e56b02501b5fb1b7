//! Companion backend for SimuLife.
//!
//! A thin HTTP layer over the engine's persistence gateway: it loads and
//! saves per-player progress for one story instance and keeps the legacy
//! vote-counter endpoints alive. The durable key-value store and the
//! identity provider are external collaborators behind traits; the
//! in-memory implementations here serve local runs and tests.

pub mod app;
pub mod config;
pub mod gateway;
pub mod identity;
pub mod kv;

pub use app::{router, AppState};
pub use config::ServerConfig;
pub use gateway::KvProgressStore;
pub use identity::{HeaderIdentity, IdentityProvider, PlayerIdentity};
pub use kv::{KvError, KvStore, MemoryKv};
