//! Configuration tree ownership.
//!
//! # Responsibility
//! - Own the root folder list for one application session.
//! - Expose flattened read views and change notifications.
//!
//! # See also
//! - `service::engine` for the only public mutation paths.

pub mod config_manager;

pub use config_manager::{ConfigChange, ConfigManager};
