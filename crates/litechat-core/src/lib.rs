//! LiteChat core: the shared error type, configuration and conversation messages.

pub mod config;
pub mod error;
pub mod message;

pub use config::{DataPaths, LiteConfig};
pub use error::{Error, Result};
pub use message::{Message, Role};
