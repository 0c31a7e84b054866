pub mod config;
pub mod discover;
pub mod document;
pub mod engine;
pub mod error;
pub mod io;
pub mod migrate;
pub mod paths;
pub mod registry;
pub mod root_id;
pub mod store;
pub mod task;
pub mod types;
pub mod validator;

pub use error::{ErrorKind, QueueError, Result};
