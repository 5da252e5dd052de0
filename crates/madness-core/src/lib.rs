// Library root: snake-draft and tournament-scoring engines over a SQLite
// store, re-exported for the CLI and integration tests.

pub mod config;
pub mod db;
pub mod draft;
pub mod error;
pub mod model;
pub mod protocol;
pub mod scoring;
pub mod service;

pub use db::Database;
pub use error::{ActionError, Conflict, ErrorKind};
pub use protocol::ActionResponse;
pub use service::Commissioner;
