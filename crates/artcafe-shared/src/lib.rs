// Types, constants and helpers shared by the store and the HTTP server.

pub mod constants;
pub mod credentials;
pub mod error;
pub mod notify;
pub mod types;

pub use error::SharedError;
pub use types::{ImageFolder, NotificationKind};
