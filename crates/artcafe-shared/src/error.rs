use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Unknown notification type: {0}")]
    UnknownNotificationKind(String),

    #[error("Unknown image folder: {0}")]
    UnknownImageFolder(String),
}

impl From<argon2::password_hash::Error> for SharedError {
    fn from(e: argon2::password_hash::Error) -> Self {
        Self::PasswordHash(e.to_string())
    }
}
