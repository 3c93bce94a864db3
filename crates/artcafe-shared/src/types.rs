use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SharedError;

/// Type tag carried by every notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Like,
    Comment,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "LIKE",
            Self::Comment => "COMMENT",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIKE" => Ok(Self::Like),
            "COMMENT" => Ok(Self::Comment),
            other => Err(SharedError::UnknownNotificationKind(other.to_string())),
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical folder an uploaded image lands in. Also the first path segment
/// of its public `/images/...` URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFolder {
    Posts,
    Profile,
}

impl ImageFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Profile => "profile",
        }
    }

    /// Public URL prefix, e.g. `/images/posts/`.
    pub fn public_prefix(&self) -> String {
        format!("/images/{}/", self.as_str())
    }
}

impl FromStr for ImageFolder {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posts" => Ok(Self::Posts),
            "profile" => Ok(Self::Profile),
            other => Err(SharedError::UnknownImageFolder(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_kind_wire_format() {
        assert_eq!(NotificationKind::Like.as_str(), "LIKE");
        assert_eq!("COMMENT".parse::<NotificationKind>().unwrap(), NotificationKind::Comment);
        assert!("FOLLOW".parse::<NotificationKind>().is_err());

        let json = serde_json::to_string(&NotificationKind::Like).unwrap();
        assert_eq!(json, "\"LIKE\"");
    }

    #[test]
    fn image_folder_prefix() {
        assert_eq!(ImageFolder::Profile.public_prefix(), "/images/profile/");
        assert_eq!("posts".parse::<ImageFolder>().unwrap(), ImageFolder::Posts);
        assert!("../etc".parse::<ImageFolder>().is_err());
    }
}
