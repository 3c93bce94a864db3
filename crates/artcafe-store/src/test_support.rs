//! Fixtures for the store's unit tests.

use uuid::Uuid;

use crate::database::Database;
use crate::models::{NewPost, NewUser, Post, User};

pub(crate) fn db() -> Database {
    Database::open_in_memory().expect("in-memory database")
}

pub(crate) fn user(db: &Database, username: &str) -> User {
    db.create_user(&NewUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: "$argon2id$placeholder".to_string(),
        full_name: Some(format!("{username} full")),
    })
    .expect("create user")
}

pub(crate) fn post(db: &Database, owner: Uuid, title: &str) -> Post {
    db.create_post(&NewPost {
        user_id: owner,
        title: title.to_string(),
        content: format!("{title} body"),
        image_url: None,
        image_name: None,
        image_stored: false,
    })
    .expect("create post")
}

/// Like a post that is not yet liked by `user_id`.
pub(crate) fn like(db: &mut Database, post_id: Uuid, user_id: Uuid) {
    let toggle = db.toggle_like(post_id, user_id).expect("toggle like");
    assert!(toggle.liked, "post was already liked");
}
