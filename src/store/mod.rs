//! Persistence seams. Every mutation is a whole-document replace of one
//! user, profile or post; there is no versioning, so concurrent writers to
//! the same document resolve last-writer-wins.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::post::Post;
use crate::model::profile::Profile;
use crate::model::user::{OwnerId, User};

pub mod memory;
pub mod postgres;

/// What an account deletion removed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AccountRemoval {
    pub posts: u64,
    pub profile: bool,
    pub user: bool,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the e-mail is already registered.
    async fn insert(&self, user: User) -> Result<(), StoreError>;

    async fn get(&self, id: OwnerId) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Removes the account together with its profile and posts, all or
    /// nothing.
    async fn delete_account(&self, id: OwnerId) -> Result<AccountRemoval, StoreError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fails with `Conflict` when the owner already has a profile.
    async fn insert(&self, profile: Profile) -> Result<(), StoreError>;

    /// Replaces the stored profile of `profile.owner`. Returns `false` when
    /// there is nothing to replace.
    async fn replace(&self, profile: Profile) -> Result<bool, StoreError>;

    async fn get_by_owner(&self, owner: OwnerId) -> Result<Option<Profile>, StoreError>;

    /// All profiles in creation order.
    async fn list(&self) -> Result<Vec<Profile>, StoreError>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert(&self, post: Post) -> Result<(), StoreError>;

    async fn replace(&self, post: Post) -> Result<bool, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Post>, StoreError>;

    /// All posts, newest first.
    async fn list(&self) -> Result<Vec<Post>, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// The three stores the handlers work against.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub posts: Arc<dyn PostStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::default());
        Self {
            users: store.clone(),
            profiles: store.clone(),
            posts: store,
        }
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let store = Arc::new(postgres::PgStore::new(pool));
        Self {
            users: store.clone(),
            profiles: store.clone(),
            posts: store,
        }
    }
}
