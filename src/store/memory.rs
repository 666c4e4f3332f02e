use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{AccountRemoval, PostStore, ProfileStore, UserStore};
use crate::error::StoreError;
use crate::model::post::Post;
use crate::model::profile::Profile;
use crate::model::user::{OwnerId, User};

/// Process-local store with the same uniqueness rules as the Postgres schema.
/// Used when no database is configured and throughout the tests.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    profiles: RwLock<Vec<Profile>>,
    posts: RwLock<Vec<Post>>,
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: User) -> Result<(), StoreError> {
        let mut users = self.users.write();
        if users.iter().any(|u| u.email == user.email || u.id == user.id) {
            return Err(StoreError::Conflict("user"));
        }
        users.push(user);
        Ok(())
    }

    async fn get(&self, id: OwnerId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().iter().find(|u| u.email == email).cloned())
    }

    async fn delete_account(&self, id: OwnerId) -> Result<AccountRemoval, StoreError> {
        // Semua lock diambil dulu supaya penghapusan terlihat sekaligus
        let mut users = self.users.write();
        let mut profiles = self.profiles.write();
        let mut posts = self.posts.write();

        let posts_before = posts.len();
        posts.retain(|p| p.owner != id);
        let profiles_before = profiles.len();
        profiles.retain(|p| p.owner != id);
        let users_before = users.len();
        users.retain(|u| u.id != id);

        Ok(AccountRemoval {
            posts: (posts_before - posts.len()) as u64,
            profile: profiles.len() != profiles_before,
            user: users.len() != users_before,
        })
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn insert(&self, profile: Profile) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write();
        if profiles.iter().any(|p| p.owner == profile.owner) {
            return Err(StoreError::Conflict("profile"));
        }
        profiles.push(profile);
        Ok(())
    }

    async fn replace(&self, profile: Profile) -> Result<bool, StoreError> {
        let mut profiles = self.profiles.write();
        match profiles.iter_mut().find(|p| p.owner == profile.owner) {
            Some(slot) => {
                *slot = profile;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_by_owner(&self, owner: OwnerId) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.read().iter().find(|p| p.owner == owner).cloned())
    }

    async fn list(&self) -> Result<Vec<Profile>, StoreError> {
        Ok(self.profiles.read().clone())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert(&self, post: Post) -> Result<(), StoreError> {
        let mut posts = self.posts.write();
        if posts.iter().any(|p| p.id == post.id) {
            return Err(StoreError::Conflict("post"));
        }
        posts.push(post);
        Ok(())
    }

    async fn replace(&self, post: Post) -> Result<bool, StoreError> {
        let mut posts = self.posts.write();
        match posts.iter_mut().find(|p| p.id == post.id) {
            Some(slot) => {
                *slot = post;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        Ok(self.posts.read().iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        let mut posts = self.posts.read().clone();
        // Insertion order is oldest first; reverse before the stable sort so
        // posts with equal timestamps still come out newest first.
        posts.reverse();
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(posts)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut posts = self.posts.write();
        let before = posts.len();
        posts.retain(|p| p.id != id);
        Ok(posts.len() != before)
    }
}
