use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::model::post::{Comment, Like, Post};
use crate::model::profile::{prepend, remove_by_id};
use crate::model::user::{OwnerId, User};
use crate::store::Stores;

#[derive(Clone)]
pub struct PostService {
    stores: Stores,
}

fn post_not_found() -> ApiError {
    ApiError::not_found("Post not found")
}

impl PostService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    async fn author(&self, id: OwnerId) -> Result<User, ApiError> {
        self.stores
            .users
            .get(id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    async fn mutate<F, T>(&self, id: Uuid, change: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Post) -> Result<T, ApiError>,
    {
        let mut post = self.get(id).await?;
        let result = change(&mut post)?;
        if !self.stores.posts.replace(post).await? {
            return Err(post_not_found());
        }
        Ok(result)
    }

    pub async fn create(&self, author: OwnerId, text: String) -> Result<Post, ApiError> {
        let user = self.author(author).await?;
        let post = Post::new(&user, text);
        self.stores.posts.insert(post.clone()).await?;
        info!("✅ Post {} created by {}", post.id, author);
        Ok(post)
    }

    pub async fn list(&self) -> Result<Vec<Post>, ApiError> {
        Ok(self.stores.posts.list().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Post, ApiError> {
        self.stores.posts.get(id).await?.ok_or_else(post_not_found)
    }

    /// Only the author may delete a post.
    pub async fn delete(&self, user: OwnerId, id: Uuid) -> Result<(), ApiError> {
        let post = self.get(id).await?;
        if post.owner != user {
            warn!("❌ {} tried to delete post {} owned by {}", user, id, post.owner);
            return Err(ApiError::Unauthorized("User not authorized".into()));
        }
        self.stores.posts.delete(id).await?;
        info!("🗑️ Post {} removed", id);
        Ok(())
    }

    pub async fn like(&self, user: OwnerId, id: Uuid) -> Result<Vec<Like>, ApiError> {
        self.mutate(id, |post| {
            if post.is_liked_by(user) {
                return Err(ApiError::BadRequest("Post already liked".into()));
            }
            prepend(
                &mut post.likes,
                Like {
                    id: Uuid::new_v4(),
                    user,
                },
            );
            Ok(post.likes.clone())
        })
        .await
    }

    pub async fn unlike(&self, user: OwnerId, id: Uuid) -> Result<Vec<Like>, ApiError> {
        self.mutate(id, |post| {
            let like = post
                .like_of(user)
                .ok_or_else(|| ApiError::BadRequest("Post has not yet been liked".into()))?;
            remove_by_id(&mut post.likes, like);
            Ok(post.likes.clone())
        })
        .await
    }

    pub async fn comment(&self, user: OwnerId, id: Uuid, text: String) -> Result<Vec<Comment>, ApiError> {
        let author = self.author(user).await?;
        self.mutate(id, |post| {
            prepend(&mut post.comments, Comment::new(&author, text));
            Ok(post.comments.clone())
        })
        .await
    }

    /// Only the comment's author may remove it.
    pub async fn uncomment(
        &self,
        user: OwnerId,
        id: Uuid,
        comment_id: Uuid,
    ) -> Result<Vec<Comment>, ApiError> {
        self.mutate(id, |post| {
            let comment = post
                .comments
                .iter()
                .find(|c| c.id == comment_id)
                .ok_or_else(|| ApiError::not_found("Comment does not exist"))?;
            if comment.user != user {
                return Err(ApiError::Unauthorized("User not authorized".into()));
            }
            remove_by_id(&mut post.comments, comment_id);
            Ok(post.comments.clone())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    async fn setup() -> (PostService, User, User) {
        let stores = Stores::in_memory();
        let make = |name: &str, email: &str| User {
            id: OwnerId::new(),
            name: name.into(),
            email: email.into(),
            avatar: format!("//avatar/{}", name),
            password_hash: String::new(),
            date: Utc::now(),
        };
        let (alice, bob) = (make("alice", "a@example.com"), make("bob", "b@example.com"));
        stores.users.insert(alice.clone()).await.unwrap();
        stores.users.insert(bob.clone()).await.unwrap();
        (PostService::new(stores), alice, bob)
    }

    #[tokio::test]
    async fn create_and_fetch() {
        let (svc, alice, _) = setup().await;
        let post = svc.create(alice.id, "hello".into()).await.unwrap();

        let fetched = svc.get(post.id).await.unwrap();
        assert_eq!(fetched.name, "alice");
        assert_eq!(fetched.avatar, "//avatar/alice");
        assert!(matches!(svc.get(Uuid::new_v4()).await, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn only_author_deletes() {
        let (svc, alice, bob) = setup().await;
        let post = svc.create(alice.id, "mine".into()).await.unwrap();

        assert!(matches!(
            svc.delete(bob.id, post.id).await,
            Err(ApiError::Unauthorized(_))
        ));
        svc.delete(alice.id, post.id).await.unwrap();
        assert!(svc.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn like_twice_is_rejected_and_unlike_requires_like() {
        let (svc, alice, bob) = setup().await;
        let post = svc.create(alice.id, "like me".into()).await.unwrap();

        let likes = svc.like(bob.id, post.id).await.unwrap();
        assert_eq!(likes.len(), 1);
        assert!(matches!(
            svc.like(bob.id, post.id).await,
            Err(ApiError::BadRequest(_))
        ));

        let likes = svc.like(alice.id, post.id).await.unwrap();
        assert_eq!(likes[0].user, alice.id);

        let likes = svc.unlike(bob.id, post.id).await.unwrap();
        assert_eq!(likes.len(), 1);
        assert_eq!(likes[0].user, alice.id);
        assert!(matches!(
            svc.unlike(bob.id, post.id).await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn comments_are_prepended_and_owner_removable() {
        let (svc, alice, bob) = setup().await;
        let post = svc.create(alice.id, "discuss".into()).await.unwrap();

        svc.comment(alice.id, post.id, "first".into()).await.unwrap();
        let comments = svc.comment(bob.id, post.id, "second".into()).await.unwrap();
        assert_eq!(comments[0].text, "second");
        assert_eq!(comments[0].name, "bob");

        let bobs = comments[0].id;
        assert!(matches!(
            svc.uncomment(alice.id, post.id, bobs).await,
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            svc.uncomment(bob.id, post.id, Uuid::new_v4()).await,
            Err(ApiError::NotFound(_))
        ));

        let comments = svc.uncomment(bob.id, post.id, bobs).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "first");
    }
}
