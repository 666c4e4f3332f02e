use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{AccountRemoval, PostStore, ProfileStore, UserStore};
use crate::error::StoreError;
use crate::model::post::{Comment, Like, Post};
use crate::model::profile::{EducationEntry, ExperienceEntry, Profile, Social};
use crate::model::user::{OwnerId, User};

const UNIQUE_VIOLATION: &str = "23505";

/// Maps a unique-constraint violation to `Conflict`, anything else to `Backend`.
fn conflict_or_backend(err: sqlx::Error, what: &'static str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::Conflict(what);
        }
    }
    StoreError::from(err)
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Helper struct untuk hasil query
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    avatar: String,
    password_hash: String,
    date: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: OwnerId::from_uuid(row.id),
            name: row.name,
            email: row.email,
            avatar: row.avatar,
            password_hash: row.password_hash,
            date: row.date,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    owner: Uuid,
    company: Option<String>,
    website: Option<String>,
    location: Option<String>,
    bio: Option<String>,
    status: Option<String>,
    githubusername: Option<String>,
    skills: Vec<String>,
    social: Json<Social>,
    experience: Json<Vec<ExperienceEntry>>,
    education: Json<Vec<EducationEntry>>,
    date: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            owner: OwnerId::from_uuid(row.owner),
            company: row.company,
            website: row.website,
            location: row.location,
            bio: row.bio,
            status: row.status,
            githubusername: row.githubusername,
            skills: row.skills,
            social: row.social.0,
            experience: row.experience.0,
            education: row.education.0,
            date: row.date,
        }
    }
}

#[derive(Debug, FromRow)]
struct PostRow {
    id: Uuid,
    owner: Uuid,
    text: String,
    name: String,
    avatar: String,
    likes: Json<Vec<Like>>,
    comments: Json<Vec<Comment>>,
    date: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            owner: OwnerId::from_uuid(row.owner),
            text: row.text,
            name: row.name,
            avatar: row.avatar,
            likes: row.likes.0,
            comments: row.comments.0,
            date: row.date,
        }
    }
}

const PROFILE_COLUMNS: &str = "id, owner, company, website, location, bio, status, githubusername, \
     skills, social, experience, education, date";

const POST_COLUMNS: &str = "id, owner, text, name, avatar, likes, comments, date";

#[async_trait]
impl UserStore for PgStore {
    async fn insert(&self, user: User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, name, email, avatar, password_hash, date) VALUES ($1,$2,$3,$4,$5,$6)",
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.avatar)
        .bind(&user.password_hash)
        .bind(user.date)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_backend(e, "user"))?;
        Ok(())
    }

    async fn get(&self, id: OwnerId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, avatar, password_hash, date FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, avatar, password_hash, date FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn delete_account(&self, id: OwnerId) -> Result<AccountRemoval, StoreError> {
        let mut tx = self.pool.begin().await?;

        let posts = sqlx::query("DELETE FROM posts WHERE owner = $1")
            .bind(id.as_uuid())
            .execute(&mut tx)
            .await?
            .rows_affected();
        let profile = sqlx::query("DELETE FROM profiles WHERE owner = $1")
            .bind(id.as_uuid())
            .execute(&mut tx)
            .await?
            .rows_affected();
        let user = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(AccountRemoval {
            posts,
            profile: profile > 0,
            user: user > 0,
        })
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn insert(&self, profile: Profile) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO profiles (id, owner, company, website, location, bio, status, githubusername, \
             skills, social, experience, education, date) \
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)",
        )
        .bind(profile.id)
        .bind(profile.owner.as_uuid())
        .bind(profile.company)
        .bind(profile.website)
        .bind(profile.location)
        .bind(profile.bio)
        .bind(profile.status)
        .bind(profile.githubusername)
        .bind(profile.skills)
        .bind(Json(profile.social))
        .bind(Json(profile.experience))
        .bind(Json(profile.education))
        .bind(profile.date)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_backend(e, "profile"))?;
        Ok(())
    }

    async fn replace(&self, profile: Profile) -> Result<bool, StoreError> {
        // id, owner dan date tidak pernah berubah setelah dibuat
        let result = sqlx::query(
            "UPDATE profiles SET company = $2, website = $3, location = $4, bio = $5, status = $6, \
             githubusername = $7, skills = $8, social = $9, experience = $10, education = $11 \
             WHERE owner = $1",
        )
        .bind(profile.owner.as_uuid())
        .bind(profile.company)
        .bind(profile.website)
        .bind(profile.location)
        .bind(profile.bio)
        .bind(profile.status)
        .bind(profile.githubusername)
        .bind(profile.skills)
        .bind(Json(profile.social))
        .bind(Json(profile.experience))
        .bind(Json(profile.education))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_by_owner(&self, owner: OwnerId) -> Result<Option<Profile>, StoreError> {
        let query = format!("SELECT {} FROM profiles WHERE owner = $1", PROFILE_COLUMNS);
        let row = sqlx::query_as::<_, ProfileRow>(&query)
            .bind(owner.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Profile::from))
    }

    async fn list(&self) -> Result<Vec<Profile>, StoreError> {
        let query = format!("SELECT {} FROM profiles ORDER BY date ASC", PROFILE_COLUMNS);
        let rows = sqlx::query_as::<_, ProfileRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn insert(&self, post: Post) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO posts (id, owner, text, name, avatar, likes, comments, date) \
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8)",
        )
        .bind(post.id)
        .bind(post.owner.as_uuid())
        .bind(post.text)
        .bind(post.name)
        .bind(post.avatar)
        .bind(Json(post.likes))
        .bind(Json(post.comments))
        .bind(post.date)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_backend(e, "post"))?;
        Ok(())
    }

    async fn replace(&self, post: Post) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE posts SET text = $2, name = $3, avatar = $4, likes = $5, comments = $6 WHERE id = $1",
        )
        .bind(post.id)
        .bind(post.text)
        .bind(post.name)
        .bind(post.avatar)
        .bind(Json(post.likes))
        .bind(Json(post.comments))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let query = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);
        let row = sqlx::query_as::<_, PostRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Post::from))
    }

    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        let query = format!("SELECT {} FROM posts ORDER BY date DESC", POST_COLUMNS);
        let rows = sqlx::query_as::<_, PostRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
