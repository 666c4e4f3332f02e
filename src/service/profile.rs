use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, StoreError};
use crate::model::profile::{
    prepend, remove_by_id, NewEducation, NewExperience, Profile, ProfileFields,
};
use crate::model::user::OwnerId;
use crate::store::Stores;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone)]
pub struct Upserted {
    pub outcome: UpsertOutcome,
    pub profile: Profile,
}

/// Profile mutations and reads. Each mutation loads the owner's profile,
/// changes it in memory and writes the whole document back in one replace,
/// so a failed step leaves the stored profile as it was.
#[derive(Clone)]
pub struct ProfileService {
    stores: Stores,
}

fn no_profile() -> ApiError {
    ApiError::not_found("There is no profile for this user")
}

impl ProfileService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Creates the owner's profile from `fields`, or merges `fields` into the
    /// existing one.
    pub async fn upsert_profile(
        &self,
        owner: OwnerId,
        fields: ProfileFields,
    ) -> Result<Upserted, ApiError> {
        if let Some(existing) = self.stores.profiles.get_by_owner(owner).await? {
            let profile = self.merge_into(existing, fields).await?;
            info!("✅ Profile updated for {}", owner);
            return Ok(Upserted {
                outcome: UpsertOutcome::Updated,
                profile,
            });
        }

        let mut profile = Profile::new(owner);
        profile.apply(fields.clone());

        match self.stores.profiles.insert(profile.clone()).await {
            Ok(()) => {
                info!("✅ Profile created for {}", owner);
                Ok(Upserted {
                    outcome: UpsertOutcome::Created,
                    profile,
                })
            }
            Err(StoreError::Conflict(_)) => {
                // Another request created it between our read and insert
                debug!("profile for {} appeared concurrently, merging instead", owner);
                let existing = self
                    .stores
                    .profiles
                    .get_by_owner(owner)
                    .await?
                    .ok_or_else(no_profile)?;
                let profile = self.merge_into(existing, fields).await?;
                Ok(Upserted {
                    outcome: UpsertOutcome::Updated,
                    profile,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn merge_into(&self, mut profile: Profile, fields: ProfileFields) -> Result<Profile, ApiError> {
        profile.apply(fields);
        self.store(profile).await
    }

    async fn store(&self, profile: Profile) -> Result<Profile, ApiError> {
        if self.stores.profiles.replace(profile.clone()).await? {
            Ok(profile)
        } else {
            Err(no_profile())
        }
    }

    /// Loads the owner's profile, runs `change` on it and writes it back.
    /// Nothing is written when `change` fails.
    async fn mutate<F>(&self, owner: OwnerId, change: F) -> Result<Profile, ApiError>
    where
        F: FnOnce(&mut Profile) -> Result<(), ApiError>,
    {
        let mut profile = self
            .stores
            .profiles
            .get_by_owner(owner)
            .await?
            .ok_or_else(no_profile)?;
        change(&mut profile)?;
        self.store(profile).await
    }

    pub async fn add_experience(&self, owner: OwnerId, entry: NewExperience) -> Result<Profile, ApiError> {
        let entry = entry.into_entry()?;
        let entry_id = entry.id;
        let profile = self
            .mutate(owner, move |profile| {
                prepend(&mut profile.experience, entry);
                Ok(())
            })
            .await?;
        info!("✅ Experience {} added for {}", entry_id, owner);
        Ok(profile)
    }

    pub async fn add_education(&self, owner: OwnerId, entry: NewEducation) -> Result<Profile, ApiError> {
        let entry = entry.into_entry()?;
        let entry_id = entry.id;
        let profile = self
            .mutate(owner, move |profile| {
                prepend(&mut profile.education, entry);
                Ok(())
            })
            .await?;
        info!("✅ Education {} added for {}", entry_id, owner);
        Ok(profile)
    }

    pub async fn remove_experience(&self, owner: OwnerId, entry_id: Uuid) -> Result<Profile, ApiError> {
        self.mutate(owner, |profile| {
            remove_by_id(&mut profile.experience, entry_id)
                .map(|_| ())
                .ok_or_else(|| {
                    warn!("❌ Experience {} not found for {}", entry_id, owner);
                    ApiError::not_found("Experience not found")
                })
        })
        .await
    }

    pub async fn remove_education(&self, owner: OwnerId, entry_id: Uuid) -> Result<Profile, ApiError> {
        self.mutate(owner, |profile| {
            remove_by_id(&mut profile.education, entry_id)
                .map(|_| ())
                .ok_or_else(|| {
                    warn!("❌ Education {} not found for {}", entry_id, owner);
                    ApiError::not_found("Education not found")
                })
        })
        .await
    }

    pub async fn list_all(&self) -> Result<Vec<Profile>, ApiError> {
        Ok(self.stores.profiles.list().await?)
    }

    pub async fn get_by_owner(&self, owner: OwnerId) -> Result<Profile, ApiError> {
        self.stores
            .profiles
            .get_by_owner(owner)
            .await?
            .ok_or_else(no_profile)
    }

    /// Replaces the `user` id of each profile with the owner's name and
    /// avatar, the shape listings are rendered from.
    pub async fn populate(&self, profiles: Vec<Profile>) -> Result<Vec<serde_json::Value>, ApiError> {
        let mut populated = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let mut value = serde_json::to_value(&profile)
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            if let Some(user) = self.stores.users.get(profile.owner).await? {
                value["user"] = serde_json::to_value(user.summary())
                    .map_err(|e| ApiError::Internal(e.to_string()))?;
            }
            populated.push(value);
        }
        Ok(populated)
    }

    /// Removes the account with its profile and every post it authored.
    pub async fn delete_account(&self, owner: OwnerId) -> Result<(), ApiError> {
        let removed = self.stores.users.delete_account(owner).await?;
        info!(
            "🗑️ Account {} deleted (posts: {}, profile: {}, user: {})",
            owner, removed.posts, removed.profile, removed.user
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::post::Post;
    use crate::model::profile::Social;
    use crate::model::user::User;
    use crate::store::ProfileStore;
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn service() -> (ProfileService, Stores) {
        let stores = Stores::in_memory();
        (ProfileService::new(stores.clone()), stores)
    }

    fn fields(status: &str, skills: &str) -> ProfileFields {
        ProfileFields {
            status: Some(status.into()),
            skills: Some(skills.into()),
            ..Default::default()
        }
    }

    fn experience(title: &str) -> NewExperience {
        NewExperience {
            title: title.into(),
            company: "Acme".into(),
            from: NaiveDate::from_ymd_opt(2019, 6, 1),
            ..Default::default()
        }
    }

    fn education(school: &str) -> NewEducation {
        NewEducation {
            school: school.into(),
            degree: "BSc".into(),
            fieldofstudy: "CS".into(),
            from: NaiveDate::from_ymd_opt(2015, 9, 1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn first_upsert_creates_profile_from_fields() {
        let (svc, _) = service();
        let owner = OwnerId::new();

        let upserted = svc
            .upsert_profile(
                owner,
                ProfileFields {
                    company: Some("Acme".into()),
                    ..fields("Developer", "node, react ,  express")
                },
            )
            .await
            .unwrap();
        assert_eq!(upserted.outcome, UpsertOutcome::Created);

        let stored = svc.get_by_owner(owner).await.unwrap();
        assert_eq!(stored, upserted.profile);
        assert_eq!(stored.owner, owner);
        assert_eq!(stored.company.as_deref(), Some("Acme"));
        assert_eq!(stored.status.as_deref(), Some("Developer"));
        assert_eq!(stored.skills, vec!["node", "react", "express"]);
        assert!(stored.website.is_none());
        assert!(stored.bio.is_none());
        assert_eq!(stored.social, Social::default());
        assert!(stored.experience.is_empty());
    }

    #[tokio::test]
    async fn second_upsert_merges_fields() {
        let (svc, _) = service();
        let owner = OwnerId::new();

        svc.upsert_profile(
            owner,
            ProfileFields {
                bio: Some("I write Rust".into()),
                social: Social {
                    youtube: Some("yt".into()),
                    twitter: Some("tw".into()),
                    ..Default::default()
                },
                ..fields("Junior", "rust")
            },
        )
        .await
        .unwrap();

        let upserted = svc
            .upsert_profile(
                owner,
                ProfileFields {
                    social: Social {
                        twitter: Some("tw2".into()),
                        ..Default::default()
                    },
                    ..fields("Senior", "rust, go")
                },
            )
            .await
            .unwrap();
        assert_eq!(upserted.outcome, UpsertOutcome::Updated);

        let stored = svc.get_by_owner(owner).await.unwrap();
        assert_eq!(stored.status.as_deref(), Some("Senior"));
        assert_eq!(stored.bio.as_deref(), Some("I write Rust"));
        assert_eq!(stored.skills, vec!["rust", "go"]);
        assert_eq!(stored.social.youtube.as_deref(), Some("yt"));
        assert_eq!(stored.social.twitter.as_deref(), Some("tw2"));
    }

    #[tokio::test]
    async fn repeated_upsert_is_idempotent() {
        let (svc, stores) = service();
        let owner = OwnerId::new();

        let first = svc.upsert_profile(owner, fields("Dev", "a, b")).await.unwrap();
        let second = svc.upsert_profile(owner, fields("Dev", "a, b")).await.unwrap();

        assert_eq!(first.profile, second.profile);
        assert_eq!(stores.profiles.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn experience_is_prepended() {
        let (svc, _) = service();
        let owner = OwnerId::new();
        svc.upsert_profile(owner, fields("Dev", "rust")).await.unwrap();

        svc.add_experience(owner, experience("E1")).await.unwrap();
        let profile = svc.add_experience(owner, experience("E2")).await.unwrap();

        let titles: Vec<_> = profile.experience.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["E2", "E1"]);
        assert_ne!(profile.experience[0].id, profile.experience[1].id);
    }

    #[tokio::test]
    async fn adding_entries_without_profile_is_not_found() {
        let (svc, _) = service();
        let owner = OwnerId::new();

        assert!(matches!(
            svc.add_experience(owner, experience("E1")).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            svc.add_education(owner, education("ITB")).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            svc.remove_experience(owner, Uuid::new_v4()).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn remove_experience_removes_exactly_one() {
        let (svc, _) = service();
        let owner = OwnerId::new();
        svc.upsert_profile(owner, fields("Dev", "rust")).await.unwrap();
        for title in ["a", "b", "c"] {
            svc.add_experience(owner, experience(title)).await.unwrap();
        }
        let before = svc.get_by_owner(owner).await.unwrap();
        let middle = before.experience[1].id;

        let after = svc.remove_experience(owner, middle).await.unwrap();

        let titles: Vec<_> = after.experience.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a"]);
        assert_eq!(svc.get_by_owner(owner).await.unwrap(), after);
    }

    #[tokio::test]
    async fn removing_unknown_entry_leaves_profile_unchanged() {
        let (svc, _) = service();
        let owner = OwnerId::new();
        svc.upsert_profile(owner, fields("Dev", "rust")).await.unwrap();
        svc.add_experience(owner, experience("a")).await.unwrap();
        svc.add_education(owner, education("ITB")).await.unwrap();
        let before = svc.get_by_owner(owner).await.unwrap();

        let exp = svc.remove_experience(owner, Uuid::new_v4()).await;
        let edu = svc.remove_education(owner, Uuid::new_v4()).await;

        assert!(matches!(exp, Err(ApiError::NotFound(_))));
        assert!(matches!(edu, Err(ApiError::NotFound(_))));
        assert_eq!(svc.get_by_owner(owner).await.unwrap(), before);
    }

    #[tokio::test]
    async fn education_prepend_and_remove() {
        let (svc, _) = service();
        let owner = OwnerId::new();
        svc.upsert_profile(owner, fields("Dev", "rust")).await.unwrap();

        let first = svc.add_education(owner, education("UI")).await.unwrap();
        let profile = svc.add_education(owner, education("ITB")).await.unwrap();
        assert_eq!(profile.education[0].school, "ITB");
        assert_eq!(profile.education[1].school, "UI");

        let profile = svc
            .remove_education(owner, first.education[0].id)
            .await
            .unwrap();
        assert_eq!(profile.education.len(), 1);
        assert_eq!(profile.education[0].school, "ITB");
    }

    #[tokio::test]
    async fn delete_account_removes_profile_posts_and_user() {
        let (svc, stores) = service();
        let make_user = |email: &str| User {
            id: OwnerId::new(),
            name: "Dewi".into(),
            email: email.into(),
            avatar: String::new(),
            password_hash: String::new(),
            date: Utc::now(),
        };
        let (leaving, staying) = (make_user("d@example.com"), make_user("e@example.com"));
        stores.users.insert(leaving.clone()).await.unwrap();
        stores.users.insert(staying.clone()).await.unwrap();
        svc.upsert_profile(leaving.id, fields("Dev", "rust")).await.unwrap();
        stores.posts.insert(Post::new(&leaving, "bye".into())).await.unwrap();
        stores.posts.insert(Post::new(&staying, "hi".into())).await.unwrap();

        svc.delete_account(leaving.id).await.unwrap();

        assert!(matches!(
            svc.get_by_owner(leaving.id).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(stores.users.get(leaving.id).await.unwrap().is_none());
        let posts = stores.posts.list().await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].owner, staying.id);
    }

    #[tokio::test]
    async fn stale_writer_wins_over_disjoint_fields() {
        let (svc, stores) = service();
        let owner = OwnerId::new();
        svc.upsert_profile(owner, fields("Dev", "rust")).await.unwrap();

        // Two requests read the same document before either writes
        let mut first = stores.profiles.get_by_owner(owner).await.unwrap().unwrap();
        let mut second = first.clone();
        first.apply(ProfileFields {
            bio: Some("from first".into()),
            ..Default::default()
        });
        second.apply(ProfileFields {
            company: Some("from second".into()),
            ..Default::default()
        });
        stores.profiles.replace(first).await.unwrap();
        stores.profiles.replace(second).await.unwrap();

        let stored = svc.get_by_owner(owner).await.unwrap();
        assert_eq!(stored.company.as_deref(), Some("from second"));
        assert!(stored.bio.is_none(), "first writer's bio is lost");
    }

    #[tokio::test]
    async fn populate_swaps_owner_for_summary() {
        let (svc, stores) = service();
        let user = User {
            id: OwnerId::new(),
            name: "Eko".into(),
            email: "eko@example.com".into(),
            avatar: "//avatar".into(),
            password_hash: "secret".into(),
            date: Utc::now(),
        };
        stores.users.insert(user.clone()).await.unwrap();
        svc.upsert_profile(user.id, fields("Dev", "rust")).await.unwrap();

        let listed = svc.populate(svc.list_all().await.unwrap()).await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["user"]["name"], "Eko");
        assert_eq!(listed[0]["user"]["avatar"], "//avatar");
        assert!(listed[0]["user"].get("password_hash").is_none());
    }

    /// Profile store that hides the stored profile from the first lookup,
    /// as if another request created it right after that read.
    struct RacingProfiles {
        stored: Mutex<Profile>,
        first_read_done: AtomicBool,
    }

    #[async_trait]
    impl ProfileStore for RacingProfiles {
        async fn insert(&self, _profile: Profile) -> Result<(), StoreError> {
            Err(StoreError::Conflict("profile"))
        }

        async fn replace(&self, profile: Profile) -> Result<bool, StoreError> {
            *self.stored.lock() = profile;
            Ok(true)
        }

        async fn get_by_owner(&self, owner: OwnerId) -> Result<Option<Profile>, StoreError> {
            if !self.first_read_done.swap(true, Ordering::SeqCst) {
                return Ok(None);
            }
            let stored = self.stored.lock().clone();
            Ok((stored.owner == owner).then_some(stored))
        }

        async fn list(&self) -> Result<Vec<Profile>, StoreError> {
            Ok(vec![self.stored.lock().clone()])
        }
    }

    #[tokio::test]
    async fn insert_conflict_falls_back_to_merge() {
        let owner = OwnerId::new();
        let mut existing = Profile::new(owner);
        existing.apply(ProfileFields {
            bio: Some("created concurrently".into()),
            company: Some("Old Co".into()),
            ..fields("Junior", "go")
        });
        let existing_id = existing.id;

        let profiles = Arc::new(RacingProfiles {
            stored: Mutex::new(existing),
            first_read_done: AtomicBool::new(false),
        });
        let stores = Stores {
            profiles: profiles.clone(),
            ..Stores::in_memory()
        };
        let svc = ProfileService::new(stores);

        let upserted = svc
            .upsert_profile(
                owner,
                ProfileFields {
                    company: Some("New Co".into()),
                    ..fields("Senior", "rust, sql")
                },
            )
            .await
            .unwrap();

        assert_eq!(upserted.outcome, UpsertOutcome::Updated);
        let stored = profiles.stored.lock().clone();
        assert_eq!(stored, upserted.profile);
        assert_eq!(stored.id, existing_id);
        assert_eq!(stored.status.as_deref(), Some("Senior"));
        assert_eq!(stored.skills, vec!["rust", "sql"]);
        assert_eq!(stored.company.as_deref(), Some("New Co"));
        assert_eq!(stored.bio.as_deref(), Some("created concurrently"));
    }
}
