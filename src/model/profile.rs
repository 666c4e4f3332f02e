use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, FieldError};
use crate::model::user::OwnerId;

/// A member of one of a profile's ordered sub-collections.
pub trait Entry {
    fn entry_id(&self) -> Uuid;
}

/// Inserts at the front: sub-collections are ordered newest insertion first.
pub fn prepend<E>(list: &mut Vec<E>, entry: E) {
    list.insert(0, entry);
}

/// Removes the single entry carrying `id` and keeps the order of the rest.
/// Returns `None`, leaving `list` untouched, when no entry matches.
pub fn remove_by_id<E: Entry>(list: &mut Vec<E>, id: Uuid) -> Option<E> {
    let index = list.iter().position(|entry| entry.entry_id() == id)?;
    Some(list.remove(index))
}

/// Splits a comma separated skills string into trimmed, non-empty skills.
pub fn parse_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect()
}

// Field dari form yang kosong ("") dianggap tidak dikirim
fn provided(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn assign(slot: &mut Option<String>, value: Option<String>) {
    if let Some(value) = provided(value) {
        *slot = Some(value);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Social {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

impl Social {
    /// Sets each provided link independently; absent links keep their value.
    pub fn merge(&mut self, update: Social) {
        assign(&mut self.youtube, update.youtube);
        assign(&mut self.twitter, update.twitter);
        assign(&mut self.facebook, update.facebook);
        assign(&mut self.linkedin, update.linkedin);
        assign(&mut self.instagram, update.instagram);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub from: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entry for ExperienceEntry {
    fn entry_id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub school: String,
    pub degree: String,
    pub fieldofstudy: String,
    pub from: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entry for EducationEntry {
    fn entry_id(&self) -> Uuid {
        self.id
    }
}

/// One account's professional profile, stored as a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "user")]
    pub owner: OwnerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub githubusername: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub social: Social,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    pub date: DateTime<Utc>,
}

impl Profile {
    /// An empty profile for `owner`; every optional field unset.
    pub fn new(owner: OwnerId) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            company: None,
            website: None,
            location: None,
            bio: None,
            status: None,
            githubusername: None,
            skills: Vec::new(),
            social: Social::default(),
            experience: Vec::new(),
            education: Vec::new(),
            date: Utc::now(),
        }
    }

    /// Field-level merge. Provided fields overwrite, absent ones are kept,
    /// `social` merges link by link and `skills` replaces the whole list.
    pub fn apply(&mut self, fields: ProfileFields) {
        assign(&mut self.company, fields.company);
        assign(&mut self.website, fields.website);
        assign(&mut self.location, fields.location);
        assign(&mut self.bio, fields.bio);
        assign(&mut self.status, fields.status);
        assign(&mut self.githubusername, fields.githubusername);

        if let Some(skills) = provided(fields.skills) {
            self.skills = parse_skills(&skills);
        }

        self.social.merge(fields.social);
    }
}

/// Sparse field set accepted by the profile upsert. Social links arrive
/// flat, next to the scalar fields.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ProfileFields {
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    #[validate(
        required(message = "Status is required"),
        length(min = 1, message = "Status is required")
    )]
    pub status: Option<String>,
    pub githubusername: Option<String>,
    #[validate(
        required(message = "Skills is required"),
        length(min = 1, message = "Skills is required")
    )]
    pub skills: Option<String>,
    #[serde(flatten)]
    pub social: Social,
}

// Client mengirim "" untuk tanggal yang tidak diisi
fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", value))),
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

fn missing_from() -> ApiError {
    ApiError::Validation(vec![FieldError::new("from", "From date is required")])
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct NewExperience {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Company is required"))]
    pub company: String,
    pub location: Option<String>,
    #[serde(deserialize_with = "optional_date")]
    #[validate(required(message = "From date is required"))]
    pub from: Option<NaiveDate>,
    #[serde(deserialize_with = "optional_date")]
    pub to: Option<NaiveDate>,
    pub current: bool,
    pub description: Option<String>,
}

impl NewExperience {
    /// Builds the stored entry under a fresh identifier.
    pub fn into_entry(self) -> Result<ExperienceEntry, ApiError> {
        let from = self.from.ok_or_else(missing_from)?;
        Ok(ExperienceEntry {
            id: Uuid::new_v4(),
            title: self.title,
            company: self.company,
            location: provided(self.location),
            from,
            to: self.to,
            current: self.current,
            description: provided(self.description),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct NewEducation {
    #[validate(length(min = 1, message = "School is required"))]
    pub school: String,
    #[validate(length(min = 1, message = "Degree is required"))]
    pub degree: String,
    #[validate(length(min = 1, message = "Field of study is required"))]
    pub fieldofstudy: String,
    #[serde(deserialize_with = "optional_date")]
    #[validate(required(message = "From date is required"))]
    pub from: Option<NaiveDate>,
    #[serde(deserialize_with = "optional_date")]
    pub to: Option<NaiveDate>,
    pub current: bool,
    pub description: Option<String>,
}

impl NewEducation {
    pub fn into_entry(self) -> Result<EducationEntry, ApiError> {
        let from = self.from.ok_or_else(missing_from)?;
        Ok(EducationEntry {
            id: Uuid::new_v4(),
            school: self.school,
            degree: self.degree,
            fieldofstudy: self.fieldofstudy,
            from,
            to: self.to,
            current: self.current,
            description: provided(self.description),
        })
    }
}
