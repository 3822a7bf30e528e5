use crate::error::{AppError, AppResult};
use crate::models::common::id_string;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    #[serde(alias = "_id", deserialize_with = "id_string")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    pub capacity: u32,
    #[serde(default)]
    pub banner_url: Option<String>,
}

/// Full record sent on create and update; an update replaces every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowInput {
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub capacity: u32,
    pub banner_url: Option<String>,
}

impl From<&Show> for ShowInput {
    fn from(show: &Show) -> Self {
        Self {
            title: show.title.clone(),
            description: show.description.clone(),
            location: show.location.clone(),
            starts_at: show.starts_at,
            ends_at: show.ends_at,
            capacity: show.capacity,
            banner_url: show.banner_url.clone(),
        }
    }
}

impl ShowInput {
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::ValidationError("Show title is required".to_string()));
        }
        if self.location.trim().is_empty() {
            return Err(AppError::ValidationError("Show location is required".to_string()));
        }
        if self.capacity == 0 {
            return Err(AppError::ValidationError(
                "Capacity must be greater than 0".to_string(),
            ));
        }
        if let Some(ends_at) = self.ends_at
            && ends_at < self.starts_at
        {
            return Err(AppError::ValidationError(
                "Show cannot end before it starts".to_string(),
            ));
        }
        Ok(())
    }
}
