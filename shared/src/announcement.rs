use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{require, require_max, ValidationError};
use crate::model::AnnouncementId;

pub const ANNOUNCEMENT_CATEGORIES: [&str; 5] =
    ["Awareness", "Maintenance", "Public Event", "Emergency", "Update"];
pub const DEFAULT_ANNOUNCEMENT_CATEGORY: &str = "Awareness";
pub const MAX_ANNOUNCEMENT_TITLE: usize = 200;
pub const MAX_ANNOUNCEMENT_BODY: usize = 5000;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(rename = "_id", alias = "id")]
    pub id: AnnouncementId,
    pub title: String,
    pub body: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub admin_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_designation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_department: Option<String>,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub is_liked: bool,
}

fn default_category() -> String {
    DEFAULT_ANNOUNCEMENT_CATEGORY.to_string()
}

impl Announcement {
    #[must_use]
    pub fn matches_search(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        needle.is_empty()
            || [&self.title, &self.body, &self.category]
                .into_iter()
                .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Announcements as loaded, newest first as the backend sends them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnnouncementBoard {
    items: Vec<Announcement>,
}

impl AnnouncementBoard {
    pub fn replace_all(&mut self, items: Vec<Announcement>) {
        self.items = items;
    }

    /// Replaces the list with a fetch result. Likes are local only, so ones
    /// made on this device survive the refetch.
    pub fn refresh(&mut self, mut fetched: Vec<Announcement>) {
        for item in &mut fetched {
            if !item.is_liked && self.get(&item.id).is_some_and(|old| old.is_liked) {
                item.is_liked = true;
                item.likes = item.likes.saturating_add(1);
            }
        }
        self.items = fetched;
    }

    pub fn upsert(&mut self, announcement: Announcement) {
        match self.items.iter_mut().find(|a| a.id == announcement.id) {
            Some(slot) => *slot = announcement,
            None => self.items.insert(0, announcement),
        }
    }

    pub fn remove(&mut self, id: &AnnouncementId) -> Option<Announcement> {
        let idx = self.items.iter().position(|a| &a.id == id)?;
        Some(self.items.remove(idx))
    }

    #[must_use]
    pub fn get(&self, id: &AnnouncementId) -> Option<&Announcement> {
        self.items.iter().find(|a| &a.id == id)
    }

    /// Flips the like on `id` and adjusts the counter. Returns the new state.
    pub fn toggle_like(&mut self, id: &AnnouncementId) -> Option<bool> {
        let item = self.items.iter_mut().find(|a| &a.id == id)?;
        if item.is_liked {
            item.likes = item.likes.saturating_sub(1);
        } else {
            item.likes = item.likes.saturating_add(1);
        }
        item.is_liked = !item.is_liked;
        Some(item.is_liked)
    }

    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Announcement> {
        self.items
            .iter()
            .filter(|a| a.matches_search(query))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Admin create/edit form; also the request body.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AnnouncementDraft {
    pub title: String,
    pub body: String,
    pub category: String,
}

impl Default for AnnouncementDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            body: String::new(),
            category: default_category(),
        }
    }
}

impl AnnouncementDraft {
    pub fn validate(&self) -> Result<AnnouncementDraft, ValidationError> {
        require_max("title", &self.title, MAX_ANNOUNCEMENT_TITLE)?;
        require_max("body", &self.body, MAX_ANNOUNCEMENT_BODY)?;
        require("category", &self.category)?;
        let category = self.category.trim();
        if !ANNOUNCEMENT_CATEGORIES.contains(&category) {
            return Err(ValidationError::Invalid {
                field: "category",
                reason: format!("'{category}' is not an announcement category"),
            });
        }
        Ok(AnnouncementDraft {
            title: self.title.trim().to_string(),
            body: self.body.trim().to_string(),
            category: category.to_string(),
        })
    }
}
