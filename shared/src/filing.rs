//! The "raise a complaint" form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{require_max, ValidationError};
use crate::model::{
    Complaint, ComplaintId, Location, Media, MediaRef, Priority, ReporterRef, Status, Timestamps,
    UserId,
};
use crate::taxonomy::{Category, CategoryLabel};

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;
pub const MAX_ADDRESS_LENGTH: usize = 500;

/// What the citizen has typed so far. Media references point at files the
/// shell already uploaded.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ComplaintDraft {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub images: Vec<MediaRef>,
    #[serde(default)]
    pub videos: Vec<MediaRef>,
}

/// Body of `POST /complaints`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewComplaint {
    pub category: Category,
    pub title: String,
    pub description: String,
    pub is_anonymous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<MediaRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub videos: Vec<MediaRef>,
}

impl ComplaintDraft {
    /// Checks required fields and builds the request body. Nothing is sent
    /// when this fails.
    pub fn validate(&self) -> Result<NewComplaint, ValidationError> {
        let category = self.category.ok_or(ValidationError::Required("category"))?;
        require_max("title", &self.title, MAX_TITLE_LENGTH)?;
        require_max("description", &self.description, MAX_DESCRIPTION_LENGTH)?;

        let address = self.address.trim();
        let location = if address.is_empty() {
            None
        } else {
            require_max("address", address, MAX_ADDRESS_LENGTH)?;
            Some(Location {
                address: Some(address.to_string()),
                ward: None,
                locality: None,
            })
        };

        Ok(NewComplaint {
            category,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            is_anonymous: self.is_anonymous,
            location,
            images: self.images.clone(),
            videos: self.videos.clone(),
        })
    }
}

impl NewComplaint {
    /// The record as it would exist right after filing. Used when no backend
    /// is involved.
    #[must_use]
    pub fn into_local(self, reporter: UserId, now: DateTime<Utc>) -> Complaint {
        let uuid = Uuid::new_v4().simple().to_string();
        let tracking_id = format!("CMP-{}", uuid[..8].to_uppercase());
        Complaint {
            id: ComplaintId::new(uuid),
            tracking_id,
            title: self.title,
            description: self.description,
            category: CategoryLabel::canonical(self.category),
            location: self.location,
            reporter: Some(ReporterRef::Id(reporter)),
            upvotes: 0,
            has_upvoted: false,
            priority: Priority::default(),
            status: Status::Pending,
            media: Media {
                images: self.images,
                videos: self.videos,
            },
            is_anonymous: self.is_anonymous,
            created_at: Some(now),
            timestamps: Timestamps {
                filed: Some(now),
                in_progress: None,
                resolved: None,
            },
            assigned_to: None,
            admin_notes: None,
        }
    }
}

/// Backend answer to a successful filing.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilingReceipt {
    #[serde(default)]
    pub tracking_id: String,
    #[serde(default)]
    pub complaint: Option<crate::model::Complaint>,
}
