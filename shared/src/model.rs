use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::taxonomy::CategoryLabel;

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

typed_id!(ComplaintId);
typed_id!(UserId);
typed_id!(AnnouncementId);

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Resolved,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Pending, Status::InProgress, Status::Resolved];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Resolved => "resolved",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
        }
    }

    /// Position along the forward path; used to detect backward moves.
    #[must_use]
    pub const fn stage(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::InProgress => 1,
            Self::Resolved => 2,
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in-progress" | "in_progress" | "inprogress" | "in progress" => Some(Self::InProgress),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Resolved)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Fixed ranking weight: high 3, medium 2, low 1.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Timestamps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_progress: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
}

impl Location {
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        [&self.address, &self.ward, &self.locality]
            .into_iter()
            .filter_map(|f| f.as_deref())
    }

    /// "locality, ward" style summary for list rows.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.locality, &self.ward, &self.address]
            .into_iter()
            .filter_map(|f| f.as_deref())
            .filter(|s| !s.trim().is_empty())
            .take(2)
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MediaRef {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct Media {
    #[serde(default)]
    pub images: Vec<MediaRef>,
    #[serde(default)]
    pub videos: Vec<MediaRef>,
}

impl Media {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.videos.is_empty()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Reporter {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// The backend sends `user` either populated or as a bare id.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum ReporterRef {
    Id(UserId),
    Profile(Reporter),
}

impl ReporterRef {
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Id(id) => Some(id),
            Self::Profile(p) => p.id.as_ref(),
        }
    }

    #[must_use]
    pub fn profile(&self) -> Option<&Reporter> {
        match self {
            Self::Id(_) => None,
            Self::Profile(p) => Some(p),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Assignee {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    #[serde(rename = "_id", alias = "id")]
    pub id: ComplaintId,
    #[serde(default)]
    pub tracking_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: CategoryLabel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(rename = "user", default, skip_serializing_if = "Option::is_none")]
    pub reporter: Option<ReporterRef>,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default)]
    pub has_upvoted: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub media: Media,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub timestamps: Timestamps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Assignee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
}

impl Complaint {
    /// Creation time, falling back to the filing stamp.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.or(self.timestamps.filed)
    }

    /// Checks that lifecycle stamps agree with the status.
    #[must_use]
    pub fn timestamps_consistent(&self) -> bool {
        let in_progress_expected = matches!(self.status, Status::InProgress | Status::Resolved);
        let resolved_expected = self.status == Status::Resolved;
        self.timestamps.in_progress.is_some() == in_progress_expected
            && self.timestamps.resolved.is_some() == resolved_expected
    }

    #[must_use]
    pub fn reporter_id(&self) -> Option<&UserId> {
        self.reporter.as_ref().and_then(ReporterRef::user_id)
    }

    /// Fields the free-text search matches against.
    pub(crate) fn search_haystack(&self) -> impl Iterator<Item = &str> {
        [
            self.title.as_str(),
            self.description.as_str(),
            self.category.raw.as_str(),
            self.category.category.short_label(),
            self.tracking_id.as_str(),
        ]
        .into_iter()
        .chain(self.location.iter().flat_map(Location::fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::Category;

    const WIRE: &str = r#"{
        "_id": "65f1a",
        "trackingId": "CMP-1001",
        "title": "Large pothole on main road",
        "description": "Deep pothole near the bus stop",
        "category": "Public Works",
        "location": {"address": "MG Road", "ward": "Ward 12", "locality": "Indiranagar"},
        "user": {"_id": "u1", "username": "asha", "email": "asha@example.com"},
        "upvotes": 41,
        "priority": "high",
        "status": "in-progress",
        "media": {"images": [{"url": "https://cdn.example.com/p.jpg", "public_id": "p"}], "videos": []},
        "isAnonymous": false,
        "createdAt": "2024-03-01T10:00:00Z",
        "timestamps": {"filed": "2024-03-01T10:00:00Z", "inProgress": "2024-03-02T09:00:00Z"}
    }"#;

    #[test]
    fn test_complaint_decodes_wire_shape() {
        let complaint: Complaint = serde_json::from_str(WIRE).unwrap();
        assert_eq!(complaint.id.as_str(), "65f1a");
        assert_eq!(complaint.tracking_id, "CMP-1001");
        assert_eq!(complaint.category.category, Category::PublicWorks);
        assert_eq!(complaint.status, Status::InProgress);
        assert_eq!(complaint.priority, Priority::High);
        assert_eq!(complaint.upvotes, 41);
        assert!(!complaint.has_upvoted);
        assert_eq!(complaint.reporter_id().map(UserId::as_str), Some("u1"));
        assert!(complaint.timestamps_consistent());
    }

    #[test]
    fn test_complaint_defaults_for_sparse_record() {
        let complaint: Complaint =
            serde_json::from_str(r#"{"id":"x","title":"t","category":"Water","user":"u9"}"#)
                .unwrap();
        assert_eq!(complaint.priority, Priority::Medium);
        assert_eq!(complaint.status, Status::Pending);
        assert_eq!(complaint.upvotes, 0);
        assert!(complaint.media.is_empty());
        assert_eq!(complaint.reporter_id().map(UserId::as_str), Some("u9"));
        assert_eq!(complaint.created_at(), None);
    }

    #[test]
    fn test_created_at_falls_back_to_filed() {
        let mut complaint: Complaint = serde_json::from_str(WIRE).unwrap();
        let filed = complaint.timestamps.filed;
        complaint.created_at = None;
        assert_eq!(complaint.created_at(), filed);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&Status::InProgress).unwrap(), "\"in-progress\"");
        assert_eq!(Status::parse("In_Progress"), Some(Status::InProgress));
        assert_eq!(Status::parse("closed"), None);
    }

    #[test]
    fn test_priority_rank_order() {
        assert!(Priority::High.rank() > Priority::Medium.rank());
        assert!(Priority::Medium.rank() > Priority::Low.rank());
    }

    #[test]
    fn test_location_summary() {
        let location = Location {
            address: Some("MG Road".into()),
            ward: Some("Ward 12".into()),
            locality: Some("Indiranagar".into()),
        };
        assert_eq!(location.summary().as_deref(), Some("Indiranagar, Ward 12"));
        assert_eq!(Location::default().summary(), None);
    }
}
