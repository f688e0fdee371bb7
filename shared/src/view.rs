//! View model types handed to the shell, and the builders that fill them.
//!
//! Anonymous complaints never carry reporter identity into any of these
//! types; `ReporterView` is only built for non-anonymous records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::announcement::Announcement;
use crate::error::{AppError, ErrorSeverity};
use crate::filing::ComplaintDraft;
use crate::lifecycle::TransitionPolicy;
use crate::model::{Assignee, Complaint, MediaRef, Priority, Status, Timestamps};
use crate::ranking::{ComplaintFilter, Projection};
use crate::session::{AuthStep, Role, Session};
use crate::taxonomy::Category;
use crate::upvote::UpvoteLedger;

pub const DESCRIPTION_PREVIEW_LENGTH: usize = 120;
pub const ANONYMOUS_LABEL: &str = "Anonymous";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Login,
    Register,
    #[default]
    Complaints,
    Detail,
    FileComplaint,
    Announcements,
}

impl Screen {
    /// Screens that make no sense without a signed-in user.
    #[must_use]
    pub const fn requires_session(self) -> bool {
        matches!(self, Self::FileComplaint)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastMessage {
    pub message: String,
    pub kind: ToastKind,
    pub created_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ToastMessage {
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        kind: ToastKind,
        created_at: DateTime<Utc>,
        duration_ms: u64,
    ) -> Self {
        Self {
            message: message.into(),
            kind,
            created_at,
            duration_ms,
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let elapsed = now.signed_duration_since(self.created_at).num_milliseconds();
        u64::try_from(elapsed).is_ok_and(|ms| ms > self.duration_ms)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastView {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl From<&ToastMessage> for ToastView {
    fn from(t: &ToastMessage) -> Self {
        Self {
            message: t.message.clone(),
            kind: t.kind,
            duration_ms: t.duration_ms,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: e.severity == ErrorSeverity::Transient,
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReporterView {
    pub name: Option<String>,
    /// Only filled for admin viewers.
    pub email: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplaintRow {
    pub id: String,
    pub tracking_id: String,
    pub title: String,
    pub description_preview: String,
    pub category: String,
    pub status: Status,
    pub status_label: String,
    pub priority: Priority,
    pub upvotes: u32,
    pub has_upvoted: bool,
    pub upvote_pending: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub reporter_label: String,
    pub reporter: Option<ReporterView>,
    pub has_media: bool,
    /// Statuses an admin may move this complaint to; empty for citizens.
    pub allowed_transitions: Vec<Status>,
    pub is_updating: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplaintDetail {
    pub row: ComplaintRow,
    pub description: String,
    pub address: Option<String>,
    pub timestamps: Timestamps,
    pub images: Vec<MediaRef>,
    pub videos: Vec<MediaRef>,
    pub assigned_to: Option<Assignee>,
    pub admin_notes: Option<String>,
}

/// Per-row inputs that come from the model rather than the record.
#[derive(Clone, Copy, Debug)]
pub struct RowContext<'a> {
    pub ledger: &'a UpvoteLedger,
    pub policy: &'a TransitionPolicy,
    pub viewer_is_admin: bool,
    pub can_manage: bool,
}

fn preview(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(DESCRIPTION_PREVIEW_LENGTH) {
        Some((cut, _)) => format!("{}...", text[..cut].trim_end()),
        None => text.to_string(),
    }
}

fn reporter_view(complaint: &Complaint, viewer_is_admin: bool) -> (String, Option<ReporterView>) {
    if complaint.is_anonymous {
        return (ANONYMOUS_LABEL.to_string(), None);
    }
    let profile = complaint.reporter.as_ref().and_then(|r| r.profile());
    let name = profile.and_then(|p| p.username.clone());
    let email = profile
        .and_then(|p| p.email.clone())
        .filter(|_| viewer_is_admin);
    let label = name.clone().unwrap_or_else(|| "Citizen".to_string());
    (label, Some(ReporterView { name, email }))
}

impl ComplaintRow {
    #[must_use]
    pub fn build(complaint: &Complaint, ctx: RowContext<'_>, is_updating: bool) -> Self {
        let (reporter_label, reporter) = reporter_view(complaint, ctx.viewer_is_admin);
        let allowed_transitions = if ctx.can_manage {
            ctx.policy.allowed_targets(complaint.status)
        } else {
            Vec::new()
        };

        Self {
            id: complaint.id.to_string(),
            tracking_id: complaint.tracking_id.clone(),
            title: complaint.title.clone(),
            description_preview: preview(&complaint.description),
            category: complaint.category.display().to_string(),
            status: complaint.status,
            status_label: complaint.status.display_name().to_string(),
            priority: complaint.priority,
            upvotes: ctx.ledger.displayed_for(complaint),
            has_upvoted: ctx.ledger.has_voted(&complaint.id),
            upvote_pending: ctx.ledger.is_in_flight(&complaint.id),
            created_at: complaint.created_at(),
            location: complaint.location.as_ref().and_then(|l| l.summary()),
            reporter_label,
            reporter,
            has_media: !complaint.media.is_empty(),
            allowed_transitions,
            is_updating,
        }
    }
}

impl ComplaintDetail {
    #[must_use]
    pub fn build(complaint: &Complaint, ctx: RowContext<'_>, is_updating: bool) -> Self {
        Self {
            row: ComplaintRow::build(complaint, ctx, is_updating),
            description: complaint.description.clone(),
            address: complaint.location.as_ref().and_then(|l| l.address.clone()),
            timestamps: complaint.timestamps.clone(),
            images: complaint.media.images.clone(),
            videos: complaint.media.videos.clone(),
            assigned_to: complaint.assigned_to.clone(),
            admin_notes: complaint.admin_notes.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryOption {
    pub category: Category,
    pub label: String,
    pub short_label: String,
}

#[must_use]
pub fn category_options() -> Vec<CategoryOption> {
    Category::ALL
        .iter()
        .map(|c| CategoryOption {
            category: *c,
            label: c.label().to_string(),
            short_label: c.short_label().to_string(),
        })
        .collect()
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnouncementView {
    pub id: String,
    pub title: String,
    pub body: String,
    pub category: String,
    pub author: String,
    pub author_title: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub likes: u32,
    pub is_liked: bool,
}

impl From<&Announcement> for AnnouncementView {
    fn from(a: &Announcement) -> Self {
        let author_title = match (&a.admin_designation, &a.admin_department) {
            (Some(d), Some(dep)) => Some(format!("{d}, {dep}")),
            (Some(d), None) => Some(d.clone()),
            (None, Some(dep)) => Some(dep.clone()),
            (None, None) => None,
        };
        Self {
            id: a.id.to_string(),
            title: a.title.clone(),
            body: a.body.clone(),
            category: a.category.clone(),
            author: a.admin_name.clone(),
            author_title,
            published_at: a.published_at,
            image: a.image.clone(),
            likes: a.likes,
            is_liked: a.is_liked,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionView {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<&Session> for SessionView {
    fn from(s: &Session) -> Self {
        Self {
            user_id: s.user.id.to_string(),
            username: s.user.username.clone(),
            email: s.user.email.clone(),
            role: s.user.role,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewState {
    Login {
        step: AuthStep,
    },
    Register {
        is_submitting: bool,
    },
    Complaints {
        title: String,
        projection: Projection,
        filter: ComplaintFilter,
        rows: Vec<ComplaintRow>,
        can_manage: bool,
    },
    Detail {
        complaint: Option<Box<ComplaintDetail>>,
    },
    FileComplaint {
        draft: ComplaintDraft,
        categories: Vec<CategoryOption>,
        is_submitting: bool,
    },
    Announcements {
        query: String,
        items: Vec<AnnouncementView>,
        can_manage: bool,
        categories: Vec<String>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    pub state: ViewState,
    pub error: Option<UserFacingError>,
    pub toast: Option<ToastView>,
    pub is_loading: bool,
    pub is_authenticated: bool,
    pub user: Option<SessionView>,
    pub demo_mode: bool,
}
