use serde::{Deserialize, Serialize};

use crate::announcement::AnnouncementDraft;
use crate::capabilities::{HttpResult, KvResult};
use crate::filing::ComplaintDraft;
use crate::model::{AnnouncementId, ComplaintId, Status};
use crate::mutation::MutationId;
use crate::ranking::{ComplaintFilter, Projection};
use crate::session::{LoginRequest, OtpRequest, OtpVerification, Registration};
use crate::upvote::VoteDirection;
use crate::view::Screen;

// Capability results are boxed to keep the enum small, and never cross
// the FFI boundary.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub enum Event {
    #[default]
    Noop,

    // Lifecycle
    Configure {
        config_json: String,
    },
    AppStarted,
    #[serde(skip)]
    SessionLoaded(Box<KvResult>),
    #[serde(skip)]
    SessionSaved(Box<KvResult>),
    #[serde(skip)]
    SessionCleared(Box<KvResult>),

    // Navigation
    Navigate(Screen),
    ProjectionSelected(Projection),
    RefreshRequested,
    #[serde(skip)]
    ComplaintsFetched {
        projection: Projection,
        result: Box<HttpResult>,
    },
    ComplaintSelected {
        id: ComplaintId,
    },
    #[serde(skip)]
    ComplaintFetched {
        id: ComplaintId,
        result: Box<HttpResult>,
    },
    ComplaintDeselected,

    // Filtering
    FilterChanged(ComplaintFilter),
    SearchChanged {
        query: String,
    },

    // Admin workflow
    StatusChangeRequested {
        id: ComplaintId,
        status: Status,
    },
    AssignRequested {
        id: ComplaintId,
    },
    #[serde(skip)]
    MutationResponse {
        mutation_id: MutationId,
        result: Box<HttpResult>,
    },

    // Upvotes
    UpvoteToggled {
        id: ComplaintId,
    },
    #[serde(skip)]
    UpvoteResponse {
        id: ComplaintId,
        direction: VoteDirection,
        result: Box<HttpResult>,
    },

    // Filing
    DraftChanged(Box<ComplaintDraft>),
    FileComplaintRequested,
    #[serde(skip)]
    FileComplaintResponse(Box<HttpResult>),

    // Auth
    LoginSubmitted(LoginRequest),
    OtpRequested(OtpRequest),
    #[serde(skip)]
    OtpDispatched {
        email: String,
        result: Box<HttpResult>,
    },
    OtpSubmitted(OtpVerification),
    AdminLoginSubmitted(LoginRequest),
    #[serde(skip)]
    AuthResponse(Box<HttpResult>),
    RegisterSubmitted(Box<Registration>),
    #[serde(skip)]
    RegisterResponse(Box<HttpResult>),
    LogoutRequested,

    // Announcements
    AnnouncementsRequested,
    #[serde(skip)]
    AnnouncementsFetched(Box<HttpResult>),
    AnnouncementSearchChanged {
        query: String,
    },
    AnnouncementLikeToggled {
        id: AnnouncementId,
    },
    AnnouncementSaveRequested {
        id: Option<AnnouncementId>,
        draft: AnnouncementDraft,
    },
    #[serde(skip)]
    AnnouncementSaved(Box<HttpResult>),
    AnnouncementDeleteRequested {
        id: AnnouncementId,
    },
    #[serde(skip)]
    AnnouncementDeleted {
        id: AnnouncementId,
        result: Box<HttpResult>,
    },

    DismissError,
    DismissToast,
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Configure { .. } => "configure",
            Self::AppStarted => "app_started",
            Self::SessionLoaded(_) => "session_loaded",
            Self::SessionSaved(_) => "session_saved",
            Self::SessionCleared(_) => "session_cleared",
            Self::Navigate(_) => "navigate",
            Self::ProjectionSelected(_) => "projection_selected",
            Self::RefreshRequested => "refresh_requested",
            Self::ComplaintsFetched { .. } => "complaints_fetched",
            Self::ComplaintSelected { .. } => "complaint_selected",
            Self::ComplaintFetched { .. } => "complaint_fetched",
            Self::ComplaintDeselected => "complaint_deselected",
            Self::FilterChanged(_) => "filter_changed",
            Self::SearchChanged { .. } => "search_changed",
            Self::StatusChangeRequested { .. } => "status_change_requested",
            Self::AssignRequested { .. } => "assign_requested",
            Self::MutationResponse { .. } => "mutation_response",
            Self::UpvoteToggled { .. } => "upvote_toggled",
            Self::UpvoteResponse { .. } => "upvote_response",
            Self::DraftChanged(_) => "draft_changed",
            Self::FileComplaintRequested => "file_complaint_requested",
            Self::FileComplaintResponse(_) => "file_complaint_response",
            Self::LoginSubmitted(_) => "login_submitted",
            Self::OtpRequested(_) => "otp_requested",
            Self::OtpDispatched { .. } => "otp_dispatched",
            Self::OtpSubmitted(_) => "otp_submitted",
            Self::AdminLoginSubmitted(_) => "admin_login_submitted",
            Self::AuthResponse(_) => "auth_response",
            Self::RegisterSubmitted(_) => "register_submitted",
            Self::RegisterResponse(_) => "register_response",
            Self::LogoutRequested => "logout_requested",
            Self::AnnouncementsRequested => "announcements_requested",
            Self::AnnouncementsFetched(_) => "announcements_fetched",
            Self::AnnouncementSearchChanged { .. } => "announcement_search_changed",
            Self::AnnouncementLikeToggled { .. } => "announcement_like_toggled",
            Self::AnnouncementSaveRequested { .. } => "announcement_save_requested",
            Self::AnnouncementSaved(_) => "announcement_saved",
            Self::AnnouncementDeleteRequested { .. } => "announcement_delete_requested",
            Self::AnnouncementDeleted { .. } => "announcement_deleted",
            Self::DismissError => "dismiss_error",
            Self::DismissToast => "dismiss_toast",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::Navigate(_)
                | Self::ProjectionSelected(_)
                | Self::RefreshRequested
                | Self::ComplaintSelected { .. }
                | Self::ComplaintDeselected
                | Self::FilterChanged(_)
                | Self::SearchChanged { .. }
                | Self::StatusChangeRequested { .. }
                | Self::AssignRequested { .. }
                | Self::UpvoteToggled { .. }
                | Self::DraftChanged(_)
                | Self::FileComplaintRequested
                | Self::LoginSubmitted(_)
                | Self::OtpRequested(_)
                | Self::OtpSubmitted(_)
                | Self::AdminLoginSubmitted(_)
                | Self::RegisterSubmitted(_)
                | Self::LogoutRequested
                | Self::AnnouncementsRequested
                | Self::AnnouncementSearchChanged { .. }
                | Self::AnnouncementLikeToggled { .. }
                | Self::AnnouncementSaveRequested { .. }
                | Self::AnnouncementDeleteRequested { .. }
                | Self::DismissError
                | Self::DismissToast
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_size_is_reasonable() {
        let size = std::mem::size_of::<Event>();
        assert!(size <= 128, "Event enum is {size} bytes, box more variants");
    }

    #[test]
    fn test_responses_are_not_user_initiated() {
        let fetched = Event::ComplaintsFetched {
            projection: Projection::AdminAll,
            result: Box::new(Err(crate::capabilities::HttpError::Timeout)),
        };
        assert!(!fetched.is_user_initiated());
        assert_eq!(fetched.name(), "complaints_fetched");
        assert!(Event::UpvoteToggled { id: "c1".into() }.is_user_initiated());
    }

    #[test]
    fn test_default_is_noop() {
        assert!(matches!(Event::default(), Event::Noop));
    }
}
