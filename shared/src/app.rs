use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::announcement::{Announcement, AnnouncementBoard, AnnouncementDraft, ANNOUNCEMENT_CATEGORIES};
use crate::api::{self, Api, ComplaintQuery, Endpoint};
use crate::capabilities::{Capabilities, HttpResult, KvResult};
use crate::config::PortalConfig;
use crate::current_time;
use crate::error::{AppError, ErrorKind, ErrorSeverity};
use crate::event::Event;
use crate::filing::ComplaintDraft;
use crate::fixtures::{self, DEMO_CITIZEN_ID};
use crate::lifecycle::{TransitionError, TransitionOutcome};
use crate::model::{AnnouncementId, ComplaintId, Status, UserId};
use crate::mutation::{revert_status, MutationId, MutationKind, MutationLedger};
use crate::ranking::{self, ComplaintFilter, Projection};
use crate::session::{AuthStep, Session, SESSION_STORAGE_KEY};
use crate::store::ComplaintStore;
use crate::upvote::{Completion, ToggleOutcome, UpvoteLedger, VoteDirection};
use crate::view::{
    category_options, AnnouncementView, ComplaintDetail, ComplaintRow, RowContext, Screen,
    SessionView, ToastKind, ToastMessage, ToastView, UserFacingError, ViewModel, ViewState,
};

#[derive(Debug, Default)]
pub struct Model {
    pub config: PortalConfig,
    pub session: Option<Session>,
    pub auth_step: AuthStep,
    /// Address the last one-time code went to, kept so a failed
    /// verification can go back to the code prompt.
    pub otp_email: Option<String>,
    pub screen: Screen,
    pub projection: Projection,
    pub filter: ComplaintFilter,
    pub store: ComplaintStore,
    pub upvotes: UpvoteLedger,
    pub mutations: MutationLedger,
    pub announcements: AnnouncementBoard,
    pub announcement_query: String,
    pub selected: Option<ComplaintId>,
    pub draft: ComplaintDraft,
    pub toast: Option<ToastMessage>,
    pub error: Option<AppError>,
    pub is_loading: bool,
    pub is_submitting: bool,
}

impl Model {
    /// Whose complaints the personal pages show. Demo mode without a
    /// session acts as the demo citizen.
    #[must_use]
    pub fn viewer(&self) -> Option<UserId> {
        match &self.session {
            Some(session) => Some(session.user_id().clone()),
            None if self.config.demo_mode => Some(UserId::new(DEMO_CITIZEN_ID)),
            None => None,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_admin)
    }

    /// Admin actions are open to admins, and to everyone in demo mode.
    #[must_use]
    pub fn can_manage(&self) -> bool {
        self.is_admin() || self.config.demo_mode
    }

    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        let duration_ms = match kind {
            ToastKind::Warning | ToastKind::Error => self.config.error_toast_duration_ms,
            ToastKind::Info | ToastKind::Success => self.config.toast_duration_ms,
        };
        self.toast = Some(ToastMessage::new(message, kind, current_time(), duration_ms));
    }

    fn load_demo_data(&mut self) {
        self.store.replace_all(fixtures::demo_complaints());
        self.upvotes.clear();
        self.upvotes.reconcile(self.store.iter());
        self.announcements.replace_all(fixtures::demo_announcements());
    }

    fn api(&self) -> Api<'_> {
        Api::new(&self.config, self.session.as_ref())
    }
}

#[derive(Default)]
pub struct App;

impl App {
    /// Surfaces an error. Transient ones become a toast, the rest a
    /// dismissible banner. An authentication failure ends the session.
    fn report(model: &mut Model, caps: &Capabilities, error: AppError) {
        if error.is_auth_failure() {
            warn!(code = error.code(), "authentication rejected, signing out");
            Self::sign_out(model, caps);
            model.show_toast(error.user_facing_message(), ToastKind::Warning);
            return;
        }

        match error.severity {
            ErrorSeverity::Transient => {
                warn!(code = error.code(), error = %error, "transient error");
                model.show_toast(error.user_facing_message(), ToastKind::Error);
            }
            ErrorSeverity::Permanent | ErrorSeverity::Fatal => {
                error!(code = error.code(), error = %error, "request failed");
                model.error = Some(error);
            }
        }
    }

    /// Sign-in failures keep the backend's wording ("Invalid OTP") rather
    /// than the generic session-expired message.
    fn auth_failed(model: &mut Model, error: &AppError, step: AuthStep) {
        warn!(code = error.code(), "authentication failed");
        model.auth_step = step;
        model.is_submitting = false;
        let message = match error.kind {
            ErrorKind::Authentication | ErrorKind::Validation if !error.message.is_empty() => {
                error.message.clone()
            }
            _ => error.user_facing_message(),
        };
        model.show_toast(message, ToastKind::Error);
    }

    fn require_sign_in(model: &mut Model, message: &str) {
        info!("sign-in required");
        model.screen = Screen::Login;
        if model.auth_step == AuthStep::SignedIn {
            model.auth_step = AuthStep::SignedOut;
        }
        model.show_toast(message, ToastKind::Info);
    }

    fn sign_out(model: &mut Model, caps: &Capabilities) {
        let rolled_back = model.mutations.rollback_all(&mut model.store);
        model.upvotes.clear();
        model.session = None;
        model.auth_step = AuthStep::SignedOut;
        model.otp_email = None;
        model.screen = Screen::Login;
        model.selected = None;
        model.is_submitting = false;
        model.projection = Projection::default();
        if model.config.demo_mode {
            model.load_demo_data();
        } else {
            model.store.clear();
        }
        info!(rolled_back, "signed out");

        caps.key_value.delete(SESSION_STORAGE_KEY.to_string(), |result| {
            Event::SessionCleared(Box::new(result))
        });
    }

    fn establish_session(model: &mut Model, caps: &Capabilities, session: Session) {
        match session.to_bytes() {
            Ok(bytes) => caps
                .key_value
                .set(SESSION_STORAGE_KEY.to_string(), bytes, |result| {
                    Event::SessionSaved(Box::new(result))
                }),
            Err(e) => warn!(error = %e, "session not persisted"),
        }

        info!(user_id = %session.user_id(), admin = session.is_admin(), "signed in");
        let welcome = format!("Welcome, {}!", session.user.username);
        model.projection = if session.is_admin() {
            Projection::AdminAll
        } else {
            Projection::default()
        };
        model.session = Some(session);
        model.auth_step = AuthStep::SignedIn;
        model.otp_email = None;
        model.is_submitting = false;
        model.upvotes.clear();
        model.screen = Screen::Complaints;
        model.show_toast(welcome, ToastKind::Success);
        Self::fetch_complaints(model, caps);
    }

    fn complaints_endpoint(projection: Projection) -> Endpoint {
        let status = match projection.statuses() {
            [only] => Some(*only),
            _ => None,
        };
        if projection.is_personal() {
            return Endpoint::MyComplaints { status };
        }
        let query = ComplaintQuery {
            status,
            sort: Some(projection.order()),
            ..ComplaintQuery::default()
        };
        if projection.is_admin() {
            Endpoint::AdminComplaints(query)
        } else {
            Endpoint::PublicComplaints(query)
        }
    }

    fn fetch_complaints(model: &mut Model, caps: &Capabilities) {
        if model.config.demo_mode {
            if model.store.is_empty() {
                model.load_demo_data();
            }
            return;
        }

        let projection = model.projection;
        let request = model.api().request(&Self::complaints_endpoint(projection));
        match request {
            Ok(request) => {
                debug!(page = projection.title(), url = %request.url, "fetching complaints");
                model.is_loading = true;
                request.send(&caps.http, move |result| Event::ComplaintsFetched {
                    projection,
                    result: Box::new(result),
                });
            }
            Err(e) => Self::report(model, caps, e.into()),
        }
    }

    fn fetch_announcements(model: &mut Model, caps: &Capabilities) {
        if model.config.demo_mode {
            if model.announcements.is_empty() {
                model
                    .announcements
                    .replace_all(fixtures::demo_announcements());
            }
            return;
        }

        let request = model.api().request(&Endpoint::Announcements);
        match request {
            Ok(request) => {
                model.is_loading = true;
                request.send(&caps.http, |result| Event::AnnouncementsFetched(Box::new(result)));
            }
            Err(e) => Self::report(model, caps, e.into()),
        }
    }

    /// Applies a status change locally, records how to undo it and sends it.
    fn change_status(
        model: &mut Model,
        caps: &Capabilities,
        id: ComplaintId,
        target: Status,
        assign: bool,
    ) {
        if !model.can_manage() {
            Self::report(
                model,
                caps,
                AppError::new(ErrorKind::Authorization, "Admin access required."),
            );
            return;
        }
        if model.mutations.has_pending_for(&id) {
            Self::report(model, caps, TransitionError::InFlight(id).into());
            return;
        }
        let Some(snapshot) = model.store.get(&id).cloned() else {
            Self::report(model, caps, TransitionError::NotFound(id).into());
            return;
        };
        if assign && snapshot.status != Status::Pending {
            let err = TransitionError::NotAllowed {
                from: snapshot.status,
                to: Status::InProgress,
            };
            Self::report(model, caps, err.into());
            return;
        }

        let outcome = model.store.transition(
            &id,
            target,
            current_time(),
            &model.config.transition_policy,
        );
        let (from, to) = match outcome {
            Ok(TransitionOutcome::Applied { from, to }) => (from, to),
            Ok(TransitionOutcome::Unchanged) => {
                debug!(complaint_id = %id, status = target.as_str(), "status unchanged");
                return;
            }
            Err(e) => {
                Self::report(model, caps, e.into());
                return;
            }
        };
        info!(
            complaint_id = %id,
            from = from.as_str(),
            to = to.as_str(),
            assign,
            "status changed locally"
        );

        if model.config.demo_mode {
            model.show_toast(
                format!("Status updated to {}.", to.display_name()),
                ToastKind::Success,
            );
            return;
        }

        let request = {
            let api = model.api();
            if assign {
                api.request_json(&Endpoint::AdminAssign(id.clone()), &json!({}))
            } else {
                api.status_update(&id, to)
            }
        };
        match request {
            Ok(request) => {
                let kind = if assign {
                    MutationKind::Assign
                } else {
                    MutationKind::StatusChange { from, to }
                };
                let rollback = revert_status(id.clone(), to, from, snapshot.timestamps);
                let mutation_id = model.mutations.record(id, kind, rollback);
                request.send(&caps.http, move |result| Event::MutationResponse {
                    mutation_id,
                    result: Box::new(result),
                });
            }
            Err(e) => {
                model.store.revert_status(&id, to, from, snapshot.timestamps);
                Self::report(model, caps, e.into());
            }
        }
    }

    fn handle_mutation_response(
        model: &mut Model,
        caps: &Capabilities,
        mutation_id: &MutationId,
        result: HttpResult,
    ) {
        match api::decode_mutation(result) {
            Ok(updated) => {
                let Some((complaint_id, kind)) = model.mutations.commit(mutation_id) else {
                    debug!(%mutation_id, "response for settled mutation ignored");
                    return;
                };
                if let Some(server) =
                    updated.filter(|c| c.id == complaint_id && c.timestamps_consistent())
                {
                    model.upvotes.reconcile(std::iter::once(&server));
                    model.store.upsert(server);
                }
                info!(complaint_id = %complaint_id, %mutation_id, "mutation confirmed");
                let message = match kind {
                    MutationKind::StatusChange { to, .. } => {
                        format!("Status updated to {}.", to.display_name())
                    }
                    MutationKind::Assign => "Complaint assigned.".to_string(),
                };
                model.show_toast(message, ToastKind::Success);
            }
            Err(e) => {
                if let Some((complaint_id, _)) =
                    model.mutations.rollback(mutation_id, &mut model.store)
                {
                    warn!(complaint_id = %complaint_id, %mutation_id, "mutation rolled back");
                }
                Self::report(model, caps, e.into());
            }
        }
    }

    fn send_upvote(
        model: &mut Model,
        caps: &Capabilities,
        id: ComplaintId,
        direction: VoteDirection,
    ) {
        let request = model.api().request(&Endpoint::Upvote {
            id: id.clone(),
            direction,
        });
        match request {
            Ok(request) => request.send(&caps.http, move |result| Event::UpvoteResponse {
                id,
                direction,
                result: Box::new(result),
            }),
            Err(e) => {
                model.upvotes.complete(&id, false);
                Self::report(model, caps, e.into());
            }
        }
    }

    fn toggle_upvote(model: &mut Model, caps: &Capabilities, id: ComplaintId) {
        if model.viewer().is_none() {
            Self::require_sign_in(model, "Please sign in to upvote complaints.");
            return;
        }
        if !model.store.contains(&id) {
            Self::report(model, caps, TransitionError::NotFound(id).into());
            return;
        }

        match model.upvotes.toggle(&id) {
            ToggleOutcome::Deferred => {
                debug!(complaint_id = %id, "upvote toggle deferred");
            }
            ToggleOutcome::Send(_) if model.config.demo_mode => {
                model.upvotes.complete(&id, true);
            }
            ToggleOutcome::Send(direction) => Self::send_upvote(model, caps, id, direction),
        }
    }

    fn handle_upvote_response(
        model: &mut Model,
        caps: &Capabilities,
        id: ComplaintId,
        direction: VoteDirection,
        result: HttpResult,
    ) {
        let reply = api::read_reply(result);
        match model.upvotes.complete(&id, reply.is_ok()) {
            Completion::Confirmed => {
                debug!(complaint_id = %id, up = direction.is_up(), "upvote confirmed");
            }
            Completion::FollowUp(next) => {
                debug!(complaint_id = %id, up = next.is_up(), "upvote follow-up");
                Self::send_upvote(model, caps, id, next);
            }
            Completion::RolledBack => {
                warn!(complaint_id = %id, up = direction.is_up(), "upvote rolled back");
            }
        }
        if let Err(e) = reply {
            Self::report(model, caps, e.into());
        }
    }

    fn file_complaint(model: &mut Model, caps: &Capabilities) {
        if model.is_submitting {
            return;
        }
        let Some(viewer) = model.viewer() else {
            Self::require_sign_in(model, "Please sign in to raise a complaint.");
            return;
        };
        let body = match model.draft.validate() {
            Ok(body) => body,
            Err(e) => {
                Self::report(model, caps, e.into());
                return;
            }
        };

        if model.config.demo_mode {
            let complaint = body.into_local(viewer, current_time());
            info!(tracking_id = %complaint.tracking_id, "complaint filed locally");
            let message = format!("Complaint filed. Tracking ID: {}", complaint.tracking_id);
            model.store.prepend(complaint);
            model.draft = ComplaintDraft::default();
            model.projection = Projection::MyActive;
            model.screen = Screen::Complaints;
            model.show_toast(message, ToastKind::Success);
            return;
        }

        let request = model.api().file_complaint(&body);
        match request {
            Ok(request) => {
                model.is_submitting = true;
                request.send(&caps.http, |result| Event::FileComplaintResponse(Box::new(result)));
            }
            Err(e) => Self::report(model, caps, e.into()),
        }
    }

    fn save_announcement(
        model: &mut Model,
        caps: &Capabilities,
        id: Option<AnnouncementId>,
        draft: &AnnouncementDraft,
    ) {
        if !model.can_manage() {
            Self::report(
                model,
                caps,
                AppError::new(ErrorKind::Authorization, "Admin access required."),
            );
            return;
        }
        let draft = match draft.validate() {
            Ok(draft) => draft,
            Err(e) => {
                Self::report(model, caps, e.into());
                return;
            }
        };

        if model.config.demo_mode {
            let existing = id.as_ref().and_then(|id| model.announcements.get(id)).cloned();
            let author = model
                .session
                .as_ref()
                .map_or_else(|| "Demo Admin".to_string(), |s| s.user.username.clone());
            let announcement = Announcement {
                id: id.unwrap_or_else(|| AnnouncementId::new(uuid::Uuid::new_v4().to_string())),
                title: draft.title,
                body: draft.body,
                category: draft.category,
                admin_name: author,
                admin_designation: existing.as_ref().and_then(|a| a.admin_designation.clone()),
                admin_department: existing.as_ref().and_then(|a| a.admin_department.clone()),
                published_at: Some(current_time()),
                image: existing.as_ref().and_then(|a| a.image.clone()),
                likes: existing.as_ref().map_or(0, |a| a.likes),
                is_liked: existing.as_ref().is_some_and(|a| a.is_liked),
            };
            model.announcements.upsert(announcement);
            model.show_toast("Announcement published.", ToastKind::Success);
            return;
        }

        let request = model.api().save_announcement(id.as_ref(), &draft);
        match request {
            Ok(request) => {
                model.is_submitting = true;
                request.send(&caps.http, |result| Event::AnnouncementSaved(Box::new(result)));
            }
            Err(e) => Self::report(model, caps, e.into()),
        }
    }

    fn delete_announcement(model: &mut Model, caps: &Capabilities, id: AnnouncementId) {
        if !model.can_manage() {
            Self::report(
                model,
                caps,
                AppError::new(ErrorKind::Authorization, "Admin access required."),
            );
            return;
        }
        if model.config.demo_mode {
            model.announcements.remove(&id);
            model.show_toast("Announcement deleted.", ToastKind::Success);
            return;
        }

        let request = model
            .api()
            .request(&Endpoint::DeleteAnnouncement(id.clone()));
        match request {
            Ok(request) => request.send(&caps.http, move |result| Event::AnnouncementDeleted {
                id,
                result: Box::new(result),
            }),
            Err(e) => Self::report(model, caps, e.into()),
        }
    }

    fn handle_session_loaded(model: &mut Model, caps: &Capabilities, result: KvResult) {
        match result {
            Ok(Some(bytes)) => match Session::from_bytes(&bytes) {
                Ok(session) => {
                    info!(user_id = %session.user_id(), "session restored");
                    if session.is_admin() {
                        model.projection = Projection::AdminAll;
                    }
                    model.session = Some(session);
                    model.auth_step = AuthStep::SignedIn;
                }
                Err(e) => {
                    warn!(error = %e, "discarding stored session");
                    caps.key_value.delete(SESSION_STORAGE_KEY.to_string(), |result| {
                        Event::SessionCleared(Box::new(result))
                    });
                }
            },
            Ok(None) => debug!("no stored session"),
            Err(e) => warn!(error = ?e, "session could not be read"),
        }
        Self::fetch_complaints(model, caps);
    }

    fn submit<T: serde::Serialize>(
        model: &mut Model,
        caps: &Capabilities,
        endpoint: &Endpoint,
        body: &T,
        make_event: impl FnOnce(HttpResult) -> Event + Send + Sync + 'static,
    ) {
        let request = model.api().request_json(endpoint, body);
        match request {
            Ok(request) => {
                model.auth_step = AuthStep::Submitting;
                request.send(&caps.http, make_event);
            }
            Err(e) => {
                let error = AppError::from(e);
                Self::auth_failed(model, &error, AuthStep::SignedOut);
            }
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    #[allow(clippy::too_many_lines)]
    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(
            event = event.name(),
            user_initiated = event.is_user_initiated(),
            "update"
        );
        if model
            .toast
            .as_ref()
            .is_some_and(|t| t.is_expired(current_time()))
        {
            model.toast = None;
        }

        match event {
            Event::Noop => return,

            Event::Configure { config_json } => match PortalConfig::from_json(&config_json) {
                Ok(config) => {
                    let entering_demo = config.demo_mode && !model.config.demo_mode;
                    info!(demo = config.demo_mode, "configuration applied");
                    model.config = config;
                    if entering_demo {
                        model.load_demo_data();
                    }
                }
                Err(e) => Self::report(model, caps, e.into()),
            },

            Event::AppStarted => {
                if model.config.demo_mode {
                    model.load_demo_data();
                }
                model.is_loading = true;
                caps.key_value.get(SESSION_STORAGE_KEY.to_string(), |result| {
                    Event::SessionLoaded(Box::new(result))
                });
            }

            Event::SessionLoaded(result) => {
                model.is_loading = false;
                Self::handle_session_loaded(model, caps, *result);
            }

            Event::SessionSaved(result) => {
                if let Err(e) = *result {
                    warn!(error = ?e, "session not saved");
                    model.show_toast(
                        "Could not remember your sign-in on this device.",
                        ToastKind::Warning,
                    );
                }
            }

            Event::SessionCleared(result) => match *result {
                Ok(previous) => debug!(existed = previous.is_some(), "stored session cleared"),
                Err(e) => warn!(error = ?e, "stored session not cleared"),
            },

            Event::Navigate(screen) => {
                if screen.requires_session() && model.viewer().is_none() {
                    Self::require_sign_in(model, "Please sign in to continue.");
                } else {
                    model.screen = screen;
                    match screen {
                        Screen::Complaints if model.store.is_empty() => {
                            Self::fetch_complaints(model, caps);
                        }
                        Screen::Announcements => Self::fetch_announcements(model, caps),
                        _ => {}
                    }
                }
            }

            Event::ProjectionSelected(projection) => {
                if projection.is_admin() && !model.can_manage() {
                    Self::report(
                        model,
                        caps,
                        AppError::new(ErrorKind::Authorization, "Admin access required."),
                    );
                } else if projection.is_personal() && model.viewer().is_none() {
                    Self::require_sign_in(model, "Please sign in to see your complaints.");
                } else {
                    model.projection = projection;
                    model.screen = Screen::Complaints;
                    model.selected = None;
                    Self::fetch_complaints(model, caps);
                }
            }

            Event::RefreshRequested => {
                if model.screen == Screen::Announcements {
                    Self::fetch_announcements(model, caps);
                } else {
                    Self::fetch_complaints(model, caps);
                }
            }

            Event::ComplaintsFetched { projection, result } => {
                if projection != model.projection {
                    debug!(page = projection.title(), "stale complaint page ignored");
                    return;
                }
                model.is_loading = false;
                match api::decode_complaints(*result) {
                    Ok(complaints) => {
                        info!(count = complaints.len(), page = projection.title(), "complaints loaded");
                        model.store.replace_all(complaints);
                        model.upvotes.reconcile(model.store.iter());
                    }
                    Err(e) => Self::report(model, caps, e.into()),
                }
            }

            Event::ComplaintSelected { id } => {
                model.screen = Screen::Detail;
                model.selected = Some(id.clone());
                if !model.config.demo_mode {
                    let request = model.api().request(&Endpoint::Complaint(id.clone()));
                    match request {
                        Ok(request) => request.send(&caps.http, move |result| {
                            Event::ComplaintFetched {
                                id,
                                result: Box::new(result),
                            }
                        }),
                        Err(e) => Self::report(model, caps, e.into()),
                    }
                }
            }

            Event::ComplaintFetched { id, result } => match api::decode_complaint(*result) {
                Ok(complaint) => {
                    model.upvotes.reconcile(std::iter::once(&complaint));
                    model.store.upsert(complaint);
                }
                Err(e) => {
                    let error = AppError::from(e);
                    if error.kind == ErrorKind::NotFound && !model.store.contains(&id) {
                        model.selected = None;
                        model.screen = Screen::Complaints;
                    }
                    Self::report(model, caps, error);
                }
            },

            Event::ComplaintDeselected => {
                model.selected = None;
                model.screen = Screen::Complaints;
            }

            Event::FilterChanged(filter) => model.filter = filter,

            Event::SearchChanged { query } => model.filter.search = query,

            Event::StatusChangeRequested { id, status } => {
                Self::change_status(model, caps, id, status, false);
            }

            Event::AssignRequested { id } => {
                Self::change_status(model, caps, id, Status::InProgress, true);
            }

            Event::MutationResponse {
                mutation_id,
                result,
            } => Self::handle_mutation_response(model, caps, &mutation_id, *result),

            Event::UpvoteToggled { id } => Self::toggle_upvote(model, caps, id),

            Event::UpvoteResponse {
                id,
                direction,
                result,
            } => Self::handle_upvote_response(model, caps, id, direction, *result),

            Event::DraftChanged(draft) => model.draft = *draft,

            Event::FileComplaintRequested => Self::file_complaint(model, caps),

            Event::FileComplaintResponse(result) => {
                model.is_submitting = false;
                match api::decode_filing(*result) {
                    Ok(receipt) => {
                        info!(tracking_id = %receipt.tracking_id, "complaint filed");
                        let message = if receipt.tracking_id.is_empty() {
                            "Complaint filed.".to_string()
                        } else {
                            format!("Complaint filed. Tracking ID: {}", receipt.tracking_id)
                        };
                        if let Some(complaint) = receipt.complaint {
                            model.store.prepend(complaint);
                        }
                        model.draft = ComplaintDraft::default();
                        model.projection = Projection::MyActive;
                        model.screen = Screen::Complaints;
                        model.show_toast(message, ToastKind::Success);
                        Self::fetch_complaints(model, caps);
                    }
                    Err(e) => Self::report(model, caps, e.into()),
                }
            }

            Event::LoginSubmitted(_)
            | Event::OtpRequested(_)
            | Event::OtpSubmitted(_)
            | Event::AdminLoginSubmitted(_)
            | Event::RegisterSubmitted(_)
                if model.config.demo_mode =>
            {
                model.show_toast("Not available in demo mode.", ToastKind::Info);
            }

            Event::LoginSubmitted(request) => {
                if let Err(e) = request.validate() {
                    Self::auth_failed(model, &AppError::from(e), AuthStep::SignedOut);
                } else {
                    let email = request.email.trim().to_string();
                    Self::submit(model, caps, &Endpoint::Login, &request, move |result| {
                        Event::OtpDispatched {
                            email,
                            result: Box::new(result),
                        }
                    });
                }
            }

            Event::OtpRequested(request) => {
                if let Err(e) = request.validate() {
                    Self::auth_failed(model, &AppError::from(e), AuthStep::SignedOut);
                } else {
                    let email = request.email.trim().to_string();
                    Self::submit(model, caps, &Endpoint::SendOtp, &request, move |result| {
                        Event::OtpDispatched {
                            email,
                            result: Box::new(result),
                        }
                    });
                }
            }

            Event::OtpDispatched { email, result } => {
                match api::read_reply(*result) {
                    Ok(_) => {
                        info!("one-time code sent");
                        model.show_toast(
                            format!("A verification code was sent to {email}."),
                            ToastKind::Info,
                        );
                        model.otp_email = Some(email.clone());
                        model.auth_step = AuthStep::AwaitingOtp { email };
                    }
                    Err(e) => Self::auth_failed(model, &AppError::from(e), AuthStep::SignedOut),
                }
            }

            Event::OtpSubmitted(verification) => {
                let back = AuthStep::AwaitingOtp {
                    email: verification.email.trim().to_string(),
                };
                if let Err(e) = verification.validate() {
                    Self::auth_failed(model, &AppError::from(e), back);
                } else {
                    Self::submit(model, caps, &Endpoint::VerifyOtp, &verification, |result| {
                        Event::AuthResponse(Box::new(result))
                    });
                }
            }

            Event::AdminLoginSubmitted(request) => {
                if let Err(e) = request.validate() {
                    Self::auth_failed(model, &AppError::from(e), AuthStep::SignedOut);
                } else {
                    model.otp_email = None;
                    Self::submit(model, caps, &Endpoint::AdminLogin, &request, |result| {
                        Event::AuthResponse(Box::new(result))
                    });
                }
            }

            Event::AuthResponse(result) => {
                let session = api::decode_auth(*result)
                    .map_err(AppError::from)
                    .and_then(|payload| Session::from_auth(payload).map_err(AppError::from));
                match session {
                    Ok(session) => Self::establish_session(model, caps, session),
                    Err(error) => {
                        let back = model
                            .otp_email
                            .clone()
                            .map_or(AuthStep::SignedOut, |email| AuthStep::AwaitingOtp { email });
                        Self::auth_failed(model, &error, back);
                    }
                }
            }

            Event::RegisterSubmitted(registration) => {
                if let Err(e) = registration.validate() {
                    Self::report(model, caps, e.into());
                } else {
                    let request = model.api().request_json(&Endpoint::Register, &*registration);
                    match request {
                        Ok(request) => {
                            model.is_submitting = true;
                            request.send(&caps.http, |result| {
                                Event::RegisterResponse(Box::new(result))
                            });
                        }
                        Err(e) => Self::report(model, caps, e.into()),
                    }
                }
            }

            Event::RegisterResponse(result) => {
                model.is_submitting = false;
                match api::read_reply(*result) {
                    Ok(_) => {
                        info!("registration accepted");
                        model.screen = Screen::Login;
                        model.auth_step = AuthStep::SignedOut;
                        model.show_toast(
                            "Registration successful. Please sign in.",
                            ToastKind::Success,
                        );
                    }
                    Err(e) => {
                        let step = model.auth_step.clone();
                        Self::auth_failed(model, &AppError::from(e), step);
                    }
                }
            }

            Event::LogoutRequested => {
                Self::sign_out(model, caps);
                model.show_toast("You have been signed out.", ToastKind::Info);
            }

            Event::AnnouncementsRequested => {
                model.screen = Screen::Announcements;
                Self::fetch_announcements(model, caps);
            }

            Event::AnnouncementsFetched(result) => {
                model.is_loading = false;
                match api::decode_announcements(*result) {
                    Ok(items) => {
                        info!(count = items.len(), "announcements loaded");
                        model.announcements.refresh(items);
                    }
                    Err(e) => Self::report(model, caps, e.into()),
                }
            }

            Event::AnnouncementSearchChanged { query } => model.announcement_query = query,

            Event::AnnouncementLikeToggled { id } => {
                if model.announcements.toggle_like(&id).is_none() {
                    debug!(announcement_id = %id, "like on unknown announcement ignored");
                }
            }

            Event::AnnouncementSaveRequested { id, draft } => {
                Self::save_announcement(model, caps, id, &draft);
            }

            Event::AnnouncementSaved(result) => {
                model.is_submitting = false;
                match api::decode_announcement(*result) {
                    Ok(Some(announcement)) => {
                        model.announcements.upsert(announcement);
                        model.show_toast("Announcement published.", ToastKind::Success);
                    }
                    Ok(None) => {
                        model.show_toast("Announcement published.", ToastKind::Success);
                        Self::fetch_announcements(model, caps);
                    }
                    Err(e) => Self::report(model, caps, e.into()),
                }
            }

            Event::AnnouncementDeleteRequested { id } => Self::delete_announcement(model, caps, id),

            Event::AnnouncementDeleted { id, result } => {
                match api::read_reply(*result) {
                    Ok(_) => {
                        model.announcements.remove(&id);
                        model.show_toast("Announcement deleted.", ToastKind::Success);
                    }
                    Err(e) => Self::report(model, caps, e.into()),
                }
            }

            Event::DismissError => model.error = None,

            Event::DismissToast => model.toast = None,
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        let ctx = RowContext {
            ledger: &model.upvotes,
            policy: &model.config.transition_policy,
            viewer_is_admin: model.is_admin(),
            can_manage: model.can_manage(),
        };

        let state = match model.screen {
            Screen::Login => ViewState::Login {
                step: model.auth_step.clone(),
            },
            Screen::Register => ViewState::Register {
                is_submitting: model.is_submitting,
            },
            Screen::Complaints => {
                let viewer = model.viewer();
                let rows = ranking::project(
                    &model.store,
                    model.projection,
                    &model.filter,
                    &model.upvotes,
                    viewer.as_ref(),
                )
                .into_iter()
                .map(|c| ComplaintRow::build(c, ctx, model.mutations.has_pending_for(&c.id)))
                .collect();
                ViewState::Complaints {
                    title: model.projection.title().to_string(),
                    projection: model.projection,
                    filter: model.filter.clone(),
                    rows,
                    can_manage: ctx.can_manage,
                }
            }
            Screen::Detail => ViewState::Detail {
                complaint: model
                    .selected
                    .as_ref()
                    .and_then(|id| model.store.get(id))
                    .map(|c| {
                        Box::new(ComplaintDetail::build(
                            c,
                            ctx,
                            model.mutations.has_pending_for(&c.id),
                        ))
                    }),
            },
            Screen::FileComplaint => ViewState::FileComplaint {
                draft: model.draft.clone(),
                categories: category_options(),
                is_submitting: model.is_submitting,
            },
            Screen::Announcements => ViewState::Announcements {
                query: model.announcement_query.clone(),
                items: model
                    .announcements
                    .search(&model.announcement_query)
                    .into_iter()
                    .map(AnnouncementView::from)
                    .collect(),
                can_manage: ctx.can_manage,
                categories: ANNOUNCEMENT_CATEGORIES.iter().map(ToString::to_string).collect(),
            },
        };

        ViewModel {
            state,
            error: model.error.as_ref().map(UserFacingError::from),
            toast: model.toast.as_ref().map(ToastView::from),
            is_loading: model.is_loading,
            is_authenticated: model.session.is_some(),
            user: model.session.as_ref().map(SessionView::from),
            demo_mode: model.config.demo_mode,
        }
    }
}
