//! Backend REST boundary: request construction and response decoding.
//!
//! Every backend response is an envelope `{success, data?, message?}`.
//! Collections arrive either wrapped (`data.complaints`) or as a bare array.

use crux_http::Http;
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::announcement::{Announcement, AnnouncementDraft};
use crate::capabilities::http::{into_parts, HttpError, HttpResult};
use crate::config::PortalConfig;
use crate::error::{AppError, ErrorKind, ValidationError};
use crate::event::Event;
use crate::filing::{FilingReceipt, NewComplaint};
use crate::model::{AnnouncementId, Complaint, ComplaintId, Status};
use crate::ranking::SortOrder;
use crate::session::{AuthPayload, Session};
use crate::taxonomy::Category;
use crate::upvote::VoteDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ComplaintQuery {
    pub category: Option<Category>,
    pub status: Option<Status>,
    pub search: Option<String>,
    pub sort: Option<SortOrder>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    PublicComplaints(ComplaintQuery),
    MyComplaints { status: Option<Status> },
    Complaint(ComplaintId),
    FileComplaint,
    Upvote { id: ComplaintId, direction: VoteDirection },
    AdminComplaints(ComplaintQuery),
    AdminStatus(ComplaintId),
    AdminAssign(ComplaintId),
    Login,
    SendOtp,
    VerifyOtp,
    AdminLogin,
    Register,
    Announcements,
    CreateAnnouncement,
    UpdateAnnouncement(AnnouncementId),
    DeleteAnnouncement(AnnouncementId),
}

impl Endpoint {
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        match self {
            Self::PublicComplaints(_)
            | Self::MyComplaints { .. }
            | Self::Complaint(_)
            | Self::AdminComplaints(_)
            | Self::Announcements => HttpMethod::Get,
            Self::FileComplaint
            | Self::Login
            | Self::SendOtp
            | Self::VerifyOtp
            | Self::AdminLogin
            | Self::Register
            | Self::CreateAnnouncement => HttpMethod::Post,
            Self::Upvote { direction, .. } => match direction {
                VoteDirection::Up => HttpMethod::Post,
                VoteDirection::Down => HttpMethod::Delete,
            },
            Self::AdminStatus(_) | Self::AdminAssign(_) | Self::UpdateAnnouncement(_) => {
                HttpMethod::Put
            }
            Self::DeleteAnnouncement(_) => HttpMethod::Delete,
        }
    }

    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        match self {
            Self::PublicComplaints(_) => vec!["complaints", "public"],
            Self::MyComplaints { .. } => vec!["complaints", "my-complaints"],
            Self::Complaint(id) => vec!["complaints", id.as_str()],
            Self::FileComplaint => vec!["complaints"],
            Self::Upvote { id, .. } => vec!["complaints", id.as_str(), "upvote"],
            Self::AdminComplaints(_) => vec!["admin", "complaints"],
            Self::AdminStatus(id) => vec!["admin", "complaints", id.as_str(), "status"],
            Self::AdminAssign(id) => vec!["admin", "complaints", id.as_str(), "assign"],
            Self::Login => vec!["auth", "login"],
            Self::SendOtp => vec!["auth", "send-otp"],
            Self::VerifyOtp => vec!["auth", "verify-otp"],
            Self::AdminLogin => vec!["auth", "admin-login"],
            Self::Register => vec!["auth", "register"],
            Self::Announcements => vec!["announcements"],
            Self::CreateAnnouncement => vec!["admin", "announcements"],
            Self::UpdateAnnouncement(id) | Self::DeleteAnnouncement(id) => {
                vec!["admin", "announcements", id.as_str()]
            }
        }
    }

    #[must_use]
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        match self {
            Self::PublicComplaints(q) | Self::AdminComplaints(q) => {
                if let Some(category) = q.category {
                    pairs.push(("category", category.label().to_string()));
                }
                if let Some(status) = q.status {
                    pairs.push(("status", status.as_str().to_string()));
                }
                if let Some(search) = q.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                    pairs.push(("search", search.to_string()));
                }
                if let (Self::AdminComplaints(_), Some(sort)) = (self, q.sort) {
                    pairs.push(("sortBy", sort_param(sort).to_string()));
                }
            }
            Self::MyComplaints {
                status: Some(status),
            } => pairs.push(("status", status.as_str().to_string())),
            _ => {}
        }
        pairs
    }

    /// Whether the request carries the bearer token.
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        !matches!(
            self,
            Self::Login | Self::SendOtp | Self::VerifyOtp | Self::AdminLogin | Self::Register
        )
    }
}

const fn sort_param(order: SortOrder) -> &'static str {
    match order {
        SortOrder::PriorityThenNewest => "priority",
        SortOrder::MostUpvoted => "upvotes",
        SortOrder::Newest => "newest",
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] HttpError),

    #[error("cannot encode request body: {0}")]
    Encode(String),

    #[error("HTTP {status}")]
    Status { status: u16, body: Vec<u8> },

    #[error("request rejected: {message}")]
    Rejected { message: String },

    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Config(e) => {
                AppError::new(ErrorKind::InvalidState, "The app is misconfigured.")
                    .with_internal(e.to_string())
            }
            ApiError::Transport(e) => e.into(),
            ApiError::Encode(reason) => {
                AppError::new(ErrorKind::Serialization, "Unable to send the request.")
                    .with_internal(reason)
            }
            ApiError::Status { status, body } => AppError::from_http_status(status, Some(&body)),
            ApiError::Rejected { message } => AppError::new(ErrorKind::Validation, message),
            ApiError::Decode(reason) => AppError::new(
                ErrorKind::Serialization,
                "The server sent an unexpected response.",
            )
            .with_internal(reason),
        }
    }
}

/// Builds requests against the configured backend.
pub struct Api<'a> {
    config: &'a PortalConfig,
    session: Option<&'a Session>,
}

impl<'a> Api<'a> {
    #[must_use]
    pub fn new(config: &'a PortalConfig, session: Option<&'a Session>) -> Self {
        Self { config, session }
    }

    pub fn url(&self, endpoint: &Endpoint) -> Result<Url, ApiError> {
        let mut url = self.config.base_url()?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| ApiError::Decode("base URL cannot have a path".to_string()))?;
            segments.pop_if_empty().extend(endpoint.segments());
        }
        let query = endpoint.query();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    pub fn request(&self, endpoint: &Endpoint) -> Result<ApiRequest, ApiError> {
        let bearer = self
            .session
            .filter(|_| endpoint.requires_auth())
            .map(|session| SecretString::new(session.bearer()));
        Ok(ApiRequest {
            method: endpoint.method(),
            url: self.url(endpoint)?,
            bearer,
            body: None,
        })
    }

    pub fn request_json<T: Serialize>(
        &self,
        endpoint: &Endpoint,
        body: &T,
    ) -> Result<ApiRequest, ApiError> {
        let mut request = self.request(endpoint)?;
        let body = serde_json::to_vec(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        request.body = Some(body);
        Ok(request)
    }

    pub fn status_update(&self, id: &ComplaintId, status: Status) -> Result<ApiRequest, ApiError> {
        self.request_json(
            &Endpoint::AdminStatus(id.clone()),
            &serde_json::json!({ "status": status }),
        )
    }

    pub fn file_complaint(&self, body: &NewComplaint) -> Result<ApiRequest, ApiError> {
        self.request_json(&Endpoint::FileComplaint, body)
    }

    pub fn save_announcement(
        &self,
        id: Option<&AnnouncementId>,
        draft: &AnnouncementDraft,
    ) -> Result<ApiRequest, ApiError> {
        let endpoint = match id {
            Some(id) => Endpoint::UpdateAnnouncement(id.clone()),
            None => Endpoint::CreateAnnouncement,
        };
        self.request_json(&endpoint, draft)
    }
}

/// A backend call ready for the shell. The bearer token stays secret
/// until the request is handed to `crux_http`.
#[derive(Debug)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub bearer: Option<SecretString>,
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    pub fn send<F>(self, http: &Http<Event>, make_event: F)
    where
        F: FnOnce(HttpResult) -> Event + Send + Sync + 'static,
    {
        let url = self.url.as_str();
        let mut builder = match self.method {
            HttpMethod::Get => http.get(url),
            HttpMethod::Post => http.post(url),
            HttpMethod::Put => http.put(url),
            HttpMethod::Delete => http.delete(url),
        }
        .header("Accept", "application/json");
        if let Some(bearer) = &self.bearer {
            builder = builder.header("Authorization", bearer.expose_secret().as_str());
        }
        if let Some(body) = self.body {
            builder = builder.header("Content-Type", "application/json").body(body);
        }
        builder.send(make_event);
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

fn default_success() -> bool {
    true
}

/// A decoded successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub data: Option<serde_json::Value>,
    pub message: Option<String>,
}

impl Reply {
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let value = self
            .data
            .clone()
            .ok_or_else(|| ApiError::Decode("response has no data".to_string()))?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `data` as `T`, or `data.<key>` as `T`.
    pub fn data_or_field<T: DeserializeOwned>(&self, key: &str) -> Result<T, ApiError> {
        let value = self
            .data
            .as_ref()
            .ok_or_else(|| ApiError::Decode("response has no data".to_string()))?;
        if let Some(inner) = value.get(key) {
            if let Ok(decoded) = serde_json::from_value(inner.clone()) {
                return Ok(decoded);
            }
        }
        serde_json::from_value(value.clone()).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Filing replies carry either `{trackingId, complaint}` or the new
    /// complaint itself.
    #[must_use]
    pub fn filing_receipt(&self) -> FilingReceipt {
        let mut receipt: FilingReceipt = self.data().unwrap_or(FilingReceipt {
            tracking_id: String::new(),
            complaint: None,
        });
        if receipt.complaint.is_none() {
            receipt.complaint = self.data::<Complaint>().ok();
        }
        if receipt.tracking_id.is_empty() {
            if let Some(c) = &receipt.complaint {
                receipt.tracking_id.clone_from(&c.tracking_id);
            }
        }
        receipt
    }
}

/// Turns a shell HTTP result into the envelope payload or an error.
pub fn read_reply(result: HttpResult) -> Result<Reply, ApiError> {
    let (status, body) = into_parts(result)?;
    parse_reply(status, &body)
}

pub fn parse_reply(status: u16, body: &[u8]) -> Result<Reply, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::Status {
            status,
            body: body.to_vec(),
        });
    }
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Reply {
            data: None,
            message: None,
        });
    }
    let envelope: Envelope =
        serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    if !envelope.success {
        return Err(ApiError::Rejected {
            message: envelope
                .message
                .unwrap_or_else(|| "The request was rejected.".to_string()),
        });
    }
    Ok(Reply {
        data: envelope.data,
        message: envelope.message,
    })
}

pub fn decode_complaints(result: HttpResult) -> Result<Vec<Complaint>, ApiError> {
    read_reply(result)?.data_or_field("complaints")
}

pub fn decode_complaint(result: HttpResult) -> Result<Complaint, ApiError> {
    read_reply(result)?.data_or_field("complaint")
}

/// For mutations: the updated record if the backend sent one.
pub fn decode_mutation(result: HttpResult) -> Result<Option<Complaint>, ApiError> {
    let reply = read_reply(result)?;
    Ok(reply.data_or_field("complaint").ok())
}

pub fn decode_filing(result: HttpResult) -> Result<FilingReceipt, ApiError> {
    Ok(read_reply(result)?.filing_receipt())
}

pub fn decode_auth(result: HttpResult) -> Result<AuthPayload, ApiError> {
    read_reply(result)?.data()
}

pub fn decode_announcements(result: HttpResult) -> Result<Vec<Announcement>, ApiError> {
    read_reply(result)?.data_or_field("announcements")
}

pub fn decode_announcement(result: HttpResult) -> Result<Option<Announcement>, ApiError> {
    Ok(read_reply(result)?.data_or_field("announcement").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserId;
    use crate::session::{Role, UserProfile};
    use serde_json::json;

    fn config() -> PortalConfig {
        PortalConfig::default()
    }

    fn ok(body: &serde_json::Value) -> Result<Reply, ApiError> {
        parse_reply(200, body.to_string().as_bytes())
    }

    #[test]
    fn test_public_complaints_url() {
        let config = config();
        let api = Api::new(&config, None);
        let endpoint = Endpoint::PublicComplaints(ComplaintQuery {
            category: Some(Category::WaterSupply),
            status: Some(Status::InProgress),
            search: Some("  leak ".into()),
            sort: Some(SortOrder::MostUpvoted),
        });
        let url = api.url(&endpoint).unwrap();
        assert_eq!(url.path(), "/api/complaints/public");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("category".into(), "Water Supply & Sanitation".into()),
                ("status".into(), "in-progress".into()),
                ("search".into(), "leak".into()),
            ]
        );
    }

    #[test]
    fn test_admin_complaints_sort_param() {
        let config = config();
        let api = Api::new(&config, None);
        let url = api
            .url(&Endpoint::AdminComplaints(ComplaintQuery {
                sort: Some(SortOrder::PriorityThenNewest),
                ..ComplaintQuery::default()
            }))
            .unwrap();
        assert_eq!(url.query(), Some("sortBy=priority"));
    }

    #[test]
    fn test_paths_and_methods() {
        let id = ComplaintId::new("abc 1");
        let cases = [
            (Endpoint::MyComplaints { status: None }, "/api/complaints/my-complaints", HttpMethod::Get),
            (Endpoint::Complaint(id.clone()), "/api/complaints/abc%201", HttpMethod::Get),
            (
                Endpoint::Upvote { id: id.clone(), direction: VoteDirection::Up },
                "/api/complaints/abc%201/upvote",
                HttpMethod::Post,
            ),
            (
                Endpoint::Upvote { id: id.clone(), direction: VoteDirection::Down },
                "/api/complaints/abc%201/upvote",
                HttpMethod::Delete,
            ),
            (Endpoint::AdminStatus(id.clone()), "/api/admin/complaints/abc%201/status", HttpMethod::Put),
            (Endpoint::AdminAssign(id), "/api/admin/complaints/abc%201/assign", HttpMethod::Put),
            (Endpoint::VerifyOtp, "/api/auth/verify-otp", HttpMethod::Post),
            (
                Endpoint::DeleteAnnouncement("n1".into()),
                "/api/admin/announcements/n1",
                HttpMethod::Delete,
            ),
        ];
        let config = config();
        let api = Api::new(&config, None);
        for (endpoint, path, method) in cases {
            assert_eq!(api.url(&endpoint).unwrap().path(), path);
            assert_eq!(endpoint.method(), method);
        }
    }

    #[test]
    fn test_bearer_attached_only_when_signed_in_and_required() {
        let config = config();
        let session = Session::new(
            "jwt-1",
            UserProfile {
                id: UserId::new("u1"),
                username: "admin".into(),
                email: "admin@example.com".into(),
                role: Role::Admin,
                mobile: None,
                address: None,
            },
        )
        .unwrap();
        let api = Api::new(&config, Some(&session));
        let request = api.status_update(&"c1".into(), Status::Resolved).unwrap();
        assert_eq!(request.method, HttpMethod::Put);
        assert_eq!(
            request.bearer.as_ref().map(|b| b.expose_secret().as_str()),
            Some("Bearer jwt-1")
        );
        assert_eq!(request.body.as_deref(), Some(br#"{"status":"resolved"}"#.as_slice()));
        assert!(!format!("{request:?}").contains("jwt-1"));

        let login = api.request(&Endpoint::AdminLogin).unwrap();
        assert!(login.bearer.is_none());
        assert!(login.body.is_none());

        let anonymous = Api::new(&config, None)
            .request(&Endpoint::Announcements)
            .unwrap();
        assert!(anonymous.bearer.is_none());
    }

    #[test]
    fn test_decode_wrapped_and_bare_collections() {
        let complaint = serde_json::to_value(crate::fixtures::complaint("c1", "Pothole")).unwrap();
        let wrapped = ok(&json!({"success": true, "data": {"complaints": [complaint.clone()], "total": 1}}));
        let complaints: Vec<Complaint> = wrapped.unwrap().data_or_field("complaints").unwrap();
        assert_eq!(complaints.len(), 1);
        let bare = ok(&json!({"success": true, "data": [complaint]}));
        let complaints: Vec<Complaint> = bare.unwrap().data_or_field("complaints").unwrap();
        assert_eq!(complaints.len(), 1);
    }

    #[test]
    fn test_success_false_is_an_error() {
        let err = ok(&json!({"success": false, "message": "Already upvoted"})).unwrap_err();
        assert_eq!(
            err,
            ApiError::Rejected {
                message: "Already upvoted".into()
            }
        );
        let app: AppError = err.into();
        assert_eq!(app.user_facing_message(), "Already upvoted");
    }

    #[test]
    fn test_http_status_error_keeps_backend_message() {
        let body = json!({"success": false, "message": "Token expired"}).to_string();
        let app: AppError = parse_reply(401, body.as_bytes()).unwrap_err().into();
        assert_eq!(app.kind, ErrorKind::Authentication);
        assert_eq!(app.message, "Token expired");
    }

    #[test]
    fn test_empty_body_is_ack() {
        let reply = parse_reply(204, b"").unwrap();
        assert_eq!(reply.data, None);
        let ack = ok(&json!({"success": true, "message": "Status updated"})).unwrap();
        assert!(ack.data_or_field::<Complaint>("complaint").is_err());
        assert_eq!(ack.message.as_deref(), Some("Status updated"));
    }

    #[test]
    fn test_filing_receipt() {
        let complaint = serde_json::to_value(crate::fixtures::complaint("c9", "Leak")).unwrap();
        let receipt = ok(&json!({"success": true, "data": complaint}))
            .unwrap()
            .filing_receipt();
        assert_eq!(receipt.tracking_id, "CMP-C9");
        assert!(receipt.complaint.is_some());

        let receipt = ok(&json!({"success": true, "data": {"trackingId": "CMP-1"}}))
            .unwrap()
            .filing_receipt();
        assert_eq!(receipt.tracking_id, "CMP-1");
    }

    #[test]
    fn test_decode_auth() {
        let reply = ok(&json!({
            "success": true,
            "data": {"token": "t", "user": {"_id": "u", "username": "a", "email": "a@b.co", "role": "user"}}
        }));
        let payload: AuthPayload = reply.unwrap().data().unwrap();
        assert_eq!(payload.user.role, Role::Citizen);
    }

    #[test]
    fn test_transport_error_maps_to_network() {
        let err = decode_complaints(Err(HttpError::Io("offline".into()))).unwrap_err();
        assert_eq!(AppError::from(err).kind, ErrorKind::Network);
        let err = read_reply(Err(HttpError::Timeout)).unwrap_err();
        assert_eq!(AppError::from(err).kind, ErrorKind::Timeout);
    }
}
