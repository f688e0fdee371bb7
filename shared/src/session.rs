//! Signed-in user and bearer token, plus the auth forms that produce them.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{require, AppError, ErrorKind, ValidationError};
use crate::model::UserId;

/// Where the shell keeps the signed-in session.
pub const SESSION_STORAGE_KEY: &str = "session:current";
pub const SESSION_FORMAT_VERSION: u32 = 1;
pub const OTP_LENGTH: usize = 6;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    #[serde(rename = "user", alias = "citizen")]
    Citizen,
    #[serde(rename = "admin")]
    Admin,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("auth response has an empty token")]
    EmptyToken,

    #[error("stored session is corrupt: {0}")]
    Corrupt(String),

    #[error("stored session has unsupported version {0}")]
    UnsupportedVersion(u32),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        let kind = match err {
            SessionError::EmptyToken => ErrorKind::Authentication,
            SessionError::Corrupt(_) | SessionError::UnsupportedVersion(_) => {
                ErrorKind::Serialization
            }
        };
        AppError::new(kind, "Unable to restore your session").with_internal(err.to_string())
    }
}

/// `data` of a successful `verify-otp` or `admin-login` response.
#[derive(Deserialize, Debug, Clone)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserProfile,
}

/// Persisted form. The token only exists in plain text inside this value
/// and the bytes handed to the shell.
#[derive(Serialize, Deserialize)]
struct StoredSession {
    version: u32,
    token: String,
    user: UserProfile,
}

#[derive(Debug)]
pub struct Session {
    token: SecretString,
    pub user: UserProfile,
}

impl Session {
    pub fn new(token: impl Into<String>, user: UserProfile) -> Result<Self, SessionError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }
        Ok(Self {
            token: SecretString::new(token),
            user,
        })
    }

    pub fn from_auth(payload: AuthPayload) -> Result<Self, SessionError> {
        Self::new(payload.token, payload.user)
    }

    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SessionError> {
        let stored = StoredSession {
            version: SESSION_FORMAT_VERSION,
            token: self.token.expose_secret().clone(),
            user: self.user.clone(),
        };
        serde_json::to_vec(&stored).map_err(|e| SessionError::Corrupt(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SessionError> {
        let stored: StoredSession =
            serde_json::from_slice(bytes).map_err(|e| SessionError::Corrupt(e.to_string()))?;
        if stored.version != SESSION_FORMAT_VERSION {
            return Err(SessionError::UnsupportedVersion(stored.version));
        }
        Self::new(stored.token, stored.user)
    }
}

/// Where the sign-in flow currently is.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum AuthStep {
    #[default]
    SignedOut,
    /// Credentials accepted, waiting for the emailed code.
    AwaitingOtp { email: String },
    Submitting,
    SignedIn,
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    require("email", email)?;
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && domain.contains('.') && !domain.starts_with('.') =>
        {
            Ok(())
        }
        _ => Err(ValidationError::InvalidEmail),
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_email(&self.email)?;
        require("password", &self.password)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OtpRequest {
    pub email: String,
}

impl OtpRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_email(&self.email)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OtpVerification {
    pub email: String,
    pub otp: String,
}

impl OtpVerification {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_email(&self.email)?;
        let otp = self.otp.trim();
        if otp.len() != OTP_LENGTH || !otp.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidOtp);
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub mobile: String,
    pub address: String,
}

impl Registration {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("username", &self.username)?;
        check_email(&self.email)?;
        require("password", &self.password)?;
        require("mobile", &self.mobile)?;
        require("address", &self.address)
    }
}
