#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Shared core of the civic complaint portal.
//!
//! The shell sends [`Event`]s, executes the [`Effect`]s the core asks for
//! and renders the [`ViewModel`]. Everything else lives here.

pub mod announcement;
pub mod api;
pub mod app;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod event;
pub mod filing;
pub mod fixtures;
pub mod lifecycle;
pub mod model;
pub mod mutation;
pub mod ranking;
pub mod session;
pub mod store;
pub mod taxonomy;
pub mod upvote;
pub mod view;

use chrono::{DateTime, Utc};

pub use app::{App, Model};
pub use capabilities::{Capabilities, Effect};
pub use crux_core::{render::Render, App as CruxApp};
pub use error::{AppError, ErrorKind, ErrorSeverity};
pub use event::Event;
pub use view::ViewModel;

#[must_use]
pub fn current_time() -> DateTime<Utc> {
    Utc::now()
}
