//! Filtering, ordering and per-page projections of the complaint store.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::model::{Complaint, Priority, Status, UserId};
use crate::store::ComplaintStore;
use crate::taxonomy::Category;
use crate::upvote::UpvoteLedger;

/// User-adjustable filters on a list page. Empty fields match everything.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ComplaintFilter {
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub search: String,
}

impl ComplaintFilter {
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.search.trim().is_empty()
    }

    #[must_use]
    pub fn matches(&self, complaint: &Complaint) -> bool {
        if self.status.is_some_and(|s| s != complaint.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != complaint.priority) {
            return false;
        }
        if self
            .category
            .is_some_and(|c| c != complaint.category.category)
        {
            return false;
        }
        matches_search(complaint, &self.search)
    }
}

/// Case-insensitive substring match over the complaint's text fields.
#[must_use]
pub fn matches_search(complaint: &Complaint, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    complaint
        .search_haystack()
        .any(|field| field.to_lowercase().contains(&needle))
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    /// Priority high→low, then newest first.
    PriorityThenNewest,
    /// Displayed upvote count, highest first.
    MostUpvoted,
    Newest,
}

/// Stable sort of `complaints` by `order`.
pub fn sort(complaints: &mut [&Complaint], order: SortOrder, ledger: &UpvoteLedger) {
    match order {
        SortOrder::PriorityThenNewest => complaints.sort_by(|a, b| {
            b.priority
                .rank()
                .cmp(&a.priority.rank())
                .then_with(|| newest_first(a, b))
        }),
        SortOrder::MostUpvoted => complaints.sort_by(|a, b| {
            ledger
                .displayed_for(b)
                .cmp(&ledger.displayed_for(a))
        }),
        SortOrder::Newest => complaints.sort_by(|a, b| newest_first(a, b)),
    }
}

fn newest_first(a: &Complaint, b: &Complaint) -> Ordering {
    b.created_at().cmp(&a.created_at())
}

/// The list pages of the portal, each with a fixed status scope and order.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum Projection {
    AdminAll,
    AdminPending,
    AdminInProgress,
    AdminResolved,
    Public { status: Status },
    MyActive,
    MyResolved,
}

impl Default for Projection {
    fn default() -> Self {
        Self::Public {
            status: Status::Pending,
        }
    }
}

impl Projection {
    #[must_use]
    pub const fn statuses(self) -> &'static [Status] {
        match self {
            Self::AdminAll => &Status::ALL,
            Self::AdminPending
            | Self::Public {
                status: Status::Pending,
            } => &[Status::Pending],
            Self::AdminInProgress
            | Self::Public {
                status: Status::InProgress,
            } => &[Status::InProgress],
            Self::AdminResolved
            | Self::MyResolved
            | Self::Public {
                status: Status::Resolved,
            } => &[Status::Resolved],
            Self::MyActive => &[Status::Pending, Status::InProgress],
        }
    }

    #[must_use]
    pub const fn order(self) -> SortOrder {
        match self {
            Self::AdminAll => SortOrder::PriorityThenNewest,
            Self::AdminPending
            | Self::AdminInProgress
            | Self::AdminResolved
            | Self::Public { .. } => SortOrder::MostUpvoted,
            Self::MyActive | Self::MyResolved => SortOrder::Newest,
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(
            self,
            Self::AdminAll | Self::AdminPending | Self::AdminInProgress | Self::AdminResolved
        )
    }

    #[must_use]
    pub const fn is_personal(self) -> bool {
        matches!(self, Self::MyActive | Self::MyResolved)
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::AdminAll => "All Complaints",
            Self::AdminPending => "Pending Complaints",
            Self::AdminInProgress => "In-Progress Complaints",
            Self::AdminResolved => "Resolved Complaints",
            Self::Public { .. } => "City Complaints",
            Self::MyActive => "My Active Complaints",
            Self::MyResolved => "My Resolved Complaints",
        }
    }
}

/// Runs the filter/sort pipeline for one page.
///
/// Personal pages need a `viewer`. The backend already scopes
/// `my-complaints` and sends records without a reporter, so only a
/// reporter that names someone else hides a row.
#[must_use]
pub fn project<'a>(
    store: &'a ComplaintStore,
    projection: Projection,
    filter: &ComplaintFilter,
    ledger: &UpvoteLedger,
    viewer: Option<&UserId>,
) -> Vec<&'a Complaint> {
    let scope = projection.statuses();
    let mut rows: Vec<&Complaint> = store
        .iter()
        .filter(|c| scope.contains(&c.status))
        .filter(|c| !projection.is_personal() || viewer.is_some_and(|v| filed_by(c, v)))
        .filter(|c| filter.matches(c))
        .collect();
    sort(&mut rows, projection.order(), ledger);
    rows
}

fn filed_by(complaint: &Complaint, viewer: &UserId) -> bool {
    match complaint.reporter_id() {
        Some(reporter) => reporter == viewer,
        None => true,
    }
}
