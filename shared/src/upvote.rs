//! Upvote toggling with per-complaint request collapsing.
//!
//! The ledger tracks three views of each vote: what the user wants now
//! (`voted`), what the backend last acknowledged (`confirmed`) and what the
//! fetched `upvotes` counter already includes (`baseline`). At most one
//! request per complaint is in flight; toggles made meanwhile only move the
//! intended state, and completion sends a single follow-up if it still
//! differs from the acknowledged one.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::model::{Complaint, ComplaintId};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoteDirection {
    /// `POST /complaints/:id/upvote`
    Up,
    /// `DELETE /complaints/:id/upvote`
    Down,
}

impl VoteDirection {
    #[must_use]
    pub const fn from_voted(voted: bool) -> Self {
        if voted {
            Self::Up
        } else {
            Self::Down
        }
    }

    #[must_use]
    pub const fn is_up(self) -> bool {
        matches!(self, Self::Up)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Send(VoteDirection),
    /// A request for this complaint is already in flight.
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Confirmed,
    RolledBack,
    FollowUp(VoteDirection),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpvoteLedger {
    voted: HashSet<ComplaintId>,
    confirmed: HashSet<ComplaintId>,
    baseline: HashSet<ComplaintId>,
    in_flight: HashMap<ComplaintId, VoteDirection>,
}

impl UpvoteLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has_voted(&self, id: &ComplaintId) -> bool {
        self.voted.contains(id)
    }

    #[must_use]
    pub fn is_in_flight(&self, id: &ComplaintId) -> bool {
        self.in_flight.contains_key(id)
    }

    /// Flips the intended vote for `id`.
    pub fn toggle(&mut self, id: &ComplaintId) -> ToggleOutcome {
        let now_voted = if self.voted.remove(id) {
            false
        } else {
            self.voted.insert(id.clone());
            true
        };

        if self.in_flight.contains_key(id) {
            return ToggleOutcome::Deferred;
        }

        let direction = VoteDirection::from_voted(now_voted);
        self.in_flight.insert(id.clone(), direction);
        ToggleOutcome::Send(direction)
    }

    /// Records the result of the in-flight request for `id`.
    ///
    /// Success acknowledges the sent direction and may schedule one
    /// follow-up; failure puts the intended vote back to the acknowledged one.
    pub fn complete(&mut self, id: &ComplaintId, ok: bool) -> Completion {
        let Some(sent) = self.in_flight.remove(id) else {
            return Completion::Confirmed;
        };

        if !ok {
            set_membership(&mut self.voted, id, self.confirmed.contains(id));
            return Completion::RolledBack;
        }

        set_membership(&mut self.confirmed, id, sent.is_up());
        let wanted = self.voted.contains(id);
        if wanted == sent.is_up() {
            Completion::Confirmed
        } else {
            let follow_up = VoteDirection::from_voted(wanted);
            self.in_flight.insert(id.clone(), follow_up);
            Completion::FollowUp(follow_up)
        }
    }

    /// Reseeds from freshly fetched records. The fetched counters include
    /// the server's view of the actor's vote, so that becomes the baseline.
    /// Complaints with a request in flight keep their intended state.
    pub fn reconcile<'a>(&mut self, fetched: impl IntoIterator<Item = &'a Complaint>) {
        for complaint in fetched {
            let id = &complaint.id;
            set_membership(&mut self.baseline, id, complaint.has_upvoted);
            set_membership(&mut self.confirmed, id, complaint.has_upvoted);
            if !self.in_flight.contains_key(id) {
                set_membership(&mut self.voted, id, complaint.has_upvoted);
            }
        }
    }

    /// Count to show for a complaint whose fetched counter is `base`.
    #[must_use]
    pub fn displayed_count(&self, id: &ComplaintId, base: u32) -> u32 {
        match (self.voted.contains(id), self.baseline.contains(id)) {
            (true, false) => base.saturating_add(1),
            (false, true) => base.saturating_sub(1),
            _ => base,
        }
    }

    #[must_use]
    pub fn displayed_for(&self, complaint: &Complaint) -> u32 {
        self.displayed_count(&complaint.id, complaint.upvotes)
    }

    pub fn clear(&mut self) {
        self.voted.clear();
        self.confirmed.clear();
        self.baseline.clear();
        self.in_flight.clear();
    }
}

fn set_membership(set: &mut HashSet<ComplaintId>, id: &ComplaintId, member: bool) {
    if member {
        set.insert(id.clone());
    } else {
        set.remove(id);
    }
}
