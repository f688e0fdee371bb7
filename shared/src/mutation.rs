//! Optimistic mutations awaiting a backend answer.
//!
//! Each local change is applied immediately and recorded here together with
//! the closure that undoes it. The response handler either commits the entry
//! or runs the closure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::model::{ComplaintId, Status, Timestamps};
use crate::store::ComplaintStore;

pub type Rollback = Box<dyn FnOnce(&mut ComplaintStore) + Send + Sync>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct MutationId(pub String);

impl MutationId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    StatusChange { from: Status, to: Status },
    Assign,
}

pub struct PendingMutation {
    pub id: MutationId,
    pub complaint_id: ComplaintId,
    pub kind: MutationKind,
    pub created_at: DateTime<Utc>,
    rollback: Rollback,
}

impl fmt::Debug for PendingMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingMutation")
            .field("id", &self.id)
            .field("complaint_id", &self.complaint_id)
            .field("kind", &self.kind)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Rollback for a status change: puts `previous` and its timestamps back
/// while the record still shows `applied`. Other fields are left to
/// whatever the store holds by then.
#[must_use]
pub fn revert_status(
    id: ComplaintId,
    applied: Status,
    previous: Status,
    timestamps: Timestamps,
) -> Rollback {
    Box::new(move |store: &mut ComplaintStore| {
        store.revert_status(&id, applied, previous, timestamps);
    })
}

#[derive(Debug, Default)]
pub struct MutationLedger {
    pending: HashMap<MutationId, PendingMutation>,
}

impl MutationLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        complaint_id: ComplaintId,
        kind: MutationKind,
        rollback: Rollback,
    ) -> MutationId {
        let id = MutationId::generate();
        self.pending.insert(
            id.clone(),
            PendingMutation {
                id: id.clone(),
                complaint_id,
                kind,
                created_at: Utc::now(),
                rollback,
            },
        );
        id
    }

    #[must_use]
    pub fn get(&self, id: &MutationId) -> Option<&PendingMutation> {
        self.pending.get(id)
    }

    #[must_use]
    pub fn has_pending_for(&self, complaint_id: &ComplaintId) -> bool {
        self.pending
            .values()
            .any(|m| &m.complaint_id == complaint_id)
    }

    /// Drops the entry without undoing it.
    pub fn commit(&mut self, id: &MutationId) -> Option<(ComplaintId, MutationKind)> {
        self.pending
            .remove(id)
            .map(|m| (m.complaint_id, m.kind))
    }

    /// Undoes the change. Returns `None` if the entry was already settled.
    pub fn rollback(
        &mut self,
        id: &MutationId,
        store: &mut ComplaintStore,
    ) -> Option<(ComplaintId, MutationKind)> {
        let mutation = self.pending.remove(id)?;
        (mutation.rollback)(store);
        Some((mutation.complaint_id, mutation.kind))
    }

    /// Undoes every outstanding change, newest first.
    pub fn rollback_all(&mut self, store: &mut ComplaintStore) -> usize {
        let mut drained: Vec<PendingMutation> = self.pending.drain().map(|(_, m)| m).collect();
        drained.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let count = drained.len();
        for mutation in drained {
            (mutation.rollback)(store);
        }
        count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::lifecycle::TransitionPolicy;

    fn setup() -> (ComplaintStore, ComplaintId) {
        let mut store = ComplaintStore::new();
        store.replace_all(vec![fixtures::complaint("c1", "Water leak")]);
        (store, ComplaintId::new("c1"))
    }

    fn change_status(
        store: &mut ComplaintStore,
        ledger: &mut MutationLedger,
        id: &ComplaintId,
        to: Status,
    ) -> MutationId {
        let snapshot = store.get(id).cloned().unwrap();
        let from = snapshot.status;
        store
            .transition(id, to, Utc::now(), &TransitionPolicy::default())
            .unwrap();
        ledger.record(
            id.clone(),
            MutationKind::StatusChange { from, to },
            revert_status(id.clone(), to, from, snapshot.timestamps),
        )
    }

    #[test]
    fn test_rollback_restores_previous_state() {
        let (mut store, id) = setup();
        let mut ledger = MutationLedger::new();
        let before = store.get(&id).cloned().unwrap();

        let mutation = change_status(&mut store, &mut ledger, &id, Status::InProgress);
        assert!(ledger.has_pending_for(&id));
        assert_eq!(store.get(&id).map(|c| c.status), Some(Status::InProgress));

        let undone = ledger.rollback(&mutation, &mut store);
        assert_eq!(
            undone.map(|(_, kind)| kind),
            Some(MutationKind::StatusChange {
                from: Status::Pending,
                to: Status::InProgress
            })
        );
        assert_eq!(store.get(&id), Some(&before));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_rollback_after_refetch_keeps_fresh_fields() {
        let (mut store, id) = setup();
        let mut ledger = MutationLedger::new();
        let mutation = change_status(&mut store, &mut ledger, &id, Status::InProgress);

        let mut fetched = fixtures::complaint("c1", "Water leak");
        fetched.upvotes = 99;
        fetched.admin_notes = Some("fetched".into());
        store.replace_all(vec![fetched.clone()]);

        assert!(ledger.rollback(&mutation, &mut store).is_some());
        assert_eq!(store.get(&id), Some(&fetched));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_commit_keeps_change() {
        let (mut store, id) = setup();
        let mut ledger = MutationLedger::new();
        let mutation = change_status(&mut store, &mut ledger, &id, Status::Resolved);
        assert!(ledger.commit(&mutation).is_some());
        assert!(ledger.rollback(&mutation, &mut store).is_none());
        assert_eq!(store.get(&id).map(|c| c.status), Some(Status::Resolved));
    }

    #[test]
    fn test_rollback_all() {
        let (mut store, id) = setup();
        let mut ledger = MutationLedger::new();
        change_status(&mut store, &mut ledger, &id, Status::InProgress);
        assert_eq!(ledger.rollback_all(&mut store), 1);
        assert_eq!(store.get(&id).map(|c| c.status), Some(Status::Pending));
        assert!(!ledger.has_pending_for(&id));
    }

    #[test]
    fn test_debug_hides_closure() {
        let (mut store, id) = setup();
        let mut ledger = MutationLedger::new();
        let mutation = change_status(&mut store, &mut ledger, &id, Status::InProgress);
        let rendered = format!("{:?}", ledger.get(&mutation).unwrap());
        assert!(rendered.starts_with("PendingMutation"));
        assert!(rendered.contains("c1"));
    }
}
