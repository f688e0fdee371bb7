use chrono::{DateTime, Utc};

use crate::lifecycle::{apply_transition, TransitionError, TransitionOutcome, TransitionPolicy};
use crate::model::{Complaint, ComplaintId, Status, Timestamps};

/// The one in-memory copy of every complaint the app has loaded.
///
/// List pages and the detail pane both read from here by id, so a status
/// change made from either is visible in both without a refetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintStore {
    complaints: Vec<Complaint>,
}

impl ComplaintStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the collection with a fetched page. A repeated id keeps its
    /// first position and its last payload.
    pub fn replace_all(&mut self, complaints: impl IntoIterator<Item = Complaint>) {
        self.complaints.clear();
        for complaint in complaints {
            self.upsert(complaint);
        }
    }

    /// Inserts or replaces by id. New records go to the end.
    pub fn upsert(&mut self, complaint: Complaint) {
        match self.position(&complaint.id) {
            Some(idx) => self.complaints[idx] = complaint,
            None => self.complaints.push(complaint),
        }
    }

    /// Inserts a just-filed complaint ahead of everything else.
    pub fn prepend(&mut self, complaint: Complaint) {
        if let Some(idx) = self.position(&complaint.id) {
            self.complaints.remove(idx);
        }
        self.complaints.insert(0, complaint);
    }

    #[must_use]
    pub fn get(&self, id: &ComplaintId) -> Option<&Complaint> {
        self.complaints.iter().find(|c| &c.id == id)
    }

    pub fn get_mut(&mut self, id: &ComplaintId) -> Option<&mut Complaint> {
        self.complaints.iter_mut().find(|c| &c.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &ComplaintId) -> bool {
        self.position(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Complaint> {
        self.complaints.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.complaints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.complaints.is_empty()
    }

    pub fn clear(&mut self) {
        self.complaints.clear();
    }

    /// Applies a status change in place.
    pub fn transition(
        &mut self,
        id: &ComplaintId,
        target: Status,
        now: DateTime<Utc>,
        policy: &TransitionPolicy,
    ) -> Result<TransitionOutcome, TransitionError> {
        let complaint = self
            .get_mut(id)
            .ok_or_else(|| TransitionError::NotFound(id.clone()))?;
        apply_transition(complaint, target, now, policy)
    }

    /// Undoes a local status change by putting back `previous` and its
    /// timestamps. Only the record still showing `applied` is touched, so a
    /// refetch that landed in between keeps its data.
    pub fn revert_status(
        &mut self,
        id: &ComplaintId,
        applied: Status,
        previous: Status,
        timestamps: Timestamps,
    ) -> bool {
        match self.get_mut(id) {
            Some(complaint) if complaint.status == applied => {
                complaint.status = previous;
                complaint.timestamps = timestamps;
                true
            }
            _ => false,
        }
    }

    fn position(&self, id: &ComplaintId) -> Option<usize> {
        self.complaints.iter().position(|c| &c.id == id)
    }
}
