// Alert log - newest-first alert list with bounded retention
use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use crate::domain::alert::{Alert, AlertDraft, AlertId, AlertKind};

#[derive(Debug, Clone)]
pub struct AlertLog {
    entries: VecDeque<Alert>,
    retention_cap: usize,
    next_id: u64,
}

impl AlertLog {
    pub fn new(retention_cap: usize) -> Self {
        let retention_cap = retention_cap.max(1);
        Self {
            entries: VecDeque::with_capacity(retention_cap + 1),
            retention_cap,
            next_id: 1,
        }
    }

    /// Insert at the front, dropping the oldest entries past the retention cap.
    pub fn append(&mut self, draft: AlertDraft, time: DateTime<Utc>) -> AlertId {
        let id = AlertId(self.next_id);
        self.next_id += 1;

        self.entries.push_front(Alert {
            id,
            time,
            kind: draft.kind,
            message: draft.message,
            resolved: false,
        });
        self.entries.truncate(self.retention_cap);
        id
    }

    /// Mark an alert resolved. Unknown ids are ignored; returns whether it was found.
    pub fn resolve(&mut self, id: AlertId) -> bool {
        match self.entries.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.resolved = true;
                true
            }
            None => false,
        }
    }

    /// Drop every resolved alert; returns how many were removed.
    pub fn clear_resolved(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|a| !a.resolved);
        before - self.entries.len()
    }

    /// Alerts newest-first. Each call starts a fresh pass.
    pub fn list(&self) -> impl Iterator<Item = &Alert> + Clone + '_ {
        self.entries.iter()
    }

    #[cfg(test)]
    pub fn get(&self, id: AlertId) -> Option<&Alert> {
        self.entries.iter().find(|a| a.id == id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unresolved(&self) -> usize {
        self.entries.iter().filter(|a| !a.resolved).count()
    }

    /// Populate the log with the entries the dashboard shows on launch:
    /// a pending low-battery warning and two handled mission notices.
    pub fn seed_defaults(&mut self, now: DateTime<Utc>) {
        let startup = [
            (15, AlertKind::Success, "Drone took off, mission started", true),
            (10, AlertKind::Info, "North sector patrol complete", true),
            (5, AlertKind::Warning, "Battery below 20%, return to base to recharge", false),
        ];

        for (minutes_ago, kind, message, resolved) in startup {
            let id = self.append(AlertDraft::new(kind, message), now - Duration::minutes(minutes_ago));
            if resolved {
                self.resolve(id);
            }
        }
    }
}
