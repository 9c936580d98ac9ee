//! Deployment Store
//!
//! Append-only table of deployment records plus an optional JSONL journal
//! of status transitions. Superseded deployments are never deleted; the
//! table doubles as the audit trail. Only the orchestrator call path that
//! owns a record mutates it, so a record has exactly one writer.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::orchestrator::state::DeploymentStatus;

/// Network endpoint of a running deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One attempt to run a configuration version as a live container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub version_id: Uuid,
    pub status: DeploymentStatus,
    /// Opaque image reference owned by the engine adapter
    pub image_ref: Option<String>,
    /// Opaque container reference owned by the engine adapter
    pub container_ref: Option<String>,
    pub endpoint: Option<Endpoint>,
    pub error: Option<String>,
    pub requested_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
}

impl Deployment {
    /// Create a fresh record in Pending
    pub fn new(agent_id: Uuid, version_id: Uuid, requested_by: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id,
            version_id,
            status: DeploymentStatus::Pending,
            image_ref: None,
            container_ref: None,
            endpoint: None,
            error: None,
            requested_by,
            created_at: Utc::now(),
            started_at: None,
            stopped_at: None,
        }
    }

    /// Container name derived from the deployment id
    pub fn container_name(&self) -> String {
        format!("agent-{}", &self.id.to_string()[..8])
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("deployment {0} not found")]
    NotFound(Uuid),

    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition {
        from: DeploymentStatus,
        to: DeploymentStatus,
    },
}

/// One journal line per recorded transition
#[derive(Debug, Serialize, Deserialize)]
struct JournalEntry {
    at: DateTime<Utc>,
    deployment_id: Uuid,
    agent_id: Uuid,
    from: Option<DeploymentStatus>,
    to: DeploymentStatus,
}

/// In-process deployment table
pub struct DeploymentStore {
    records: DashMap<Uuid, Deployment>,
    journal: Option<Mutex<File>>,
}

impl DeploymentStore {
    /// Create a store without a journal
    pub fn in_memory() -> Self {
        Self {
            records: DashMap::new(),
            journal: None,
        }
    }

    /// Create a store appending every transition to a JSONL file
    pub fn with_journal<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            records: DashMap::new(),
            journal: Some(Mutex::new(file)),
        })
    }

    /// Insert a new record
    pub fn insert(&self, deployment: Deployment) {
        self.journal_transition(&deployment, None);
        self.records.insert(deployment.id, deployment);
    }

    /// Fetch a record by id
    pub fn get(&self, id: Uuid) -> Option<Deployment> {
        self.records.get(&id).map(|r| r.clone())
    }

    /// Move a record to a new status, applying any extra field updates in
    /// the same critical section. Rejects transitions not in the table.
    pub fn transition<F>(
        &self,
        id: Uuid,
        to: DeploymentStatus,
        apply: F,
    ) -> Result<Deployment, StoreError>
    where
        F: FnOnce(&mut Deployment),
    {
        let mut record = self.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let from = record.status;
        if !from.can_transition(to) {
            return Err(StoreError::InvalidTransition { from, to });
        }

        record.status = to;
        apply(&mut record);
        let updated = record.clone();
        drop(record);

        info!(
            deployment_id = %id,
            from = %from,
            to = %to,
            "Deployment state transition"
        );
        self.journal_transition(&updated, Some(from));
        Ok(updated)
    }

    /// Update non-status fields of a record
    pub fn update<F>(&self, id: Uuid, apply: F) -> Result<Deployment, StoreError>
    where
        F: FnOnce(&mut Deployment),
    {
        let mut record = self.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        apply(&mut record);
        Ok(record.clone())
    }

    /// Filtered read, newest first
    pub fn list(
        &self,
        agent_id: Option<Uuid>,
        status: Option<DeploymentStatus>,
        limit: usize,
    ) -> Vec<Deployment> {
        let mut deployments: Vec<Deployment> = self
            .records
            .iter()
            .filter(|r| agent_id.map_or(true, |a| r.agent_id == a))
            .filter(|r| status.map_or(true, |s| r.status == s))
            .map(|r| r.clone())
            .collect();

        deployments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        deployments.truncate(limit);
        deployments
    }

    /// All RUNNING deployments for one agent
    pub fn running_for(&self, agent_id: Uuid) -> Vec<Deployment> {
        self.list(Some(agent_id), Some(DeploymentStatus::Running), usize::MAX)
    }

    /// The newest RUNNING deployment for an agent, if any
    pub fn active(&self, agent_id: Uuid) -> Option<Deployment> {
        self.running_for(agent_id).into_iter().next()
    }

    fn journal_transition(&self, deployment: &Deployment, from: Option<DeploymentStatus>) {
        let Some(journal) = &self.journal else {
            return;
        };

        let entry = JournalEntry {
            at: Utc::now(),
            deployment_id: deployment.id,
            agent_id: deployment.agent_id,
            from,
            to: deployment.status,
        };
        if let Ok(line) = serde_json::to_string(&entry) {
            let mut file = journal.lock();
            if let Err(e) = writeln!(file, "{}", line) {
                tracing::warn!(error = %e, "Failed to append deployment journal entry");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(store: &DeploymentStore, agent_id: Uuid) -> Deployment {
        let deployment = Deployment::new(agent_id, Uuid::new_v4(), None);
        store.insert(deployment.clone());
        deployment
    }

    #[test]
    fn test_insert_and_get() {
        let store = DeploymentStore::in_memory();
        let deployment = seeded(&store, Uuid::new_v4());

        let fetched = store.get(deployment.id).unwrap();
        assert_eq!(fetched.id, deployment.id);
        assert_eq!(fetched.status, DeploymentStatus::Pending);
    }

    #[test]
    fn test_transition_rejects_invalid() {
        let store = DeploymentStore::in_memory();
        let deployment = seeded(&store, Uuid::new_v4());

        let err = store
            .transition(deployment.id, DeploymentStatus::Running, |_| {})
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidTransition {
                from: DeploymentStatus::Pending,
                to: DeploymentStatus::Running,
            }
        ));
        // record untouched
        assert_eq!(
            store.get(deployment.id).unwrap().status,
            DeploymentStatus::Pending
        );
    }

    #[test]
    fn test_terminal_record_never_transitions() {
        let store = DeploymentStore::in_memory();
        let deployment = seeded(&store, Uuid::new_v4());

        store
            .transition(deployment.id, DeploymentStatus::Building, |_| {})
            .unwrap();
        store
            .transition(deployment.id, DeploymentStatus::Failed, |_| {})
            .unwrap();

        for to in [
            DeploymentStatus::Building,
            DeploymentStatus::Running,
            DeploymentStatus::Stopping,
            DeploymentStatus::Stopped,
        ] {
            assert!(store.transition(deployment.id, to, |_| {}).is_err());
        }
    }

    #[test]
    fn test_list_is_filtered_and_newest_first() {
        let store = DeploymentStore::in_memory();
        let agent = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mut first = Deployment::new(agent, Uuid::new_v4(), None);
        first.created_at = Utc::now() - chrono::Duration::seconds(10);
        store.insert(first.clone());
        let second = seeded(&store, agent);
        seeded(&store, other);

        let listed = store.list(Some(agent), None, 20);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);

        let limited = store.list(Some(agent), None, 1);
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_superseded_records_are_kept() {
        let store = DeploymentStore::in_memory();
        let agent = Uuid::new_v4();
        let deployment = seeded(&store, agent);

        store
            .transition(deployment.id, DeploymentStatus::Building, |_| {})
            .unwrap();
        store
            .transition(deployment.id, DeploymentStatus::Failed, |_| {})
            .unwrap();
        seeded(&store, agent);

        assert_eq!(store.list(Some(agent), None, 20).len(), 2);
    }

    #[test]
    fn test_journal_appends_one_line_per_transition() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let store = DeploymentStore::with_journal(&path).unwrap();

        let deployment = seeded(&store, Uuid::new_v4());
        store
            .transition(deployment.id, DeploymentStatus::Building, |_| {})
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let last: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(last["from"], "pending");
        assert_eq!(last["to"], "building");
    }
}
