//! Scripted workflow replay.
//!
//! A script is a JSON array of steps, each acting as one party:
//!
//! ```json
//! [
//!   { "op": "request", "party": "carol", "resource": "db-prod" },
//!   { "op": "approve", "party": "alice", "resource": "db-prod", "applicant": "carol" },
//!   { "op": "grant",   "party": "bob",   "resource": "db-prod", "applicant": "carol" }
//! ]
//! ```

use quorum_core::{ErrorKind, QuorumError, QuorumResult, RequestKey};
use quorum_engine::WorkflowFacade;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Request {
        party: String,
        resource: String,
    },
    Approve {
        party: String,
        resource: String,
        applicant: String,
    },
    Grant {
        party: String,
        resource: String,
        applicant: String,
    },
}

impl Step {
    fn label(&self) -> &'static str {
        match self {
            Step::Request { .. } => "request",
            Step::Approve { .. } => "approve",
            Step::Grant { .. } => "grant",
        }
    }
}

/// What happened to one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub op: &'static str,
    pub accepted: bool,
    pub detail: String,
}

pub async fn load_script(path: impl AsRef<Path>) -> QuorumResult<Vec<Step>> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| QuorumError::InvalidInput(format!("Failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| QuorumError::InvalidInput(format!("Failed to parse {}: {e}", path.display())))
}

/// Runs `steps` in order against `facade`.
///
/// Rejections by the rules and exhausted retries are recorded and the replay
/// continues. Catalog or store failures stop it.
pub async fn replay(facade: &WorkflowFacade, steps: &[Step]) -> QuorumResult<Vec<StepOutcome>> {
    let mut outcomes = Vec::with_capacity(steps.len());

    for (index, step) in steps.iter().enumerate() {
        let result = match step {
            Step::Request { party, resource } => facade
                .request_access(resource, party)
                .await
                .map(|accepted| format!("{} pending", accepted.request.key())),
            Step::Approve {
                party,
                resource,
                applicant,
            } => facade
                .submit_approval(&RequestKey::new(resource, applicant), party)
                .await
                .map(|p| format!("{} approved by {party} ({}/{})", p.key, p.approvals, p.needed)),
            Step::Grant {
                party,
                resource,
                applicant,
            } => facade
                .attempt_grant(&RequestKey::new(resource, applicant), party)
                .await
                .map(|g| format!("{} granted by {}", g.key, g.grantor)),
        };

        let outcome = match result {
            Ok(detail) => StepOutcome {
                index,
                op: step.label(),
                accepted: true,
                detail,
            },
            Err(e) if e.kind() == ErrorKind::Infrastructure => return Err(e),
            Err(e) => {
                tracing::warn!(index, op = step.label(), error = %e, "step rejected");
                StepOutcome {
                    index,
                    op: step.label(),
                    accepted: false,
                    detail: e.to_string(),
                }
            }
        };
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_catalog::StaticCatalog;
    use quorum_core::Resource;
    use quorum_engine::config::DEFAULT_EVENT_CAPACITY;
    use quorum_engine::{events, EngineConfig};
    use std::io::Write;
    use std::sync::Arc;

    const DB_PROD_SCRIPT: &str = r#"[
        {"op": "request", "party": "carol", "resource": "db-prod"},
        {"op": "approve", "party": "alice", "resource": "db-prod", "applicant": "carol"},
        {"op": "grant",   "party": "bob",   "resource": "db-prod", "applicant": "carol"},
        {"op": "approve", "party": "alice", "resource": "db-prod", "applicant": "carol"},
        {"op": "approve", "party": "bob",   "resource": "db-prod", "applicant": "carol"},
        {"op": "grant",   "party": "bob",   "resource": "db-prod", "applicant": "carol"}
    ]"#;

    fn facade() -> WorkflowFacade {
        let catalog = StaticCatalog::new([Resource::new(
            "db-prod",
            ["alice", "bob"],
            2,
            ["carol"],
        )])
        .unwrap();
        WorkflowFacade::new(Arc::new(catalog), EngineConfig::default())
    }

    #[tokio::test]
    async fn replay_records_rejections_and_continues() {
        let steps: Vec<Step> = serde_json::from_str(DB_PROD_SCRIPT).unwrap();
        let outcomes = replay(&facade(), &steps).await.unwrap();

        let accepted: Vec<bool> = outcomes.iter().map(|o| o.accepted).collect();
        assert_eq!(accepted, [true, true, false, false, true, true]);
        assert!(outcomes[2].detail.contains("1 of 2"));
        assert!(outcomes[5].detail.contains("granted by bob"));
    }

    #[tokio::test]
    async fn unknown_resource_is_a_rejection() {
        let steps = vec![Step::Request {
            party: "carol".into(),
            resource: "wiki".into(),
        }];
        let outcomes = replay(&facade(), &steps).await.unwrap();
        assert!(!outcomes[0].accepted);
    }

    #[tokio::test]
    async fn script_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{DB_PROD_SCRIPT}").unwrap();

        let steps = load_script(file.path()).await.unwrap();
        assert_eq!(steps.len(), 6);
        assert_eq!(
            steps[0],
            Step::Request {
                party: "carol".into(),
                resource: "db-prod".into()
            }
        );
    }

    #[tokio::test]
    async fn unknown_op_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"op": "revoke", "party": "alice", "resource": "db-prod"}}]"#).unwrap();
        assert!(matches!(
            load_script(file.path()).await,
            Err(QuorumError::InvalidInput(_))
        ));
    }

    /// 150 applicants each requesting and receiving one approval.
    fn vault_load() -> (Arc<StaticCatalog>, Vec<Step>) {
        let applicants: Vec<String> = (0..150).map(|i| format!("applicant-{i}")).collect();
        let catalog = StaticCatalog::new([Resource::new(
            "vault",
            ["alice", "bob"],
            2,
            applicants.clone(),
        )])
        .unwrap();

        let mut steps = Vec::new();
        for applicant in &applicants {
            steps.push(Step::Request {
                party: applicant.clone(),
                resource: "vault".into(),
            });
        }
        for applicant in &applicants {
            steps.push(Step::Approve {
                party: "alice".into(),
                resource: "vault".into(),
                applicant: applicant.clone(),
            });
        }
        (Arc::new(catalog), steps)
    }

    #[tokio::test]
    async fn long_script_keeps_events_past_the_default_capacity() {
        let (catalog, steps) = vault_load();
        let facade = WorkflowFacade::new(catalog, EngineConfig::default());
        let mut rx = facade.subscribe();

        replay(&facade, &steps).await.unwrap();

        let drained = events::drain(&mut rx);
        assert_eq!(drained.len(), DEFAULT_EVENT_CAPACITY);
        assert_eq!(drained.last().unwrap().key().applicant, "applicant-149");
    }

    #[tokio::test]
    async fn capacity_sized_to_script_keeps_every_event() {
        let (catalog, steps) = vault_load();
        let config = EngineConfig::default().with_event_capacity(steps.len());
        let facade = WorkflowFacade::new(catalog, config);
        let mut rx = facade.subscribe();

        replay(&facade, &steps).await.unwrap();

        assert_eq!(events::drain(&mut rx).len(), steps.len());
    }
}
