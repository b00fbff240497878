//! Per-party views and the terminal report.
//!
//! Resource overview: what a party may request and who already has access.
//! Pending requests: approval progress and whether the party can act.

use quorum_core::{KeySlot, RequestKey, Resource};
use serde::Serialize;
use std::collections::HashMap;

/// One catalog entry as seen by a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceView {
    pub description: String,
    pub admins: Vec<String>,
    pub approvers_needed: u32,
    /// Has request right, nothing pending, not yet granted.
    pub can_request: bool,
    /// Applicants holding a grant on this resource.
    pub granted: Vec<String>,
}

/// One pending request as seen by a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingView {
    pub key: RequestKey,
    pub approvals: usize,
    pub needed: u32,
    pub approved_by: Vec<String>,
    /// Admin of the resource and has not approved yet.
    pub can_approve: bool,
    pub grantable: bool,
}

pub fn resource_views(
    party: &str,
    resources: &[Resource],
    entries: &[(RequestKey, KeySlot)],
) -> Vec<ResourceView> {
    let mut granted: HashMap<&str, Vec<String>> = HashMap::new();
    for (key, slot) in entries {
        if slot.grant.is_some() {
            granted
                .entry(key.resource.as_str())
                .or_default()
                .push(key.applicant.clone());
        }
    }

    let own: HashMap<&str, &KeySlot> = entries
        .iter()
        .filter(|(key, _)| key.applicant == party)
        .map(|(key, slot)| (key.resource.as_str(), slot))
        .collect();

    resources
        .iter()
        .map(|r| {
            let untouched = own
                .get(r.description.as_str())
                .is_none_or(|slot| slot.request.is_none() && slot.grant.is_none());
            ResourceView {
                description: r.description.clone(),
                admins: r.admins.iter().cloned().collect(),
                approvers_needed: r.approvers_needed,
                can_request: r.has_request_right(party) && untouched,
                granted: granted.remove(r.description.as_str()).unwrap_or_default(),
            }
        })
        .collect()
}

/// Pending requests with progress measured against the current catalog.
///
/// A request whose resource has left the catalog keeps the threshold of the
/// snapshot it was made against and cannot be approved by anyone.
pub fn pending_views(
    party: &str,
    resources: &[Resource],
    entries: &[(RequestKey, KeySlot)],
) -> Vec<PendingView> {
    let current: HashMap<&str, &Resource> = resources
        .iter()
        .map(|r| (r.description.as_str(), r))
        .collect();

    entries
        .iter()
        .filter(|(_, slot)| slot.is_pending())
        .filter_map(|(key, slot)| {
            let request = slot.request.as_ref()?;
            let resource = current.get(key.resource.as_str()).copied();
            let needed = resource.map_or(request.resource.approvers_needed, |r| r.approvers_needed);
            let approvals = slot.approval_count();
            let can_approve =
                resource.is_some_and(|r| r.is_admin(party)) && !slot.has_approved(party);

            Some(PendingView {
                key: key.clone(),
                approvals,
                needed,
                approved_by: slot
                    .approval
                    .as_ref()
                    .map(|a| a.approvers().to_vec())
                    .unwrap_or_default(),
                can_approve,
                grantable: approvals >= needed as usize,
            })
        })
        .collect()
}

/// Everything one party sees, ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub party: String,
    pub resources: Vec<ResourceView>,
    pub pending: Vec<PendingView>,
}

impl Report {
    pub fn build(party: &str, resources: &[Resource], entries: &[(RequestKey, KeySlot)]) -> Self {
        Self {
            party: party.to_string(),
            resources: resource_views(party, resources, entries),
            pending: pending_views(party, resources, entries),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push('\n');
        out.push_str("╔══════════════════════════════════════════════════════════════╗\n");
        out.push_str(&format!("║  Party: {:<52} ║\n", self.party));
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");
        out.push_str("║  RESOURCES                                                   ║\n");
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        if self.resources.is_empty() {
            out.push_str("║  No resources in catalog.                                    ║\n");
        }
        for r in &self.resources {
            out.push_str(&format!(
                "║  {}  (needs {} of {})\n",
                r.description,
                r.approvers_needed,
                r.admins.len()
            ));
            out.push_str(&format!("║     Admins: {}\n", r.admins.join(", ")));
            if !r.granted.is_empty() {
                out.push_str(&format!("║     Granted: {}\n", r.granted.join(", ")));
            }
            if r.can_request {
                out.push_str("║     [request access]\n");
            }
        }

        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");
        out.push_str("║  PENDING REQUESTS                                            ║\n");
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        if self.pending.is_empty() {
            out.push_str("║  Nothing pending.                                            ║\n");
        }
        for p in &self.pending {
            let mut actions = Vec::new();
            if p.can_approve {
                actions.push("approve");
            }
            if p.grantable {
                actions.push("grant");
            }
            out.push_str(&format!(
                "║  {} by {}  [{}/{}]",
                p.key.resource, p.key.applicant, p.approvals, p.needed
            ));
            if !actions.is_empty() {
                out.push_str(&format!("  [{}]", actions.join("] [")));
            }
            out.push('\n');
        }

        out.push_str("╚══════════════════════════════════════════════════════════════╝\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quorum_core::{AccessRequest, ApprovalState, GrantRecord};

    fn db_prod() -> Resource {
        Resource::new("db-prod", ["alice", "bob"], 2, ["carol", "dave"])
    }

    fn pending(applicant: &str, approvers: &[&str]) -> (RequestKey, KeySlot) {
        let mut approval: Option<ApprovalState> = None;
        for a in approvers {
            approval.get_or_insert_with(ApprovalState::default).insert(a);
        }
        (
            RequestKey::new("db-prod", applicant),
            KeySlot {
                request: Some(AccessRequest {
                    resource: db_prod(),
                    applicant: applicant.into(),
                    requested_at: Utc::now(),
                }),
                approval,
                grant: None,
            },
        )
    }

    fn granted(applicant: &str) -> (RequestKey, KeySlot) {
        let key = RequestKey::new("db-prod", applicant);
        (
            key.clone(),
            KeySlot {
                grant: Some(GrantRecord {
                    key,
                    grantor: "alice".into(),
                    approvers: vec!["alice".into(), "bob".into()],
                    granted_at: Utc::now(),
                }),
                ..KeySlot::default()
            },
        )
    }

    #[test]
    fn can_request_only_when_eligible_and_untouched() {
        let resources = [db_prod()];

        let fresh = resource_views("carol", &resources, &[]);
        assert!(fresh[0].can_request);

        let asked = resource_views("carol", &resources, &[pending("carol", &[])]);
        assert!(!asked[0].can_request);

        let outsider = resource_views("mallory", &resources, &[]);
        assert!(!outsider[0].can_request);
    }

    #[test]
    fn granted_parties_listed_per_resource() {
        let views = resource_views("carol", &[db_prod()], &[granted("dave")]);
        assert_eq!(views[0].granted, ["dave"]);
        assert!(views[0].can_request);
    }

    #[test]
    fn pending_progress_and_actions() {
        let entries = [pending("carol", &["alice"]), granted("dave")];

        let for_bob = pending_views("bob", &[db_prod()], &entries);
        assert_eq!(for_bob.len(), 1);
        assert_eq!(for_bob[0].approvals, 1);
        assert_eq!(for_bob[0].needed, 2);
        assert!(for_bob[0].can_approve);
        assert!(!for_bob[0].grantable);

        let for_alice = pending_views("alice", &[db_prod()], &entries);
        assert!(!for_alice[0].can_approve);
    }

    #[test]
    fn removed_resource_keeps_snapshot_threshold() {
        let entries = [pending("carol", &["alice", "bob"])];
        let views = pending_views("alice", &[], &entries);
        assert_eq!(views[0].needed, 2);
        assert!(views[0].grantable);
        assert!(!views[0].can_approve);
    }

    #[test]
    fn render_mentions_progress() {
        let report = Report::build("bob", &[db_prod()], &[pending("carol", &["alice"])]);
        let text = report.render();
        assert!(text.contains("db-prod by carol  [1/2]  [approve]"));
    }
}
