//! The check worker: runs probes for organizations and persists verdicts.
//!
//! `run_check` is the single-organization path, also used ad hoc when
//! debugging one SIRET. `queue_all` fans out over every organization with
//! bounded concurrency and a per-task deadline; a task that overruns its
//! deadline is abandoned and persists nothing.

use futures::stream::{FuturesUnordered, StreamExt};
use presence_core::{
    data_checks_doable, validate_conformance, CheckType, IssueSet, Organization, PresenceError,
    Result, Siret,
};
use presence_db::{data_checks, organizations, Database};
use presence_dns::DnsProbe;
use presence_web::WebProbe;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

/// Result of one check run.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub siret: Siret,
    pub check_type: CheckType,
    pub outcome: CheckOutcome,
}

/// What happened for one organization and check family.
#[derive(Debug, Clone)]
pub enum CheckOutcome {
    /// The organization does not qualify for this check family, or there
    /// was nothing to probe. Nothing was persisted.
    Skipped(String),
    /// The probe ran and its verdict was persisted.
    Completed {
        issues: IssueSet,
        metadata: JsonValue,
    },
}

/// Tally of one `queue_all` run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub timed_out: usize,
}

/// Runs checks against the registry and stores the verdicts.
pub struct CheckWorker {
    db: Database,
    dns: Arc<DnsProbe>,
    web: Arc<WebProbe>,
    max_concurrent: usize,
    task_timeout: Duration,
}

impl CheckWorker {
    pub fn new(
        db: Database,
        dns: Arc<DnsProbe>,
        web: Arc<WebProbe>,
        max_concurrent: usize,
        task_timeout: Duration,
    ) -> Self {
        Self {
            db,
            dns,
            web,
            max_concurrent,
            task_timeout,
        }
    }

    /// Run one check family for one organization and persist the verdict.
    ///
    /// The declarative validation gate runs first: an organization whose
    /// email or website does not even parse gets no probe traffic.
    pub async fn run_check(&self, siret: &Siret, check_type: CheckType) -> Result<CheckReport> {
        let org = organizations::find_org_by_siret(self.db.pool(), siret)
            .await
            .map_err(|e| PresenceError::Database(e.to_string()))?
            .ok_or_else(|| PresenceError::Validation(format!("unknown SIRET {siret}")))?;

        let conformance =
            validate_conformance(org.email_official(), org.website_url(), false);
        let doable = data_checks_doable(&conformance);

        if !doable.contains(&check_type) {
            tracing::debug!(%siret, %check_type, "Check not applicable, skipping");
            return Ok(CheckReport {
                siret: siret.clone(),
                check_type,
                outcome: CheckOutcome::Skipped(format!(
                    "{check_type} check not applicable for this organization"
                )),
            });
        }

        let probed = match check_type {
            CheckType::Dns => {
                let domain = email_domain(&org);
                self.dns.check_dns(domain).await
            }
            CheckType::Website => self.web.check_website(org.website_url()).await,
        };

        let Some((issues, metadata)) = probed else {
            return Ok(CheckReport {
                siret: siret.clone(),
                check_type,
                outcome: CheckOutcome::Skipped("nothing to probe".to_string()),
            });
        };

        data_checks::upsert_issues(self.db.pool(), siret, check_type, &issues, &metadata)
            .await
            .map_err(|e| PresenceError::Database(e.to_string()))?;

        tracing::info!(%siret, %check_type, issue_count = issues.len(), "Check completed");

        Ok(CheckReport {
            siret: siret.clone(),
            check_type,
            outcome: CheckOutcome::Completed { issues, metadata },
        })
    }

    /// Run one check family across every organization.
    ///
    /// At most `max_concurrent` organizations are probed at once. Each task
    /// gets `task_timeout` of wall clock; on overrun it is dropped where it
    /// stands, leaving the organization's row untouched until the next run.
    pub async fn queue_all(&self, check_type: CheckType) -> Result<QueueSummary> {
        let orgs = organizations::list_all_orgs(self.db.pool())
            .await
            .map_err(|e| PresenceError::Database(e.to_string()))?;

        tracing::info!(%check_type, total = orgs.len(), "Queueing checks");

        let mut summary = QueueSummary::default();
        let mut pending = orgs.into_iter();
        let mut in_flight = FuturesUnordered::new();

        loop {
            while in_flight.len() < self.max_concurrent {
                let Some(org) = pending.next() else { break };
                in_flight.push(self.run_bounded(org, check_type));
            }

            let Some(outcome) = in_flight.next().await else {
                break;
            };
            match outcome {
                BoundedOutcome::Completed => summary.completed += 1,
                BoundedOutcome::Skipped => summary.skipped += 1,
                BoundedOutcome::Failed => summary.failed += 1,
                BoundedOutcome::TimedOut => summary.timed_out += 1,
            }
        }

        tracing::info!(
            %check_type,
            completed = summary.completed,
            skipped = summary.skipped,
            failed = summary.failed,
            timed_out = summary.timed_out,
            "Queue drained"
        );

        Ok(summary)
    }

    async fn run_bounded(&self, org: Organization, check_type: CheckType) -> BoundedOutcome {
        match tokio::time::timeout(self.task_timeout, self.run_check(&org.siret, check_type)).await
        {
            Ok(Ok(report)) => match report.outcome {
                CheckOutcome::Completed { .. } => BoundedOutcome::Completed,
                CheckOutcome::Skipped(_) => BoundedOutcome::Skipped,
            },
            Ok(Err(err)) => {
                tracing::warn!(siret = %org.siret, %check_type, error = %err, "Check failed");
                BoundedOutcome::Failed
            }
            Err(_) => {
                tracing::warn!(siret = %org.siret, %check_type, "Check timed out, abandoned");
                BoundedOutcome::TimedOut
            }
        }
    }
}

enum BoundedOutcome {
    Completed,
    Skipped,
    Failed,
    TimedOut,
}

fn email_domain(org: &Organization) -> &str {
    org.email_official()
        .split('@')
        .nth(1)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use presence_core::{DnsConfig, HttpConfig};

    async fn setup_worker() -> CheckWorker {
        let db = Database::new(":memory:").await.expect("create database");
        db.run_migrations().await.expect("run migrations");

        let dns = Arc::new(presence_dns::probe_from_config(&DnsConfig::default()));
        let web = Arc::new(WebProbe::new(&HttpConfig::default()).expect("build web probe"));
        CheckWorker::new(db, dns, web, 5, Duration::from_secs(60))
    }

    async fn insert_org(
        worker: &CheckWorker,
        siret: &str,
        email: Option<&str>,
        website: Option<&str>,
    ) -> Siret {
        let siret = Siret::new(siret).expect("valid siret");
        let org = Organization {
            siret: siret.clone(),
            name: "Mairie de Maville".to_string(),
            email_official: email.map(ToString::to_string),
            website_url: website.map(ToString::to_string),
        };
        organizations::upsert_organization(worker.db.pool(), &org)
            .await
            .expect("insert org");
        siret
    }

    #[tokio::test]
    async fn test_unknown_siret_is_an_error() {
        let worker = setup_worker().await;
        let siret = Siret::new("21060088800017").expect("valid siret");

        let result = worker.run_check(&siret, CheckType::Dns).await;
        assert!(matches!(result, Err(PresenceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_dns_check_skipped_without_email() {
        let worker = setup_worker().await;
        let siret = insert_org(&worker, "21060088800017", None, Some("https://www.maville.fr"))
            .await;

        let report = worker
            .run_check(&siret, CheckType::Dns)
            .await
            .expect("run check");
        assert!(matches!(report.outcome, CheckOutcome::Skipped(_)));

        // Nothing persisted for the skipped family.
        let all = data_checks::get_all_data_checks(worker.db.pool())
            .await
            .expect("get all");
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_website_check_skipped_on_malformed_url() {
        let worker = setup_worker().await;
        let siret = insert_org(
            &worker,
            "21060088800017",
            Some("mairie@maville.fr"),
            Some("not a url"),
        )
        .await;

        let report = worker
            .run_check(&siret, CheckType::Website)
            .await
            .expect("run check");
        assert!(matches!(report.outcome, CheckOutcome::Skipped(_)));
    }

    #[tokio::test]
    async fn test_queue_all_tallies_skips() {
        let worker = setup_worker().await;
        insert_org(&worker, "21060088800017", None, Some("https://www.maville.fr")).await;
        insert_org(&worker, "21830019400012", None, None).await;

        let summary = worker.queue_all(CheckType::Dns).await.expect("queue all");
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.failed, 0);
    }

    #[test]
    fn test_email_domain_extraction() {
        let org = Organization {
            siret: Siret::new("21060088800017").expect("valid siret"),
            name: String::new(),
            email_official: Some("mairie@maville.fr".to_string()),
            website_url: None,
        };
        assert_eq!(email_domain(&org), "maville.fr");
    }
}
