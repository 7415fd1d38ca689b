//! Check result storage.
//!
//! One `data_checks` row per (organization, check family). Writes are
//! idempotent upserts keyed on `(siret, check_type)`: re-running a check
//! replaces the previous verdict instead of accumulating history. An empty
//! issue set is persisted too, so "checked and clean" is distinguishable
//! from "never checked".

use crate::error::{DatabaseError, Result};
use chrono::{DateTime, TimeZone, Utc};
use presence_core::{CheckType, Issue, IssueSet, Siret};
use serde_json::Value as JsonValue;
use sqlx::{Pool, Row, Sqlite};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

/// A stored check verdict for one organization and one check family.
#[derive(Debug, Clone)]
pub struct DataCheck {
    /// Organization identifier.
    pub siret: String,
    /// Which check family produced this row.
    pub check_type: CheckType,
    /// Issues found, with per-issue details.
    pub issues: IssueSet,
    /// Probe observations (MX countries, accessibility URL, ...).
    pub metadata: JsonValue,
    /// When the check completed.
    pub checked_at: DateTime<Utc>,
}

/// The merged verdict across all check families of one organization.
#[derive(Debug, Clone, Default)]
pub struct CombinedChecks {
    /// Union of issues across rows.
    pub issues: IssueSet,
    /// Metadata from the website row, if present.
    pub website_metadata: Option<JsonValue>,
    /// Metadata from the DNS row, if present.
    pub email_metadata: Option<JsonValue>,
    /// Oldest row timestamp, or the in-progress sentinel.
    pub checked_at: Option<DateTime<Utc>>,
}

/// Timestamp attached to partially-checked organizations. Far in the future
/// so staleness-ordered queries always place them last.
#[must_use]
pub fn in_progress_checked_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Insert or replace the check verdict for `(siret, check_type)`.
///
/// Always writes a row, including for an empty issue set.
pub async fn upsert_issues(
    pool: &Pool<Sqlite>,
    siret: &Siret,
    check_type: CheckType,
    issues: &IssueSet,
    metadata: &JsonValue,
) -> Result<()> {
    let (tags, details) = issues.to_parallel();
    let issues_json = serde_json::to_string(&tags)
        .map_err(|e| DatabaseError::Decode(format!("encode issues: {e}")))?;
    let details_json = serde_json::to_string(&details)
        .map_err(|e| DatabaseError::Decode(format!("encode details: {e}")))?;
    let metadata_json = serde_json::to_string(metadata)
        .map_err(|e| DatabaseError::Decode(format!("encode metadata: {e}")))?;
    let checked_at = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO data_checks (siret, check_type, issues, details, metadata, checked_at)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT (siret, check_type) DO UPDATE SET
             issues = excluded.issues,
             details = excluded.details,
             metadata = excluded.metadata,
             checked_at = excluded.checked_at",
    )
    .bind(siret.as_str())
    .bind(check_type.as_str())
    .bind(&issues_json)
    .bind(&details_json)
    .bind(&metadata_json)
    .bind(&checked_at)
    .execute(pool)
    .await?;

    tracing::debug!(
        siret = %siret,
        check_type = %check_type,
        issue_count = issues.len(),
        "Stored check verdict"
    );

    Ok(())
}

/// Get every stored check row, grouped by SIRET.
pub async fn get_all_data_checks(pool: &Pool<Sqlite>) -> Result<HashMap<String, Vec<DataCheck>>> {
    let rows = sqlx::query(
        "SELECT siret, check_type, issues, details, metadata, checked_at
         FROM data_checks
         ORDER BY siret, check_type",
    )
    .fetch_all(pool)
    .await?;

    let mut by_siret: HashMap<String, Vec<DataCheck>> = HashMap::new();
    for row in rows {
        let check = parse_data_check(&row)?;
        by_siret.entry(check.siret.clone()).or_default().push(check);
    }

    Ok(by_siret)
}

/// Merge the stored rows of one organization into a combined verdict.
///
/// `expected` names the check families the organization qualifies for
/// (see `presence_core::data_checks_doable`). When an expected family has no
/// row yet, the combined verdict carries an `IN_PROGRESS` issue naming the
/// pending families and the far-future sentinel timestamp, so downstream
/// consumers neither grade nor re-prioritize a half-checked organization.
pub async fn get_data_checks_by_siret(
    pool: &Pool<Sqlite>,
    siret: &Siret,
    expected: &BTreeSet<CheckType>,
) -> Result<CombinedChecks> {
    let rows = sqlx::query(
        "SELECT siret, check_type, issues, details, metadata, checked_at
         FROM data_checks
         WHERE siret = ?
         ORDER BY check_type",
    )
    .bind(siret.as_str())
    .fetch_all(pool)
    .await?;

    let checks: Vec<DataCheck> = rows
        .iter()
        .map(parse_data_check)
        .collect::<Result<Vec<_>>>()?;

    let present: BTreeSet<CheckType> = checks.iter().map(|c| c.check_type).collect();
    let pending: Vec<&str> = expected
        .iter()
        .filter(|t| !present.contains(t))
        .map(|t| t.as_str())
        .collect();

    // A half-checked organization is "not ready", not a partial verdict.
    if !pending.is_empty() {
        let mut issues = IssueSet::new();
        issues.insert(Issue::InProgress, format!("pending: {}", pending.join(", ")));
        return Ok(CombinedChecks {
            issues,
            website_metadata: None,
            email_metadata: None,
            checked_at: Some(in_progress_checked_at()),
        });
    }

    let mut combined = CombinedChecks::default();
    for check in checks {
        combined.issues.merge(check.issues);
        combined.checked_at = Some(match combined.checked_at {
            Some(earliest) => earliest.min(check.checked_at),
            None => check.checked_at,
        });
        match check.check_type {
            CheckType::Dns => combined.email_metadata = Some(check.metadata),
            CheckType::Website => combined.website_metadata = Some(check.metadata),
        }
    }

    Ok(combined)
}

fn parse_data_check(row: &sqlx::sqlite::SqliteRow) -> Result<DataCheck> {
    let check_type_str: String = row.try_get("check_type")?;
    let check_type = CheckType::from_str(&check_type_str).map_err(|_| {
        DatabaseError::Decode(format!(
            "Invalid check_type '{check_type_str}' in data_checks table"
        ))
    })?;

    let issues_str: String = row.try_get("issues")?;
    let tags: Vec<String> = serde_json::from_str(&issues_str).unwrap_or_default();
    let details_str: String = row.try_get("details")?;
    let details: Vec<String> = serde_json::from_str(&details_str).unwrap_or_default();

    let metadata_str: String = row.try_get("metadata")?;
    let metadata = serde_json::from_str(&metadata_str).unwrap_or(JsonValue::Null);

    let checked_at_str: String = row.try_get("checked_at")?;
    let checked_at = DateTime::parse_from_rfc3339(&checked_at_str)
        .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

    Ok(DataCheck {
        siret: row.try_get("siret")?,
        check_type,
        issues: IssueSet::from_parallel(&tags, &details),
        metadata,
        checked_at,
    })
}
