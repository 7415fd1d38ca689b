//! Organization registry operations.

use crate::error::{DatabaseError, Result};
use chrono::Utc;
use presence_core::{Organization, Siret};
use sqlx::{Pool, Row, Sqlite};

/// Insert or replace an organization record.
pub async fn upsert_organization(pool: &Pool<Sqlite>, org: &Organization) -> Result<()> {
    sqlx::query(
        "INSERT INTO organizations (siret, name, email_official, website_url, updated_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT (siret) DO UPDATE SET
             name = excluded.name,
             email_official = excluded.email_official,
             website_url = excluded.website_url,
             updated_at = excluded.updated_at",
    )
    .bind(org.siret.as_str())
    .bind(&org.name)
    .bind(&org.email_official)
    .bind(&org.website_url)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Look up one organization by SIRET. Returns `None` when absent.
pub async fn find_org_by_siret(pool: &Pool<Sqlite>, siret: &Siret) -> Result<Option<Organization>> {
    let row = sqlx::query(
        "SELECT siret, name, email_official, website_url
         FROM organizations
         WHERE siret = ?",
    )
    .bind(siret.as_str())
    .fetch_optional(pool)
    .await?;

    row.map(|row| parse_organization(&row)).transpose()
}

/// Get all organizations, ordered by SIRET.
pub async fn list_all_orgs(pool: &Pool<Sqlite>) -> Result<Vec<Organization>> {
    let rows = sqlx::query(
        "SELECT siret, name, email_official, website_url
         FROM organizations
         ORDER BY siret",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(parse_organization).collect()
}

fn parse_organization(row: &sqlx::sqlite::SqliteRow) -> Result<Organization> {
    let siret_str: String = row.try_get("siret")?;
    let siret = Siret::new(siret_str.clone()).map_err(|_| {
        DatabaseError::Decode(format!("Invalid SIRET '{siret_str}' in organizations table"))
    })?;

    Ok(Organization {
        siret,
        name: row.try_get("name")?,
        email_official: row.try_get("email_official")?,
        website_url: row.try_get("website_url")?,
    })
}
