//! Entry database operations

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::domain::{
    Entry, EntryInput, EntryPatch, IncidentRecord, IncidentRecordInput, Issue, IssueInput,
    ProblemRecord, ProblemRecordInput, TicketNumber, DATE_FORMAT,
};

use super::errors::StoreError;

/// Row type for entries table
#[derive(Debug, sqlx::FromRow)]
pub struct EntryRow {
    pub id: i64,
    pub date: Option<String>,
    pub day: Option<String>,
    pub application_name: Option<String>,
    pub prc_mail_text: Option<String>,
    pub prc_mail_status: Option<String>,
    pub cp_alerts_text: Option<String>,
    pub cp_alerts_status: Option<String>,
    pub quality_status: Option<String>,
    pub quality_legacy: Option<String>,
    pub quality_target: Option<String>,
    pub prb_id_number: Option<String>,
    pub prb_id_status: Option<String>,
    pub prb_link: Option<String>,
    pub hiim_id_number: Option<String>,
    pub hiim_id_status: Option<String>,
    pub hiim_link: Option<String>,
    pub valo_text: Option<String>,
    pub valo_status: Option<String>,
    pub sensi_text: Option<String>,
    pub sensi_status: Option<String>,
    pub cf_ra_text: Option<String>,
    pub cf_ra_status: Option<String>,
    pub acq_text: Option<String>,
    pub root_cause_application: Option<String>,
    pub root_cause_type: Option<String>,
    pub issue_description: Option<String>,
    pub remarks: Option<String>,
    pub xva_remarks: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl EntryRow {
    /// Convert to a domain entry. Rows without a parseable date are skipped.
    pub fn to_entry(self, children: &mut Children) -> Option<Entry> {
        let date = match self
            .date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), DATE_FORMAT).ok())
        {
            Some(date) => date,
            None => {
                tracing::warn!("Skipping entry {} with unreadable date {:?}", self.id, self.date);
                return None;
            }
        };

        Some(Entry {
            id: self.id,
            date,
            day: self.day,
            application_name: self.application_name.unwrap_or_default(),
            prc_mail_text: self.prc_mail_text,
            prc_mail_status: self.prc_mail_status,
            cp_alerts_text: self.cp_alerts_text,
            cp_alerts_status: self.cp_alerts_status,
            quality_status: self.quality_status,
            valo_text: self.valo_text,
            valo_status: self.valo_status,
            sensi_text: self.sensi_text,
            sensi_status: self.sensi_status,
            cf_ra_text: self.cf_ra_text,
            cf_ra_status: self.cf_ra_status,
            acq_text: self.acq_text,
            quality_legacy: self.quality_legacy,
            quality_target: self.quality_target,
            root_cause_application: self.root_cause_application,
            root_cause_type: self.root_cause_type,
            xva_remarks: self.xva_remarks,
            remarks: self.remarks,
            prb_id_number: self.prb_id_number,
            prb_id_status: self.prb_id_status,
            prb_link: self.prb_link,
            hiim_id_number: self.hiim_id_number,
            hiim_id_status: self.hiim_id_status,
            hiim_link: self.hiim_link,
            issue_description: self.issue_description,
            created_at: parse_timestamp(self.created_at.as_deref()),
            updated_at: parse_timestamp(self.updated_at.as_deref()),
            issues: children.issues.remove(&self.id).unwrap_or_default(),
            prbs: children.prbs.remove(&self.id).unwrap_or_default(),
            hiims: children.hiims.remove(&self.id).unwrap_or_default(),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct IssueRow {
    id: i64,
    entry_id: i64,
    description: Option<String>,
    remarks: Option<String>,
    position: Option<i64>,
    created_at: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct PrbRow {
    id: i64,
    entry_id: i64,
    prb_id_number: Option<String>,
    prb_id_status: Option<String>,
    prb_link: Option<String>,
    position: Option<i64>,
    created_at: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct HiimRow {
    id: i64,
    entry_id: i64,
    hiim_id_number: Option<String>,
    hiim_id_status: Option<String>,
    hiim_link: Option<String>,
    position: Option<i64>,
    created_at: Option<String>,
}

/// Child collections grouped by parent entry id
#[derive(Debug, Default)]
pub struct Children {
    issues: HashMap<i64, Vec<Issue>>,
    prbs: HashMap<i64, Vec<ProblemRecord>>,
    hiims: HashMap<i64, Vec<IncidentRecord>>,
}

/// Load child rows ordered by position then id, for the given entries or, with
/// `None`, for the whole store
async fn load_children(pool: &SqlitePool, entry_ids: Option<&[i64]>) -> Result<Children, sqlx::Error> {
    let mut children = Children::default();
    let filter = match entry_ids {
        None => String::new(),
        Some([]) => return Ok(children),
        Some(ids) => format!("WHERE entry_id IN ({})", vec!["?"; ids.len()].join(", ")),
    };
    let ids = entry_ids.unwrap_or_default();

    let sql = format!("SELECT * FROM issues {} ORDER BY entry_id, position ASC, id ASC", filter);
    let mut q = sqlx::query_as::<_, IssueRow>(&sql);
    for id in ids {
        q = q.bind(id);
    }
    for r in q.fetch_all(pool).await? {
        children.issues.entry(r.entry_id).or_default().push(Issue {
            id: r.id,
            description: r.description.unwrap_or_default(),
            remarks: r.remarks.unwrap_or_default(),
            position: r.position.unwrap_or_default(),
            created_at: parse_timestamp(r.created_at.as_deref()),
        });
    }

    let sql = format!("SELECT * FROM prbs {} ORDER BY entry_id, position ASC, id ASC", filter);
    let mut q = sqlx::query_as::<_, PrbRow>(&sql);
    for id in ids {
        q = q.bind(id);
    }
    for r in q.fetch_all(pool).await? {
        children.prbs.entry(r.entry_id).or_default().push(ProblemRecord {
            id: r.id,
            prb_id_number: r.prb_id_number.unwrap_or_default(),
            prb_id_status: r.prb_id_status.unwrap_or_default(),
            prb_link: r.prb_link.unwrap_or_default(),
            position: r.position.unwrap_or_default(),
            created_at: parse_timestamp(r.created_at.as_deref()),
        });
    }

    let sql = format!("SELECT * FROM hiims {} ORDER BY entry_id, position ASC, id ASC", filter);
    let mut q = sqlx::query_as::<_, HiimRow>(&sql);
    for id in ids {
        q = q.bind(id);
    }
    for r in q.fetch_all(pool).await? {
        children.hiims.entry(r.entry_id).or_default().push(IncidentRecord {
            id: r.id,
            hiim_id_number: r.hiim_id_number.unwrap_or_default(),
            hiim_id_status: r.hiim_id_status.unwrap_or_default(),
            hiim_link: r.hiim_link.unwrap_or_default(),
            position: r.position.unwrap_or_default(),
            created_at: parse_timestamp(r.created_at.as_deref()),
        });
    }

    Ok(children)
}

/// Get an entry by ID with its child collections
pub async fn get_entry(pool: &SqlitePool, entry_id: i64) -> Result<Option<Entry>, StoreError> {
    let row = sqlx::query_as::<_, EntryRow>("SELECT * FROM entries WHERE id = ?")
        .bind(entry_id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut children = load_children(pool, Some(&[entry_id][..])).await?;
    Ok(row.to_entry(&mut children))
}

/// List all entries, newest first by creation time
pub async fn list_entries(pool: &SqlitePool) -> Result<Vec<Entry>, StoreError> {
    let rows = sqlx::query_as::<_, EntryRow>("SELECT * FROM entries ORDER BY created_at DESC, id DESC")
        .fetch_all(pool)
        .await?;

    let mut children = load_children(pool, None).await?;
    Ok(rows
        .into_iter()
        .filter_map(|r| r.to_entry(&mut children))
        .collect())
}

/// List the entries of one application, newest first by creation time
pub async fn list_entries_by_application(
    pool: &SqlitePool,
    application_name: &str,
) -> Result<Vec<Entry>, StoreError> {
    let rows = sqlx::query_as::<_, EntryRow>(
        "SELECT * FROM entries WHERE application_name = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(application_name)
    .fetch_all(pool)
    .await?;

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut children = load_children(pool, Some(&ids)).await?;
    Ok(rows
        .into_iter()
        .filter_map(|r| r.to_entry(&mut children))
        .collect())
}

/// Find the entry recorded for an application on a given day, ignoring `exclude_id`
pub async fn find_entry_id(
    pool: &SqlitePool,
    date: &str,
    application_name: &str,
    exclude_id: Option<i64>,
) -> Result<Option<i64>, StoreError> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM entries WHERE date = ? AND application_name = ? AND (? IS NULL OR id != ?) ORDER BY id LIMIT 1",
    )
    .bind(date)
    .bind(application_name)
    .bind(exclude_id)
    .bind(exclude_id)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Create a new entry and its child collections in one transaction
pub async fn create_entry(pool: &SqlitePool, input: &EntryInput) -> Result<Entry, StoreError> {
    let input = input.clone().with_derived_day().with_legacy_backfill();
    let now = Utc::now().to_rfc3339();
    let date = input.date.clone().unwrap_or_default();
    let application_name = input.application_name.clone().unwrap_or_default();

    let columns = input.columns();
    let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    let placeholders = vec!["?"; names.len() + 2].join(", ");
    let query = format!(
        "INSERT INTO entries ({}, created_at, updated_at) VALUES ({})",
        names.join(", "),
        placeholders
    );

    let mut tx = pool.begin().await?;

    let mut q = sqlx::query(&query);
    for (_, value) in &columns {
        q = q.bind(value);
    }
    q = q.bind(&now).bind(&now);

    let entry_id = q
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::from_entry_write(e, &date, &application_name))?
        .last_insert_rowid();

    insert_issues(&mut tx, entry_id, input.issues.as_deref().unwrap_or_default(), &now).await?;
    insert_prbs(&mut tx, entry_id, input.prbs.as_deref().unwrap_or_default(), &now).await?;
    insert_hiims(&mut tx, entry_id, input.hiims.as_deref().unwrap_or_default(), &now).await?;

    tx.commit().await?;

    tracing::info!("Created entry {} for {} on {}", entry_id, application_name, date);

    get_entry(pool, entry_id)
        .await?
        .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
}

/// Apply a partial update.
///
/// Supplied scalars overwrite their columns and cleared ones are set to NULL. A
/// supplied child list replaces the stored collection; a cleared one empties it.
/// Returns `None` when the entry does not exist.
pub async fn update_entry(
    pool: &SqlitePool,
    entry_id: i64,
    patch: &EntryPatch,
) -> Result<Option<Entry>, StoreError> {
    let mut set = patch.set.clone();
    if set.date.is_some() && set.day.is_none() && !patch.clears("day") {
        set = set.with_derived_day();
    }
    let now = Utc::now().to_rfc3339();

    let mut tx = pool.begin().await?;

    #[derive(sqlx::FromRow)]
    struct KeyRow {
        date: Option<String>,
        application_name: Option<String>,
    }

    let Some(existing) = sqlx::query_as::<_, KeyRow>("SELECT date, application_name FROM entries WHERE id = ?")
        .bind(entry_id)
        .fetch_optional(&mut *tx)
        .await?
    else {
        return Ok(None);
    };

    let mut updates = Vec::new();
    let mut bindings: Vec<Option<String>> = Vec::new();

    for (column, value) in set.columns() {
        if value.is_some() || patch.clears(column) {
            updates.push(format!("{} = ?", column));
            bindings.push(value);
        }
    }

    updates.push("updated_at = ?".to_string());
    bindings.push(Some(now.clone()));

    let query = format!("UPDATE entries SET {} WHERE id = ?", updates.join(", "));

    let mut q = sqlx::query(&query);
    for binding in &bindings {
        q = q.bind(binding);
    }
    q = q.bind(entry_id);

    let date = set.date.clone().or(existing.date).unwrap_or_default();
    let application_name = set
        .application_name
        .clone()
        .or(existing.application_name)
        .unwrap_or_default();
    q.execute(&mut *tx)
        .await
        .map_err(|e| StoreError::from_entry_write(e, &date, &application_name))?;

    if set.issues.is_some() || patch.clears("issues") {
        clear_children(&mut tx, "issues", entry_id).await?;
        insert_issues(&mut tx, entry_id, set.issues.as_deref().unwrap_or_default(), &now).await?;
    }
    if set.prbs.is_some() || patch.clears("prbs") {
        clear_children(&mut tx, "prbs", entry_id).await?;
        insert_prbs(&mut tx, entry_id, set.prbs.as_deref().unwrap_or_default(), &now).await?;
    }
    if set.hiims.is_some() || patch.clears("hiims") {
        clear_children(&mut tx, "hiims", entry_id).await?;
        insert_hiims(&mut tx, entry_id, set.hiims.as_deref().unwrap_or_default(), &now).await?;
    }

    tx.commit().await?;

    tracing::info!("Updated entry {}", entry_id);

    get_entry(pool, entry_id).await
}

/// Delete an entry and its child rows
pub async fn delete_entry(pool: &SqlitePool, entry_id: i64) -> Result<bool, StoreError> {
    let mut tx = pool.begin().await?;

    for table in ["issues", "prbs", "hiims"] {
        clear_children(&mut tx, table, entry_id).await?;
    }

    let result = sqlx::query("DELETE FROM entries WHERE id = ?")
        .bind(entry_id)
        .execute(&mut *tx)
        .await?;

    let deleted = result.rows_affected() > 0;
    if deleted {
        tx.commit().await?;
        tracing::info!("Deleted entry {}", entry_id);
    } else {
        tx.rollback().await?;
    }

    Ok(deleted)
}

async fn clear_children(
    tx: &mut Transaction<'_, Sqlite>,
    table: &str,
    entry_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!("DELETE FROM {} WHERE entry_id = ?", table))
        .bind(entry_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn insert_issues(
    tx: &mut Transaction<'_, Sqlite>,
    entry_id: i64,
    issues: &[IssueInput],
    now: &str,
) -> Result<(), sqlx::Error> {
    for (idx, issue) in issues.iter().enumerate() {
        sqlx::query(
            "INSERT INTO issues (entry_id, description, remarks, position, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(entry_id)
        .bind(issue.description.clone().unwrap_or_default())
        .bind(issue.remarks.clone().unwrap_or_default())
        .bind(idx as i64)
        .bind(now)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn insert_prbs(
    tx: &mut Transaction<'_, Sqlite>,
    entry_id: i64,
    prbs: &[ProblemRecordInput],
    now: &str,
) -> Result<(), sqlx::Error> {
    for (idx, prb) in prbs.iter().enumerate() {
        sqlx::query(
            "INSERT INTO prbs (entry_id, prb_id_number, prb_id_status, prb_link, position, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(entry_id)
        .bind(prb.prb_id_number.as_ref().map(TicketNumber::as_text).unwrap_or_default())
        .bind(prb.prb_id_status.clone().unwrap_or_default())
        .bind(prb.prb_link.clone().unwrap_or_default())
        .bind(idx as i64)
        .bind(now)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn insert_hiims(
    tx: &mut Transaction<'_, Sqlite>,
    entry_id: i64,
    hiims: &[IncidentRecordInput],
    now: &str,
) -> Result<(), sqlx::Error> {
    for (idx, hiim) in hiims.iter().enumerate() {
        sqlx::query(
            "INSERT INTO hiims (entry_id, hiim_id_number, hiim_id_status, hiim_link, position, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(entry_id)
        .bind(hiim.hiim_id_number.as_ref().map(TicketNumber::as_text).unwrap_or_default())
        .bind(hiim.hiim_id_status.clone().unwrap_or_default())
        .bind(hiim.hiim_link.clone().unwrap_or_default())
        .bind(idx as i64)
        .bind(now)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Parse a stored timestamp: RFC 3339, or the naive ISO format older rows carry
fn parse_timestamp(value: Option<&str>) -> DateTime<Utc> {
    let Some(value) = value else {
        return DateTime::<Utc>::default();
    };

    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.and_utc())
        })
        .unwrap_or(DateTime::<Utc>::default())
}
