//! Database connection pool and schema migrations

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;

/// Columns added to `entries` after the first release, with their SQL type
const ADDED_ENTRY_COLUMNS: [(&str, &str); 7] = [
    ("prb_link", "TEXT"),
    ("hiim_link", "TEXT"),
    ("valo_text", "TEXT"),
    ("sensi_text", "TEXT"),
    ("cf_ra_text", "TEXT"),
    ("acq_text", "TEXT"),
    ("xva_remarks", "TEXT"),
];

/// Create a new SQLite connection pool
pub async fn create_pool(database_path: &str) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = database_path.contains(":memory:");

    // Ensure parent directory exists
    if !in_memory {
        let file_path = database_path.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
        if let Some(parent) = Path::new(file_path).parent() {
            std::fs::create_dir_all(parent).ok();
        }
    }

    let options = SqliteConnectOptions::from_str(database_path)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .foreign_keys(true);

    // Every connection to `:memory:` opens its own database, so keep exactly one alive
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(10)
    };

    let pool = pool_options.connect_with(options).await?;

    Ok(pool)
}

/// Run database migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // All migration files in order
    let migrations = [
        include_str!("../../migrations/001_initial_schema.sql"),
        include_str!("../../migrations/002_indexes.sql"),
    ];

    for migration_sql in migrations {
        // Parse statements properly - handling parentheses for CREATE TABLE
        let statements = parse_sql_statements(migration_sql);

        for stmt in statements {
            let stmt = stmt.trim();
            if stmt.is_empty() || stmt.starts_with("--") || stmt.starts_with("PRAGMA") {
                continue;
            }

            if let Err(e) = sqlx::query(stmt).execute(pool).await {
                let err_str = e.to_string();
                if !err_str.contains("already exists") {
                    tracing::warn!("Migration statement failed: {} - {}", &stmt[..stmt.len().min(50)], e);
                }
            }
        }
    }

    add_missing_entry_columns(pool).await?;
    backfill_child_tables(pool).await?;

    Ok(())
}

/// Add newer `entries` columns to a database created by an older release
async fn add_missing_entry_columns(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let existing: Vec<String> = sqlx::query("PRAGMA table_info(entries)")
        .fetch_all(pool)
        .await?
        .iter()
        .map(|row| row.get::<String, _>("name"))
        .collect();

    for (column, column_type) in ADDED_ENTRY_COLUMNS {
        if existing.iter().any(|c| c == column) {
            continue;
        }
        tracing::info!("Adding missing column entries.{}", column);
        sqlx::query(&format!("ALTER TABLE entries ADD COLUMN {} {}", column, column_type))
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// Copy legacy single-value columns into child tables.
///
/// A child table is only backfilled while it is completely empty, so this runs
/// at most once per collection.
async fn backfill_child_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let issues_empty = table_is_empty(&mut tx, "issues").await?;
    let prbs_empty = table_is_empty(&mut tx, "prbs").await?;
    let hiims_empty = table_is_empty(&mut tx, "hiims").await?;

    if !(issues_empty || prbs_empty || hiims_empty) {
        return Ok(());
    }

    #[derive(sqlx::FromRow)]
    struct LegacyRow {
        id: i64,
        issue_description: Option<String>,
        prb_id_number: Option<String>,
        prb_id_status: Option<String>,
        prb_link: Option<String>,
        hiim_id_number: Option<String>,
        hiim_id_status: Option<String>,
        hiim_link: Option<String>,
        created_at: Option<String>,
    }

    let rows = sqlx::query_as::<_, LegacyRow>(
        r#"
        SELECT id, issue_description, prb_id_number, prb_id_status, prb_link,
               hiim_id_number, hiim_id_status, hiim_link, created_at
        FROM entries
        "#,
    )
    .fetch_all(&mut *tx)
    .await?;

    let mut copied = 0usize;
    for row in rows {
        let created_at = row.created_at.unwrap_or_else(|| Utc::now().to_rfc3339());

        if issues_empty {
            if let Some(description) = row.issue_description.filter(|s| !s.is_empty()) {
                sqlx::query(
                    "INSERT INTO issues (entry_id, description, remarks, position, created_at) VALUES (?, ?, '', 0, ?)",
                )
                .bind(row.id)
                .bind(description)
                .bind(&created_at)
                .execute(&mut *tx)
                .await?;
                copied += 1;
            }
        }

        if prbs_empty {
            if let Some(number) = row.prb_id_number.filter(|s| !s.is_empty()) {
                sqlx::query(
                    "INSERT INTO prbs (entry_id, prb_id_number, prb_id_status, prb_link, position, created_at) VALUES (?, ?, ?, ?, 0, ?)",
                )
                .bind(row.id)
                .bind(number)
                .bind(row.prb_id_status.unwrap_or_default())
                .bind(row.prb_link.unwrap_or_default())
                .bind(&created_at)
                .execute(&mut *tx)
                .await?;
                copied += 1;
            }
        }

        if hiims_empty {
            if let Some(number) = row.hiim_id_number.filter(|s| !s.is_empty()) {
                sqlx::query(
                    "INSERT INTO hiims (entry_id, hiim_id_number, hiim_id_status, hiim_link, position, created_at) VALUES (?, ?, ?, ?, 0, ?)",
                )
                .bind(row.id)
                .bind(number)
                .bind(row.hiim_id_status.unwrap_or_default())
                .bind(row.hiim_link.unwrap_or_default())
                .bind(&created_at)
                .execute(&mut *tx)
                .await?;
                copied += 1;
            }
        }
    }

    tx.commit().await?;

    if copied > 0 {
        tracing::info!("Backfilled {} child rows from legacy entry columns", copied);
    }

    Ok(())
}

async fn table_is_empty(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    table: &str,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(1) FROM {}", table))
        .fetch_one(&mut **tx)
        .await?;
    Ok(count == 0)
}

/// Parse SQL statements, properly handling parentheses in CREATE TABLE
fn parse_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut paren_depth: i32 = 0;
    let mut in_string = false;
    let mut in_line_comment = false;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        // Handle line comments
        if c == '-' && chars.peek() == Some(&'-') && !in_string {
            in_line_comment = true;
            continue;
        }
        if in_line_comment {
            if c == '\n' {
                in_line_comment = false;
                current.push(c);
            }
            continue;
        }

        match c {
            '\'' => {
                in_string = !in_string;
                current.push(c);
            }
            '(' if !in_string => {
                paren_depth += 1;
                current.push(c);
            }
            ')' if !in_string => {
                paren_depth = paren_depth.saturating_sub(1);
                current.push(c);
            }
            ';' if !in_string && paren_depth == 0 => {
                let stmt = current.trim().to_string();
                if !stmt.is_empty() && !stmt.starts_with("PRAGMA") {
                    statements.push(stmt);
                }
                current.clear();
            }
            _ => {
                current.push(c);
            }
        }
    }

    // Don't forget the last statement if no trailing semicolon
    let stmt = current.trim().to_string();
    if !stmt.is_empty() && !stmt.starts_with("PRAGMA") {
        statements.push(stmt);
    }

    statements
}

/// Initialize database - create pool and run migrations
pub async fn init_database(database_path: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = create_pool(database_path).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
