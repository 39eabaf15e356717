// src/db.rs - Database migrations and setup

use sqlx::SqlitePool;
use anyhow::Result;
use strum::IntoEnumIterator;
use crate::models::ResultKind;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Enable foreign keys and WAL mode
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS patients (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL CHECK(length(name) > 0 AND length(name) <= 255),
            date_of_birth TEXT,
            gender TEXT NOT NULL CHECK(gender IN ('Male', 'Female')),
            company TEXT CHECK(company IS NULL OR length(company) <= 255),
            address TEXT CHECK(address IS NULL OR length(address) <= 255),
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    )
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kits (
            id TEXT PRIMARY KEY,
            kit_name TEXT NOT NULL CHECK(length(kit_name) > 0 AND length(kit_name) <= 255),
            kit_types TEXT CHECK(kit_types IS NULL OR length(kit_types) <= 255),
            kit_lot_no TEXT CHECK(kit_lot_no IS NULL OR length(kit_lot_no) <= 255),
            kit_expiration_date TEXT,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    )
        .execute(pool)
        .await?;

    for kind in ResultKind::iter() {
        sqlx::query(&result_table_sql(kind))
            .execute(pool)
            .await?;
    }

    migrate_existing_tables(pool).await?;

    // ==================== CREATE INDEXES ====================

    let mut index_queries = vec![
        "CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_patients_company ON patients(company)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_patients_created_at ON patients(created_at)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_kits_kit_name ON kits(kit_name)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_kits_kit_lot_no ON kits(kit_lot_no)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_kits_created_at ON kits(created_at)".to_string(),
    ];
    for kind in ResultKind::iter() {
        let table = kind.table_name();
        index_queries.push(format!(
            "CREATE INDEX IF NOT EXISTS idx_{0}_patient_id ON {0}(patient_id)",
            table
        ));
        index_queries.push(format!(
            "CREATE INDEX IF NOT EXISTS idx_{0}_created_at ON {0}(created_at)",
            table
        ));
        if kind.links_kit() {
            index_queries.push(format!(
                "CREATE INDEX IF NOT EXISTS idx_{0}_kit_id ON {0}(kit_id)",
                table
            ));
        }
    }

    for query in &index_queries {
        sqlx::query(query).execute(pool).await?;
    }

    log::info!("Database migrations completed");
    Ok(())
}

const KIT_LINK_COLUMN: &str = "TEXT REFERENCES kits(id) ON DELETE SET NULL";

/// DDL for one result category, derived from its schema table.
pub fn result_table_sql(kind: ResultKind) -> String {
    let mut columns = vec![
        "id TEXT PRIMARY KEY".to_string(),
        "patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE".to_string(),
    ];
    if kind.links_kit() {
        columns.push(format!("kit_id {}", KIT_LINK_COLUMN));
    }
    columns.push("medical_technologist TEXT".to_string());
    columns.push("reported_at TEXT".to_string());
    for spec in kind.schema() {
        columns.push(format!("{} TEXT", spec.name));
    }
    columns.push("created_at DATETIME NOT NULL".to_string());
    columns.push("updated_at DATETIME NOT NULL".to_string());

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        kind.table_name(),
        columns.join(",\n    ")
    )
}

// ==================== MIGRATION FOR EXISTING DATABASES ====================

/// Adds columns that an older database file does not have yet, including the kit link
/// of tables created before results referenced the kit registry.
pub async fn migrate_existing_tables(pool: &SqlitePool) -> Result<()> {
    for kind in ResultKind::iter() {
        let existing = get_table_columns(pool, kind.table_name()).await?;
        let mut wanted: Vec<(&str, &str)> = Vec::new();
        if kind.links_kit() {
            wanted.push(("kit_id", KIT_LINK_COLUMN));
        }
        wanted.push(("medical_technologist", "TEXT"));
        wanted.push(("reported_at", "TEXT"));
        wanted.extend(kind.schema().iter().map(|spec| (spec.name, "TEXT")));

        for (column, definition) in wanted {
            if !existing.iter().any(|c| c == column) {
                log::info!("Adding column {}.{}", kind.table_name(), column);
                sqlx::query(&format!(
                    "ALTER TABLE {} ADD COLUMN {} {}",
                    kind.table_name(),
                    column,
                    definition
                ))
                    .execute(pool)
                    .await?;
            }
        }
    }

    Ok(())
}

// ==================== UTILITY FUNCTIONS ====================

pub async fn get_table_columns(pool: &SqlitePool, table: &str) -> Result<Vec<String>> {
    let query = format!("SELECT name FROM pragma_table_info('{}')", table);
    let rows: Vec<(String,)> = sqlx::query_as(&query)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|r| r.0).collect())
}
