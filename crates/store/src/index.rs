// SQLite index layout and rebuild

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::error::StoreError;
use crate::record::Pokemon;
use crate::SCHEMA_VERSION;

pub const TABLE: &str = "pokemon";

// UNIQUE gives name and species_id their own indexes
const SCHEMA: &str = r#"
DROP TABLE IF EXISTS pokemon;

CREATE TABLE pokemon (
    name TEXT NOT NULL UNIQUE,
    species_id INTEGER NOT NULL UNIQUE,
    height REAL NOT NULL,
    weight REAL NOT NULL,
    type_1 TEXT NOT NULL,
    type_2 TEXT NOT NULL DEFAULT '',    -- '' = single-typed
    url_image TEXT,                     -- NULL = no image
    generation_id INTEGER NOT NULL,
    evolves_from_species_id TEXT        -- raw source text
);

CREATE INDEX pokemon_type_1 ON pokemon (type_1);
CREATE INDEX pokemon_type_2 ON pokemon (type_2);

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

DELETE FROM meta;
"#;

pub(crate) const SELECT_COLUMNS: &str = "name, species_id, height, weight, type_1, type_2, url_image, generation_id, evolves_from_species_id";

const META_SCHEMA_VERSION: &str = "schema_version";
const META_SOURCE: &str = "source";
const META_RECORD_COUNT: &str = "record_count";
const META_LOADED_AT: &str = "loaded_at";
const META_FINGERPRINT: &str = "source_fingerprint";

/// What the index was last built from.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfo {
    pub source: String,
    pub record_count: usize,
    pub loaded_at: DateTime<Utc>,
    /// BLAKE3 hex digest of the source file at load time.
    pub fingerprint: String,
}

/// Drop and recreate the table, then insert every record.
///
/// Runs inside the caller's transaction; nothing is visible until it commits.
pub(crate) fn rebuild(tx: &Transaction<'_>, records: &[Pokemon], info: &IndexInfo) -> Result<(), StoreError> {
    tx.execute_batch(SCHEMA)?;

    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO pokemon ({SELECT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        ))?;

        for p in records {
            stmt.execute(params![
                p.name,
                p.species_id,
                p.height,
                p.weight,
                p.type_1,
                p.type_2,
                p.image,
                p.generation_id,
                p.evolves_from,
            ])?;
        }
    }

    let meta = [
        (META_SCHEMA_VERSION, SCHEMA_VERSION.to_string()),
        (META_SOURCE, info.source.clone()),
        (META_RECORD_COUNT, info.record_count.to_string()),
        (META_LOADED_AT, info.loaded_at.to_rfc3339()),
        (META_FINGERPRINT, info.fingerprint.clone()),
    ];
    for (key, value) in meta {
        tx.execute("INSERT INTO meta (key, value) VALUES (?1, ?2)", params![key, value])?;
    }

    Ok(())
}

pub(crate) fn table_exists(conn: &Connection, name: &str) -> Result<bool, StoreError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [name],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn meta_value(conn: &Connection, key: &str) -> Result<Option<String>, StoreError> {
    if !table_exists(conn, "meta")? {
        return Ok(None);
    }
    let value = conn
        .query_row("SELECT value FROM meta WHERE key = ?1", [key], |row| row.get(0))
        .optional()?;
    Ok(value)
}

pub(crate) fn schema_version(conn: &Connection) -> Result<Option<u32>, StoreError> {
    Ok(meta_value(conn, META_SCHEMA_VERSION)?.and_then(|v| v.parse().ok()))
}

/// Load metadata, or `None` for an index that was never built by this version.
pub(crate) fn read_info(conn: &Connection) -> Result<Option<IndexInfo>, StoreError> {
    if schema_version(conn)? != Some(SCHEMA_VERSION) {
        return Ok(None);
    }

    let field = |key: &str| -> Result<String, StoreError> {
        meta_value(conn, key)?.ok_or_else(|| StoreError::Database(format!("index metadata missing '{key}'")))
    };

    let record_count = field(META_RECORD_COUNT)?
        .parse()
        .map_err(|e| StoreError::Database(format!("bad record_count in index metadata: {e}")))?;
    let loaded_at = DateTime::parse_from_rfc3339(&field(META_LOADED_AT)?)
        .map_err(|e| StoreError::Database(format!("bad loaded_at in index metadata: {e}")))?
        .with_timezone(&Utc);

    Ok(Some(IndexInfo {
        source: field(META_SOURCE)?,
        record_count,
        loaded_at,
        fingerprint: field(META_FINGERPRINT)?,
    }))
}
