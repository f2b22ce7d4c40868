use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::snapshot::migrations::BASE_MIGRATION;
use crate::snapshot::{DeltaFields, Provenance, Snapshot, TroubleReason};

const SELECT_COLUMNS: &str = r#"
SELECT product_name, api_code, spread, percent_bid, fixed_ask, percent_ask, fixed_bid,
       match_score, trouble_reasons
FROM prior_readings
"#;

/// Current reading per product, one row per API code.
pub struct SnapshotStore {
    conn: Connection,
}

impl SnapshotStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed opening snapshot store: {}", path.display()))?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.migrate()?;
        Ok(store)
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(BASE_MIGRATION)?;
        Ok(())
    }

    pub fn get(&self, api_code: &str) -> Result<Option<Snapshot>> {
        let sql = format!("{SELECT_COLUMNS} WHERE api_code = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let snapshot = stmt
            .query_row(params![api_code], row_to_snapshot)
            .optional()?;
        Ok(snapshot)
    }

    /// All rows in insertion order.
    pub fn load_all(&self) -> Result<Vec<Snapshot>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], row_to_snapshot)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM prior_readings", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Updates the existing row for the code in place or inserts a new one.
    /// Returns the row id.
    pub fn upsert(&self, snapshot: &Snapshot) -> Result<i64> {
        upsert_with(&self.conn, snapshot)
    }

    pub fn upsert_all(&self, snapshots: &[Snapshot]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for snapshot in snapshots {
            upsert_with(&tx, snapshot)
                .with_context(|| format!("failed upserting {}", snapshot.api_code))?;
        }
        tx.commit()?;
        Ok(snapshots.len())
    }
}

fn upsert_with(conn: &Connection, snapshot: &Snapshot) -> Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM prior_readings WHERE api_code = ?1",
            params![snapshot.api_code],
            |row| row.get(0),
        )
        .optional()?;

    let reasons = snapshot
        .provenance
        .reasons
        .iter()
        .map(TroubleReason::as_slug)
        .collect::<Vec<_>>()
        .join(",");
    let mix = snapshot.percent_fixed_mix().map(|m| m.as_str());
    let updated_at = Utc::now().to_rfc3339();

    match existing {
        Some(id) => {
            conn.execute(
                r#"
UPDATE prior_readings
SET product_name = ?1, spread = ?2, percent_bid = ?3, fixed_ask = ?4, percent_ask = ?5,
    fixed_bid = ?6, match_score = ?7, is_troublesome = ?8, trouble_reasons = ?9,
    percent_fixed_mix = ?10, updated_at = ?11
WHERE id = ?12
"#,
                params![
                    snapshot.product_name,
                    snapshot.spread,
                    snapshot.deltas.percent_bid,
                    snapshot.deltas.fixed_ask,
                    snapshot.deltas.percent_ask,
                    snapshot.deltas.fixed_bid,
                    snapshot.provenance.match_score,
                    if snapshot.is_troublesome() { 1 } else { 0 },
                    reasons,
                    mix,
                    updated_at,
                    id
                ],
            )?;
            Ok(id)
        }
        None => {
            conn.execute(
                r#"
INSERT INTO prior_readings(
    product_name, api_code, spread, percent_bid, fixed_ask, percent_ask, fixed_bid,
    match_score, is_troublesome, trouble_reasons, percent_fixed_mix, updated_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
"#,
                params![
                    snapshot.product_name,
                    snapshot.api_code,
                    snapshot.spread,
                    snapshot.deltas.percent_bid,
                    snapshot.deltas.fixed_ask,
                    snapshot.deltas.percent_ask,
                    snapshot.deltas.fixed_bid,
                    snapshot.provenance.match_score,
                    if snapshot.is_troublesome() { 1 } else { 0 },
                    reasons,
                    mix,
                    updated_at
                ],
            )?;
            Ok(conn.last_insert_rowid())
        }
    }
}

// percent_fixed_mix and is_troublesome are derived, so the stored copies are not read back.
fn row_to_snapshot(row: &rusqlite::Row<'_>) -> rusqlite::Result<Snapshot> {
    let reasons_raw: String = row.get(8)?;
    let reasons = reasons_raw
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| s.parse::<TroubleReason>().ok())
        .collect();
    Ok(Snapshot {
        product_name: row.get(0)?,
        api_code: row.get(1)?,
        spread: row.get(2)?,
        deltas: DeltaFields {
            percent_bid: row.get(3)?,
            fixed_ask: row.get(4)?,
            percent_ask: row.get(5)?,
            fixed_bid: row.get(6)?,
        },
        provenance: Provenance {
            match_score: row.get(7)?,
            reasons,
        },
    })
}
