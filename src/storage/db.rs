use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::model::{BabyProfile, DerivedScores, ProgressRecord};

/// Open (or create) the SQLite database at the configured path.
pub fn open_db() -> Result<Connection> {
    open_db_at(&crate::paths::db_path())
}

pub fn open_db_at(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database: {}", path.display()))?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("Failed to set database pragmas")?;

    init_schema(&conn)?;
    Ok(conn)
}

/// Create tables if they don't exist. Idempotent.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS babies (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            date_of_birth TEXT NOT NULL,
            gender TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS progress (
            id INTEGER PRIMARY KEY,
            baby_id INTEGER NOT NULL REFERENCES babies(id) ON DELETE CASCADE,
            record_date TEXT NOT NULL,
            weight REAL,
            height REAL,
            head_circumference REAL,
            feeding_times TEXT,
            feeding_type TEXT,
            feeding_amount REAL,
            sleep_schedule TEXT,
            total_sleep_hours REAL,
            diaper_changes TEXT,
            milestones TEXT,
            notes TEXT,
            growth_percentile REAL,
            sleep_quality_index REAL,
            feeding_efficiency REAL,
            developmental_score REAL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT,
            UNIQUE(baby_id, record_date)
        );",
    )
    .context("Failed to initialize database schema")?;

    Ok(())
}

// --- Babies ---

pub fn insert_baby(conn: &Connection, baby: &BabyProfile) -> Result<i64> {
    conn.execute(
        "INSERT INTO babies (name, date_of_birth, gender) VALUES (?1, ?2, ?3)",
        params![baby.name, baby.date_of_birth.to_string(), baby.gender],
    )
    .context("Failed to insert baby")?;

    Ok(conn.last_insert_rowid())
}

pub fn get_baby(conn: &Connection, id: i64) -> Result<BabyProfile> {
    let row = conn
        .query_row(
            "SELECT id, name, date_of_birth, gender FROM babies WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            },
        )
        .optional()
        .context("Failed to query baby")?;

    let Some((id, name, dob, gender)) = row else {
        bail!("No baby found with id {id}");
    };

    Ok(BabyProfile {
        id: Some(id),
        name,
        date_of_birth: parse_stored_date(&dob)?,
        gender,
    })
}

/// All babies, ordered by id.
pub fn list_babies(conn: &Connection) -> Result<Vec<BabyProfile>> {
    let mut stmt = conn
        .prepare("SELECT id FROM babies ORDER BY id")
        .context("Failed to prepare baby list query")?;

    let ids = stmt
        .query_map([], |row| row.get::<_, i64>(0))
        .context("Failed to list babies")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read baby row")?;

    ids.into_iter().map(|id| get_baby(conn, id)).collect()
}

pub fn update_baby(conn: &Connection, baby: &BabyProfile) -> Result<()> {
    let Some(id) = baby.id else {
        bail!("Cannot update a baby that was never saved");
    };

    let changed = conn
        .execute(
            "UPDATE babies SET name = ?2, date_of_birth = ?3, gender = ?4 WHERE id = ?1",
            params![id, baby.name, baby.date_of_birth.to_string(), baby.gender],
        )
        .context("Failed to update baby")?;

    if changed == 0 {
        bail!("No baby found with id {id}");
    }
    Ok(())
}

/// Delete a baby and, through the foreign key, all of its records.
pub fn delete_baby(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn
        .execute("DELETE FROM babies WHERE id = ?1", [id])
        .context("Failed to delete baby")?;

    if changed == 0 {
        bail!("No baby found with id {id}");
    }
    Ok(())
}

// --- Progress records ---

const PROGRESS_COLUMNS: &str = "id, baby_id, record_date, weight, height, head_circumference, \
    feeding_times, feeding_type, feeding_amount, sleep_schedule, total_sleep_hours, \
    diaper_changes, milestones, notes, \
    growth_percentile, sleep_quality_index, feeding_efficiency, developmental_score";

/// Filters for listing records. Results come back newest first.
#[derive(Debug, Clone, Default)]
pub struct ProgressQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub skip: usize,
    pub limit: Option<usize>,
}

/// A progress row as SQLite hands it back, before the JSON columns and the
/// date are parsed.
struct ProgressRow {
    id: i64,
    baby_id: i64,
    record_date: String,
    weight: Option<f64>,
    height: Option<f64>,
    head_circumference: Option<f64>,
    feeding_times: Option<String>,
    feeding_type: Option<String>,
    feeding_amount: Option<f64>,
    sleep_schedule: Option<String>,
    total_sleep_hours: Option<f64>,
    diaper_changes: Option<String>,
    milestones: Option<String>,
    notes: Option<String>,
    derived: DerivedScores,
}

impl ProgressRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            baby_id: row.get(1)?,
            record_date: row.get(2)?,
            weight: row.get(3)?,
            height: row.get(4)?,
            head_circumference: row.get(5)?,
            feeding_times: row.get(6)?,
            feeding_type: row.get(7)?,
            feeding_amount: row.get(8)?,
            sleep_schedule: row.get(9)?,
            total_sleep_hours: row.get(10)?,
            diaper_changes: row.get(11)?,
            milestones: row.get(12)?,
            notes: row.get(13)?,
            derived: DerivedScores {
                growth_percentile: row.get(14)?,
                sleep_quality_index: row.get(15)?,
                feeding_efficiency: row.get(16)?,
                developmental_score: row.get(17)?,
            },
        })
    }

    fn into_record(self) -> Result<ProgressRecord> {
        Ok(ProgressRecord {
            id: Some(self.id),
            baby_id: Some(self.baby_id),
            record_date: parse_stored_date(&self.record_date)?,
            weight: self.weight,
            height: self.height,
            head_circumference: self.head_circumference,
            feeding_times: decode_list(self.feeding_times, "feeding_times")?,
            feeding_type: self.feeding_type,
            feeding_amount: self.feeding_amount,
            sleep_schedule: decode_list(self.sleep_schedule, "sleep_schedule")?,
            total_sleep_hours: self.total_sleep_hours,
            diaper_changes: decode_list(self.diaper_changes, "diaper_changes")?,
            milestones: decode_list(self.milestones, "milestones")?,
            notes: self.notes,
            derived: self.derived,
        })
    }
}

fn parse_stored_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid date stored in database: {raw}"))
}

fn encode_list(list: &Option<Vec<Value>>, column: &str) -> Result<Option<String>> {
    list.as_ref()
        .map(serde_json::to_string)
        .transpose()
        .with_context(|| format!("Failed to serialize {column}"))
}

fn decode_list(raw: Option<String>, column: &str) -> Result<Option<Vec<Value>>> {
    raw.map(|json| serde_json::from_str(&json))
        .transpose()
        .with_context(|| format!("Failed to parse stored {column}"))
}

fn date_taken(
    conn: &Connection,
    baby_id: i64,
    date: NaiveDate,
    except_id: Option<i64>,
) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM progress
            WHERE baby_id = ?1 AND record_date = ?2 AND id IS NOT ?3)",
        params![baby_id, date.to_string(), except_id],
        |row| row.get(0),
    )
    .context("Failed to check for an existing record")
}

/// Store a new record for `baby_id`. At most one record per baby per day.
pub fn insert_progress(conn: &Connection, baby_id: i64, record: &ProgressRecord) -> Result<i64> {
    if date_taken(conn, baby_id, record.record_date, None)? {
        bail!(
            "A progress record for {} already exists for baby {baby_id}",
            record.record_date
        );
    }

    let d = &record.derived;
    conn.execute(
        "INSERT INTO progress (
            baby_id, record_date, weight, height, head_circumference,
            feeding_times, feeding_type, feeding_amount, sleep_schedule, total_sleep_hours,
            diaper_changes, milestones, notes,
            growth_percentile, sleep_quality_index, feeding_efficiency, developmental_score
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            baby_id,
            record.record_date.to_string(),
            record.weight,
            record.height,
            record.head_circumference,
            encode_list(&record.feeding_times, "feeding_times")?,
            record.feeding_type,
            record.feeding_amount,
            encode_list(&record.sleep_schedule, "sleep_schedule")?,
            record.total_sleep_hours,
            encode_list(&record.diaper_changes, "diaper_changes")?,
            encode_list(&record.milestones, "milestones")?,
            record.notes,
            d.growth_percentile,
            d.sleep_quality_index,
            d.feeding_efficiency,
            d.developmental_score,
        ],
    )
    .context("Failed to insert progress record")?;

    Ok(conn.last_insert_rowid())
}

pub fn get_progress(conn: &Connection, baby_id: i64, record_id: i64) -> Result<ProgressRecord> {
    let row = conn
        .query_row(
            &format!("SELECT {PROGRESS_COLUMNS} FROM progress WHERE id = ?1 AND baby_id = ?2"),
            [record_id, baby_id],
            ProgressRow::from_row,
        )
        .optional()
        .context("Failed to query progress record")?;

    match row {
        Some(row) => row.into_record(),
        None => bail!("No progress record {record_id} for baby {baby_id}"),
    }
}

/// Overwrite a stored record with `record`, including its derived scores.
pub fn update_progress(conn: &Connection, record: &ProgressRecord) -> Result<()> {
    let (Some(id), Some(baby_id)) = (record.id, record.baby_id) else {
        bail!("Cannot update a progress record that was never saved");
    };

    if date_taken(conn, baby_id, record.record_date, Some(id))? {
        bail!(
            "A progress record for {} already exists for baby {baby_id}",
            record.record_date
        );
    }

    let d = &record.derived;
    let changed = conn
        .execute(
            "UPDATE progress SET
                record_date = ?3, weight = ?4, height = ?5, head_circumference = ?6,
                feeding_times = ?7, feeding_type = ?8, feeding_amount = ?9,
                sleep_schedule = ?10, total_sleep_hours = ?11, diaper_changes = ?12,
                milestones = ?13, notes = ?14,
                growth_percentile = ?15, sleep_quality_index = ?16,
                feeding_efficiency = ?17, developmental_score = ?18,
                updated_at = datetime('now')
             WHERE id = ?1 AND baby_id = ?2",
            params![
                id,
                baby_id,
                record.record_date.to_string(),
                record.weight,
                record.height,
                record.head_circumference,
                encode_list(&record.feeding_times, "feeding_times")?,
                record.feeding_type,
                record.feeding_amount,
                encode_list(&record.sleep_schedule, "sleep_schedule")?,
                record.total_sleep_hours,
                encode_list(&record.diaper_changes, "diaper_changes")?,
                encode_list(&record.milestones, "milestones")?,
                record.notes,
                d.growth_percentile,
                d.sleep_quality_index,
                d.feeding_efficiency,
                d.developmental_score,
            ],
        )
        .context("Failed to update progress record")?;

    if changed == 0 {
        bail!("No progress record {id} for baby {baby_id}");
    }
    Ok(())
}

pub fn delete_progress(conn: &Connection, baby_id: i64, record_id: i64) -> Result<()> {
    let changed = conn
        .execute(
            "DELETE FROM progress WHERE id = ?1 AND baby_id = ?2",
            [record_id, baby_id],
        )
        .context("Failed to delete progress record")?;

    if changed == 0 {
        bail!("No progress record {record_id} for baby {baby_id}");
    }
    Ok(())
}

/// Records for a baby matching `query`, newest first.
pub fn list_progress(
    conn: &Connection,
    baby_id: i64,
    query: &ProgressQuery,
) -> Result<Vec<ProgressRecord>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress
             WHERE baby_id = ?1
               AND (?2 IS NULL OR record_date >= ?2)
               AND (?3 IS NULL OR record_date <= ?3)
             ORDER BY record_date DESC, id DESC
             LIMIT ?4 OFFSET ?5"
        ))
        .context("Failed to prepare progress list query")?;

    // SQLite reads a negative LIMIT as "no limit"
    let limit = query.limit.map_or(-1, |l| l as i64);

    let rows = stmt
        .query_map(
            params![
                baby_id,
                query.from.map(|d| d.to_string()),
                query.to.map(|d| d.to_string()),
                limit,
                query.skip as i64,
            ],
            ProgressRow::from_row,
        )
        .context("Failed to list progress records")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read progress row")?;

    rows.into_iter().map(ProgressRow::into_record).collect()
}

/// Records dated on or after `since` (all records when `None`), oldest first.
pub fn progress_since(
    conn: &Connection,
    baby_id: i64,
    since: Option<NaiveDate>,
) -> Result<Vec<ProgressRecord>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress
             WHERE baby_id = ?1 AND (?2 IS NULL OR record_date >= ?2)
             ORDER BY record_date ASC, id ASC"
        ))
        .context("Failed to prepare progress range query")?;

    let rows = stmt
        .query_map(
            params![baby_id, since.map(|d| d.to_string())],
            ProgressRow::from_row,
        )
        .context("Failed to query progress records")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read progress row")?;

    rows.into_iter().map(ProgressRow::into_record).collect()
}
