use anyhow::Result;
use chrono::NaiveDate;

use super::db;
use crate::model::{BabyProfile, ProgressRecord};

/// List all babies in the default database.
pub fn list_babies() -> Result<Vec<BabyProfile>> {
    let conn = db::open_db()?;
    db::list_babies(&conn)
}

/// Load one stored record.
pub fn load_progress(baby_id: i64, record_id: i64) -> Result<ProgressRecord> {
    let conn = db::open_db()?;
    db::get_progress(&conn, baby_id, record_id)
}

/// Load a baby and its records dated on or after `since`, oldest first.
pub fn load_history(
    baby_id: i64,
    since: Option<NaiveDate>,
) -> Result<(BabyProfile, Vec<ProgressRecord>)> {
    let conn = db::open_db()?;
    let baby = db::get_baby(&conn, baby_id)?;
    let records = db::progress_since(&conn, baby_id, since)?;
    Ok((baby, records))
}
