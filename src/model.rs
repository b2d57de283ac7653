use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A baby as the analytics core sees it.
///
/// Age is never cached here: every scorer recomputes it from `date_of_birth`
/// and the date it is evaluating, so a profile stays valid forever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BabyProfile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub gender: Option<String>,
}

impl BabyProfile {
    pub fn new(name: impl Into<String>, date_of_birth: NaiveDate, gender: Option<&str>) -> Self {
        Self {
            id: None,
            name: name.into(),
            date_of_birth,
            gender: gender.map(str::to_string),
        }
    }

    pub fn resolved_gender(&self) -> Gender {
        Gender::resolve(self.gender.as_deref())
    }
}

/// Gender used to pick a reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Case-insensitive. Anything other than "female", including a missing
    /// value, resolves to `Male`; the reference tables need one of the two.
    pub fn resolve(raw: Option<&str>) -> Gender {
        match raw.map(|g| g.trim().to_lowercase()) {
            Some(g) if g == "female" => Gender::Female,
            _ => Gender::Male,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// One day of logged data for a baby, plus the scores derived from it.
///
/// The session and milestone lists are kept as the JSON the user supplied.
/// They are only turned into typed sessions while a record is being
/// processed, so a single bad entry never makes the record unloadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub baby_id: Option<i64>,
    pub record_date: NaiveDate,

    /// kg
    pub weight: Option<f64>,
    /// cm
    pub height: Option<f64>,
    /// cm
    pub head_circumference: Option<f64>,

    pub feeding_times: Option<Vec<Value>>,
    /// breast, formula, mixed
    pub feeding_type: Option<String>,
    /// ml
    pub feeding_amount: Option<f64>,

    pub sleep_schedule: Option<Vec<Value>>,
    pub total_sleep_hours: Option<f64>,

    pub diaper_changes: Option<Vec<Value>>,
    pub milestones: Option<Vec<Value>>,
    pub notes: Option<String>,

    #[serde(flatten)]
    pub derived: DerivedScores,
}

impl ProgressRecord {
    pub fn new(record_date: NaiveDate) -> Self {
        Self {
            id: None,
            baby_id: None,
            record_date,
            weight: None,
            height: None,
            head_circumference: None,
            feeding_times: None,
            feeding_type: None,
            feeding_amount: None,
            sleep_schedule: None,
            total_sleep_hours: None,
            diaper_changes: None,
            milestones: None,
            notes: None,
            derived: DerivedScores::default(),
        }
    }

    pub fn has_measurements(&self) -> bool {
        self.weight.is_some() || self.height.is_some() || self.head_circumference.is_some()
    }
}

/// Scores computed by the record processor. Each is in [0, 100] and is
/// `None` when the raw input it depends on is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedScores {
    pub growth_percentile: Option<f64>,
    pub sleep_quality_index: Option<f64>,
    pub feeding_efficiency: Option<f64>,
    pub developmental_score: Option<f64>,
}

/// Body accepted when creating or partially updating a record.
///
/// Each outer `None` is a field the body left out and keeps the stored
/// value. `Some(None)` is an explicit `null` and clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgressInput {
    pub record_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub weight: Option<Option<f64>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub height: Option<Option<f64>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub head_circumference: Option<Option<f64>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub feeding_times: Option<Option<Vec<Value>>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub feeding_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub feeding_amount: Option<Option<f64>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub sleep_schedule: Option<Option<Vec<Value>>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub total_sleep_hours: Option<Option<f64>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub diaper_changes: Option<Option<Vec<Value>>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub milestones: Option<Option<Vec<Value>>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub notes: Option<Option<String>>,
}

impl ProgressInput {
    /// Build a fresh record; `record_date` defaults to `today`.
    pub fn into_record(self, today: NaiveDate) -> ProgressRecord {
        let mut record = ProgressRecord::new(self.record_date.unwrap_or(today));
        self.apply_to(&mut record);
        record
    }

    pub fn apply_to(self, record: &mut ProgressRecord) {
        if let Some(date) = self.record_date {
            record.record_date = date;
        }
        overwrite(&mut record.weight, self.weight);
        overwrite(&mut record.height, self.height);
        overwrite(&mut record.head_circumference, self.head_circumference);
        overwrite(&mut record.feeding_times, self.feeding_times);
        overwrite(&mut record.feeding_type, self.feeding_type);
        overwrite(&mut record.feeding_amount, self.feeding_amount);
        overwrite(&mut record.sleep_schedule, self.sleep_schedule);
        overwrite(&mut record.total_sleep_hours, self.total_sleep_hours);
        overwrite(&mut record.diaper_changes, self.diaper_changes);
        overwrite(&mut record.milestones, self.milestones);
        overwrite(&mut record.notes, self.notes);
    }
}

fn overwrite<T>(slot: &mut Option<T>, value: Option<Option<T>>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Deserialize a present field into `Some`, keeping `null` as `Some(None)`.
/// Use with `#[serde(default)]` so a missing field stays `None`.
pub(crate) fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// --- Typed entries ---
// Produced by `analysis::normalize` from the raw JSON lists above.

#[derive(Debug, Clone, PartialEq)]
pub enum FeedingKind {
    Breast,
    Bottle,
    Other(String),
}

impl FeedingKind {
    pub fn from_label(label: &str) -> FeedingKind {
        match label.trim().to_lowercase().as_str() {
            "breast" => FeedingKind::Breast,
            "bottle" => FeedingKind::Bottle,
            other => FeedingKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedingSession {
    pub start: DateTime<FixedOffset>,
    pub end: Option<DateTime<FixedOffset>>,
    pub kind: FeedingKind,
    /// ml
    pub amount: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SleepQuality {
    Good,
    Fair,
    Poor,
    /// The entry carried `"quality": null`.
    Unrated,
    Other(String),
}

impl SleepQuality {
    pub fn from_label(label: &str) -> SleepQuality {
        match label.trim().to_lowercase().as_str() {
            "good" => SleepQuality::Good,
            "fair" => SleepQuality::Fair,
            "poor" => SleepQuality::Poor,
            other => SleepQuality::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SleepSession {
    pub start: DateTime<FixedOffset>,
    /// `None` for a session that is still ongoing.
    pub end: Option<DateTime<FixedOffset>>,
    /// `None` when the entry has no `quality` key at all.
    pub quality: Option<SleepQuality>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneEntry {
    pub label: String,
    pub achieved_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl MilestoneEntry {
    pub fn new(label: impl Into<String>, achieved_date: Option<NaiveDate>) -> Self {
        Self {
            label: label.into(),
            achieved_date,
            notes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_defaults_to_male() {
        assert_eq!(Gender::resolve(None), Gender::Male);
        assert_eq!(Gender::resolve(Some("")), Gender::Male);
        assert_eq!(Gender::resolve(Some("unknown")), Gender::Male);
        assert_eq!(Gender::resolve(Some("FEMALE")), Gender::Female);
        assert_eq!(Gender::resolve(Some(" Female ")), Gender::Female);
    }

    #[test]
    fn record_json_roundtrip_keeps_derived_fields_flat() {
        let mut record = ProgressRecord::new(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        record.weight = Some(4.8);
        record.derived.growth_percentile = Some(42.5);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["growth_percentile"], 42.5);
        assert!(json.get("derived").is_none());

        let loaded: ProgressRecord = serde_json::from_value(json).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn partial_update_only_overwrites_present_fields() {
        let mut record = ProgressRecord::new(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        record.weight = Some(4.8);
        record.height = Some(55.0);

        let update: ProgressInput = serde_json::from_str(r#"{ "weight": 5.0 }"#).unwrap();
        update.apply_to(&mut record);

        assert_eq!(record.weight, Some(5.0));
        assert_eq!(record.height, Some(55.0));
    }

    #[test]
    fn partial_update_null_clears_field() {
        let mut record = ProgressRecord::new(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        record.weight = Some(50.0);
        record.height = Some(55.0);
        record.notes = Some("typo".into());

        let update: ProgressInput =
            serde_json::from_str(r#"{ "weight": null, "notes": null }"#).unwrap();
        assert_eq!(update.weight, Some(None));
        assert_eq!(update.height, None);
        update.apply_to(&mut record);

        assert_eq!(record.weight, None);
        assert_eq!(record.notes, None);
        assert_eq!(record.height, Some(55.0));
    }

    #[test]
    fn input_defaults_record_date_to_today() {
        let today = NaiveDate::from_ymd_opt(2026, 4, 2).unwrap();
        let record = ProgressInput::default().into_record(today);
        assert_eq!(record.record_date, today);
    }

    #[test]
    fn input_rejects_unknown_fields() {
        let parsed: Result<ProgressInput, _> = serde_json::from_str(r#"{ "wieght": 5.0 }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn labels_are_case_insensitive() {
        assert_eq!(FeedingKind::from_label("Bottle"), FeedingKind::Bottle);
        assert_eq!(SleepQuality::from_label(" FAIR "), SleepQuality::Fair);
        assert_eq!(
            SleepQuality::from_label("restless"),
            SleepQuality::Other("restless".into())
        );
    }
}
