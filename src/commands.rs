use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate};
use console::style;

use babytrack::analysis::age::age_in_months;
use babytrack::analysis::insights::{aggregate, Insights, InsightsSummary};
use babytrack::analysis::{Engine, Timeframe};
use babytrack::config::{self, AppConfig};
use babytrack::error::AnalyticsError;
use babytrack::model::{BabyProfile, DerivedScores, ProgressInput};
use babytrack::storage::db::{self, ProgressQuery};
use babytrack::storage::store;
use babytrack::{paths, report};

use crate::cli::{BabyCommand, ProgressCommand};
use crate::util;

fn engine(config: &AppConfig) -> Result<Engine> {
    Ok(Engine::new(config::load_reference(config)?)?)
}

fn timeframe(arg: Option<&str>, config: &AppConfig) -> Result<Timeframe> {
    match arg {
        Some(s) => Ok(s.parse()?),
        None => Ok(config.insights.default_timeframe),
    }
}

fn now() -> DateTime<FixedOffset> {
    chrono::Local::now().fixed_offset()
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn parse_input(source: &str) -> Result<ProgressInput> {
    let json = util::read_input(source)?;
    serde_json::from_str(&json).with_context(|| format!("Invalid progress record in {source}"))
}

// --- Babies ---

pub fn baby(action: BabyCommand, config: &AppConfig) -> Result<()> {
    match action {
        BabyCommand::Add { name, born, gender } => {
            let born = util::resolve_date(Some(&born))?;
            let baby = BabyProfile::new(name, born, gender.as_deref());
            let conn = db::open_db()?;
            let id = db::insert_baby(&conn, &baby)?;
            println!(
                "Added {} (id {})",
                style(&baby.name).cyan(),
                style(id).bold()
            );
            Ok(())
        }

        BabyCommand::List => {
            let babies = store::list_babies()?;
            if babies.is_empty() {
                println!("No babies yet. Add one with `babytrack baby add`.");
                return Ok(());
            }
            let today = today();
            for b in babies {
                println!(
                    "  {:>4}  {:<20} born {} ({} months)",
                    b.id.unwrap_or_default(),
                    b.name,
                    b.date_of_birth,
                    age_in_months(b.date_of_birth, today)
                );
            }
            Ok(())
        }

        BabyCommand::Show { id } => {
            let (baby, records) = store::load_history(id, None)?;
            println!("{}", style(&baby.name).cyan().bold());
            println!("  Born:     {}", baby.date_of_birth);
            println!("  Age:      {} months", age_in_months(baby.date_of_birth, today()));
            println!(
                "  Gender:   {} (tables: {})",
                baby.gender.as_deref().unwrap_or("unspecified"),
                baby.resolved_gender().as_str()
            );
            println!("  Records:  {}", records.len());
            Ok(())
        }

        BabyCommand::Update {
            id,
            name,
            born,
            gender,
        } => {
            let engine = engine(config)?;
            let mut conn = db::open_db()?;
            let tx = conn.transaction().context("Failed to start transaction")?;

            let mut baby = db::get_baby(&tx, id)?;
            if let Some(name) = name {
                baby.name = name;
            }
            if let Some(born) = born {
                baby.date_of_birth = util::resolve_date(Some(&born))?;
            }
            if let Some(gender) = gender {
                baby.gender = Some(gender);
            }
            db::update_baby(&tx, &baby)?;

            // Derived scores depend on birth date and gender.
            let records = db::progress_since(&tx, id, None)?;
            let now = now();
            for mut record in records {
                engine.process(&mut record, &baby, now)?;
                db::update_progress(&tx, &record)?;
            }
            tx.commit().context("Failed to commit baby update")?;

            println!("Updated {} and rescored its records", style(&baby.name).cyan());
            Ok(())
        }

        BabyCommand::Remove { id } => {
            let conn = db::open_db()?;
            db::delete_baby(&conn, id)?;
            println!("Removed baby {id} and its records");
            Ok(())
        }
    }
}

// --- Progress records ---

pub fn progress(action: ProgressCommand, config: &AppConfig) -> Result<()> {
    match action {
        ProgressCommand::Add { baby_id, file } => {
            let input = parse_input(&file)?;
            let engine = engine(config)?;
            let conn = db::open_db()?;
            let baby = db::get_baby(&conn, baby_id)?;

            let mut record = input.into_record(today());
            let issues = engine.process(&mut record, &baby, now())?;
            let id = db::insert_progress(&conn, baby_id, &record)?;

            println!(
                "Saved record {} for {}",
                style(id).bold(),
                style(record.record_date).cyan()
            );
            print_scores(&record.derived);
            print_issues(&issues);
            Ok(())
        }

        ProgressCommand::Update {
            baby_id,
            record_id,
            file,
        } => {
            let input = parse_input(&file)?;
            let engine = engine(config)?;
            let conn = db::open_db()?;
            let baby = db::get_baby(&conn, baby_id)?;

            let mut record = db::get_progress(&conn, baby_id, record_id)?;
            input.apply_to(&mut record);
            let issues = engine.process(&mut record, &baby, now())?;
            db::update_progress(&conn, &record)?;

            println!("Updated record {}", style(record_id).bold());
            print_scores(&record.derived);
            print_issues(&issues);
            Ok(())
        }

        ProgressCommand::List {
            baby_id,
            from,
            to,
            skip,
            limit,
        } => {
            let query = ProgressQuery {
                from: util::optional_date(from.as_deref())?,
                to: util::optional_date(to.as_deref())?,
                skip,
                limit,
            };
            let conn = db::open_db()?;
            db::get_baby(&conn, baby_id)?;
            let records = db::list_progress(&conn, baby_id, &query)?;

            if records.is_empty() {
                println!("No progress records found.");
                return Ok(());
            }
            println!(
                "  {:>4}  {:<10}  {:>7}  {:>6}  {:>6}  {:>6}  {:>6}",
                "id", "date", "weight", "growth", "sleep", "feed", "dev"
            );
            for r in records {
                let d = &r.derived;
                println!(
                    "  {:>4}  {:<10}  {:>7}  {:>6}  {:>6}  {:>6}  {:>6}",
                    r.id.unwrap_or_default(),
                    r.record_date,
                    fmt_opt(r.weight, 2),
                    fmt_opt(d.growth_percentile, 1),
                    fmt_opt(d.sleep_quality_index, 1),
                    fmt_opt(d.feeding_efficiency, 1),
                    fmt_opt(d.developmental_score, 1),
                );
            }
            Ok(())
        }

        ProgressCommand::Show { baby_id, record_id } => {
            let record = store::load_progress(baby_id, record_id)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }

        ProgressCommand::Remove { baby_id, record_id } => {
            let conn = db::open_db()?;
            db::delete_progress(&conn, baby_id, record_id)?;
            println!("Removed record {record_id}");
            Ok(())
        }
    }
}

// --- Insights, scoring, reports ---

pub fn insights(baby_id: i64, tf: Option<&str>, json: bool, config: &AppConfig) -> Result<()> {
    let timeframe = timeframe(tf, config)?;
    let today = today();
    let (baby, records) = store::load_history(baby_id, timeframe.cutoff(today))?;
    let summary = aggregate(&baby, &records, timeframe, today);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    match &summary {
        InsightsSummary::NoData { message, .. } => println!("{message}."),
        InsightsSummary::Available { baby_name, insights } => print_insights(baby_name, insights),
    }
    Ok(())
}

pub fn score(baby_file: &str, record_file: &str, now: Option<&str>, config: &AppConfig) -> Result<()> {
    let baby: BabyProfile = serde_json::from_str(&util::read_input(baby_file)?)
        .with_context(|| format!("Invalid baby profile in {baby_file}"))?;
    let input = parse_input(record_file)?;
    let now = util::resolve_now(now)?;

    let record = input.into_record(now.date_naive());
    let breakdown = engine(config)?.breakdown(&record, &baby, now)?;

    let issues: Vec<String> = breakdown.issues.iter().map(ToString::to_string).collect();
    let out = serde_json::json!({
        "record_date": record.record_date,
        "derived": breakdown.derived(),
        "breakdown": breakdown,
        "issues": issues,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

pub fn report(baby_id: i64, tf: Option<&str>, config: &AppConfig) -> Result<()> {
    let timeframe = timeframe(tf, config)?;
    report::generate_full_report(config, baby_id, timeframe, today())?;
    Ok(())
}

pub fn reference(output: Option<&str>, config: &AppConfig) -> Result<()> {
    let reference = config::load_reference(config)?;
    let toml = toml::to_string_pretty(&reference).context("Failed to serialize reference tables")?;

    match output {
        Some(path) => {
            std::fs::write(path, toml).with_context(|| format!("Failed to write {path}"))?;
            println!("Reference tables written to {}", style(path).green());
        }
        None => print!("{toml}"),
    }
    Ok(())
}

pub fn show_paths() {
    println!("Config:     {}", paths::config_file().display());
    println!("Reference:  {}", paths::reference_file().display());
    println!("Database:   {}", paths::db_path().display());
    println!("Reports:    {}", paths::reports_dir().display());
}

// --- Output helpers ---

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{v:.precision$}"))
        .unwrap_or_else(|| "-".into())
}

fn print_scores(d: &DerivedScores) {
    println!("  Growth percentile:  {}", fmt_opt(d.growth_percentile, 1));
    println!("  Sleep quality:      {}", fmt_opt(d.sleep_quality_index, 1));
    println!("  Feeding efficiency: {}", fmt_opt(d.feeding_efficiency, 1));
    println!("  Development:        {}", fmt_opt(d.developmental_score, 1));
}

fn print_issues(issues: &[AnalyticsError]) {
    for issue in issues {
        println!("  {} {issue}", style("SKIP").yellow());
    }
}

fn print_insights(baby_name: &str, i: &Insights) {
    println!(
        "{} ({} records, timeframe {}, {} months old)",
        style(baby_name).cyan().bold(),
        i.total_records,
        i.timeframe,
        i.baby_age_months
    );
    println!();

    let g = &i.growth;
    println!(
        "  Growth      avg percentile {}",
        fmt_opt(g.average_percentile, 1)
    );
    println!(
        "              {} -> {}  weight {} -> {} kg",
        g.first_record.date,
        g.latest_record.date,
        fmt_opt(g.first_record.weight, 2),
        fmt_opt(g.latest_record.weight, 2)
    );
    if let Some(rate) = g.weight_gain_per_week {
        println!("              weight {rate:+.1} g/week");
    }
    if let Some(rate) = g.height_gain_per_month {
        println!("              length {rate:+.1} cm/month");
    }
    if let Some(rate) = g.head_circumference_gain_per_month {
        println!("              head   {rate:+.1} cm/month");
    }

    println!(
        "  Sleep       avg {}  {}",
        fmt_opt(i.sleep.average_quality, 1),
        style(i.sleep.trend).bold()
    );
    println!(
        "  Feeding     avg {}  {}",
        fmt_opt(i.feeding.average_efficiency, 1),
        style(i.feeding.trend).bold()
    );
    println!(
        "  Development avg {}  {}",
        fmt_opt(i.development.average_score, 1),
        style(i.development.trend).bold()
    );
}
