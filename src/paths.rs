use std::path::PathBuf;
use std::sync::OnceLock;

/// XDG-compliant directory layout for babytrack.
///
/// On Linux:
///   Config:  $XDG_CONFIG_HOME/babytrack  (~/.config/babytrack)
///   Data:    $XDG_DATA_HOME/babytrack    (~/.local/share/babytrack)
///
/// On macOS both live under ~/Library/Application Support/babytrack.
///
/// The resolved roots are cached in OnceLock cells.

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();
static CONFIG_DIR: OnceLock<PathBuf> = OnceLock::new();

const APP_DIR: &str = "babytrack";

/// Root data directory: $XDG_DATA_HOME/babytrack
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    })
}

/// Root config directory: $XDG_CONFIG_HOME/babytrack
pub fn config_dir() -> &'static PathBuf {
    CONFIG_DIR.get_or_init(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    })
}

/// Config file path: <config_dir>/config.toml
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Reference table overrides: <config_dir>/reference.toml
pub fn reference_file() -> PathBuf {
    config_dir().join("reference.toml")
}

/// Reports directory: <data_dir>/reports
pub fn reports_dir() -> PathBuf {
    data_dir().join("reports")
}

/// Database path: <data_dir>/babytrack.db
pub fn db_path() -> PathBuf {
    data_dir().join("babytrack.db")
}

/// Report file stem for one baby on one day, e.g. `report_3_2026-03-15`.
pub fn report_stem(baby_id: i64, date: chrono::NaiveDate) -> String {
    format!("report_{baby_id}_{date}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_ends_with_app_name() {
        assert!(data_dir().ends_with("babytrack"));
    }

    #[test]
    fn config_dir_ends_with_app_name() {
        assert!(config_dir().ends_with("babytrack"));
    }

    #[test]
    fn config_files_live_in_config_dir() {
        assert!(config_file().ends_with("babytrack/config.toml"));
        assert!(reference_file().ends_with("babytrack/reference.toml"));
    }

    #[test]
    fn db_and_reports_live_in_data_dir() {
        assert!(db_path().starts_with(data_dir()));
        assert!(db_path().ends_with("babytrack.db"));
        assert!(reports_dir().ends_with("babytrack/reports"));
    }

    #[test]
    fn report_stem_structure() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert_eq!(report_stem(3, date), "report_3_2026-03-15");
    }
}
