use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

use crate::classifier::SubjectRules;
use crate::error::Result;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Grade statistics from academic transcript exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "grade-report",
    about = "Grade statistics from academic transcript exports",
    version
)]
pub struct Settings {
    /// Transcript files (JSON or saved grade-page source) or directories
    #[arg(required_unless_present = "write_default_rules")]
    pub paths: Vec<PathBuf>,

    /// Report to produce
    #[arg(long, default_value = "summary", value_parser = ["summary", "series", "distribution", "subjects", "shares", "compare"])]
    pub view: String,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json"])]
    pub format: String,

    /// Width of the periodic average window in months (1-24)
    #[arg(long, default_value = "3", value_parser = clap::value_parser!(u32).range(1..=24))]
    pub window_months: u32,

    /// Subject rules file (defaults to ~/.grade-report/subjects.json when present)
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Write the built-in subject rules to the rules path and exit
    #[arg(long)]
    pub write_default_rules: bool,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments from the process environment.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`load`](Self::load) but with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::resolve(Settings::parse_from(args))
    }

    /// Apply the `--debug` override.
    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Path the rules are read from (and written to with
    /// `--write-default-rules`).
    pub fn rules_path(&self) -> PathBuf {
        self.rules.clone().unwrap_or_else(SubjectRules::default_path)
    }

    /// Resolve the subject rules in effect.
    ///
    /// An explicit `--rules` file must load. The default location is only
    /// used when it exists; otherwise the built-in table applies.
    pub fn subject_rules(&self) -> Result<SubjectRules> {
        if let Some(path) = &self.rules {
            return SubjectRules::load_from(path);
        }
        let default_path = SubjectRules::default_path();
        if default_path.exists() {
            debug!("Loading subject rules from {}", default_path.display());
            return SubjectRules::load_from(&default_path);
        }
        Ok(SubjectRules::default())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::SubjectRule;
    use tempfile::TempDir;

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::load_from_args(["grade-report", "alice.json"]);

        assert_eq!(settings.paths, vec![PathBuf::from("alice.json")]);
        assert_eq!(settings.view, "summary");
        assert_eq!(settings.format, "table");
        assert_eq!(settings.window_months, 3);
        assert!(settings.rules.is_none());
        assert!(!settings.write_default_rules);
        assert_eq!(settings.log_level, "WARNING");
        assert!(!settings.debug);
    }

    #[test]
    fn test_settings_multiple_paths_and_view() {
        let settings =
            Settings::load_from_args(["grade-report", "--view", "compare", "a.json", "b.html"]);
        assert_eq!(settings.view, "compare");
        assert_eq!(settings.paths.len(), 2);
    }

    #[test]
    fn test_settings_window_out_of_range_rejected() {
        let result = Settings::try_parse_from(["grade-report", "--window-months", "0", "a.json"]);
        assert!(result.is_err());
        let result = Settings::try_parse_from(["grade-report", "--window-months", "25", "a.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_paths_required() {
        assert!(Settings::try_parse_from(["grade-report"]).is_err());
        assert!(Settings::try_parse_from(["grade-report", "--write-default-rules"]).is_ok());
    }

    #[test]
    fn test_settings_debug_overrides_log_level() {
        let settings = Settings::load_from_args(["grade-report", "--debug", "a.json"]);
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_settings_unknown_view_rejected() {
        assert!(Settings::try_parse_from(["grade-report", "--view", "pie", "a.json"]).is_err());
    }

    #[test]
    fn test_subject_rules_from_explicit_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("rules.json");
        let custom = SubjectRules::new(vec![SubjectRule::new("Chem", &["CH"])], "Rest").unwrap();
        custom.save_to(&path).expect("save");

        let settings = Settings::load_from_args([
            "grade-report".into(),
            "--rules".into(),
            path.clone().into_os_string(),
            "a.json".into(),
        ]);
        assert_eq!(settings.rules_path(), path);
        assert_eq!(settings.subject_rules().unwrap(), custom);
    }

    #[test]
    fn test_subject_rules_explicit_missing_file_is_error() {
        let tmp = TempDir::new().expect("tempdir");
        let missing = tmp.path().join("nope.json");
        let settings = Settings::load_from_args([
            "grade-report".into(),
            "--rules".into(),
            missing.into_os_string(),
            "a.json".into(),
        ]);
        assert!(settings.subject_rules().is_err());
    }
}
