mod bootstrap;
mod output;

use anyhow::{bail, Result};
use grade_core::settings::Settings;
use grade_data::analysis::{analyze_file, compare_students, AnalysisOptions};
use grade_data::reader::expand_paths;

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    if settings.write_default_rules {
        return bootstrap::write_default_rules(&settings.rules_path());
    }

    tracing::info!("grade-report v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Format: {}, Window: {} months",
        settings.view,
        settings.format,
        settings.window_months
    );

    let paths = expand_paths(&settings.paths);
    if paths.is_empty() {
        bail!("no transcript files found");
    }

    if settings.view == "compare" {
        let comparisons = compare_students(&paths);
        if settings.format == "json" {
            println!("{}", serde_json::to_string_pretty(&comparisons)?);
        } else {
            print!("{}", output::compare_table(&comparisons));
        }
        return Ok(());
    }

    let options = AnalysisOptions {
        window_months: settings.window_months,
        rules: settings.subject_rules()?,
        ..AnalysisOptions::default()
    };

    let mut reports = Vec::with_capacity(paths.len());
    for path in &paths {
        match analyze_file(path, &options) {
            Ok(report) => reports.push(report),
            Err(e) => tracing::error!("{}: {}", path.display(), e),
        }
    }

    if reports.is_empty() {
        bail!("no transcript could be analysed");
    }

    if settings.format == "json" {
        let value = output::reports_json(&reports, &settings.view)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", output::reports_text(&reports, &settings.view));
    }
    Ok(())
}
