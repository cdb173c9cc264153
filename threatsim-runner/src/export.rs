//! Reporting and export — JSON, CSV, and Markdown artifact generation.
//!
//! Provides the persisted forms of a simulation run:
//! - **JSON**: configuration, full run record, and final population
//! - **CSV**: per-scenario score table and per-exemplar final state
//! - **Markdown**: human-readable single-run report
//!
//! Persisted run records carry a `schema_version`. Newer versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use threatsim_core::{Population, ScenarioRecord};

use crate::runner::{CompletionStatus, SimulationRun, SCHEMA_VERSION};
use crate::summary::RunSummary;
use crate::trials::TrialsResult;

/// File names inside an artifact directory.
pub const CONFIG_FILE: &str = "simulationconfig.json";
pub const RESULTS_FILE: &str = "simulationresults.json";
pub const CATEGORIES_FILE: &str = "simulationcategories.json";
pub const SCORES_FILE: &str = "scores.csv";
pub const EXEMPLARS_FILE: &str = "exemplars.csv";
pub const REPORT_FILE: &str = "report.md";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `SimulationRun` to pretty JSON.
pub fn export_json(run: &SimulationRun) -> Result<String> {
    serde_json::to_string_pretty(run).context("failed to serialize SimulationRun to JSON")
}

/// Deserialize a `SimulationRun` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<SimulationRun> {
    let run: SimulationRun =
        serde_json::from_str(json).context("failed to deserialize SimulationRun from JSON")?;
    if run.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            run.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(run)
}

/// Serialize the final population: categories in order, each exemplar's
/// `r`, `d`, `t`.
pub fn export_population_json(population: &Population) -> Result<String> {
    serde_json::to_string_pretty(population).context("failed to serialize population to JSON")
}

/// Serialize a trials summary to pretty JSON.
pub fn export_trials_json(result: &TrialsResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize TrialsResult to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// One row per scenario.
///
/// Columns: index, label, kind, total, total_time, then one column per
/// category plain score followed by one per category time-weighted score
/// (`<name>_time`), in population order.
pub fn export_scores_csv(records: &[ScenarioRecord], population: &Population) -> Result<String> {
    let names = population.category_names();
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<String> = ["index", "label", "kind", "total", "total_time"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(names.iter().map(|n| n.to_string()));
    header.extend(names.iter().map(|n| threatsim_core::domain::time_key(n)));
    wtr.write_record(&header)?;

    for r in records {
        let mut row = vec![
            r.index.to_string(),
            r.label.clone(),
            format!("{:?}", r.kind).to_lowercase(),
            format!("{:.6}", r.result.total),
            format!("{:.6}", r.result.total_time),
        ];
        row.extend(
            names
                .iter()
                .map(|n| format!("{:.6}", r.result.score(n).unwrap_or(0.0))),
        );
        row.extend(
            names
                .iter()
                .map(|n| format!("{:.6}", r.result.time_score(n).unwrap_or(0.0))),
        );
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the final exemplar state: category, index, r, d, t.
pub fn export_exemplars_csv(population: &Population) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["category", "index", "r", "d", "t"])?;
    for category in &population.categories {
        for (i, e) in category.exemplars.iter().enumerate() {
            wtr.write_record([
                &category.name,
                &i.to_string(),
                &format!("{:.6}", e.r),
                &e.d.to_string(),
                &format!("{:.6}", e.t),
            ])?;
        }
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// One row per scenario of a trials summary.
pub fn export_trials_csv(result: &TrialsResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "index",
        "label",
        "samples",
        "total_mean",
        "total_std",
        "total_p10",
        "total_median",
        "total_p90",
        "expected_total",
        "total_time_mean",
        "total_time_std",
        "expected_total_time",
    ])?;
    for s in &result.scenarios {
        wtr.write_record([
            &s.index.to_string(),
            &s.label,
            &s.samples.to_string(),
            &format!("{:.6}", s.total.mean),
            &format!("{:.6}", s.total.std_dev),
            &format!("{:.6}", s.total.p10),
            &format!("{:.6}", s.total.median),
            &format!("{:.6}", s.total.p90),
            &format!("{:.6}", s.expected_total),
            &format!("{:.6}", s.total_time.mean),
            &format!("{:.6}", s.total_time.std_dev),
            &format!("{:.6}", s.expected_total_time),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one run.
///
/// Creates `run_{timestamp}/` under `output_dir` containing the config,
/// run record and final population as JSON, the score and exemplar tables
/// as CSV, and a Markdown report. Returns the created directory.
pub fn save_artifacts(run: &SimulationRun, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!("run_{}", run.timestamp.format("%Y%m%d_%H%M%S"));
    let mut run_dir = output_dir.join(&dirname);
    let mut suffix = 1;
    while run_dir.exists() {
        run_dir = output_dir.join(format!("{dirname}_{suffix}"));
        suffix += 1;
    }
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let config_json = serde_json::to_string_pretty(&run.config)
        .context("failed to serialize config to JSON")?;
    write_artifact(&run_dir, CONFIG_FILE, &config_json)?;
    write_artifact(&run_dir, RESULTS_FILE, &export_json(run)?)?;
    write_artifact(&run_dir, CATEGORIES_FILE, &export_population_json(&run.population)?)?;
    write_artifact(&run_dir, SCORES_FILE, &export_scores_csv(&run.records, &run.population)?)?;
    write_artifact(&run_dir, EXEMPLARS_FILE, &export_exemplars_csv(&run.population)?)?;
    write_artifact(&run_dir, REPORT_FILE, &generate_report(run))?;

    Ok(run_dir)
}

fn write_artifact(dir: &Path, name: &str, content: &str) -> Result<()> {
    let path = dir.join(name);
    std::fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Load a `SimulationRun` from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<SimulationRun> {
    let path = dir.join(RESULTS_FILE);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown reports ───────────────────────────────────────────────

/// Generate a Markdown report for one run.
pub fn generate_report(run: &SimulationRun) -> String {
    let summary = RunSummary::from_run(run);
    let mut md = String::with_capacity(2048);

    md.push_str("# Threat Simulation Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Config Id | {} |\n", run.config_id));
    md.push_str(&format!("| Seed | {} |\n", run.seed));
    md.push_str(&format!("| Timestamp | {} |\n", run.timestamp));
    md.push_str(&format!(
        "| Population | {} |\n",
        if run.config.population.match_paper { "paper-matched" } else { "randomized" }
    ));
    md.push_str(&format!("| Exemplars | {} |\n", summary.exemplar_count));
    match &run.status {
        CompletionStatus::Complete => md.push_str("| Status | complete |\n"),
        CompletionStatus::Incomplete { index, label, error } => md.push_str(&format!(
            "| Status | **INCOMPLETE** at scenario {index} ({label}): {error} |\n"
        )),
    }
    md.push('\n');

    md.push_str("## Scores\n\n");
    md.push_str("| # | Threshold | Kind | S_t | S_t (time) |\n");
    md.push_str("| --- | --- | --- | --- | --- |\n");
    for r in &run.records {
        md.push_str(&format!(
            "| {} | {} | {} | {:.3} | {:.3} |\n",
            r.index, r.label, r.kind, r.result.total, r.result.total_time
        ));
    }
    md.push('\n');

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- Peak S_t: {}\n", fmt_opt(summary.peak_total)));
    md.push_str(&format!("- Peak S_t (time): {}\n", fmt_opt(summary.peak_time_total)));
    md.push_str(&format!("- Initial deployment S_t: {}\n", fmt_opt(summary.initial_total)));
    md.push_str(&format!("- S_δ: {}\n", fmt_opt(summary.score_delta)));

    md
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::runner::run_simulation;

    fn sample_run() -> SimulationRun {
        let mut config = SimulationConfig::default();
        config.seed = Some(17);
        config.population.match_paper = true;
        config.scenarios.base.detection_ratio = 1.0;
        run_simulation(&config).unwrap()
    }

    #[test]
    fn json_round_trip_preserves_run() {
        let run = sample_run();
        let back = import_json(&export_json(&run).unwrap()).unwrap();
        assert_eq!(back.records, run.records);
        assert_eq!(back.population, run.population);
        assert_eq!(back.config, run.config);
        assert_eq!(back.seed, 17);
        assert!(back.records[0].threshold.unwrap().value().is_infinite());
    }

    #[test]
    fn future_schema_rejected() {
        let mut run = sample_run();
        run.schema_version = SCHEMA_VERSION + 1;
        let json = serde_json::to_string(&run).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn scores_csv_has_one_row_per_scenario() {
        let run = sample_run();
        let csv = export_scores_csv(&run.records, &run.population).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 1 + 8);
        assert!(lines[0].starts_with("index,label,kind,total,total_time,Loss_of_View,"));
        assert!(lines[0].ends_with("Manipulation_of_Safety_time"));
        assert!(lines[1].starts_with("0,∞,base,"));
        assert_eq!(lines[1].split(',').count(), 5 + 2 * 9);
    }

    #[test]
    fn exemplars_csv_lists_every_exemplar() {
        let run = sample_run();
        let csv = export_exemplars_csv(&run.population).unwrap();
        assert_eq!(csv.lines().count(), 1 + 42);
        assert!(csv.lines().nth(1).unwrap().starts_with("Loss_of_View,0,"));
    }

    #[test]
    fn report_mentions_every_scenario() {
        let run = sample_run();
        let md = generate_report(&run);
        assert!(md.contains("# Threat Simulation Report"));
        assert!(md.contains("| Status | complete |"));
        for r in &run.records {
            assert!(md.contains(&format!("| {} | {} |", r.index, r.label)));
        }
    }
}
