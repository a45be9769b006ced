//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a run, including
//! overall statistics and a per-seed table.

use crate::output::stats::{RunStatistics, SeedStatus};
use crate::output::traits::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary for `stats` to `output_path`
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(stats: &RunStatistics, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(stats);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats run statistics as markdown
pub fn format_markdown_summary(stats: &RunStatistics) -> String {
    let mut md = String::new();

    md.push_str("# Press-Scout Run Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", stats.started_at.to_rfc3339()));
    if let Some(finished) = stats.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
        let duration = (finished - stats.started_at).num_seconds().max(0);
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Config Hash**: {}\n\n", stats.config_hash));

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!(
        "- **Websites Processed**: {}/{}\n",
        stats.successful(),
        stats.processed()
    ));
    md.push_str(&format!("- **Skipped**: {}\n", stats.skipped()));
    md.push_str(&format!("- **Failed**: {}\n", stats.failed()));
    md.push_str(&format!(
        "- **Total Processing Time**: {:.2} seconds\n",
        stats.total_time().as_secs_f64()
    ));
    md.push_str(&format!(
        "- **Average Time per Website**: {:.2} seconds\n",
        stats.average_time().as_secs_f64()
    ));
    md.push_str(&format!(
        "- **Extracted Results**: {}\n\n",
        stats.total_results()
    ));

    if !stats.seeds.is_empty() {
        md.push_str("## Seeds\n\n");
        md.push_str("| Seed | Status | Pages | Results | No Content | Failures | Time (s) |\n");
        md.push_str("|------|--------|-------|---------|------------|----------|----------|\n");

        for seed in &stats.seeds {
            let status = if seed.timed_out {
                format!("{} (timed out)", seed.status.as_str())
            } else {
                seed.status.as_str().to_string()
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {:.2} |\n",
                seed.seed,
                status,
                seed.pages,
                seed.results,
                seed.no_content,
                seed.failures,
                seed.elapsed.as_secs_f64()
            ));
        }
        md.push('\n');
    }

    let errors: Vec<_> = stats
        .seeds
        .iter()
        .filter(|s| s.status == SeedStatus::Failed)
        .collect();
    if !errors.is_empty() {
        md.push_str("## Errors\n\n");
        for seed in errors {
            md.push_str(&format!(
                "- `{}`: {}\n",
                seed.seed,
                seed.error.as_deref().unwrap_or("unknown error")
            ));
        }
        md.push('\n');
    }

    md
}
