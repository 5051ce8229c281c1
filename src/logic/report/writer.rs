use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::constants;
use crate::logic::error::PipelineResult;
use crate::logic::pipeline::RunOutput;

pub const RESULTS_FILE: &str = "results.jsonl";
pub const FLAGGED_FILE: &str = "flagged.json";
pub const ROOT_CAUSE_FILE: &str = "root_cause.txt";
pub const SUMMARY_FILE: &str = "summary.json";

/// Writes one run's artifacts into a directory
pub struct ReportWriter {
    out_dir: PathBuf,
}

impl ReportWriter {
    /// Per-run subdirectory of the default output dir
    pub fn for_run(output: &RunOutput) -> Self {
        Self::from_path(constants::get_output_dir().join(output.summary.run_id.to_string()))
    }

    pub fn from_path(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Write every artifact, returning the directory they landed in
    pub fn write(&self, output: &RunOutput) -> PipelineResult<PathBuf> {
        fs::create_dir_all(&self.out_dir)?;

        // One JSON object per record, row order
        let mut results = BufWriter::new(File::create(self.out_dir.join(RESULTS_FILE))?);
        for record in &output.records {
            let json = serde_json::to_string(record)?;
            writeln!(results, "{}", json)?;
        }
        results.flush()?;

        let flagged = BufWriter::new(File::create(self.out_dir.join(FLAGGED_FILE))?);
        serde_json::to_writer_pretty(flagged, &output.flagged)?;

        fs::write(
            self.out_dir.join(ROOT_CAUSE_FILE),
            output.explanations.root_cause.as_bytes(),
        )?;

        let summary = BufWriter::new(File::create(self.out_dir.join(SUMMARY_FILE))?);
        serde_json::to_writer_pretty(summary, &output.summary)?;

        log::info!(
            "Wrote {} results ({} flagged) to {}",
            output.records.len(),
            output.flagged.len(),
            self.out_dir.display()
        );
        Ok(self.out_dir.clone())
    }
}
