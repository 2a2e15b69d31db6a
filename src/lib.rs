//! Extraction of projectile impact events from simulation reports.
//!
//! A report starts with a header line naming the molecule and the scanned
//! grid axes, followed by one blank-line separated block per impact event.
//! Each block is classified as a reflection or transmission, its kinetic
//! energy loss and fragment products are derived, and the sorted results
//! are written as a CSV file and a LaTeX table.

pub mod chunk;
pub mod config;
pub mod error;
pub mod grid;
pub mod header;
pub mod outcome;
pub mod report;

use log::{info, warn};
use std::fs;
use std::path::PathBuf;

use crate::chunk::{extract_records, SkippedChunk};
use crate::config::AnalyzeConfig;
use crate::error::{Error, Result};
use crate::header::{parse_header, Header};
use crate::outcome::{classify, OutcomeRecord};
use crate::report::Aggregate;

#[derive(Debug)]
pub struct Analysis {
    pub header: Header,
    /// sorted by incident grid indices
    pub outcomes: Vec<OutcomeRecord>,
    pub skipped: Vec<SkippedChunk>,
    pub overwritten: usize,
}

/// Result of a run that got far enough to write the CSV file.
#[derive(Debug)]
pub enum RunOutcome {
    Complete {
        csv_path: PathBuf,
        latex_path: PathBuf,
    },
    /// The CSV file is on disk but the LaTeX table could not be written.
    CsvOnly { csv_path: PathBuf, error: Error },
}

pub fn analyze_text(text: &str, initial_velocity: f64) -> Result<Analysis> {
    let first_line = text
        .lines()
        .next()
        .ok_or_else(|| Error::format("report is empty"))?;
    let header = parse_header(first_line, initial_velocity)?;

    let extraction = extract_records(text, header.projectile_axis);
    let mut skipped = extraction.skipped;
    let mut aggregate = Aggregate::new();
    for record in &extraction.records {
        match classify(record, &header) {
            Ok(outcome) => aggregate.insert(outcome),
            Err(reason) => {
                warn!("skipping chunk {}: {}", record.chunk_index, reason);
                skipped.push(SkippedChunk {
                    index: record.chunk_index,
                    reason,
                });
            }
        }
    }
    skipped.sort_by_key(|s| s.index);
    if aggregate.is_empty() {
        warn!("no incident points could be read from the report");
    }

    let overwritten = aggregate.overwritten;
    Ok(Analysis {
        header,
        outcomes: aggregate.into_sorted(),
        skipped,
        overwritten,
    })
}

pub fn run_analysis(config: &AnalyzeConfig) -> Result<RunOutcome> {
    let text = fs::read_to_string(&config.input_path)
        .map_err(|e| Error::io(&config.input_path, e))?;
    let analysis = analyze_text(&text, config.initial_velocity)?;

    info!("Molecule Name: {}", analysis.header.molecule_name);
    info!("Projectile Direction: {}", analysis.header.projectile_axis);
    info!(
        "{} incident points, {} chunks skipped, {} duplicates overwritten",
        analysis.outcomes.len(),
        analysis.skipped.len(),
        analysis.overwritten
    );

    if !config.output_dir.as_os_str().is_empty() {
        fs::create_dir_all(&config.output_dir).map_err(|e| Error::io(&config.output_dir, e))?;
    }
    let csv_path = config.csv_path();
    report::write_csv(&csv_path, &analysis.outcomes)?;
    info!("wrote {}", csv_path.display());

    let latex_path = config.latex_path();
    match report::export_latex(&csv_path, &latex_path, &config.caption, &config.label) {
        Ok(()) => {
            info!("wrote {}", latex_path.display());
            Ok(RunOutcome::Complete {
                csv_path,
                latex_path,
            })
        }
        Err(error) => Ok(RunOutcome::CsvOnly { csv_path, error }),
    }
}
