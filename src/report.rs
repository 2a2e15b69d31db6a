use crate::error::{Error, Result};
use crate::outcome::OutcomeRecord;
use lazy_static::lazy_static;
use log::warn;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::Path;

lazy_static! {
    // grid indices of an incident point: "x3z12" -> 3, 12
    static ref INCIDENT_RE: Regex = Regex::new(r"(?i)([xyz])(\d+)([xyz])(\d+)").unwrap();

    static ref DIGITS_RE: Regex = Regex::new(r"(\d+)").unwrap();
}

/// Outcomes keyed by incident point. A repeated key replaces the earlier
/// outcome but keeps its position.
#[derive(Debug, Default)]
pub struct Aggregate {
    records: Vec<OutcomeRecord>,
    index: HashMap<String, usize>,
    pub overwritten: usize,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, outcome: OutcomeRecord) {
        match self.index.get(&outcome.incident_point) {
            Some(&i) => {
                warn!(
                    "duplicate incident point {}, keeping the later record",
                    outcome.incident_point
                );
                self.records[i] = outcome;
                self.overwritten += 1;
            }
            None => {
                self.index
                    .insert(outcome.incident_point.clone(), self.records.len());
                self.records.push(outcome);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_sorted(self) -> Vec<OutcomeRecord> {
        let mut records = self.records;
        sort_by_incident(&mut records);
        records
    }
}

/// The two grid indices of an incident point such as `x3z12`.
pub fn incident_sort_key(incident_point: &str) -> Option<(u64, u64)> {
    let caps = INCIDENT_RE.captures(incident_point)?;
    let first = caps[2].parse().ok()?;
    let second = caps[4].parse().ok()?;
    Some((first, second))
}

/// Stable ascending sort on grid indices; points without indices go last.
pub fn sort_by_incident(records: &mut [OutcomeRecord]) {
    records.sort_by_cached_key(|r| match incident_sort_key(&r.incident_point) {
        Some((a, b)) => (false, a, b),
        None => (true, 0, 0),
    });
}

pub fn write_csv(path: &Path, records: &[OutcomeRecord]) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    for r in records {
        writer.write_record(&[
            r.incident_point.clone(),
            r.behavior.code().to_string(),
            format!("{:?}", r.electron_gain),
            format!("{:?}", r.kinetic_energy_loss),
            r.fragment_products.clone(),
        ])?;
    }
    writer.flush().map_err(|e| Error::io(path, e))?;
    Ok(())
}

pub fn read_csv(path: &Path) -> Result<Vec<Vec<String>>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);
    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() < 5 {
            return Err(Error::format(format!(
                "row {} of {} has {} fields, expected 5",
                line + 1,
                path.display(),
                record.len()
            )));
        }
        rows.push(record.iter().map(|f| f.trim().to_string()).collect());
    }
    Ok(rows)
}

/// Wraps every run of digits as a subscript, `x0z12` -> `x$_{0}$z$_{12}$`.
pub fn subscript_numbers(text: &str) -> String {
    DIGITS_RE.replace_all(text, |caps: &Captures| format!("$_{{{}}}$", &caps[1]))
        .into_owned()
}

fn two_decimals(field: &str) -> String {
    match field.parse::<f64>() {
        Ok(v) => format!("{:.2}", v),
        Err(_) => field.to_string(),
    }
}

pub fn render_latex(rows: &[Vec<String>], caption: &str, label: &str) -> String {
    let mut lines = vec![
        r"\begin{table}[ht]".to_string(),
        r"\renewcommand{\arraystretch}{0.5}".to_string(),
        r"\begin{ruledtabular}".to_string(),
        r"\begin{tabular}{lcccc}".to_string(),
        r"    \textrm{Incident point} & \textrm{Effect} & \textrm{Electron} & \textrm{KE loss} & \textrm{Fragment products} \\".to_string(),
        r"    \textrm{} & \textrm{(R/T)} & \textrm{gain} & \textrm{(eV)} & \textrm{} \\".to_string(),
        r"    \colrule".to_string(),
    ];
    for row in rows {
        lines.push(format!(
            r"    \textrm{{\textbf{{{}}}}} & {} & {} & {} & {} \\",
            subscript_numbers(&row[0]),
            row[1],
            two_decimals(&row[2]),
            two_decimals(&row[3]),
            subscript_numbers(&row[4])
        ));
    }
    lines.push(r"\end{tabular}".to_string());
    lines.push(r"\end{ruledtabular}".to_string());
    lines.push(format!(r"\caption{{{}}}", caption));
    lines.push(format!(r"\label{{{}}}", label));
    lines.push(r"\end{table}".to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Builds the LaTeX table from the CSV on disk rather than from memory.
pub fn export_latex(csv_path: &Path, latex_path: &Path, caption: &str, label: &str) -> Result<()> {
    let rows = read_csv(csv_path)?;
    fs::write(latex_path, render_latex(&rows, caption, label))
        .map_err(|e| Error::io(latex_path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Behavior;

    fn outcome(point: &str, gain: f64) -> OutcomeRecord {
        OutcomeRecord {
            incident_point: point.to_string(),
            behavior: Behavior::Transmitted,
            electron_gain: gain,
            kinetic_energy_loss: 1.0,
            fragment_products: "none".to_string(),
        }
    }

    fn points(records: &[OutcomeRecord]) -> Vec<&str> {
        records.iter().map(|r| r.incident_point.as_str()).collect()
    }

    #[test]
    fn sort_key_reads_both_indices() {
        assert_eq!(incident_sort_key("x3z12"), Some((3, 12)));
        assert_eq!(incident_sort_key("Y0X4_gs"), Some((0, 4)));
        assert_eq!(incident_sort_key("center"), None);
    }

    #[test]
    fn unmatched_points_sort_last_in_input_order() {
        let mut aggregate = Aggregate::new();
        for p in &["beta", "x1z0", "alpha", "x0z2", "x0z1", "gamma"] {
            aggregate.insert(outcome(p, 0.0));
        }
        let sorted = aggregate.into_sorted();
        assert_eq!(
            points(&sorted),
            vec!["x0z1", "x0z2", "x1z0", "beta", "alpha", "gamma"]
        );
    }

    #[test]
    fn duplicate_point_keeps_last_record() {
        let mut aggregate = Aggregate::new();
        aggregate.insert(outcome("p", 1.0));
        aggregate.insert(outcome("q", 2.0));
        aggregate.insert(outcome("p", 3.0));
        assert_eq!(aggregate.len(), 2);
        assert_eq!(aggregate.overwritten, 1);
        let sorted = aggregate.into_sorted();
        assert_eq!(points(&sorted), vec!["p", "q"]);
        assert_eq!(sorted[0].electron_gain, 3.0);
    }

    #[test]
    fn subscripts_each_digit_run() {
        assert_eq!(subscript_numbers("x0z12"), "x$_{0}$z$_{12}$");
        assert_eq!(subscript_numbers("C2H, H"), "C$_{2}$H, H");
        assert_eq!(subscript_numbers("none"), "none");
    }

    #[test]
    fn latex_rows_are_rounded() {
        let rows = vec![vec![
            "x1z0".to_string(),
            "R".to_string(),
            "0.123456".to_string(),
            "-1.005e1".to_string(),
            "C2H".to_string(),
        ]];
        let tex = render_latex(&rows, "Cap.", "tab:x");
        assert!(tex.contains(
            r"    \textrm{\textbf{x$_{1}$z$_{0}$}} & R & 0.12 & -10.05 & C$_{2}$H \\"
        ));
        assert!(tex.starts_with(r"\begin{table}[ht]"));
        assert!(tex.contains(r"\caption{Cap.}"));
        assert!(tex.contains(r"\label{tab:x}"));
        assert!(tex.ends_with("\\end{table}\n"));
    }

    #[test]
    fn non_numeric_cells_pass_through() {
        assert_eq!(two_decimals("n/a"), "n/a");
        assert_eq!(two_decimals("2"), "2.00");
    }

    #[test]
    fn missing_csv_is_an_io_error_with_path() {
        let missing = std::env::temp_dir().join(format!("missing_{}.csv", std::process::id()));
        match read_csv(&missing) {
            Err(Error::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected Io error, got {:?}", other),
        }

        let unwritable = missing.join("nested").join("output.csv");
        match write_csv(&unwritable, &[outcome("x0z0", 0.0)]) {
            Err(Error::Io { path, .. }) => assert_eq!(path, unwritable),
            other => panic!("expected Io error, got {:?}", other),
        }
    }
}
