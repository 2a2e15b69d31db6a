//! Builds one simulation input directory per incident grid point by adding
//! a projectile atom to a template `dft.inp`.

use crate::error::{Error, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const INPUT_NAME: &str = "dft.inp";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    /// distance between neighbouring grid points (A)
    pub spacing: f64,
    /// last index along x
    pub nx: usize,
    /// last index along z
    pub nz: usize,
    /// projectile start position along y (A)
    pub standoff: f64,
    pub prefix: String,
}

impl Default for GridParams {
    fn default() -> Self {
        GridParams {
            spacing: 0.6025963854,
            nx: 3,
            nz: 4,
            standoff: 5.0,
            prefix: "c2h2_proton".to_string(),
        }
    }
}

impl GridParams {
    pub fn position(&self, i: usize, j: usize) -> [f64; 3] {
        let d = self.spacing;
        [i as f64 * d, self.standoff, j as f64 * d / 2.0 - d]
    }

    pub fn dir_name(&self, i: usize, j: usize) -> String {
        format!("{}_x{}z{}_gs", self.prefix, i, j)
    }
}

/// A template input with one extra atom slot reserved for the projectile.
#[derive(Debug, Clone)]
pub struct Template {
    lines: Vec<String>,
    projectile_line: usize,
}

impl Template {
    pub fn read(path: &Path) -> Result<Template> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Template::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Template> {
        let mut lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();

        // the atom count is the first integer outside comment lines
        let mut counted = false;
        for line in lines.iter_mut() {
            if line.trim_start().starts_with('#') {
                continue;
            }
            if let Some(updated) = increment_count(line) {
                *line = updated;
                counted = true;
                break;
            }
        }
        if !counted {
            return Err(Error::format("no atom count found in template"));
        }

        let projectile_line = (0..lines.len().saturating_sub(1))
            .rev()
            .find(|&i| {
                lines[i]
                    .split_whitespace()
                    .next()
                    .map_or(false, |t| t.parse::<f64>().is_ok())
            })
            .map(|i| i + 1)
            .ok_or_else(|| Error::format("no atom block found in template"))?;

        lines.insert(projectile_line, atom_line([0.0; 3]));
        Ok(Template {
            lines,
            projectile_line,
        })
    }

    pub fn render(&self, position: [f64; 3]) -> String {
        let mut lines = self.lines.clone();
        lines[self.projectile_line] = atom_line(position);
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

fn increment_count(line: &str) -> Option<String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let pos = tokens
        .iter()
        .position(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_digit()))?;
    let count: usize = tokens[pos].parse().ok()?;
    let bumped = (count + 1).to_string();
    let mut out: Vec<&str> = tokens.clone();
    out[pos] = &bumped;
    Some(out.join(" "))
}

// fixed width with a blank in place of a plus sign
fn signed(v: f64) -> String {
    if v.is_sign_negative() && v != 0.0 {
        format!("{:.6}", v)
    } else {
        format!(" {:.6}", v.abs())
    }
}

fn atom_line(p: [f64; 3]) -> String {
    format!("{}\t{}\t{} 1 1", signed(p[0]), signed(p[1]), signed(p[2]))
}

fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to).map_err(|e| Error::io(to, e))?;
    for entry in fs::read_dir(from).map_err(|e| Error::io(from, e))? {
        let entry = entry.map_err(|e| Error::io(from, e))?;
        let src = entry.path();
        let dst = to.join(entry.file_name());
        if src.is_dir() {
            copy_dir(&src, &dst)?;
        } else {
            fs::copy(&src, &dst).map_err(|e| Error::io(&src, e))?;
        }
    }
    Ok(())
}

/// Writes `<root>/<prefix>_x{i}z{j}_gs/dft.inp` for every grid point,
/// copying the template directory first where it does not exist yet.
pub fn generate(template_dir: &Path, root: &Path, params: &GridParams) -> Result<Vec<PathBuf>> {
    let template = Template::read(&template_dir.join(INPUT_NAME))?;
    let mut written = Vec::with_capacity((params.nx + 1) * (params.nz + 1));

    for i in 0..=params.nx {
        for j in 0..=params.nz {
            let dir = root.join(params.dir_name(i, j));
            if !dir.exists() {
                copy_dir(template_dir, &dir)?;
            }
            let input = dir.join(INPUT_NAME);
            fs::write(&input, template.render(params.position(i, j)))
                .map_err(|e| Error::io(&input, e))?;
            written.push(dir);
        }
    }

    info!(
        "wrote {} grid inputs under {}",
        written.len(),
        root.display()
    );
    Ok(written)
}
