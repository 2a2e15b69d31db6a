use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::grid::GridParams;

/// Values read from an optional `--config` file. Anything given on the
/// command line wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub initial_velocity: Option<f64>,
    pub output_dir: PathBuf,
    pub csv_name: String,
    pub latex_name: String,
    pub caption: String,
    pub label: String,
    pub grid: GridParams,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            initial_velocity: None,
            output_dir: PathBuf::from("."),
            csv_name: "output.csv".to_string(),
            latex_name: "table_latex.txt".to_string(),
            caption: "Insert caption here.".to_string(),
            label: "insert-label-here".to_string(),
            grid: GridParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeConfig {
    pub input_path: PathBuf,
    pub initial_velocity: f64,
    pub output_dir: PathBuf,
    pub csv_name: String,
    pub latex_name: String,
    pub caption: String,
    pub label: String,
}

impl AnalyzeConfig {
    pub fn new(input_path: impl Into<PathBuf>, initial_velocity: f64) -> AnalyzeConfig {
        let d = Defaults::default();
        AnalyzeConfig {
            input_path: input_path.into(),
            initial_velocity,
            output_dir: d.output_dir,
            csv_name: d.csv_name,
            latex_name: d.latex_name,
            caption: d.caption,
            label: d.label,
        }
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(&self.csv_name)
    }

    pub fn latex_path(&self) -> PathBuf {
        self.output_dir.join(&self.latex_name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    pub template_dir: PathBuf,
    pub output_root: PathBuf,
    pub params: GridParams,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Analyze(AnalyzeConfig),
    Grid(GridConfig),
}

impl Command {

    // initialize configuration from command line arguments
    pub fn new() -> Result<Command> {
        Command::from_matches(&Command::app().get_matches())
    }

    pub fn from_args<I, T>(args: I) -> Result<Command>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Command::app()
            .get_matches_from_safe(args)
            .map_err(|e| Error::Config(e.message))?;
        Command::from_matches(&matches)
    }

    fn app() -> App<'static, 'static> {
        App::new("Projectile event analysis")
            .version(env!("CARGO_PKG_VERSION"))
            .author("Ian Graham <irgraham1@gmail.com>")
            .about("Extracts reflection/transmission, electron gain, kinetic energy loss and fragment products from projectile impact reports.")
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .arg(Arg::with_name("CONFIG")
                .short("c")
                .long("config")
                .help("TOML file with default settings")
                .takes_value(true)
                .global(true))
            .subcommand(SubCommand::with_name("analyze")
                .about("Writes the CSV and LaTeX summaries of a report")
                .arg(Arg::with_name("INPUT")
                    .help("Report file to analyze")
                    .required(true)
                    .index(1))
                .arg(Arg::with_name("VEL")
                    .short("v")
                    .long("velocity")
                    .help("Initial projectile velocity along the projectile axis (A/fs)")
                    .takes_value(true)
                    .allow_hyphen_values(true))
                .arg(Arg::with_name("OUTDIR")
                    .short("o")
                    .long("outdir")
                    .help("Directory for the output files")
                    .takes_value(true))
                .arg(Arg::with_name("CSV")
                    .long("csv")
                    .help("Name of the CSV output")
                    .takes_value(true))
                .arg(Arg::with_name("LATEX")
                    .long("latex")
                    .help("Name of the LaTeX table output")
                    .takes_value(true))
                .arg(Arg::with_name("CAPTION")
                    .long("caption")
                    .help("Caption of the LaTeX table")
                    .takes_value(true))
                .arg(Arg::with_name("LABEL")
                    .long("label")
                    .help("Label of the LaTeX table")
                    .takes_value(true)))
            .subcommand(SubCommand::with_name("grid")
                .about("Creates one input directory per incident grid point")
                .arg(Arg::with_name("TEMPLATE")
                    .help("Directory holding the template dft.inp")
                    .required(true)
                    .index(1))
                .arg(Arg::with_name("ROOT")
                    .short("o")
                    .long("outdir")
                    .help("Directory receiving the grid inputs")
                    .takes_value(true)
                    .default_value("."))
                .arg(Arg::with_name("SPACING")
                    .short("d")
                    .long("spacing")
                    .help("Distance between grid points (A)")
                    .takes_value(true))
                .arg(Arg::with_name("NX")
                    .short("n")
                    .long("nx")
                    .help("Last grid index along x")
                    .takes_value(true))
                .arg(Arg::with_name("NZ")
                    .short("m")
                    .long("nz")
                    .help("Last grid index along z")
                    .takes_value(true))
                .arg(Arg::with_name("STANDOFF")
                    .long("standoff")
                    .help("Projectile start position along y (A)")
                    .takes_value(true))
                .arg(Arg::with_name("PREFIX")
                    .long("prefix")
                    .help("Prefix of the generated directory names")
                    .takes_value(true)))
    }

    fn from_matches(matches: &ArgMatches) -> Result<Command> {
        let config_path = matches
            .value_of("CONFIG")
            .or_else(|| matches.subcommand().1.and_then(|sub| sub.value_of("CONFIG")));
        let defaults = match config_path {
            Some(path) => confy::load_path::<Defaults>(path)
                .map_err(|e| Error::Config(format!("{}: {}", path, e)))?,
            None => Defaults::default(),
        };

        match matches.subcommand() {
            ("analyze", Some(sub)) => {
                let initial_velocity = match conv_opt::<f64>(sub, "VEL")? {
                    Some(v) => v,
                    None => defaults.initial_velocity.ok_or_else(|| {
                        Error::Config("initial velocity is required (--velocity)".to_string())
                    })?,
                };
                let input_path = PathBuf::from(sub.value_of("INPUT").unwrap_or_default());
                if !input_path.is_file() {
                    return Err(Error::Config(format!(
                        "file {} does not exist",
                        input_path.display()
                    )));
                }
                Ok(Command::Analyze(AnalyzeConfig {
                    input_path,
                    initial_velocity,
                    output_dir: sub.value_of("OUTDIR").map(PathBuf::from).unwrap_or(defaults.output_dir),
                    csv_name: sub.value_of("CSV").map(String::from).unwrap_or(defaults.csv_name),
                    latex_name: sub.value_of("LATEX").map(String::from).unwrap_or(defaults.latex_name),
                    caption: sub.value_of("CAPTION").map(String::from).unwrap_or(defaults.caption),
                    label: sub.value_of("LABEL").map(String::from).unwrap_or(defaults.label),
                }))
            }
            ("grid", Some(sub)) => {
                let g = defaults.grid;
                let params = GridParams {
                    spacing: conv_opt(sub, "SPACING")?.unwrap_or(g.spacing),
                    nx: conv_opt(sub, "NX")?.unwrap_or(g.nx),
                    nz: conv_opt(sub, "NZ")?.unwrap_or(g.nz),
                    standoff: conv_opt(sub, "STANDOFF")?.unwrap_or(g.standoff),
                    prefix: sub.value_of("PREFIX").map(String::from).unwrap_or(g.prefix),
                };
                Ok(Command::Grid(GridConfig {
                    template_dir: PathBuf::from(sub.value_of("TEMPLATE").unwrap_or_default()),
                    output_root: PathBuf::from(sub.value_of("ROOT").unwrap_or(".")),
                    params,
                }))
            }
            _ => Err(Error::Config("no subcommand given".to_string())),
        }
    }
}

// convert an optional match to the corresponding type
fn conv_opt<T: FromStr>(matches: &ArgMatches, tag: &str) -> Result<Option<T>> {
    match matches.value_of(tag) {
        Some(raw) => T::from_str(raw.trim())
            .map(Some)
            .map_err(|_| Error::Config(format!("invalid value '{}' for {}", raw, tag))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_flags_override_defaults() {
        let cmd = Command::from_args(vec!["pa", "grid", "tmpl", "-n", "2", "--spacing", "0.5"]).unwrap();
        match cmd {
            Command::Grid(g) => {
                assert_eq!(g.template_dir, PathBuf::from("tmpl"));
                assert_eq!(g.output_root, PathBuf::from("."));
                assert_eq!(g.params.nx, 2);
                assert_eq!(g.params.nz, 4);
                assert_eq!(g.params.spacing, 0.5);
            }
            other => panic!("expected grid command, got {:?}", other),
        }
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        let res = Command::from_args(vec!["pa", "grid", "tmpl", "--nx", "three"]);
        assert!(matches!(res, Err(Error::Config(_))));
    }

    #[test]
    fn analyze_requires_existing_input() {
        let res = Command::from_args(vec!["pa", "analyze", "/no/such/report.txt", "-v", "0.1"]);
        assert!(matches!(res, Err(Error::Config(_))));
    }

    #[test]
    fn analyze_reads_negative_velocity() {
        let path = std::env::temp_dir().join(format!("config_test_{}.txt", std::process::id()));
        std::fs::write(&path, "x").unwrap();
        let cmd = Command::from_args(vec![
            "pa",
            "analyze",
            path.to_str().unwrap(),
            "--velocity",
            "-0.1",
            "--csv",
            "out.csv",
        ])
        .unwrap();
        std::fs::remove_file(&path).unwrap();
        match cmd {
            Command::Analyze(a) => {
                assert_eq!(a.initial_velocity, -0.1);
                assert_eq!(a.csv_path(), PathBuf::from("./out.csv"));
                assert_eq!(a.latex_name, "table_latex.txt");
            }
            other => panic!("expected analyze command, got {:?}", other),
        }
    }
}
