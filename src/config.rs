//! Parses the INI-style benchmark configuration file into typed fields.

use crate::error::{EikonalError, Result};
use configparser::ini::Ini;
use std::path::Path;

/// The solver names the benchmark harness knows how to construct.
pub const KNOWN_SOLVERS: &[&str] = &[
    "fmm", "fmmfib", "sfmm", "gmm", "fim", "ufmm", "fsm", "lsm", "ddqm", "fmmstar", "sfmmstar",
];

/// Typed contents of a `benchmark.ini`-style configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkConfig {
    pub ndims: usize,
    pub cell_type: String,
    pub dimsize: Vec<u32>,
    pub start: Vec<u32>,
    pub goal: Option<Vec<u32>>,
    pub name: String,
    pub runs: u32,
    pub savegrid: bool,
    pub solvers: Vec<String>,
}

fn config_err(msg: impl Into<String>) -> EikonalError {
    EikonalError::Configuration(msg.into())
}

fn required(ini: &Ini, section: &str, key: &str) -> Result<String> {
    ini.get(section, key)
        .ok_or_else(|| config_err(format!("missing required key `{section}.{key}`")))
}

fn parse_csv_u32(raw: &str, key: &str) -> Result<Vec<u32>> {
    raw.split(',')
        .map(|tok| {
            tok.trim()
                .parse::<u32>()
                .map_err(|_| config_err(format!("could not parse `{key}` value {tok:?} as u32")))
        })
        .collect()
}

impl BenchmarkConfig {
    /// Parses `path` as an INI-style configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`EikonalError::Configuration`] on the first missing key,
    /// unparseable value, or unrecognized solver name encountered; returns
    /// [`EikonalError::Io`] if `path` cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut ini = Ini::new();
        let contents = std::fs::read_to_string(path)?;
        ini.read(contents)
            .map_err(|e| config_err(format!("could not parse {}: {e}", path.display())))?;

        let ndims: usize = required(&ini, "grid", "ndims")?
            .trim()
            .parse()
            .map_err(|_| config_err("`grid.ndims` must be an integer"))?;
        if ndims != 2 && ndims != 3 {
            return Err(config_err(format!(
                "`grid.ndims` must be 2 or 3, got {ndims}"
            )));
        }

        let cell_type = required(&ini, "grid", "cell")?;
        let dimsize = parse_csv_u32(&required(&ini, "grid", "dimsize")?, "grid.dimsize")?;
        if dimsize.len() != ndims {
            return Err(config_err(format!(
                "`grid.dimsize` has {} entries, expected {ndims}",
                dimsize.len()
            )));
        }

        let start = parse_csv_u32(&required(&ini, "problem", "start")?, "problem.start")?;
        if start.len() != ndims {
            return Err(config_err(format!(
                "`problem.start` has {} entries, expected {ndims}",
                start.len()
            )));
        }

        let goal_raw = required(&ini, "problem", "goal")?;
        let goal = if goal_raw.trim() == "-1" {
            None
        } else {
            let g = parse_csv_u32(&goal_raw, "problem.goal")?;
            if g.len() != ndims {
                return Err(config_err(format!(
                    "`problem.goal` has {} entries, expected {ndims}",
                    g.len()
                )));
            }
            Some(g)
        };

        let name = required(&ini, "benchmark", "name")?;
        let runs: u32 = required(&ini, "benchmark", "runs")?
            .trim()
            .parse()
            .map_err(|_| config_err("`benchmark.runs` must be an integer"))?;
        let savegrid = match required(&ini, "benchmark", "savegrid")?
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            other => {
                return Err(config_err(format!(
                    "`benchmark.savegrid` must be a boolean, got {other:?}"
                )))
            }
        };

        let solvers: Vec<String> = ini
            .get_map_ref()
            .get("solvers")
            .into_iter()
            .flat_map(std::collections::HashMap::keys)
            .filter(|key| {
                ini.getbool("solvers", key).ok().flatten().unwrap_or(false)
            })
            .cloned()
            .collect();
        if solvers.is_empty() {
            return Err(config_err("no `solvers.<name>` entry was enabled"));
        }
        for s in &solvers {
            if !KNOWN_SOLVERS.contains(&s.as_str()) {
                return Err(config_err(format!("unknown solver name `{s}`")));
            }
        }

        Ok(Self {
            ndims,
            cell_type,
            dimsize,
            start,
            goal,
            name,
            runs,
            savegrid,
            solvers,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn write_config(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "eikonal_march_test_config_{}_{}.ini",
            std::process::id(),
            contents.len()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parses_a_well_formed_config() {
        let path = write_config(
            "[grid]\nndims=2\ncell=default\ndimsize=100,100\n\n\
             [problem]\nstart=1,1\ngoal=98,98\n\n\
             [benchmark]\nname=run1\nruns=3\nsavegrid=true\n\n\
             [solvers]\nfmm=true\nsfmm=false\n",
        );
        let config = BenchmarkConfig::from_file(&path).unwrap();
        assert_eq!(config.ndims, 2);
        assert_eq!(config.dimsize, vec![100, 100]);
        assert_eq!(config.goal, Some(vec![98, 98]));
        assert_eq!(config.runs, 3);
        assert!(config.savegrid);
        assert_eq!(config.solvers, vec!["fmm".to_string()]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        let path = write_config("[grid]\nndims=2\ncell=default\n");
        let err = BenchmarkConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, EikonalError::Configuration(_)));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn goal_of_minus_one_means_no_goal() {
        let path = write_config(
            "[grid]\nndims=2\ncell=default\ndimsize=10,10\n\n\
             [problem]\nstart=0,0\ngoal=-1\n\n\
             [benchmark]\nname=r\nruns=1\nsavegrid=false\n\n\
             [solvers]\nfmm=true\n",
        );
        let config = BenchmarkConfig::from_file(&path).unwrap();
        assert_eq!(config.goal, None);
        std::fs::remove_file(&path).ok();
    }
}
