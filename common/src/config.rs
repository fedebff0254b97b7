use eyre::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::plot::Plot;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    #[serde(default)]
    pub settings: Settings,
    pub runs: Vec<RunGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chart_width: 1200,
            chart_height: 600,
        }
    }
}

/// One benchmark sweep: an ordered set of measurement files plus the
/// positional axis labels they are charted under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunGroup {
    pub name: String,
    /// Iterations recorded per file; each data row carries `2 + 2 * iterations` fields
    pub iterations: usize,
    pub x_label: String,
    pub upper_y_limit: f64,
    pub labels: Vec<String>,
    pub files: Vec<String>,
    pub plots: Option<Vec<Box<dyn Plot>>>,
}

impl Config {
    /// Labels are positional, so every run group must pair its file list
    /// 1:1 with its label list.
    pub fn validate(&self) -> Result<()> {
        for run in &self.runs {
            if run.labels.len() != run.files.len() {
                bail!(
                    "Run group {} has {} labels for {} files",
                    run.name,
                    run.labels.len(),
                    run.files.len()
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::measurement::RunTables;

    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    struct NullPlot;

    #[async_trait::async_trait]
    #[typetag::serde]
    impl Plot for NullPlot {
        async fn plot(
            &self,
            _run: &RunGroup,
            _tables: &RunTables,
            _plot_path: &Path,
            _settings: &Settings,
        ) -> Result<()> {
            Ok(())
        }
    }

    const CONFIG_YAML: &str = r#"
name: hashtable-throughput
runs:
  - name: thread-scaling
    iterations: 30
    x_label: threads
    upper_y_limit: 50000
    labels: ["1", "2"]
    files: ["a.csv", "b.csv"]
    plots:
      - type: NullPlot
"#;

    #[test]
    fn parses_run_groups_from_yaml() {
        let config: Config = serde_yml::from_str(CONFIG_YAML).unwrap();
        config.validate().unwrap();

        assert_eq!(config.name, "hashtable-throughput");
        assert_eq!(config.settings.chart_width, 1200);
        assert_eq!(config.runs.len(), 1);

        let run = &config.runs[0];
        assert_eq!(run.iterations, 30);
        assert_eq!(run.upper_y_limit, 50000.0);
        assert_eq!(run.labels, vec!["1", "2"]);
        assert_eq!(run.plots.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn rejects_mismatched_label_and_file_lists() {
        let mut config: Config = serde_yml::from_str(CONFIG_YAML).unwrap();
        config.runs[0].labels.push("4".to_owned());

        assert!(config.validate().is_err());
    }
}
