use core::fmt::Debug;
use std::path::{Path, PathBuf};

use dyn_clone::{DynClone, clone_trait_object};
use eyre::Result;
use futures::future::join_all;
use tokio::fs::create_dir_all;
use tracing::debug;

use crate::{
    config::{RunGroup, Settings},
    measurement::RunTables,
};

#[typetag::serde(tag = "type")]
#[async_trait::async_trait]
pub trait Plot: Debug + DynClone + Send + Sync {
    /// Plots the throughput tables of one run group
    ///
    /// Arguments:
    /// * `run` - The run group the tables were extracted from
    /// * `tables` - The lock-free and lock-based throughput tables
    /// * `plot_path` - The path to the plots, ie. /plots
    /// * `settings` - The settings from config.yaml
    async fn plot(
        &self,
        run: &RunGroup,
        tables: &RunTables,
        plot_path: &Path,
        settings: &Settings,
    ) -> Result<()>;
}
clone_trait_object!(Plot);

pub async fn ensure_plot_dirs(dirs: &[PathBuf]) -> Result<()> {
    let create_jobs = dirs.iter().map(create_dir_all);
    for res in join_all(create_jobs).await {
        res?;
    }
    Ok(())
}

pub async fn plot(
    plots: &Option<Vec<Box<dyn Plot>>>,
    run: &RunGroup,
    tables: &RunTables,
    plot_path: &Path,
    settings: &Settings,
) -> Result<()> {
    if plots.is_none() {
        debug!("No plots for run {}", run.name);
        return Ok(());
    }

    let plots = plots.as_ref().unwrap();
    for plot in plots {
        plot.plot(run, tables, plot_path, settings).await?
    }
    Ok(())
}
