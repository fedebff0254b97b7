use std::path::Path;

use common::{
    config::{RunGroup, Settings},
    measurement::{RunTables, ThroughputTable},
    plot::{Plot, ensure_plot_dirs},
    util::{interval_half_width, mean},
};
use eyre::{Context, Result};
use itertools::Itertools;
use plotters::{
    coord::{Shift, ranged1d::SegmentValue},
    element::ErrorBar,
    prelude::*,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Side-by-side bar charts of mean throughput per configuration, lock-free
/// on the left and lock-based on the right, with capped error bars over the
/// iteration axis.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ThroughputBars;

#[async_trait::async_trait]
#[typetag::serde]
impl Plot for ThroughputBars {
    async fn plot(
        &self,
        run: &RunGroup,
        tables: &RunTables,
        plot_path: &Path,
        settings: &Settings,
    ) -> Result<()> {
        if tables.lock_free.columns() == 0 {
            debug!("Run {} has no measurement files, skipping", run.name);
            return Ok(());
        }

        let dir = plot_path.join("throughput");
        let plot_data_dir = dir.join("plot_data");
        ensure_plot_dirs(&[dir.clone(), plot_data_dir.clone()]).await?;

        let raw = [tables.lock_free.rows(), tables.lock_based.rows()];
        tokio::fs::write(
            plot_data_dir.join(format!("{}.json", run.name)),
            serde_json::to_string(&raw)?,
        )
        .await?;

        let filepath = dir.join(format!("{}.svg", run.name));
        debug!("Rendering {}", filepath.display());
        self.render(run, tables, &filepath, settings)
            .context(format!("Render throughput charts for {}", run.name))?;
        Ok(())
    }
}

impl ThroughputBars {
    fn render(
        &self,
        run: &RunGroup,
        tables: &RunTables,
        filepath: &Path,
        settings: &Settings,
    ) -> Result<()> {
        let root = SVGBackend::new(filepath, (settings.chart_width, settings.chart_height))
            .into_drawing_area();
        root.fill(&WHITE)?;
        let (left, right) = root.split_horizontally(settings.chart_width / 2);

        self.bar_chart(&left, "Lock-free Hash Table", run, &tables.lock_free)?;
        self.bar_chart(&right, "Lock-based Hash Table", run, &tables.lock_based)?;

        root.present()?;
        Ok(())
    }

    fn bar_chart(
        &self,
        area: &DrawingArea<SVGBackend<'_>, Shift>,
        title: &str,
        run: &RunGroup,
        table: &ThroughputTable,
    ) -> Result<()> {
        let stats = (0..table.columns())
            .map(|i| {
                let column = table.column(i);
                (mean(&column), interval_half_width(&column))
            })
            .collect_vec();

        let mut chart = ChartBuilder::on(area)
            .caption(title, ("sans-serif", 22))
            .margin(10)
            .x_label_area_size(55)
            .y_label_area_size(70)
            .build_cartesian_2d(
                (0..table.columns()).into_segmented(),
                0f64..run.upper_y_limit,
            )?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .light_line_style(WHITE)
            .x_labels(run.labels.len() + 1)
            .x_label_formatter(&|value| match value {
                SegmentValue::CenterOf(i) => run.labels.get(*i).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .y_label_formatter(&|y| format!("{y:.0}"))
            .x_desc(run.x_label.as_str())
            .y_desc("ops/msec")
            .draw()?;

        chart.draw_series(stats.iter().enumerate().map(|(i, (mean, _))| {
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0.0),
                    (SegmentValue::Exact(i + 1), *mean),
                ],
                Palette99::pick(i).filled(),
            );
            bar.set_margin(0, 0, 3, 3);
            bar
        }))?;

        chart.draw_series(
            stats
                .iter()
                .enumerate()
                .filter(|(_, (_, half))| *half > 0.0)
                .map(|(i, (mean, half))| {
                    ErrorBar::new_vertical(
                        SegmentValue::CenterOf(i),
                        mean - half,
                        *mean,
                        mean + half,
                        BLACK.filled(),
                        6,
                    )
                }),
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_group() -> RunGroup {
        RunGroup {
            name: "thread-scaling".to_owned(),
            iterations: 3,
            x_label: "threads".to_owned(),
            upper_y_limit: 100.0,
            labels: vec!["1".to_owned(), "2".to_owned()],
            files: vec!["a.csv".to_owned(), "b.csv".to_owned()],
            plots: None,
        }
    }

    fn tables() -> RunTables {
        let mut lock_free = ThroughputTable::new(3, 2);
        lock_free.set_column(0, &[10.0, 12.0, 14.0]);
        lock_free.set_column(1, &[20.0, 22.0, 24.0]);
        let mut lock_based = ThroughputTable::new(3, 2);
        lock_based.set_column(0, &[5.0, 6.0, 7.0]);
        lock_based.set_column(1, &[8.0, 9.0, 10.0]);
        RunTables {
            lock_free,
            lock_based,
        }
    }

    #[tokio::test]
    async fn renders_chart_pair_and_plot_data() {
        let dir = tempfile::tempdir().unwrap();
        let run = run_group();

        ThroughputBars
            .plot(&run, &tables(), dir.path(), &Settings::default())
            .await
            .unwrap();

        let svg =
            std::fs::read_to_string(dir.path().join("throughput/thread-scaling.svg")).unwrap();
        assert!(svg.contains("Lock-free Hash Table"));
        assert!(svg.contains("Lock-based Hash Table"));
        assert!(svg.contains("ops/msec"));

        let raw: Vec<Vec<Vec<f64>>> = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("throughput/plot_data/thread-scaling.json"))
                .unwrap(),
        )
        .unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(
            raw[0],
            vec![vec![10.0, 20.0], vec![12.0, 22.0], vec![14.0, 24.0]]
        );
    }

    #[tokio::test]
    async fn run_without_files_renders_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut run = run_group();
        run.labels.clear();
        run.files.clear();
        let tables = RunTables {
            lock_free: ThroughputTable::new(3, 0),
            lock_based: ThroughputTable::new(3, 0),
        };

        ThroughputBars
            .plot(&run, &tables, dir.path(), &Settings::default())
            .await
            .unwrap();

        assert!(!dir.path().join("throughput").exists());
    }
}
