use std::path::PathBuf;

use clap::{Parser, Subcommand};
use common::{config::Config, measurement::extract_run, util::write_csv};
use eyre::{Context, Result, bail};
use tokio::fs::{create_dir_all, read_to_string, remove_dir_all};
use tracing::error;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long)]
    log: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List run groups declared in a config
    Ls {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: String,
    },
    /// Extract throughput tables and render all configured plots
    Plot {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: String,
        /// Directory the measurement file paths are relative to
        #[arg(short, long, default_value = ".")]
        data_dir: String,
        /// Directory the plots folder is created in
        #[arg(short, long, default_value = ".")]
        out_dir: String,
    },
    /// Extract throughput tables and print them as CSV
    Print {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: String,
        #[arg(short, long, default_value = ".")]
        data_dir: String,
        /// Only print this run group
        #[arg(short, long)]
        run: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let modules: &[&str] = &["common", "throughput_basic"];
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("hashtable_plots={log_level}"));

    if !args.log.is_empty() {
        for log in &args.log {
            env_filter = env_filter.add_directive(log.parse()?);
        }
    }

    for module in modules {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking))
        .init();

    default_plots::init_plots();

    match args.command {
        Commands::Ls { config_file } => list_runs(&config_file).await?,
        Commands::Plot {
            config_file,
            data_dir,
            out_dir,
        } => {
            if let Err(err) = plot(&config_file, &data_dir, &out_dir).await {
                error!("{err:#?}");
                return Err(err);
            }
        }
        Commands::Print {
            config_file,
            data_dir,
            run,
        } => print_tables(&config_file, &data_dir, run).await?,
    };

    Ok(())
}

async fn load_config(config_file: &str) -> Result<Config> {
    let config: Config = serde_yml::from_str(&read_to_string(config_file).await?)
        .context(format!("Parse {config_file}"))?;
    config.validate()?;
    Ok(config)
}

async fn list_runs(config_file: &str) -> Result<()> {
    let config = load_config(config_file).await?;
    for run in &config.runs {
        println!(
            "{} -> {} files, {} iterations",
            run.name,
            run.files.len(),
            run.iterations
        );
    }
    Ok(())
}

async fn plot(config_file: &str, data_dir: &str, out_dir: &str) -> Result<()> {
    let config = load_config(config_file).await?;
    let data_path = PathBuf::from(data_dir);
    let plot_path = PathBuf::from(out_dir).join("plots");
    _ = remove_dir_all(&plot_path).await;
    create_dir_all(&plot_path).await?;

    for run in &config.runs {
        let tables = extract_run(&data_path, run).await?;
        common::plot::plot(&run.plots, run, &tables, &plot_path, &config.settings).await?;
    }

    Ok(())
}

async fn print_tables(config_file: &str, data_dir: &str, only: Option<String>) -> Result<()> {
    let config = load_config(config_file).await?;
    let data_path = PathBuf::from(data_dir);

    let mut found = false;
    for run in &config.runs {
        if let Some(name) = &only
            && name != &run.name
        {
            continue;
        }
        found = true;

        let tables = extract_run(&data_path, run).await?;

        let mut header = vec!["variant".to_owned(), run.x_label.clone()];
        header.extend((0..run.iterations).map(|j| format!("iter_{j}")));

        let mut rows = Vec::new();
        for (variant, table) in [
            ("lock-free", &tables.lock_free),
            ("lock-based", &tables.lock_based),
        ] {
            for i in 0..table.columns() {
                let mut row = vec![variant.to_owned(), run.labels[i].clone()];
                row.extend(table.column(i).iter().map(|x| x.to_string()));
                rows.push(row);
            }
        }
        write_csv(std::io::stdout(), &header, &rows)?;
    }

    if let Some(name) = only
        && !found
    {
        bail!("No run group named {name}");
    }
    Ok(())
}
