use std::path::PathBuf;
use std::sync::Arc;

use abc_simulator::app::SimulatorApp;
use abc_simulator::assistant::GeminiClient;
use abc_simulator::config::AppConfig;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the TOML config; created with commented defaults if missing
    #[arg(long, default_value = "abc-simulator.toml")]
    config: PathBuf,

    /// Override the initial node count
    #[arg(long)]
    node_count: Option<usize>,

    /// Override the directory reports are exported to
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::load_or_default(&args.config);
    if let Some(count) = args.node_count {
        config.simulation.node_count = count;
    }
    if let Some(dir) = args.export_dir {
        config.export.directory = dir;
    }
    info!(
        model = %config.assistant.model,
        nodes = config.simulation.node_count,
        "starting simulator"
    );

    let assistant = Arc::new(GeminiClient::from_env(config.assistant.clone()));

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1440.0, 860.0])
            .with_min_inner_size([1000.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "ABC Simulator",
        options,
        Box::new(move |cc| Ok(Box::new(SimulatorApp::new(cc, config, assistant)))),
    )
}
