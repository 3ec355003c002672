use std::path::PathBuf;

use clap::Parser;
use gaze_pipeline_lib::Command;

#[derive(Parser)]
#[command(name = "gaze-pipeline", about = "Calibrated gaze recording, sync and analysis")]
struct Cli {
    /// Directory holding settings.json and the local measurement store
    #[arg(long, env = "GAZE_DATA_DIR", default_value = ".gaze-pipeline")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    gaze_pipeline_lib::run(cli.data_dir, cli.command).await
}
