use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod app;

use app::App;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let data_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));

    println!("=== LINE COMPARISON EXPERIMENT ===");
    println!("Platform: {}", std::env::consts::OS);
    println!("Series data directory: {}", data_dir.display());
    println!();
    println!("Setup:   1-4 choose counterbalance group A-D (loads the series)");
    println!("         Up/Down size the blue box until it matches a credit card");
    println!("         SPACE starts the session");
    println!("Trials:  S = same, D = different (lines hide after 3 s,");
    println!("         responses stay open)");
    println!("Done:    E exports results, R restarts, ESC exits\n");

    App::new(data_dir)?.run()
}
