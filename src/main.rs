use std::process;

use brandspend_loader::{run_load, LoaderConfig, RunMode};

fn main() {
    // .env is a local-development convenience; the real environment wins
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match LoaderConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let mode = RunMode::from_env();
    println!("Starting brand spend CSV loader ({} mode)...", mode);

    match run_load(&config, mode) {
        Ok(report) => {
            println!(
                "Load finished: {} BrandDetail rows, {} DailySpend rows in {} chunk(s).",
                report.brand_rows, report.spend_rows, report.spend_chunks
            );
        }
        Err(e) => {
            eprintln!("An error occurred: {}", e);
            process::exit(1);
        }
    }
}
