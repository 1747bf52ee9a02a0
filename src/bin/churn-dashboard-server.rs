//! Churn Dashboard API Server Binary
//!
//! Run with: `cargo run --bin churn-dashboard-server`

use churn_dashboard::{run_server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Note: Tracing is initialized in run_server()
    // Set RUST_LOG environment variable to control log level:
    //   RUST_LOG=debug cargo run --bin churn-dashboard-server

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "10000".to_string())
        .parse::<u16>()
        .unwrap_or(10000);
    let data_path = std::env::var("CHURN_DATA_PATH").unwrap_or_else(|_| "churn.csv".to_string());

    let config = ServerConfig::new(host, port, data_path);

    println!("Starting Churn Dashboard API Server...");
    println!("   Host: {}", config.host);
    println!("   Port: {}", config.port);
    println!("   Data: {}", config.data_path);
    println!();
    println!("Available endpoints:");
    println!("  GET  /health        - Health check and dataset summary");
    println!("  GET  /filters       - Filter control options");
    println!("  GET  /aggregations  - Distributions for the full dataset");
    println!("  POST /aggregations  - Distributions for a filter selection");
    println!();

    run_server(config).await?;

    Ok(())
}
