//! REST API server exposing the filter controls and the aggregation engine

mod error;
pub mod handlers;
pub mod routes;
mod state;

pub use error::ApiError;
pub use state::AppState;

use crate::csv_source::CsvChurnSource;
use crate::data_source::ColumnMapping;
use crate::dataset::Dataset;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host address (default: "127.0.0.1")
    pub host: String,
    /// Server port (default: 10000)
    pub port: u16,
    /// Path to the churn CSV file
    pub data_path: String,
    /// Normalized column names of the required fields
    pub columns: ColumnMapping,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 10000,
            data_path: "churn.csv".to_string(),
            columns: ColumnMapping::default(),
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration with the default column mapping
    pub fn new(host: impl Into<String>, port: u16, data_path: impl Into<String>) -> Self {
        ServerConfig {
            host: host.into(),
            port,
            data_path: data_path.into(),
            columns: ColumnMapping::default(),
        }
    }

    /// Replaces the column mapping
    pub fn with_columns(mut self, columns: ColumnMapping) -> Self {
        self.columns = columns;
        self
    }

    /// Address the listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Installs the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Calling this more
/// than once is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

/// Runs the API server
///
/// The dataset is loaded before the listener is bound; a load failure aborts
/// startup.
///
/// # Returns
/// Returns an error if the dataset cannot be loaded, the server fails to
/// start, or it encounters a fatal error
///
/// # Example
/// ```rust,no_run
/// use churn_dashboard::server::{run_server, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ServerConfig::default();
///     run_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let source = CsvChurnSource::with_columns(&config.data_path, config.columns.clone());
    let dataset = Dataset::load(&source).map_err(|err| {
        tracing::error!("Cannot start without churn data: {}", err);
        err
    })?;

    let state = Arc::new(AppState::new(dataset));
    let app = routes::create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:10000");
        assert_eq!(config.columns, ColumnMapping::default());
    }

    #[tokio::test]
    async fn test_run_server_fails_without_data() {
        let config = ServerConfig::new("127.0.0.1", 0, "/no/such/churn.csv");
        let err = run_server(config).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
