use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::AppConfig;

pub fn run() -> std::io::Result<()> {
    let config = AppConfig::load();
    let log_level = config
        .as_ref()
        .map(|config| config.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    let filter = EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = config.map_err(|err| {
        error!(error = %err, "Failed to load configuration");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string())
    })?;

    actix_web::rt::System::new().block_on(async move {
        let state = crate::infrastructure::bootstrap::setup(config).await;
        info!(
            host = %state.config.http.host,
            port = state.config.http.port,
            "Starting venue HTTP server"
        );
        crate::interfaces::http::start_server(state)?.await
    })
}
