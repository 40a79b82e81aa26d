use certification_scoring::{
    config::{get_config, init_config},
    database::pool::{create_pool, run_migrations},
    AppState,
};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_format.as_deref() == Some("json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let pool = create_pool().await?;
    run_migrations(&pool).await?;

    let app_state = AppState::new(pool, config.scoring.clone());
    let idle = Duration::from_millis(config.event_poll_interval_ms);
    info!(poll_interval_ms = config.event_poll_interval_ms, "Event worker started");

    let worker = {
        let state = app_state.clone();
        tokio::spawn(async move {
            loop {
                match state.event_queue_service.run_once(&state).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tokio::time::sleep(idle).await;
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "Event worker error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        })
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        res = worker => {
            if let Err(e) = res {
                tracing::error!(error = ?e, "Event worker stopped");
            }
        }
    }

    app_state.pool.close().await;
    Ok(())
}
