use octoping_common::config::AppConfig;
use octoping_engine::pipeline::DeliveryPipeline;
use octoping_engine::relay::Relay;
use octoping_engine::render::Renderer;
use octoping_engine::state::StateStore;
use octoping_notifier::WebhookNotifier;
use octoping_poller::github::GithubFeed;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "octoping=info,octoping_poller=info,octoping_engine=info,octoping_notifier=info"
                    .into()
            }),
        )
        .json()
        .init();

    tracing::info!("Octoping starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    let feed = GithubFeed::new(config.github_api_url.clone(), config.github_token.clone())
        .with_timeout(config.github_timeout());
    let notifier =
        WebhookNotifier::new(config.webhook_url.clone()).with_timeout(config.webhook_timeout());
    let renderer = Renderer::new(&config.github_api_url, &config.github_web_url);
    let store = StateStore::new(config.state_file.clone());

    // A corrupt state file aborts startup rather than replaying the whole feed
    let mut relay = Relay::start(
        feed,
        DeliveryPipeline::new(notifier, renderer),
        store,
        config.poll_interval(),
    )
    .await?;

    tracing::info!(
        api_url = %config.github_api_url,
        state_file = %config.state_file.display(),
        poll_interval_secs = config.poll_interval_secs,
        "Starting notification relay"
    );

    if let Err(e) = relay.run(shutdown_signal()).await {
        tracing::error!(error = %e, "Relay exited with error");
        return Err(e.into());
    }

    tracing::info!("Octoping stopped.");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Received shutdown signal, stopping gracefully...");
}
