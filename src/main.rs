use docroot::config::Config;
use docroot::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    tracing::info!(
        root = %cfg.static_files.document_root.display(),
        "Serving document root"
    );

    tokio::select! {
        res = server::run(&cfg) => {
            if let Err(e) = res {
                tracing::error!(error = %e, "Listener failed, exiting");
                std::process::exit(1);
            }
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
