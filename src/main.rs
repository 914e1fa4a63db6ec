use activity_ping::cli::run_cli;
use anyhow::Result;
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    run_cli().await.inspect_err(|e| {
        error!("Error running cli {e:?}");
    })?;
    Ok(())
}
