use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Cancels `cancelation` on Ctrl-C. Returns early if something else cancelled it first.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}
