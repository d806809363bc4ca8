use tokio::select;
use tokio_util::sync::CancellationToken;

/// Cancels `cancellation` on Ctrl-C. Returns early when the token is cancelled elsewhere.
pub async fn detect_shutdown(cancellation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancellation.cancel();
        },
        _ = cancellation.cancelled() => (),
    };
}
