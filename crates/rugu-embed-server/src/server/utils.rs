use std::future::Future;
use std::ops::RangeInclusive;
use std::result;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::signal;

/// How long blocking work, such as a model load, may keep the process alive once the
/// server has stopped.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Run `future` to completion, then shut `runtime` down. Blocking tasks still running after
/// `grace` are abandoned.
pub fn block_on_then_shutdown<F>(runtime: Runtime, future: F, grace: Duration) -> F::Output
where
    F: Future,
{
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(grace);
    output
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

const PORT_RANGE: RangeInclusive<u16> = 1..=65535;

pub fn port_in_range(s: &str) -> result::Result<u16, String> {
    let port: u16 = s
        .parse()
        .map_err(|_| format!("`{s}` isn't a port number"))?;
    if PORT_RANGE.contains(&port) {
        Ok(port)
    } else {
        Err(format!(
            "port not in range {}-{}",
            PORT_RANGE.start(),
            PORT_RANGE.end()
        ))
    }
}
