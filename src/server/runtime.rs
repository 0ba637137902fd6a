//! Transport adapters for the assembled pipeline.
//!
//! Both transports serve the same [`Router`] value; only the way requests
//! arrive differs.
//!
//! - Listener mode binds a TCP socket and serves until SIGTERM / Ctrl-C,
//!   letting in-flight requests finish.
//! - Single-invocation mode hands the router to the AWS Lambda HTTP runtime,
//!   which calls it once per incoming event. No socket is opened here.

use axum::{body::Body, response::Response, Router};
use http::Request;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tracing::info;

/// Run one request through the pipeline and return its response.
///
/// This is the callable unit an external invoker uses; it is also how the
/// tests drive the pipeline.
pub async fn invoke(router: &Router, request: Request<Body>) -> Response {
    match router.clone().oneshot(request).await {
        Ok(response) => response,
        Err(infallible) => match infallible {},
    }
}

/// Serve the router on `listener` until a shutdown signal arrives.
pub async fn serve_listener(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    info!(address = %addr, "HTTP server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

/// Hand the router to the serverless runtime.
///
/// Returns when the runtime shuts down, or with the runtime's error.
pub async fn run_single_invocation(router: Router) -> Result<(), lambda_http::Error> {
    info!("Handing pipeline to the serverless runtime");
    lambda_http::run(router).await
}

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both SIGTERM and SIGINT; elsewhere only Ctrl-C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
