//! Logging integration tests.
//!
//! Tests verify that, with request tracing enabled, a server error is
//! reported at ERROR once, by the code that renders it.

use std::io;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

use medilink_api::create_router;

use super::test_utils::{get_request, send, test_config, test_mounts};

/// In-memory log sink shared with the fmt subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn count(&self, needle: &str) -> usize {
        self.lines().iter().filter(|l| l.contains(needle)).count()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(Level::TRACE)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

#[tokio::test]
async fn test_handler_error_logged_once_with_tracing() {
    let (logs, _guard) = capture();
    let router = create_router(test_mounts(), test_config().with_tracing(true));

    let response = send(&router, get_request("/api/v1/album/fail")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(logs.count(" ERROR "), 1, "{:#?}", logs.lines());
    assert_eq!(logs.count("album store unavailable"), 1);
    // The trace layer still records the failure, below ERROR
    assert_eq!(logs.count("response failed"), 1);
}

#[tokio::test]
async fn test_panic_logged_once_with_tracing() {
    let (logs, _guard) = capture();
    let router = create_router(test_mounts(), test_config().with_tracing(true));

    let response = send(&router, get_request("/api/v1/album/panic")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(logs.count(" ERROR "), 1, "{:#?}", logs.lines());
    assert_eq!(logs.count("Unhandled failure"), 1);
}

#[tokio::test]
async fn test_not_found_not_logged_as_error() {
    let (logs, _guard) = capture();
    let router = create_router(test_mounts(), test_config().with_tracing(true));

    let response = send(&router, get_request("/nowhere")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(logs.count(" ERROR "), 0, "{:#?}", logs.lines());
}
