//! HTTP surface: `POST /` with one JSON log entry per request

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;

use crate::service::LogService;

/// Router exposing `service`
pub fn router(service: Arc<LogService>) -> Router {
    Router::new()
        .route("/", post(submit))
        .with_state(service)
}

/// `200` as soon as the line is rendered, `400` with the reason otherwise
async fn submit(State(service): State<Arc<LogService>>, body: Bytes) -> Response {
    match service.ingest(&body) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, format!("getting reader: {e}")).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Mutex, PoisonError};
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use contracts::LineSink;
    use tower::ServiceExt;
    use tracing_subscriber::fmt::MakeWriter;
    use writer::{BufferedSink, MemoryBacking};

    /// In-memory log destination for a scoped subscriber
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            let buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            String::from_utf8_lossy(&buf).into_owned()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_logs() -> (Captured, tracing::subscriber::DefaultGuard) {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        (captured, tracing::subscriber::set_default(subscriber))
    }

    fn service_over(backing: &MemoryBacking) -> Arc<LogService> {
        let sink: Arc<dyn LineSink> = BufferedSink::builder(backing.clone())
            .flush_interval(Duration::from_secs(3600))
            .build()
            .unwrap();
        Arc::new(LogService::builder().sink(sink).build().unwrap())
    }

    fn post_body(body: &'static str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_accepts_valid_entry() {
        let backing = MemoryBacking::new("mem");
        let service = service_over(&backing);

        let response = router(Arc::clone(&service))
            .oneshot(post_body(
                r#"{"message":"disk almost full","type":"warning","timestamp":"2017-10-09 10:45:00"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        service.shutdown().await.unwrap();
        assert_eq!(
            backing.text(),
            "[2017-10-09T10:45:00Z] [WARNING] disk almost full\n"
        );
    }

    #[tokio::test]
    async fn test_rejects_empty_object() {
        let backing = MemoryBacking::new("mem");
        let service = service_over(&backing);

        let response = router(service).oneshot(post_body("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let text = body_text(response).await;
        assert!(text.starts_with("getting reader: "), "got: {text}");
        assert!(text.contains("empty object"), "got: {text}");
    }

    #[tokio::test]
    async fn test_rejects_corrupted_payload() {
        let backing = MemoryBacking::new("mem");
        let service = service_over(&backing);

        let response = router(service)
            .oneshot(post_body("{\"message\":"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("corrupted payload"));
    }

    #[tokio::test]
    async fn test_rejects_missing_message() {
        let backing = MemoryBacking::new("mem");
        let service = service_over(&backing);

        let response = router(service)
            .oneshot(post_body(r#"{"type":"error"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("empty message"));
    }

    #[tokio::test]
    async fn test_only_post_is_routed() {
        let backing = MemoryBacking::new("mem");
        let service = service_over(&backing);

        let request = Request::builder()
            .method(Method::GET)
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let response = router(service).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_closed_sink_is_logged_not_returned() {
        let (logs, _guard) = capture_logs();
        let open = MemoryBacking::new("main");
        let closed = MemoryBacking::new("audit");
        let sinks: Vec<Arc<dyn LineSink>> = [&open, &closed]
            .into_iter()
            .map(|backing| {
                BufferedSink::builder(backing.clone())
                    .flush_interval(Duration::from_secs(3600))
                    .build()
                    .unwrap() as Arc<dyn LineSink>
            })
            .collect();
        sinks[1].close().unwrap();
        let service = Arc::new(LogService::builder().sinks(sinks).build().unwrap());

        let response = router(Arc::clone(&service))
            .oneshot(post_body(r#"{"message":"kept"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        service.shutdown().await.unwrap();
        assert!(open.text().ends_with("] [INFO] kept\n"), "got: {}", open.text());
        assert!(closed.text().is_empty());

        let logs = logs.text();
        assert!(logs.contains("sink 'audit' is closed"), "logs: {logs}");
        assert!(logs.contains("Delivering line"), "logs: {logs}");
    }

    #[tokio::test]
    async fn test_rejection_is_logged() {
        let (logs, _guard) = capture_logs();
        let backing = MemoryBacking::new("mem");
        let service = service_over(&backing);

        let response = router(service).oneshot(post_body("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(logs.text().contains("empty object"));
    }
}
