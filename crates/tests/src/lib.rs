//! # Integration Tests
//!
//! End-to-end tests across the workspace crates: configuration file in,
//! HTTP submissions through the router, lines on disk out.

#[cfg(test)]
mod contract_tests {
    use std::io::Read;

    use contracts::EntryError;
    use entry::LineReader;

    #[test]
    fn test_parsed_entry_renders_through_reader() {
        let body = br#"{"type":"error","message":"boom","timestamp":"2017-10-09T10:45:00+02:00"}"#;
        let entry = entry::parse(body).unwrap();
        let mut line = String::new();
        LineReader::from(entry).read_to_string(&mut line).unwrap();
        assert_eq!(line, "[2017-10-09T10:45:00+02:00] [ERROR] boom");
    }

    #[test]
    fn test_reader_without_timestamp() {
        let reader = LineReader::from_parts("info", "no clock", None);
        assert_eq!(reader.line().unwrap_err(), EntryError::NilTimestamp);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use chrono::DateTime;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{LineSink, SinkError};
    use service::{bootstrap, router, LogService, ServeStrategy, ServiceError};
    use tempfile::tempdir;
    use tower::ServiceExt;
    use writer::{BufferedSink, FileBacking};

    /// Serve strategy that submits a fixed list of bodies, then stops
    struct Scripted {
        bodies: Vec<&'static str>,
        statuses: Arc<Mutex<Vec<StatusCode>>>,
    }

    impl Scripted {
        fn new(bodies: Vec<&'static str>) -> (Self, Arc<Mutex<Vec<StatusCode>>>) {
            let statuses = Arc::new(Mutex::new(Vec::new()));
            let strategy = Self {
                bodies,
                statuses: Arc::clone(&statuses),
            };
            (strategy, statuses)
        }
    }

    impl ServeStrategy for Scripted {
        async fn serve(self, app: Router) -> Result<(), ServiceError> {
            for body in self.bodies {
                let response = app.clone().oneshot(post(body)).await.unwrap();
                self.statuses.lock().unwrap().push(response.status());
            }
            Ok(())
        }
    }

    fn post(body: &'static str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Body::from(body))
            .unwrap()
    }

    fn settings_for(dir: &Path, sinks: &[&str]) -> contracts::Settings {
        let mut toml = String::from("[server]\nshutdown_timeout_ms = 2000\n");
        for name in sinks {
            toml.push_str(&format!(
                "\n[[sinks]]\nname = \"{name}\"\ntype = \"file\"\nlocation = \"{}\"\nflush_interval_ms = 50\n",
                dir.join(format!("{name}.log")).display()
            ));
        }
        ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap()
    }

    /// End-to-end: config -> bootstrap -> POST -> file on disk
    #[tokio::test]
    async fn test_submission_reaches_file() {
        let dir = tempdir().unwrap();
        let settings = settings_for(dir.path(), &["main"]);
        let (strategy, statuses) = Scripted::new(vec![r#"{"message":"hello"}"#, "{}"]);

        bootstrap(&settings, strategy).await.unwrap();

        assert_eq!(
            *statuses.lock().unwrap(),
            vec![StatusCode::OK, StatusCode::BAD_REQUEST]
        );
        let content = fs::read_to_string(dir.path().join("main.log")).unwrap();
        let line = content.strip_suffix('\n').unwrap();
        assert!(!line.contains('\n'), "one line expected: {content:?}");

        let (stamp, rest) = line
            .strip_prefix('[')
            .and_then(|l| l.split_once("] "))
            .unwrap();
        assert_eq!(rest, "[INFO] hello");
        assert!(stamp.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[tokio::test]
    async fn test_every_sink_gets_every_line() {
        let dir = tempdir().unwrap();
        let settings = settings_for(dir.path(), &["a", "b"]);
        let (strategy, _) = Scripted::new(vec![
            r#"{"message":"one","timestamp":"2020-01-01"}"#,
            r#"{"message":"two","type":"warning","timestamp":"2020-01-02 03:04:05"}"#,
            r#"{"message":"three","timestamp":"not a date"}"#,
        ]);

        bootstrap(&settings, strategy).await.unwrap();

        for name in ["a", "b"] {
            let content = fs::read_to_string(dir.path().join(format!("{name}.log"))).unwrap();
            let mut lines: Vec<_> = content.lines().collect();
            lines.sort_unstable();
            assert_eq!(
                lines,
                vec![
                    "[2020-01-01T00:00:00Z] [INFO] one",
                    "[2020-01-02T03:04:05Z] [WARNING] two",
                ]
            );
        }
    }

    #[tokio::test]
    async fn test_existing_file_is_appended() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("main.log");
        fs::write(&path, "previous run\n").unwrap();
        let settings = settings_for(dir.path(), &["main"]);
        let (strategy, _) =
            Scripted::new(vec![r#"{"message":"again","timestamp":"1507545900"}"#]);

        bootstrap(&settings, strategy).await.unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "previous run\n[2017-10-09T10:45:00Z] [INFO] again\n"
        );
    }

    /// Sink that takes a while per write
    struct Sluggish {
        delay: Duration,
    }

    impl LineSink for Sluggish {
        fn name(&self) -> &str {
            "sluggish"
        }

        fn write(&self, payload: &[u8]) -> Result<usize, SinkError> {
            std::thread::sleep(self.delay);
            Ok(payload.len())
        }

        fn flush(&self) -> Result<(), SinkError> {
            Ok(())
        }

        fn close(&self) -> Result<(), SinkError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_slow_sink_does_not_delay_response() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fast.log");
        let fast: Arc<dyn LineSink> = BufferedSink::builder(FileBacking::open(&path).unwrap())
            .build()
            .unwrap();
        let slow: Arc<dyn LineSink> = Arc::new(Sluggish {
            delay: Duration::from_millis(500),
        });
        let service = Arc::new(LogService::builder().sinks([fast, slow]).build().unwrap());

        let started = Instant::now();
        let response = router(Arc::clone(&service))
            .oneshot(post(r#"{"message":"quick"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(started.elapsed() < Duration::from_millis(400));
        assert_eq!(service.in_flight(), 1);

        service.shutdown().await.unwrap();
        assert_eq!(service.in_flight(), 0);
        assert!(fs::read_to_string(&path).unwrap().ends_with("] [INFO] quick\n"));
    }

    #[tokio::test]
    async fn test_shutdown_timeout_still_closes_sinks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("main.log");
        let file: Arc<dyn LineSink> = BufferedSink::builder(FileBacking::open(&path).unwrap())
            .build()
            .unwrap();
        let slow: Arc<dyn LineSink> = Arc::new(Sluggish {
            delay: Duration::from_millis(800),
        });
        let service = LogService::builder()
            .sinks([file, slow])
            .shutdown_timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        service.ingest(br#"{"message":"late"}"#).unwrap();
        service.shutdown().await.unwrap();

        let file = service.distributor().sinks().next().unwrap();
        let err = file.write(b"after").unwrap_err();
        assert!(matches!(err, SinkError::Closed { .. }));
    }
}
