//! In-process stand-in for the YouTube Data API, for tests.
//!
//! Serves whatever the route closure returns for each request and records the requested
//! path and query so that tests can assert on what was sent.

use http_body_util::Full;
use hyper::body::{self, Bytes};
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::io;
use std::sync::{Arc, Mutex};

type Route = dyn Fn(&str, &str) -> (StatusCode, String) + Send + Sync;

pub(crate) struct StubApi {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubApi {
    /// Starts serving on a random local port. `route` receives the path and the raw query.
    pub(crate) async fn start<F>(route: F) -> Self
    where
        F: Fn(&str, &str) -> (StatusCode, String) + Send + Sync + 'static,
    {
        let route: Arc<Route> = Arc::new(route);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let socket = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind to localhost");
        let addr = socket.local_addr().expect("get local address");

        let recorded = requests.clone();
        tokio::spawn(async move {
            while let Ok((conn, _)) = socket.accept().await {
                let conn = hyper_util::rt::TokioIo::new(conn);
                let route = route.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<body::Incoming>| {
                        let route = route.clone();
                        let recorded = recorded.clone();
                        async move {
                            let path = req.uri().path().to_string();
                            let query = req.uri().query().unwrap_or("").to_string();
                            recorded
                                .lock()
                                .expect("request log poisoned")
                                .push(format!("{path}?{query}"));
                            let (status, body) = route(&path, &query);
                            let mut response = Response::new(Full::<Bytes>::from(body));
                            *response.status_mut() = status;
                            Ok::<_, Infallible>(response)
                        }
                    });
                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(conn, service)
                        .await;
                });
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Every request received so far, as `path?query`, in arrival order.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("request log poisoned").clone()
    }
}

/// Extracts and decodes a single query parameter from a recorded `path?query` string.
pub(crate) fn query_param(request: &str, name: &str) -> Option<String> {
    let (_, query) = request.split_once('?')?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// Formatted log output collected by a thread-local subscriber.
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Installs a subscriber at `level` for the current thread until the guard drops.
    pub(crate) fn install(level: tracing::Level) -> (Self, tracing::subscriber::DefaultGuard) {
        let logs = Self::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(level)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log buffer poisoned")).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .expect("log buffer poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
