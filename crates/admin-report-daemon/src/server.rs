use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use admin_report_db::{HabitsReportStore, TasksReportStore};
use anyhow::{Context, Result};
use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::reports::ReportGenerator;

type ResponseBody = BoxBody<Bytes, Infallible>;

/// How long shutdown waits for in-flight connections before dropping them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Everything a request handler needs: the generation pipeline and both stores.
pub struct AppState {
    pub generator: ReportGenerator,
    pub habits_store: HabitsReportStore,
    pub tasks_store: TasksReportStore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Domain {
    Habits,
    Tasks,
}

impl Domain {
    fn name(self) -> &'static str {
        match self {
            Domain::Habits => "habits",
            Domain::Tasks => "tasks",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Create(Domain),
    Get(Domain, &'a str),
}

fn route(path: &str) -> Option<Route<'_>> {
    let rest = path.strip_prefix("/admin/")?;
    let mut segments = rest.split('/');

    let domain = match segments.next()? {
        "habits" => Domain::Habits,
        "tasks" => Domain::Tasks,
        _ => return None,
    };
    if segments.next()? != "reports" {
        return None;
    }

    match (segments.next(), segments.next()) {
        (None, _) => Some(Route::Create(domain)),
        (Some(id), None) if !id.is_empty() => Some(Route::Get(domain, id)),
        _ => None,
    }
}

/// A failed request: what the client sees and the status it gets.
struct AppError {
    message: String,
    code: StatusCode,
}

fn app_error(what: &str, err: impl Display) -> AppError {
    AppError {
        message: format!("could not {}: {}", what, err),
        code: StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// HTTP front for report creation and retrieval.
pub struct ReportServer {
    listener: TcpListener,
    state: Arc<AppState>,
}

impl ReportServer {
    pub async fn bind(bind_address: &str, port: u16, state: AppState) -> Result<Self> {
        let addr: SocketAddr =
            format!("{}:{}", bind_address, port).parse().context("Failed to parse bind address")?;

        let listener = TcpListener::bind(addr).await.context("Failed to bind report server")?;

        Ok(Self { listener, state: Arc::new(state) })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().context("Failed to read report server address")
    }

    /// Accept connections until `shutdown` resolves, then let in-flight
    /// connections finish before returning. Each connection gets its own task.
    pub async fn serve_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("Report server listening on {}", self.local_addr()?);
        tokio::pin!(shutdown);

        let (stop_tx, stop_rx) = watch::channel(false);
        let mut connections = JoinSet::new();

        loop {
            let (stream, peer_addr) = tokio::select! {
                _ = &mut shutdown => break,
                Some(_) = connections.join_next(), if !connections.is_empty() => continue,
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                        if let Some(pause) = accept_backoff(&e) {
                            tokio::time::sleep(pause).await;
                        }
                        continue;
                    }
                },
            };

            debug!("New connection from {}", peer_addr);

            let state = Arc::clone(&self.state);
            let io = TokioIo::new(stream);
            let mut stop = stop_rx.clone();

            connections.spawn(async move {
                let service = service_fn(move |req| handle_request(Arc::clone(&state), req));
                let conn = http1::Builder::new().serve_connection(io, service);
                tokio::pin!(conn);

                tokio::select! {
                    result = conn.as_mut() => {
                        if let Err(err) = result {
                            error!("Connection error: {}", err);
                        }
                        return;
                    }
                    _ = stop.changed() => {}
                }

                conn.as_mut().graceful_shutdown();
                if let Err(err) = conn.await {
                    error!("Connection error: {}", err);
                }
            });
        }

        drop(self.listener);
        info!("Report server stopped accepting connections, {} still open", connections.len());

        let _ = stop_tx.send(true);
        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while let Some(joined) = connections.join_next().await {
                if let Err(e) = joined {
                    warn!("Connection task failed: {}", e);
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!("Dropping {} connections still open after shutdown grace", connections.len());
            connections.shutdown().await;
        }

        Ok(())
    }
}

/// Pause to take after a failed `accept()`. Errors tied to a single client
/// are retried at once; anything else (out of file descriptors, for one)
/// backs off so the loop does not spin.
fn accept_backoff(err: &io::Error) -> Option<Duration> {
    match err.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset => None,
        _ => Some(Duration::from_secs(1)),
    }
}

async fn handle_request(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Result<Response<ResponseBody>, Infallible> {
    debug!("Handling {} request to {}", req.method(), req.uri());

    let Some(route) = route(req.uri().path()) else {
        return Ok(text_response(StatusCode::NOT_FOUND, "not found".to_string()));
    };

    if req.method() != Method::GET {
        return Ok(text_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string()));
    }

    let result = match route {
        Route::Create(domain) => create_report(&state, domain).await,
        Route::Get(domain, id) => get_report(&state, domain, id).await,
    };

    Ok(result.unwrap_or_else(|e| {
        error!("Handler error: status code: {}, message: {}", e.code.as_u16(), e.message);
        text_response(e.code, e.message)
    }))
}

async fn create_report(
    state: &AppState,
    domain: Domain,
) -> Result<Response<ResponseBody>, AppError> {
    let report_id = match domain {
        Domain::Habits => {
            let report = state
                .generator
                .generate_habits_report()
                .await
                .map_err(|e| app_error("generate habits report", e))?;
            state.habits_store.add(&report).await.map_err(|e| app_error("add report to db", e))?
        }
        Domain::Tasks => {
            let report = state
                .generator
                .generate_tasks_report()
                .await
                .map_err(|e| app_error("generate tasks report", e))?;
            state.tasks_store.add(&report).await.map_err(|e| app_error("add report to db", e))?
        }
    };

    info!("Created {} report {}", domain.name(), report_id);

    let location = format!("/admin/{}/reports/{}", domain.name(), report_id);
    let location = HeaderValue::try_from(location).map_err(|e| app_error("build redirect", e))?;

    let mut response = with_cors(Response::new(Empty::<Bytes>::new().boxed()));
    *response.status_mut() = StatusCode::FOUND;
    response.headers_mut().insert(header::LOCATION, location);
    Ok(response)
}

async fn get_report(
    state: &AppState,
    domain: Domain,
    id: &str,
) -> Result<Response<ResponseBody>, AppError> {
    let report_id: i64 = id.parse().map_err(|e| app_error("parse reportId from request", e))?;

    match domain {
        Domain::Habits => {
            let report =
                state.habits_store.get(report_id).await.map_err(|e| app_error("get report", e))?;
            json_response(&report)
        }
        Domain::Tasks => {
            let report =
                state.tasks_store.get(report_id).await.map_err(|e| app_error("get report", e))?;
            json_response(&report)
        }
    }
}

fn with_cors(mut response: Response<ResponseBody>) -> Response<ResponseBody> {
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET"));
    response
}

fn json_response<T: Serialize>(value: &T) -> Result<Response<ResponseBody>, AppError> {
    let mut body = serde_json::to_vec(value).map_err(|e| app_error("encode report", e))?;
    body.push(b'\n');

    let mut response = with_cors(Response::new(Full::new(Bytes::from(body)).boxed()));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}

fn text_response(code: StatusCode, message: String) -> Response<ResponseBody> {
    let mut response = with_cors(Response::new(Full::new(Bytes::from(message + "\n")).boxed()));
    *response.status_mut() = code;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_create_and_get() {
        assert_eq!(route("/admin/habits/reports"), Some(Route::Create(Domain::Habits)));
        assert_eq!(route("/admin/tasks/reports"), Some(Route::Create(Domain::Tasks)));
        assert_eq!(route("/admin/habits/reports/12"), Some(Route::Get(Domain::Habits, "12")));
        assert_eq!(route("/admin/tasks/reports/abc"), Some(Route::Get(Domain::Tasks, "abc")));
    }

    #[test]
    fn test_route_rejects_unknown_paths() {
        assert_eq!(route("/"), None);
        assert_eq!(route("/admin/goals/reports"), None);
        assert_eq!(route("/admin/habits"), None);
        assert_eq!(route("/admin/habits/report"), None);
        assert_eq!(route("/admin/habits/reports/"), None);
        assert_eq!(route("/admin/habits/reports/1/extra"), None);
    }

    #[test]
    fn test_app_error_message() {
        let err = app_error("get report", "Not found: report 3 in habits_reports");
        assert_eq!(err.code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "could not get report: Not found: report 3 in habits_reports");
    }

    #[test]
    fn test_accept_backoff() {
        let aborted = io::Error::from(io::ErrorKind::ConnectionAborted);
        assert_eq!(accept_backoff(&aborted), None);

        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert_eq!(accept_backoff(&reset), None);

        // EMFILE
        let exhausted = io::Error::from_raw_os_error(24);
        assert_eq!(accept_backoff(&exhausted), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_text_response_has_cors_headers() {
        let response = text_response(StatusCode::NOT_FOUND, "not found".to_string());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], "GET");
    }
}
