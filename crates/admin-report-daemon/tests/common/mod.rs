#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

/// Stand-in for an external data provider: answers fixed bodies per path.
pub struct MockProvider {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub async fn spawn_provider(routes: Vec<(&'static str, StatusCode, String)>) -> MockProvider {
    spawn_slow_provider(routes, Duration::ZERO).await
}

/// Provider that waits `delay` before answering each request.
pub async fn spawn_slow_provider(
    routes: Vec<(&'static str, StatusCode, String)>,
    delay: Duration,
) -> MockProvider {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = Arc::new(routes);
    let hits = Arc::new(AtomicUsize::new(0));

    let server_hits = Arc::clone(&hits);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let routes = Arc::clone(&routes);
            let hits = Arc::clone(&server_hits);

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    hits.fetch_add(1, Ordering::SeqCst);
                    let (status, body) = routes
                        .iter()
                        .find(|(path, _, _)| *path == req.uri().path())
                        .map(|(_, status, body)| (*status, body.clone()))
                        .unwrap_or((StatusCode::NOT_FOUND, String::new()));

                    async move {
                        tokio::time::sleep(delay).await;
                        let mut response = Response::new(Full::new(Bytes::from(body)));
                        *response.status_mut() = status;
                        Ok::<_, Infallible>(response)
                    }
                });

                let _ = http1::Builder::new().serve_connection(TokioIo::new(stream), service).await;
            });
        }
    });

    MockProvider { addr, hits }
}

pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}
