//! Scrape HTTP server serving /metrics and /health

use crate::metrics::ExporterMetrics;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

/// Content type of the Prometheus text exposition format.
pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Fixed liveness body, independent of registry state.
pub const HEALTH_BODY: &str = r#"{"status":"healthy","exporter":"wikipedia"}"#;

const ACCESS_TARGET: &str = "herowatch::access";

/// Bind the listening socket. Failure here is fatal for the exporter.
pub fn bind(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(addr)?;
    listener.set_nonblocking(true)?;
    Ok(listener)
}

/// Serve scrapes on `listener` until `shutdown` resolves. In-flight requests complete.
pub async fn serve<F>(
    listener: TcpListener,
    metrics: Arc<ExporterMetrics>,
    shutdown: F,
) -> Result<(), hyper::Error>
where
    F: Future<Output = ()>,
{
    let make_svc = make_service_fn(move |_| {
        let metrics = metrics.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                let metrics = metrics.clone();
                async move { Ok::<_, Infallible>(handle(&req, &metrics)) }
            }))
        }
    });

    let server = Server::from_tcp(listener)?.serve(make_svc);
    tracing::info!("Metrics HTTP server listening on {}", server.local_addr());
    server.with_graceful_shutdown(shutdown).await
}

fn handle(req: &Request<Body>, metrics: &ExporterMetrics) -> Response<Body> {
    let path = req.uri().path();
    let response = match (req.method(), path) {
        (&Method::GET, "/metrics") => match metrics.encode() {
            Ok(body) => with_content_type(Response::new(Body::from(body)), METRICS_CONTENT_TYPE),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode metrics");
                empty(StatusCode::INTERNAL_SERVER_ERROR)
            }
        },
        (&Method::GET, "/health") => {
            with_content_type(Response::new(Body::from(HEALTH_BODY)), "application/json")
        }
        (_, "/metrics" | "/health") => empty(StatusCode::METHOD_NOT_ALLOWED),
        _ => empty(StatusCode::NOT_FOUND),
    };

    tracing::debug!(
        target: ACCESS_TARGET,
        method = %req.method(),
        path = %path,
        status = response.status().as_u16(),
        "http_request"
    );
    response
}

fn with_content_type(mut response: Response<Body>, content_type: &'static str) -> Response<Body> {
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn empty(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::body::to_bytes;

    fn request(method: Method, path: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_string(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body()).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_before_any_refresh() {
        let metrics = ExporterMetrics::new().unwrap();
        let response = handle(&request(Method::GET, "/health"), &metrics);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(body_string(response).await, HEALTH_BODY);
    }

    #[tokio::test]
    async fn test_metrics_exposition() {
        let metrics = ExporterMetrics::new().unwrap();
        metrics.heroes_monitored.set(10.0);
        let response = handle(&request(Method::GET, "/metrics"), &metrics);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], METRICS_CONTENT_TYPE);
        let body = body_string(response).await;
        assert!(body.contains("# HELP wikipedia_heroes_monitored Total heroes monitored"));
        assert!(body.contains("wikipedia_heroes_monitored 10"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_404_with_empty_body() {
        let metrics = ExporterMetrics::new().unwrap();
        let response = handle(&request(Method::GET, "/nope"), &metrics);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_method_is_405() {
        let metrics = ExporterMetrics::new().unwrap();
        let response = handle(&request(Method::POST, "/metrics"), &metrics);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(body_string(response).await.is_empty());
    }
}
