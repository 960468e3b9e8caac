//! HTTP gateway: request routing, body handling, and status mapping.
//!
//! Uses hyper http1 with TokioIo, one task per connection. Dropping a
//! connection drops its in-flight handler future, which aborts any
//! pending store or relocator call for that request.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode, header};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use cachegate_client::ObjectStore;
use cachegate_core::config::AppConfig;
use cachegate_core::{Error, Resolver};

/// Largest accepted request body. Requests are a single URL plus flags,
/// so anything bigger is rejected outright.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state: the configuration and the clients built once
/// at startup, passed by reference into every request.
pub struct AppState {
    pub config: AppConfig,
    pub resolver: Resolver,
    pub objects: ObjectStore,
}

/// The external request body: a URL plus cache-control options.
///
/// `expiry_seconds` is accepted for compatibility but currently unused by
/// the core logic.
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub url: String,
    #[serde(default)]
    pub force_refetch: bool,
    #[serde(default)]
    pub expiry_seconds: i64,
}

/// Accept loop: serve connections until the caller drops the future.
pub async fn run(state: Arc<AppState>, listener: TcpListener) -> anyhow::Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        debug!("error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests.
async fn handle_request(
    state: Arc<AppState>, addr: SocketAddr, req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (&method, path.as_str()) {
        (&Method::POST, "/") => {
            let body = match read_body(req).await {
                Ok(body) => body,
                Err(resp) => return Ok(resp),
            };
            resolve_request(&state, &body).await
        }
        (&Method::GET, "/healthz") => text_response(StatusCode::OK, "ok"),
        (&Method::GET, p) if p.starts_with("/objects/") => serve_object(&state, p).await,
        (_, "/") => text_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed"),
        _ => text_response(StatusCode::NOT_FOUND, "not found"),
    };

    Ok(response)
}

async fn read_body(req: Request<Incoming>) -> Result<Bytes, Response<Full<Bytes>>> {
    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|e| text_response(StatusCode::BAD_REQUEST, &e.to_string()))?
        .to_bytes();

    if body.len() > MAX_BODY_BYTES {
        return Err(text_response(StatusCode::BAD_REQUEST, "request body too large"));
    }

    Ok(body)
}

/// Handle a resolve request: decode, delegate to the orchestrator, and
/// serialize the resulting record.
pub async fn resolve_request(state: &AppState, body: &[u8]) -> Response<Full<Bytes>> {
    let request: ResolveRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => return text_response(StatusCode::BAD_REQUEST, &Error::InvalidRequest(e.to_string()).to_string()),
    };

    match state
        .resolver
        .resolve(&request.url, request.force_refetch, request.expiry_seconds)
        .await
    {
        Ok(record) => match serde_json::to_vec(&record) {
            Ok(json) => Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Full::new(Bytes::from(json)))
                .unwrap_or_else(|_| text_response(StatusCode::INTERNAL_SERVER_ERROR, "response build failed")),
            Err(e) => text_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
        },
        Err(err) => text_response(status_for(&err), &err.to_string()),
    }
}

/// Map a core error to the caller-visible status code.
///
/// Everything is a client-retryable 400 except the post-write re-read
/// miss, which is a hard 422.
fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Inconsistent => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::BAD_REQUEST,
    }
}

/// Serve a deposited object so returned cached URLs resolve.
///
/// Paths look like `/objects/{bucket}/{host}/{digest}`; names that do not
/// match the configured bucket or that try to escape it are rejected.
async fn serve_object(state: &AppState, path: &str) -> Response<Full<Bytes>> {
    let rest = &path["/objects/".len()..];
    let Some((bucket, name)) = rest.split_once('/') else {
        return text_response(StatusCode::NOT_FOUND, "not found");
    };

    if bucket != state.config.bucket {
        return text_response(StatusCode::NOT_FOUND, "not found");
    }

    let object_path = match state.objects.object_path(name) {
        Ok(p) => p,
        Err(_) => return text_response(StatusCode::NOT_FOUND, "not found"),
    };

    match tokio::fs::read(&object_path).await {
        Ok(content) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(Full::new(Bytes::from(content)))
            .unwrap_or_else(|_| text_response(StatusCode::INTERNAL_SERVER_ERROR, "response build failed")),
        Err(_) => text_response(StatusCode::NOT_FOUND, "not found"),
    }
}

fn text_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(message.to_string())))
        .unwrap_or_else(|_| {
            let mut resp = Response::new(Full::new(Bytes::new()));
            *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            resp
        })
}
