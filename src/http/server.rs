//! HTTP server setup and the gateway front controller.
//!
//! # Responsibilities
//! - Create the Axum router with a catch-all proxy handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Rewrite each request for the upstream and stamp routing headers
//! - Forward it and hand the response to the transformation driver
//! - Map failures to 500 / 502 and record metrics

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Request, StatusCode, Version},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::http::headers::{strip_hop_by_hop, X_KDEX_PROXY_APP_ALIAS, X_KDEX_PROXY_APP_PATH};
use crate::http::request::{self, propagate_request_id_layer, set_request_id_layer};
use crate::http::response::TransformationDriver;
use crate::lifecycle::shutdown;
use crate::net::egress_ip;
use crate::observability::metrics::{self, TransformOutcome};
use crate::routing::{PathRewriter, RewriteError, RoutingContext};
use crate::session::{AnonymousSessions, SessionProvider};
use crate::transform::{BuildError, ProxiedRequest, TransformError, TransformerChain};

/// Errors constructing or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Upstream(#[from] RewriteError),

    #[error("failed to build transformer chain: {0}")]
    Chain(#[from] BuildError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub rewriter: Arc<PathRewriter>,
    pub driver: Arc<TransformationDriver>,
    pub client: Client<HttpConnector, Body>,
    pub sessions: Arc<dyn SessionProvider>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    config: ProxyConfig,
    state: AppState,
}

impl HttpServer {
    /// Build the server and its request pipeline from `config`.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let rewriter = PathRewriter::from_config(&config.proxy)?;
        let chain = TransformerChain::from_config(&config)?;
        let driver = TransformationDriver::new(chain, config.transform.max_document_bytes);

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            rewriter: Arc::new(rewriter),
            driver: Arc::new(driver),
            client,
            sessions: Arc::new(AnonymousSessions),
        };

        Ok(Self { config, state })
    }

    /// Resolve sessions with `provider` instead of treating everyone as
    /// logged out.
    pub fn with_session_provider(mut self, provider: impl SessionProvider + 'static) -> Self {
        self.state.sessions = Arc::new(provider);
        self
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Serve on `listener` until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.proxy.upstream_address,
            apps = self.config.apps.len(),
            transformers = self.state.driver.chain().len(),
            "HTTP server starting"
        );

        let app = Self::build_router(&self.config, self.state)
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Stamp the routed app onto the upstream request, dropping any
/// client-supplied values.
fn set_routing_headers(headers: &mut HeaderMap, routing: &RoutingContext) {
    headers.remove(X_KDEX_PROXY_APP_ALIAS);
    headers.remove(X_KDEX_PROXY_APP_PATH);

    for (name, value) in [
        (X_KDEX_PROXY_APP_ALIAS, &routing.app_alias),
        (X_KDEX_PROXY_APP_PATH, &routing.app_path),
    ] {
        if value.is_empty() {
            continue;
        }
        match HeaderValue::from_str(value) {
            Ok(v) => {
                headers.insert(name, v);
            }
            Err(_) => tracing::debug!(header = %name, "Routing value is not a valid header"),
        }
    }
}

fn into_body(response: hyper::Response<hyper::body::Incoming>) -> Response {
    response.map(Body::new)
}

/// Catch-all proxy handler.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let request_id = request::request_id(request.headers()).to_string();
    let method = request.method().clone();

    let (mut parts, body) = request.into_parts();
    let session = state.sessions.resolve(&parts.headers);
    let egress = egress_ip().await;

    let routing = match state.rewriter.rewrite(&mut parts, Some(client_addr.ip()), egress) {
        Ok(routing) => routing,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream request");
            metrics::record_request(method.as_str(), 500, start);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Invalid upstream request").into_response();
        }
    };

    set_routing_headers(&mut parts.headers, &routing);
    strip_hop_by_hop(&mut parts.headers);
    parts.headers.remove(header::ACCEPT_ENCODING);
    parts.version = Version::HTTP_11;

    let proxied = ProxiedRequest {
        method: method.clone(),
        uri: parts.uri.clone(),
        headers: parts.headers.clone(),
        routing,
        session,
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        upstream = %proxied.uri,
        "Proxying request"
    );

    let upstream = match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => into_body(response),
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_request(method.as_str(), 502, start);
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };

    let transformable =
        TransformationDriver::should_transform(&method, upstream.status(), upstream.headers());
    let mut response = match state.driver.process(&proxied, upstream).await {
        Ok(response) => {
            if transformable {
                metrics::record_transform(TransformOutcome::Applied);
            }
            response
        }
        Err(e) => {
            let transformer = match &e {
                TransformError::Transformer { name, .. } => *name,
                _ => "",
            };
            tracing::error!(
                request_id = %request_id,
                transformer = %transformer,
                error = %e,
                "Response transformation failed"
            );
            metrics::record_transform(TransformOutcome::Failed);
            metrics::record_request(method.as_str(), 500, start);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Response transformation failed").into_response();
        }
    };

    strip_hop_by_hop(response.headers_mut());
    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}
