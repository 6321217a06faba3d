// ────────────────────────────────
// src/server/builder.rs
// ────────────────────────────────
use anyhow::{anyhow, Context, Result};
use hyper::{server::conn::Http, Body, Request, Response};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::Service;

/// Assembles the operator endpoint: where to listen and which routing
/// handler answers.
pub struct ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    addr: SocketAddr,
    handler: Option<H>,
}

impl<H> ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr, handler: None }
    }

    pub fn with_handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Bind and answer operator requests until the listener fails.
    pub async fn serve(self) -> Result<()> {
        let handler = self
            .handler
            .ok_or_else(|| anyhow!("operator endpoint has no handler"))?;
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("Failed to bind operator endpoint on {}", self.addr))?;
        tracing::info!("Operator endpoint listening on {}", self.addr);

        Self::accept_loop(listener, handler).await
    }

    async fn accept_loop(listener: TcpListener, handler: H) -> Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            let svc = handler.clone();

            tokio::spawn(async move {
                if let Err(err) = Http::new().serve_connection(stream, svc).await {
                    tracing::warn!(%peer, %err, "operator connection error");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{router::status_response, RequestHandler, Router};
    use hyper::{Method, StatusCode};

    #[tokio::test]
    async fn test_serve_without_handler_fails() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let err = ServerBuilder::<RequestHandler>::new(addr)
            .serve()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no handler"));
    }

    #[tokio::test]
    async fn test_answers_routed_requests_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = Router::new().route(Method::GET, "/health", |_| async {
            status_response(StatusCode::OK, "OK")
        });
        tokio::spawn(ServerBuilder::<RequestHandler>::accept_loop(listener, RequestHandler::new(router)));

        let response = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.text().await.unwrap(), "OK");
    }
}
