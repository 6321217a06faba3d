// ────────────────────────────────
// src/server/router.rs
// Explicit routing table, built once at startup and handed to the server.
// ────────────────────────────────
use futures::future::BoxFuture;
use hyper::{Body, Method, Request, Response, StatusCode};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

type Route = Arc<dyn Fn(Request<Body>) -> BoxFuture<'static, Response<Body>> + Send + Sync>;

#[derive(Clone, Default)]
pub struct Router {
    routes: HashMap<String, HashMap<Method, Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route<F, Fut>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response<Body>> + Send + 'static,
    {
        let route: Route = Arc::new(
            move |req: Request<Body>| -> BoxFuture<'static, Response<Body>> {
                Box::pin(handler(req))
            },
        );
        self.routes
            .entry(path.to_string())
            .or_default()
            .insert(method, route);
        self
    }

    pub async fn dispatch(&self, req: Request<Body>) -> Response<Body> {
        let Some(methods) = self.routes.get(req.uri().path()) else {
            return status_response(StatusCode::NOT_FOUND, "Not Found");
        };

        match methods.get(req.method()) {
            Some(route) => route(req).await,
            None => status_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
        }
    }
}

pub fn status_response(status: StatusCode, body: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
}
