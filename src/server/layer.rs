//! Tower layer enforcing the rule chain in front of a service
//!
//! Rules see the normalized request path; a path that cannot be normalized
//! is answered with `400` and never reaches the inner service.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/user/info", get(info))
//!     .layer(AuthzLayer::new(engine));
//! ```

use crate::access_control::{AuthRequest, AuthorizationEngine, Decision};
use crate::server::path::normalize_path;
use crate::server::token::TokenExtractor;
use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

#[derive(Clone)]
pub struct AuthzLayer {
    engine: Arc<AuthorizationEngine>,
    tokens: Arc<TokenExtractor>,
}

impl AuthzLayer {
    /// Layer reading `Authorization: Bearer <token>`
    pub fn new(engine: Arc<AuthorizationEngine>) -> Self {
        Self {
            engine,
            tokens: Arc::new(TokenExtractor::default()),
        }
    }

    pub fn with_token_extractor(mut self, tokens: TokenExtractor) -> Self {
        self.tokens = Arc::new(tokens);
        self
    }
}

impl<S> Layer<S> for AuthzLayer {
    type Service = AuthzMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthzMiddleware {
            inner,
            engine: self.engine.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthzMiddleware<S> {
    inner: S,
    engine: Arc<AuthorizationEngine>,
    tokens: Arc<TokenExtractor>,
}

impl<S> Service<Request<Body>> for AuthzMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // The clone may not be ready; keep the driven instance for this call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let engine = self.engine.clone();

        let method = req.method().as_str().to_string();
        let path = normalize_path(req.uri().path());
        let token = self.tokens.extract(req.headers());

        Box::pin(async move {
            let path = match path {
                Ok(path) => path,
                Err(error) => return Ok(error.into_response()),
            };
            let request = AuthRequest::new(&path)
                .method(&method)
                .token(token.as_deref());

            match engine.evaluate_request(request).await {
                Decision::Allow => inner.call(req).await,
                Decision::Deny(denial) => Ok(denial.into_response()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::{LoginCheck, Rule, RuleChain};
    use crate::auth::InMemoryIdentityStore;
    use axum::{Router, http::StatusCode, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        let store = Arc::new(InMemoryIdentityStore::new().with_user(
            "10001",
            "tok-1",
            Vec::<String>::new(),
            Vec::<String>::new(),
        ));
        let rule = Rule::builder(LoginCheck)
            .include("/**")
            .exclude("/auth/doLogin")
            .build()
            .unwrap();
        let engine = Arc::new(AuthorizationEngine::new(
            RuleChain::new(vec![rule]),
            store.clone(),
            store,
        ));

        Router::new()
            .route("/user/info", get(|| async { "info" }))
            .route("/auth/doLogin", get(|| async { "login" }))
            .layer(AuthzLayer::new(engine))
    }

    #[tokio::test]
    async fn test_denies_without_token() {
        let response = app()
            .oneshot(Request::get("/user/info").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_allows_with_token() {
        let response = app()
            .oneshot(
                Request::get("/user/info")
                    .header("authorization", "Bearer tok-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dot_segments_cannot_skip_login() {
        let response = app()
            .oneshot(
                Request::get("/auth/doLogin/../../user/info")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app()
            .oneshot(Request::get("/auth/../../etc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_excluded_path_passes() {
        let response = app()
            .oneshot(Request::get("/auth/doLogin").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
