// File: ./src/client/middleware.rs
//! Tower middleware adding the ClickUp personal token to every request.
use http::{HeaderValue, Request};
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

#[derive(Clone, Debug)]
pub struct TokenAuthLayer {
    token: Option<HeaderValue>,
}

impl TokenAuthLayer {
    /// An empty or non-ASCII token adds no header; ClickUp then answers 401.
    pub fn new(token: &str) -> Self {
        let token = if token.is_empty() {
            None
        } else {
            HeaderValue::from_str(token).ok().map(|mut val| {
                val.set_sensitive(true);
                val
            })
        };
        Self { token }
    }
}

impl<S> Layer<S> for TokenAuthLayer {
    type Service = TokenAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TokenAuthService {
            inner,
            token: self.token.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TokenAuthService<S> {
    inner: S,
    token: Option<HeaderValue>,
}

impl<S, ReqBody> Service<Request<ReqBody>> for TokenAuthService<S>
where
    S: Service<Request<ReqBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        // ClickUp personal tokens go in the header verbatim, no scheme.
        if let Some(val) = &self.token {
            req.headers_mut()
                .insert(http::header::AUTHORIZATION, val.clone());
        }
        self.inner.call(req)
    }
}
