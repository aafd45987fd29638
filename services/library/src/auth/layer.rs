//! Authorization Tower Layer
//!
//! Sits in front of every route of the gRPC server. It sees the HTTP/2
//! request that opens a call, which for streaming methods is the stream
//! establishment, so unary and streamed calls share one code path.

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Request, Response};
use tonic::body::BoxBody;
use tonic::metadata::MetadataMap;
use tower::{Layer, Service};
use tracing::{error, warn};

use crate::auth::authenticator::{Authenticator, Decision};
use crate::middleware::CorrelationId;

/// Layer wrapping services in [`AuthService`].
#[derive(Debug, Clone)]
pub struct AuthLayer {
    authenticator: Arc<Authenticator>,
}

impl AuthLayer {
    /// Creates a layer driven by `authenticator`.
    #[must_use]
    pub fn new(authenticator: Authenticator) -> Self {
        Self {
            authenticator: Arc::new(authenticator),
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            authenticator: Arc::clone(&self.authenticator),
        }
    }
}

/// Service that authorizes each call before handing it to `inner`.
#[derive(Debug, Clone)]
pub struct AuthService<S> {
    inner: S,
    authenticator: Arc<Authenticator>,
}

impl<S, ReqBody> Service<Request<ReqBody>> for AuthService<S>
where
    S: Service<Request<ReqBody>, Response = Response<BoxBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let authenticator = Arc::clone(&self.authenticator);

        Box::pin(async move {
            let correlation_id = CorrelationId::from_extensions(req.extensions());
            let path = req.uri().path().to_string();
            let metadata = MetadataMap::from_headers(req.headers().clone());

            match authenticator.authorize(&path, &metadata).await {
                Ok(Decision::Public) => inner.call(req).await,
                Ok(Decision::Authenticated(identity)) => {
                    req.extensions_mut().insert(identity);
                    inner.call(req).await
                }
                Err(err) => {
                    if err.is_authentication_failure() && !err.is_store_failure() {
                        warn!(
                            method = %path,
                            error_code = err.code().as_str(),
                            error = %err,
                            "Call rejected"
                        );
                    } else {
                        error!(
                            method = %path,
                            error_code = err.code().as_str(),
                            error = %err,
                            "Authorization could not complete"
                        );
                    }
                    Ok(status_response(&err.to_status(correlation_id.0)))
                }
            }
        })
    }
}

/// Trailers-only gRPC response carrying `status`.
fn status_response(status: &tonic::Status) -> Response<BoxBody> {
    let mut response = Response::new(tonic::body::empty_body());
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/grpc"));
    if let Err(e) = status.add_header(response.headers_mut()) {
        error!(error = %e, "Failed to encode status headers");
    }
    response
}
