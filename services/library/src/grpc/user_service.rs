use tonic::{Request, Response, Status};
use tracing::{error, instrument};

use super::correlation_id;
use crate::identity::CredentialIssuer;
use crate::proto::user_service_server::UserService;
use crate::proto::{AuthResponse, User, UserCredentials};

/// `library.UserService`: registration and login. Both methods are public.
#[derive(Debug, Clone)]
pub struct UserServiceImpl {
    credentials: CredentialIssuer,
}

impl UserServiceImpl {
    /// Creates the service.
    #[must_use]
    pub const fn new(credentials: CredentialIssuer) -> Self {
        Self { credentials }
    }
}

#[tonic::async_trait]
impl UserService for UserServiceImpl {
    #[instrument(skip_all, fields(username = %request.get_ref().username))]
    async fn register(&self, request: Request<User>) -> Result<Response<AuthResponse>, Status> {
        let correlation_id = correlation_id(&request);
        let user = request.into_inner();

        let outcome = self
            .credentials
            .register(&user.username, &user.password)
            .await
            .map_err(|e| {
                error!(error = %e, error_code = e.code().as_str(), "Registration failed");
                e.to_status(correlation_id)
            })?;

        Ok(Response::new(AuthResponse {
            token: outcome.token().to_string(),
            message: outcome.message().to_string(),
        }))
    }

    #[instrument(skip_all, fields(username = %request.get_ref().username))]
    async fn login(
        &self,
        request: Request<UserCredentials>,
    ) -> Result<Response<AuthResponse>, Status> {
        let correlation_id = correlation_id(&request);
        let credentials = request.into_inner();

        let outcome = self
            .credentials
            .login(&credentials.username, &credentials.password)
            .await
            .map_err(|e| {
                error!(error = %e, error_code = e.code().as_str(), "Login failed");
                e.to_status(correlation_id)
            })?;

        Ok(Response::new(AuthResponse {
            token: outcome.token().to_string(),
            message: outcome.message().to_string(),
        }))
    }
}
