//! LoginBlocking service implementation.

use std::sync::Arc;
use std::time::Duration;
use tonic::{Request, Response, Status};
use tracing::{debug, instrument, warn};

use super::proto::login_blocking_server::LoginBlocking;
use super::proto::{CheckAttemptRequest, CheckAttemptResponse};
use crate::blocking::{AttemptClassifier, AttemptRequest};
use crate::error::GuardpostError;

/// Implementation of the LoginBlocking gRPC interface.
pub struct LoginBlockingServiceImpl<C: AttemptClassifier> {
    /// The decision engine (or a test stand-in)
    classifier: Arc<C>,
    /// Deadline applied when a request does not carry one
    default_deadline: Duration,
}

impl<C: AttemptClassifier> LoginBlockingServiceImpl<C> {
    pub fn new(classifier: Arc<C>, default_deadline: Duration) -> Self {
        Self {
            classifier,
            default_deadline,
        }
    }
}

#[tonic::async_trait]
impl<C: AttemptClassifier + 'static> LoginBlocking for LoginBlockingServiceImpl<C> {
    /// Classify a single login attempt.
    #[instrument(
        skip(self, request),
        fields(account = %request.get_ref().account_id)
    )]
    async fn check_attempt(
        &self,
        request: Request<CheckAttemptRequest>,
    ) -> Result<Response<CheckAttemptResponse>, Status> {
        let req = request.into_inner();

        if req.account_id.is_empty() {
            warn!("Received attempt with empty account id");
            return Err(Status::invalid_argument("account_id is required"));
        }

        let deadline = req
            .deadline
            .map(duration_from_proto)
            .unwrap_or(self.default_deadline);

        let outcome = self
            .classifier
            .classify(AttemptRequest {
                account_id: req.account_id.clone(),
                submitted_credential: req.submitted_credential,
                deadline: Some(deadline),
            })
            .await
            .map_err(status_from_error)?;

        debug!(account = %req.account_id, ?outcome, "Attempt classified");

        Ok(Response::new(CheckAttemptResponse {
            outcome: outcome.to_proto(),
        }))
    }
}

/// Clamp a proto duration to a non-negative std duration.
fn duration_from_proto(duration: prost_types::Duration) -> Duration {
    Duration::new(duration.seconds.max(0) as u64, duration.nanos.max(0) as u32)
}

/// Map engine failures onto gRPC status codes.
///
/// Timeouts and unreachable owners must come back as their own codes so the
/// caller can retry: collapsing them into a classification would silently
/// turn "indeterminate" into allow or block.
fn status_from_error(error: GuardpostError) -> Status {
    match error {
        GuardpostError::Timeout(_) => Status::deadline_exceeded(error.to_string()),
        GuardpostError::Unreachable { .. } => Status::unavailable(error.to_string()),
        GuardpostError::ResourceExhausted(_) => Status::resource_exhausted(error.to_string()),
        GuardpostError::Status(status) => status,
        GuardpostError::CorruptState(_)
        | GuardpostError::Config(_)
        | GuardpostError::Store(_)
        | GuardpostError::Transport(_)
        | GuardpostError::Io(_) => Status::internal(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocking::AttemptOutcome;
    use crate::error::Result;
    use async_trait::async_trait;

    /// Classifier answering every request with a canned result.
    struct CannedClassifier {
        result: fn() -> Result<AttemptOutcome>,
    }

    #[async_trait]
    impl AttemptClassifier for CannedClassifier {
        async fn classify(&self, _request: AttemptRequest) -> Result<AttemptOutcome> {
            (self.result)()
        }
    }

    fn service(result: fn() -> Result<AttemptOutcome>) -> LoginBlockingServiceImpl<CannedClassifier> {
        LoginBlockingServiceImpl::new(
            Arc::new(CannedClassifier { result }),
            Duration::from_secs(2),
        )
    }

    fn check_request(account_id: &str) -> Request<CheckAttemptRequest> {
        Request::new(CheckAttemptRequest {
            account_id: account_id.to_string(),
            submitted_credential: "pw".to_string(),
            deadline: None,
        })
    }

    #[tokio::test]
    async fn test_empty_account_id_rejected() {
        let service = service(|| Ok(AttemptOutcome::Valid));
        let result = service.check_attempt(check_request("")).await;
        assert_eq!(result.unwrap_err().code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_outcome_is_returned() {
        let service = service(|| Ok(AttemptOutcome::InvalidAndBlocked));
        let response = service.check_attempt(check_request("alice")).await.unwrap();
        assert_eq!(
            AttemptOutcome::from_proto(response.get_ref().outcome),
            Some(AttemptOutcome::InvalidAndBlocked)
        );
    }

    #[tokio::test]
    async fn test_timeout_maps_to_deadline_exceeded() {
        let service = service(|| Err(GuardpostError::Timeout(Duration::from_millis(100))));
        let result = service.check_attempt(check_request("alice")).await;
        assert_eq!(result.unwrap_err().code(), tonic::Code::DeadlineExceeded);
    }

    #[tokio::test]
    async fn test_unreachable_maps_to_unavailable() {
        let service = service(|| {
            Err(GuardpostError::Unreachable {
                host: "peer".to_string(),
                reason: "connection refused".to_string(),
            })
        });
        let result = service.check_attempt(check_request("alice")).await;
        assert_eq!(result.unwrap_err().code(), tonic::Code::Unavailable);
    }

    #[tokio::test]
    async fn test_resource_exhaustion_maps_to_resource_exhausted() {
        let service = service(|| Err(GuardpostError::ResourceExhausted("at cap".to_string())));
        let result = service.check_attempt(check_request("alice")).await;
        assert_eq!(result.unwrap_err().code(), tonic::Code::ResourceExhausted);
    }
}
