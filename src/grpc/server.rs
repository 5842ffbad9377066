//! gRPC server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tonic::transport::Server;
use tracing::{error, info};

use super::proto::login_blocking_server::LoginBlockingServer;
use super::service::LoginBlockingServiceImpl;
use crate::blocking::AttemptClassifier;
use crate::error::{GuardpostError, Result};

/// gRPC server for the LoginBlocking service.
pub struct GrpcServer<C: AttemptClassifier + 'static> {
    /// Address to bind to
    addr: SocketAddr,
    /// The classifier answering attempts
    classifier: Arc<C>,
    /// Deadline applied to requests that carry none
    default_deadline: Duration,
}

impl<C: AttemptClassifier + 'static> GrpcServer<C> {
    pub fn new(addr: SocketAddr, classifier: Arc<C>, default_deadline: Duration) -> Self {
        Self {
            addr,
            classifier,
            default_deadline,
        }
    }

    /// Start the gRPC server.
    ///
    /// This method will block until the server is shut down.
    pub async fn serve(self) -> Result<()> {
        let service = LoginBlockingServiceImpl::new(self.classifier, self.default_deadline);

        info!(addr = %self.addr, "Starting gRPC server for LoginBlocking");

        Server::builder()
            .add_service(LoginBlockingServer::new(service))
            .serve(self.addr)
            .await
            .map_err(|e| {
                error!(error = %e, "gRPC server failed");
                GuardpostError::Transport(e)
            })
    }

    /// Start the gRPC server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send,
    {
        let service = LoginBlockingServiceImpl::new(self.classifier, self.default_deadline);

        info!(addr = %self.addr, "Starting gRPC server for LoginBlocking with graceful shutdown");

        Server::builder()
            .add_service(LoginBlockingServer::new(service))
            .serve_with_shutdown(self.addr, signal)
            .await
            .map_err(|e| {
                error!(error = %e, "gRPC server failed");
                GuardpostError::Transport(e)
            })
    }
}
