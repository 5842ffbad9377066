//! gRPC surface: the LoginBlocking service and the peer-forwarding client.

mod client;
mod server;
mod service;

pub use client::GrpcAttemptForwarder;
pub use server::GrpcServer;
pub use service::LoginBlockingServiceImpl;

// Include the generated protobuf code
pub mod proto {
    tonic::include_proto!("guardpost.v1");
}

// Re-export commonly used types
pub use proto::login_blocking_server::LoginBlockingServer;
pub use proto::{CheckAttemptRequest, CheckAttemptResponse};
