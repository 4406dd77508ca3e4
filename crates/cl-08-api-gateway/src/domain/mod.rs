//! Gateway domain: configuration, errors, operation names and wire payloads.

pub mod config;
pub mod error;
pub mod operations;
pub mod payloads;

pub use config::GatewayConfig;
pub use error::{ApiError, GatewayError, GENERIC_INTERNAL_MESSAGE};
pub use operations::ApiOperation;
pub use payloads::{
    AdminRequest, CodeRequest, DisconnectResponse, OkResponse, SweepResponse, SyncRequest,
    ValidateResponse,
};
