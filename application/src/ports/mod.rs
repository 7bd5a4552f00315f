//! Port definitions (interfaces for external dependencies).

pub mod ajax_client;
pub mod http_client;
pub mod invoke_bridge;
pub mod scratch_storage;
pub mod transcript_logger;
