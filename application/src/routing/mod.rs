//! Route registration and handler contracts.

pub mod handler;
pub mod registry;

pub use handler::{FnHandler, RouteHandler, RouteRequest, handler_fn};
pub use registry::{RouteRegistry, SharedHandler};
