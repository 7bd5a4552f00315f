//! HTTP-shaped values passed between intercepted clients and route handlers.

pub mod body;
pub mod message;
pub mod origin;
pub mod response;

pub use body::{FormData, FormValue, RawBody, RequestBody, normalize_body};
pub use message::{FetchError, FetchRequest, FetchResponse};
pub use origin::{effective_base, is_same_origin, resolve_request_url};
pub use response::{ByteStream, HandlerResponse, ResponseBody};
