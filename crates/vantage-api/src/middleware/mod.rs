pub mod request_id;
pub mod security_headers;

pub use request_id::request_id_middleware;
