// jobharvest Infrastructure - HTTP Adapter
// Implements: PageAccessor, PageAccessorFactory (static HTML, no JavaScript)

pub mod document;
pub mod http_accessor;

pub use http_accessor::{HttpAccessorConfig, HttpAccessorFactory, HttpPageAccessor, DEFAULT_USER_AGENT};
