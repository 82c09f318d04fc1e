pub mod request_span;

pub use request_span::{RequestSpan, TRACE_ID_HEADER};
