//! Payload decoding and sanitization

mod dispatch;
mod sanitize;
mod schemarec;

pub use dispatch::{PayloadCodec, ERROR_COLUMN};
pub use sanitize::strip_nul;
pub use schemarec::{RecordError, RecordSchema};
