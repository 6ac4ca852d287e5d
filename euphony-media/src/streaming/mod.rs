//! Byte-range streaming of stored media
//!
//! Resolves an optional `Range` header into a [`StreamingPlan`] and copies
//! exactly that window from disk in fixed-size chunks, so memory stays
//! bounded by the buffer no matter how large the file is.
//!
//! ```rust
//! use euphony_media::streaming::resolve_request;
//!
//! let plan = resolve_request(1000, Some("bytes=200-499")).unwrap();
//! assert_eq!((plan.start, plan.end, plan.content_length), (200, 499, 300));
//! assert_eq!(plan.content_range(), "bytes 200-499/1000");
//! ```

mod range;
mod reader;
mod response;

pub use range::{resolve_request, StreamingPlan};
pub use reader::{stream, RangeReader};
pub use response::serve_file;
