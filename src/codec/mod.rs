//! Row serialization codec
//!
//! Converts an attribute mapping to and from JSON text. Timestamps and
//! opaque values travel as tagged envelopes; see `envelope.rs` for the
//! grammar. `decode(encode(v)) == v` holds for every value kind.

mod envelope;
mod errors;
mod value;

pub use envelope::{
    decode, encode, format_timestamp, from_json, parse_timestamp, to_json, MARKER_KEY, VALUE_KEY,
};
pub use errors::{CodecError, CodecResult};
pub use value::{Attributes, Opaque, Value};
