// Photon wire protocol decoding: frame envelope, command splitting,
// fragment reassembly, message shapes, and Protocol16 tagged values.

mod error;
pub mod fragments;
pub mod frame;
pub mod message;
mod params;
mod reader;
pub mod value;

pub use error::DecodeError;
pub use frame::{FrameDecoder, FrameHeader};
pub use message::{Decoded, Message};
pub use params::Parameters;
pub use reader::ByteReader;
pub use value::Value;
