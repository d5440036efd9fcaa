//! MT/UNPI frame format for the Z-Stack ZNP serial protocol.
//!
//! Every message on the wire is framed as:
//! - A start-of-frame byte (`0xFE`)
//! - A 1-byte payload length (at most 250)
//! - CMD0: command type (top 3 bits) and subsystem (low 5 bits)
//! - CMD1: command id within the subsystem
//! - The payload, followed by an XOR frame check sequence
//!
//! Readers resynchronise on the next start-of-frame after noise or a
//! corrupted frame, so one bad frame never poisons the stream.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod command;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::ZnpCodec;
pub use codec::{
    decode_frame, encode_frame, fcs, Frame, FrameConfig, FCS_SIZE, HEADER_SIZE, MAX_PAYLOAD, SOF,
};
pub use command::{af, command_name, sapi, sys, util, zdo, Command, CommandType, Subsystem, RPC_ERROR};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
