//! # live-ingest: feed a live transport stream into a demuxer
//!
//! A live session downloads a stream of MPEG-TS packets in the background; a parser splits them into
//! per-track access units. [LiveIngest] sits between the two and hands units to a renderer on demand:
//!
//! - [LiveIngest::start] spins up a dedicated [Looper] and connects the [LiveSession] on it.
//! - [LiveIngest::feed_more_data] reads a bounded burst of packets from the [LiveSource] and feeds them to the [StreamParser].
//! - [LiveIngest::dequeue_access_unit] pops the next [AccessUnit] for a track, or [Error::WouldBlock].
//! - [LiveIngest::seek_to] waits until the parser knows the first timestamp, then seeks the session.
//!
//! The session and parser are supplied by a [Backend]. [ReaderSession], [LiveDataSource] and [PacketQueue]
//! are ready-made building blocks for implementing them.

mod config;
mod error;
mod ingest;
mod looper;
mod parser;
mod queue;
mod reader;
mod session;
mod source;
mod timestamp;
mod track;

pub mod packet;

pub use config::*;
pub use error::*;
pub use ingest::*;
pub use looper::*;
pub use packet::{Discontinuity, DiscontinuityKind, Packet, PACKET_SIZE, SYNC_BYTE};
pub use parser::*;
pub use queue::*;
pub use reader::*;
pub use session::*;
pub use source::*;
pub use timestamp::*;
pub use track::*;
