//! Transport packet framing.
//!
//! The live source hands out fixed-size MPEG-TS packets. Sessions may splice in a marker packet
//! to flag a discontinuity: a leading `0x00` byte, which can never start a real packet since
//! those begin with the `0x47` sync byte. The second byte selects the kind of discontinuity.
//!
//! Nothing past this module sees the marker; it's classified into a [Discontinuity] here.

use crate::Timestamp;

/// The size of a single MPEG-TS packet.
pub const PACKET_SIZE: usize = 188;

/// The first byte of every real transport packet.
pub const SYNC_BYTE: u8 = 0x47;

const MARKER: u8 = 0x00;

/// Why the stream timeline was broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscontinuityKind {
	/// The session jumped to a new position; timestamps restart.
	Seek,

	/// The session switched variants; the format may change.
	FormatChange,
}

/// A break in the continuity of the stream, delivered to the parser out-of-band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discontinuity {
	pub kind: DiscontinuityKind,

	/// Units before this timestamp may be discarded once data resumes.
	pub resume_at: Option<Timestamp>,
}

impl Discontinuity {
	pub fn new(kind: DiscontinuityKind) -> Self {
		Self { kind, resume_at: None }
	}
}

/// A packet read from the live source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packet<'a> {
	/// Opaque transport data, forwarded to the parser verbatim.
	Media(&'a [u8]),

	/// A marker packet, replaced by an explicit event.
	Discontinuity(DiscontinuityKind),
}

impl<'a> Packet<'a> {
	/// Classify a packet as returned by the live source.
	pub fn classify(buf: &'a [u8]) -> Self {
		match buf {
			[MARKER, MARKER, ..] => Self::Discontinuity(DiscontinuityKind::Seek),
			[MARKER, ..] => Self::Discontinuity(DiscontinuityKind::FormatChange),
			_ => Self::Media(buf),
		}
	}
}

/// Encode the legacy marker packet for a discontinuity.
pub fn discontinuity_marker(kind: DiscontinuityKind) -> [u8; PACKET_SIZE] {
	let mut packet = [0xff; PACKET_SIZE];
	packet[0] = MARKER;
	packet[1] = match kind {
		DiscontinuityKind::Seek => MARKER,
		DiscontinuityKind::FormatChange => 0x01,
	};
	packet
}
