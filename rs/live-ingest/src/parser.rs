use std::sync::Arc;

use crate::{AccessUnit, Discontinuity, Error, Format, Result, TrackType};

/// A stateful transport stream demuxer.
///
/// Packets must be fed in stream order without gaps; the parser accumulates partial PES data
/// across packets and splits it into per-track [TrackSource]s.
pub trait StreamParser: Send {
	/// Feed a single transport packet.
	fn feed_packet(&mut self, packet: &[u8]) -> Result<()>;

	/// The stream timeline or format was broken at this point.
	fn signal_discontinuity(&mut self, discontinuity: Discontinuity);

	/// No more packets will be fed; `cause` is surfaced once each track drains.
	fn signal_end_of_stream(&mut self, cause: Error);

	/// The buffer for a track, once the track has been identified in the stream.
	fn source(&self, track: TrackType) -> Option<Arc<dyn TrackSource>>;

	/// Returns true once the first timestamp of the stream has been observed.
	///
	/// Seek targets are relative to this baseline.
	fn pts_delta_established(&self) -> bool;
}

/// The buffered access units for a single track.
///
/// Shared between the parser (writer) and the ingest (reader), so implementations synchronize internally.
pub trait TrackSource: Send + Sync {
	/// The format, once enough of the track has been parsed.
	fn format(&self) -> Option<Format>;

	/// Returns `Ok(true)` if a unit can be dequeued, `Ok(false)` if the buffer is empty but more may arrive,
	/// or the terminal cause if the buffer is empty and nothing else will.
	fn has_buffer_available(&self) -> Result<bool>;

	/// Remove the next unit from the buffer.
	fn dequeue_access_unit(&self) -> Result<AccessUnit>;
}
