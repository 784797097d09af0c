use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::{AccessUnit, Discontinuity, DiscontinuityKind, Error, Format, Result, Timestamp, TrackSource, TrackType};

#[derive(Default)]
struct State {
	format: Option<Format>,
	units: VecDeque<AccessUnit>,

	// Units earlier than this are dropped until the next discontinuity.
	resume_at: Option<Timestamp>,

	// Set once the parser signals the end of the stream.
	finished: Option<Error>,
}

/// A FIFO of access units for a single track.
///
/// Parsers push units as they're demuxed and the ingest pops them via [TrackSource].
pub struct PacketQueue {
	track: TrackType,
	state: Mutex<State>,
}

impl PacketQueue {
	pub fn new(track: TrackType) -> Self {
		Self {
			track,
			state: Default::default(),
		}
	}

	pub fn track(&self) -> TrackType {
		self.track
	}

	pub fn set_format(&self, format: Format) {
		debug_assert_eq!(format.track(), self.track, "format for the wrong track");

		let mut state = self.state.lock();
		if state.format.as_ref() != Some(&format) {
			tracing::info!(track = %self.track, codec = format.codec(), "track format");
			state.format = Some(format);
		}
	}

	/// Append a unit, unless it precedes the resume point of an earlier discontinuity.
	pub fn queue_access_unit(&self, unit: AccessUnit) {
		let mut state = self.state.lock();
		if state.finished.is_some() {
			tracing::warn!(track = %self.track, "dropping access unit queued after end of stream");
			return;
		}

		if let Some(resume_at) = state.resume_at.filter(|resume_at| unit.timestamp < *resume_at) {
			tracing::trace!(track = %self.track, timestamp = %unit.timestamp, %resume_at, "dropping access unit before resume point");
			return;
		}

		state.units.push_back(unit);
	}

	/// Flush everything queued; units queued afterwards belong to the new timeline.
	pub fn queue_discontinuity(&self, discontinuity: Discontinuity) {
		let mut state = self.state.lock();
		tracing::debug!(track = %self.track, kind = ?discontinuity.kind, dropped = state.units.len(), "discontinuity");

		state.units.clear();
		state.resume_at = discontinuity.resume_at;

		if discontinuity.kind == DiscontinuityKind::FormatChange {
			state.format = None;
		}
	}

	/// Mark the end of the track; `cause` is returned once the queue drains.
	pub fn signal_eos(&self, cause: Error) {
		let mut state = self.state.lock();
		if state.finished.is_none() {
			state.finished = Some(cause);
		}
	}

	pub fn clear(&self) {
		self.state.lock().units.clear();
	}

	pub fn len(&self) -> usize {
		self.state.lock().units.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl TrackSource for PacketQueue {
	fn format(&self) -> Option<Format> {
		self.state.lock().format.clone()
	}

	fn has_buffer_available(&self) -> Result<bool> {
		let state = self.state.lock();
		if !state.units.is_empty() {
			return Ok(true);
		}

		match state.finished.clone() {
			Some(cause) => Err(cause),
			None => Ok(false),
		}
	}

	fn dequeue_access_unit(&self) -> Result<AccessUnit> {
		let mut state = self.state.lock();
		if let Some(unit) = state.units.pop_front() {
			return Ok(unit);
		}

		Err(state.finished.clone().unwrap_or(Error::WouldBlock))
	}
}
