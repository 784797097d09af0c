use std::time::Duration;

use bytes::{Buf, Bytes, BytesMut};
use parking_lot::{Condvar, Mutex};

use crate::{packet, DiscontinuityKind, Error, Result};

/// A byte stream backed by a live session, read without blocking.
pub trait LiveSource: Send + Sync {
	/// Read into `buf` at the given offset into the stream.
	///
	/// Returns the number of bytes read, [Error::WouldBlock] if the data hasn't arrived yet,
	/// or any other error once the stream has terminated.
	/// Implementations only return fewer bytes than requested if they can't tell whether more will arrive.
	fn read_nonblocking(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

	/// Block until `len` bytes are readable at `offset`, the stream terminates, or the timeout elapses.
	///
	/// Sources without a notification mechanism just sleep for the timeout.
	fn wait_readable(&self, offset: u64, len: usize, timeout: Duration) {
		let _ = (offset, len);
		std::thread::sleep(timeout);
	}
}

#[derive(Default)]
struct State {
	// The offset of the first byte in `buffer`.
	start: u64,
	buffer: BytesMut,

	// Set once the writer is done, with the cause.
	finished: Option<Error>,
}

impl State {
	// The number of bytes buffered at or after the offset.
	fn available(&self, offset: u64) -> usize {
		match offset.checked_sub(self.start) {
			Some(skip) => self.buffer.len().saturating_sub(skip as usize),
			None => 0,
		}
	}
}

/// An in-memory live byte stream.
///
/// A session appends downloaded data from its own context while the ingest reads it in order.
/// Bytes are released once the reader has moved past them.
#[derive(Default)]
pub struct LiveDataSource {
	state: Mutex<State>,
	readable: Condvar,
}

impl LiveDataSource {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append data to the end of the stream.
	pub fn queue_buffer(&self, data: Bytes) {
		let mut state = self.state.lock();
		if state.finished.is_some() {
			tracing::warn!(size = data.len(), "dropping data queued after end of stream");
			return;
		}

		state.buffer.extend_from_slice(&data);
		self.readable.notify_all();
	}

	/// Splice a discontinuity marker packet into the stream.
	pub fn queue_discontinuity(&self, kind: DiscontinuityKind) {
		tracing::debug!(?kind, "queueing discontinuity");
		self.queue_buffer(Bytes::copy_from_slice(&packet::discontinuity_marker(kind)));
	}

	/// Terminate the stream; readers get `cause` once the remaining data is drained.
	pub fn queue_eos(&self, cause: Error) {
		let mut state = self.state.lock();
		if state.finished.is_none() {
			tracing::debug!(%cause, "live data source finished");
			state.finished = Some(cause);
		}
		self.readable.notify_all();
	}

	/// The number of bytes currently buffered.
	pub fn len(&self) -> usize {
		self.state.lock().buffer.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn is_finished(&self) -> bool {
		self.state.lock().finished.is_some()
	}
}

impl LiveSource for LiveDataSource {
	fn read_nonblocking(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
		let mut state = self.state.lock();

		let Some(skip) = offset.checked_sub(state.start) else {
			tracing::warn!(offset, start = state.start, "read before the retained window");
			return Err(Error::Unsupported);
		};

		// Everything before the offset has been consumed.
		let skip = (skip as usize).min(state.buffer.len());
		state.buffer.advance(skip);
		state.start += skip as u64;

		let available = state.available(offset);
		if available < buf.len() {
			let Some(cause) = state.finished.clone() else {
				return Err(Error::WouldBlock);
			};

			// A truncated tail can never be completed, so it's discarded.
			if available > 0 {
				tracing::warn!(offset, size = available, "dropping truncated tail");
				state.buffer.clear();
			}

			return Err(cause);
		}

		let size = buf.len();
		buf.copy_from_slice(&state.buffer[..size]);

		Ok(size)
	}

	fn wait_readable(&self, offset: u64, len: usize, timeout: Duration) {
		let mut state = self.state.lock();
		if state.available(offset) >= len || state.finished.is_some() {
			return;
		}

		// A single wait; spurious wakeups just mean the caller polls a bit early.
		self.readable.wait_for(&mut state, timeout);
	}
}
