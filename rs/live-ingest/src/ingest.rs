use std::sync::Arc;

use crate::{
	AccessUnit, Backend, Discontinuity, Error, Format, IngestConfig, LiveSession, Looper, Packet, Result,
	StreamParser, Timestamp, TrackSource, TrackType, PACKET_SIZE,
};

// Everything created by [LiveIngest::start].
struct Running<B: Backend> {
	looper: Looper,
	session: B::Session,
	parser: B::Parser,
}

/// Feeds a live session's transport stream into a parser and serves access units per track.
///
/// Data is pumped in by [LiveIngest::feed_more_data] and pulled out by [LiveIngest::dequeue_access_unit];
/// neither blocks, so a consumer can interleave pulls for several tracks against one feed budget.
/// The session runs on a dedicated [Looper] owned by the ingest.
///
/// Only [LiveIngest::seek_to] may block, so don't call it from an async context.
pub struct LiveIngest<B: Backend> {
	locator: String,
	config: IngestConfig,
	backend: B,

	running: Option<Running<B>>,

	// The offset of the next packet in the live stream.
	offset: u64,

	// Set once the source reports a terminal error; nothing else is read afterwards.
	eos: bool,
}

impl<B: Backend> LiveIngest<B> {
	/// Create an ingest for the given locator. No I/O happens until [LiveIngest::start].
	pub fn new(locator: impl Into<String>, config: IngestConfig, backend: B) -> Self {
		Self {
			locator: locator.into(),
			config,
			backend,
			running: None,
			offset: 0,
			eos: false,
		}
	}

	/// Spawn the looper, connect the session and create the parser.
	pub fn start(&mut self) -> Result<()> {
		if self.running.is_some() {
			tracing::warn!(locator = %self.locator, "live ingest already started");
			return Ok(());
		}

		let looper = Looper::start(&self.config.thread)?;

		let flags = self.config.flags();
		let session = self.backend.session(flags);
		session.connect(looper.handle(), &self.locator);

		let parser = self.backend.parser();

		tracing::info!(locator = %self.locator, incognito = flags.incognito, "live ingest started");

		// A restarted ingest reads a fresh stream.
		self.offset = 0;
		self.eos = false;
		self.running = Some(Running {
			looper,
			session,
			parser,
		});

		Ok(())
	}

	/// Disconnect the session, then stop its looper.
	pub fn stop(&mut self) {
		let Some(mut running) = self.running.take() else {
			return;
		};

		running.session.disconnect();
		running.looper.stop();

		tracing::info!(locator = %self.locator, offset = self.offset, "live ingest stopped");
	}

	/// Feed up to the configured burst of packets; see [LiveIngest::feed].
	pub fn feed_more_data(&mut self) -> bool {
		self.feed(self.config.burst.get())
	}

	/// Feed up to `budget` packets from the live source into the parser.
	///
	/// Stops early when the source has nothing buffered, so call again later.
	/// Returns false only if the end of the stream was reached by a previous call.
	pub fn feed(&mut self, budget: usize) -> bool {
		if self.eos {
			return false;
		}

		let Some(running) = self.running.as_mut() else {
			tracing::debug!("feeding before start");
			return true;
		};

		let source = running.session.data_source();
		let mut buf = [0u8; PACKET_SIZE];
		let mut fed = 0;

		for _ in 0..budget {
			match source.read_nonblocking(self.offset, &mut buf) {
				Ok(PACKET_SIZE) => {}
				Ok(0) | Err(Error::WouldBlock) => break,
				// Only whole packets reach the parser; the rest is retried on the next call.
				Ok(size) => {
					tracing::debug!(offset = self.offset, size, "short read");
					break;
				}
				Err(cause) => {
					tracing::info!(offset = self.offset, %cause, "input data EOS reached");
					running.parser.signal_end_of_stream(cause);
					self.eos = true;
					break;
				}
			}

			match Packet::classify(&buf) {
				Packet::Discontinuity(kind) => {
					tracing::debug!(offset = self.offset, ?kind, "discontinuity");
					running.parser.signal_discontinuity(Discontinuity::new(kind));
				}
				Packet::Media(packet) => {
					if let Err(err) = running.parser.feed_packet(packet) {
						tracing::warn!(offset = self.offset, %err, "failed to parse packet");
					}
				}
			}

			self.offset += PACKET_SIZE as u64;
			fed += 1;
		}

		tracing::trace!(fed, offset = self.offset, "fed packets");

		true
	}

	/// Pop the next access unit for a track.
	///
	/// Returns [Error::WouldBlock] when the track isn't known yet or its buffer is empty,
	/// or the cause of the end of stream once the buffer has drained. Never feeds.
	pub fn dequeue_access_unit(&self, track: TrackType) -> Result<AccessUnit> {
		let Some(source) = self.track_source(track) else {
			return Err(Error::WouldBlock);
		};

		if !source.has_buffer_available()? {
			return Err(Error::WouldBlock);
		}

		source.dequeue_access_unit()
	}

	/// The format of a track, once the parser has seen enough of it.
	pub fn format(&self, track: TrackType) -> Option<Format> {
		self.track_source(track)?.format()
	}

	/// Seek the session, first feeding until the parser has found the first timestamp of the stream.
	///
	/// Blocks while waiting for data, up to the configured poll interval between feeds.
	pub fn seek_to(&mut self, timestamp: Timestamp) -> Result<()> {
		if self.running.is_none() {
			return Err(Error::NotConnected);
		}

		while !self.pts_delta_established() && self.feed_more_data() {
			if let Some(running) = self.running.as_ref() {
				let source = running.session.data_source();
				source.wait_readable(self.offset, PACKET_SIZE, self.config.seek_poll);
			}
		}

		tracing::debug!(%timestamp, offset = self.offset, "seeking");
		self.session()?.seek_to(timestamp)
	}

	pub fn duration(&self) -> Result<Timestamp> {
		self.session()?.duration()
	}

	pub fn is_seekable(&self) -> bool {
		self.session().is_ok_and(|session| session.is_seekable())
	}

	pub fn locator(&self) -> &str {
		&self.locator
	}

	pub fn config(&self) -> &IngestConfig {
		&self.config
	}

	pub fn is_started(&self) -> bool {
		self.running.is_some()
	}

	/// The offset of the next packet to be read.
	pub fn offset(&self) -> u64 {
		self.offset
	}

	/// Returns true once the live source has terminated.
	pub fn is_eos(&self) -> bool {
		self.eos
	}

	fn session(&self) -> Result<&B::Session> {
		self.running.as_ref().map(|running| &running.session).ok_or(Error::NotConnected)
	}

	fn track_source(&self, track: TrackType) -> Option<Arc<dyn TrackSource>> {
		self.running.as_ref()?.parser.source(track)
	}

	fn pts_delta_established(&self) -> bool {
		self.running
			.as_ref()
			.is_some_and(|running| running.parser.pts_delta_established())
	}
}

impl<B: Backend> Drop for LiveIngest<B> {
	fn drop(&mut self) {
		self.stop();
	}
}
