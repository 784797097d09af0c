use std::sync::Arc;

use crate::{LiveSource, Result, StreamParser, Timestamp};

/// Mode flags forwarded to the live session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct SessionFlags {
	/// Don't persist anything that identifies the session, ex. cookies or cached playlists.
	pub incognito: bool,
}

impl SessionFlags {
	pub fn incognito(mut self, incognito: bool) -> Self {
		self.incognito = incognito;
		self
	}
}

/// A network session that produces a live byte stream.
///
/// The session owns retrieval, playlist handling and variant selection; the ingest only reads
/// from [LiveSession::data_source]. Callbacks run on the looper passed to [LiveSession::connect],
/// so implementations synchronize internally.
pub trait LiveSession: Send + Sync + 'static {
	/// Start fetching the stream, spawning any work onto the runtime.
	fn connect(&self, runtime: &tokio::runtime::Handle, locator: &str);

	/// Stop all network activity; no callbacks may run afterwards.
	fn disconnect(&self);

	fn seek_to(&self, timestamp: Timestamp) -> Result<()>;

	/// The total duration, or [crate::Error::Unsupported] for a stream without one.
	fn duration(&self) -> Result<Timestamp>;

	fn is_seekable(&self) -> bool;

	/// The byte stream currently being produced.
	///
	/// This may be replaced after a seek, in which case the new source continues from the current offset.
	fn data_source(&self) -> Arc<dyn LiveSource>;
}

/// Creates the collaborators for an ingest when it starts.
pub trait Backend: Send {
	type Session: LiveSession;
	type Parser: StreamParser;

	fn session(&mut self, flags: SessionFlags) -> Self::Session;

	fn parser(&mut self) -> Self::Parser;
}
