use std::sync::Arc;

use bytes::BytesMut;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::oneshot;

use crate::{Error, LiveDataSource, LiveSession, LiveSource, Result, Timestamp};

// Read this much at a time from the underlying reader.
const CHUNK_SIZE: usize = 64 * 1024;

struct State<R> {
	// Taken on connect.
	reader: Option<R>,

	// Dropped on disconnect to cancel the pump.
	closed: Option<oneshot::Sender<()>>,
}

/// A session that pumps an async byte stream into a [LiveDataSource].
///
/// Useful for piping a pre-muxed stream (a socket, stdin, a file) through the ingest.
/// There's no playlist, so it can't seek and has no duration.
pub struct ReaderSession<R> {
	source: Arc<LiveDataSource>,
	state: Mutex<State<R>>,
}

impl<R: AsyncRead + Unpin + Send + 'static> ReaderSession<R> {
	pub fn new(reader: R) -> Self {
		Self {
			source: Arc::new(LiveDataSource::new()),
			state: Mutex::new(State {
				reader: Some(reader),
				closed: None,
			}),
		}
	}

	async fn run(mut reader: R, source: Arc<LiveDataSource>) -> Result<()> {
		loop {
			let mut buf = BytesMut::with_capacity(CHUNK_SIZE);
			if reader.read_buf(&mut buf).await? == 0 {
				return Err(Error::EndOfStream);
			}

			tracing::trace!(size = buf.len(), "received data");
			source.queue_buffer(buf.freeze());
		}
	}
}

impl<R: AsyncRead + Unpin + Send + 'static> LiveSession for ReaderSession<R> {
	fn connect(&self, runtime: &tokio::runtime::Handle, locator: &str) {
		let mut state = self.state.lock();
		let Some(reader) = state.reader.take() else {
			tracing::warn!(locator, "session already connected");
			return;
		};

		let (closed, mut cancel) = oneshot::channel();
		state.closed = Some(closed);

		let source = self.source.clone();
		let locator = locator.to_string();

		runtime.spawn(async move {
			tracing::info!(%locator, "connected");

			let cause = tokio::select! {
				// The sender was dropped, which means [LiveSession::disconnect] was called.
				_ = &mut cancel => Error::Cancel,
				res = Self::run(reader, source.clone()) => res.err().unwrap_or(Error::EndOfStream),
			};

			tracing::info!(%locator, %cause, "session finished");
			source.queue_eos(cause);
		});
	}

	fn disconnect(&self) {
		drop(self.state.lock().closed.take());
	}

	fn seek_to(&self, _timestamp: Timestamp) -> Result<()> {
		Err(Error::Unsupported)
	}

	fn duration(&self) -> Result<Timestamp> {
		Err(Error::Unsupported)
	}

	fn is_seekable(&self) -> bool {
		false
	}

	fn data_source(&self) -> Arc<dyn LiveSource> {
		self.source.clone()
	}
}
