use std::thread::JoinHandle;

use tokio::sync::oneshot;

use crate::Result;

/// A dedicated single-threaded tokio runtime.
///
/// Live sessions spawn their network and event processing onto [Looper::handle], keeping it off the
/// consumer's thread. The runtime is dropped on its own thread when stopped, cancelling any tasks.
pub struct Looper {
	handle: tokio::runtime::Handle,

	// Dropping the sender wakes the runtime thread so it can exit.
	shutdown: Option<oneshot::Sender<()>>,
	thread: Option<JoinHandle<()>>,
}

impl Looper {
	pub fn start(name: &str) -> Result<Self> {
		let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
		let handle = runtime.handle().clone();

		let (shutdown, closed) = oneshot::channel::<()>();

		let thread = std::thread::Builder::new().name(name.into()).spawn(move || {
			runtime.block_on(async {
				let _ = closed.await;
			});
		})?;

		tracing::debug!(name, "looper started");

		Ok(Self {
			handle,
			shutdown: Some(shutdown),
			thread: Some(thread),
		})
	}

	/// The handle used to spawn tasks onto this looper.
	pub fn handle(&self) -> &tokio::runtime::Handle {
		&self.handle
	}

	pub fn is_running(&self) -> bool {
		self.thread.is_some()
	}

	/// Stop the runtime and wait for its thread to exit.
	pub fn stop(&mut self) {
		drop(self.shutdown.take());

		if let Some(thread) = self.thread.take() {
			if thread.join().is_err() {
				tracing::error!("looper thread panicked");
			}
			tracing::debug!("looper stopped");
		}
	}
}

impl Drop for Looper {
	fn drop(&mut self) {
		self.stop();
	}
}
