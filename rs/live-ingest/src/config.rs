use std::num::NonZeroUsize;
use std::time;

use crate::SessionFlags;

/// Configuration for a [crate::LiveIngest].
#[derive(Clone, Debug, clap::Args, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct IngestConfig {
	/// Don't persist anything that identifies the session.
	#[arg(
		id = "ingest-incognito",
		long = "ingest-incognito",
		env = "LIVE_INGEST_INCOGNITO",
		default_missing_value = "true",
		num_args = 0..=1,
		default_value = "false",
		action = clap::ArgAction::Set,
		value_parser = clap::value_parser!(bool),
	)]
	pub incognito: bool,

	/// The maximum number of packets fed to the parser per call.
	///
	/// Larger values favor throughput, smaller values return to the caller sooner. Must be at least 1.
	#[arg(
		id = "ingest-burst",
		long = "ingest-burst",
		env = "LIVE_INGEST_BURST",
		default_value = "50"
	)]
	pub burst: NonZeroUsize,

	/// How long a seek waits for more data between attempts to find the first timestamp.
	#[arg(
		id = "ingest-seek-poll",
		long = "ingest-seek-poll",
		env = "LIVE_INGEST_SEEK_POLL",
		default_value = "100ms",
		value_parser = humantime::parse_duration,
	)]
	#[serde(with = "humantime_serde")]
	pub seek_poll: time::Duration,

	/// The name of the thread running the live session.
	#[arg(
		id = "ingest-thread",
		long = "ingest-thread",
		env = "LIVE_INGEST_THREAD",
		default_value = "http live"
	)]
	pub thread: String,
}

impl IngestConfig {
	pub fn flags(&self) -> SessionFlags {
		SessionFlags::default().incognito(self.incognito)
	}

	pub fn with_incognito(mut self, incognito: bool) -> Self {
		self.incognito = incognito;
		self
	}

	/// Set the burst, raising 0 to 1 so every feed makes progress.
	pub fn with_burst(mut self, burst: usize) -> Self {
		self.burst = NonZeroUsize::new(burst).unwrap_or(NonZeroUsize::MIN);
		self
	}

	pub fn with_seek_poll(mut self, seek_poll: time::Duration) -> Self {
		self.seek_poll = seek_poll;
		self
	}
}

impl Default for IngestConfig {
	fn default() -> Self {
		Self {
			incognito: false,
			burst: NonZeroUsize::new(50).unwrap_or(NonZeroUsize::MIN),
			seek_poll: time::Duration::from_millis(100),
			thread: "http live".to_string(),
		}
	}
}
