use std::sync::Arc;

/// A list of possible errors surfaced by the ingest path.
///
/// [Error::WouldBlock] is not a failure; it means nothing is ready yet and the caller should retry later.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
	#[error("would block")]
	WouldBlock,

	/// The live source has no more data.
	#[error("end of stream")]
	EndOfStream,

	#[error("malformed packet")]
	Malformed,

	#[error("unsupported")]
	Unsupported,

	#[error("not connected")]
	NotConnected,

	// The session was closed before the operation completed.
	#[error("cancelled")]
	Cancel,

	#[error("io error: {0}")]
	Io(Arc<std::io::Error>),

	/// A raw status code from a collaborator with no dedicated variant.
	///
	/// Codes in the reserved range decode to their own variant, so they never appear here via [Error::from_code].
	#[error("app code={0}")]
	App(i32),
}

impl Error {
	/// An integer status code. The variants own -1 through -7; [Error::App] returns its code unchanged.
	pub fn to_code(&self) -> i32 {
		match self {
			Self::WouldBlock => -1,
			Self::EndOfStream => -2,
			Self::Malformed => -3,
			Self::Unsupported => -4,
			Self::NotConnected => -5,
			Self::Cancel => -6,
			Self::Io(_) => -7,
			Self::App(code) => *code,
		}
	}

	/// Decode an error from a status code.
	///
	/// The io cause can't be carried by a code, so it decodes as a generic io error.
	pub fn from_code(code: i32) -> Self {
		match code {
			-1 => Self::WouldBlock,
			-2 => Self::EndOfStream,
			-3 => Self::Malformed,
			-4 => Self::Unsupported,
			-5 => Self::NotConnected,
			-6 => Self::Cancel,
			-7 => Self::Io(Arc::new(std::io::Error::other("io error"))),
			code => Self::App(code),
		}
	}

	/// Returns true for the backpressure signal, which callers should retry.
	pub fn is_would_block(&self) -> bool {
		matches!(self, Self::WouldBlock)
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		match err.kind() {
			std::io::ErrorKind::WouldBlock => Self::WouldBlock,
			std::io::ErrorKind::UnexpectedEof => Self::EndOfStream,
			_ => {
				tracing::warn!(%err, "io error");
				Self::Io(Arc::new(err))
			}
		}
	}
}

impl PartialEq for Error {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::App(a), Self::App(b)) => a == b,
			(Self::Io(a), Self::Io(b)) => Arc::ptr_eq(a, b) || a.kind() == b.kind(),
			(a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
		}
	}
}

impl Eq for Error {}

pub type Result<T> = std::result::Result<T, Error>;
