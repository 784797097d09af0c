use bytes::Bytes;

use crate::Timestamp;

/// One of the elementary streams carried by the transport stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackType {
	Audio,
	Video,
}

impl std::fmt::Display for TrackType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Audio => write!(f, "audio"),
			Self::Video => write!(f, "video"),
		}
	}
}

/// The negotiated format of a track, known once the parser has seen enough of it.
#[derive(Debug, Clone, PartialEq)]
pub enum Format {
	Audio(AudioFormat),
	Video(VideoFormat),
}

impl Format {
	pub fn track(&self) -> TrackType {
		match self {
			Self::Audio(_) => TrackType::Audio,
			Self::Video(_) => TrackType::Video,
		}
	}

	pub fn codec(&self) -> &str {
		match self {
			Self::Audio(audio) => &audio.codec,
			Self::Video(video) => &video.codec,
		}
	}
}

/// Audio decoder configuration, loosely modeled on WebCodecs' AudioDecoderConfig.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFormat {
	/// ex. `mp4a.40.2` for AAC-LC carried as ADTS.
	pub codec: String,

	pub sample_rate: u32,
	pub channel_count: u32,

	/// Codec specific data, ex. the AudioSpecificConfig.
	pub description: Option<Bytes>,
}

/// Video decoder configuration, loosely modeled on WebCodecs' VideoDecoderConfig.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFormat {
	/// ex. `avc1.64001f`
	pub codec: String,

	pub coded_width: Option<u32>,
	pub coded_height: Option<u32>,

	/// Codec specific data, ex. the avcC box built from SPS/PPS.
	pub description: Option<Bytes>,
}

/// A single decodable unit of media, ex. one video frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessUnit {
	/// The presentation timestamp.
	pub timestamp: Timestamp,

	/// Video only; audio units are always independently decodable.
	pub keyframe: bool,

	pub payload: Bytes,
}

impl AccessUnit {
	pub fn new(timestamp: Timestamp, payload: impl Into<Bytes>) -> Self {
		Self {
			timestamp,
			keyframe: false,
			payload: payload.into(),
		}
	}

	pub fn keyframe(mut self) -> Self {
		self.keyframe = true;
		self
	}
}
