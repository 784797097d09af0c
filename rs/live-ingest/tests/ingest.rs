use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use live_ingest::{
	AccessUnit, AudioFormat, Backend, Discontinuity, DiscontinuityKind, Error, Format, IngestConfig, LiveIngest,
	PACKET_SIZE, PacketQueue, ReaderSession, SYNC_BYTE, SessionFlags, StreamParser, Timestamp, TrackSource, TrackType,
	VideoFormat, packet::discontinuity_marker,
};
use tokio::io::{AsyncWriteExt, DuplexStream};

const VIDEO_PID: u16 = 0x100;
const AUDIO_PID: u16 = 0x101;

// Build the packets for one unit: a PES-less toy payload whose first 8 bytes are a 90kHz timestamp.
fn packets(pid: u16, ticks: u64, size: usize) -> Vec<u8> {
	let mut payload = ticks.to_be_bytes().to_vec();
	payload.resize(8 + size, 0xab);

	let mut out = Vec::new();
	for (index, chunk) in payload.chunks(PACKET_SIZE - 4).enumerate() {
		let mut packet = vec![0xffu8; PACKET_SIZE];
		packet[0] = SYNC_BYTE;
		packet[1] = ((pid >> 8) as u8 & 0x1f) | if index == 0 { 0x40 } else { 0 };
		packet[2] = pid as u8;
		packet[3] = 0x10;
		packet[4..4 + chunk.len()].copy_from_slice(chunk);
		out.extend_from_slice(&packet);
	}
	out
}

// A toy demuxer: each payload unit start begins a new access unit.
#[derive(Default)]
struct ToyParser {
	tracks: HashMap<TrackType, Arc<PacketQueue>>,
	pending: HashMap<TrackType, BytesMut>,
	discontinuities: Arc<parking_lot::Mutex<Vec<DiscontinuityKind>>>,
}

impl ToyParser {
	fn queue(&mut self, track: TrackType) -> Arc<PacketQueue> {
		self.tracks
			.entry(track)
			.or_insert_with(|| {
				let queue = Arc::new(PacketQueue::new(track));
				queue.set_format(match track {
					TrackType::Video => Format::Video(VideoFormat {
						codec: "avc1.64001f".to_string(),
						coded_width: Some(1280),
						coded_height: Some(720),
						description: None,
					}),
					TrackType::Audio => Format::Audio(AudioFormat {
						codec: "mp4a.40.2".to_string(),
						sample_rate: 48_000,
						channel_count: 2,
						description: None,
					}),
				});
				queue
			})
			.clone()
	}

	fn flush(&mut self, track: TrackType) {
		let Some(pending) = self.pending.remove(&track) else {
			return;
		};

		let mut payload = pending.freeze();
		let ticks = u64::from_be_bytes(payload[..8].try_into().unwrap());
		let unit = AccessUnit::new(Timestamp::from_90khz(ticks), payload.split_off(8));
		self.queue(track).queue_access_unit(unit);
	}
}

impl StreamParser for ToyParser {
	fn feed_packet(&mut self, packet: &[u8]) -> live_ingest::Result<()> {
		if packet.len() != PACKET_SIZE || packet[0] != SYNC_BYTE {
			return Err(Error::Malformed);
		}

		let pid = u16::from_be_bytes([packet[1] & 0x1f, packet[2]]);
		let track = match pid {
			VIDEO_PID => TrackType::Video,
			AUDIO_PID => TrackType::Audio,
			_ => return Ok(()),
		};

		if packet[1] & 0x40 != 0 {
			self.flush(track);
			self.queue(track);
			self.pending.insert(track, BytesMut::new());
		}

		if let Some(pending) = self.pending.get_mut(&track) {
			pending.extend_from_slice(&packet[4..]);
		}

		Ok(())
	}

	fn signal_discontinuity(&mut self, discontinuity: Discontinuity) {
		self.discontinuities.lock().push(discontinuity.kind);
		self.flush(TrackType::Video);
		self.flush(TrackType::Audio);
	}

	fn signal_end_of_stream(&mut self, cause: Error) {
		self.flush(TrackType::Video);
		self.flush(TrackType::Audio);
		for queue in self.tracks.values() {
			queue.signal_eos(cause.clone());
		}
	}

	fn source(&self, track: TrackType) -> Option<Arc<dyn TrackSource>> {
		self.tracks.get(&track).map(|queue| queue.clone() as Arc<dyn TrackSource>)
	}

	fn pts_delta_established(&self) -> bool {
		self.tracks.values().any(|queue| !queue.is_empty())
	}
}

struct Pipe {
	reader: Option<DuplexStream>,
	discontinuities: Arc<parking_lot::Mutex<Vec<DiscontinuityKind>>>,
}

impl Backend for Pipe {
	type Session = ReaderSession<DuplexStream>;
	type Parser = ToyParser;

	fn session(&mut self, _flags: SessionFlags) -> Self::Session {
		ReaderSession::new(self.reader.take().expect("session created twice"))
	}

	fn parser(&mut self) -> Self::Parser {
		ToyParser {
			discontinuities: self.discontinuities.clone(),
			..Default::default()
		}
	}
}

fn pipe() -> (LiveIngest<Pipe>, DuplexStream, Arc<parking_lot::Mutex<Vec<DiscontinuityKind>>>) {
	let (writer, reader) = tokio::io::duplex(1024 * 1024);
	let discontinuities = Arc::new(parking_lot::Mutex::new(Vec::new()));
	let backend = Pipe {
		reader: Some(reader),
		discontinuities: discontinuities.clone(),
	};

	let config = IngestConfig::default().with_burst(4).with_seek_poll(Duration::from_millis(10));
	let mut ingest = LiveIngest::new("pipe://test", config, backend);
	ingest.start().unwrap();

	(ingest, writer, discontinuities)
}

fn write(writer: &mut DuplexStream, data: &[u8]) {
	let runtime = tokio::runtime::Runtime::new().unwrap();
	runtime.block_on(writer.write_all(data)).unwrap();
}

// Pull units for a track until the stream ends, feeding whenever the track runs dry.
fn drain(ingest: &mut LiveIngest<Pipe>, track: TrackType) -> (Vec<AccessUnit>, Error) {
	let deadline = Instant::now() + Duration::from_secs(10);
	let mut units = Vec::new();

	loop {
		assert!(Instant::now() < deadline, "timed out draining {track}");

		match ingest.dequeue_access_unit(track) {
			Ok(unit) => units.push(unit),
			Err(Error::WouldBlock) => {
				if !ingest.feed_more_data() {
					// Nothing more will arrive; one more pass surfaces the cause.
					if let Err(err) = ingest.dequeue_access_unit(track) {
						if !err.is_would_block() {
							return (units, err);
						}
					}
				}
				std::thread::sleep(Duration::from_millis(1));
			}
			Err(err) => return (units, err),
		}
	}
}

#[test]
fn stream() {
	let (mut ingest, mut writer, discontinuities) = pipe();

	let mut data = Vec::new();
	data.extend(packets(VIDEO_PID, 0, 300));
	data.extend(packets(AUDIO_PID, 1_500, 100));
	data.extend(packets(VIDEO_PID, 3_000, 500));
	data.extend(discontinuity_marker(DiscontinuityKind::FormatChange));
	data.extend(packets(VIDEO_PID, 6_000, 10));
	write(&mut writer, &data);
	drop(writer);

	let (video, cause) = drain(&mut ingest, TrackType::Video);
	assert_eq!(cause, Error::EndOfStream);
	assert!(ingest.is_eos());
	assert_eq!(ingest.offset(), data.len() as u64);

	let timestamps: Vec<_> = video.iter().map(|unit| unit.timestamp.as_micros()).collect();
	assert_eq!(timestamps, vec![0, 33_333, 66_666]);
	assert_eq!(&video[1].payload[..500], &Bytes::from(vec![0xab; 500])[..]);

	let (audio, cause) = drain(&mut ingest, TrackType::Audio);
	assert_eq!(audio.len(), 1);
	assert_eq!(cause, Error::EndOfStream);

	assert!(matches!(ingest.format(TrackType::Video), Some(Format::Video(_))));
	assert_eq!(*discontinuities.lock(), vec![DiscontinuityKind::FormatChange]);
}

#[test]
fn truncated_tail() {
	let (mut ingest, mut writer, _) = pipe();

	let mut data = packets(VIDEO_PID, 0, 10);
	data.extend([SYNC_BYTE; 10]);
	write(&mut writer, &data);
	drop(writer);

	let (video, cause) = drain(&mut ingest, TrackType::Video);
	assert_eq!(video.len(), 1);
	assert_eq!(cause, Error::EndOfStream);

	// The trailing partial packet was dropped, not fed.
	assert_eq!(ingest.offset(), PACKET_SIZE as u64);
}

#[test]
fn seek_waits_for_data() {
	let (mut ingest, mut writer, _) = pipe();

	// Deliver the first unit late, from another thread.
	let handle = std::thread::spawn(move || {
		std::thread::sleep(Duration::from_millis(50));
		let mut data = packets(VIDEO_PID, 0, 10);
		data.extend(packets(VIDEO_PID, 9_000, 10));
		write(&mut writer, &data);
		writer
	});

	// The session can't seek, but only after the first timestamp was found.
	assert_eq!(ingest.seek_to(Timestamp::from_secs(5).unwrap()), Err(Error::Unsupported));
	assert!(ingest.offset() >= 2 * PACKET_SIZE as u64);
	assert!(ingest.dequeue_access_unit(TrackType::Video).is_ok());

	let writer = handle.join().unwrap();
	drop(writer);
	ingest.stop();
}

#[test]
fn stop_cancels_session() {
	let (mut ingest, _writer, _) = pipe();
	assert!(ingest.is_started());
	assert!(!ingest.is_seekable());
	assert_eq!(ingest.duration(), Err(Error::Unsupported));

	ingest.stop();
	assert!(!ingest.is_started());
	assert_eq!(ingest.duration(), Err(Error::NotConnected));
}
