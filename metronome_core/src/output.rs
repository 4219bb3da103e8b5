use crate::click::Click;
use cpal::{
	BufferSize, SampleRate, StreamConfig, SupportedStreamConfigRange,
	traits::{DeviceTrait as _, HostTrait as _, StreamTrait as _},
};
use log::{error, info, warn};
use rtrb::{Producer, RingBuffer};
use std::sync::{
	Arc, Mutex,
	mpsc::{self, Sender},
};
use voice::Voice;

mod voice;

/// nominal sample rate requested from the device
const SAMPLE_RATE: u32 = 44100;
/// frames mixed per chunk of the output callback
const CHUNK: usize = 1024;
/// clicks that can be in flight at once before new ones are dropped
const MAX_VOICES: usize = 16;

/// the audio-output primitive the beat loop fires clicks into
///
/// `play` is fire and forget: it must never block on playback completion
pub trait Output: Send + Sync {
	fn play(&self, click: Arc<Click>, gain: f32);

	/// the rate loaded clicks must be resampled to
	fn sample_rate(&self) -> u32;
}

/// cpal-backed output
///
/// the `cpal::Stream` is not `Send`, so a dedicated thread owns it; clicks
/// travel to the callback through a lock-free voice queue and are mixed
/// additively until each one has played out
#[derive(Debug)]
pub struct CpalOutput {
	sample_rate: u32,
	voices: Mutex<Producer<Voice>>,
	// dropping this disconnects the stream thread, which tears the stream down
	_shutdown: Sender<()>,
}

impl CpalOutput {
	/// opens the default output device
	///
	/// `None` if there is no usable device; the engine can still run, silent
	#[must_use]
	pub fn new() -> Option<Self> {
		let (sender, receiver) = oneshot::channel();
		let (shutdown, closed) = mpsc::channel::<()>();

		std::thread::spawn(move || {
			let Some((stream, config, producer)) = build_stream() else {
				_ = sender.send(None);
				return;
			};

			_ = sender.send(Some((config.sample_rate.0, producer)));

			// hold the stream until the handle is dropped
			_ = closed.recv();
			drop(stream);
		});

		receiver
			.recv()
			.ok()
			.flatten()
			.map(|(sample_rate, voices)| Self {
				sample_rate,
				voices: Mutex::new(voices),
				_shutdown: shutdown,
			})
	}
}

impl Output for CpalOutput {
	fn play(&self, click: Arc<Click>, gain: f32) {
		let Ok(mut voices) = self.voices.lock() else {
			return;
		};

		if voices.push(Voice::new(click, gain)).is_err() {
			warn!("voice queue full, dropping click");
		}
	}

	fn sample_rate(&self) -> u32 {
		self.sample_rate
	}
}

fn build_stream() -> Option<(cpal::Stream, StreamConfig, Producer<Voice>)> {
	let device = cpal::default_host().default_output_device()?;

	let config = choose_config(device.supported_output_configs().ok()?)?;
	let channels = usize::from(config.channels);

	info!("starting output stream with config {config:#?}");

	let (producer, mut consumer) = RingBuffer::new(MAX_VOICES);

	let mut active: Vec<Voice> = Vec::with_capacity(MAX_VOICES);
	let mut stereo = vec![0.0f32; 2 * CHUNK].into_boxed_slice();

	let stream = device
		.build_output_stream(
			&config,
			move |buf: &mut [f32], _| {
				while let Ok(voice) = consumer.pop() {
					if active.len() < MAX_VOICES {
						active.push(voice);
					}
				}

				for buf in buf.chunks_mut(channels * CHUNK) {
					let frames = buf.len() / channels;
					let stereo = &mut stereo[..2 * frames];
					stereo.fill(0.0);

					for voice in &mut active {
						voice.mix_into(stereo);
					}
					active.retain(|voice| !voice.over());

					from_stereo(buf, stereo, channels);
				}
			},
			|err| error!("{err}"),
			None,
		)
		.ok()?;

	stream.play().ok()?;

	Some((stream, config, producer))
}

fn choose_config(
	configs: impl IntoIterator<Item = SupportedStreamConfigRange>,
) -> Option<StreamConfig> {
	let config = configs
		.into_iter()
		.filter(|config| config.channels() != 0)
		.min_by_key(|config| {
			let rate = SAMPLE_RATE.clamp(config.min_sample_rate().0, config.max_sample_rate().0);
			(rate.abs_diff(SAMPLE_RATE), channel_penalty(config.channels()))
		})?;

	let sample_rate =
		SampleRate(SAMPLE_RATE.clamp(config.min_sample_rate().0, config.max_sample_rate().0));

	Some(StreamConfig {
		channels: config.channels(),
		sample_rate,
		buffer_size: BufferSize::Default,
	})
}

fn channel_penalty(channels: u16) -> u16 {
	match channels {
		2 => 0,
		1 => 5,
		x => x,
	}
}

fn from_stereo(buf: &mut [f32], stereo: &[f32], channels: usize) {
	match channels {
		2 => buf.copy_from_slice(stereo),
		1 => {
			for (buf, frame) in buf.iter_mut().zip(stereo.chunks_exact(2)) {
				*buf = frame[0] + frame[1];
			}
		}
		_ => {
			for (buf, frame) in buf.chunks_exact_mut(channels).zip(stereo.chunks_exact(2)) {
				buf.fill(0.0);
				buf[0] = frame[0];
				buf[1] = frame[1];
			}
		}
	}
}
