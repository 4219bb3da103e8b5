use crate::resampler::resample;
use std::fmt::{Debug, Formatter};
use symphonia::core::{
	audio::SampleBuffer,
	codecs::DecoderOptions,
	formats::FormatOptions,
	io::{MediaSource, MediaSourceStream, MediaSourceStreamOptions},
	meta::MetadataOptions,
	probe::Hint,
};

/// a decoded click, stereo-interleaved at the output device's sample rate
pub struct Click {
	samples: Box<[f32]>,
}

impl Debug for Click {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Click")
			.field("frames", &(self.samples.len() / 2))
			.finish()
	}
}

impl Click {
	#[must_use]
	pub fn samples(&self) -> &[f32] {
		&self.samples
	}

	pub(crate) fn decode(source: Box<dyn MediaSource>, sample_rate: u32) -> Option<Self> {
		let mut format = symphonia::default::get_probe()
			.format(
				&Hint::default(),
				MediaSourceStream::new(source, MediaSourceStreamOptions::default()),
				&FormatOptions::default(),
				&MetadataOptions::default(),
			)
			.ok()?
			.format;

		let track = format.default_track()?;
		let track_id = track.id;
		let n_channels = track.codec_params.channels?.count();
		let source_rate = track.codec_params.sample_rate?;

		let mut decoder = symphonia::default::get_codecs()
			.make(&track.codec_params, &DecoderOptions::default())
			.ok()?;

		let mut stereo =
			Vec::with_capacity(2 * track.codec_params.n_frames.unwrap_or_default() as usize);

		let mut sample_buf = None;
		while let Ok(packet) = format.next_packet() {
			if packet.track_id() != track_id {
				continue;
			}

			let audio_buf = decoder.decode(&packet).ok()?;

			let sample_buf = sample_buf.get_or_insert_with(|| {
				let capacity = audio_buf.capacity() as u64;
				let spec = *audio_buf.spec();
				SampleBuffer::new(capacity, spec)
			});

			sample_buf.copy_interleaved_ref(audio_buf.clone());

			if n_channels == 2 {
				stereo.extend(sample_buf.samples());
			} else if n_channels == 1 {
				stereo.extend(sample_buf.samples().iter().flat_map(|x| [x, x]));
			} else if n_channels != 0 {
				stereo.extend(
					sample_buf
						.samples()
						.chunks_exact(n_channels)
						.flat_map(|x| [x[0], x[1]]),
				);
			}
		}

		if stereo.is_empty() {
			return None;
		}

		Some(Self {
			samples: resample(source_rate, sample_rate, stereo)?.into_boxed_slice(),
		})
	}
}
