use rubato::{FftFixedIn, Resampler as _};

/// resamples a whole interleaved stereo buffer from `from` hz to `to` hz
///
/// clicks are short and fully decoded before playback, so the streaming case
/// is not needed here
pub(crate) fn resample(from: u32, to: u32, samples: Vec<f32>) -> Option<Vec<f32>> {
	if from == to {
		return Some(samples);
	}

	let frames_in = samples.len() / 2;
	let mut channels = [Vec::with_capacity(frames_in), Vec::with_capacity(frames_in)];
	for frame in samples.chunks_exact(2) {
		channels[0].push(frame[0]);
		channels[1].push(frame[1]);
	}

	let mut fft = FftFixedIn::<f32>::new(from as usize, to as usize, 1024, 2, 2).ok()?;

	let delay = fft.output_delay();
	let frames_out = (frames_in as f64 * f64::from(to) / f64::from(from)).ceil() as usize;

	let mut out = [Vec::new(), Vec::new()];

	let mut pos = 0;
	loop {
		let len = fft.input_frames_next();
		if pos + len > frames_in {
			break;
		}

		let chunks = fft
			.process(
				&[&channels[0][pos..pos + len], &channels[1][pos..pos + len]],
				None,
			)
			.ok()?;
		extend(&mut out, chunks);
		pos += len;
	}

	if pos < frames_in {
		let chunks = fft
			.process_partial(Some(&[&channels[0][pos..], &channels[1][pos..]]), None)
			.ok()?;
		extend(&mut out, chunks);
	}

	// drain the filter until the delayed tail has come through
	while out[0].len() < delay + frames_out {
		let chunks = fft.process_partial::<&[f32]>(None, None).ok()?;
		extend(&mut out, chunks);
	}

	let mut samples = Vec::with_capacity(2 * frames_out);
	for (l, r) in out[0].iter().zip(&out[1]).skip(delay).take(frames_out) {
		samples.push(*l);
		samples.push(*r);
	}

	Some(samples)
}

fn extend(out: &mut [Vec<f32>; 2], chunks: Vec<Vec<f32>>) {
	for (out, chunk) in out.iter_mut().zip(chunks) {
		out.extend(chunk);
	}
}
