use crate::click::Click;
use std::sync::Arc;

/// a click in flight, mixed additively into the stereo scratch buffer
#[derive(Debug)]
pub(crate) struct Voice {
	click: Arc<Click>,
	gain: f32,
	idx: usize,
}

impl Voice {
	pub(crate) fn new(click: Arc<Click>, gain: f32) -> Self {
		Self {
			click,
			gain,
			idx: 0,
		}
	}

	pub(crate) fn mix_into(&mut self, buf: &mut [f32]) {
		let samples = &self.click.samples()[self.idx..];

		for (buf, s) in buf.iter_mut().zip(samples) {
			*buf += s * self.gain;
		}

		self.idx = (self.idx + buf.len()).min(self.click.samples().len());
	}

	pub(crate) fn over(&self) -> bool {
		self.idx >= self.click.samples().len()
	}
}
