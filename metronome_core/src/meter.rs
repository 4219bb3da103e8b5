use std::sync::atomic::{
	AtomicBool, AtomicU16, AtomicU8,
	Ordering::{Acquire, Release},
};

/// minimum supported tempo
pub const MIN_BPM: u16 = 40;
/// maximum supported tempo
pub const MAX_BPM: u16 = 240;

/// the live metronome configuration
///
/// written by the transport, read by the beat loop every cycle, so tempo and
/// rhythm changes take effect on the very next beat
#[derive(Debug)]
pub struct Meter {
	/// BPM of the click, in the `40..=240` range
	pub bpm: AtomicU16,
	/// numerator of the time signature, `1..=16`
	pub numerator: AtomicU8,
	/// index of the next beat within the bar
	///
	/// `0` is the accented downbeat
	pub beat: AtomicU8,
	/// whether the beat loop is currently running
	pub playing: AtomicBool,
}

impl Default for Meter {
	fn default() -> Self {
		Self {
			bpm: AtomicU16::new(120),
			numerator: AtomicU8::new(4),
			beat: AtomicU8::new(0),
			playing: AtomicBool::new(false),
		}
	}
}

impl Meter {
	#[must_use]
	pub fn bpm(&self) -> u16 {
		self.bpm.load(Acquire)
	}

	#[must_use]
	pub fn numerator(&self) -> u8 {
		self.numerator.load(Acquire)
	}

	#[must_use]
	pub fn beat(&self) -> u8 {
		self.beat.load(Acquire)
	}

	#[must_use]
	pub fn playing(&self) -> bool {
		self.playing.load(Acquire)
	}

	pub(crate) fn set_bpm(&self, bpm: u16) {
		self.bpm.store(bpm.clamp(MIN_BPM, MAX_BPM), Release);
	}

	pub(crate) fn set_numerator(&self, numerator: u8) {
		self.numerator.store(numerator.max(1), Release);
	}

	pub(crate) fn reset_beat(&self) {
		self.beat.store(0, Release);
	}
}
