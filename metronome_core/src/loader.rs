use crate::{click::Click, sound::ClickSound};
use arc_swap::ArcSwapOption;
use atomig::{Atom, Atomic};
use log::{trace, warn};
use std::sync::{
	Arc, Mutex,
	atomic::{
		AtomicU64,
		Ordering::{AcqRel, Acquire, Release},
	},
};
use symphonia::core::io::MediaSource;

/// lifecycle of the current sound asset
///
/// `Failed` leaves the engine playable but silent; the beat loop keeps
/// timing without a handle
#[repr(u8)]
#[derive(Atom, Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LoadState {
	#[default]
	Idle,
	Loading,
	Ready,
	Failed,
}

/// the sound-asset load/swap state machine
///
/// at most one request is current; completions of superseded requests are
/// discarded wholesale, so the latest requested sound always wins
#[derive(Debug)]
pub struct Loader {
	state: Atomic<LoadState>,
	click: ArcSwapOption<Click>,
	generation: AtomicU64,
	transition: Mutex<()>,
	sample_rate: u32,
}

impl Loader {
	pub(crate) fn new(sample_rate: u32) -> Self {
		Self {
			state: Atomic::new(LoadState::Idle),
			click: ArcSwapOption::empty(),
			generation: AtomicU64::new(0),
			transition: Mutex::new(()),
			sample_rate,
		}
	}

	#[must_use]
	pub fn state(&self) -> LoadState {
		self.state.load(Acquire)
	}

	/// the handle of the last completed load, if it succeeded
	#[must_use]
	pub fn click(&self) -> Option<Arc<Click>> {
		self.click.load_full()
	}

	pub(crate) fn request(
		self: &Arc<Self>,
		sound: ClickSound,
		on_done: impl FnOnce(LoadState) + Send + 'static,
	) {
		trace!("loading {sound}");
		self.request_source(sound.media_source(), on_done);
	}

	pub(crate) fn request_source(
		self: &Arc<Self>,
		source: Box<dyn MediaSource>,
		on_done: impl FnOnce(LoadState) + Send + 'static,
	) {
		let generation = {
			let _transition = self.transition.lock().unwrap();

			// the previous handle is released before the new load goes out
			self.click.store(None);
			self.state.store(LoadState::Loading, Release);
			self.generation.fetch_add(1, AcqRel) + 1
		};

		let loader = self.clone();
		std::thread::spawn(move || {
			let click = Click::decode(source, loader.sample_rate);
			if let Some(state) = loader.finish(generation, click) {
				on_done(state);
			}
		});
	}

	/// `Loading -> Ready | Failed`; a completion whose generation is stale
	/// belongs to a superseded request and is dropped
	fn finish(&self, generation: u64, click: Option<Click>) -> Option<LoadState> {
		let _transition = self.transition.lock().unwrap();

		if self.generation.load(Acquire) != generation {
			trace!("discarding superseded load");
			return None;
		}

		let state = if let Some(click) = click {
			self.click.store(Some(Arc::new(click)));
			LoadState::Ready
		} else {
			warn!("click failed to decode, continuing silent");
			LoadState::Failed
		};

		self.state.store(state, Release);
		Some(state)
	}

	#[cfg(test)]
	pub(crate) fn set_ready(&self, click: Click) {
		self.click.store(Some(Arc::new(click)));
		self.state.store(LoadState::Ready, Release);
	}
}
