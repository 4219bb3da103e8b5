use crate::{
	clock::BeatClock,
	loader::{LoadState, Loader},
	meter::Meter,
	output::Output,
	power::PowerGuard,
	sound::ClickSound,
	time_signature::TimeSignature,
};
use log::{info, trace};
use std::{
	fmt::{Debug, Formatter},
	sync::{Arc, Mutex},
};

/// what a command asks the transport to do
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
	/// fresh start: the bar begins again on an accent
	Start,
	/// live tempo change, the bar position is kept
	UpdateTempo,
	/// reconcile rhythm and sound, e.g. when the host comes back from the
	/// background
	UpdateAll,
}

/// a configuration command from the host
#[derive(Clone, Debug)]
pub struct Command {
	pub action: Action,
	pub bpm: u16,
	pub rhythm: String,
	pub sound: ClickSound,
}

impl Command {
	#[must_use]
	pub fn new(action: Action) -> Self {
		Self {
			action,
			bpm: 120,
			rhythm: "4/4".to_owned(),
			sound: ClickSound::default(),
		}
	}
}

/// where the host-visible status line goes
pub trait Notifier: Send + Sync {
	fn publish(&self, status: &str);
}

/// default notifier, routes the status line to the log
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
	fn publish(&self, status: &str) {
		info!("{status}");
	}
}

/// owns the loop lifecycle and interprets host commands
///
/// single writer of the shared meter; the beat loop only ever reads it
pub struct Transport {
	meter: Arc<Meter>,
	loader: Arc<Loader>,
	guard: PowerGuard,
	notifier: Box<dyn Notifier>,
	inner: Mutex<Inner>,
}

struct Inner {
	clock: BeatClock,
	sound: Option<ClickSound>,
}

impl Debug for Transport {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Transport")
			.field("meter", &self.meter)
			.field("load_state", &self.loader.state())
			.field("guard_held", &self.guard.held())
			.finish_non_exhaustive()
	}
}

impl Transport {
	#[must_use]
	pub fn new(output: Arc<dyn Output>, notifier: Box<dyn Notifier>) -> Arc<Self> {
		let meter = Arc::new(Meter::default());
		let loader = Arc::new(Loader::new(output.sample_rate()));
		let clock = BeatClock::new(meter.clone(), loader.clone(), output);

		Arc::new(Self {
			meter,
			loader,
			guard: PowerGuard::default(),
			notifier,
			inner: Mutex::new(Inner { clock, sound: None }),
		})
	}

	#[must_use]
	pub fn meter(&self) -> &Meter {
		&self.meter
	}

	#[must_use]
	pub fn load_state(&self) -> LoadState {
		self.loader.state()
	}

	#[must_use]
	pub fn guard_held(&self) -> bool {
		self.guard.held()
	}

	#[must_use]
	pub fn status(&self) -> String {
		format!("metronome in the background ({} BPM)", self.meter.bpm())
	}

	pub fn handle(self: &Arc<Self>, command: &Command) {
		trace!("{command:?}");

		self.meter.set_bpm(command.bpm);
		let signature = TimeSignature::parse(&command.rhythm);

		let mut inner = self.inner.lock().unwrap();

		match command.action {
			Action::Start => {
				inner.clock.disarm();
				self.meter.reset_beat();
				self.meter.set_numerator(signature.numerator);
				self.guard.acquire();

				// reload when the sound changed or nothing usable is loaded;
				// an in-flight load for this sound arms on completion
				if inner.sound != Some(command.sound)
					|| matches!(self.loader.state(), LoadState::Idle | LoadState::Failed)
				{
					inner.sound = Some(command.sound);
					self.loader.request(command.sound, self.on_loaded());
				} else if self.loader.state() == LoadState::Ready {
					self.arm(&mut inner);
				}
			}
			Action::UpdateTempo => {
				// tempo nudges never disturb the bar position, even when the
				// numerator moved along with them
				self.meter.set_numerator(signature.numerator);
				self.arm(&mut inner);
			}
			Action::UpdateAll => {
				if signature.numerator != self.meter.numerator() {
					// a new rhythm starts over on an accent
					self.meter.reset_beat();
				}
				self.meter.set_numerator(signature.numerator);

				if inner.sound != Some(command.sound) {
					inner.sound = Some(command.sound);
					self.loader.request(command.sound, self.on_loaded());
				} else {
					self.arm(&mut inner);
				}
			}
		}

		drop(inner);
		self.notifier.publish(&self.status());
	}

	/// disarms the loop and lets go of the power lock, unconditionally
	pub fn stop(&self) {
		let mut inner = self.inner.lock().unwrap();
		inner.clock.disarm();
		self.guard.release();
	}

	/// the guard brackets every interval the clock is active
	fn arm(&self, inner: &mut Inner) {
		self.guard.acquire();
		inner.clock.arm();
	}

	fn on_loaded(self: &Arc<Self>) -> impl FnOnce(LoadState) + Send + 'static {
		let transport = Arc::downgrade(self);

		move |state| {
			if let Some(transport) = transport.upgrade() {
				transport.load_finished(state);
			}
		}
	}

	/// `Loading -> Ready` arms with sound; `Loading -> Failed` arms silent,
	/// so the loop keeps time either way
	fn load_finished(&self, state: LoadState) {
		if matches!(state, LoadState::Ready | LoadState::Failed) {
			let mut inner = self.inner.lock().unwrap();
			self.arm(&mut inner);
		}
	}
}

impl Drop for Transport {
	fn drop(&mut self) {
		self.stop();
	}
}
