use crate::{loader::Loader, meter::Meter, output::Output};
use log::trace;
use std::{
	fmt::{Debug, Formatter},
	sync::{
		Arc,
		atomic::Ordering::{Acquire, Release},
		mpsc::{self, RecvTimeoutError, Sender},
	},
	thread::JoinHandle,
	time::{Duration, Instant},
};

/// gain of the accented downbeat
const ACCENT_GAIN: f32 = 1.0;
/// gain of every other beat
const BEAT_GAIN: f32 = 0.5;

/// the self-correcting beat loop
///
/// idle when no worker thread is alive, active while one is; the loop
/// re-reads the meter every cycle, so tempo and rhythm changes take effect
/// on the very next beat without a restart
pub struct BeatClock {
	meter: Arc<Meter>,
	loader: Arc<Loader>,
	output: Arc<dyn Output>,
	worker: Option<Worker>,
}

struct Worker {
	stop: Sender<()>,
	handle: JoinHandle<()>,
}

impl Debug for BeatClock {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BeatClock")
			.field("meter", &self.meter)
			.field("active", &self.worker.is_some())
			.finish_non_exhaustive()
	}
}

impl BeatClock {
	pub(crate) fn new(meter: Arc<Meter>, loader: Arc<Loader>, output: Arc<dyn Output>) -> Self {
		Self {
			meter,
			loader,
			output,
			worker: None,
		}
	}

	#[must_use]
	pub(crate) fn active(&self) -> bool {
		self.worker.is_some()
	}

	/// starts the loop; a no-op while already active, so no two workers can
	/// ever advance the beat counter concurrently
	pub(crate) fn arm(&mut self) {
		if self.worker.is_some() {
			trace!("arm while active, ignoring");
			return;
		}

		let (stop, stopped) = mpsc::channel();

		let meter = self.meter.clone();
		let loader = self.loader.clone();
		let output = self.output.clone();

		meter.playing.store(true, Release);

		let handle = std::thread::spawn(move || {
			loop {
				let interval_ms = 60_000.0 / f64::from(meter.bpm.load(Acquire));
				let cycle_start = Instant::now();

				if let Some(click) = loader.click() {
					let gain = if meter.beat.load(Acquire) == 0 {
						ACCENT_GAIN
					} else {
						BEAT_GAIN
					};
					output.play(click, gain);
				}

				let numerator = meter.numerator.load(Acquire).max(1);
				let beat = meter.beat.load(Acquire);
				meter.beat.store((beat + 1) % numerator, Release);

				// the wait is shortened by however long the trigger took,
				// so the long-run period converges to the interval
				let delay = Duration::from_secs_f64(interval_ms / 1000.0)
					.saturating_sub(cycle_start.elapsed())
					.max(Duration::from_millis(1));

				// waiting on the control channel keeps the suspension
				// interruptible: a disarm lands before the next beat
				match stopped.recv_timeout(delay) {
					Err(RecvTimeoutError::Timeout) => {}
					_ => break,
				}
			}
		});

		self.worker = Some(Worker { stop, handle });
	}

	/// stops the loop and joins the worker, so no stale beat can fire once
	/// this returns
	pub(crate) fn disarm(&mut self) {
		if let Some(worker) = self.worker.take() {
			_ = worker.stop.send(());
			_ = worker.handle.join();
		}

		self.meter.playing.store(false, Release);
	}
}

impl Drop for BeatClock {
	fn drop(&mut self) {
		self.disarm();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{click::Click, sound::ClickSound};
	use std::sync::Mutex;

	struct StubOutput {
		events: Mutex<Vec<(Instant, f32)>>,
		busy: Duration,
	}

	impl StubOutput {
		fn new(busy: Duration) -> Arc<Self> {
			Arc::new(Self {
				events: Mutex::new(Vec::new()),
				busy,
			})
		}

		fn events(&self) -> Vec<(Instant, f32)> {
			self.events.lock().unwrap().clone()
		}
	}

	impl Output for StubOutput {
		fn play(&self, _: Arc<Click>, gain: f32) {
			self.events.lock().unwrap().push((Instant::now(), gain));
			std::thread::sleep(self.busy);
		}

		fn sample_rate(&self) -> u32 {
			44100
		}
	}

	fn ready_loader() -> Arc<Loader> {
		let loader = Arc::new(Loader::new(44100));
		loader.set_ready(Click::decode(ClickSound::Claves.media_source(), 44100).unwrap());
		loader
	}

	fn make_clock(meter: &Arc<Meter>, output: &Arc<StubOutput>, loader: &Arc<Loader>) -> BeatClock {
		BeatClock::new(
			meter.clone(),
			loader.clone(),
			output.clone() as Arc<dyn Output>,
		)
	}

	#[test]
	fn accents_follow_the_bar() {
		let meter = Arc::new(Meter::default());
		meter.bpm.store(1200, Release);
		meter.numerator.store(3, Release);

		let output = StubOutput::new(Duration::ZERO);
		let mut clock = make_clock(&meter, &output, &ready_loader());

		clock.arm();
		while output.events().len() < 7 {
			std::thread::sleep(Duration::from_millis(5));
		}
		clock.disarm();

		let gains = output
			.events()
			.iter()
			.map(|&(_, gain)| gain)
			.take(7)
			.collect::<Vec<_>>();
		assert_eq!(gains, [1.0, 0.5, 0.5, 1.0, 0.5, 0.5, 1.0]);
	}

	#[test]
	fn arm_is_idempotent() {
		let meter = Arc::new(Meter::default());
		meter.bpm.store(1200, Release);

		let output = StubOutput::new(Duration::ZERO);
		let mut clock = make_clock(&meter, &output, &ready_loader());

		clock.arm();
		clock.arm();
		assert!(clock.active());

		std::thread::sleep(Duration::from_millis(320));
		clock.disarm();

		// one 50ms loop fires ~7 beats in that window; two would double it
		let count = output.events().len();
		assert!((3..=10).contains(&count), "saw {count} beats");
	}

	#[test]
	fn disarm_interrupts_the_wait() {
		let meter = Arc::new(Meter::default());
		meter.bpm.store(60, Release);

		let output = StubOutput::new(Duration::ZERO);
		let mut clock = make_clock(&meter, &output, &ready_loader());

		clock.arm();
		std::thread::sleep(Duration::from_millis(100));

		let before = Instant::now();
		clock.disarm();

		// the loop was a second into its wait; disarm must not ride it out
		assert!(before.elapsed() < Duration::from_millis(500));
		assert_eq!(output.events().len(), 1);
		assert!(!meter.playing());

		std::thread::sleep(Duration::from_millis(200));
		assert_eq!(output.events().len(), 1, "a stale beat slipped through");
	}

	#[test]
	fn keeps_schedule_without_a_sound() {
		let meter = Arc::new(Meter::default());
		meter.bpm.store(1200, Release);

		let output = StubOutput::new(Duration::ZERO);
		let loader = Arc::new(Loader::new(44100));
		let mut clock = make_clock(&meter, &output, &loader);

		clock.arm();

		// the beat counter still advances even though nothing is audible
		let deadline = Instant::now() + Duration::from_secs(5);
		while meter.beat() == 0 {
			assert!(Instant::now() < deadline, "the beat never advanced");
			std::thread::sleep(Duration::from_millis(1));
		}

		clock.disarm();
		assert!(output.events().is_empty());
	}

	#[test]
	fn single_beat_bars_are_all_accents() {
		let meter = Arc::new(Meter::default());
		meter.bpm.store(1200, Release);
		meter.numerator.store(1, Release);

		let output = StubOutput::new(Duration::ZERO);
		let mut clock = make_clock(&meter, &output, &ready_loader());

		clock.arm();
		while output.events().len() < 4 {
			std::thread::sleep(Duration::from_millis(5));
		}
		clock.disarm();

		assert!(output.events().iter().take(4).all(|&(_, gain)| gain == 1.0));
	}

	#[test]
	fn interval_converges_under_slow_triggers() {
		let meter = Arc::new(Meter::default());
		meter.bpm.store(1200, Release);

		// a trigger handler that eats nearly half the 50ms interval
		let output = StubOutput::new(Duration::from_millis(20));
		let mut clock = make_clock(&meter, &output, &ready_loader());

		clock.arm();
		while output.events().len() < 12 {
			std::thread::sleep(Duration::from_millis(5));
		}
		clock.disarm();

		let events = output.events();
		let spans = events
			.windows(2)
			.map(|pair| pair[1].0 - pair[0].0)
			.collect::<Vec<_>>();
		let mean = spans.iter().sum::<Duration>() / spans.len() as u32;

		assert!(
			(Duration::from_millis(45)..=Duration::from_millis(62)).contains(&mean),
			"mean inter-beat interval was {mean:?}"
		);
	}
}
