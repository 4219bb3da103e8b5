use log::warn;
use std::sync::{
	atomic::{
		AtomicBool,
		Ordering::{AcqRel, Acquire},
	},
	mpsc::{self, Sender},
};

#[derive(Debug)]
enum GuardMessage {
	Acquire,
	Release,
}

/// the CPU-retention lock bracketing every interval the beat loop is active
///
/// `acquire` and `release` are idempotent; the OS sleep-inhibition assertion
/// is best effort and lives on its own thread, which releases it on teardown
#[derive(Debug)]
pub struct PowerGuard {
	held: AtomicBool,
	commands: Sender<GuardMessage>,
}

impl Default for PowerGuard {
	fn default() -> Self {
		let (commands, receiver) = mpsc::channel();

		std::thread::spawn(move || {
			let mut awake = None;

			while let Ok(msg) = receiver.recv() {
				match msg {
					GuardMessage::Acquire => {
						if awake.is_none() {
							awake = keepawake::Builder::default()
								.display(false)
								.idle(true)
								.sleep(true)
								.app_name("metronome")
								.reason("beat loop running")
								.create()
								.map_err(|err| warn!("keep-awake unavailable: {err}"))
								.ok();
						}
					}
					GuardMessage::Release => awake = None,
				}
			}
		});

		Self {
			held: AtomicBool::new(false),
			commands,
		}
	}
}

impl PowerGuard {
	pub(crate) fn acquire(&self) {
		if !self.held.swap(true, AcqRel) {
			_ = self.commands.send(GuardMessage::Acquire);
		}
	}

	pub(crate) fn release(&self) {
		if self.held.swap(false, AcqRel) {
			_ = self.commands.send(GuardMessage::Release);
		}
	}

	#[must_use]
	pub fn held(&self) -> bool {
		self.held.load(Acquire)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn acquire_and_release_are_idempotent() {
		let guard = PowerGuard::default();
		assert!(!guard.held());

		guard.acquire();
		guard.acquire();
		assert!(guard.held());

		guard.release();
		assert!(!guard.held());

		guard.release();
		assert!(!guard.held());
	}
}
