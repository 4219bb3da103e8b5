use log::warn;
use metronome_core::{
	Action, ClickSound, Command, CpalOutput, MAX_BPM, MIN_BPM, Notifier, TimeSignature, Transport,
};
use std::{io::BufRead as _, sync::Arc};
use strum::VariantArray as _;

/// prints the status line a platform shell would put in its persistent
/// notification
#[derive(Clone, Copy, Debug, Default)]
struct StdoutNotifier;

impl Notifier for StdoutNotifier {
	fn publish(&self, status: &str) {
		println!("{status}");
	}
}

fn main() {
	env_logger::init();

	let Some(output) = CpalOutput::new() else {
		eprintln!("no usable audio output device");
		std::process::exit(1);
	};

	let transport = Transport::new(Arc::new(output), Box::new(StdoutNotifier));

	// what a host settings store would hold between commands
	let mut bpm = 120_u16;
	let mut rhythm = "4/4".to_owned();
	let mut sound = ClickSound::default();

	println!("commands: start | stop | bpm <n> | rhythm <n/m> | sound <name> | status | quit");

	for line in std::io::stdin().lock().lines() {
		let Ok(line) = line else {
			break;
		};

		let mut words = line.split_whitespace();
		let Some(word) = words.next() else {
			continue;
		};
		let arg = words.next();

		let action = match word {
			"start" => Some(Action::Start),
			"stop" => {
				transport.stop();
				println!("stopped");
				None
			}
			"bpm" => {
				if let Some(new) = arg.and_then(|arg| arg.parse::<u16>().ok()) {
					bpm = new.clamp(MIN_BPM, MAX_BPM);
					Some(Action::UpdateTempo)
				} else {
					println!("usage: bpm <{MIN_BPM}..{MAX_BPM}>");
					None
				}
			}
			"rhythm" => {
				if let Some(arg) = arg {
					rhythm = arg.to_owned();
					Some(Action::UpdateAll)
				} else {
					let presets = TimeSignature::PRESETS
						.iter()
						.map(TimeSignature::to_string)
						.collect::<Vec<_>>();
					println!("usage: rhythm <n/m>, e.g. {}", presets.join(" "));
					None
				}
			}
			"sound" => {
				if let Some(new) = arg.and_then(ClickSound::from_name) {
					sound = new;
					Some(Action::UpdateAll)
				} else {
					let names = ClickSound::VARIANTS
						.iter()
						.map(|variant| variant.name())
						.collect::<Vec<_>>();
					println!("usage: sound <{}>", names.join("|"));
					None
				}
			}
			"status" => {
				println!("{}", transport.status());
				None
			}
			"quit" | "exit" => break,
			_ => {
				warn!("unknown command {word:?}");
				None
			}
		};

		if let Some(action) = action {
			transport.handle(&Command {
				action,
				bpm,
				rhythm: rhythm.clone(),
				sound,
			});
		}
	}

	transport.stop();
}
