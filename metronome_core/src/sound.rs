use std::{
	fmt::{Display, Formatter},
	io::Cursor,
};
use strum::VariantArray;
use symphonia::core::io::MediaSource;

static BELL: &[u8] = include_bytes!("../../assets/bell.wav");
static SMALLDRUM: &[u8] = include_bytes!("../../assets/smalldrum.wav");
static FONK: &[u8] = include_bytes!("../../assets/fonk.wav");
static CLAVES: &[u8] = include_bytes!("../../assets/claves.wav");

/// the built-in click sounds
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, VariantArray)]
pub enum ClickSound {
	#[default]
	Bell,
	SmallDrum,
	Fonk,
	Claves,
}

impl ClickSound {
	#[must_use]
	pub fn name(self) -> &'static str {
		match self {
			Self::Bell => "bell",
			Self::SmallDrum => "smalldrum",
			Self::Fonk => "fonk",
			Self::Claves => "claves",
		}
	}

	#[must_use]
	pub fn from_name(name: &str) -> Option<Self> {
		Self::VARIANTS
			.iter()
			.copied()
			.find(|sound| sound.name() == name.trim().to_lowercase())
	}

	pub(crate) fn bytes(self) -> &'static [u8] {
		match self {
			Self::Bell => BELL,
			Self::SmallDrum => SMALLDRUM,
			Self::Fonk => FONK,
			Self::Claves => CLAVES,
		}
	}

	pub(crate) fn media_source(self) -> Box<dyn MediaSource> {
		Box::new(Cursor::new(self.bytes()))
	}
}

impl Display for ClickSound {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_names() {
		for &sound in ClickSound::VARIANTS {
			assert_eq!(ClickSound::from_name(sound.name()), Some(sound));
		}

		assert_eq!(ClickSound::from_name(" Bell "), Some(ClickSound::Bell));
		assert_eq!(ClickSound::from_name("kazoo"), None);
	}

	#[test]
	fn assets_are_present() {
		for &sound in ClickSound::VARIANTS {
			assert!(!sound.bytes().is_empty());
		}
	}
}
