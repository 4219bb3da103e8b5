use std::fmt::{Display, Formatter};

const MAX_NUMERATOR: u8 = 16;

/// a time signature parsed from a rhythm descriptor like `"3/4"`
///
/// only the numerator affects scheduling; the denominator is kept for
/// display
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimeSignature {
	pub numerator: u8,
	pub denominator: u8,
}

impl Default for TimeSignature {
	fn default() -> Self {
		Self {
			numerator: 4,
			denominator: 4,
		}
	}
}

impl TimeSignature {
	/// the rhythms selectable in the host UI
	pub const PRESETS: [Self; 6] = [
		Self::new(3, 4),
		Self::new(4, 4),
		Self::new(5, 4),
		Self::new(6, 8),
		Self::new(7, 8),
		Self::new(9, 8),
	];

	#[must_use]
	pub const fn new(numerator: u8, denominator: u8) -> Self {
		Self {
			numerator,
			denominator,
		}
	}

	/// parses a `"N/M"` rhythm descriptor
	///
	/// an unparsable or non-positive numerator falls back to 4, so this
	/// never fails; oversized numerators are capped at 16
	#[must_use]
	pub fn parse(rhythm: &str) -> Self {
		let mut fields = rhythm.split('/');

		let numerator = fields
			.next()
			.and_then(|n| n.trim().parse::<u8>().ok())
			.filter(|&n| n >= 1)
			.map_or(4, |n| n.min(MAX_NUMERATOR));

		let denominator = fields
			.next()
			.and_then(|d| d.trim().parse::<u8>().ok())
			.filter(|&d| d >= 1)
			.unwrap_or(4);

		Self {
			numerator,
			denominator,
		}
	}
}

impl Display for TimeSignature {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(itoa::Buffer::new().format(self.numerator))?;
		f.write_str("/")?;
		f.write_str(itoa::Buffer::new().format(self.denominator))
	}
}
