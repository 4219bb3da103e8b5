mod click;
mod clock;
mod loader;
mod meter;
mod output;
mod power;
mod resampler;
mod sound;
mod time_signature;
mod transport;

pub use click::Click;
pub use loader::LoadState;
pub use meter::{MAX_BPM, MIN_BPM, Meter};
pub use output::{CpalOutput, Output};
pub use power::PowerGuard;
pub use sound::ClickSound;
pub use time_signature::TimeSignature;
pub use transport::{Action, Command, LogNotifier, Notifier, Transport};
