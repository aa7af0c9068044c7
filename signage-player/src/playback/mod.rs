//! Playback engine, fade ramp, playlist and scheduler loop

pub mod engine;
pub mod fader;
pub mod playlist;
pub mod scheduler;

pub use engine::PlaybackEngine;
pub use fader::AudioFade;
pub use playlist::Playlist;
pub use scheduler::Scheduler;
