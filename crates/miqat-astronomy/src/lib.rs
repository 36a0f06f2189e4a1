//! Prayer times and Qibla calculations for miqat.
//!
//! Provides the offline astronomical layer: it needs no network and no
//! state, so the same inputs always give the same schedule.

pub mod solar;
pub mod prayer;
pub mod qibla;

pub use prayer::calculate_prayer_times;
pub use qibla::{distance_to_kaaba_km, qibla_bearing};
