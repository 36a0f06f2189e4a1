//! Override store and schedule merger for miqat.
//!
//! Administrator intent lives here, outside the cached raw times, so a
//! fresh override is visible on the very next resolution.

pub mod merger;
pub mod store;

pub use merger::merge;
pub use store::{
    InMemoryOverrideStore, IqamahTimes, MAX_IQAMAH_OFFSET, MAX_TARAWIH_OFFSET, OverrideId, OverrideStore,
    OverrideUpdate, PrayerOverride, TarawihConfig,
};
