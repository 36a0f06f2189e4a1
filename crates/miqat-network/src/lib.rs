//! Remote prayer time providers for miqat.
//!
//! Each adapter wraps one external service behind [`TimeProvider`]:
//! request shaping, a bounded timeout, and normalization of the answer
//! into UTC [`RawTimes`](miqat_types::RawTimes). Failures come back as
//! [`ProviderError`] values, never as panics.

pub mod aladhan;
pub mod error;
pub mod feed;
pub mod provider;

pub use aladhan::{ALADHAN_BASE_URL, AladhanProvider, aladhan_method_id};
pub use error::ProviderError;
pub use feed::TimetableFeedProvider;
pub use provider::{DEFAULT_TIMEOUT, ProviderRequest, TimeProvider, build_client};
