// Constants for the retry module

/// Default maximum number of delivery attempts before an operation is
/// abandoned.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// Default base delay for exponential backoff, in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: i64 = 500;

/// Default maximum delay cap, in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: i64 = 30_000;

/// Default exponential growth factor: delay = base * factor^attempt.
pub const DEFAULT_FACTOR: f64 = 2.0;

/// Default jitter ratio (0.0 = none, 0.2 = +/-20%).
///
/// The policy itself never applies jitter; see
/// [`apply_jitter`](super::apply_jitter).
pub const DEFAULT_JITTER_RATIO: f64 = 0.2;

/// Maximum exponent used in the backoff calculation to prevent overflow.
pub const MAX_BACKOFF_EXPONENT: u32 = 30;
