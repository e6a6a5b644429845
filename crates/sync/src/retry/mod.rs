//! Retry policy: attempt count in, retry-ability and delay out.
//!
//! Kept pure and deterministic so that crash recovery recomputes the same
//! schedule the pre-crash process would have chosen. Jitter is a caller-side
//! concern; see [`apply_jitter`].

mod constants;
mod policy;

pub use self::constants::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_FACTOR, DEFAULT_JITTER_RATIO, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_DELAY_MS, MAX_BACKOFF_EXPONENT,
};
pub use self::policy::{apply_jitter, RetryPolicy};
