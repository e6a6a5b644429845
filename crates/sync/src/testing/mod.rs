//! Test doubles for the consumed contracts (transport and probe).
//!
//! Public on purpose: downstream crates embedding the engine need the same
//! doubles to test their own sync flows.

mod probe;
mod transport;

pub use self::probe::StaticProbe;
pub use self::transport::{FakeTransport, TransportRule};
