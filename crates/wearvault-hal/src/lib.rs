//! Hardware Abstraction Layer for wearvault
//!
//! Provides platform-independent traits for the byte-addressable
//! non-volatile memory the storage units run on, and for the monotonic
//! clock the commit scheduler paces itself with. Platform support is
//! feature-gated:
//! - `mock`: in-memory implementations for desktop testing (default)
//!
//! A real target supplies its own implementation of [`NonVolatileMemory`];
//! anything that can read a byte, erase+write a byte, erase a byte to
//! 0xFF, and AND zero bits into a byte qualifies.

pub mod traits;
pub mod error;

#[cfg(feature = "mock")]
pub mod mock;

pub use traits::*;
pub use error::*;

#[cfg(feature = "mock")]
pub use mock::{MockClock, MockNvm};
