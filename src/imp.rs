// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//at the moment we only ship the software reference driver
//! The device driver boundary.
//!
//! Everything above this module talks to the driver through a small set of
//! operations: allocate and release a resource of some kind, duplicate a
//! resource device-side, bind and unbind a handle at a `(kind, slot)` binding
//! point, copy a pixel region between two handles, write bytes into a
//! handle's storage, and read them back. Hardware backends mount at this seam;
//! the software driver in [`software`] is the reference implementation and the
//! one the test suite observes.

use std::num::NonZeroU32;

/// An opaque device handle.
///
/// Meaningful only within the device context that allocated it. Handle values
/// are never reused within a context, and the "no resource" state is
/// represented by absence (`Option<RawHandle>`), not by a reserved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct RawHandle(NonZeroU32);

impl RawHandle {
    /// The raw integer, for logging and driver-internal tables.
    pub(crate) fn index(self) -> u32 {
        self.0.get()
    }
}

mod software;
pub(crate) use software::{Device, UnboundDevice};
