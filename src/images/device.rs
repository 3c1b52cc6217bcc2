// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//!Cross-platform device wrappers.
//!
//! Acquiring a device is a two-step affair: pick a driver, then bind it into
//! a context. The split exists so a hardware driver can report adapter-level
//! failures separately from context creation; the software reference driver
//! succeeds at both unconditionally.
use crate::bindings::bind_point::{BindSlot, ResourceKind};
use crate::imp;
use std::fmt::Formatter;

///Cross-platform unbound device: a picked driver with no context yet.
#[derive(Debug)]
pub struct UnboundDevice(pub(crate) imp::UnboundDevice);

impl UnboundDevice {
    ///Pick a driver.
    pub fn pick() -> Result<UnboundDevice, PickError> {
        Ok(UnboundDevice(imp::UnboundDevice::pick()))
    }
}

///No usable device driver was available.
#[derive(Debug)]
pub struct PickError;
impl std::fmt::Display for PickError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "no usable device driver is available")
    }
}
impl std::error::Error for PickError {}

///Binding a picked driver into a context failed.
#[derive(Debug)]
pub struct BindError;
impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not bind the picked driver into a device context")
    }
}
impl std::error::Error for BindError {}

///Cross-platform bound device: a live context.
///
/// Owns the allocation table and the binding-point table. Every resource in
/// the crate holds an `Arc<BoundDevice>` back to the context that allocated
/// it; the context outlives its resources, and tearing it down resets every
/// binding point.
///
/// The API is single-owning-thread by contract: the driver serializes calls
/// internally, but nothing here coordinates concurrent mutation of binding
/// state, exactly like the underlying device APIs.
#[derive(Debug)]
pub struct BoundDevice(pub(crate) imp::Device);

impl BoundDevice {
    pub fn bind(unbound_device: UnboundDevice) -> Result<Self, BindError> {
        Ok(Self(imp::Device::bind_context(unbound_device.0)))
    }

    /// Whether anything is currently bound at `(kind, slot)`.
    ///
    /// Diagnostic surface; the binding table itself stays opaque.
    pub fn slot_occupied(&self, kind: ResourceKind, slot: BindSlot) -> bool {
        self.0.slot_occupied(kind, slot.index())
    }

    /// Clears every binding point, the same transition that happens when the
    /// context is torn down.
    pub fn reset_bindings(&self) {
        self.0.reset_bindings();
    }
}
