// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Software (CPU-side) implementations of texture concepts.

Everything in this module lives in host memory. It exists to stage pixel data
before upload to a device resource, and to give tests and tools a place to
inspect pixels without a device round-trip.
*/

pub mod texture;
