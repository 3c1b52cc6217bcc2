// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Ownership semantics observed through the public API: copies are
//! independent, moves leave an empty source, bindings replace silently and
//! reset on teardown.

use handles_and_slots::bindings::buffer::UniformBuffer;
use handles_and_slots::bindings::image::Image;
use handles_and_slots::bindings::sampler::SamplerType;
use handles_and_slots::bindings::software::texture::{Extent, Texel};
use handles_and_slots::bindings::texture::Texture;
use handles_and_slots::bindings::visible_to::ImageAccess;
use handles_and_slots::bindings::{BindSlot, ResourceKind};
use handles_and_slots::images::device::{BoundDevice, UnboundDevice};
use handles_and_slots::images::shader::Shader;
use handles_and_slots::pixel_formats::{R8UNorm, RGBA8UNorm, Unorm4};
use std::sync::Arc;

fn device() -> Arc<BoundDevice> {
    Arc::new(BoundDevice::bind(UnboundDevice::pick().expect("pick")).expect("bind"))
}

/// A 4x4 texture whose pixel values encode their own coordinates.
fn coordinate_texture(device: &Arc<BoundDevice>) -> Texture<R8UNorm> {
    Texture::<R8UNorm>::new(device, 4, 4, SamplerType::default(), "coords", |t| {
        (t.y * 4 + t.x) as u8
    })
    .expect("texture")
}

#[test]
fn copies_are_bit_for_bit_independent() {
    let device = device();
    let source = coordinate_texture(&device);
    let mut original = Image::<R8UNorm>::new(&device, 4, 4, ImageAccess::ReadWrite, "original")
        .expect("image");
    original
        .copy_pixel_region(
            &source,
            Extent {
                width: 4,
                height: 4,
            },
            Texel::ZERO,
            Texel::ZERO,
        )
        .expect("populate");

    let mut duplicate = original.try_clone().expect("clone");
    let before = original.read_back().expect("read original");
    assert_eq!(duplicate.read_back().expect("read duplicate"), before);

    //mutate the duplicate; the original must not move
    let white = Texture::<R8UNorm>::new(&device, 4, 4, SamplerType::default(), "white", |_| 255u8)
        .expect("white");
    duplicate
        .copy_pixel_region(
            &white,
            Extent {
                width: 2,
                height: 2,
            },
            Texel::ZERO,
            Texel { x: 1, y: 1 },
        )
        .expect("mutate duplicate");
    assert_eq!(original.read_back().expect("read original"), before);
    assert_ne!(duplicate.read_back().expect("read duplicate"), before);

    //and the other direction
    let duplicate_before = duplicate.read_back().expect("read duplicate");
    original
        .copy_pixel_region(
            &white,
            Extent {
                width: 1,
                height: 1,
            },
            Texel::ZERO,
            Texel::ZERO,
        )
        .expect("mutate original");
    assert_eq!(duplicate.read_back().expect("read duplicate"), duplicate_before);
}

#[test]
fn moved_from_resources_are_empty_and_inert() {
    let device = device();
    let mut source = coordinate_texture(&device);
    let contents = source.read_back().expect("read");

    let moved = source.take();
    assert!(source.is_empty());
    assert!(!moved.is_empty());
    //the destination holds the content the source had before the move
    assert_eq!(moved.read_back().expect("read moved"), contents);

    //binding the empty source is a programming error
    assert!(source.bind(BindSlot::ZERO).is_err());
    assert!(source.read_back().is_err());
    //dropping the empty source is a no-op; the moved handle stays live
    drop(source);
    assert_eq!(moved.read_back().expect("read moved"), contents);
}

#[test]
fn duplicating_an_empty_resource_yields_an_empty_resource() {
    let device = device();
    let mut source = coordinate_texture(&device);
    let _kept_alive = source.take();
    let duplicate = source.try_clone().expect("clone of empty");
    assert!(duplicate.is_empty());
}

#[test]
fn failed_copy_assignment_leaves_the_target_untouched() {
    let device = device();
    //fill most of device memory so duplication cannot succeed
    let _ballast = (0..255)
        .map(|i| {
            Image::<RGBA8UNorm>::new(
                &device,
                512,
                512,
                ImageAccess::ReadWrite,
                &format!("ballast {i}"),
            )
            .expect("ballast")
        })
        .collect::<Vec<_>>();

    let texture = Texture::<RGBA8UNorm>::new(
        &device,
        512,
        512,
        SamplerType::default(),
        "target",
        |_| Unorm4 {
            r: 1,
            g: 2,
            b: 3,
            a: 4,
        },
    )
    .expect("target");
    let before = texture.read_back().expect("read");

    //copy-assignment: a = b.try_clone()?  On failure, `a` is untouched
    //because the assignment never happens.
    match texture.try_clone() {
        Err(_) => {}
        Ok(_) => panic!("duplication should have exhausted device memory"),
    }
    assert_eq!(texture.read_back().expect("read"), before);
    assert!(!texture.is_empty());
}

#[test]
fn out_of_range_regions_copy_nothing() {
    let device = device();
    let source = coordinate_texture(&device);
    let mut destination =
        Image::<R8UNorm>::new(&device, 4, 4, ImageAccess::WriteOnly, "destination")
            .expect("image");
    let before = destination.read_back().expect("read");

    //src_origin + size exceeds the 4x4 source
    let result = destination.copy_pixel_region(
        &source,
        Extent {
            width: 3,
            height: 3,
        },
        Texel { x: 2, y: 2 },
        Texel::ZERO,
    );
    assert!(result.is_err());
    assert_eq!(destination.read_back().expect("read"), before);

    //a valid region lands exactly where asked
    destination
        .copy_pixel_region(
            &source,
            Extent {
                width: 2,
                height: 2,
            },
            Texel { x: 1, y: 1 },
            Texel { x: 2, y: 2 },
        )
        .expect("valid copy");
    let after = destination.read_back().expect("read");
    //destination row 2, columns 2..4 hold source pixels (1,1) and (2,1)
    assert_eq!(after[2 * 4 + 2], 5);
    assert_eq!(after[2 * 4 + 3], 6);
    assert_eq!(after[3 * 4 + 2], 9);
    assert_eq!(after[3 * 4 + 3], 10);
}

#[test]
fn rebinding_a_slot_replaces_silently() {
    let device = device();
    let first = coordinate_texture(&device);
    let second = coordinate_texture(&device);
    let unit = BindSlot::new(2);

    first.bind(unit).expect("bind first");
    assert!(first.is_bound(unit));
    second.bind(unit).expect("bind second");
    assert!(!first.is_bound(unit));
    assert!(second.is_bound(unit));

    //unbind clears the slot without destroying anything
    second.unbind(unit).expect("unbind");
    assert!(!device.slot_occupied(ResourceKind::Texture, unit));
    second.read_back().expect("still alive");
}

#[test]
fn binding_does_not_transfer_ownership() {
    let device = device();
    let texture = coordinate_texture(&device);
    texture.bind(BindSlot::ZERO).expect("bind");
    //dropping the bound texture clears the slot rather than dangling
    drop(texture);
    assert!(!device.slot_occupied(ResourceKind::Texture, BindSlot::ZERO));
}

#[test]
fn teardown_resets_every_binding_point() {
    let device = device();
    let texture = coordinate_texture(&device);
    let image =
        Image::<R8UNorm>::new(&device, 2, 2, ImageAccess::ReadOnly, "bound image").expect("image");
    let mut shader = Shader::new(String::new(), String::new());
    shader.declare_block("Globals", 32);
    let mut uniforms = UniformBuffer::new(&device, 32, "globals").expect("uniforms");

    texture.bind(BindSlot::new(1)).expect("bind texture");
    image.bind(BindSlot::ZERO).expect("bind image");
    uniforms
        .set_uniform_block(&shader, "Globals")
        .expect("resolve block");
    assert!(device.slot_occupied(ResourceKind::UniformBuffer, BindSlot::ZERO));

    device.reset_bindings();
    assert!(!device.slot_occupied(ResourceKind::Texture, BindSlot::new(1)));
    assert!(!device.slot_occupied(ResourceKind::Image, BindSlot::ZERO));
    assert!(!device.slot_occupied(ResourceKind::UniformBuffer, BindSlot::ZERO));
    //the resources themselves survive the reset
    texture.read_back().expect("texture alive");
    image.read_back().expect("image alive");
    uniforms.read_back().expect("uniforms alive");
}
