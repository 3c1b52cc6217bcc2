/*! handles_and_slots is a GPU resource-ownership and binding-state middleware
layer for real-time rendering applications.

Immediate-mode device APIs hand you integer handles: allocate, get a number
back, delete the number when done, and mutate everything through contextual
binding points rather than direct addressing. Copying the number copies
nothing; forgetting the number leaks device memory; two owners of one number
is a use-after-free waiting for a frame boundary. This crate is the layer that
turns those numbers into values.

Here is how the resource classes line up:

| Class                                                    | Device state           | Copy (`try_clone`)                       | Move                          | Binds at                |
|----------------------------------------------------------|------------------------|------------------------------------------|-------------------------------|-------------------------|
| [`Image`](bindings::image::Image)                        | Pixel storage + access | New storage, device-side pixel copy      | Handle transfer, source empty | Image units             |
| [`Texture`](bindings::texture::Texture)                  | Pixel storage + sampler| New storage, device-side pixel copy      | Handle transfer, source empty | Texture units           |
| [`VertexBuffer`](bindings::buffer::VertexBuffer)         | Byte blob + stride     | New storage, device-side byte copy       | Handle transfer, source empty | Singleton               |
| [`IndexBuffer`](bindings::buffer::IndexBuffer)           | Byte blob + elem size  | New storage, device-side byte copy       | Handle transfer, source empty | Singleton               |
| [`UniformBuffer`](bindings::buffer::UniformBuffer)       | Byte blob + block      | New storage, device-side byte copy       | Handle transfer, source empty | Block binding index     |
| [`VertexArray`](bindings::vertex_array::VertexArray)     | Input-assembly state   | New state object, same attached buffers  | Handle transfer, source empty | Singleton               |

Copying is explicit and fallible (`try_clone`), because a true copy allocates
device storage and copies content device-side; there is no cheap-but-wrong
`Clone` that would alias the handle. Moving is explicit too where
observability matters (`take` leaves the source in an inert, safe-to-drop
empty state).

Binding points are the other half of the problem. The device context owns one
table from `(resource kind, slot)` to the currently bound handle. Binding
replaces silently, unbinding clears, teardown resets; nothing is
reference-counted, exactly like the device APIs underneath. See
[`bindings::bind_point`] for the contract.

# What this layer is not

No render loop, no scene graph, no shader compiler, no window. Those live
above or beside this crate and talk to it through narrow seams: shader
*reflection results* come in through [`images::shader::Shader`], decoded
*pixel bytes* through [`bindings::software::texture`], and the draw loop reads
element counts and index sizes back out of the resource types.

# Backends

Backends mount at the `imp` seam. The crate currently ships the software
reference driver: allocation and binding tables in host memory with real byte
contents, which is what the test suite observes end to end. Hardware drivers
slot in behind the same boundary without touching the ownership layer above
it.

# Example

A complete draw setup, minus the draw:

```
use handles_and_slots::bindings::buffer::{IndexBuffer, UniformBuffer, VertexBuffer};
use handles_and_slots::bindings::sampler::SamplerType;
use handles_and_slots::bindings::texture::Texture;
use handles_and_slots::bindings::vertex_array::VertexArray;
use handles_and_slots::bindings::BindSlot;
use handles_and_slots::images::device::{BoundDevice, UnboundDevice};
use handles_and_slots::images::index_algorithms::QuadIndexGenerator;
use handles_and_slots::images::shader::Shader;
use handles_and_slots::images::vertex_layout::ComponentType;
use handles_and_slots::pixel_formats::{RGBA8UNorm, Unorm4};
use std::sync::Arc;

#[repr(C)]
#[derive(Clone, Copy)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
}

let device = Arc::new(BoundDevice::bind(UnboundDevice::pick()?)?);

// Geometry: one quad
let quad = QuadIndexGenerator::new(1);
let vertices = VertexBuffer::<Vertex>::new(&device, quad.num_vertices(), "quad vertices", |i| {
    Vertex {
        position: [i as f32, 0.0, 0.0],
        normal: [0.0, 0.0, 1.0],
        uv: [0.0, 0.0],
    }
})?;
let indices = IndexBuffer::<u16>::new(&device, quad.num_indices(), "quad indices", |i| {
    quad.index_for(i) as u16
})?;

let mut array = VertexArray::with_buffers(&device, &vertices, &indices, "quad")?;
array.add_attribute(3, ComponentType::F32, 0, false)?;
array.add_attribute(3, ComponentType::F32, 12, false)?;
array.add_attribute(2, ComponentType::F32, 24, false)?;

// A texture for the fragment stage
let texture = Texture::<RGBA8UNorm>::new(&device, 2, 2, SamplerType::default(), "checker", |t| {
    if (t.x + t.y) % 2 == 0 {
        Unorm4 { r: 255, g: 255, b: 255, a: 255 }
    } else {
        Unorm4 { r: 0, g: 0, b: 0, a: 255 }
    }
})?;

// A uniform block resolved against the shader's reflection data
let mut shader = Shader::new("/* vertex */".into(), "/* fragment */".into());
shader.declare_block("Matrices", 96);
shader.declare_member("Matrices", "worldView", 0, 64)?;
let mut matrices = UniformBuffer::new(&device, 96, "matrices")?;
matrices.set_uniform_block(&shader, "Matrices")?;

// Everything the draw call will need is now current
array.bind()?;
texture.bind(BindSlot::ZERO)?;
assert_eq!(array.index_count(), Some(6));
assert_eq!(array.index_element_size(), Some(2));
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/

pub mod bindings;
pub mod images;
mod imp;
pub mod pixel_formats;
