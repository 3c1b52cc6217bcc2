/*!
Algorithms for generating index lists for rendering quads as triangle meshes.

A quad drawn as two triangles needs six indices over four vertices. This
module generates that pattern for a run of quads, in a triangle list format
where every three consecutive indices define one triangle.

# Example

```
use handles_and_slots::images::index_algorithms::QuadIndexGenerator;

// One quad: two triangles, six indices over four vertices
let generator = QuadIndexGenerator::new(1);
assert_eq!(generator.num_indices(), 6);
assert_eq!(generator.num_vertices(), 4);

// The classic quad pattern
let indices: Vec<usize> = (0..6).map(|i| generator.index_for(i)).collect();
assert_eq!(indices, [0, 1, 2, 2, 3, 0]);
```

# Populating an index buffer

```
use handles_and_slots::images::index_algorithms::QuadIndexGenerator;

let generator = QuadIndexGenerator::new(3);
let mut indices = Vec::with_capacity(generator.num_indices());
for i in 0..generator.num_indices() {
    indices.push(generator.index_for(i) as u16);
}

// The second quad's triangles reference vertices 4..8
assert_eq!(&indices[6..12], &[4, 5, 6, 6, 7, 4]);
```
*/

/**
Generates an index buffer for a run of quads.

Each quad owns four vertices, numbered counter-clockwise from the top-left:

```text
   0 ───────── 3
   │ ╲         │
   │   ╲    2  │
   │     ╲     │
   │  1    ╲   │
   1 ───────── 2
```

Triangle 1 is (0, 1, 2) and triangle 2 is (2, 3, 0), both counter-clockwise
for front-face culling. Consecutive quads repeat the pattern at vertex
offsets of four.
*/
const VERTEX_PER_TRIANGLE: usize = 3;
const TRIANGLES_PER_QUAD: usize = 2;
const VERTEX_PER_QUAD: usize = 4;

const INDEX_PER_QUAD: usize = VERTEX_PER_TRIANGLE * TRIANGLES_PER_QUAD;
const QUAD_PATTERN: [usize; INDEX_PER_QUAD] = [0, 1, 2, 2, 3, 0];

/// Generates triangle-list indices for a run of independent quads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuadIndexGenerator {
    quads: usize,
}

impl QuadIndexGenerator {
    /// Creates a generator for `quads` independent quads.
    ///
    /// # Panics
    ///
    /// Panics if `quads` is zero; an empty mesh has no index pattern.
    pub fn new(quads: usize) -> Self {
        assert!(quads > 0, "Invalid geometry");
        Self { quads }
    }

    /// Total number of indices needed to draw the quads.
    pub fn num_indices(&self) -> usize {
        self.quads * INDEX_PER_QUAD
    }

    /// Total number of vertices the quads reference.
    pub fn num_vertices(&self) -> usize {
        self.quads * VERTEX_PER_QUAD
    }

    /// The vertex index at position `buffer_pos` in the index buffer.
    ///
    /// # Panics
    ///
    /// Panics if `buffer_pos` is out of bounds for the generated indices.
    pub fn index_for(&self, buffer_pos: usize) -> usize {
        let quad = buffer_pos / INDEX_PER_QUAD;
        assert!(quad < self.quads, "Index out of bounds");
        let corner = QUAD_PATTERN[buffer_pos % INDEX_PER_QUAD];
        quad * VERTEX_PER_QUAD + corner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_index_stays_in_vertex_range() {
        let generator = QuadIndexGenerator::new(5);
        for i in 0..generator.num_indices() {
            assert!(generator.index_for(i) < generator.num_vertices());
        }
    }

    #[test]
    #[should_panic]
    fn out_of_range_position_panics() {
        let generator = QuadIndexGenerator::new(1);
        generator.index_for(6);
    }
}
