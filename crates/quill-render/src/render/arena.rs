use crate::error::{RenderError, RenderResult};

use super::vertex::Vertex;

/// Fixed-capacity CPU-side storage for one frame's geometry.
///
/// Vertices and indices are preallocated once and reused every frame.
/// Two cursors track the vertex buffer: `vertex_count` is the committed
/// range (topology already derived), `staged` counts vertices emitted by
/// the current batch that have not been committed by `end` yet. Staged
/// vertices live directly after the committed range, so committing is
/// just cursor arithmetic.
///
/// Exceeding either capacity is reported as [`RenderError::BufferOverflow`]
/// instead of writing out of range.
pub struct FrameArena {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    vertex_count: usize,
    index_count: usize,
    staged: usize,
}

impl FrameArena {
    /// Creates an arena holding at most `max_vertices` / `max_indices`.
    pub fn new(max_vertices: usize, max_indices: usize) -> Self {
        Self {
            vertices: vec![Vertex::default(); max_vertices],
            indices: vec![0; max_indices],
            vertex_count: 0,
            index_count: 0,
            staged: 0,
        }
    }

    pub fn vertex_capacity(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_capacity(&self) -> usize {
        self.indices.len()
    }

    /// Committed vertex count (geometry whose topology has been derived).
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Committed index count.
    pub fn index_count(&self) -> usize {
        self.index_count
    }

    /// Vertices emitted by the in-progress batch.
    pub fn staged(&self) -> usize {
        self.staged
    }

    /// Committed vertex data, ready for upload.
    pub fn vertex_data(&self) -> &[Vertex] {
        &self.vertices[..self.vertex_count]
    }

    /// Committed index data, ready for upload.
    pub fn index_data(&self) -> &[u32] {
        &self.indices[..self.index_count]
    }

    /// Appends one vertex to the staged region.
    pub fn stage_vertex(&mut self, vertex: Vertex) -> RenderResult<()> {
        let at = self.vertex_count + self.staged;
        if at >= self.vertices.len() {
            return Err(RenderError::BufferOverflow {
                what: "vertex buffer",
                capacity: self.vertices.len(),
            });
        }
        self.vertices[at] = vertex;
        self.staged += 1;
        Ok(())
    }

    /// Discards any staged vertices without committing them.
    pub fn discard_staged(&mut self) {
        self.staged = 0;
    }

    /// Commits `group` staged vertices, appending `topology` as indices
    /// relative to the committed base.
    ///
    /// The caller guarantees `topology` references only `0..group`.
    pub fn commit_group(&mut self, group: usize, topology: &[u32]) -> RenderResult<()> {
        debug_assert!(group <= self.staged);
        if self.index_count + topology.len() > self.indices.len() {
            return Err(RenderError::BufferOverflow {
                what: "index buffer",
                capacity: self.indices.len(),
            });
        }

        let base = self.vertex_count as u32;
        for (i, &offset) in topology.iter().enumerate() {
            self.indices[self.index_count + i] = base + offset;
        }
        self.index_count += topology.len();
        self.vertex_count += group;
        self.staged -= group;
        Ok(())
    }

    /// Zeroes the used ranges and resets all cursors.
    pub fn clear(&mut self) {
        let used_vertices = self.vertex_count + self.staged;
        self.vertices[..used_vertices].fill(Vertex::default());
        self.indices[..self.index_count].fill(0);
        self.vertex_count = 0;
        self.index_count = 0;
        self.staged = 0;
    }

    /// True when no committed geometry is pending submission.
    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0 && self.index_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32) -> Vertex {
        Vertex {
            position: [x, 0.0, 0.0],
            ..Vertex::default()
        }
    }

    #[test]
    fn staging_does_not_commit() {
        let mut arena = FrameArena::new(16, 24);
        arena.stage_vertex(v(1.0)).unwrap();
        arena.stage_vertex(v(2.0)).unwrap();
        assert_eq!(arena.staged(), 2);
        assert_eq!(arena.vertex_count(), 0);
        assert_eq!(arena.index_count(), 0);
    }

    #[test]
    fn commit_group_appends_indices_relative_to_base() {
        let mut arena = FrameArena::new(16, 24);
        for i in 0..8 {
            arena.stage_vertex(v(i as f32)).unwrap();
        }
        arena.commit_group(4, &[0, 1, 2, 2, 3, 0]).unwrap();
        arena.commit_group(4, &[0, 1, 2, 2, 3, 0]).unwrap();

        assert_eq!(arena.vertex_count(), 8);
        assert_eq!(arena.index_count(), 12);
        assert_eq!(arena.index_data()[..6], [0, 1, 2, 2, 3, 0]);
        assert_eq!(arena.index_data()[6..], [4, 5, 6, 6, 7, 4]);
    }

    #[test]
    fn vertex_overflow_is_checked() {
        let mut arena = FrameArena::new(2, 6);
        arena.stage_vertex(v(0.0)).unwrap();
        arena.stage_vertex(v(1.0)).unwrap();
        let err = arena.stage_vertex(v(2.0)).unwrap_err();
        assert!(matches!(
            err,
            RenderError::BufferOverflow { what: "vertex buffer", capacity: 2 }
        ));
        // Counts are untouched by the failed write.
        assert_eq!(arena.staged(), 2);
        assert_eq!(arena.vertex_count(), 0);
    }

    #[test]
    fn index_overflow_is_checked() {
        let mut arena = FrameArena::new(8, 4);
        for i in 0..4 {
            arena.stage_vertex(v(i as f32)).unwrap();
        }
        let err = arena.commit_group(4, &[0, 1, 2, 2, 3, 0]).unwrap_err();
        assert!(matches!(
            err,
            RenderError::BufferOverflow { what: "index buffer", capacity: 4 }
        ));
        assert_eq!(arena.index_count(), 0);
        assert_eq!(arena.vertex_count(), 0);
    }

    #[test]
    fn clear_resets_to_post_init_state() {
        let mut arena = FrameArena::new(8, 12);
        for i in 0..4 {
            arena.stage_vertex(v(i as f32 + 1.0)).unwrap();
        }
        arena.commit_group(3, &[0, 1, 2]).unwrap();
        arena.clear();

        assert!(arena.is_empty());
        assert_eq!(arena.staged(), 0);
        // Used ranges are zeroed, not just the cursors.
        assert_eq!(arena.vertices[0], Vertex::default());
        assert_eq!(arena.vertices[3], Vertex::default());
        assert_eq!(arena.indices[0], 0);
    }

    #[test]
    fn clear_twice_is_a_no_op() {
        let mut arena = FrameArena::new(8, 12);
        arena.clear();
        arena.clear();
        assert!(arena.is_empty());
    }

    #[test]
    fn discard_staged_drops_unterminated_batch() {
        let mut arena = FrameArena::new(8, 12);
        arena.stage_vertex(v(1.0)).unwrap();
        arena.discard_staged();
        assert_eq!(arena.staged(), 0);
        assert_eq!(arena.vertex_count(), 0);
    }
}
