use crate::error::RenderResult;

use super::arena::FrameArena;

/// Primitive mode for one begin/end-bounded batch.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DrawMode {
    /// Groups of 4 vertices, expanded into two triangles each.
    Quads,
    /// Groups of 3 vertices, passed through as triangles.
    Triangles,
}

/// Index pattern for one quad: two triangles over 4 sequential vertices.
const QUAD_TOPOLOGY: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Index pattern for one triangle.
const TRIANGLE_TOPOLOGY: [u32; 3] = [0, 1, 2];

/// Commits the staged vertices of a finished batch into the arena,
/// deriving index topology from the batch mode.
///
/// Expansion is keyed on `mode` alone:
/// - `Quads`: every complete group of 4 staged vertices commits 4
///   vertices and 6 indices.
/// - `Triangles`: every complete group of 3 commits 3 vertices and
///   3 indices.
///
/// Staged vertices that do not complete a group are discarded with a
/// warning; they never reach the GPU. An empty batch commits nothing.
pub fn expand_batch(arena: &mut FrameArena, mode: DrawMode) -> RenderResult<()> {
    let (group, topology): (usize, &[u32]) = match mode {
        DrawMode::Quads => (4, &QUAD_TOPOLOGY),
        DrawMode::Triangles => (3, &TRIANGLE_TOPOLOGY),
    };

    while arena.staged() >= group {
        arena.commit_group(group, topology)?;
    }

    let leftover = arena.staged();
    if leftover > 0 {
        log::warn!(
            "discarding {leftover} vertices that do not complete a {mode:?} group"
        );
        arena.discard_staged();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::vertex::Vertex;

    fn stage(arena: &mut FrameArena, n: usize) {
        for i in 0..n {
            arena
                .stage_vertex(Vertex {
                    position: [i as f32, 0.0, 0.0],
                    ..Vertex::default()
                })
                .unwrap();
        }
    }

    // ── quads ─────────────────────────────────────────────────────────

    #[test]
    fn one_quad_commits_four_vertices_six_indices() {
        let mut arena = FrameArena::new(64, 96);
        stage(&mut arena, 4);
        expand_batch(&mut arena, DrawMode::Quads).unwrap();

        assert_eq!(arena.vertex_count(), 4);
        assert_eq!(arena.index_count(), 6);
        assert_eq!(arena.index_data(), &[0, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn n_quads_follow_the_4k_pattern() {
        let n = 5;
        let mut arena = FrameArena::new(64, 96);
        stage(&mut arena, 4 * n);
        expand_batch(&mut arena, DrawMode::Quads).unwrap();

        assert_eq!(arena.vertex_count(), 4 * n);
        assert_eq!(arena.index_count(), 6 * n);
        for k in 0..n as u32 {
            let base = 4 * k;
            let got = &arena.index_data()[6 * k as usize..6 * (k as usize + 1)];
            assert_eq!(got, &[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
    }

    #[test]
    fn quad_batches_accumulate_across_begin_end_pairs() {
        let mut arena = FrameArena::new(64, 96);
        stage(&mut arena, 4);
        expand_batch(&mut arena, DrawMode::Quads).unwrap();
        stage(&mut arena, 4);
        expand_batch(&mut arena, DrawMode::Quads).unwrap();

        assert_eq!(arena.vertex_count(), 8);
        assert_eq!(arena.index_count(), 12);
        assert_eq!(&arena.index_data()[6..], &[4, 5, 6, 6, 7, 4]);
    }

    #[test]
    fn incomplete_quad_group_is_discarded() {
        let mut arena = FrameArena::new(64, 96);
        stage(&mut arena, 6);
        expand_batch(&mut arena, DrawMode::Quads).unwrap();

        // One complete quad; the trailing 2 vertices are dropped.
        assert_eq!(arena.vertex_count(), 4);
        assert_eq!(arena.index_count(), 6);
        assert_eq!(arena.staged(), 0);
    }

    // ── triangles ─────────────────────────────────────────────────────

    #[test]
    fn three_vertices_yield_one_triangle() {
        let mut arena = FrameArena::new(64, 96);
        stage(&mut arena, 3);
        expand_batch(&mut arena, DrawMode::Triangles).unwrap();

        assert_eq!(arena.vertex_count(), 3);
        assert_eq!(arena.index_count(), 3);
        assert_eq!(arena.index_data(), &[0, 1, 2]);
    }

    #[test]
    fn triangle_batches_expand_in_groups_of_three() {
        let mut arena = FrameArena::new(64, 96);
        stage(&mut arena, 9);
        expand_batch(&mut arena, DrawMode::Triangles).unwrap();

        assert_eq!(arena.vertex_count(), 9);
        assert_eq!(arena.index_data(), &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    // ── boundary cases ────────────────────────────────────────────────

    #[test]
    fn empty_batch_is_a_no_op() {
        let mut arena = FrameArena::new(64, 96);
        expand_batch(&mut arena, DrawMode::Quads).unwrap();
        expand_batch(&mut arena, DrawMode::Triangles).unwrap();

        assert_eq!(arena.vertex_count(), 0);
        assert_eq!(arena.index_count(), 0);
    }

    #[test]
    fn index_overflow_surfaces_from_expansion() {
        let mut arena = FrameArena::new(64, 4);
        stage(&mut arena, 4);
        let err = expand_batch(&mut arena, DrawMode::Quads).unwrap_err();
        assert!(matches!(
            err,
            crate::error::RenderError::BufferOverflow { what: "index buffer", .. }
        ));
    }
}
