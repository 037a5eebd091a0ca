use bytemuck::{Pod, Zeroable};

/// GPU vertex for the batch renderer.
///
/// One fixed layout for every batch: position, straight-alpha color,
/// texture coordinates and the slot index of the texture to sample.
/// `tex_slot` is carried as a float shader input; slot bounds are
/// validated on the CPU when the slot is assigned.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub tex_coords: [f32; 2],
    pub tex_slot: f32,
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x4, // color
        2 => Float32x2, // tex_coords
        3 => Float32    // tex_slot
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_stride_matches_struct_size() {
        assert_eq!(Vertex::layout().array_stride, 40);
        assert_eq!(std::mem::size_of::<Vertex>(), 40);
    }
}
