use bytemuck::{Pod, Zeroable};

/// Colored line vertex (world space).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl LineVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRS,
        }
    }
}

/// Three axis lines from the origin: X red, Y green, Z blue.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AxesHelper {
    pub size: f32,
}

impl AxesHelper {
    pub fn new(size: f32) -> Self {
        Self { size }
    }

    /// Line-list vertices (two per axis).
    pub fn vertices(&self) -> [LineVertex; 6] {
        let s = self.size;
        let red = [1.0, 0.0, 0.0];
        let green = [0.0, 1.0, 0.0];
        let blue = [0.0, 0.0, 1.0];
        [
            LineVertex { position: [0.0, 0.0, 0.0], color: red },
            LineVertex { position: [s, 0.0, 0.0], color: red },
            LineVertex { position: [0.0, 0.0, 0.0], color: green },
            LineVertex { position: [0.0, s, 0.0], color: green },
            LineVertex { position: [0.0, 0.0, 0.0], color: blue },
            LineVertex { position: [0.0, 0.0, s], color: blue },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes_end_at_size() {
        let v = AxesHelper::new(25.0).vertices();
        assert_eq!(v[1].position, [25.0, 0.0, 0.0]);
        assert_eq!(v[3].position, [0.0, 25.0, 0.0]);
        assert_eq!(v[5].position, [0.0, 0.0, 25.0]);
        assert_eq!(v[3].color, [0.0, 1.0, 0.0]);
    }
}
