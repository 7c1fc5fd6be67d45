use bytemuck::{Pod, Zeroable};

use triangle_engine::gfx::{VertexFormat, VertexLayout};

/// Shader location of the position attribute.
pub const ATTR_POSITION: u32 = 0;
/// Shader location of the color attribute.
pub const ATTR_COLOR0: u32 = 1;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub fn layout() -> VertexLayout {
        VertexLayout::new()
            .attr(ATTR_POSITION, VertexFormat::Float3)
            .attr(ATTR_COLOR0, VertexFormat::Float4)
    }
}

pub const TRIANGLE_VERTICES: [Vertex; 3] = [
    // bottom left, red
    Vertex { position: [-0.5, -0.5, 0.0], color: [1.0, 0.0, 0.0, 1.0] },
    // bottom right, green
    Vertex { position: [0.5, -0.5, 0.0], color: [0.0, 1.0, 0.0, 1.0] },
    // top, blue
    Vertex { position: [0.0, 0.5, 0.0], color: [0.0, 0.0, 1.0, 1.0] },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_stride_matches_struct() {
        assert_eq!(Vertex::layout().stride(), std::mem::size_of::<Vertex>() as u64);
    }

    #[test]
    fn color_follows_position() {
        let attrs = Vertex::layout().attributes();
        assert_eq!(attrs[0].location, ATTR_POSITION);
        assert_eq!(attrs[1].location, ATTR_COLOR0);
        assert_eq!(attrs[1].offset, 12);
    }
}
