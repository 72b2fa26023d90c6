/// Corner of a face projected onto the terminal grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub screen_position: [f64; 2],
}

/// Perspective camera looking at the cube along -z
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Screen cell of the cube's axis
    pub center: [f64; 2],
    /// Distance from the viewer to the front face plane
    pub perspective: f64,
    /// Half the cube side; the cube is pushed back by this much
    pub depth_offset: f64,
    /// Depth scale of the whole cube
    pub scale: f64,
    /// Terminal cells are roughly twice as tall as they are wide
    pub row_aspect: f64,
}

impl Vertex {
    /// Projects a rotated position onto the terminal grid
    pub fn project(position: [f64; 3], projection: &Projection) -> Vertex {
        let depth = position[2] - projection.depth_offset;
        let factor = projection.perspective / (projection.perspective - depth) * projection.scale;
        Vertex {
            screen_position: [
                projection.center[0] + position[0] * factor,
                projection.center[1] + position[1] * factor / projection.row_aspect,
            ],
        }
    }
}
