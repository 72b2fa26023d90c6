use cubestory::math::{multiply_matrix_vector, rotation_y};
use cubestory::Frame;

use crate::vertex::{Projection, Vertex};

/// Shading ramp from square-on to nearly edge-on
const SHADES: [char; 4] = [' ', '.', ':', ';'];

/// Character grid the cube is drawn into
#[derive(Debug, Clone)]
pub struct Canvas {
    width: usize,
    height: usize,
    cells: Vec<char>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas {
            width,
            height,
            cells: vec![' '; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.cells = vec![' '; width * height];
    }

    pub fn clear(&mut self) {
        self.cells.fill(' ');
    }

    /// Sets one cell; coordinates outside the grid are ignored
    pub fn put(&mut self, x: isize, y: isize, glyph: char) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.cells[y as usize * self.width + x as usize] = glyph;
        }
    }

    #[cfg(test)]
    pub fn get(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.cells[y * self.width + x])
    }

    pub fn draw_text(&mut self, x: isize, y: isize, text: &str) {
        for (offset, glyph) in text.chars().enumerate() {
            self.put(x + offset as isize, y, glyph);
        }
    }

    /// Rows of the grid, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.cells
            .chunks(self.width.max(1))
            .map(|row| row.iter().collect())
    }
}

/// Size of the cube in column units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceGeometry {
    pub width: f64,
    pub height: f64,
}

/// Edge function used in rasterization
pub fn edge_function(a: &[f64; 2], b: &[f64; 2], c: &[f64; 2]) -> f64 {
    (c[0] - a[0]) * (b[1] - a[1]) - (c[1] - a[1]) * (b[0] - a[0])
}

/// Fills a triangle of either winding with `glyph`
pub fn fill_triangle(v0: &Vertex, v1: &Vertex, v2: &Vertex, canvas: &mut Canvas, glyph: char) {
    let xs = [v0.screen_position[0], v1.screen_position[0], v2.screen_position[0]];
    let ys = [v0.screen_position[1], v1.screen_position[1], v2.screen_position[1]];
    let min_x = xs.iter().copied().fold(f64::INFINITY, f64::min).floor().max(0.0) as usize;
    let max_x = xs
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
        .ceil()
        .min(canvas.width() as f64 - 1.0);
    let min_y = ys.iter().copied().fold(f64::INFINITY, f64::min).floor().max(0.0) as usize;
    let max_y = ys
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
        .ceil()
        .min(canvas.height() as f64 - 1.0);
    if max_x < 0.0 || max_y < 0.0 {
        return;
    }

    let area = edge_function(&v0.screen_position, &v1.screen_position, &v2.screen_position);
    if area == 0.0 {
        return;
    }

    for y in min_y..=max_y as usize {
        for x in min_x..=max_x as usize {
            let p = [x as f64 + 0.5, y as f64 + 0.5];
            let w0 = edge_function(&v1.screen_position, &v2.screen_position, &p) / area;
            let w1 = edge_function(&v2.screen_position, &v0.screen_position, &p) / area;
            let w2 = edge_function(&v0.screen_position, &v1.screen_position, &p) / area;
            if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                canvas.put(x as isize, y as isize, glyph);
            }
        }
    }
}

/// Glyph for a line segment with the given direction
fn edge_glyph(dx: f64, dy: f64) -> char {
    // rows are twice as tall as columns are wide
    let (dx, dy) = (dx, dy * 2.0);
    if dy.abs() * 2.0 < dx.abs() {
        '-'
    } else if dx.abs() * 2.0 < dy.abs() {
        '|'
    } else if (dx > 0.0) == (dy > 0.0) {
        '\\'
    } else {
        '/'
    }
}

/// Draws a line between two cells using Bresenham's algorithm
pub fn draw_line(x0: f64, y0: f64, x1: f64, y1: f64, canvas: &mut Canvas) {
    let glyph = edge_glyph(x1 - x0, y1 - y0);
    let (mut x0, mut y0, x1, y1) = (
        x0.round() as isize,
        y0.round() as isize,
        x1.round() as isize,
        y1.round() as isize,
    );
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        canvas.put(x0, y0, glyph);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Rotates and projects the four corners of a face turned by `angle` degrees
pub fn face_corners(angle: f64, geometry: FaceGeometry, projection: &Projection) -> [Vertex; 4] {
    let half_w = geometry.width / 2.0;
    let half_h = geometry.height / 2.0;
    let rotation = rotation_y(angle);
    [
        [-half_w, -half_h, half_w],
        [half_w, -half_h, half_w],
        [half_w, half_h, half_w],
        [-half_w, half_h, half_w],
    ]
    .map(|corner| Vertex::project(multiply_matrix_vector(&rotation, &corner), projection))
}

fn shade_glyph(facing: f64) -> char {
    let turned = (1.0 - facing).clamp(0.0, 1.0);
    let step = (turned * SHADES.len() as f64) as usize;
    SHADES[step.min(SHADES.len() - 1)]
}

/// Draws every face turned towards the viewer, farthest first
pub fn draw_frame(
    canvas: &mut Canvas,
    frame: &Frame<String>,
    geometry: FaceGeometry,
    projection: &Projection,
) {
    canvas.clear();
    let projection = Projection {
        scale: frame.scale,
        ..*projection
    };

    let mut visible: Vec<_> = frame
        .panes
        .iter()
        .map(|pane| {
            let angle = frame.rotation + pane.face.offset();
            (pane, angle, angle.to_radians().cos())
        })
        .filter(|(_, _, facing)| *facing > 0.01)
        .collect();
    visible.sort_by(|a, b| a.2.total_cmp(&b.2));

    for (pane, angle, facing) in visible {
        let [a, b, c, d] = face_corners(angle, geometry, &projection);
        let shade = shade_glyph(facing);
        fill_triangle(&a, &b, &c, canvas, shade);
        fill_triangle(&a, &c, &d, canvas, shade);
        for (from, to) in [(&a, &b), (&b, &c), (&c, &d), (&d, &a)] {
            draw_line(
                from.screen_position[0],
                from.screen_position[1],
                to.screen_position[0],
                to.screen_position[1],
                canvas,
            );
        }

        let label = match (pane.index, pane.content.as_deref()) {
            (None, _) => "~".to_string(),
            (Some(_), Some(content)) if pane.active => format!("[ {content} ]"),
            (Some(_), Some(content)) => content.to_string(),
            (Some(index), None) => format!("#{index}"),
        };
        let left = a.screen_position[0].min(d.screen_position[0]);
        let right = b.screen_position[0].max(c.screen_position[0]);
        let span = (right - left).abs();
        let length = label.chars().count() as f64;
        if span >= length + 2.0 {
            let center_x = (left + right) / 2.0;
            let center_y = (a.screen_position[1] + c.screen_position[1]) / 2.0;
            canvas.draw_text(
                (center_x - length / 2.0).round() as isize,
                center_y.round() as isize,
                &label,
            );
        }
    }
}
