//! Model transform and perspective projection onto the window.

use sparkle_engine::Size;

use crate::obj::{Mesh, Vec3};

/// Camera distance from the model centre, in model radii.
const DISTANCE: f32 = 3.5;

/// Recentres `mesh` on the origin and scales it to unit radius.
pub fn normalize(mesh: &mut Mesh) {
    let n = mesh.vertices.len();
    if n == 0 {
        return;
    }

    let mut center = [0.0f32; 3];
    for v in &mesh.vertices {
        for (c, x) in center.iter_mut().zip(v) {
            *c += x / n as f32;
        }
    }

    let radius = mesh
        .vertices
        .iter()
        .map(|v| length(sub(*v, center)))
        .fold(0.0f32, f32::max);
    let scale = if radius > 0.0 { radius.recip() } else { 1.0 };

    for v in &mut mesh.vertices {
        *v = sub(*v, center).map(|c| c * scale);
    }
}

/// Rotates around the Y axis by `yaw`, then around X by `pitch` (radians).
pub fn rotate(v: Vec3, yaw: f32, pitch: f32) -> Vec3 {
    let (sy, cy) = yaw.sin_cos();
    let (sp, cp) = pitch.sin_cos();
    let [x, y, z] = v;

    let (x, z) = (x * cy + z * sy, -x * sy + z * cy);
    let (y, z) = (y * cp - z * sp, y * sp + z * cp);
    [x, y, z]
}

/// Projects a unit-radius model point into window pixels.
///
/// The model fills about half of the shorter window side.
pub fn project(v: Vec3, window: Size) -> (f32, f32) {
    let (w, h) = (window.width as f32, window.height as f32);
    let focal = w.min(h) * 0.5 * (DISTANCE - 1.0) * 0.5;
    let depth = v[2] + DISTANCE;
    (w * 0.5 + v[0] * focal / depth, h * 0.5 - v[1] * focal / depth)
}

fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn length(v: Vec3) -> f32 {
    v.iter().map(|c| c * c).sum::<f32>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn normalize_centres_and_scales() {
        let mut mesh = Mesh {
            vertices: vec![[2.0, 0.0, 0.0], [4.0, 0.0, 0.0]],
            triangles: vec![],
        };
        normalize(&mut mesh);
        assert_eq!(mesh.vertices, vec![[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
    }

    #[test]
    fn quarter_turn_yaw_moves_x_to_minus_z() {
        let [x, y, z] = rotate([1.0, 0.0, 0.0], std::f32::consts::FRAC_PI_2, 0.0);
        assert!(close(x, 0.0) && close(y, 0.0) && close(z, -1.0));
    }

    #[test]
    fn origin_projects_to_window_centre() {
        assert_eq!(project([0.0, 0.0, 0.0], Size::new(800, 600)), (400.0, 300.0));
        let (_, y) = project([0.0, 1.0, 0.0], Size::new(800, 600));
        assert!(y < 300.0);
    }
}
