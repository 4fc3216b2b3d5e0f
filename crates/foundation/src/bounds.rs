use crate::math::Vec3;

/// Axis-aligned bounding box in 3D.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb3 {
    /// Box enclosing a sphere.
    pub fn around(center: Vec3, radius: f64) -> Self {
        let r = radius.abs();
        Aabb3 {
            min: [center.x - r, center.y - r, center.z - r],
            max: [center.x + r, center.y + r, center.z + r],
        }
    }

    /// Slab test. Returns the entry distance along `dir` within `[t_min, t_max]`.
    pub fn ray_entry(
        &self,
        origin: Vec3,
        dir: Vec3,
        mut t_min: f64,
        mut t_max: f64,
    ) -> Option<f64> {
        let o = [origin.x, origin.y, origin.z];
        let d = [dir.x, dir.y, dir.z];
        for axis in 0..3 {
            if d[axis].abs() < 1e-12 {
                if o[axis] < self.min[axis] || o[axis] > self.max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d[axis];
            let mut t1 = (self.min[axis] - o[axis]) * inv;
            let mut t2 = (self.max[axis] - o[axis]) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }

            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_max < t_min {
                return None;
            }
        }

        Some(t_min.max(0.0))
    }
}
