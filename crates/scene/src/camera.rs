use foundation::math::Vec3;

use crate::picking::Ray;

/// Screen rectangle a cube is drawn into, in client pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn aspect(&self) -> f64 {
        if self.height <= 0.0 {
            return 1.0;
        }
        self.width / self.height
    }

    /// Client pixels to normalized device coordinates (`[-1, 1]`, +y up).
    ///
    /// Returns `None` for a degenerate viewport.
    pub fn to_ndc(&self, pointer: PointerEvent) -> Option<(f64, f64)> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        let x = (pointer.client_x - self.left) / self.width * 2.0 - 1.0;
        let y = -((pointer.client_y - self.top) / self.height * 2.0 - 1.0);
        Some((x, y))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerEvent {
    pub client_x: f64,
    pub client_y: f64,
}

impl PointerEvent {
    pub fn new(client_x: f64, client_y: f64) -> Self {
        Self { client_x, client_y }
    }
}

/// Perspective camera described by its look-at frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_deg: f64,
}

impl Camera {
    pub fn look_at(eye: Vec3, target: Vec3) -> Self {
        Self {
            eye,
            target,
            up: Vec3::new(0.0, 1.0, 0.0),
            fov_y_deg: 50.0,
        }
    }

    /// Ray from the eye through an NDC point on a viewport of the given aspect.
    pub fn ray_through_ndc(&self, ndc_x: f64, ndc_y: f64, aspect: f64) -> Option<Ray> {
        let forward = (self.target - self.eye).normalized()?;
        let right = forward.cross(self.up).normalized()?;
        let up = right.cross(forward);

        let half_h = (self.fov_y_deg.to_radians() / 2.0).tan();
        let half_w = half_h * aspect;
        let dir = forward + right.scale(ndc_x * half_w) + up.scale(ndc_y * half_h);
        Some(Ray::new(self.eye, dir.normalized()?))
    }

    pub fn ray_for_pointer(&self, pointer: PointerEvent, viewport: &Viewport) -> Option<Ray> {
        let (x, y) = viewport.to_ndc(pointer)?;
        self.ray_through_ndc(x, y, viewport.aspect())
    }
}
