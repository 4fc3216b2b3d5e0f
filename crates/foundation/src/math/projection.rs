use super::Vec2;

/// Maps geographic coordinates (degrees) onto a planar map surface (pixels).
///
/// The live map widget owns the real projection; cubes only need a pure
/// function from `(lon, lat)` to map-surface coordinates.
pub trait MapProjection {
    fn project(&self, lon_deg: f64, lat_deg: f64) -> Vec2;
}

/// Spherical Web Mercator fitted into a square viewport.
///
/// Output is in viewport pixels with `(0, 0)` at the top-left corner and the
/// configured center at `(size / 2, size / 2)`; `y` grows southwards.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WebMercator {
    pub center_lon: f64,
    pub center_lat: f64,
    pub zoom: f64,
    pub viewport_px: f64,
}

/// Latitude bound where Web Mercator is conventionally clipped.
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

const TILE_PX: f64 = 256.0;

impl WebMercator {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, viewport_px: f64) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            viewport_px,
        }
    }

    fn world_px(&self, lon_deg: f64, lat_deg: f64) -> Vec2 {
        let world = TILE_PX * 2f64.powf(self.zoom);
        let lat = lat_deg.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
        let x = (lon_deg + 180.0) / 360.0 * world;
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0 * world;
        Vec2::new(x, y)
    }
}

impl MapProjection for WebMercator {
    fn project(&self, lon_deg: f64, lat_deg: f64) -> Vec2 {
        let p = self.world_px(lon_deg, lat_deg);
        let c = self.world_px(self.center_lon, self.center_lat);
        let half = self.viewport_px / 2.0;
        Vec2::new(p.x - c.x + half, p.y - c.y + half)
    }
}

#[cfg(test)]
mod tests {
    use super::{MapProjection, WebMercator};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn center_lands_mid_viewport() {
        let proj = WebMercator::new(13.4, 52.5, 4.0, 500.0);
        let p = proj.project(13.4, 52.5);
        assert_close(p.x, 250.0, 1e-9);
        assert_close(p.y, 250.0, 1e-9);
    }

    #[test]
    fn east_and_north_map_to_right_and_up() {
        let proj = WebMercator::new(0.0, 0.0, 2.0, 500.0);
        let east = proj.project(10.0, 0.0);
        let north = proj.project(0.0, 10.0);
        assert!(east.x > 250.0);
        assert_close(east.y, 250.0, 1e-9);
        assert!(north.y < 250.0);
    }

    #[test]
    fn poles_are_clamped_to_finite_values() {
        let proj = WebMercator::new(0.0, 0.0, 1.0, 256.0);
        let p = proj.project(0.0, 90.0);
        assert!(p.y.is_finite());
    }
}
