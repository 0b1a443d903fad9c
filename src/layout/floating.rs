use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{Geometry, Point, Viewport, clamp_lenient};
use crate::config::GeometryConfig;

/// Initial window size for `viewport`: one of two presets depending on the
/// breakpoint, shrunk so the window fits inside the margins.
pub fn initial_size(viewport: Viewport, cfg: &GeometryConfig) -> (f64, f64) {
    let preset = if viewport.width < cfg.mobile_breakpoint {
        cfg.mobile_width
    } else {
        cfg.desktop_width
    };
    let width = preset.min(viewport.width - 2.0 * cfg.margin).max(0.0);
    let height = cfg.height.min(viewport.height - 2.0 * cfg.margin).max(0.0);
    (width, height)
}

/// Seeded source of window positions.
///
/// Placement is random so stacked windows don't perfectly overlap, but it is
/// deterministic for a given seed, which keeps tests and replays stable.
#[derive(Debug, Clone)]
pub struct Placer {
    rng: Pcg32,
}

impl Placer {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Pick a geometry for a new window inside `viewport`.
    pub fn place(&mut self, viewport: Viewport, cfg: &GeometryConfig) -> Geometry {
        let (width, height) = initial_size(viewport, cfg);
        let margin = cfg.margin;
        let max_left = viewport.width - width - margin;
        let max_top = viewport.height - height - margin - cfg.status_bar_height;
        let left = (self.unit() * max_left.max(margin)).floor().max(margin);
        let top = (self.unit() * max_top.max(margin)).floor().max(margin);
        Geometry::new(left, top, width, height)
    }

    /// Random suffix for generated window ids.
    pub fn nonce(&mut self) -> u32 {
        self.rng.random()
    }

    fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Starting box for the open animation: a tiny square centered on `source`.
pub fn spawn_geometry(source: Point, cfg: &GeometryConfig) -> Geometry {
    let size = cfg.animation_start_size;
    Geometry::new(source.x - size / 2.0, source.y - size / 2.0, size, size)
}

/// Move `origin` by the pointer delta, keeping the window grabbable.
///
/// At least `min_visible` pixels stay inside the viewport on the left, right
/// and bottom edges; the title bar may never rise above the top edge.
pub fn apply_drag(
    origin: Geometry,
    dx: f64,
    dy: f64,
    viewport: Viewport,
    min_visible: f64,
) -> Geometry {
    let keep_x = min_visible.min(origin.width);
    let keep_y = min_visible.min(origin.height);
    let left = clamp_lenient(
        origin.left + dx,
        keep_x - origin.width,
        viewport.width - keep_x,
    );
    let top = clamp_lenient(origin.top + dy, 0.0, viewport.height - keep_y);
    Geometry { left, top, ..origin }
}

/// Grow or shrink `origin` from its bottom-right corner.
///
/// Size never drops below the configured floor; there is deliberately no
/// ceiling so windows can be stretched past the viewport.
pub fn apply_resize(
    origin: Geometry,
    dx: f64,
    dy: f64,
    min_width: f64,
    min_height: f64,
) -> Geometry {
    Geometry {
        width: (origin.width + dx).max(min_width),
        height: (origin.height + dy).max(min_height),
        ..origin
    }
}

/// Portion of `rect` that lies inside `viewport`, if any.
pub fn visible_rect(rect: Geometry, viewport: Viewport) -> Option<Geometry> {
    let x0 = rect.left.max(0.0);
    let y0 = rect.top.max(0.0);
    let x1 = rect.right().min(viewport.width);
    let y1 = rect.bottom().min(viewport.height);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Geometry::new(x0, y0, x1 - x0, y1 - y0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cfg() -> GeometryConfig {
        GeometryConfig::default()
    }

    #[test]
    fn desktop_and_mobile_presets() {
        assert_eq!(initial_size(Viewport::new(1280.0, 800.0), &cfg()), (450.0, 350.0));
        assert_eq!(initial_size(Viewport::new(400.0, 800.0), &cfg()), (250.0, 350.0));
    }

    #[test]
    fn tiny_viewport_shrinks_window_to_margins() {
        let (w, h) = initial_size(Viewport::new(200.0, 150.0), &cfg());
        assert_eq!(w, 180.0);
        assert_eq!(h, 130.0);
    }

    #[test]
    fn placement_is_deterministic_per_seed() {
        let vp = Viewport::new(1280.0, 800.0);
        let a = Placer::seeded(7).place(vp, &cfg());
        let b = Placer::seeded(7).place(vp, &cfg());
        assert_eq!(a, b);
    }

    #[test]
    fn placement_stays_inside_margins() {
        let vp = Viewport::new(1024.0, 768.0);
        let c = cfg();
        let mut placer = Placer::seeded(42);
        for _ in 0..200 {
            let g = placer.place(vp, &c);
            assert!(g.left >= c.margin);
            assert!(g.top >= c.margin);
            assert!(g.right() <= vp.width - c.margin);
            assert!(g.bottom() <= vp.height - c.margin - c.status_bar_height);
        }
    }

    #[test]
    fn spawn_geometry_centers_on_source() {
        let g = spawn_geometry(Point::new(100.0, 50.0), &cfg());
        assert_eq!(g, Geometry::new(95.0, 45.0, 10.0, 10.0));
    }

    #[test]
    fn drag_moves_by_delta_inside_bounds() {
        let vp = Viewport::new(1000.0, 800.0);
        let origin = Geometry::new(100.0, 100.0, 400.0, 300.0);
        let moved = apply_drag(origin, 25.0, -40.0, vp, 40.0);
        assert_eq!(moved, Geometry::new(125.0, 60.0, 400.0, 300.0));
    }

    #[test]
    fn drag_cannot_lift_title_bar_above_viewport() {
        let vp = Viewport::new(1000.0, 800.0);
        let origin = Geometry::new(100.0, 100.0, 400.0, 300.0);
        let moved = apply_drag(origin, 0.0, -5000.0, vp, 40.0);
        assert_eq!(moved.top, 0.0);
    }

    #[test]
    fn drag_far_left_keeps_sliver() {
        let vp = Viewport::new(1000.0, 800.0);
        let origin = Geometry::new(100.0, 100.0, 400.0, 300.0);
        let moved = apply_drag(origin, -10_000.0, 0.0, vp, 40.0);
        assert_eq!(moved.right(), 40.0);
    }

    #[test]
    fn resize_clamps_at_floor() {
        let origin = Geometry::new(0.0, 0.0, 300.0, 200.0);
        let g = apply_resize(origin, -1000.0, -1000.0, 150.0, 100.0);
        assert_eq!((g.width, g.height), (150.0, 100.0));
        let g = apply_resize(origin, 5000.0, 10.0, 150.0, 100.0);
        assert_eq!((g.width, g.height), (5300.0, 210.0));
        assert_eq!((g.left, g.top), (0.0, 0.0));
    }

    #[test]
    fn visible_rect_clips_negative_offsets() {
        let vp = Viewport::new(800.0, 600.0);
        let rect = Geometry::new(-50.0, 30.0, 200.0, 60.0);
        let visible = visible_rect(rect, vp).expect("partially visible");
        assert_eq!(visible, Geometry::new(0.0, 30.0, 150.0, 60.0));
        assert!(visible_rect(Geometry::new(900.0, 0.0, 10.0, 10.0), vp).is_none());
    }

    proptest! {
        #[test]
        fn drag_never_detaches_window(
            dx in -100_000.0f64..100_000.0,
            dy in -100_000.0f64..100_000.0,
            left in 0.0f64..900.0,
            top in 0.0f64..700.0,
            width in 150.0f64..2000.0,
            height in 100.0f64..2000.0,
        ) {
            let vp = Viewport::new(1000.0, 800.0);
            let min_visible = 40.0;
            let moved = apply_drag(Geometry::new(left, top, width, height), dx, dy, vp, min_visible);
            let visible = visible_rect(moved, vp).expect("window must stay on screen");
            prop_assert!(visible.width >= min_visible - 1e-9);
            prop_assert!(visible.height >= min_visible - 1e-9);
            prop_assert!(moved.top >= 0.0);
        }

        #[test]
        fn resize_never_below_floor(dx in -10_000.0f64..10_000.0, dy in -10_000.0f64..10_000.0) {
            let g = apply_resize(Geometry::new(10.0, 10.0, 300.0, 200.0), dx, dy, 150.0, 100.0);
            prop_assert!(g.width >= 150.0);
            prop_assert!(g.height >= 100.0);
        }
    }
}
