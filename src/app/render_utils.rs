use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2, pos2, vec2};

use crate::data::{EntityKind, RelationKind};

use super::sim::{LayoutSpace, Vec3, vec3 as world3};

const FOCAL_LENGTH: f32 = 1400.0;

/// View transform shared by the 2D and 3D paths. 2D is the degenerate
/// case: identity rotation, perspective scale of exactly 1.
pub(super) struct Camera {
    pub pan: Vec2,
    pub zoom: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

impl Camera {
    fn rotate(&self, p: Vec3) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let x = p.x * cos_yaw + p.z * sin_yaw;
        let z = -p.x * sin_yaw + p.z * cos_yaw;
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let y = p.y * cos_pitch - z * sin_pitch;
        let z = p.y * sin_pitch + z * cos_pitch;
        world3(x, y, z)
    }

    fn unrotate(&self, p: Vec3) -> Vec3 {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let y = p.y * cos_pitch + p.z * sin_pitch;
        let z = -p.y * sin_pitch + p.z * cos_pitch;
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let x = p.x * cos_yaw - z * sin_yaw;
        let z = p.x * sin_yaw + z * cos_yaw;
        world3(x, y, z)
    }

    fn perspective_scale(&self, rotated_z: f32) -> f32 {
        FOCAL_LENGTH / (FOCAL_LENGTH + rotated_z).max(FOCAL_LENGTH * 0.2)
    }

    /// World position to screen, plus the perspective scale applied (used
    /// to shrink distant node radii in 3D).
    pub fn project(&self, rect: Rect, space: LayoutSpace, world: Vec3) -> (Pos2, f32) {
        match space {
            LayoutSpace::TwoD => (
                rect.center() + self.pan + vec2(world.x, world.y) * self.zoom,
                1.0,
            ),
            LayoutSpace::ThreeD => {
                let rotated = self.rotate(world);
                let scale = self.perspective_scale(rotated.z);
                (
                    rect.center() + self.pan + vec2(rotated.x, rotated.y) * (self.zoom * scale),
                    scale,
                )
            }
        }
    }

    /// Screen position back to world, at the depth of `reference`. In 2D
    /// the reference is ignored; in 3D the point moves in the
    /// screen-parallel plane through the reference, which is exactly what
    /// a drag should feel like.
    pub fn unproject(&self, rect: Rect, space: LayoutSpace, screen: Pos2, reference: Vec3) -> Vec3 {
        match space {
            LayoutSpace::TwoD => {
                let world = (screen - rect.center() - self.pan) / self.zoom;
                world3(world.x, world.y, 0.0)
            }
            LayoutSpace::ThreeD => {
                let depth = self.rotate(reference).z;
                let scale = self.perspective_scale(depth);
                let planar = (screen - rect.center() - self.pan) / (self.zoom * scale);
                self.unrotate(world3(planar.x, planar.y, depth))
            }
        }
    }

    /// Rotated depth, for painter's-algorithm draw ordering in 3D.
    pub fn depth(&self, world: Vec3) -> f32 {
        self.rotate(world).z
    }
}

pub(super) fn kind_color(kind: EntityKind) -> Color32 {
    match kind {
        EntityKind::Person => Color32::from_rgb(228, 150, 82),
        EntityKind::Organization => Color32::from_rgb(98, 152, 222),
        EntityKind::Event => Color32::from_rgb(216, 98, 112),
        EntityKind::Location => Color32::from_rgb(112, 190, 132),
    }
}

pub(super) fn relation_color(kind: RelationKind) -> Color32 {
    match kind {
        RelationKind::Family => Color32::from_rgb(233, 192, 120),
        RelationKind::Political => Color32::from_rgb(152, 132, 220),
        RelationKind::Conflict => Color32::from_rgb(224, 96, 96),
        RelationKind::Alliance => Color32::from_rgb(108, 200, 198),
        RelationKind::Membership => Color32::from_rgb(122, 162, 228),
        RelationKind::Participation => Color32::from_rgb(168, 168, 176),
    }
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let opacity = opacity.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * opacity) as u8,
    )
}

pub(super) fn lighten(color: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |channel: u8| -> u8 {
        ((channel as f32 * (1.0 - amount)) + (255.0 * amount)) as u8
    };
    Color32::from_rgba_unmultiplied(mix(color.r()), mix(color.g()), mix(color.b()), color.a())
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(21, 24, 31));

    let step = (64.0 * zoom.clamp(0.5, 2.0)).max(24.0);
    let origin = rect.center() + pan;
    let grid_stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(58, 66, 80, 60));

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [pos2(x, rect.top()), pos2(x, rect.bottom())],
            grid_stroke,
        );
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [pos2(rect.left(), y), pos2(rect.right(), y)],
            grid_stroke,
        );
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::Rect;

    fn canvas() -> Rect {
        Rect::from_min_max(pos2(0.0, 0.0), pos2(800.0, 600.0))
    }

    #[test]
    fn two_d_projection_round_trips() {
        let camera = Camera {
            pan: vec2(30.0, -12.0),
            zoom: 1.6,
            ..Camera::default()
        };
        let world = world3(120.0, -44.0, 0.0);
        let (screen, scale) = camera.project(canvas(), LayoutSpace::TwoD, world);
        assert_eq!(scale, 1.0);

        let back = camera.unproject(canvas(), LayoutSpace::TwoD, screen, Vec3::ZERO);
        assert!((back.x - world.x).abs() < 1e-3);
        assert!((back.y - world.y).abs() < 1e-3);
    }

    #[test]
    fn three_d_projection_round_trips_at_reference_depth() {
        let camera = Camera {
            pan: vec2(-20.0, 8.0),
            zoom: 1.2,
            yaw: 0.7,
            pitch: -0.4,
        };
        let world = world3(90.0, 40.0, -120.0);
        let (screen, scale) = camera.project(canvas(), LayoutSpace::ThreeD, world);
        assert!(scale > 0.0);

        let back = camera.unproject(canvas(), LayoutSpace::ThreeD, screen, world);
        assert!((back.x - world.x).abs() < 1e-2);
        assert!((back.y - world.y).abs() < 1e-2);
        assert!((back.z - world.z).abs() < 1e-2);
    }

    #[test]
    fn nearer_points_project_larger() {
        let camera = Camera::default();
        let (_, near) = camera.project(canvas(), LayoutSpace::ThreeD, world3(0.0, 0.0, -300.0));
        let (_, far) = camera.project(canvas(), LayoutSpace::ThreeD, world3(0.0, 0.0, 300.0));
        assert!(near > far);
    }

    #[test]
    fn opacity_scales_alpha_only() {
        let faded = with_opacity(Color32::from_rgb(200, 100, 50), 0.5);
        assert_eq!(faded.r(), 200);
        assert_eq!(faded.a(), 127);
    }
}
