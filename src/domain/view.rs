//! Orbit camera as an immutable value.
//!
//! Input handling computes a new [`ViewState`] instead of mutating shared
//! camera fields; the renderer and the picker receive it explicitly.

use glam::{DMat4, DVec2, DVec3, DVec4};
use serde::{Deserialize, Serialize};

use crate::domain::geometry::Bounds;
use crate::domain::picking::Ray;

/// Window size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

impl Viewport {
    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }
}

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Projection {
    /// Vertical field of view in degrees.
    pub fov_y: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y: 45.0,
            near: 0.001,
            far: 10.0,
        }
    }
}

impl Projection {
    pub fn matrix(&self, viewport: &Viewport) -> DMat4 {
        DMat4::perspective_rh_gl(self.fov_y.to_radians(), viewport.aspect(), self.near, self.far)
    }
}

/// Tuning for camera interaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraLimits {
    pub min_distance: f64,
    pub max_distance: f64,
    /// Smallest distance chosen when framing a model.
    pub min_framing_distance: f64,
    /// Framing distance as a multiple of the bounding box diagonal.
    pub framing_factor: f64,
    /// Degrees per pixel of drag.
    pub orbit_sensitivity: f64,
    /// Pan speed per pixel, relative to distance.
    pub pan_factor: f64,
    /// Distance ratio per scroll notch.
    pub zoom_step: f64,
}

impl Default for CameraLimits {
    fn default() -> Self {
        Self {
            min_distance: 0.02,
            max_distance: 2.0,
            min_framing_distance: 0.05,
            framing_factor: 1.2,
            orbit_sensitivity: 0.6,
            pan_factor: 0.002,
            zoom_step: 1.08,
        }
    }
}

/// Orbit camera: angles in degrees around `target` at `distance`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub yaw: f64,
    pub pitch: f64,
    pub distance: f64,
    pub target: DVec3,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            yaw: 45.0,
            pitch: 25.0,
            distance: 0.15,
            target: DVec3::ZERO,
        }
    }
}

impl ViewState {
    /// Same angles, looking at the box center from far enough to see all of it.
    pub fn framing(&self, bounds: &Bounds, limits: &CameraLimits) -> Self {
        Self {
            target: bounds.center(),
            distance: (bounds.diagonal() * limits.framing_factor).max(limits.min_framing_distance),
            ..*self
        }
    }

    /// Unit offset from target to eye.
    fn offset_dir(&self) -> DVec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        DVec3::new(
            pitch.cos() * yaw.sin(),
            pitch.sin(),
            pitch.cos() * yaw.cos(),
        )
    }

    pub fn eye(&self) -> DVec3 {
        self.target + self.offset_dir() * self.distance
    }

    /// Unit vector from eye to target.
    pub fn forward(&self) -> DVec3 {
        -self.offset_dir()
    }

    pub fn orbit(&self, dx: f64, dy: f64, limits: &CameraLimits) -> Self {
        Self {
            yaw: self.yaw - dx * limits.orbit_sensitivity,
            pitch: (self.pitch + dy * limits.orbit_sensitivity).clamp(-89.0, 89.0),
            ..*self
        }
    }

    /// Slide the target in the screen plane.
    pub fn pan(&self, dx: f64, dy: f64, limits: &CameraLimits) -> Self {
        let view = self.forward();
        let right = view.cross(DVec3::Y);
        let right = if right.length() > 1e-6 { right.normalize() } else { right };
        let up = right.cross(view);
        let up = if up.length() > 1e-6 { up.normalize() } else { up };
        let speed = self.distance * limits.pan_factor;

        Self {
            target: self.target + right * (dx * speed) - up * (dy * speed),
            ..*self
        }
    }

    /// Positive `scroll` moves closer.
    pub fn zoom(&self, scroll: f64, limits: &CameraLimits) -> Self {
        let step = if scroll > 0.0 {
            limits.zoom_step
        } else {
            1.0 / limits.zoom_step
        };
        Self {
            distance: (self.distance / step).clamp(limits.min_distance, limits.max_distance),
            ..*self
        }
    }

    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.eye(), self.target, DVec3::Y)
    }

    fn view_projection(&self, viewport: &Viewport, projection: &Projection) -> DMat4 {
        projection.matrix(viewport) * self.view_matrix()
    }

    /// World-space ray through a window pixel (origin top-left, y down).
    ///
    /// The ray starts on the near plane.
    pub fn ray_through(&self, x: f64, y: f64, viewport: &Viewport, projection: &Projection) -> Ray {
        let inverse = self.view_projection(viewport, projection).inverse();
        let ndc_x = 2.0 * x / viewport.width.max(1) as f64 - 1.0;
        let ndc_y = 1.0 - 2.0 * y / viewport.height.max(1) as f64;

        let near = inverse.project_point3(DVec3::new(ndc_x, ndc_y, -1.0));
        let far = inverse.project_point3(DVec3::new(ndc_x, ndc_y, 1.0));
        Ray::new(near, far - near)
    }

    /// Window position of a world point, `None` when behind the camera.
    pub fn project(&self, point: DVec3, viewport: &Viewport, projection: &Projection) -> Option<DVec2> {
        let clip: DVec4 = self.view_projection(viewport, projection) * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(DVec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.width as f64,
            (1.0 - ndc.y) * 0.5 * viewport.height as f64,
        ))
    }
}
