//! Draw list construction and SVG export.
//!
//! The draw list is backend-neutral: one coloured line per visible branch in
//! world space. [`DrawList::to_svg`] projects it through the current view.

use std::fmt::Write as _;

use glam::DVec3;
use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{Branch, Projection, TreeModel, ViewState, Viewport};

/// Line radius used when every branch is drawn with the same width.
pub const FIXED_RADIUS: f64 = 0.01;
/// Thinnest radius a branch is drawn with.
pub const MIN_DRAW_RADIUS: f64 = 0.002;
/// Pixels of line width per unit radius.
pub const WIDTH_PER_RADIUS: f64 = 80.0;
pub const TRANSPARENT_ALPHA: f64 = 0.7;
pub const BACKGROUND: Rgb = Rgb::new(0.08, 0.08, 0.12);
pub const SELECTED: Rgb = Rgb::new(1.0, 0.8, 0.2);

fn light_direction() -> DVec3 {
    DVec3::new(0.5, 1.0, 0.5).normalize()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Multiply every channel, clamped to `[0, 1]`.
    pub fn scaled(self, factor: f64) -> Self {
        let c = |v: f64| (v * factor).clamp(0.0, 1.0);
        Self::new(c(self.r), c(self.g), c(self.b))
    }

    pub fn to_hex(self) -> String {
        let byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }
}

/// Blue → cyan → green → yellow → red over `t` in `[0, 1]`.
pub fn ramp(t: f64) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    if t < 0.25 {
        Rgb::new(0.0, t / 0.25, 1.0)
    } else if t < 0.5 {
        Rgb::new(0.0, 1.0, 1.0 - (t - 0.25) / 0.25)
    } else if t < 0.75 {
        Rgb::new((t - 0.5) / 0.25, 1.0, 0.0)
    } else {
        Rgb::new(1.0, 1.0 - (t - 0.75) / 0.25, 0.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorBy {
    /// Root blue, deepest branches red.
    #[default]
    Depth,
    /// Thin blue, thick red, normalized over what is visible.
    Radius,
}

impl ColorBy {
    pub fn toggled(self) -> Self {
        match self {
            ColorBy::Depth => ColorBy::Radius,
            ColorBy::Radius => ColorBy::Depth,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Shading {
    Flat,
    #[default]
    Smooth,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub fixed_radius: bool,
    pub shading: Shading,
    pub transparency: bool,
    pub color_by: ColorBy,
}

/// One branch ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePrimitive {
    pub branch: usize,
    pub start: DVec3,
    pub end: DVec3,
    pub start_color: Rgb,
    pub end_color: Rgb,
    pub alpha: f64,
    /// Pixels, at least 1.
    pub width: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub lines: Vec<LinePrimitive>,
}

struct Palette {
    color_by: ColorBy,
    max_depth: usize,
    radius_range: Option<(f64, f64)>,
}

impl Palette {
    fn new(model: &TreeModel, color_by: ColorBy) -> Self {
        let radius_range = match model
            .visible_branches()
            .iter()
            .map(Branch::mean_radius)
            .minmax()
        {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(r) => Some((r, r)),
            MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
        };
        Self {
            color_by,
            max_depth: model.max_depth(),
            radius_range,
        }
    }

    fn base(&self, branch: &Branch) -> Rgb {
        match self.color_by {
            ColorBy::Depth => ramp(1.0 - branch.depth as f64 / self.max_depth.max(1) as f64),
            ColorBy::Radius => {
                let t = match self.radius_range {
                    Some((lo, hi)) if hi > lo => (branch.mean_radius() - lo) / (hi - lo),
                    _ => 0.5,
                };
                ramp(t)
            }
        }
    }
}

/// Coloured lines for the visible branches of `model`.
///
/// With transparency the lines come back-to-front as seen from `view`.
#[instrument(level = "debug", skip_all, fields(visible = model.visible_count()))]
pub fn build_draw_list(
    model: &TreeModel,
    view: &ViewState,
    options: &RenderOptions,
    selected: Option<usize>,
) -> DrawList {
    let palette = Palette::new(model, options.color_by);
    let light = light_direction();
    let alpha = if options.transparency {
        TRANSPARENT_ALPHA
    } else {
        1.0
    };

    let mut branches: Vec<&Branch> = model.visible_branches().iter().collect();
    if options.transparency {
        let eye = view.eye();
        branches.sort_by(|a, b| {
            b.midpoint()
                .distance(eye)
                .total_cmp(&a.midpoint().distance(eye))
        });
    }

    let lines: Vec<LinePrimitive> = branches
        .into_iter()
        .map(|branch| {
            let radius = if options.fixed_radius {
                FIXED_RADIUS
            } else {
                branch.max_radius().max(MIN_DRAW_RADIUS)
            };
            let dot = branch.direction.dot(light).max(0.0);
            let factor = 0.4 + 0.6 * dot;
            let base = palette.base(branch);

            let (start_color, end_color) = if selected == Some(branch.id) {
                (SELECTED, SELECTED)
            } else {
                match options.shading {
                    Shading::Flat => (base.scaled(factor), base.scaled(factor)),
                    Shading::Smooth => {
                        let k = 0.3 * (2.0 * dot - 1.0);
                        (
                            base.scaled((factor - k).max(0.3)),
                            base.scaled((factor + k).max(0.3)),
                        )
                    }
                }
            };

            LinePrimitive {
                branch: branch.id,
                start: branch.start_pos,
                end: branch.end_pos,
                start_color,
                end_color,
                alpha,
                width: (radius * WIDTH_PER_RADIUS).max(1.0),
            }
        })
        .collect();

    debug!(lines = lines.len(), "draw list built");
    DrawList { lines }
}

impl DrawList {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Standalone SVG document. Lines with an endpoint behind the camera are dropped.
    pub fn to_svg(&self, view: &ViewState, viewport: &Viewport, projection: &Projection) -> String {
        let (w, h) = (viewport.width, viewport.height);
        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        );
        let _ = writeln!(
            svg,
            r#"<rect width="100%" height="100%" fill="{}"/>"#,
            BACKGROUND.to_hex()
        );

        let mut defs = String::new();
        let mut body = String::new();
        for line in &self.lines {
            let (Some(a), Some(b)) = (
                view.project(line.start, viewport, projection),
                view.project(line.end, viewport, projection),
            ) else {
                continue;
            };
            let stroke = if line.start_color == line.end_color {
                line.start_color.to_hex()
            } else {
                let id = format!("b{}", line.branch);
                let _ = writeln!(
                    defs,
                    r#"<linearGradient id="{id}" gradientUnits="userSpaceOnUse" x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}"><stop offset="0" stop-color="{}"/><stop offset="1" stop-color="{}"/></linearGradient>"#,
                    a.x,
                    a.y,
                    b.x,
                    b.y,
                    line.start_color.to_hex(),
                    line.end_color.to_hex()
                );
                format!("url(#{id})")
            };
            let _ = writeln!(
                body,
                r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{stroke}" stroke-width="{:.2}" stroke-opacity="{}" stroke-linecap="round"/>"#,
                a.x, a.y, b.x, b.y, line.width, line.alpha
            );
        }

        if !defs.is_empty() {
            let _ = writeln!(svg, "<defs>\n{defs}</defs>");
        }
        svg.push_str(&body);
        svg.push_str("</svg>\n");
        svg
    }
}
