//! Headless viewer session
//!
//! Single-threaded state machine behind the viewer: current step and model,
//! camera, progressive-reveal animation, render toggles and selection. Input
//! arrives as [`Action`]s; time advances through [`Session::tick`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::application::dataset::Dataset;
use crate::application::render::{build_draw_list, DrawList, RenderOptions, Shading};
use crate::application::services::StepLoader;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    Branch, CameraLimits, Picker, Projection, TreeModel, ViewState, Viewport, Visibility,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Branches revealed per second.
    pub speed: f64,
    /// Branches shown or hidden per manual step while revealing.
    pub reveal_stride: usize,
    /// Speed multiplier of one speed-up/slow-down.
    pub speed_factor: f64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            speed: 2.0,
            reveal_stride: 5,
            speed_factor: 1.5,
        }
    }
}

/// Everything a session needs besides the dataset and the loader.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionSettings {
    pub picker: Picker,
    pub limits: CameraLimits,
    pub projection: Projection,
    pub viewport: Viewport,
    pub animation: AnimationSettings,
    pub render: RenderOptions,
}

/// User input, decoupled from any windowing toolkit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    ToggleAnimation,
    /// Reveal more while revealing, else load the next step.
    StepForward,
    /// Hide some while revealing, else load the previous step.
    StepBack,
    SpeedUp,
    SlowDown,
    ToggleFixedRadius,
    FlatShading,
    SmoothShading,
    ToggleTransparency,
    CycleColorBy,
    /// Reveal from the first branch and play.
    Replay,
    Orbit { dx: f64, dy: f64 },
    Pan { dx: f64, dy: f64 },
    Zoom { scroll: f64 },
    Resize { width: u32, height: u32 },
    Click { x: f64, y: f64 },
}

pub struct Session {
    dataset: Dataset,
    loader: StepLoader,
    settings: SessionSettings,
    /// Navigation cursor; may point at a step whose load failed.
    step: u32,
    model: Option<TreeModel>,
    model_step: Option<u32>,
    view: ViewState,
    viewport: Viewport,
    playing: bool,
    speed: f64,
    timer: f64,
    selected: Option<usize>,
    render: RenderOptions,
}

impl Session {
    /// Session positioned on `dataset`'s first step, nothing loaded yet.
    pub fn new(dataset: Dataset, loader: StepLoader, settings: SessionSettings) -> Self {
        let step = dataset.first_step().unwrap_or(0);
        Self {
            dataset,
            loader,
            step,
            model: None,
            model_step: None,
            view: ViewState::default(),
            viewport: settings.viewport,
            playing: false,
            speed: settings.animation.speed,
            timer: 0.0,
            selected: None,
            render: settings.render,
            settings,
        }
    }

    /// Load `step`, or the first step when `None`.
    pub fn start(&mut self, step: Option<u32>) -> ApplicationResult<()> {
        let step = match step {
            Some(s) if self.dataset.contains(s) => s,
            Some(s) => return Err(ApplicationError::UnknownStep { step: s }),
            None => self
                .dataset
                .first_step()
                .ok_or_else(|| ApplicationError::NoSteps(self.dataset.dir.clone()))?,
        };
        self.goto(step, Visibility::All)
    }

    /// Move to `step` and load it.
    ///
    /// On failure the previous model stays on screen and the error is returned.
    #[instrument(level = "debug", skip(self))]
    pub fn goto(&mut self, step: u32, visibility: Visibility) -> ApplicationResult<()> {
        self.step = step;
        let path = self.dataset.path_for(step);
        match self.loader.load(&path) {
            Ok(mut model) => {
                model.set_visibility(visibility);
                self.view = self.view.framing(&model.bounds(), &self.settings.limits);
                info!(
                    step,
                    branches = model.branches().len(),
                    bifurcations = model.tree().bifurcation_count(),
                    max_depth = model.max_depth(),
                    "step loaded"
                );
                self.model = Some(model);
                self.model_step = Some(step);
                self.selected = None;
                Ok(())
            }
            Err(e) => {
                warn!(step, error = %e, "keeping previous model");
                Err(e)
            }
        }
    }

    pub fn apply(&mut self, action: Action) -> ApplicationResult<()> {
        debug!(?action, "apply");
        let limits = self.settings.limits;
        let stride = self.settings.animation.reveal_stride;
        match action {
            Action::ToggleAnimation => self.playing = !self.playing,
            Action::StepForward => {
                if let Some(model) = self.model.as_mut().filter(|m| m.is_revealing()) {
                    model.reveal(stride);
                } else if let Some(next) = self.dataset.next(self.step) {
                    return self.goto(next, Visibility::All);
                }
            }
            Action::StepBack => {
                if let Some(model) = self.model.as_mut().filter(|m| m.is_revealing()) {
                    model.conceal(stride);
                } else if let Some(previous) = self.dataset.previous(self.step) {
                    return self.goto(previous, Visibility::All);
                }
            }
            Action::SpeedUp => self.speed *= self.settings.animation.speed_factor,
            Action::SlowDown => self.speed /= self.settings.animation.speed_factor,
            Action::ToggleFixedRadius => self.render.fixed_radius = !self.render.fixed_radius,
            Action::FlatShading => self.render.shading = Shading::Flat,
            Action::SmoothShading => self.render.shading = Shading::Smooth,
            Action::ToggleTransparency => self.render.transparency = !self.render.transparency,
            Action::CycleColorBy => self.render.color_by = self.render.color_by.toggled(),
            Action::Replay => {
                if let Some(model) = self.model.as_mut() {
                    model.restart_reveal();
                    self.timer = 0.0;
                    self.playing = true;
                }
            }
            Action::Orbit { dx, dy } => self.view = self.view.orbit(dx, dy, &limits),
            Action::Pan { dx, dy } => self.view = self.view.pan(dx, dy, &limits),
            Action::Zoom { scroll } => self.view = self.view.zoom(scroll, &limits),
            Action::Resize { width, height } => self.viewport = Viewport { width, height },
            Action::Click { x, y } => self.click(x, y),
        }
        Ok(())
    }

    fn click(&mut self, x: f64, y: f64) {
        let Some(model) = &self.model else {
            return;
        };
        let ray = self
            .view
            .ray_through(x, y, &self.viewport, &self.settings.projection);
        self.selected = model
            .pick_visible(&ray, &self.settings.picker)
            .map(|hit| hit.branch);

        if let Some(branch) = self.selected_branch() {
            info!(
                id = branch.id,
                length = branch.length,
                r0 = branch.start_radius,
                r1 = branch.end_radius,
                depth = branch.depth,
                "branch selected"
            );
        }
    }

    /// Advance the animation by `dt` seconds.
    ///
    /// One branch is revealed each time the timer crosses 1. Past the last
    /// branch the next step is loaded and revealed from its first branch; at
    /// the last step playback stops.
    pub fn tick(&mut self, dt: f64) -> ApplicationResult<()> {
        if !self.playing {
            return Ok(());
        }
        let Some(model) = self.model.as_mut() else {
            return Ok(());
        };
        if !model.is_revealing() {
            return Ok(());
        }

        self.timer += dt * self.speed;
        if self.timer < 1.0 {
            return Ok(());
        }
        self.timer = 0.0;

        if !model.is_fully_revealed() {
            model.reveal(1);
            return Ok(());
        }
        match self.dataset.next(self.step) {
            Some(next) => self.goto(next, Visibility::UpTo(1)),
            None => {
                info!(step = self.step, "last step reached, animation stopped");
                self.playing = false;
                Ok(())
            }
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    /// Step the displayed model belongs to.
    pub fn model_step(&self) -> Option<u32> {
        self.model_step
    }

    pub fn model(&self) -> Option<&TreeModel> {
        self.model.as_ref()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn projection(&self) -> &Projection {
        &self.settings.projection
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn render_options(&self) -> &RenderOptions {
        &self.render
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_branch(&self) -> Option<&Branch> {
        self.model.as_ref()?.branch(self.selected?)
    }

    pub fn draw_list(&self) -> Option<DrawList> {
        let model = self.model.as_ref()?;
        Some(build_draw_list(model, &self.view, &self.render, self.selected))
    }
}
