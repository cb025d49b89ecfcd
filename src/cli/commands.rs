//! Command dispatch and per-command handlers

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use glam::DVec3;
use termtree::Tree as TermTree;
use tracing::{debug, instrument};

use crate::application::dataset::Dimension;
use crate::application::render::build_draw_list;
use crate::application::services::Action;
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands, StepArg};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{PointId, Ray, TreeModel, ViewState, Visibility};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Run the parsed command line.
pub fn execute(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| container.settings.data_dir.clone());

    match &cli.command {
        Some(Commands::Info { step }) => cmd_info(container, &data_dir, step),
        Some(Commands::Branches { step, limit }) => cmd_branches(container, &data_dir, step, *limit),
        Some(Commands::Tree { step, max_depth }) => cmd_tree(container, &data_dir, step, *max_depth),
        Some(Commands::Pick {
            step,
            origin,
            dir,
            screen,
        }) => cmd_pick(container, &data_dir, step, *origin, *dir, *screen),
        Some(Commands::Steps) => cmd_steps(container, &data_dir),
        Some(Commands::Play { step, dt, max_ticks }) => {
            cmd_play(container, &data_dir, *step, *dt, *max_ticks)
        }
        Some(Commands::Render {
            step,
            output,
            reveal,
            select,
        }) => cmd_render(container, &data_dir, step, output, *reveal, *select),
        Some(Commands::Config { command }) => cmd_config(container, &data_dir, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "vasctree", &mut io::stdout());
            Ok(())
        }
        None => {
            Cli::command()
                .print_help()
                .map_err(|e| InfraError::io("print help", e))?;
            Ok(())
        }
    }
}

/// A model plus where it came from.
struct Loaded {
    model: TreeModel,
    source: PathBuf,
    step: Option<u32>,
}

fn load(container: &ServiceContainer, data_dir: &Path, arg: &StepArg) -> CliResult<Loaded> {
    if let Some(file) = &arg.file {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dimension = Dimension::detect(&name).unwrap_or_default();
        let model = container.loader(dimension).load(file)?;
        return Ok(Loaded {
            model,
            source: file.clone(),
            step: None,
        });
    }

    let dataset = container.dataset(data_dir)?;
    let step = match arg.step {
        Some(s) if dataset.contains(s) => s,
        Some(s) => return Err(ApplicationError::UnknownStep { step: s }.into()),
        None => dataset
            .first_step()
            .ok_or_else(|| ApplicationError::NoSteps(data_dir.to_path_buf()))?,
    };
    let source = dataset.path_for(step);
    let model = container.loader(dataset.dimension).load(&source)?;
    Ok(Loaded {
        model,
        source,
        step: Some(step),
    })
}

fn fmt_vec(v: DVec3) -> String {
    format!("({:.4}, {:.4}, {:.4})", v.x, v.y, v.z)
}

fn title(loaded: &Loaded) -> String {
    match loaded.step {
        Some(step) => format!("Step {step}: {}", loaded.source.display()),
        None => loaded.source.display().to_string(),
    }
}

#[instrument(skip(container))]
fn cmd_info(container: &ServiceContainer, data_dir: &Path, step: &StepArg) -> CliResult<()> {
    let loaded = load(container, data_dir, step)?;
    let model = &loaded.model;
    let tree = model.tree();

    output::header(&title(&loaded));
    output::field("root", &model.root());
    output::field("points", &tree.point_count());
    output::field("branches", &model.branches().len());
    output::field("bifurcations", &tree.bifurcation_count());
    output::field("leaves", &model.leaf_points().len());
    output::field("max depth", &model.max_depth());
    let bounds = model.bounds();
    output::field(
        "bounds",
        &format!("{} .. {}", fmt_vec(bounds.min), fmt_vec(bounds.max)),
    );
    output::field("centroid", &fmt_vec(model.centroid()));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_branches(
    container: &ServiceContainer,
    data_dir: &Path,
    step: &StepArg,
    limit: Option<usize>,
) -> CliResult<()> {
    let loaded = load(container, data_dir, step)?;
    let branches = loaded.model.branches();
    let shown = limit.unwrap_or(branches.len()).min(branches.len());

    output::info(&format!(
        "{:>5} {:>5} {:>11} {:>5} {:>9} {:>9} {:>9}  flags",
        "id", "edge", "parent>child", "depth", "length", "r0", "r1"
    ));
    for b in &branches[..shown] {
        let mut flags = Vec::new();
        if b.is_root_branch {
            flags.push("root");
        }
        if b.is_leaf_branch {
            flags.push("leaf");
        }
        if b.is_degenerate() {
            flags.push("degenerate");
        }
        output::info(&format!(
            "{:>5} {:>5} {:>11} {:>5} {:>9.5} {:>9.5} {:>9.5}  {}",
            b.id,
            b.edge,
            format!("{}>{}", b.parent_point, b.child_point),
            b.depth,
            b.length,
            b.start_radius,
            b.end_radius,
            flags.join(",")
        ));
    }
    if shown < branches.len() {
        output::detail(&format!("... {} more", branches.len() - shown));
    }
    Ok(())
}

/// Hierarchy below the root as a printable tree.
///
/// Nodes below `max_depth` are folded into a single `...` leaf.
pub fn tree_view(model: &TreeModel, max_depth: Option<usize>) -> TermTree<String> {
    let mut branch_of = vec![None; model.tree().point_count()];
    for b in model.branches() {
        branch_of[b.child_point.index()] = Some(b.id);
    }

    fn node(
        model: &TreeModel,
        branch_of: &[Option<usize>],
        point: PointId,
        level: usize,
        max_depth: Option<usize>,
    ) -> TermTree<String> {
        let label = match branch_of[point.index()].and_then(|id| model.branch(id)) {
            Some(b) => format!(
                "{point} [branch {} len {:.4} r {:.4}]",
                b.id,
                b.length,
                b.mean_radius()
            ),
            None => format!("{point} (root)"),
        };
        let mut tree = TermTree::new(label);
        if model.tree().is_leaf(point) {
            return tree;
        }
        if max_depth.is_some_and(|max| level >= max) {
            tree.push(TermTree::new(format!(
                "... {} children",
                model.tree().child_count(point)
            )));
            return tree;
        }
        for child in model.tree().children(point) {
            tree.push(node(model, branch_of, child, level + 1, max_depth));
        }
        tree
    }

    node(model, &branch_of, model.root(), 0, max_depth)
}

#[instrument(skip(container))]
fn cmd_tree(
    container: &ServiceContainer,
    data_dir: &Path,
    step: &StepArg,
    max_depth: Option<usize>,
) -> CliResult<()> {
    let loaded = load(container, data_dir, step)?;
    output::header(&title(&loaded));
    output::info(&tree_view(&loaded.model, max_depth));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_pick(
    container: &ServiceContainer,
    data_dir: &Path,
    step: &StepArg,
    origin: Option<[f64; 3]>,
    dir: Option<[f64; 3]>,
    screen: Option<[f64; 2]>,
) -> CliResult<()> {
    let settings = &container.settings;
    let loaded = load(container, data_dir, step)?;
    let model = &loaded.model;

    let ray = match (origin, dir, screen) {
        (Some(o), Some(d), None) => Ray::new(DVec3::from_array(o), DVec3::from_array(d)),
        (None, None, Some([x, y])) => {
            let view = ViewState::default().framing(&model.bounds(), &settings.camera);
            view.ray_through(x, y, &settings.render.viewport(), &settings.projection)
        }
        _ => {
            return Err(CliError::InvalidArgs(
                "give either --origin and --dir, or --screen".to_string(),
            ))
        }
    };
    debug!(?ray, "picking");

    match model.pick(&ray, &settings.picker()) {
        Some(hit) => {
            output::success(&format!("branch {}", hit.branch));
            if let Some(b) = model.branch(hit.branch) {
                output::field("ray t", &format!("{:.6}", hit.ray_t));
                output::field("distance", &format!("{:.6}", hit.distance));
                output::field("points", &format!("{} > {}", b.parent_point, b.child_point));
                output::field("length", &format!("{:.6}", b.length));
                output::field("radius", &format!("{:.6} .. {:.6}", b.start_radius, b.end_radius));
                output::field("depth", &b.depth);
            }
        }
        None => output::info("no branch hit"),
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_steps(container: &ServiceContainer, data_dir: &Path) -> CliResult<()> {
    let dataset = container.dataset(data_dir)?;
    output::header(&dataset.dir.display());
    output::field("dimension", &dataset.dimension);
    output::field("nterm", &dataset.nterm);
    output::field("increment", &dataset.increment);
    output::field("steps", &dataset.len());
    for step in dataset.steps() {
        output::detail(&format!("{step:>6}  {}", dataset.path_for(step).display()));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_play(
    container: &ServiceContainer,
    data_dir: &Path,
    step: Option<u32>,
    dt: f64,
    max_ticks: usize,
) -> CliResult<()> {
    if dt <= 0.0 {
        return Err(CliError::InvalidArgs("--dt must be positive".to_string()));
    }
    let mut session = container.session(data_dir)?;
    session.start(step)?;
    session.apply(Action::Replay)?;

    let mut shown = session.model_step();
    if let Some(s) = shown {
        output::info(&format!("playing from step {s}"));
    }
    let mut ticks = 0;
    while session.is_playing() && ticks < max_ticks {
        if let Err(e) = session.tick(dt) {
            output::warning(&e);
        }
        ticks += 1;
        if session.model_step() != shown {
            shown = session.model_step();
            if let (Some(s), Some(model)) = (shown, session.model()) {
                output::success(&format!("step {s}: {} branches", model.branches().len()));
            }
        }
    }

    let visible = session.model().map_or(0, TreeModel::visible_count);
    output::info(&format!(
        "{} after {ticks} ticks ({:.1}s simulated): step {}, {visible} branches visible",
        if session.is_playing() { "paused" } else { "finished" },
        ticks as f64 * dt,
        session.step(),
    ));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_render(
    container: &ServiceContainer,
    data_dir: &Path,
    step: &StepArg,
    out: &Path,
    reveal: Option<usize>,
    select: Option<usize>,
) -> CliResult<()> {
    let settings = &container.settings;
    let mut loaded = load(container, data_dir, step)?;
    if let Some(n) = reveal {
        loaded.model.set_visibility(Visibility::UpTo(n.max(1)));
    }
    let model = &loaded.model;

    let view = ViewState::default().framing(&model.bounds(), &settings.camera);
    let viewport = settings.render.viewport();
    let draw_list = build_draw_list(model, &view, &settings.render.options(), select);
    let svg = draw_list.to_svg(&view, &viewport, &settings.projection);

    container
        .fs
        .ensure_parent(out)
        .and_then(|_| container.fs.write(out, &svg))
        .map_err(|e| InfraError::io(format!("write {}", out.display()), e))?;
    output::success(&format!(
        "wrote {} ({} branches)",
        out.display(),
        draw_list.len()
    ));
    Ok(())
}

fn cmd_config(
    container: &ServiceContainer,
    data_dir: &Path,
    command: &ConfigCommands,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(p) => output::field("global", &p.display()),
                None => output::field("global", "(no config directory)"),
            }
            output::field("local", &local_config_path(data_dir).display());
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path()
                    .ok_or_else(|| CliError::Usage("cannot determine config directory".into()))?
            } else {
                local_config_path(data_dir)
            };
            if container.fs.exists(&path) {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            container
                .fs
                .ensure_parent(&path)
                .and_then(|_| container.fs.write(&path, &Settings::template()))
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("created {}", path.display()));
        }
    }
    Ok(())
}
