//! Growth-step datasets: one legacy VTK file per step in a single directory.
//!
//! Files follow `tree{2D|3D}_Nterm{NNNN}_step{SSSS}.vtk`. The step number is
//! the number of terminal segments grown so far; `Nterm` is the final count.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::RadiusMode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "2d")]
    TwoD,
    #[default]
    #[serde(rename = "3d")]
    ThreeD,
}

impl Dimension {
    pub fn tag(self) -> &'static str {
        match self {
            Dimension::TwoD => "2D",
            Dimension::ThreeD => "3D",
        }
    }

    /// Dimension tag embedded in a file name, e.g. `tree2D_...`.
    pub fn detect(file_name: &str) -> Option<Self> {
        if file_name.contains("tree2D") {
            Some(Dimension::TwoD)
        } else if file_name.contains("tree3D") {
            Some(Dimension::ThreeD)
        } else {
            None
        }
    }

    /// 2D trees carry one radius per edge, 3D trees are smoothed per point.
    pub fn radius_mode(self) -> RadiusMode {
        match self {
            Dimension::TwoD => RadiusMode::PerEdge,
            Dimension::ThreeD => RadiusMode::PointAverage,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Canonical file name of one step.
pub fn file_name(dimension: Dimension, nterm: u32, step: u32) -> String {
    format!("tree{}_Nterm{:04}_step{:04}.vtk", dimension.tag(), nterm, step)
}

/// Steps found in a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub dir: PathBuf,
    pub dimension: Dimension,
    pub nterm: u32,
    /// Difference between the first two steps, or the only step.
    pub increment: u32,
    files: BTreeMap<u32, PathBuf>,
}

impl Dataset {
    /// Sorted, unique step numbers.
    pub fn steps(&self) -> impl Iterator<Item = u32> + '_ {
        self.files.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, step: u32) -> bool {
        self.files.contains_key(&step)
    }

    pub fn first_step(&self) -> Option<u32> {
        self.files.keys().next().copied()
    }

    pub fn last_step(&self) -> Option<u32> {
        self.files.keys().next_back().copied()
    }

    /// File of `step`: the discovered one, else the canonical name in `dir`.
    pub fn path_for(&self, step: u32) -> PathBuf {
        self.files
            .get(&step)
            .cloned()
            .unwrap_or_else(|| self.dir.join(file_name(self.dimension, self.nterm, step)))
    }

    /// Next discovered step after `step`.
    pub fn next(&self, step: u32) -> Option<u32> {
        self.files
            .range(step.saturating_add(1)..)
            .next()
            .map(|(s, _)| *s)
    }

    /// Previous discovered step before `step`.
    pub fn previous(&self, step: u32) -> Option<u32> {
        self.files.range(..step).next_back().map(|(s, _)| *s)
    }
}

fn compile(pattern: &str) -> ApplicationResult<Regex> {
    Regex::new(pattern).map_err(|e| ApplicationError::OperationFailed {
        context: "compile regex".to_string(),
        source: Box::new(e),
    })
}

/// Scan `dir` (not recursively) for step files.
#[instrument(level = "debug")]
pub fn discover(dir: &Path) -> ApplicationResult<Dataset> {
    if !dir.is_dir() {
        return Err(ApplicationError::FileMissing(dir.to_path_buf()));
    }
    let file_re = compile(r"(?:Nterm(\d+)_)?step(\d+)\.vtk$")?;
    let folder_re = compile(r"Nterm_(\d+)")?;

    let mut files = BTreeMap::new();
    let mut dimension = None;
    let mut nterm_from_file = None;

    for entry in walkdir::WalkDir::new(dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        let Some(caps) = file_re.captures(&name) else {
            continue;
        };
        let Some(step) = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            continue;
        };

        if dimension.is_none() {
            dimension = Dimension::detect(&name);
        }
        if nterm_from_file.is_none() {
            nterm_from_file = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
        }
        debug!(step, file = %name, "step file");
        files.insert(step, entry.into_path());
    }

    let (Some(&first), Some(&last)) = (files.keys().next(), files.keys().next_back()) else {
        return Err(ApplicationError::NoSteps(dir.to_path_buf()));
    };
    let increment = files
        .keys()
        .nth(1)
        .map_or(first, |second| second - first);

    let nterm_from_folder = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .and_then(|n| {
            folder_re
                .captures(&n)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())
        });
    let nterm = nterm_from_folder.or(nterm_from_file).unwrap_or(last);

    let dataset = Dataset {
        dir: dir.to_path_buf(),
        dimension: dimension.unwrap_or_default(),
        nterm,
        increment,
        files,
    };
    info!(
        dir = %dir.display(),
        dimension = %dataset.dimension,
        nterm,
        first,
        last,
        increment,
        steps = dataset.len(),
        "dataset discovered"
    );
    Ok(dataset)
}
