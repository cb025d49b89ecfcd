#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use glam::DVec3;
use vasctree::domain::{RadiusPolicy, RawGeometry, TreeBuilder, TreeModel};

/// Legacy ASCII polydata with one radius per line cell.
pub fn vtk(points: &[[f64; 3]], edges: &[(u32, u32)], radius: &[f64]) -> String {
    let mut s = String::from("# vtk DataFile Version 3.0\nvascular tree\nASCII\nDATASET POLYDATA\n");
    let _ = writeln!(s, "POINTS {} float", points.len());
    for p in points {
        let _ = writeln!(s, "{} {} {}", p[0], p[1], p[2]);
    }
    let _ = writeln!(s, "LINES {} {}", edges.len(), edges.len() * 3);
    for (a, b) in edges {
        let _ = writeln!(s, "2 {a} {b}");
    }
    if !radius.is_empty() {
        let _ = writeln!(s, "CELL_DATA {}", radius.len());
        s.push_str("SCALARS radius float\nLOOKUP_TABLE default\n");
        for r in radius {
            let _ = writeln!(s, "{r}");
        }
    }
    s
}

/// Chain of two branches along +y.
pub fn chain_vtk() -> String {
    vtk(
        &[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 2.0, 0.0]],
        &[(0, 1), (1, 2)],
        &[0.05, 0.04],
    )
}

/// Root 0 with children 1, 2; point 1 bifurcates into 3, 4.
pub fn y_tree_vtk() -> String {
    vtk(
        &[
            [0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [-0.5, 2.0, 0.0],
            [0.5, 2.0, 0.0],
        ],
        &[(0, 1), (0, 2), (1, 3), (1, 4)],
        &[0.08, 0.06, 0.04, 0.03],
    )
}

/// Two points pointing at each other: no root.
pub fn broken_vtk() -> String {
    vtk(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], &[(0, 1), (1, 0)], &[0.1, 0.1])
}

pub fn write_step(dir: &Path, nterm: u32, step: u32, content: &str) {
    let name = format!("tree3D_Nterm{nterm:04}_step{step:04}.vtk");
    fs::write(dir.join(name), content).expect("write step file");
}

pub fn geometry(points: &[[f64; 3]], edges: &[(u32, u32)], radius: &[f64]) -> RawGeometry {
    RawGeometry::new(
        points.iter().map(|p| DVec3::from_array(*p)).collect(),
        edges.to_vec(),
        radius.to_vec(),
    )
}

pub fn model(points: &[[f64; 3]], edges: &[(u32, u32)], radius: &[f64]) -> TreeModel {
    TreeModel::from_geometry(
        &geometry(points, edges, radius),
        &TreeBuilder::new(),
        RadiusPolicy::default(),
    )
    .expect("valid tree")
}
