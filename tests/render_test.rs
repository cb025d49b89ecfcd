mod common;

use vasctree::application::render::{build_draw_list, ColorBy, RenderOptions, Shading, SELECTED};
use vasctree::domain::{CameraLimits, Projection, ViewState, Viewport, Visibility};
use vasctree::util::testing;

fn y_model() -> vasctree::domain::TreeModel {
    common::model(
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

fn framed(model: &vasctree::domain::TreeModel) -> ViewState {
    ViewState::default().framing(&model.bounds(), &CameraLimits::default())
}

#[test]
fn given_partial_reveal_when_building_draw_list_then_only_prefix_drawn() {
    testing::init_test_setup();
    // Arrange
    let mut model = y_model();
    model.set_visibility(Visibility::UpTo(2));

    // Act
    let list = build_draw_list(&model, &framed(&model), &RenderOptions::default(), None);

    // Assert
    let ids: Vec<usize> = list.lines.iter().map(|l| l.branch).collect();
    assert_eq!(ids, vec![0, 1]);
}

#[test]
fn given_selected_branch_when_building_then_highlighted() {
    testing::init_test_setup();
    let model = y_model();

    let list = build_draw_list(&model, &framed(&model), &RenderOptions::default(), Some(2));

    let line = list.lines.iter().find(|l| l.branch == 2).unwrap();
    assert_eq!(line.start_color, SELECTED);
    assert_eq!(line.end_color, SELECTED);
    assert!(list
        .lines
        .iter()
        .filter(|l| l.branch != 2)
        .all(|l| l.start_color != SELECTED));
}

#[test]
fn given_fixed_radius_when_building_then_uniform_width() {
    testing::init_test_setup();
    let model = y_model();
    let options = RenderOptions {
        fixed_radius: true,
        shading: Shading::Flat,
        ..RenderOptions::default()
    };

    let list = build_draw_list(&model, &framed(&model), &options, None);

    assert!(list.lines.iter().all(|l| l.width == list.lines[0].width));
    assert!(list.lines.iter().all(|l| l.start_color == l.end_color));
}

#[test]
fn given_transparency_when_building_then_back_to_front() {
    testing::init_test_setup();
    let model = y_model();
    let view = framed(&model);
    let options = RenderOptions {
        transparency: true,
        color_by: ColorBy::Radius,
        ..RenderOptions::default()
    };

    let list = build_draw_list(&model, &view, &options, None);

    let eye = view.eye();
    let distances: Vec<f64> = list
        .lines
        .iter()
        .map(|l| ((l.start + l.end) * 0.5).distance(eye))
        .collect();
    assert!(distances.windows(2).all(|w| w[0] >= w[1]));
    assert!(list.lines.iter().all(|l| l.alpha < 1.0));
}

#[test]
fn given_draw_list_when_exporting_svg_then_one_line_per_branch() {
    testing::init_test_setup();
    let model = y_model();
    let view = framed(&model);
    let list = build_draw_list(&model, &view, &RenderOptions::default(), None);

    let svg = list.to_svg(&view, &Viewport::default(), &Projection::default());

    assert!(svg.starts_with("<svg"));
    assert!(svg.trim_end().ends_with("</svg>"));
    assert_eq!(svg.matches("<line ").count(), 4);
}
