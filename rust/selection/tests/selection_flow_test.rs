// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end selection flows over a real mesh and camera.
//!
//! The camera is orthographic, looking down -Z with a view volume of ±1, so
//! mesh-local XY coordinates equal normalized screen coordinates.

use facemark_core::{FaceSet, LabelStore, NoticeLevel, SelectionSession};
use facemark_selection::{
    Camera, Error, GeometryAccessor, Labeler, LifecycleState, MeshGeometry, Point2, Point3,
    PromptOutcome, ScanStatus, SubMesh, Viewport,
};

fn top_camera() -> Camera {
    Camera::orthographic(
        Point3::new(0.0, 0.0, 10.0),
        Point3::origin(),
        1.0,
        1.0,
        0.1,
        100.0,
    )
    .unwrap()
}

/// One small triangle per centre, centroid exactly at the centre.
fn triangles_at(centres: &[(f32, f32)]) -> SubMesh {
    let mut positions = Vec::new();
    let mut indices = Vec::new();
    for (i, &(x, y)) in centres.iter().enumerate() {
        positions.extend_from_slice(&[
            x - 0.03,
            y - 0.03,
            0.0,
            x + 0.06,
            y - 0.03,
            0.0,
            x - 0.03,
            y + 0.06,
            0.0,
        ]);
        let base = (i * 3) as u32;
        indices.extend_from_slice(&[base, base + 1, base + 2]);
    }
    SubMesh::new(positions, indices)
}

fn scenario_mesh() -> MeshGeometry {
    MeshGeometry::new(&[triangles_at(&[(0.0, 0.0), (0.9, 0.9)])], top_camera()).unwrap()
}

fn draw(labeler: &mut Labeler, mesh: &MeshGeometry, session: &mut SelectionSession, pts: &[(f64, f64)]) {
    for &(x, y) in pts {
        labeler.primary_click(mesh, session, Point2::new(x, y));
    }
}

// Inside the mesh's screen bounds; encloses the centroid at the origin only.
const SQUARE: [(f64, f64); 4] = [(-0.02, -0.02), (0.5, -0.02), (0.5, 0.5), (-0.02, 0.5)];

fn set(faces: &[u32]) -> FaceSet {
    faces.iter().copied().collect()
}

#[test]
fn square_polygon_selects_only_the_centred_face() {
    let mesh = scenario_mesh();
    let mut session = SelectionSession::new();
    let mut labeler = Labeler::default();

    draw(&mut labeler, &mesh, &mut session, &SQUARE);
    assert_eq!(labeler.state(), LifecycleState::Drawing);
    assert_eq!(labeler.capture().len(), 4 + 3 * 5);

    let state = labeler.secondary_click(&mesh, &mut session).unwrap();
    assert_eq!(state, LifecycleState::Resolving { progress: 0 });
    assert_eq!(labeler.resolve_blocking(&mesh, &mut session), LifecycleState::Finalized);

    assert_eq!(session.selected_faces(), &set(&[0]));
    assert_eq!(session.finalized_faces(), &set(&[0]));
    assert!(labeler.capture().is_empty());
}

#[test]
fn two_point_polygon_is_rejected() {
    let mesh = scenario_mesh();
    let mut session = SelectionSession::new();
    let mut labeler = Labeler::default();

    draw(&mut labeler, &mesh, &mut session, &SQUARE[..2]);
    let err = labeler.secondary_click(&mesh, &mut session).unwrap_err();

    assert!(matches!(err, Error::TooFewPoints(_)));
    assert!(err.is_user_input());
    assert_eq!(labeler.state(), LifecycleState::Idle);
    assert!(session.selected_faces().is_empty());
    assert!(labeler.capture().is_empty());
    assert_eq!(session.take_notices()[0].level, NoticeLevel::Warning);
}

#[test]
fn clicks_outside_the_mesh_do_not_start_drawing() {
    let mesh = scenario_mesh();
    let mut session = SelectionSession::new();
    let mut labeler = Labeler::default();

    // The mesh spans roughly [-0.03, 0.96] on both axes.
    let state = labeler.primary_click(&mesh, &mut session, Point2::new(-0.5, -0.5));
    assert_eq!(state, LifecycleState::Idle);
    assert!(labeler.capture().is_empty());
}

#[test]
fn scan_reports_progress_between_batches() {
    let centres: Vec<(f32, f32)> = (0..60).map(|i| (i as f32 / 100.0, 0.2)).collect();
    let mesh = MeshGeometry::new(&[triangles_at(&centres)], top_camera()).unwrap();
    let mut session = SelectionSession::new();
    let mut labeler = Labeler::default();

    draw(&mut labeler, &mesh, &mut session, &[(-0.01, 0.18), (0.505, 0.18), (0.505, 0.25), (-0.01, 0.25)]);
    labeler.secondary_click(&mesh, &mut session).unwrap();

    let mut seen = Vec::new();
    while let Some(progress) = labeler.progress() {
        seen.push(progress);
        labeler.poll(&mesh, &mut session);
    }
    assert_eq!(seen.first(), Some(&0));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen.len(), 20);
    assert_eq!(labeler.state(), LifecycleState::Finalized);
    assert_eq!(session.finalized_faces(), &(0..51).collect::<FaceSet>());
}

#[test]
fn cancel_during_scan_returns_to_idle() {
    let mesh = scenario_mesh();
    let mut session = SelectionSession::new();
    let mut labeler = Labeler::default();

    draw(&mut labeler, &mesh, &mut session, &SQUARE);
    labeler.secondary_click(&mesh, &mut session).unwrap();
    assert_eq!(labeler.cancel(&mut session).unwrap(), LifecycleState::Idle);
    assert_eq!(labeler.poll(&mesh, &mut session), LifecycleState::Idle);
    assert!(session.pending_faces().is_empty());
    assert!(labeler.capture().is_empty());
}

#[test]
fn finalized_selection_accumulates_and_is_labeled() {
    let mesh = MeshGeometry::new(
        &[triangles_at(&[(0.0, 0.0), (0.9, 0.9)]), triangles_at(&[(0.5, 0.5)])],
        top_camera(),
    )
    .unwrap();
    let mut session = SelectionSession::new();
    let mut store = LabelStore::new();
    let mut labeler = Labeler::default();

    draw(&mut labeler, &mesh, &mut session, &[(-0.02, -0.02), (0.1, -0.02), (0.1, 0.1), (-0.02, 0.1)]);
    labeler.secondary_click(&mesh, &mut session).unwrap();
    labeler.resolve_blocking(&mesh, &mut session);
    assert_eq!(session.finalized_faces(), &set(&[0]));

    // Cancel keeps the finalized set; a second polygon adds to it.
    labeler.cancel(&mut session).unwrap();
    draw(&mut labeler, &mesh, &mut session, &[(0.8, 0.8), (0.95, 0.8), (0.95, 0.95), (0.8, 0.95)]);
    labeler.secondary_click(&mesh, &mut session).unwrap();
    labeler.resolve_blocking(&mesh, &mut session);
    assert_eq!(session.finalized_faces(), &set(&[0, 1]));

    let state = labeler.primary_click(&mesh, &mut session, Point2::new(0.0, 0.0));
    assert_eq!(state, LifecycleState::LabelPrompt);
    assert!(matches!(
        labeler.cancel(&mut session),
        Err(Error::InvalidState { .. })
    ));
    // Point capture is blocked while the prompt is open.
    labeler.primary_click(&mesh, &mut session, Point2::new(0.1, 0.1));
    assert!(labeler.capture().is_empty());

    let outcome = labeler
        .confirm_prompt(&mut store, &mut session, Some("  Trench A "))
        .unwrap();
    assert!(matches!(outcome, PromptOutcome::Assigned(ref a) if a.label == "Trench A"));
    assert_eq!(labeler.state(), LifecycleState::Cleared);
    assert!(session.pending_faces().is_empty());
    assert_eq!(store.entry("Trench A").unwrap().face_set(), set(&[0, 1]));
    assert_eq!(store.label_of(2), None);

    // Sub-mesh numbering: the second sub-mesh's face is global index 2.
    assert_eq!(mesh.face_ranges().locate(2), Some((1, 0)));

    // Cleared accepts a new polygon straight away.
    let state = labeler.primary_click(&mesh, &mut session, Point2::new(0.5, 0.5));
    assert_eq!(state, LifecycleState::Drawing);
}

#[test]
fn declining_or_blank_label_discards_selection() {
    let mesh = scenario_mesh();
    let mut store = LabelStore::new();

    for answer in [None, Some("   ")] {
        let mut session = SelectionSession::new();
        let mut labeler = Labeler::default();
        draw(&mut labeler, &mesh, &mut session, &SQUARE);
        labeler.secondary_click(&mesh, &mut session).unwrap();
        labeler.resolve_blocking(&mesh, &mut session);
        labeler.primary_click(&mesh, &mut session, Point2::new(0.0, 0.0));

        let outcome = labeler.confirm_prompt(&mut store, &mut session, answer).unwrap();
        assert_eq!(outcome, PromptOutcome::Discarded);
        assert!(session.pending_faces().is_empty());
    }

    let mut session = SelectionSession::new();
    let mut labeler = Labeler::default();
    draw(&mut labeler, &mesh, &mut session, &SQUARE);
    labeler.secondary_click(&mesh, &mut session).unwrap();
    labeler.resolve_blocking(&mesh, &mut session);
    labeler.primary_click(&mesh, &mut session, Point2::new(0.0, 0.0));
    assert_eq!(labeler.decline_prompt(&mut session).unwrap(), LifecycleState::Cleared);

    assert!(store.entries().is_empty());
}

#[test]
fn live_drag_selection_uses_edge_overlap() {
    // A wide triangle whose centroid sits outside the drawn square but whose
    // left corner pokes into it.
    let wide = SubMesh::new(vec![0.45, 0.0, 0.0, 0.95, 0.0, 0.0, 0.95, 0.3, 0.0], vec![0, 1, 2]);
    let mesh = MeshGeometry::new(&[triangles_at(&[(0.0, 0.0)]), wide], top_camera()).unwrap();
    let mut session = SelectionSession::new();
    let mut labeler = Labeler::default();
    let viewport = Viewport::new(640.0, 480.0);

    draw(&mut labeler, &mesh, &mut session, &[(-0.02, -0.02), (0.5, -0.02), (0.5, 0.1), (-0.02, 0.1)]);
    let live = labeler.live_selection(&mesh, &mut session, &viewport);
    assert_eq!(live, 2);
    assert_eq!(session.selected_faces(), &set(&[0, 1]));

    labeler.secondary_click(&mesh, &mut session).unwrap();
    labeler.resolve_blocking(&mesh, &mut session);
    assert_eq!(session.finalized_faces(), &set(&[0]));
    assert_eq!(labeler.live_selection(&mesh, &mut session, &viewport), 0);
}

#[test]
fn reload_discards_everything_tied_to_face_numbering() {
    let mesh = scenario_mesh();
    let mut session = SelectionSession::new();
    let mut labeler = Labeler::default();

    draw(&mut labeler, &mesh, &mut session, &SQUARE);
    labeler.secondary_click(&mesh, &mut session).unwrap();
    labeler.resolve_blocking(&mesh, &mut session);
    labeler.reload_mesh(&mut session);

    assert_eq!(labeler.state(), LifecycleState::Idle);
    assert!(session.pending_faces().is_empty());
    assert!(labeler.capture().bounds().is_none());
}

#[test]
fn resumable_scan_can_be_driven_directly() {
    let mesh = scenario_mesh();
    let polygon: Vec<Point2<f64>> = SQUARE.iter().map(|&(x, y)| Point2::new(x, y)).collect();
    let mut scan =
        facemark_selection::CentroidScan::new(polygon, mesh.face_count(), &Default::default()).unwrap();
    assert_eq!(scan.step(&mesh), ScanStatus::InProgress { progress: 50 });
    assert_eq!(scan.step(&mesh), ScanStatus::Finished);
    assert_eq!(scan.into_selected(), set(&[0]));
}
