use abc_simulator::lattice::{generate_nodes, inject_mass};
use abc_simulator::render::{self, ViewMode, ViewTransform, SLICE_HALF_DEPTH};
use abc_simulator::types::AbcParams;
use eframe::egui::{pos2, vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;

const CANVAS: (f32, f32) = (900.0, 700.0);

#[test]
fn every_mode_stays_consistent_on_a_perturbed_lattice() {
    let mut rng = StdRng::seed_from_u64(42);
    let nodes = generate_nodes(2_000, &AbcParams::default(), &mut rng);
    let nodes = inject_mass(&nodes, &mut rng);
    let canvas = vec2(CANVAS.0, CANVAS.1);

    let topology = render::project(&nodes, ViewMode::Topology, canvas);
    assert_eq!(topology.len(), nodes.len());

    let slice = render::project(&nodes, ViewMode::Projection, canvas);
    let expected = nodes.iter().filter(|n| n.z.abs() < SLICE_HALF_DEPTH).count();
    assert_eq!(slice.len(), expected);
    for glyph in &slice {
        assert_eq!(glyph.stroke.is_some(), nodes[glyph.index].excited);
    }

    assert!(render::project(&nodes, ViewMode::DataArray, canvas).is_empty());
    assert!(render::data_array(&nodes).starts_with("=== LATTICE GEOMETRY ARRAY ==="));
}

#[test]
fn hover_through_zoomed_view_finds_the_drawn_glyph() {
    let mut rng = StdRng::seed_from_u64(8);
    let nodes = generate_nodes(100, &AbcParams::default(), &mut rng);
    let glyphs = render::project(&nodes, ViewMode::Topology, vec2(CANVAS.0, CANVAS.1));

    let mut transform = ViewTransform::default();
    transform.pan(vec2(35.0, -20.0));
    transform.zoom_at(3.0, vec2(450.0, 350.0));

    let target = glyphs.last().unwrap();
    let on_screen = transform.apply(target.center);
    let hit = render::hit_test(&glyphs, transform.invert(on_screen));
    assert_eq!(hit, Some(glyphs.len() - 1));

    assert_eq!(render::hit_test(&glyphs, pos2(-500.0, -500.0)), None);
}
