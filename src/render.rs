//! Projection of the node list into drawable glyphs and the text array.
//!
//! Everything here is pure: the egui canvas in [`crate::view`] only paints what these
//! functions produce, which keeps depth ordering, scaling and hit testing testable
//! without a window.

use eframe::egui::{Color32, Pos2, Stroke, Vec2};

use crate::types::{Category, Node};

pub const WORLD_EXTENT: f64 = 18.0;

pub const ENERGY_DOMAIN: (f64, f64) = (0.1, 0.45);
pub const RADIUS_RANGE: (f64, f64) = (2.0, 12.0);
pub const RADIUS_EXPONENT: f64 = 1.5;

pub const PERSPECTIVE_DOMAIN: (f64, f64) = (-5.0, 10.0);
pub const PERSPECTIVE_RANGE: (f64, f64) = (0.6, 1.8);
pub const DEPTH_OPACITY_DOMAIN: (f64, f64) = (-10.0, 15.0);
pub const DEPTH_OPACITY_RANGE: (f64, f64) = (0.15, 1.0);

pub const HALO_ENERGY_THRESHOLD: f64 = 0.2;
pub const HALO_WIDTH_PER_ENERGY: f64 = 10.0;
pub const HALO_OPACITY: f32 = 0.4;

pub const SLICE_HALF_DEPTH: f64 = 2.5;
pub const SLICE_OPACITY: f32 = 0.9;
pub const SLICE_OUTLINE_WIDTH: f32 = 1.5;

pub const TEXT_HALF_DEPTH: f64 = 1.0;
pub const TEXT_ARRAY_LIMIT: usize = 500;
pub const TEXT_LINE_STEP: f64 = 0.6;
pub const EXCITED_GLYPH: char = '✸';
pub const GROUND_GLYPH: char = '·';

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 12.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    Topology,
    Projection,
    DataArray,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Topology, ViewMode::Projection, ViewMode::DataArray];

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Topology => "3D topology",
            ViewMode::Projection => "2D projection",
            ViewMode::DataArray => "Data array",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, value: f64) -> f64 {
        let t = (value - self.domain.0) / (self.domain.1 - self.domain.0);
        self.range.0 + t * (self.range.1 - self.range.0)
    }
}

/// Power scale: interpolates linearly between `d0^k` and `d1^k`. Not clamped.
#[derive(Clone, Copy, Debug)]
pub struct PowScale {
    exponent: f64,
    domain: (f64, f64),
    range: (f64, f64),
}

impl PowScale {
    pub fn new(exponent: f64, domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            exponent,
            domain,
            range,
        }
    }

    pub fn map(&self, value: f64) -> f64 {
        let lift = |v: f64| v.signum() * v.abs().powf(self.exponent);
        let (d0, d1) = (lift(self.domain.0), lift(self.domain.1));
        let t = (lift(value) - d0) / (d1 - d0);
        self.range.0 + t * (self.range.1 - self.range.0)
    }
}

pub fn energy_radius(energy: f64) -> f64 {
    PowScale::new(RADIUS_EXPONENT, ENERGY_DOMAIN, RADIUS_RANGE).map(energy)
}

pub fn category_color(category: Category, excited: bool) -> Color32 {
    match (category, excited) {
        (Category::A, false) => Color32::from_rgb(0xef, 0x44, 0x44),
        (Category::B, false) => Color32::from_rgb(0x3b, 0x82, 0xf6),
        (Category::C, false) => Color32::from_rgb(0x10, 0xb9, 0x81),
        (Category::A, true) => Color32::from_rgb(0xfc, 0xa5, 0xa5),
        (Category::B, true) => Color32::from_rgb(0x93, 0xc5, 0xfd),
        (Category::C, true) => Color32::from_rgb(0x6e, 0xe7, 0xb7),
    }
}

fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

/// One circle to paint, in canvas-local coordinates (before pan/zoom).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    /// Position of the source node in the list handed to the projection.
    pub index: usize,
    pub center: Pos2,
    pub radius: f32,
    pub fill: Color32,
    pub stroke: Option<Stroke>,
}

#[derive(Clone, Copy, Debug)]
struct WorldToCanvas {
    x: LinearScale,
    y: LinearScale,
}

impl WorldToCanvas {
    fn new(canvas: Vec2) -> Self {
        let domain = (-WORLD_EXTENT, WORLD_EXTENT);
        Self {
            x: LinearScale::new(domain, (0.0, canvas.x as f64)),
            y: LinearScale::new(domain, (canvas.y as f64, 0.0)),
        }
    }

    fn place(&self, node: &Node) -> Pos2 {
        Pos2::new(self.x.map(node.x) as f32, self.y.map(node.y) as f32)
    }
}

/// Glyphs for the given mode in paint order. The text array has no glyphs.
pub fn project(nodes: &[Node], mode: ViewMode, canvas: Vec2) -> Vec<Glyph> {
    match mode {
        ViewMode::Topology => project_topology(nodes, canvas),
        ViewMode::Projection => project_slice(nodes, canvas),
        ViewMode::DataArray => Vec::new(),
    }
}

/// Pseudo-3D: every node, drawn back to front, sized and faded by depth.
pub fn project_topology(nodes: &[Node], canvas: Vec2) -> Vec<Glyph> {
    let to_canvas = WorldToCanvas::new(canvas);
    let perspective = LinearScale::new(PERSPECTIVE_DOMAIN, PERSPECTIVE_RANGE);
    let depth_opacity = LinearScale::new(DEPTH_OPACITY_DOMAIN, DEPTH_OPACITY_RANGE);

    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by(|&l, &r| nodes[l].z.total_cmp(&nodes[r].z));

    order
        .into_iter()
        .map(|index| {
            let node = &nodes[index];
            let color = category_color(node.category, node.excited);
            let radius = energy_radius(node.energy) * perspective.map(node.z);
            let stroke = (node.energy > HALO_ENERGY_THRESHOLD).then(|| {
                Stroke::new(
                    (node.energy * HALO_WIDTH_PER_ENERGY) as f32,
                    with_opacity(color, HALO_OPACITY),
                )
            });

            Glyph {
                index,
                center: to_canvas.place(node),
                radius: radius as f32,
                fill: with_opacity(color, depth_opacity.map(node.z) as f32),
                stroke,
            }
        })
        .collect()
}

/// Flat slice through `z = 0`; only excited nodes get an outline.
pub fn project_slice(nodes: &[Node], canvas: Vec2) -> Vec<Glyph> {
    let to_canvas = WorldToCanvas::new(canvas);

    nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.z.abs() < SLICE_HALF_DEPTH)
        .map(|(index, node)| Glyph {
            index,
            center: to_canvas.place(node),
            radius: energy_radius(node.energy) as f32,
            fill: with_opacity(category_color(node.category, node.excited), SLICE_OPACITY),
            stroke: node
                .excited
                .then(|| Stroke::new(SLICE_OUTLINE_WIDTH, Color32::WHITE)),
        })
        .collect()
}

/// Character dump of the thin slice around `z = 0`, row by row.
pub fn data_array(nodes: &[Node]) -> String {
    let mut slice: Vec<&Node> = nodes
        .iter()
        .filter(|node| node.z.abs() < TEXT_HALF_DEPTH)
        .take(TEXT_ARRAY_LIMIT)
        .collect();
    slice.sort_by(|l, r| l.y.total_cmp(&r.y).then(l.x.total_cmp(&r.x)));

    let mut out = String::from("=== LATTICE GEOMETRY ARRAY ===\nObservation mode: low-level matrix\n\n");
    let mut line_y = -999.0;
    for node in slice {
        if (node.y - line_y).abs() > TEXT_LINE_STEP {
            out.push('\n');
            line_y = node.y;
        }
        out.push(if node.excited {
            EXCITED_GLYPH
        } else {
            GROUND_GLYPH
        });
        out.push(node.symbol());
        out.push(' ');
    }
    out
}

/// Pan and zoom applied on top of the projected canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub translation: Vec2,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            translation: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn pan(&mut self, delta: Vec2) {
        self.translation += delta;
    }

    /// Multiplies the scale by `factor`, keeping the canvas point under `anchor` fixed.
    pub fn zoom_at(&mut self, factor: f32, anchor: Vec2) {
        let next = (self.scale * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let local = (anchor - self.translation) / self.scale;
        self.translation = anchor - local * next;
        self.scale = next;
    }

    pub fn apply(&self, local: Pos2) -> Pos2 {
        (local.to_vec2() * self.scale + self.translation).to_pos2()
    }

    pub fn invert(&self, canvas: Pos2) -> Pos2 {
        ((canvas.to_vec2() - self.translation) / self.scale).to_pos2()
    }
}

/// Topmost glyph containing `local`, as an index into the glyph slice.
pub fn hit_test(glyphs: &[Glyph], local: Pos2) -> Option<usize> {
    glyphs
        .iter()
        .rposition(|glyph| glyph.center.distance(local) <= glyph.radius.max(1.0))
}

/// Label/value pairs shown by the node inspector.
pub fn inspect(node: &Node) -> Vec<(&'static str, String)> {
    vec![
        ("ID", node.id.to_string()),
        (
            "State",
            if node.excited { "EXCITED" } else { "GROUND" }.to_owned(),
        ),
        ("Symbol", node.symbol().to_ascii_uppercase().to_string()),
        ("Energy (E)", format!("{:.6}", node.energy)),
        ("Curvature (Z)", format!("{:.2}", node.z)),
        ("Local coords", format!("X:{:.2} Y:{:.2}", node.x, node.y)),
    ]
}
