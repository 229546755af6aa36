use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, RichText, Sense, Stroke, Vec2};

use crate::render::{self, ViewMode};
use crate::session::{Command, ViewState};
use crate::types::Node;

const BACKGROUND: Color32 = Color32::from_rgb(4, 4, 6);
const HINT: Color32 = Color32::from_rgb(70, 70, 80);
const MATRIX_GREEN: Color32 = Color32::from_rgb(16, 185, 129);
const ZOOM_PER_SCROLL_POINT: f32 = 0.0025;

/// Paints the lattice in the current mode and reports pan/zoom gestures as commands.
pub fn lattice_canvas(ui: &mut egui::Ui, nodes: &[Node], view: &ViewState) -> Vec<Command> {
    if view.mode == ViewMode::DataArray {
        data_array(ui, nodes);
        return Vec::new();
    }

    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
    let rect = response.rect;
    painter.rect_filled(rect, 0.0, BACKGROUND);

    let transform = view.transform;
    let glyphs = render::project(nodes, view.mode, rect.size());
    let to_screen = |local: Pos2| rect.min + transform.apply(local).to_vec2();

    for glyph in &glyphs {
        let stroke = glyph
            .stroke
            .map(|s| Stroke::new(s.width * transform.scale, s.color))
            .unwrap_or(Stroke::NONE);
        painter.circle(
            to_screen(glyph.center),
            glyph.radius * transform.scale,
            glyph.fill,
            stroke,
        );
    }

    painter.text(
        rect.right_bottom() - egui::vec2(12.0, 8.0),
        Align2::RIGHT_BOTTOM,
        "PAN: DRAG  ZOOM: SCROLL  HOVER: INSPECT",
        FontId::monospace(9.0),
        HINT,
    );

    let pointer = response.hover_pos();
    let drag = response.dragged().then(|| response.drag_delta());
    let (scroll, pinch) = ui.input(|i| (i.smooth_scroll_delta.y, i.zoom_delta()));
    let commands = gesture_commands(rect, drag, pointer, scroll, pinch);

    let hovered = pointer
        .and_then(|pos| render::hit_test(&glyphs, transform.invert((pos - rect.min).to_pos2())))
        .map(|i| &glyphs[i]);
    if let Some(glyph) = hovered {
        painter.circle_stroke(
            to_screen(glyph.center),
            glyph.radius * transform.scale + 2.0,
            Stroke::new(1.0, Color32::WHITE),
        );
        let node = nodes[glyph.index];
        response.on_hover_ui_at_pointer(|ui| inspector(ui, &node));
    }

    commands
}

/// Drag pans; scroll and pinch zoom around the pointer, in canvas-local coordinates.
///
/// Zoom is only reported while the pointer is over `rect`.
fn gesture_commands(
    rect: Rect,
    drag: Option<Vec2>,
    pointer: Option<Pos2>,
    scroll: f32,
    pinch: f32,
) -> Vec<Command> {
    let mut commands = Vec::new();
    if let Some(delta) = drag {
        commands.push(Command::Pan(delta));
    }

    if let Some(pos) = pointer {
        let factor = pinch * (scroll * ZOOM_PER_SCROLL_POINT).exp();
        if (factor - 1.0).abs() > f32::EPSILON {
            commands.push(Command::Zoom {
                factor,
                anchor: pos - rect.min,
            });
        }
    }
    commands
}

fn inspector(ui: &mut egui::Ui, node: &Node) {
    let state_color = if node.excited {
        Color32::from_rgb(248, 113, 113)
    } else {
        Color32::GRAY
    };
    egui::Grid::new("node_inspector")
        .num_columns(2)
        .spacing([16.0, 4.0])
        .show(ui, |ui| {
            for (label, value) in render::inspect(node) {
                ui.label(RichText::new(label).small().color(Color32::GRAY));
                let value = RichText::new(value).monospace();
                if label == "State" {
                    ui.label(value.color(state_color).strong());
                } else {
                    ui.label(value);
                }
                ui.end_row();
            }
        });
}

fn data_array(ui: &mut egui::Ui, nodes: &[Node]) {
    egui::Frame::NONE.fill(BACKGROUND).show(ui, |ui| {
        egui::ScrollArea::both()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.label(
                    RichText::new(render::data_array(nodes))
                        .monospace()
                        .size(10.0)
                        .color(MATRIX_GREEN),
                );
            });
    });
}

/// Swatches for the three ground categories.
pub fn legend(ui: &mut egui::Ui) {
    use crate::types::Category;

    ui.horizontal(|ui| {
        for category in Category::ALL {
            let color = render::category_color(category, false);
            ui.colored_label(color, "●");
            ui.label(RichText::new(format!("potential '{}'", category.letter(false))).small());
        }
        ui.separator();
        ui.label(RichText::new("radius ∝ E").small().italics());
    });
}
