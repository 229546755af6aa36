use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use eframe::egui::{self, Color32, RichText};
use rand::rngs::ThreadRng;
use tracing::warn;

use crate::assistant::Assistant;
use crate::chat::Conversation;
use crate::config::AppConfig;
use crate::export;
use crate::render::ViewMode;
use crate::session::{Command, SimulatorState};
use crate::types::Role;
use crate::view;

const CYAN: Color32 = Color32::from_rgb(34, 211, 238);
const PURPLE: Color32 = Color32::from_rgb(192, 132, 252);
const RED: Color32 = Color32::from_rgb(248, 113, 113);

pub struct SimulatorApp {
    state: SimulatorState,
    conversation: Conversation,
    rng: ThreadRng,
    export_dir: PathBuf,
    status: Option<String>,
}

impl SimulatorApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        assistant: Arc<dyn Assistant>,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        Self {
            state: SimulatorState::new(&config.simulation),
            conversation: Conversation::new(assistant),
            rng: rand::rng(),
            export_dir: config.export.directory,
            status: None,
        }
    }

    fn apply(&mut self, command: Command) {
        self.state.apply(command, Instant::now(), &mut self.rng);
    }

    fn export(&mut self) {
        let session = self.state.session();
        self.status = match export::export_report(&self.export_dir, session.as_ref(), SystemTime::now()) {
            Ok(Some(path)) => Some(format!("Exported {}", path.display())),
            Ok(None) => None,
            Err(err) => {
                warn!(%err, "export failed");
                Some(format!("Export failed: {err}"))
            }
        };
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("ABC Simulator");
        ui.separator();

        let mut params = *self.state.params();
        ui.label(RichText::new("Fundamental values (m_P)").small().strong().color(CYAN));
        ui.add(param_slider(&mut params.a, 0.150..=0.170, 0.0001, 6).text("a"));
        ui.add(param_slider(&mut params.b, 0.150..=0.170, 0.0001, 6).text("b"));
        ui.add(param_slider(&mut params.c, 0.150..=0.170, 0.0001, 6).text("c"));

        ui.separator();
        ui.label(RichText::new("Couplings (α)").small().strong().color(PURPLE));
        ui.add(param_slider(&mut params.alpha, 0.005..=0.010, 0.00001, 6).text("α (EM)"));
        ui.add(param_slider(&mut params.alpha_w, 0.020..=0.050, 0.0001, 4).text("α_w (weak)"));
        ui.add(param_slider(&mut params.alpha_s, 0.05..=0.20, 0.001, 3).text("α_s (strong)"));
        if params != *self.state.params() {
            self.apply(Command::SetParams(params));
        }

        ui.separator();
        let mut count = self.state.node_count();
        ui.horizontal(|ui| {
            ui.label("nodes");
            ui.add(egui::DragValue::new(&mut count).range(0..=self.state.max_node_count()));
        });
        if count != self.state.node_count() {
            self.apply(Command::SetNodeCount(count));
        }

        ui.add_space(8.0);
        let pending = self.state.is_pending();
        let run_label = if pending {
            "Simulating..."
        } else {
            "Collapse lattice"
        };
        if ui
            .add_enabled(!pending, egui::Button::new(run_label))
            .clicked()
        {
            self.apply(Command::Run);
        }
        if ui
            .button(RichText::new("Inject mass").color(RED))
            .clicked()
        {
            self.apply(Command::InjectMass);
        }

        ui.horizontal(|ui| {
            if ui.button("Export").clicked() {
                self.export();
            }
            if ui.button("Reset").clicked() {
                self.status = None;
                self.apply(Command::Reset);
            }
        });

        if let Some(status) = &self.status {
            ui.separator();
            ui.label(RichText::new(status).small());
        }
    }

    fn draw_metrics(&self, ui: &mut egui::Ui) {
        let Some(metrics) = self.state.metrics() else {
            return;
        };
        ui.horizontal(|ui| {
            ui.label(
                RichText::new(format!("match: {:.1}%", metrics.match_percentage))
                    .strong()
                    .color(CYAN),
            );
            ui.separator();
            ui.label(format!(
                "electron: {:.4} MeV",
                metrics.electron_mass.predicted
            ));
            ui.separator();
            ui.label(format!("proton: {:.2} MeV", metrics.proton_mass.predicted));
            ui.separator();
            ui.label(format!("G: {:.2e}", metrics.gravity.predicted));
        });
        ui.separator();
    }

    fn draw_visuals(&mut self, ui: &mut egui::Ui) {
        self.draw_metrics(ui);

        if self.state.nodes().is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.35);
                ui.heading("ABC vacuum chamber");
                ui.label(
                    RichText::new(
                        "Adjust a, b and c, then collapse the lattice to watch gravity emerge.",
                    )
                    .color(Color32::GRAY),
                );
            });
            return;
        }

        let mut mode = self.state.view().mode;
        ui.horizontal(|ui| {
            for candidate in ViewMode::ALL {
                ui.selectable_value(&mut mode, candidate, candidate.label());
            }
            ui.separator();
            view::legend(ui);
        });
        if mode != self.state.view().mode {
            self.apply(Command::SetViewMode(mode));
        }

        let view_state = *self.state.view();
        let commands = view::lattice_canvas(ui, self.state.nodes(), &view_state);
        for command in commands {
            self.apply(command);
        }
    }

    fn draw_assistant(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Assistant");
            let has_session = !self.state.nodes().is_empty();
            let label = if self.conversation.is_analyzing() {
                "Analysing..."
            } else {
                "Analyse lattice"
            };
            if ui
                .add_enabled(
                    self.conversation.can_analyze(has_session),
                    egui::Button::new(label),
                )
                .clicked()
            {
                self.conversation
                    .request_analysis(self.state.session(), SystemTime::now());
            }
        });
        ui.separator();

        let input_height = 36.0;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .max_height(ui.available_height() - input_height)
            .show(ui, |ui| {
                if self.conversation.messages().is_empty() {
                    ui.label(
                        RichText::new(
                            "The lattice awaits observation. Collapse it or ask about Cartan torsion.",
                        )
                        .italics()
                        .color(Color32::GRAY),
                    );
                }
                for message in self.conversation.messages() {
                    let (who, color) = match message.role {
                        Role::User => ("you", CYAN),
                        Role::Model => ("assistant", Color32::LIGHT_GRAY),
                    };
                    ui.label(
                        RichText::new(format!("{who} · {}", message.timestamp))
                            .small()
                            .color(Color32::DARK_GRAY),
                    );
                    for line in message.content.lines() {
                        if let Some(heading) = line.strip_prefix("###") {
                            ui.label(RichText::new(heading.trim()).strong().color(PURPLE));
                        } else {
                            ui.label(RichText::new(line).color(color));
                        }
                    }
                    ui.add_space(6.0);
                }
                if self.conversation.is_typing() {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(RichText::new("assistant thinking...").small().monospace());
                    });
                }
            });

        ui.separator();
        ui.horizontal(|ui| {
            let edit = ui.add(
                egui::TextEdit::singleline(&mut self.conversation.input)
                    .hint_text("Ask about the physics...")
                    .desired_width(ui.available_width() - 56.0),
            );
            let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let clicked = ui
                .add_enabled(self.conversation.can_send(), egui::Button::new("Send"))
                .clicked();
            if submitted || clicked {
                self.conversation.send(SystemTime::now());
            }
        });
    }
}

fn param_slider(
    value: &mut f64,
    range: std::ops::RangeInclusive<f64>,
    step: f64,
    decimals: usize,
) -> egui::Slider<'_> {
    egui::Slider::new(value, range)
        .step_by(step)
        .fixed_decimals(decimals)
}

impl eframe::App for SimulatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = SystemTime::now();
        self.state.poll(Instant::now(), now, &mut self.rng);
        self.conversation.poll(now);

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(290.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        self.draw_controls(ui);
                    });
            });

        egui::SidePanel::right("assistant")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                self.draw_assistant(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_visuals(ui);
        });

        if self.state.is_pending() || self.conversation.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
    }
}
