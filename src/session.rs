use std::time::{Duration, Instant, SystemTime};

use eframe::egui::Vec2;
use rand::Rng;
use tracing::{debug, info};

use crate::config::SimulationSettings;
use crate::lattice::{generate_nodes, inject_mass};
use crate::metrics::calculate_metrics;
use crate::render::{ViewMode, ViewTransform};
use crate::timestamp;
use crate::types::{AbcParams, Node, SimulationConfig, SimulationResult, ValidationMetrics};

/// Every user-driven change to the simulator goes through one of these.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    SetParams(AbcParams),
    SetNodeCount(usize),
    Run,
    InjectMass,
    Reset,
    SetViewMode(ViewMode),
    Pan(Vec2),
    Zoom { factor: f32, anchor: Vec2 },
}

/// A Run that has been accepted but whose lattice is not shown yet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingGeneration {
    pub ready_at: Instant,
    pub node_count: usize,
    pub params: AbcParams,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewState {
    pub mode: ViewMode,
    pub transform: ViewTransform,
}

#[derive(Clone, Debug)]
pub struct SimulatorState {
    params: AbcParams,
    node_count: usize,
    max_node_count: usize,
    latency: Duration,
    nodes: Vec<Node>,
    generated_at: Option<String>,
    pending: Option<PendingGeneration>,
    view: ViewState,
}

impl SimulatorState {
    pub fn new(settings: &SimulationSettings) -> Self {
        Self {
            params: settings.params,
            node_count: settings.node_count.min(settings.max_node_count),
            max_node_count: settings.max_node_count,
            latency: Duration::from_millis(settings.latency_ms),
            nodes: Vec::new(),
            generated_at: None,
            pending: None,
            view: ViewState::default(),
        }
    }

    pub fn params(&self) -> &AbcParams {
        &self.params
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn max_node_count(&self) -> usize {
        self.max_node_count
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&PendingGeneration> {
        self.pending.as_ref()
    }

    pub fn metrics(&self) -> Option<ValidationMetrics> {
        calculate_metrics(&self.params, &self.nodes)
    }

    /// Assembles the current snapshot, or `None` before the first generation.
    pub fn session(&self) -> Option<SimulationResult> {
        let metrics = self.metrics()?;
        let timestamp = self.generated_at.clone()?;
        Some(SimulationResult {
            nodes: self.nodes.clone(),
            timestamp,
            config: SimulationConfig {
                node_count: self.node_count,
                params: self.params,
            },
            metrics,
        })
    }

    pub fn apply<R: Rng + ?Sized>(&mut self, command: Command, now: Instant, rng: &mut R) {
        match command {
            Command::SetParams(params) => self.params = params,
            Command::SetNodeCount(count) => self.node_count = count.min(self.max_node_count),
            Command::Run => {
                if self.pending.is_some() {
                    debug!("generation already in flight, ignoring run");
                    return;
                }
                info!(
                    node_count = self.node_count,
                    latency_ms = self.latency.as_millis() as u64,
                    "generation scheduled"
                );
                self.pending = Some(PendingGeneration {
                    ready_at: now + self.latency,
                    node_count: self.node_count,
                    params: self.params,
                });
            }
            Command::InjectMass => {
                if self.nodes.is_empty() {
                    debug!("no lattice to perturb");
                    return;
                }
                self.nodes = inject_mass(&self.nodes, rng);
                let excited = self.nodes.iter().filter(|n| n.excited).count();
                info!(excited, total = self.nodes.len(), "mass injected");
            }
            Command::Reset => {
                // An in-flight generation is not cancelled and will still land.
                self.nodes.clear();
                self.generated_at = None;
                self.view = ViewState::default();
                info!("lattice reset");
            }
            Command::SetViewMode(mode) => self.view.mode = mode,
            Command::Pan(delta) => self.view.transform.pan(delta),
            Command::Zoom { factor, anchor } => self.view.transform.zoom_at(factor, anchor),
        }
    }

    /// Completes a pending generation once its deadline has passed.
    ///
    /// Returns `true` when a new lattice was produced.
    pub fn poll<R: Rng + ?Sized>(&mut self, now: Instant, wall: SystemTime, rng: &mut R) -> bool {
        let Some(pending) = self.pending else {
            return false;
        };
        if now < pending.ready_at {
            return false;
        }

        self.pending = None;
        self.nodes = generate_nodes(pending.node_count, &pending.params, rng);
        self.generated_at = Some(timestamp::iso8601(wall));
        info!(nodes = self.nodes.len(), "lattice generated");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn state() -> SimulatorState {
        SimulatorState::new(&SimulationSettings::default())
    }

    #[test]
    fn run_is_deferred_until_deadline() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sim = state();
        let t0 = Instant::now();

        sim.apply(Command::Run, t0, &mut rng);
        assert!(sim.is_pending());
        assert!(!sim.poll(t0 + Duration::from_millis(599), SystemTime::now(), &mut rng));
        assert!(sim.nodes().is_empty());
        assert!(sim.session().is_none());

        assert!(sim.poll(t0 + Duration::from_millis(600), SystemTime::now(), &mut rng));
        assert!(!sim.is_pending());
        assert_eq!(sim.nodes().len(), 800);
        assert!(sim.session().is_some());
    }

    #[test]
    fn second_run_while_pending_is_ignored() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut sim = state();
        let t0 = Instant::now();
        sim.apply(Command::Run, t0, &mut rng);
        sim.apply(Command::SetNodeCount(5), t0, &mut rng);
        sim.apply(Command::Run, t0 + Duration::from_millis(300), &mut rng);

        let pending = *sim.pending().unwrap();
        assert_eq!(pending.ready_at, t0 + Duration::from_millis(600));
        assert_eq!(pending.node_count, 800);
    }

    #[test]
    fn generation_uses_params_captured_at_run() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sim = state();
        let t0 = Instant::now();
        let original = *sim.params();
        sim.apply(Command::SetNodeCount(9), t0, &mut rng);
        sim.apply(Command::Run, t0, &mut rng);

        let changed = AbcParams { a: 0.17, ..original };
        sim.apply(Command::SetParams(changed), t0, &mut rng);
        sim.poll(t0 + Duration::from_secs(1), SystemTime::now(), &mut rng);

        assert_eq!(sim.nodes()[0].energy, original.a);
        // the session reports the live params, which drive the metrics
        assert_eq!(sim.session().unwrap().config.params, changed);
    }

    #[test]
    fn inject_and_reset_without_lattice_are_no_ops() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut sim = state();
        let now = Instant::now();
        sim.apply(Command::InjectMass, now, &mut rng);
        assert!(sim.nodes().is_empty());
        sim.apply(Command::Reset, now, &mut rng);
        assert!(sim.session().is_none());
    }

    #[test]
    fn reset_clears_lattice_and_view() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut sim = state();
        let t0 = Instant::now();
        sim.apply(Command::Run, t0, &mut rng);
        sim.poll(t0 + Duration::from_secs(1), SystemTime::now(), &mut rng);
        sim.apply(Command::SetViewMode(ViewMode::DataArray), t0, &mut rng);
        sim.apply(
            Command::Zoom {
                factor: 4.0,
                anchor: Vec2::new(10.0, 10.0),
            },
            t0,
            &mut rng,
        );
        sim.apply(Command::Pan(Vec2::new(3.0, 4.0)), t0, &mut rng);
        assert_ne!(*sim.view(), ViewState::default());

        sim.apply(Command::Reset, t0, &mut rng);
        assert!(sim.nodes().is_empty());
        assert_eq!(*sim.view(), ViewState::default());
    }

    #[test]
    fn node_count_is_clamped() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut sim = state();
        sim.apply(Command::SetNodeCount(1_000_000), Instant::now(), &mut rng);
        assert_eq!(sim.node_count(), sim.max_node_count());
    }

    #[test]
    fn metrics_follow_live_params() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut sim = state();
        let t0 = Instant::now();
        sim.apply(Command::Run, t0, &mut rng);
        sim.poll(t0 + Duration::from_secs(1), SystemTime::now(), &mut rng);
        let before = sim.metrics().unwrap();

        let params = AbcParams {
            alpha_s: 0.2,
            ..*sim.params()
        };
        sim.apply(Command::SetParams(params), t0, &mut rng);
        assert_ne!(sim.metrics().unwrap(), before);
    }
}
