use crate::types::{AbcParams, Node, Prediction, ValidationMetrics};

pub const ELECTRON_SCALE: f64 = 650.0;
pub const PROTON_SCALE: f64 = 1200.0;
pub const GRAVITY_NORMALISER: f64 = 0.476;
pub const G_BASE: f64 = 6.6743e-11;

pub const ELECTRON_MASS_MEV: f64 = 0.5109;
pub const PROTON_MASS_MEV: f64 = 938.27;
pub const G_MEASURED: f64 = 6.6743e-11;

/// Closed-form predictions against the reference constants.
///
/// Only the parameters feed the formulas; the node list merely gates whether a session
/// exists. Returns `None` before anything has been generated.
pub fn calculate_metrics(params: &AbcParams, nodes: &[Node]) -> Option<ValidationMetrics> {
    if nodes.is_empty() {
        return None;
    }

    let electron = (params.a - params.b - params.c).abs() * params.alpha * ELECTRON_SCALE;
    let proton = (2.0 * params.a + params.b) * params.alpha_s * PROTON_SCALE;
    let gravity = G_BASE * ((params.a + params.b + params.c) / GRAVITY_NORMALISER);

    let electron_mass = compare(electron, ELECTRON_MASS_MEV);
    let proton_mass = compare(proton, PROTON_MASS_MEV);
    let gravity = compare(gravity, G_MEASURED);

    let mean_error = (electron_mass.error + proton_mass.error + gravity.error) / 3.0;

    Some(ValidationMetrics {
        electron_mass,
        proton_mass,
        gravity,
        match_percentage: (100.0 - mean_error).max(0.0),
    })
}

fn compare(predicted: f64, actual: f64) -> Prediction {
    Prediction {
        predicted,
        actual,
        error: (predicted - actual).abs() / actual * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::generate_nodes;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn nodes(count: usize) -> Vec<Node> {
        let mut rng = StdRng::seed_from_u64(99);
        generate_nodes(count, &AbcParams::default(), &mut rng)
    }

    #[test]
    fn no_metrics_without_nodes() {
        assert!(calculate_metrics(&AbcParams::default(), &[]).is_none());
    }

    #[test]
    fn default_baseline_is_partial_match() {
        let metrics = calculate_metrics(&AbcParams::default(), &nodes(800)).unwrap();
        assert!(metrics.match_percentage > 0.0 && metrics.match_percentage < 100.0);

        assert_relative_eq!(metrics.electron_mass.predicted, 0.748249, epsilon = 1e-5);
        assert_relative_eq!(metrics.proton_mass.predicted, 67.51007, epsilon = 1e-4);
        assert_relative_eq!(metrics.match_percentage, 53.5747, epsilon = 1e-3);
    }

    #[test]
    fn node_contents_do_not_matter() {
        let params = AbcParams::default();
        let small = calculate_metrics(&params, &nodes(3)).unwrap();
        let large = calculate_metrics(&params, &nodes(500)).unwrap();
        assert_eq!(small, large);
    }

    #[test]
    fn match_is_floored_at_zero() {
        let params = AbcParams {
            a: 10.0,
            b: 0.0,
            c: 0.0,
            alpha: 1.0,
            alpha_w: 0.0,
            alpha_s: 1.0,
        };
        let metrics = calculate_metrics(&params, &nodes(1)).unwrap();
        assert_eq!(metrics.match_percentage, 0.0);
    }

    #[test]
    fn exact_gravity_gives_zero_error() {
        let params = AbcParams {
            a: 0.2,
            b: 0.138,
            c: 0.138,
            ..AbcParams::default()
        };
        let metrics = calculate_metrics(&params, &nodes(1)).unwrap();
        assert_relative_eq!(metrics.gravity.error, 0.0, epsilon = 1e-9);
        assert_eq!(metrics.gravity.actual, G_MEASURED);
    }
}
