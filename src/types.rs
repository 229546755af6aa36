use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbcParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub alpha_w: f64,
    pub alpha_s: f64,
}

impl Default for AbcParams {
    fn default() -> Self {
        Self {
            a: 0.159155,
            b: 0.158456,
            c: 0.158456,
            alpha: 0.007297,
            alpha_w: 0.0339,
            alpha_s: 0.118,
        }
    }
}

impl AbcParams {
    /// Base energy carried by nodes of the given category.
    pub fn energy_of(&self, category: Category) -> f64 {
        match category {
            Category::A => self.a,
            Category::B => self.b,
            Category::C => self.c,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    A,
    B,
    C,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::A, Category::B, Category::C];

    pub fn letter(self, excited: bool) -> char {
        let lower = match self {
            Category::A => 'a',
            Category::B => 'b',
            Category::C => 'c',
        };
        if excited {
            lower.to_ascii_uppercase()
        } else {
            lower
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub id: usize,
    pub category: Category,
    pub energy: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub excited: bool,
}

impl Node {
    /// One of `a b c` for ground nodes, `A B C` once excited.
    pub fn symbol(&self) -> char {
        self.category.letter(self.excited)
    }

    pub fn distance_from_origin(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    pub predicted: f64,
    pub actual: f64,
    pub error: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValidationMetrics {
    pub electron_mass: Prediction,
    pub proton_mass: Prediction,
    pub gravity: Prediction,
    pub match_percentage: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
    pub node_count: usize,
    pub params: AbcParams,
}

/// Snapshot of one generation: nodes, the configuration behind them and the derived metrics.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationResult {
    pub nodes: Vec<Node>,
    pub timestamp: String,
    pub config: SimulationConfig,
    pub metrics: ValidationMetrics,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excited_symbol_is_upper_case() {
        assert_eq!(Category::B.letter(false), 'b');
        assert_eq!(Category::B.letter(true), 'B');
    }

    #[test]
    fn energy_lookup_follows_category() {
        let params = AbcParams {
            a: 1.0,
            b: 2.0,
            c: 3.0,
            ..AbcParams::default()
        };
        let energies: Vec<f64> = Category::ALL.iter().map(|c| params.energy_of(*c)).collect();
        assert_eq!(energies, vec![1.0, 2.0, 3.0]);
    }
}
