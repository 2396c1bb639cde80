// ============================================================
// Layer 5.5 — Hyperparameter Search Space
// ============================================================
// Declares the legal hyperparameter ranges and the optimisation
// direction. This is the whole of this component's job: the
// trial loop, the sampling strategy, and the bookkeeping all
// belong to the tuner (an opaque service from the pipeline's
// point of view).
//
// The searched parameters:
//   learn_rate    — quantized continuous range
//   weight_decay  — quantized continuous range
//   scheduler     — categorical over the fixed scheduler kinds
//   batch_size    — singleton categorical: effectively fixed,
//                   present so the space covers every tunable
//                   knob uniformly
//
// Reference: Bergstra et al. (2011) Algorithms for
//            Hyper-Parameter Optimization

use rand::rngs::StdRng;
use rand::Rng;
use std::collections::HashMap;

use crate::ml::schedule::SchedulerKind;

/// A sampled hyperparameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Float(f64),
    Choice(String),
}

/// The legal domain of one hyperparameter.
#[derive(Debug, Clone)]
pub enum ParamDomain {
    /// Continuous range quantized to multiples of `step`
    /// above `low` (both endpoints legal).
    Quantized { low: f64, high: f64, step: f64 },
    /// Fixed enumerated choices. A single entry pins the
    /// parameter while keeping it visible in the space.
    Categorical(Vec<String>),
}

impl ParamDomain {
    /// Draw one value uniformly from the domain.
    pub fn sample(&self, rng: &mut StdRng) -> ParamValue {
        match self {
            ParamDomain::Quantized { low, high, step } => {
                let steps = ((high - low) / step).round() as usize;
                let k = rng.gen_range(0..=steps);
                ParamValue::Float((low + k as f64 * step).min(*high))
            }
            ParamDomain::Categorical(choices) => {
                ParamValue::Choice(choices[rng.gen_range(0..choices.len())].clone())
            }
        }
    }

    /// Whether `value` is legal under this domain.
    pub fn contains(&self, value: &ParamValue) -> bool {
        match (self, value) {
            (ParamDomain::Quantized { low, high, step }, ParamValue::Float(v)) => {
                if *v < low - 1e-12 || *v > high + 1e-12 {
                    return false;
                }
                let k = (v - low) / step;
                (k - k.round()).abs() < 1e-6
            }
            (ParamDomain::Categorical(choices), ParamValue::Choice(c)) => {
                choices.iter().any(|x| x == c)
            }
            _ => false,
        }
    }
}

/// Optimisation direction of the objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Minimize,
    Maximize,
}

/// An ordered name → domain mapping. Insertion order is kept
/// so repeated runs sample parameters in the same sequence.
pub struct SearchSpace {
    entries:   Vec<(String, ParamDomain)>,
    direction: Direction,
}

impl SearchSpace {
    pub fn new(direction: Direction) -> Self {
        Self { entries: Vec::new(), direction }
    }

    pub fn add(&mut self, name: &str, domain: ParamDomain) {
        self.entries.push((name.to_string(), domain));
    }

    pub fn get(&self, name: &str) -> Option<&ParamDomain> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamDomain)> {
        self.entries.iter().map(|(n, d)| (n, d))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The objective direction — validation loss is minimised.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// One full candidate configuration drawn uniformly.
    pub fn sample(&self, rng: &mut StdRng) -> HashMap<String, ParamValue> {
        self.entries
            .iter()
            .map(|(name, domain)| (name.clone(), domain.sample(rng)))
            .collect()
    }

    /// The space searched over a training run: learning rate,
    /// weight decay, scheduler kind, and the (fixed) batch size.
    pub fn default_space(batch_size: usize) -> Self {
        let mut space = Self::new(Direction::Minimize);
        space.add("learn_rate",   ParamDomain::Quantized { low: 1e-5, high: 5e-4, step: 1e-5 });
        space.add("weight_decay", ParamDomain::Quantized { low: 0.0,  high: 0.1,  step: 0.01 });
        space.add(
            "scheduler",
            ParamDomain::Categorical(
                SchedulerKind::ALL.iter().map(|k| k.as_str().to_string()).collect(),
            ),
        );
        space.add("batch_size", ParamDomain::Categorical(vec![batch_size.to_string()]));
        space
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_default_space_shape() {
        let space = SearchSpace::default_space(8);
        assert_eq!(space.len(), 4);
        assert_eq!(space.direction(), Direction::Minimize);
        assert!(space.get("learn_rate").is_some());
        assert!(space.get("weight_decay").is_some());
        assert!(space.get("scheduler").is_some());
        assert!(space.get("batch_size").is_some());
    }

    #[test]
    fn test_quantized_samples_stay_on_grid() {
        let domain = ParamDomain::Quantized { low: 1e-5, high: 5e-4, step: 1e-5 };
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let v = domain.sample(&mut rng);
            assert!(domain.contains(&v), "off-grid sample: {v:?}");
        }
    }

    #[test]
    fn test_singleton_categorical_always_pins_the_value() {
        let domain = ParamDomain::Categorical(vec!["8".to_string()]);
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..10 {
            assert_eq!(domain.sample(&mut rng), ParamValue::Choice("8".to_string()));
        }
    }

    #[test]
    fn test_contains_rejects_out_of_domain_values() {
        let quantized = ParamDomain::Quantized { low: 0.0, high: 0.1, step: 0.01 };
        assert!(quantized.contains(&ParamValue::Float(0.05)));
        assert!(!quantized.contains(&ParamValue::Float(0.055)));
        assert!(!quantized.contains(&ParamValue::Float(0.2)));

        let cat = ParamDomain::Categorical(vec!["cosine".into(), "linear".into()]);
        assert!(cat.contains(&ParamValue::Choice("cosine".into())));
        assert!(!cat.contains(&ParamValue::Choice("warmup".into())));
    }

    #[test]
    fn test_full_sample_is_legal_and_deterministic() {
        let space = SearchSpace::default_space(8);

        let a = space.sample(&mut StdRng::seed_from_u64(3));
        let b = space.sample(&mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);

        for (name, domain) in space.iter() {
            assert!(domain.contains(&a[name]), "illegal sample for {name}");
        }
    }
}
