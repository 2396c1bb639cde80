// ============================================================
// Layer 5.5 — Hyperparameter Tuner
// ============================================================
// Runs seeded trials against an objective closure (one full
// training run per trial) and minimises the final validation
// loss. The sampling strategy sits behind the TrialSampler
// trait; the pipeline only defines the space and hands over
// the objective.
//
// The default sampler is TPE-flavoured: after a few uniform
// startup trials it splits the history at the gamma quantile
// into good/bad sets and prefers candidates where the Parzen
// density of good observations dominates the density of bad
// ones. Categorical choices are weighted by their frequency in
// the good set.
//
// Reference: Bergstra et al. (2011) Algorithms for
//            Hyper-Parameter Optimization (TPE)

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use super::search_space::{Direction, ParamDomain, ParamValue, SearchSpace};

/// Result of a tuning session.
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub best_params:    HashMap<String, ParamValue>,
    pub best_objective: f64,
    pub trials_run:     usize,
}

/// The sampling strategy seam. The tuner drives it; the
/// pipeline never sees past this trait.
pub trait TrialSampler {
    fn suggest(&mut self, space: &SearchSpace) -> HashMap<String, ParamValue>;

    fn observe(&mut self, params: HashMap<String, ParamValue>, objective: f64);
}

// ─── TpeSampler ───────────────────────────────────────────────────────────────
pub struct TpeSampler {
    rng:            StdRng,
    history:        Vec<(HashMap<String, ParamValue>, f64)>,
    startup_trials: usize,
    /// Quantile separating "good" from "bad" observations
    gamma:          f64,
    /// Candidates scored per quantized parameter
    candidates:     usize,
}

impl TpeSampler {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng:            StdRng::seed_from_u64(seed),
            history:        Vec::new(),
            startup_trials: 5,
            gamma:          0.25,
            candidates:     16,
        }
    }

    /// Observed values of one float parameter, split at the
    /// gamma quantile of the objective (lower is better).
    fn split_floats(&self, name: &str) -> (Vec<f64>, Vec<f64>) {
        let mut ranked: Vec<&(HashMap<String, ParamValue>, f64)> = self.history.iter().collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

        let good_count = ((ranked.len() as f64 * self.gamma).ceil() as usize).max(1);
        let value_of = |entry: &&(HashMap<String, ParamValue>, f64)| -> Option<f64> {
            match entry.0.get(name) {
                Some(ParamValue::Float(v)) => Some(*v),
                _ => None,
            }
        };

        let good = ranked[..good_count].iter().filter_map(value_of).collect();
        let bad  = ranked[good_count..].iter().filter_map(value_of).collect();
        (good, bad)
    }

    fn split_choices(&self, name: &str) -> HashMap<String, usize> {
        let mut ranked: Vec<&(HashMap<String, ParamValue>, f64)> = self.history.iter().collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        let good_count = ((ranked.len() as f64 * self.gamma).ceil() as usize).max(1);

        let mut counts = HashMap::new();
        for entry in &ranked[..good_count] {
            if let Some(ParamValue::Choice(c)) = entry.0.get(name) {
                *counts.entry(c.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    fn suggest_quantized(&mut self, name: &str, domain: &ParamDomain) -> ParamValue {
        let ParamDomain::Quantized { low, high, step } = domain else {
            unreachable!("caller matched the domain kind");
        };
        let (good, bad) = self.split_floats(name);
        if good.is_empty() {
            return domain.sample(&mut self.rng);
        }

        // Kernel bandwidth: wide enough to generalise across
        // neighbouring grid points.
        let bandwidth = ((high - low) / 8.0).max(*step);
        let density = |x: f64, centers: &[f64]| -> f64 {
            if centers.is_empty() {
                return 1.0 / (high - low).max(f64::MIN_POSITIVE);
            }
            centers
                .iter()
                .map(|c| {
                    let z = (x - c) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                / centers.len() as f64
        };

        let mut best: Option<(f64, f64)> = None; // (score, value)
        for _ in 0..self.candidates {
            let ParamValue::Float(x) = domain.sample(&mut self.rng) else { continue };
            let score = density(x, &good) / density(x, &bad).max(1e-12);
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, x));
            }
        }
        ParamValue::Float(best.map(|(_, x)| x).unwrap_or(*low))
    }

    fn suggest_categorical(&mut self, name: &str, domain: &ParamDomain) -> ParamValue {
        let ParamDomain::Categorical(choices) = domain else {
            unreachable!("caller matched the domain kind");
        };
        let counts = self.split_choices(name);

        // Frequency in the good set with add-one smoothing, so
        // unexplored choices stay reachable.
        let weights: Vec<f64> = choices
            .iter()
            .map(|c| (counts.get(c).copied().unwrap_or(0) + 1) as f64)
            .collect();
        let total: f64 = weights.iter().sum();

        let mut pick = self.rng.gen_range(0.0..total);
        for (choice, w) in choices.iter().zip(&weights) {
            if pick < *w {
                return ParamValue::Choice(choice.clone());
            }
            pick -= w;
        }
        ParamValue::Choice(choices.last().expect("non-empty domain").clone())
    }
}

impl TrialSampler for TpeSampler {
    fn suggest(&mut self, space: &SearchSpace) -> HashMap<String, ParamValue> {
        if self.history.len() < self.startup_trials {
            return space.sample(&mut self.rng);
        }

        let names: Vec<(String, ParamDomain)> = space
            .iter()
            .map(|(n, d)| (n.clone(), d.clone()))
            .collect();
        names
            .into_iter()
            .map(|(name, domain)| {
                let value = match domain {
                    ParamDomain::Quantized { .. }  => self.suggest_quantized(&name, &domain),
                    ParamDomain::Categorical(_)    => self.suggest_categorical(&name, &domain),
                };
                (name, value)
            })
            .collect()
    }

    fn observe(&mut self, params: HashMap<String, ParamValue>, objective: f64) {
        self.history.push((params, objective));
    }
}

// ─── Tuner ────────────────────────────────────────────────────────────────────
pub struct Tuner<S: TrialSampler> {
    sampler:  S,
    n_trials: usize,
}

impl Tuner<TpeSampler> {
    pub fn seeded(n_trials: usize, seed: u64) -> Self {
        Self { sampler: TpeSampler::seeded(seed), n_trials }
    }
}

impl<S: TrialSampler> Tuner<S> {
    /// Run the trial loop, minimising the objective.
    /// The objective receives the trial index and the candidate
    /// parameters and returns the value to minimise (final
    /// validation loss).
    pub fn minimize(
        &mut self,
        space:     &SearchSpace,
        mut objective: impl FnMut(usize, &HashMap<String, ParamValue>) -> Result<f64>,
    ) -> Result<TrialOutcome> {
        assert_eq!(space.direction(), Direction::Minimize);

        let mut best: Option<(HashMap<String, ParamValue>, f64)> = None;

        for trial in 0..self.n_trials {
            let params = self.sampler.suggest(space);
            let value  = objective(trial, &params)?;
            tracing::info!("Trial {}/{}: objective={:.4}", trial + 1, self.n_trials, value);

            if best.as_ref().map_or(true, |(_, b)| value < *b) {
                best = Some((params.clone(), value));
            }
            self.sampler.observe(params, value);
        }

        let (best_params, best_objective) =
            best.expect("at least one trial must run");
        Ok(TrialOutcome { best_params, best_objective, trials_run: self.n_trials })
    }
}

/// Read a float parameter out of a candidate configuration.
pub fn float_param(params: &HashMap<String, ParamValue>, name: &str) -> Option<f64> {
    match params.get(name) {
        Some(ParamValue::Float(v)) => Some(*v),
        _ => None,
    }
}

/// Read a categorical parameter out of a candidate configuration.
pub fn choice_param<'a>(params: &'a HashMap<String, ParamValue>, name: &str) -> Option<&'a str> {
    match params.get(name) {
        Some(ParamValue::Choice(c)) => Some(c.as_str()),
        _ => None,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_suggestion_is_legal() {
        let space = SearchSpace::default_space(8);
        let mut sampler = TpeSampler::seeded(5);

        for i in 0..20 {
            let params = sampler.suggest(&space);
            for (name, domain) in space.iter() {
                assert!(domain.contains(&params[name]), "illegal {name} at trial {i}");
            }
            // Objective shaped so the sampler has structure to learn
            let lr = float_param(&params, "learn_rate").unwrap();
            sampler.observe(params, (lr - 2e-4).abs());
        }
    }

    #[test]
    fn test_tuning_session_is_deterministic() {
        let space = SearchSpace::default_space(8);
        let run = |seed: u64| {
            let mut tuner = Tuner::seeded(12, seed);
            tuner
                .minimize(&space, |_, params| {
                    Ok((float_param(params, "learn_rate").unwrap() - 2e-4).abs())
                })
                .unwrap()
        };

        let a = run(42);
        let b = run(42);
        assert_eq!(a.best_params, b.best_params);
        assert_eq!(a.best_objective, b.best_objective);
        assert_eq!(a.trials_run, 12);
    }

    #[test]
    fn test_best_objective_is_minimum_of_observed() {
        let space = SearchSpace::default_space(8);
        let mut seen = Vec::new();
        let mut tuner = Tuner::seeded(8, 7);
        let outcome = tuner
            .minimize(&space, |_, params| {
                let v = float_param(params, "weight_decay").unwrap();
                seen.push(v);
                Ok(v)
            })
            .unwrap();

        let min = seen.iter().cloned().fold(f64::INFINITY, f64::min);
        assert_eq!(outcome.best_objective, min);
    }

    #[test]
    fn test_objective_error_propagates() {
        let space = SearchSpace::default_space(8);
        let mut tuner = Tuner::seeded(3, 1);
        let result = tuner.minimize(&space, |trial, _| {
            if trial == 1 {
                anyhow::bail!("trial exploded");
            }
            Ok(1.0)
        });
        assert!(result.is_err());
    }
}
