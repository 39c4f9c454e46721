use rand::{rngs::SmallRng, Rng, SeedableRng};

use super::{IndexedModel, SampleRecord, SampleSet, Sampler};
use crate::{helpers::geomspace, log, BinaryQuadraticModel, Result, Vartype};

/// Configuration of the [`SimulatedAnnealingSampler`]
#[derive(Debug, Clone, PartialEq)]
pub struct AnnealConfig {
	/// Number of independent runs, each producing one sample
	pub num_reads: usize,
	/// Number of sweeps over all variables per run, one for every step of the
	/// schedule
	pub num_sweeps: usize,
	/// Initial (hot) and final (cold) inverse temperature. When `None`, the
	/// range is derived from the biases of the model.
	pub beta_range: Option<(f64, f64)>,
	/// Seed for the random number generator, drawn from the system's entropy
	/// when `None`
	pub seed: Option<u64>,
}

impl Default for AnnealConfig {
	fn default() -> Self {
		Self {
			num_reads: 10,
			num_sweeps: 1000,
			beta_range: None,
			seed: None,
		}
	}
}

/// Sampler that uses simulated annealing with single spin Metropolis updates
/// and a geometric schedule of inverse temperatures.
#[derive(Debug, Clone, Default)]
pub struct SimulatedAnnealingSampler {
	config: AnnealConfig,
}

impl SimulatedAnnealingSampler {
	pub fn with_config(mut self, config: AnnealConfig) -> Self {
		self.config = config;
		self
	}

	pub fn config(&self) -> &AnnealConfig {
		&self.config
	}

	fn anneal(model: &IndexedModel, betas: &[f64], rng: &mut SmallRng) -> Vec<i8> {
		let mut spins: Vec<i8> = (0..model.variables.len())
			.map(|_| if rng.gen::<bool>() { 1 } else { -1 })
			.collect();
		for &beta in betas {
			for i in 0..spins.len() {
				let delta = -2.0 * f64::from(spins[i]) * model.local_field(&spins, i);
				if delta <= 0.0 || rng.gen::<f64>() < (-beta * delta).exp() {
					spins[i] = -spins[i];
				}
			}
		}
		spins
	}
}

/// Default inverse temperature range for an Ising model: at the hot end, the
/// largest possible energy increase of a single flip is accepted with
/// probability 50%; at the cold end, the smallest with probability 1%.
fn default_beta_range(model: &IndexedModel) -> (f64, f64) {
	let max_field = model
		.linear
		.iter()
		.zip(&model.adj)
		.map(|(h, nb)| h.abs() + nb.iter().map(|(_, j)| j.abs()).sum::<f64>())
		.fold(0.0, f64::max);
	let min_bias = model
		.linear
		.iter()
		.chain(model.adj.iter().flatten().map(|(_, j)| j))
		.map(|b| b.abs())
		.filter(|&b| b > 0.0)
		.fold(f64::INFINITY, f64::min);
	if max_field == 0.0 {
		return (0.1, 1.0);
	}
	let hot = 2.0_f64.ln() / (2.0 * max_field);
	let cold = 100.0_f64.ln() / (2.0 * min_bias);
	(hot, cold)
}

impl Sampler for SimulatedAnnealingSampler {
	fn sample(&self, bqm: &BinaryQuadraticModel) -> Result<SampleSet> {
		let ising = IndexedModel::from(&bqm.change_vartype(Vartype::Spin));
		let original = IndexedModel::from(bqm);
		let (hot, cold) = self
			.config
			.beta_range
			.unwrap_or_else(|| default_beta_range(&ising));
		let betas = geomspace(hot, cold, self.config.num_sweeps);
		log!(
			"annealing {} variables for {} sweeps with beta from {} to {}",
			ising.variables.len(),
			betas.len(),
			hot,
			cold
		);

		let mut rng = match self.config.seed {
			Some(seed) => SmallRng::seed_from_u64(seed),
			None => SmallRng::from_entropy(),
		};
		let record = (0..self.config.num_reads)
			.map(|_| {
				let spins = Self::anneal(&ising, &betas, &mut rng);
				let sample: Vec<i8> = match bqm.vartype() {
					Vartype::Spin => spins,
					Vartype::Binary => spins.into_iter().map(|s| (s + 1) / 2).collect(),
				};
				SampleRecord {
					energy: original.energy(&sample),
					sample,
					num_occurrences: 1,
				}
			})
			.collect();
		Ok(SampleSet::new(ising.variables, bqm.vartype(), record))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{logic::NotConst, Expr};

	fn example() -> BinaryQuadraticModel {
		let mut bqm = BinaryQuadraticModel::new(Vartype::Spin);
		bqm.add_variable("a", 1.0);
		bqm.add_interaction("a", "b", -2.0);
		bqm
	}

	#[test]
	fn test_default_beta_range() {
		let (hot, cold) = default_beta_range(&IndexedModel::from(&example()));
		assert!((hot - 2.0_f64.ln() / 6.0).abs() < 1e-12);
		assert!((cold - 100.0_f64.ln() / 2.0).abs() < 1e-12);

		let mut empty = BinaryQuadraticModel::new(Vartype::Spin);
		empty.add_variable("a", 0.0);
		assert_eq!(default_beta_range(&IndexedModel::from(&empty)), (0.1, 1.0));
	}

	#[test]
	fn test_anneal_ground_state() {
		let sampler = SimulatedAnnealingSampler::default().with_config(AnnealConfig {
			num_reads: 5,
			num_sweeps: 200,
			beta_range: Some((0.1, 20.0)),
			seed: Some(42),
		});
		let mut bqm = BinaryQuadraticModel::new(Vartype::Spin);
		bqm.add_variable("a", 1.0);
		bqm.add_variable("b", 0.5);
		bqm.add_interaction("a", "b", -0.25);
		let sampleset = sampler.sample(&bqm).unwrap();
		assert_eq!(sampleset.len(), 5);
		assert_eq!(sampleset.vartype(), Vartype::Spin);
		for r in sampleset.record() {
			assert_eq!(r.sample, [-1, -1]);
			assert_eq!(r.energy, -1.75);
		}
	}

	#[test]
	fn test_anneal_binary_model() {
		let (a, b) = (Expr::binary("a"), Expr::binary("b"));
		let bqm = Expr::from(NotConst::new(a, b, "not"))
			.compile()
			.to_bqm()
			.unwrap();
		let sampler = SimulatedAnnealingSampler::default().with_config(AnnealConfig {
			seed: Some(7),
			..AnnealConfig::default()
		});
		let sampleset = sampler.sample(&bqm).unwrap();
		assert_eq!(sampleset.len(), 10);
		assert_eq!(sampleset.vartype(), Vartype::Binary);
		for (s, r) in sampleset.samples().zip(sampleset.record()) {
			assert!(s.values().all(|&v| v == 0 || v == 1));
			assert_eq!(bqm.energy(&s), Ok(r.energy));
		}
		let (best, energy) = sampleset.first().unwrap();
		assert_eq!(energy, 0.0);
		assert_ne!(best["a"], best["b"]);
	}

	#[test]
	fn test_seed_is_deterministic() {
		let config = AnnealConfig {
			num_reads: 3,
			num_sweeps: 10,
			beta_range: Some((0.01, 0.1)),
			seed: Some(1),
		};
		let sampler = SimulatedAnnealingSampler::default().with_config(config.clone());
		assert_eq!(sampler.config(), &config);
		assert_eq!(
			sampler.sample(&example()).unwrap(),
			sampler.sample(&example()).unwrap()
		);
	}
}
