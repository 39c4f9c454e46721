use super::{IndexedModel, SampleRecord, SampleSet, Sampler};
use crate::{BinaryQuadraticModel, Error, Result};

/// Sampler that returns every possible assignment of the model, in
/// lexicographic order of the values (the first variable changes slowest).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExactSolver;

impl ExactSolver {
	/// The largest number of variables for which the solver enumerates all
	/// assignments
	pub const MAX_VARIABLES: usize = 20;
}

impl Sampler for ExactSolver {
	fn sample(&self, bqm: &BinaryQuadraticModel) -> Result<SampleSet> {
		let n = bqm.num_variables();
		if n > Self::MAX_VARIABLES {
			return Err(Error::TooManyVariables {
				found: n,
				max: Self::MAX_VARIABLES,
			});
		}
		let model = IndexedModel::from(bqm);
		let [lo, hi] = bqm.vartype().values();
		let record = (0..1usize << n)
			.map(|bits| {
				let sample: Vec<i8> = (0..n)
					.map(|i| if (bits >> (n - 1 - i)) & 1 == 1 { hi } else { lo })
					.collect();
				SampleRecord {
					energy: model.energy(&sample),
					sample,
					num_occurrences: 1,
				}
			})
			.collect();
		Ok(SampleSet::new(model.variables, bqm.vartype(), record))
	}
}
