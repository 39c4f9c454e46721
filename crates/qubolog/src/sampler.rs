pub mod anneal;
pub mod exact;

use std::fmt::{self, Display};

use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::{BinaryQuadraticModel, Result, Sample, Vartype};

/// Trait implemented by the algorithms that produce samples for a
/// [`BinaryQuadraticModel`], ideally of low energy.
pub trait Sampler {
	fn sample(&self, bqm: &BinaryQuadraticModel) -> Result<SampleSet>;
}

/// A single (possibly repeated) sample in a [`SampleSet`]
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
	/// Values of the variables, in the order of [`SampleSet::variables`]
	pub sample: Vec<i8>,
	pub energy: f64,
	pub num_occurrences: usize,
}

/// A collection of samples over a shared ordering of variables
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
	variables: Vec<String>,
	vartype: Vartype,
	record: Vec<SampleRecord>,
}

impl SampleSet {
	pub fn new(variables: Vec<String>, vartype: Vartype, record: Vec<SampleRecord>) -> Self {
		debug_assert!(record.iter().all(|r| r.sample.len() == variables.len()));
		Self {
			variables,
			vartype,
			record,
		}
	}

	/// Create a sample set from samples of the given model, computing their
	/// energies. Each sample must assign all variables of the model.
	pub fn from_samples<I: IntoIterator<Item = Sample>>(
		bqm: &BinaryQuadraticModel,
		samples: I,
	) -> Result<Self> {
		let variables = bqm.variables().map(str::to_owned).collect_vec();
		let record = samples
			.into_iter()
			.map(|s| {
				let energy = bqm.energy(&s)?;
				Ok(SampleRecord {
					sample: variables.iter().map(|v| s[v]).collect(),
					energy,
					num_occurrences: 1,
				})
			})
			.collect::<Result<_>>()?;
		Ok(Self::new(variables, bqm.vartype(), record))
	}

	pub fn variables(&self) -> &[String] {
		&self.variables
	}

	pub fn vartype(&self) -> Vartype {
		self.vartype
	}

	pub fn record(&self) -> &[SampleRecord] {
		&self.record
	}

	pub fn len(&self) -> usize {
		self.record.len()
	}

	pub fn is_empty(&self) -> bool {
		self.record.is_empty()
	}

	/// Iterate over the samples as label/value maps, in record order.
	pub fn samples(&self) -> impl ExactSizeIterator<Item = Sample> + '_ {
		self.record.iter().map(|r| {
			self.variables
				.iter()
				.cloned()
				.zip(r.sample.iter().copied())
				.collect()
		})
	}

	/// The sample with the lowest energy (the first one in case of ties)
	pub fn first(&self) -> Option<(Sample, f64)> {
		self.samples()
			.zip(&self.record)
			.min_by(|(_, a), (_, b)| a.energy.total_cmp(&b.energy))
			.map(|(s, r)| (s, r.energy))
	}

	/// Merge identical samples, summing their occurrences. Records keep the
	/// order in which their sample first occurs.
	pub fn aggregate(&self) -> Self {
		let mut index: FxHashMap<&[i8], usize> = FxHashMap::default();
		let mut record: Vec<SampleRecord> = Vec::new();
		for r in &self.record {
			if let Some(&i) = index.get(r.sample.as_slice()) {
				record[i].num_occurrences += r.num_occurrences;
			} else {
				let _ = index.insert(&r.sample, record.len());
				record.push(r.clone());
			}
		}
		Self::new(self.variables.clone(), self.vartype, record)
	}
}

impl Display for SampleSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(
			f,
			"{} energy num_oc. ({})",
			self.variables.iter().format(" "),
			self.vartype
		)?;
		for r in &self.record {
			writeln!(
				f,
				"{} {:?} {}",
				r.sample.iter().format(" "),
				r.energy,
				r.num_occurrences
			)?;
		}
		Ok(())
	}
}

/// A [`BinaryQuadraticModel`] with its variables replaced by their position
/// in (label) order, used by the samplers for fast evaluation.
#[derive(Debug, Clone)]
pub(crate) struct IndexedModel {
	pub(crate) variables: Vec<String>,
	pub(crate) linear: Vec<f64>,
	/// Neighbours and coupling strength of each variable
	pub(crate) adj: Vec<Vec<(usize, f64)>>,
	pub(crate) offset: f64,
}

impl IndexedModel {
	/// Energy of the given values, which are in the vartype of the model the
	/// `IndexedModel` was created from.
	pub(crate) fn energy(&self, values: &[i8]) -> f64 {
		let x = |i: usize| f64::from(values[i]);
		self.offset
			+ self
				.linear
				.iter()
				.enumerate()
				.map(|(i, h)| h * x(i))
				.sum::<f64>()
			+ self
				.adj
				.iter()
				.enumerate()
				.flat_map(|(i, nb)| nb.iter().filter(move |(j, _)| i < *j).map(move |&(j, c)| (i, j, c)))
				.map(|(i, j, c)| c * x(i) * x(j))
				.sum::<f64>()
	}

	/// Σ of the interactions of `i` with the current values of its neighbours,
	/// plus its linear bias.
	pub(crate) fn local_field(&self, values: &[i8], i: usize) -> f64 {
		self.linear[i]
			+ self.adj[i]
				.iter()
				.map(|&(j, c)| c * f64::from(values[j]))
				.sum::<f64>()
	}
}

impl From<&BinaryQuadraticModel> for IndexedModel {
	fn from(bqm: &BinaryQuadraticModel) -> Self {
		let variables = bqm.variables().map(str::to_owned).collect_vec();
		let position: FxHashMap<&str, usize> = variables
			.iter()
			.enumerate()
			.map(|(i, v)| (v.as_str(), i))
			.collect();
		let mut adj = vec![Vec::new(); variables.len()];
		for ((u, v), &c) in bqm.quadratic() {
			let (i, j) = (position[u.as_str()], position[v.as_str()]);
			adj[i].push((j, c));
			adj[j].push((i, c));
		}
		Self {
			linear: bqm.linear().values().copied().collect(),
			variables,
			adj,
			offset: bqm.offset(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::helpers::tests::sample;

	fn example() -> BinaryQuadraticModel {
		let mut bqm = BinaryQuadraticModel::new(Vartype::Spin);
		bqm.add_variable("a", 1.0);
		bqm.add_interaction("a", "b", -2.0);
		bqm.add_offset(0.5);
		bqm
	}

	#[test]
	fn test_from_samples() {
		let bqm = example();
		let sampleset = SampleSet::from_samples(
			&bqm,
			[sample(&[("a", 1), ("b", 1)]), sample(&[("b", 1), ("a", -1)])],
		)
		.unwrap();
		assert_eq!(sampleset.variables(), ["a", "b"]);
		assert_eq!(sampleset.vartype(), Vartype::Spin);
		assert_eq!(sampleset.record()[0].sample, [1, 1]);
		assert_eq!(sampleset.record()[0].energy, -0.5);
		assert_eq!(sampleset.record()[1].sample, [-1, 1]);
		assert_eq!(sampleset.record()[1].energy, 1.5);
		assert_eq!(sampleset.first(), Some((sample(&[("a", 1), ("b", 1)]), -0.5)));
	}

	#[test]
	fn test_aggregate() {
		let bqm = example();
		let s = sample(&[("a", -1), ("b", -1)]);
		let t = sample(&[("a", 1), ("b", -1)]);
		let sampleset =
			SampleSet::from_samples(&bqm, [s.clone(), t.clone(), s.clone(), s]).unwrap();
		let aggregated = sampleset.aggregate();
		assert_eq!(aggregated.len(), 2);
		assert_eq!(aggregated.record()[0].num_occurrences, 3);
		assert_eq!(aggregated.record()[1].num_occurrences, 1);
		assert_eq!(aggregated.samples().nth(1), Some(t));
	}

	#[test]
	fn test_indexed_energy() {
		let bqm = example();
		let indexed = IndexedModel::from(&bqm);
		for (a, b) in [(-1, -1), (-1, 1), (1, -1), (1, 1)] {
			let e = bqm.energy(&sample(&[("a", a), ("b", b)])).unwrap();
			assert_eq!(indexed.energy(&[a, b]), e);
		}
		assert_eq!(indexed.local_field(&[1, -1], 0), 3.0);
	}
}
