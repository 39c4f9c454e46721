use std::{
	collections::BTreeMap,
	fmt::{self, Display},
};

use itertools::Itertools;

use crate::{
	array::index_label,
	compile::{poly::Poly, Labels},
	expression::Condition,
	log, BinaryQuadraticModel, Error, FeedDict, Result, Sample, SampleSet, Valuation, Vartype,
};

/// A named part of a compiled model
#[derive(Debug, Clone)]
pub(crate) struct SubHamiltonian {
	pub(crate) label: String,
	pub(crate) poly: Poly,
}

/// A named part of a compiled model, with a condition on its energy
#[derive(Clone)]
pub(crate) struct CompiledConstraint {
	pub(crate) label: String,
	pub(crate) poly: Poly,
	pub(crate) condition: Condition,
}

/// The result of compiling an [`crate::Expr`]: a quadratic polynomial over
/// binary variables (including auxiliary variables introduced during
/// compilation), together with the sub-Hamiltonians and constraints that are
/// reported when decoding samples.
#[derive(Debug, Clone)]
pub struct Model {
	variables: Labels,
	placeholders: Labels,
	poly: Poly,
	sub_hamiltonians: Vec<SubHamiltonian>,
	constraints: Vec<CompiledConstraint>,
}

/// A sample interpreted in terms of a [`Model`]
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSample {
	sample: Sample,
	vartype: Vartype,
	energy: f64,
	sub_hamiltonians: BTreeMap<String, f64>,
	constraints: BTreeMap<String, (bool, f64)>,
}

impl Model {
	pub(crate) fn new(
		variables: Labels,
		placeholders: Labels,
		poly: Poly,
		sub_hamiltonians: Vec<SubHamiltonian>,
		constraints: Vec<CompiledConstraint>,
	) -> Self {
		Self {
			variables,
			placeholders,
			poly,
			sub_hamiltonians,
			constraints,
		}
	}

	/// Labels of the variables of the model, in order of first occurrence.
	/// Auxiliary variables come after the variables of the expression.
	pub fn variables(&self) -> impl ExactSizeIterator<Item = &str> {
		self.variables.iter()
	}

	/// Labels of the placeholders that need to be given a value to evaluate
	/// the model.
	pub fn placeholders(&self) -> impl ExactSizeIterator<Item = &str> {
		self.placeholders.iter()
	}

	/// Labels of the sub-Hamiltonians of the model (excluding constraints).
	pub fn sub_hamiltonians(&self) -> impl Iterator<Item = &str> {
		self.sub_hamiltonians.iter().map(|h| h.label.as_str())
	}

	/// Labels of the constraints of the model.
	pub fn constraints(&self) -> impl Iterator<Item = &str> {
		self.constraints.iter().map(|c| c.label.as_str())
	}

	fn values(&self, sample: &Sample, vartype: Vartype) -> Result<Vec<bool>> {
		self.variables
			.iter()
			.map(|lbl| {
				let v = sample
					.get(lbl)
					.ok_or_else(|| Error::MissingVariable(lbl.to_owned()))?;
				vartype.to_bool(lbl, *v)
			})
			.collect()
	}

	fn params(&self, feed_dict: &FeedDict) -> Result<Vec<f64>> {
		self.placeholders
			.iter()
			.map(|lbl| {
				feed_dict
					.get(lbl)
					.copied()
					.ok_or_else(|| Error::MissingPlaceholder(lbl.to_owned()))
			})
			.collect()
	}

	/// Evaluate the model for the given sample, which must assign all variables
	/// of the model (see [`Self::variables`]).
	pub fn energy(&self, sample: &Sample, vartype: Vartype) -> Result<f64> {
		self.energy_with(sample, vartype, &FeedDict::default())
	}

	/// Evaluate the model for the given sample and placeholder values.
	pub fn energy_with(&self, sample: &Sample, vartype: Vartype, feed_dict: &FeedDict) -> Result<f64> {
		let values = self.values(sample, vartype)?;
		Ok(self.poly.eval(&values, &self.params(feed_dict)?))
	}

	/// Export the model as a binary quadratic model. Fails if the model
	/// contains placeholders, see [`Self::to_bqm_with`].
	pub fn to_bqm(&self) -> Result<BinaryQuadraticModel> {
		self.to_bqm_with(&FeedDict::default())
	}

	pub fn to_bqm_with(&self, feed_dict: &FeedDict) -> Result<BinaryQuadraticModel> {
		let params = self.params(feed_dict)?;
		let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
		// Variables may cancel out, but still have to be sampled
		for lbl in self.variables.iter() {
			bqm.add_variable(lbl, 0.0);
		}
		for (key, coeff) in self.poly.terms() {
			let bias = coeff.eval(&params);
			match key.as_slice() {
				[] => bqm.add_offset(bias),
				[x] => bqm.add_variable(self.variables.label(*x), bias),
				[x, y] => bqm.add_interaction(self.variables.label(*x), self.variables.label(*y), bias),
				_ => unreachable!("compiled models are at most quadratic"),
			}
		}
		Ok(bqm)
	}

	/// Export the model as QUBO matrix (linear biases on the diagonal) and an
	/// offset.
	#[allow(clippy::type_complexity, reason = "mirrors the QUBO matrix and its offset")]
	pub fn to_qubo(&self, feed_dict: &FeedDict) -> Result<(BTreeMap<(String, String), f64>, f64)> {
		Ok(self.to_bqm_with(feed_dict)?.to_qubo())
	}

	/// Export the model as Ising model: linear biases, couplings and offset.
	#[allow(clippy::type_complexity, reason = "mirrors the three parts of an Ising model")]
	pub fn to_ising(
		&self,
		feed_dict: &FeedDict,
	) -> Result<(BTreeMap<String, f64>, BTreeMap<(String, String), f64>, f64)> {
		Ok(self.to_bqm_with(feed_dict)?.to_ising())
	}

	pub fn decode_sample(&self, sample: &Sample, vartype: Vartype) -> Result<DecodedSample> {
		self.decode_sample_with(sample, vartype, &FeedDict::default())
	}

	/// Interpret a sample in terms of the model: its energy, the energy of
	/// each sub-Hamiltonian, and whether each constraint is satisfied.
	pub fn decode_sample_with(
		&self,
		sample: &Sample,
		vartype: Vartype,
		feed_dict: &FeedDict,
	) -> Result<DecodedSample> {
		let values = self.values(sample, vartype)?;
		let params = self.params(feed_dict)?;
		let sub_hamiltonians = self
			.sub_hamiltonians
			.iter()
			.map(|h| (h.label.clone(), h.poly.eval(&values, &params)))
			.collect();
		let constraints = self
			.constraints
			.iter()
			.map(|c| {
				let energy = c.poly.eval(&values, &params);
				(c.label.clone(), ((c.condition)(energy), energy))
			})
			.collect();
		Ok(DecodedSample {
			sample: self
				.variables
				.iter()
				.zip(&values)
				.map(|(lbl, &b)| (lbl.to_owned(), vartype.from_bool(b)))
				.collect(),
			vartype,
			energy: self.poly.eval(&values, &params),
			sub_hamiltonians,
			constraints,
		})
	}

	pub fn decode_sampleset(&self, sampleset: &SampleSet) -> Result<Vec<DecodedSample>> {
		self.decode_sampleset_with(sampleset, &FeedDict::default())
	}

	/// Decode all samples of the sample set, ordered by increasing energy.
	pub fn decode_sampleset_with(
		&self,
		sampleset: &SampleSet,
		feed_dict: &FeedDict,
	) -> Result<Vec<DecodedSample>> {
		let mut decoded = sampleset
			.samples()
			.map(|s| self.decode_sample_with(&s, sampleset.vartype(), feed_dict))
			.collect::<Result<Vec<_>>>()?;
		decoded.sort_by(|a, b| a.energy.total_cmp(&b.energy));
		log!(
			"decoded {} samples, {} feasible",
			decoded.len(),
			decoded.iter().filter(|d| d.is_feasible()).count()
		);
		Ok(decoded)
	}
}

impl DecodedSample {
	/// The values of the variables of the model, in the vartype of the
	/// decoded sample.
	pub fn sample(&self) -> &Sample {
		&self.sample
	}

	pub fn vartype(&self) -> Vartype {
		self.vartype
	}

	pub fn energy(&self) -> f64 {
		self.energy
	}

	/// The energy of each sub-Hamiltonian.
	pub fn subh(&self) -> &BTreeMap<String, f64> {
		&self.sub_hamiltonians
	}

	/// Whether each constraint is satisfied together with its energy. If
	/// `only_broken` is set, only the constraints that are not satisfied are
	/// returned.
	pub fn constraints(&self, only_broken: bool) -> BTreeMap<&str, (bool, f64)> {
		self.constraints
			.iter()
			.filter(|(_, (ok, _))| !only_broken || !ok)
			.map(|(lbl, &c)| (lbl.as_str(), c))
			.collect()
	}

	/// Returns `true` if all constraints are satisfied.
	pub fn is_feasible(&self) -> bool {
		self.constraints.values().all(|(ok, _)| *ok)
	}

	/// The value of an element of an [`crate::Array`] named `name`.
	pub fn array(&self, name: &str, index: &[usize]) -> Option<i8> {
		self.sample.get(&index_label(name, index)).copied()
	}
}

impl Valuation for DecodedSample {
	fn value(&self, label: &str) -> Option<bool> {
		self.sample.value(label)
	}
}

impl fmt::Debug for CompiledConstraint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CompiledConstraint")
			.field("label", &self.label)
			.field("poly", &self.poly)
			.finish_non_exhaustive()
	}
}

impl Display for DecodedSample {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "energy: {:?}", self.energy)?;
		writeln!(
			f,
			"sample: {{{}}}",
			self.sample.iter().map(|(l, v)| format!("{l}: {v}")).join(", ")
		)?;
		for (lbl, e) in &self.sub_hamiltonians {
			writeln!(f, "subh {lbl}: {e:?}")?;
		}
		for (lbl, (ok, e)) in &self.constraints {
			writeln!(
				f,
				"constraint {lbl}: {e:?}{}",
				if *ok { "" } else { " (broken)" }
			)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		helpers::tests::{expect_file, sample},
		logic::NotConst,
		ExactSolver, Expr, Sampler,
	};

	fn not_model() -> Model {
		Expr::from(NotConst::new(Expr::binary("a"), Expr::binary("b"), "not")).compile()
	}

	#[test]
	fn test_energy_errors() {
		let model = not_model();
		assert_eq!(
			model.energy(&sample(&[("a", 1)]), Vartype::Binary),
			Err(Error::MissingVariable("b".to_owned()))
		);
		assert_eq!(
			model.energy(&sample(&[("a", 1), ("b", 2)]), Vartype::Binary),
			Err(Error::InvalidValue {
				label: "b".to_owned(),
				value: 2,
				vartype: Vartype::Binary
			})
		);
		// Unknown variables are ignored
		assert_eq!(
			model.energy(&sample(&[("a", 1), ("b", 0), ("z", 1)]), Vartype::Binary),
			Ok(0.0)
		);
	}

	#[test]
	fn test_energy_spin_sample() {
		let model = not_model();
		assert_eq!(model.energy(&sample(&[("a", 1), ("b", -1)]), Vartype::Spin), Ok(0.0));
		assert_eq!(model.energy(&sample(&[("a", -1), ("b", -1)]), Vartype::Spin), Ok(1.0));
	}

	#[test]
	fn test_not_bqm() {
		let bqm = not_model().to_bqm().unwrap();
		assert_eq!(bqm.vartype(), Vartype::Binary);
		expect_file!["model/not.bqm"].assert_eq(&bqm.to_string());
	}

	#[test]
	fn test_placeholders() {
		let (a, b) = (Expr::binary("a"), Expr::binary("b"));
		let p = Expr::placeholder("P");
		let model = (&p * &a + &b).compile();
		assert_eq!(model.placeholders().collect::<Vec<_>>(), ["P"]);
		assert_eq!(model.to_bqm(), Err(Error::MissingPlaceholder("P".to_owned())));

		let feed = FeedDict::from_iter([("P".to_owned(), 3.0)]);
		let bqm = model.to_bqm_with(&feed).unwrap();
		assert_eq!(bqm.linear()["a"], 3.0);
		assert_eq!(bqm.linear()["b"], 1.0);
		assert_eq!(
			model.energy_with(&sample(&[("a", 1), ("b", 1)]), Vartype::Binary, &feed),
			Ok(4.0)
		);
	}

	#[test]
	fn test_qubo_and_ising() {
		let model = not_model();
		let (qubo, offset) = model.to_qubo(&FeedDict::default()).unwrap();
		assert_eq!(offset, 1.0);
		assert_eq!(qubo[&("a".to_owned(), "a".to_owned())], -1.0);
		assert_eq!(qubo[&("a".to_owned(), "b".to_owned())], 2.0);

		let (h, j, offset) = model.to_ising(&FeedDict::default()).unwrap();
		assert_eq!(offset, 0.5);
		assert_eq!(h["a"], 0.0);
		assert_eq!(j[&("a".to_owned(), "b".to_owned())], 0.5);
	}

	#[test]
	fn test_decode_sample() {
		let (a, b) = (Expr::binary("a"), Expr::binary("b"));
		let e = Expr::sub_h(2.0 * &a, "cost") + Expr::constraint(&a + &b - 1.0, "one");
		let model = e.compile();

		let decoded = model
			.decode_sample(&sample(&[("a", 1), ("b", 1)]), Vartype::Binary)
			.unwrap();
		assert_eq!(decoded.energy(), 3.0);
		assert_eq!(decoded.subh()["cost"], 2.0);
		assert_eq!(decoded.constraints(true), BTreeMap::from([("one", (false, 1.0))]));
		assert!(!decoded.is_feasible());
		expect_file!["model/decode_sample.txt"].assert_eq(&decoded.to_string());

		let decoded = model
			.decode_sample(&sample(&[("a", 0), ("b", 1)]), Vartype::Binary)
			.unwrap();
		assert!(decoded.is_feasible());
		assert!(decoded.constraints(true).is_empty());
		assert_eq!(decoded.constraints(false), BTreeMap::from([("one", (true, 0.0))]));
		assert_eq!(decoded.value("b"), Some(true));
	}

	#[test]
	fn test_decode_custom_condition() {
		let (a, b) = (Expr::binary("a"), Expr::binary("b"));
		let e = Expr::constraint_with(0.5 * &a + &b, "lt_one", |e| e < 1.0);
		let model = e.compile();

		let decoded = model
			.decode_sample(&sample(&[("a", 1), ("b", 0)]), Vartype::Binary)
			.unwrap();
		assert_eq!(decoded.energy(), 0.5);
		assert!(decoded.is_feasible());
		assert_eq!(decoded.constraints(false), BTreeMap::from([("lt_one", (true, 0.5))]));

		let decoded = model
			.decode_sample(&sample(&[("a", 1), ("b", 1)]), Vartype::Binary)
			.unwrap();
		assert!(!decoded.is_feasible());
		assert_eq!(decoded.constraints(true), BTreeMap::from([("lt_one", (false, 1.5))]));
	}

	#[test]
	fn test_decode_sampleset_sorted() {
		let model = not_model();
		let sampleset = ExactSolver.sample(&model.to_bqm().unwrap()).unwrap();
		let decoded = model.decode_sampleset(&sampleset).unwrap();
		assert_eq!(
			decoded.iter().map(DecodedSample::energy).collect::<Vec<_>>(),
			[0.0, 0.0, 1.0, 1.0]
		);
		assert!(decoded[..2].iter().all(DecodedSample::is_feasible));
		assert!(!decoded[2].is_feasible());
	}
}
