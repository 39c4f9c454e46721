use std::{
	collections::BTreeMap,
	fmt::{self, Display},
};

use crate::{helpers::ordered, Error, Result, Sample, Vartype};

/// A binary quadratic model: `offset + Σ linear[v]·v + Σ quadratic[(u, v)]·u·v`
/// over variables of a single [`Vartype`].
///
/// Interactions are stored once, keyed by their labels in increasing order.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryQuadraticModel {
	vartype: Vartype,
	linear: BTreeMap<String, f64>,
	quadratic: BTreeMap<(String, String), f64>,
	offset: f64,
}

impl BinaryQuadraticModel {
	/// Create an empty model
	pub fn new(vartype: Vartype) -> Self {
		Self {
			vartype,
			linear: BTreeMap::new(),
			quadratic: BTreeMap::new(),
			offset: 0.0,
		}
	}

	pub fn vartype(&self) -> Vartype {
		self.vartype
	}

	pub fn offset(&self) -> f64 {
		self.offset
	}

	pub fn linear(&self) -> &BTreeMap<String, f64> {
		&self.linear
	}

	pub fn quadratic(&self) -> &BTreeMap<(String, String), f64> {
		&self.quadratic
	}

	pub fn num_variables(&self) -> usize {
		self.linear.len()
	}

	pub fn num_interactions(&self) -> usize {
		self.quadratic.len()
	}

	/// Labels of the variables, in increasing order.
	pub fn variables(&self) -> impl ExactSizeIterator<Item = &str> {
		self.linear.keys().map(String::as_str)
	}

	pub fn add_offset(&mut self, offset: f64) {
		self.offset += offset;
	}

	/// Add `bias` to the linear bias of `v`, adding the variable to the model
	/// if required.
	pub fn add_variable(&mut self, v: &str, bias: f64) {
		*self.linear.entry(v.to_owned()).or_insert(0.0) += bias;
	}

	/// Add `bias` to the interaction between `u` and `v`. An interaction of a
	/// variable with itself is its linear bias (binary) or a constant (spin).
	pub fn add_interaction(&mut self, u: &str, v: &str, bias: f64) {
		if u == v {
			match self.vartype {
				Vartype::Binary => self.add_variable(u, bias),
				Vartype::Spin => {
					self.add_variable(u, 0.0);
					self.add_offset(bias);
				}
			}
			return;
		}
		self.add_variable(u, 0.0);
		self.add_variable(v, 0.0);
		let (u, v) = ordered(u, v);
		*self
			.quadratic
			.entry((u.to_owned(), v.to_owned()))
			.or_insert(0.0) += bias;
	}

	/// Evaluate the model for a sample assigning all its variables.
	pub fn energy(&self, sample: &Sample) -> Result<f64> {
		let value = |v: &str| -> Result<f64> {
			let x = *sample
				.get(v)
				.ok_or_else(|| Error::MissingVariable(v.to_owned()))?;
			// Validate the value against the domain
			let _ = self.vartype.to_bool(v, x)?;
			Ok(f64::from(x))
		};
		let mut energy = self.offset;
		for (v, bias) in &self.linear {
			energy += bias * value(v)?;
		}
		for ((u, v), bias) in &self.quadratic {
			energy += bias * value(u)? * value(v)?;
		}
		Ok(energy)
	}

	/// Returns an equivalent model over variables of the given vartype, using
	/// `s = 2x - 1`.
	pub fn change_vartype(&self, vartype: Vartype) -> Self {
		if self.vartype == vartype {
			return self.clone();
		}
		let mut bqm = Self::new(vartype);
		bqm.add_offset(self.offset);
		match vartype {
			Vartype::Spin => {
				for (v, &a) in &self.linear {
					bqm.add_variable(v, a / 2.0);
					bqm.add_offset(a / 2.0);
				}
				for ((u, v), &b) in &self.quadratic {
					bqm.add_interaction(u, v, b / 4.0);
					bqm.add_variable(u, b / 4.0);
					bqm.add_variable(v, b / 4.0);
					bqm.add_offset(b / 4.0);
				}
			}
			Vartype::Binary => {
				for (v, &h) in &self.linear {
					bqm.add_variable(v, 2.0 * h);
					bqm.add_offset(-h);
				}
				for ((u, v), &j) in &self.quadratic {
					bqm.add_interaction(u, v, 4.0 * j);
					bqm.add_variable(u, -2.0 * j);
					bqm.add_variable(v, -2.0 * j);
					bqm.add_offset(j);
				}
			}
		}
		bqm
	}

	/// The QUBO form of the model: a matrix with the linear biases on its
	/// diagonal, and an offset.
	pub fn to_qubo(&self) -> (BTreeMap<(String, String), f64>, f64) {
		let bqm = self.change_vartype(Vartype::Binary);
		let qubo = bqm
			.linear
			.iter()
			.map(|(v, &a)| ((v.clone(), v.clone()), a))
			.chain(bqm.quadratic.clone())
			.collect();
		(qubo, bqm.offset)
	}

	/// The Ising form of the model: linear biases, couplings and offset.
	#[allow(clippy::type_complexity, reason = "mirrors the three parts of an Ising model")]
	pub fn to_ising(&self) -> (BTreeMap<String, f64>, BTreeMap<(String, String), f64>, f64) {
		let bqm = self.change_vartype(Vartype::Spin);
		(bqm.linear, bqm.quadratic, bqm.offset)
	}
}

impl Display for BinaryQuadraticModel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "{} offset={:?}", self.vartype, self.offset)?;
		for (v, bias) in &self.linear {
			writeln!(f, "{v}: {bias:?}")?;
		}
		for ((u, v), bias) in &self.quadratic {
			writeln!(f, "({u}, {v}): {bias:?}")?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use itertools::iproduct;

	use super::*;
	use crate::helpers::tests::{expect_file, sample};

	fn example() -> BinaryQuadraticModel {
		let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
		bqm.add_variable("x", -1.0);
		bqm.add_variable("y", 2.0);
		bqm.add_interaction("y", "x", -3.0);
		bqm.add_interaction("z", "y", 0.5);
		bqm.add_offset(1.5);
		bqm
	}

	#[test]
	fn test_interactions_are_ordered() {
		let bqm = example();
		assert_eq!(bqm.num_variables(), 3);
		assert_eq!(bqm.num_interactions(), 2);
		assert_eq!(bqm.quadratic()[&("x".to_owned(), "y".to_owned())], -3.0);
		assert_eq!(bqm.quadratic()[&("y".to_owned(), "z".to_owned())], 0.5);
		assert_eq!(bqm.linear()["z"], 0.0);
		assert_eq!(bqm.variables().collect::<Vec<_>>(), ["x", "y", "z"]);
	}

	#[test]
	fn test_self_interaction() {
		let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
		bqm.add_interaction("x", "x", 2.0);
		assert_eq!(bqm.linear()["x"], 2.0);

		let mut bqm = BinaryQuadraticModel::new(Vartype::Spin);
		bqm.add_interaction("s", "s", 2.0);
		assert_eq!(bqm.linear()["s"], 0.0);
		assert_eq!(bqm.offset(), 2.0);
	}

	#[test]
	fn test_energy() {
		let bqm = example();
		assert_eq!(bqm.energy(&sample(&[("x", 1), ("y", 1), ("z", 1)])), Ok(0.0));
		assert_eq!(bqm.energy(&sample(&[("x", 1), ("y", 0), ("z", 1)])), Ok(0.5));
		assert_eq!(
			bqm.energy(&sample(&[("x", 1), ("y", 0)])),
			Err(Error::MissingVariable("z".to_owned()))
		);
		assert!(matches!(
			bqm.energy(&sample(&[("x", 1), ("y", -1), ("z", 0)])),
			Err(Error::InvalidValue { .. })
		));
	}

	#[test]
	fn test_change_vartype_preserves_energy() {
		let bqm = example();
		let ising = bqm.change_vartype(Vartype::Spin);
		let back = ising.change_vartype(Vartype::Binary);
		for (x, y, z) in iproduct!([0, 1], [0, 1], [0, 1]) {
			let binary = sample(&[("x", x), ("y", y), ("z", z)]);
			let spin = sample(&[("x", 2 * x - 1), ("y", 2 * y - 1), ("z", 2 * z - 1)]);
			let e = bqm.energy(&binary).unwrap();
			assert!((ising.energy(&spin).unwrap() - e).abs() < 1e-9);
			assert!((back.energy(&binary).unwrap() - e).abs() < 1e-9);
		}
		assert_eq!(ising.change_vartype(Vartype::Spin), ising);
	}

	#[test]
	fn test_display() {
		expect_file!["bqm/example.bqm"].assert_eq(&example().to_string());
	}
}
