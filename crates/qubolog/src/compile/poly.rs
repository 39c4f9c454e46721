use std::collections::{btree_map::Entry, BTreeMap};

/// Index of a variable (or placeholder) in the [`super::Labels`] of a model.
pub(crate) type Id = usize;

/// Insert `key` into `prod` (a sorted product of variables), using `x·x = x`.
fn insert_idempotent(prod: &mut Vec<Id>, key: Id) {
	if let Err(pos) = prod.binary_search(&key) {
		prod.insert(pos, key);
	}
}

/// A polynomial over placeholders, used as coefficient of the terms of a
/// [`Poly`]. Placeholder products are sorted, but (unlike binary variables)
/// may contain repetitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Coefficient(BTreeMap<Vec<Id>, f64>);

/// A polynomial over binary variables, where each product of variables
/// (sorted, without repetitions) maps to a [`Coefficient`].
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Poly(BTreeMap<Vec<Id>, Coefficient>);

impl Coefficient {
	pub(crate) fn constant(value: f64) -> Self {
		let mut c = Self::default();
		c.add_term(Vec::new(), value);
		c
	}

	pub(crate) fn placeholder(id: Id) -> Self {
		Self(BTreeMap::from([(vec![id], 1.0)]))
	}

	pub(crate) fn is_zero(&self) -> bool {
		self.0.is_empty()
	}

	fn add_term(&mut self, key: Vec<Id>, value: f64) {
		if value == 0.0 {
			return;
		}
		match self.0.entry(key) {
			Entry::Vacant(e) => {
				let _ = e.insert(value);
			}
			Entry::Occupied(mut e) => {
				*e.get_mut() += value;
				if *e.get() == 0.0 {
					let _ = e.remove();
				}
			}
		}
	}

	pub(crate) fn add(&mut self, other: &Coefficient) {
		for (key, &value) in &other.0 {
			self.add_term(key.clone(), value);
		}
	}

	pub(crate) fn scale(&self, factor: f64) -> Self {
		let mut c = Self::default();
		for (key, &value) in &self.0 {
			c.add_term(key.clone(), value * factor);
		}
		c
	}

	pub(crate) fn mul(&self, other: &Coefficient) -> Self {
		let mut c = Self::default();
		for (lk, &lv) in &self.0 {
			for (rk, &rv) in &other.0 {
				let mut key = lk.iter().chain(rk).copied().collect::<Vec<_>>();
				key.sort_unstable();
				c.add_term(key, lv * rv);
			}
		}
		c
	}

	/// Evaluate the coefficient given the values of all placeholders (indexed
	/// by their [`Id`]).
	pub(crate) fn eval(&self, params: &[f64]) -> f64 {
		self.0
			.iter()
			.map(|(key, value)| key.iter().map(|&p| params[p]).product::<f64>() * value)
			.sum()
	}
}

impl Poly {
	pub(crate) fn constant(c: Coefficient) -> Self {
		let mut p = Self::default();
		p.add_term(Vec::new(), c);
		p
	}

	pub(crate) fn var(id: Id) -> Self {
		Self(BTreeMap::from([(vec![id], Coefficient::constant(1.0))]))
	}

	/// Add `coeff · ∏ key` to the polynomial. The key must be sorted and free of
	/// repetitions.
	pub(crate) fn add_term(&mut self, key: Vec<Id>, coeff: Coefficient) {
		debug_assert!(key.windows(2).all(|w| w[0] < w[1]));
		if coeff.is_zero() {
			return;
		}
		match self.0.entry(key) {
			Entry::Vacant(e) => {
				let _ = e.insert(coeff);
			}
			Entry::Occupied(mut e) => {
				e.get_mut().add(&coeff);
				if e.get().is_zero() {
					let _ = e.remove();
				}
			}
		}
	}

	pub(crate) fn add(&mut self, other: &Poly) {
		for (key, coeff) in &other.0 {
			self.add_term(key.clone(), coeff.clone());
		}
	}

	pub(crate) fn scale(&self, factor: f64) -> Self {
		let mut p = Self::default();
		for (key, coeff) in &self.0 {
			p.add_term(key.clone(), coeff.scale(factor));
		}
		p
	}

	pub(crate) fn mul(&self, other: &Poly) -> Self {
		let mut p = Self::default();
		for (lk, lc) in &self.0 {
			for (rk, rc) in &other.0 {
				let mut key = lk.clone();
				for &id in rk {
					insert_idempotent(&mut key, id);
				}
				p.add_term(key, lc.mul(rc));
			}
		}
		p
	}

	/// The highest number of variables in any term.
	pub(crate) fn degree(&self) -> usize {
		self.0.keys().map(Vec::len).max().unwrap_or(0)
	}

	pub(crate) fn terms(&self) -> impl Iterator<Item = (&Vec<Id>, &Coefficient)> {
		self.0.iter()
	}

	pub(crate) fn into_terms(self) -> impl Iterator<Item = (Vec<Id>, Coefficient)> {
		self.0.into_iter()
	}

	/// Evaluate the polynomial given the binary values of all variables and
	/// the values of all placeholders.
	pub(crate) fn eval(&self, values: &[bool], params: &[f64]) -> f64 {
		self.0
			.iter()
			.filter(|(key, _)| key.iter().all(|&v| values[v]))
			.map(|(_, coeff)| coeff.eval(params))
			.sum()
	}
}
