use std::fmt::Write;

use crate::{Expr, Vartype};

/// A multi-dimensional array of variables, stored in row-major order.
///
/// The element at index `[i, j, …]` of an array named `x` is a variable
/// labelled `x[i][j]…`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Array {
	shape: Vec<usize>,
	items: Vec<Expr>,
}

/// Label of the element at `index` of an array named `name`.
pub(crate) fn index_label(name: &str, index: &[usize]) -> String {
	let mut label = name.to_owned();
	for i in index {
		// Writing into a String cannot fail
		let _ = write!(label, "[{i}]");
	}
	label
}

impl Array {
	/// Create an array of fresh variables of the given vartype.
	pub fn create(name: &str, shape: &[usize], vartype: Vartype) -> Self {
		let len = shape.iter().product();
		let items = (0..len)
			.map(|flat| {
				let label = index_label(name, &Self::unflatten(shape, flat));
				match vartype {
					Vartype::Binary => Expr::binary(label),
					Vartype::Spin => Expr::spin(label),
				}
			})
			.collect();
		Self {
			shape: shape.to_vec(),
			items,
		}
	}

	fn unflatten(shape: &[usize], mut flat: usize) -> Vec<usize> {
		let mut index = vec![0; shape.len()];
		for (i, &dim) in shape.iter().enumerate().rev() {
			index[i] = flat % dim;
			flat /= dim;
		}
		index
	}

	pub fn shape(&self) -> &[usize] {
		&self.shape
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// The element at `index`, or `None` if the index does not match the shape
	/// of the array.
	pub fn get(&self, index: &[usize]) -> Option<&Expr> {
		if index.len() != self.shape.len() {
			return None;
		}
		let mut flat = 0;
		for (&i, &dim) in index.iter().zip(&self.shape) {
			if i >= dim {
				return None;
			}
			flat = flat * dim + i;
		}
		self.items.get(flat)
	}

	/// Elements in row-major order
	pub fn iter(&self) -> impl ExactSizeIterator<Item = &Expr> {
		self.items.iter()
	}

	/// Sum of all elements
	pub fn sum(&self) -> Expr {
		self.items.iter().sum()
	}
}
