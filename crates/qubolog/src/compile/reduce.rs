use std::collections::BTreeMap;

use itertools::Itertools;

use super::{
	poly::{Coefficient, Id, Poly},
	Labels,
};
use crate::helpers::new_aux;

/// Finds the pair of variables that occurs most often in terms of degree three
/// or higher. Ties are broken by the smallest pair.
fn most_frequent_pair(poly: &Poly) -> Option<(Id, Id)> {
	let mut counts: BTreeMap<(Id, Id), usize> = BTreeMap::new();
	for (key, _) in poly.terms().filter(|(key, _)| key.len() > 2) {
		for (&x, &y) in key.iter().tuple_combinations() {
			*counts.entry((x, y)).or_default() += 1;
		}
	}
	counts
		.into_iter()
		.max_by(|(p1, c1), (p2, c2)| c1.cmp(c2).then(p2.cmp(p1)))
		.map(|(pair, _)| pair)
}

/// Label for the auxiliary variable of the pair `x·y`: `"x * y"`, or, when a
/// variable of the expression already uses that label, `"x * y_<n>"` for the
/// smallest `n` that is still free.
fn aux_label(vars: &Labels, x: Id, y: Id) -> String {
	let label = format!("{} * {}", vars.label(x), vars.label(y));
	if vars.get(&label).is_none() {
		return label;
	}
	let mut n = 1;
	loop {
		let candidate = format!("{label}_{n}");
		if vars.get(&candidate).is_none() {
			return candidate;
		}
		n += 1;
	}
}

/// Reduce all terms of `poly` to degree two or lower.
///
/// Each step replaces the most frequent pair `x·y` in the higher degree terms
/// by a new auxiliary variable `z`, labelled `"x * y"`, and adds the penalty
/// `strength·(3z + xy - 2xz - 2yz)`, which is zero if and only if `z = x·y`.
pub(super) fn reduce_degree(poly: &mut Poly, vars: &mut Labels, strength: f64) {
	while let Some((x, y)) = most_frequent_pair(poly) {
		let label = aux_label(vars, x, y);
		let z = new_aux!(vars, label);

		let mut reduced = Poly::default();
		for (mut key, coeff) in std::mem::take(poly).into_terms() {
			if key.len() > 2 && key.contains(&x) && key.contains(&y) {
				key.retain(|&v| v != x && v != y);
				if let Err(pos) = key.binary_search(&z) {
					key.insert(pos, z);
				}
			}
			reduced.add_term(key, coeff);
		}

		let c = |v: f64| Coefficient::constant(v * strength);
		reduced.add_term(vec![z], c(3.0));
		reduced.add_term(vec![x, y], c(1.0));
		reduced.add_term(vec![x.min(z), x.max(z)], c(-2.0));
		reduced.add_term(vec![y.min(z), y.max(z)], c(-2.0));
		*poly = reduced;
	}
}

#[cfg(test)]
mod tests {
	use itertools::iproduct;

	use super::*;
	use crate::{helpers::tests::binary_energy, CompileConfig, Expr};

	#[test]
	fn test_most_frequent_pair() {
		let mut p = Poly::default();
		p.add_term(vec![0, 1, 2], Coefficient::constant(1.0));
		p.add_term(vec![1, 2, 3], Coefficient::constant(1.0));
		p.add_term(vec![0, 1], Coefficient::constant(1.0));
		assert_eq!(most_frequent_pair(&p), Some((1, 2)));

		let mut q = Poly::default();
		q.add_term(vec![0, 1], Coefficient::constant(1.0));
		assert_eq!(most_frequent_pair(&q), None);
	}

	#[test]
	fn test_reduce_cubic() {
		let (a, b, c) = (Expr::binary("a"), Expr::binary("b"), Expr::binary("c"));
		let model = (&a * &b * &c).compile();
		assert_eq!(
			model.variables().collect::<Vec<_>>(),
			["a", "b", "c", "a * b"]
		);

		// With the auxiliary variable set consistently, the energy is abc
		for (va, vb, vc) in iproduct!(0..=1, 0..=1, 0..=1) {
			let aux = va * vb;
			let e = binary_energy(
				&model,
				&[("a", va), ("b", vb), ("c", vc), ("a * b", aux)],
			);
			assert_eq!(e, f64::from(va * vb * vc));
			// Inconsistent auxiliary values are penalised
			let e = binary_energy(
				&model,
				&[("a", va), ("b", vb), ("c", vc), ("a * b", 1 - aux)],
			);
			assert!(e > f64::from(va * vb * vc), "{va} {vb} {vc}: {e}");
		}
	}

	#[test]
	fn test_aux_label_avoids_expression_variables() {
		let (a, b, c) = (Expr::binary("a"), Expr::binary("b"), Expr::binary("c"));
		let w = Expr::binary("a * b");
		let model = (&a * &b * &c + 3.0 * &w).compile();
		assert_eq!(
			model.variables().collect::<Vec<_>>(),
			["a", "b", "c", "a * b", "a * b_1"]
		);
		let e = |vw, aux| {
			binary_energy(
				&model,
				&[("a", 1), ("b", 1), ("c", 1), ("a * b", vw), ("a * b_1", aux)],
			)
		};
		assert_eq!(e(0, 1), 1.0);
		assert_eq!(e(1, 1), 4.0);
		assert!(e(0, 0) > 1.0);
	}

	#[test]
	fn test_reduce_quartic_reuses_pairs() {
		let x = (0..4).map(|i| Expr::binary(format!("x{i}"))).collect::<Vec<_>>();
		let e = &x[0] * &x[1] * &x[2] * &x[3] + &x[0] * &x[1] * &x[2];
		let model = e.compile_with(CompileConfig { strength: 10.0 });
		assert_eq!(
			model.variables().collect::<Vec<_>>(),
			["x0", "x1", "x2", "x3", "x0 * x1", "x2 * x3"]
		);
		assert_eq!(model.to_bqm().unwrap().num_variables(), 6);
	}
}
