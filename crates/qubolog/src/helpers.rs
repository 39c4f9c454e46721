#[cfg(not(any(feature = "tracing", test)))]
macro_rules! new_aux {
	($vars:expr, $lbl:expr) => {
		$vars.insert($lbl)
	};
}

/// Helper marco to create a new auxiliary variable during compilation
#[cfg(any(feature = "tracing", test))]
macro_rules! new_aux {
	($vars:expr, $lbl:expr) => {{
		let lbl: String = $lbl;
		tracing::info!(label = %lbl, "new auxiliary variable");
		$vars.insert(lbl)
	}};
}

pub(crate) use new_aux;

/// Sorts the pair so that the smaller element comes first.
pub(crate) fn ordered<T: Ord>(a: T, b: T) -> (T, T) {
	if a <= b {
		(a, b)
	} else {
		(b, a)
	}
}

/// Geometric interpolation between `start` and `end` (inclusive) in `steps`
/// steps.
pub(crate) fn geomspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
	match steps {
		0 => Vec::new(),
		1 => vec![end],
		_ => {
			let ratio = (end / start).powf(1.0 / (steps - 1) as f64);
			(0..steps)
				.map(|i| {
					if i + 1 == steps {
						end
					} else {
						start * ratio.powi(i as i32)
					}
				})
				.collect()
		}
	}
}

#[cfg(test)]
pub(crate) mod tests {
	macro_rules! expect_file {
		($rel_path:expr) => {
			expect_test::expect_file!(format!(
				"{}/corpus/{}",
				env!("CARGO_MANIFEST_DIR"),
				$rel_path
			))
		};
	}

	pub(crate) use expect_file;

	use expect_test::ExpectFile;
	use itertools::Itertools;

	use crate::{ExactSolver, Model, Sample, Sampler, Vartype};

	/// Helper function to quickly create a sample from label/value pairs.
	pub(crate) fn sample(pairs: &[(&str, i8)]) -> Sample {
		pairs.iter().map(|&(l, v)| (l.to_owned(), v)).collect()
	}

	/// Helper function to evaluate a model at a binary assignment given as
	/// label/value pairs.
	pub(crate) fn binary_energy(model: &Model, pairs: &[(&str, i8)]) -> f64 {
		model.energy(&sample(pairs), Vartype::Binary).unwrap()
	}

	/// Helper functions to ensure that the ground states of a model, with
	/// relation to a set of variables, match the expected solutions string.
	///
	/// The ground states are found by exhaustive enumeration and each is shown
	/// as a line of `label=value` pairs.
	pub(crate) fn assert_ground_states(model: &Model, labels: &[&str], expect: &ExpectFile) {
		let bqm = model.to_bqm().unwrap();
		let sampleset = ExactSolver.sample(&bqm).unwrap();
		let ground = sampleset
			.record()
			.iter()
			.map(|r| r.energy)
			.fold(f64::INFINITY, f64::min);

		let sol_str = sampleset
			.samples()
			.zip(sampleset.record())
			.filter(|(_, r)| (r.energy - ground).abs() < 1e-9)
			.map(|(s, _)| labels.iter().map(|&l| (l, s[l])).collect_vec())
			.sorted()
			.dedup()
			.map(|sol| sol.into_iter().map(|(l, v)| format!("{l}={v}")).join(" "))
			.join("\n");
		expect.assert_eq(&sol_str);
	}
}
