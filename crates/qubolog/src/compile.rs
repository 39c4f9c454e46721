//! Compilation of [`Expr`] trees into (quadratic) [`Model`]s.
//!
//! Compilation happens in two steps. First the expression is expanded into a
//! polynomial over binary variables, whose coefficients may refer to
//! placeholders. Spin variables `s` are replaced by `2·x - 1`, where `x` is a
//! binary variable with the same label. Then, terms of degree three or higher
//! are reduced to quadratic terms by introducing auxiliary variables.

pub(crate) mod poly;
mod reduce;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
	expression::{Condition, Expr, ExprKind},
	log,
	model::{CompiledConstraint, SubHamiltonian},
	Model,
};
use poly::{Coefficient, Id, Poly};

/// Settings used during the compilation of an expression
#[derive(Debug, Clone, PartialEq)]
pub struct CompileConfig {
	/// Weight of the penalty that enforces `z = x·y` for the auxiliary
	/// variables introduced to reduce the degree of the model.
	pub strength: f64,
}

impl Default for CompileConfig {
	fn default() -> Self {
		Self { strength: 5.0 }
	}
}

/// Bidirectional mapping between labels and their (dense) [`Id`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Labels {
	labels: Vec<String>,
	index: FxHashMap<String, Id>,
}

impl Labels {
	pub(crate) fn get(&self, label: &str) -> Option<Id> {
		self.index.get(label).copied()
	}

	/// Returns the id of `label`, registering it if it is not yet known.
	pub(crate) fn insert(&mut self, label: String) -> Id {
		if let Some(id) = self.get(&label) {
			return id;
		}
		let id = self.labels.len();
		self.labels.push(label.clone());
		let _ = self.index.insert(label, id);
		id
	}

	pub(crate) fn label(&self, id: Id) -> &str {
		&self.labels[id]
	}

	pub(crate) fn iter(&self) -> impl ExactSizeIterator<Item = &str> {
		self.labels.iter().map(String::as_str)
	}
}

struct Compiler {
	vars: Labels,
	params: Labels,
	sub_hamiltonians: Vec<SubHamiltonian>,
	constraints: Vec<CompiledConstraint>,
	penalties: Vec<Poly>,
	/// Labels of sub-Hamiltonians, constraints and penalties already seen
	seen: FxHashSet<String>,
}

impl Compiler {
	fn new() -> Self {
		Self {
			vars: Labels::default(),
			params: Labels::default(),
			sub_hamiltonians: Vec::new(),
			constraints: Vec::new(),
			penalties: Vec::new(),
			seen: FxHashSet::default(),
		}
	}

	fn expand(&mut self, expr: &Expr) -> Poly {
		match expr.kind() {
			ExprKind::Num(v) => Poly::constant(Coefficient::constant(*v)),
			ExprKind::Binary(lbl) => Poly::var(self.vars.insert(lbl.clone())),
			ExprKind::Spin(lbl) => {
				let mut p = Poly::var(self.vars.insert(lbl.clone())).scale(2.0);
				p.add(&Poly::constant(Coefficient::constant(-1.0)));
				p
			}
			ExprKind::Placeholder(lbl) => {
				Poly::constant(Coefficient::placeholder(self.params.insert(lbl.clone())))
			}
			ExprKind::Add(children) => {
				let mut p = Poly::default();
				for child in children {
					p.add(&self.expand(child));
				}
				p
			}
			ExprKind::Mul(lhs, rhs) => {
				let lhs = self.expand(lhs);
				lhs.mul(&self.expand(rhs))
			}
			ExprKind::UserDefined(expr) => self.expand(expr),
			ExprKind::SubH { expr, label } => {
				let p = self.expand(expr);
				if self.seen.insert(label.clone()) {
					self.sub_hamiltonians.push(SubHamiltonian {
						label: label.clone(),
						poly: p.clone(),
					});
				}
				p
			}
			ExprKind::Constraint {
				expr,
				label,
				condition,
			} => {
				let p = self.expand(expr);
				if self.seen.insert(label.clone()) {
					self.constraints.push(CompiledConstraint {
						label: label.clone(),
						poly: p.clone(),
						condition: Condition::clone(condition),
					});
				}
				p
			}
			ExprKind::WithPenalty {
				expr,
				penalty,
				label,
			} => {
				let p = self.expand(expr);
				if self.seen.insert(format!("penalty:{label}")) {
					let penalty = self.expand(penalty);
					self.penalties.push(penalty);
				}
				p
			}
		}
	}
}

/// Compile `expr` into a quadratic [`Model`].
pub(crate) fn compile(expr: &Expr, config: &CompileConfig) -> Model {
	let mut compiler = Compiler::new();
	let mut poly = compiler.expand(expr);
	for penalty in &compiler.penalties {
		poly.add(penalty);
	}
	log!(
		"expanded expression into {} terms of degree {}",
		poly.terms().count(),
		poly.degree()
	);

	reduce::reduce_degree(&mut poly, &mut compiler.vars, config.strength);
	debug_assert!(poly.degree() <= 2);

	Model::new(
		compiler.vars,
		compiler.params,
		poly,
		compiler.sub_hamiltonians,
		compiler.constraints,
	)
}
