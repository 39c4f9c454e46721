use std::{
	fmt::{self, Display},
	hash::{Hash, Hasher},
	iter::Sum,
	mem,
	ops::{Add, Div, Mul, Neg, Sub},
	sync::Arc,
};

use itertools::Itertools;

use crate::{
	compile::{self, CompileConfig},
	Model,
};

/// Condition over the energy of a constraint that decides whether the
/// constraint is satisfied.
pub type Condition = Arc<dyn Fn(f64) -> bool + Send + Sync>;

/// An immutable symbolic expression over binary variables, spin variables
/// and placeholders.
///
/// Expressions are cheap to clone: sub-expressions are shared. Equality and
/// hashing are structural, which means that `a + b` and `b + a` are different
/// expressions, even though they describe the same function.
#[derive(Clone)]
pub struct Expr(Arc<ExprKind>);

/// The different nodes of an [`Expr`] tree.
pub enum ExprKind {
	/// Sum of all children
	Add(Vec<Expr>),
	/// Product of two expressions
	Mul(Expr, Expr),
	/// A variable taking values in `{0, 1}`
	Binary(String),
	/// A variable taking values in `{-1, +1}`
	Spin(String),
	/// A constant to be given at evaluation time
	Placeholder(String),
	/// A named part of the model, whose energy is reported when decoding
	SubH { expr: Expr, label: String },
	/// A named part of the model that is satisfied when its energy meets the
	/// condition
	Constraint {
		expr: Expr,
		label: String,
		condition: Condition,
	},
	/// An expression whose penalty is added (once) to the model that contains it
	WithPenalty {
		expr: Expr,
		penalty: Expr,
		label: String,
	},
	/// Wrapper around an expression constructed by a library or user function
	UserDefined(Expr),
	/// A numeric literal
	Num(f64),
}

impl Expr {
	fn new(kind: ExprKind) -> Self {
		Self(Arc::new(kind))
	}

	pub fn binary(label: impl Into<String>) -> Self {
		Self::new(ExprKind::Binary(label.into()))
	}

	pub fn spin(label: impl Into<String>) -> Self {
		Self::new(ExprKind::Spin(label.into()))
	}

	pub fn placeholder(label: impl Into<String>) -> Self {
		Self::new(ExprKind::Placeholder(label.into()))
	}

	pub fn num(value: f64) -> Self {
		Self::new(ExprKind::Num(value))
	}

	/// Mark `expr` as a sub-Hamiltonian named `label`.
	pub fn sub_h(expr: impl Into<Expr>, label: impl Into<String>) -> Self {
		Self::new(ExprKind::SubH {
			expr: expr.into(),
			label: label.into(),
		})
	}

	/// Mark `expr` as a constraint named `label`, which is satisfied when its
	/// energy is zero.
	pub fn constraint(expr: impl Into<Expr>, label: impl Into<String>) -> Self {
		Self::constraint_with(expr, label, |energy| energy == 0.0)
	}

	/// Mark `expr` as a constraint named `label`, which is satisfied when its
	/// energy meets `condition`.
	pub fn constraint_with<F>(expr: impl Into<Expr>, label: impl Into<String>, condition: F) -> Self
	where
		F: Fn(f64) -> bool + Send + Sync + 'static,
	{
		Self::new(ExprKind::Constraint {
			expr: expr.into(),
			label: label.into(),
			condition: Arc::new(condition),
		})
	}

	/// Attach `penalty` to `expr`. The penalty is added once to any model that
	/// contains the resulting expression, regardless of how often it occurs.
	pub fn with_penalty(
		expr: impl Into<Expr>,
		penalty: impl Into<Expr>,
		label: impl Into<String>,
	) -> Self {
		Self::new(ExprKind::WithPenalty {
			expr: expr.into(),
			penalty: penalty.into(),
			label: label.into(),
		})
	}

	pub fn user_defined(expr: impl Into<Expr>) -> Self {
		Self::new(ExprKind::UserDefined(expr.into()))
	}

	pub fn kind(&self) -> &ExprKind {
		&self.0
	}

	/// Returns the value of the expression if it is a numeric literal.
	pub fn as_num(&self) -> Option<f64> {
		match self.kind() {
			ExprKind::Num(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the label of the expression if it is a variable, placeholder or
	/// (named) sub-Hamiltonian.
	pub fn label(&self) -> Option<&str> {
		match self.kind() {
			ExprKind::Binary(lbl)
			| ExprKind::Spin(lbl)
			| ExprKind::Placeholder(lbl)
			| ExprKind::SubH { label: lbl, .. }
			| ExprKind::Constraint { label: lbl, .. }
			| ExprKind::WithPenalty { label: lbl, .. } => Some(lbl),
			_ => None,
		}
	}

	/// Raise the expression to the power `exp` by repeated multiplication.
	pub fn pow(&self, exp: u32) -> Self {
		(0..exp).fold(Expr::num(1.0), |acc, _| acc * self)
	}

	/// Compile the expression into a [`Model`] using the default
	/// [`CompileConfig`].
	pub fn compile(&self) -> Model {
		self.compile_with(CompileConfig::default())
	}

	pub fn compile_with(&self, config: CompileConfig) -> Model {
		compile::compile(self, &config)
	}
}

fn add(mut lhs: Expr, rhs: Expr) -> Expr {
	match (lhs.as_num(), rhs.as_num()) {
		(Some(l), Some(r)) => Expr::num(l + r),
		(Some(0.0), _) => rhs,
		(_, Some(0.0)) => lhs,
		_ => {
			// Append in place when nothing else refers to the left-hand sum
			if let Some(ExprKind::Add(children)) = Arc::get_mut(&mut lhs.0) {
				children.push(rhs);
				return lhs;
			}
			let children = match lhs.kind() {
				ExprKind::Add(children) => children.iter().cloned().chain([rhs]).collect(),
				_ => vec![lhs, rhs],
			};
			Expr::new(ExprKind::Add(children))
		}
	}
}

fn mul(lhs: Expr, rhs: Expr) -> Expr {
	match (lhs.as_num(), rhs.as_num()) {
		(Some(l), Some(r)) => Expr::num(l * r),
		(Some(1.0), _) => rhs,
		(_, Some(1.0)) => lhs,
		_ => Expr::new(ExprKind::Mul(lhs, rhs)),
	}
}

fn sub(lhs: Expr, rhs: Expr) -> Expr {
	add(lhs, -rhs)
}

macro_rules! impl_bin_op {
	($tr:ident, $method:ident, $func:ident) => {
		impl<R: Into<Expr>> $tr<R> for Expr {
			type Output = Expr;
			fn $method(self, rhs: R) -> Expr {
				$func(self, rhs.into())
			}
		}

		impl<R: Into<Expr>> $tr<R> for &Expr {
			type Output = Expr;
			fn $method(self, rhs: R) -> Expr {
				$func(self.clone(), rhs.into())
			}
		}

		impl $tr<Expr> for f64 {
			type Output = Expr;
			fn $method(self, rhs: Expr) -> Expr {
				$func(Expr::num(self), rhs)
			}
		}

		impl $tr<&Expr> for f64 {
			type Output = Expr;
			fn $method(self, rhs: &Expr) -> Expr {
				$func(Expr::num(self), rhs.clone())
			}
		}
	};
}

impl_bin_op!(Add, add, add);
impl_bin_op!(Mul, mul, mul);
impl_bin_op!(Sub, sub, sub);

impl Div<f64> for Expr {
	type Output = Expr;
	fn div(self, rhs: f64) -> Expr {
		mul(self, Expr::num(1.0 / rhs))
	}
}

impl Div<f64> for &Expr {
	type Output = Expr;
	fn div(self, rhs: f64) -> Expr {
		self.clone() / rhs
	}
}

impl Neg for Expr {
	type Output = Expr;
	fn neg(self) -> Expr {
		mul(Expr::num(-1.0), self)
	}
}

impl Neg for &Expr {
	type Output = Expr;
	fn neg(self) -> Expr {
		-self.clone()
	}
}

impl Sum for Expr {
	fn sum<I: Iterator<Item = Expr>>(iter: I) -> Self {
		iter.fold(Expr::num(0.0), add)
	}
}

impl<'a> Sum<&'a Expr> for Expr {
	fn sum<I: Iterator<Item = &'a Expr>>(iter: I) -> Self {
		iter.cloned().sum()
	}
}

impl From<f64> for Expr {
	fn from(value: f64) -> Self {
		Expr::num(value)
	}
}

impl From<i32> for Expr {
	fn from(value: i32) -> Self {
		Expr::num(f64::from(value))
	}
}

impl From<&Expr> for Expr {
	fn from(value: &Expr) -> Self {
		value.clone()
	}
}

/// Bit pattern used to hash numeric literals, identifying `0.0` and `-0.0`.
fn num_bits(v: f64) -> u64 {
	if v == 0.0 {
		0.0_f64.to_bits()
	} else {
		v.to_bits()
	}
}

impl PartialEq for Expr {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0) || self.kind() == other.kind()
	}
}

impl Eq for Expr {}

impl Hash for Expr {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.kind().hash(state);
	}
}

impl PartialEq for ExprKind {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(ExprKind::Add(a), ExprKind::Add(b)) => a == b,
			(ExprKind::Mul(a1, a2), ExprKind::Mul(b1, b2)) => a1 == b1 && a2 == b2,
			(ExprKind::Binary(a), ExprKind::Binary(b))
			| (ExprKind::Spin(a), ExprKind::Spin(b))
			| (ExprKind::Placeholder(a), ExprKind::Placeholder(b)) => a == b,
			(ExprKind::SubH { expr: a, label: la }, ExprKind::SubH { expr: b, label: lb })
			| (
				ExprKind::Constraint {
					expr: a, label: la, ..
				},
				ExprKind::Constraint {
					expr: b, label: lb, ..
				},
			) => la == lb && a == b,
			(
				ExprKind::WithPenalty {
					expr: a,
					penalty: pa,
					label: la,
				},
				ExprKind::WithPenalty {
					expr: b,
					penalty: pb,
					label: lb,
				},
			) => la == lb && a == b && pa == pb,
			(ExprKind::UserDefined(a), ExprKind::UserDefined(b)) => a == b,
			(ExprKind::Num(a), ExprKind::Num(b)) => num_bits(*a) == num_bits(*b),
			_ => false,
		}
	}
}

impl Eq for ExprKind {}

impl Hash for ExprKind {
	fn hash<H: Hasher>(&self, state: &mut H) {
		mem::discriminant(self).hash(state);
		match self {
			ExprKind::Add(children) => children.hash(state),
			ExprKind::Mul(lhs, rhs) => {
				lhs.hash(state);
				rhs.hash(state);
			}
			ExprKind::Binary(lbl) | ExprKind::Spin(lbl) | ExprKind::Placeholder(lbl) => {
				lbl.hash(state)
			}
			ExprKind::SubH { expr, label } => {
				label.hash(state);
				expr.hash(state);
			}
			// The condition cannot be hashed; the label identifies the constraint
			ExprKind::Constraint { label, .. } => label.hash(state),
			ExprKind::WithPenalty {
				expr,
				penalty,
				label,
			} => {
				label.hash(state);
				expr.hash(state);
				penalty.hash(state);
			}
			ExprKind::UserDefined(expr) => expr.hash(state),
			ExprKind::Num(v) => num_bits(*v).hash(state),
		}
	}
}

impl Display for Expr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.kind().fmt(f)
	}
}

impl fmt::Debug for Expr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{self}")
	}
}

impl Display for ExprKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ExprKind::Add(children) => write!(f, "({})", children.iter().format(" + ")),
			ExprKind::Mul(lhs, rhs) => write!(f, "({lhs} * {rhs})"),
			ExprKind::Binary(lbl) => write!(f, "Binary('{lbl}')"),
			ExprKind::Spin(lbl) => write!(f, "Spin('{lbl}')"),
			ExprKind::Placeholder(lbl) => write!(f, "Placeholder('{lbl}')"),
			ExprKind::SubH { expr, label } => write!(f, "SubH({expr}, '{label}')"),
			ExprKind::Constraint { expr, label, .. } => write!(f, "Constraint({expr}, '{label}')"),
			ExprKind::WithPenalty {
				expr,
				penalty,
				label,
			} => write!(f, "WithPenalty({expr}, {penalty}, '{label}')"),
			ExprKind::UserDefined(expr) => write!(f, "{expr}"),
			ExprKind::Num(v) => write!(f, "{v:?}"),
		}
	}
}

impl fmt::Debug for ExprKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{self}")
	}
}
