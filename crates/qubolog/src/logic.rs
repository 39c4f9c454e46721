//! Logical gates and the penalty constraints that enforce them.
//!
//! The gate functions ([`not`], [`and`], [`or`], [`xor`]) build expressions
//! whose value is the result of the gate for binary inputs. The constraint
//! types ([`NotConst`], [`AndConst`], [`OrConst`], [`XorConst`]) instead build
//! a penalty: a polynomial that is zero when the output variable agrees with
//! the gate applied to its inputs, and positive otherwise.

use crate::{expression::ExprKind, CheckError, Checker, Expr, Valuation};

/// `1 - a`
pub fn not(a: &Expr) -> Expr {
	1.0 - a
}

/// `a·b`
pub fn and(a: &Expr, b: &Expr) -> Expr {
	a * b
}

/// `a + b - a·b`
pub fn or(a: &Expr, b: &Expr) -> Expr {
	a + b - a * b
}

/// `a + b - 2·a·b`
pub fn xor(a: &Expr, b: &Expr) -> Expr {
	a + b - 2.0 * a * b
}

/// Constraint enforcing `b = ¬a`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NotConst {
	a: Expr,
	b: Expr,
	label: String,
}

/// Constraint enforcing `c = a ∧ b`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AndConst {
	a: Expr,
	b: Expr,
	c: Expr,
	label: String,
}

/// Constraint enforcing `c = a ∨ b`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrConst {
	a: Expr,
	b: Expr,
	c: Expr,
	label: String,
}

/// Constraint enforcing `c = a ⊕ b`.
///
/// A quadratic penalty for XOR needs an auxiliary binary variable, labelled
/// `aux_<label>`. The penalty is zero exactly when `c = a ⊕ b` and the
/// auxiliary variable equals `a ∧ b`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XorConst {
	a: Expr,
	b: Expr,
	c: Expr,
	label: String,
}

impl NotConst {
	pub fn new(a: impl Into<Expr>, b: impl Into<Expr>, label: impl Into<String>) -> Self {
		Self {
			a: a.into(),
			b: b.into(),
			label: label.into(),
		}
	}

	/// `2ab - a - b + 1`
	pub fn expr(&self) -> Expr {
		let (a, b) = (&self.a, &self.b);
		let penalty = 2.0 * a * b - a - b + 1.0;
		Expr::user_defined(Expr::constraint(penalty, &self.label))
	}
}

impl AndConst {
	pub fn new(
		a: impl Into<Expr>,
		b: impl Into<Expr>,
		c: impl Into<Expr>,
		label: impl Into<String>,
	) -> Self {
		Self {
			a: a.into(),
			b: b.into(),
			c: c.into(),
			label: label.into(),
		}
	}

	/// `ab - 2(a + b)c + 3c`
	pub fn expr(&self) -> Expr {
		let (a, b, c) = (&self.a, &self.b, &self.c);
		let penalty = a * b - 2.0 * (a + b) * c + 3.0 * c;
		Expr::user_defined(Expr::constraint(penalty, &self.label))
	}
}

impl OrConst {
	pub fn new(
		a: impl Into<Expr>,
		b: impl Into<Expr>,
		c: impl Into<Expr>,
		label: impl Into<String>,
	) -> Self {
		Self {
			a: a.into(),
			b: b.into(),
			c: c.into(),
			label: label.into(),
		}
	}

	/// `ab + (a + b)(1 - 2c) + c`
	pub fn expr(&self) -> Expr {
		let (a, b, c) = (&self.a, &self.b, &self.c);
		let penalty = a * b + (a + b) * (1.0 - 2.0 * c) + c;
		Expr::user_defined(Expr::constraint(penalty, &self.label))
	}
}

impl XorConst {
	pub fn new(
		a: impl Into<Expr>,
		b: impl Into<Expr>,
		c: impl Into<Expr>,
		label: impl Into<String>,
	) -> Self {
		Self {
			a: a.into(),
			b: b.into(),
			c: c.into(),
			label: label.into(),
		}
	}

	/// Label of the auxiliary variable used by the penalty
	pub fn aux_label(&self) -> String {
		format!("aux_{}", self.label)
	}

	/// `2ab - 2(a + b)c - 4(a + b)x + 4xc + a + b + c + 4x`, where `x` is the
	/// auxiliary variable.
	pub fn expr(&self) -> Expr {
		let (a, b, c) = (&self.a, &self.b, &self.c);
		let x = &Expr::binary(self.aux_label());
		let penalty = 2.0 * a * b - 2.0 * (a + b) * c - 4.0 * (a + b) * x
			+ 4.0 * x * c
			+ a + b + c
			+ 4.0 * x;
		Expr::user_defined(Expr::constraint(penalty, &self.label))
	}
}

macro_rules! impl_into_expr {
	($($con:ident),*) => {$(
		impl From<$con> for Expr {
			fn from(con: $con) -> Self {
				con.expr()
			}
		}

		impl From<&$con> for Expr {
			fn from(con: &$con) -> Self {
				con.expr()
			}
		}
	)*};
}

impl_into_expr!(NotConst, AndConst, OrConst, XorConst);

/// Evaluate `expr` under the truth-values of `value`. Binary variables are
/// `0`/`1` and spin variables `-1`/`+1`.
fn eval<F: Valuation + ?Sized>(expr: &Expr, value: &F) -> Result<f64, CheckError> {
	let var = |lbl: &String| {
		value
			.value(lbl)
			.ok_or_else(|| CheckError::Unassigned(lbl.clone()))
	};
	Ok(match expr.kind() {
		ExprKind::Binary(lbl) => f64::from(u8::from(var(lbl)?)),
		ExprKind::Spin(lbl) => {
			if var(lbl)? {
				1.0
			} else {
				-1.0
			}
		}
		ExprKind::Num(v) => *v,
		ExprKind::Placeholder(lbl) => {
			return Err(CheckError::Fail(format!(
				"placeholder '{lbl}' cannot be used as a logical operand"
			)))
		}
		ExprKind::Add(children) => children
			.iter()
			.map(|e| eval(e, value))
			.sum::<Result<f64, _>>()?,
		ExprKind::Mul(lhs, rhs) => eval(lhs, value)? * eval(rhs, value)?,
		ExprKind::SubH { expr, .. }
		| ExprKind::Constraint { expr, .. }
		| ExprKind::WithPenalty { expr, .. }
		| ExprKind::UserDefined(expr) => eval(expr, value)?,
	})
}

fn truth<F: Valuation + ?Sized>(expr: &Expr, value: &F) -> Result<bool, CheckError> {
	Ok(eval(expr, value)? > 0.0)
}

fn check_gate(label: &str, gate: &str, expected: bool, found: bool) -> Result<(), CheckError> {
	if expected == found {
		Ok(())
	} else {
		Err(CheckError::Fail(format!(
			"constraint '{label}' violated: output is {found}, but the {gate} of the inputs is {expected}"
		)))
	}
}

impl Checker for NotConst {
	fn check<F: Valuation + ?Sized>(&self, value: &F) -> Result<(), CheckError> {
		let a = truth(&self.a, value)?;
		check_gate(&self.label, "negation", !a, truth(&self.b, value)?)
	}
}

impl Checker for AndConst {
	fn check<F: Valuation + ?Sized>(&self, value: &F) -> Result<(), CheckError> {
		let (a, b) = (truth(&self.a, value)?, truth(&self.b, value)?);
		check_gate(&self.label, "conjunction", a && b, truth(&self.c, value)?)
	}
}

impl Checker for OrConst {
	fn check<F: Valuation + ?Sized>(&self, value: &F) -> Result<(), CheckError> {
		let (a, b) = (truth(&self.a, value)?, truth(&self.b, value)?);
		check_gate(&self.label, "disjunction", a || b, truth(&self.c, value)?)
	}
}

impl Checker for XorConst {
	fn check<F: Valuation + ?Sized>(&self, value: &F) -> Result<(), CheckError> {
		let (a, b) = (truth(&self.a, value)?, truth(&self.b, value)?);
		check_gate(&self.label, "exclusive disjunction", a ^ b, truth(&self.c, value)?)
	}
}
