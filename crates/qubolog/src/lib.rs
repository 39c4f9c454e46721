//! `qubolog` compiles symbolic expressions over binary and spin variables into
//! binary quadratic models (BQMs), which can then be evaluated, sampled and
//! decoded. Logical relations such as `c = a ∧ b` are expressed as penalty
//! constraints: polynomials that are zero exactly when the relation holds and
//! positive otherwise.
//!
//! ```
//! # use qubolog::{logic::AndConst, Expr, Sample, Vartype};
//! let (a, b, c) = (Expr::binary("a"), Expr::binary("b"), Expr::binary("c"));
//! let model = Expr::from(AndConst::new(a, b, c, "and")).compile();
//! let sample = Sample::from([("a".to_owned(), 1), ("b".to_owned(), 1), ("c".to_owned(), 1)]);
//! assert_eq!(model.energy(&sample, Vartype::Binary), Ok(0.0));
//! ```

pub mod array;
pub mod bqm;
pub mod compile;
pub mod expression;
pub(crate) mod helpers;
pub mod logic;
pub mod model;
pub mod sampler;

/// General log function
macro_rules! log {
    ($fmt:expr $(, $args:expr)* ) => {
        #[cfg(feature = "tracing")]
        tracing::info!($fmt $(, $args)*)
    }
}
pub(crate) use log;

use std::{
	collections::BTreeMap,
	error,
	fmt::{self, Display},
	str::FromStr,
};

use rustc_hash::FxHashMap;

pub use crate::{
	array::Array,
	bqm::BinaryQuadraticModel,
	compile::CompileConfig,
	expression::{Expr, ExprKind},
	model::{DecodedSample, Model},
	sampler::{
		anneal::{AnnealConfig, SimulatedAnnealingSampler},
		exact::ExactSolver,
		SampleRecord, SampleSet, Sampler,
	},
};

/// An assignment of values to variable labels. Depending on the [`Vartype`]
/// the values are either `0`/`1` or `-1`/`+1`.
pub type Sample = BTreeMap<String, i8>;

/// Values for the placeholders of a compiled model, keyed by label.
pub type FeedDict = FxHashMap<String, f64>;

/// Result is a type alias for [`std::result::Result`] that by default uses the
/// crate [`Error`] type.
pub type Result<T = (), E = Error> = std::result::Result<T, E>;

/// Checker is a trait implemented by types that represent constraints. The
/// [`Checker::check`] methods checks whether an assignment satisfies the
/// constraint.
pub trait Checker {
	/// Check whether the constraint represented by the object is violated.
	///
	/// - The method returns [`Result::Ok`] when the assignment satisfies the
	///   constraint,
	/// - it returns [`CheckError::Fail`] when the assignment violates the
	///   constraint.
	fn check<F: Valuation + ?Sized>(&self, value: &F) -> Result<(), CheckError>;
}

/// A trait implemented by types that can be used to represent a (partial)
/// assignment of truth-values to binary variables.
pub trait Valuation {
	/// Returns the truth-value of the variable with the given label, or `None`
	/// if the assignment does not contain it.
	fn value(&self, label: &str) -> Option<bool>;
}

/// The domain of the variables of a quadratic model or sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Vartype {
	/// Variables take values in `{0, 1}`
	Binary,
	/// Variables take values in `{-1, +1}`
	Spin,
}

/// Errors raised when evaluating, exporting or sampling models.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
	/// The sample does not assign the variable with the given label
	MissingVariable(String),
	/// No value was given for the placeholder with the given label
	MissingPlaceholder(String),
	/// A value outside of the domain of the vartype was given for a variable
	InvalidValue {
		label: String,
		value: i8,
		vartype: Vartype,
	},
	/// The given name does not correspond to a vartype
	UnknownVartype(String),
	/// The model is too large to be handled by the sampler
	TooManyVariables { found: usize, max: usize },
}

/// Errors relating to failing assignments
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd)]
pub enum CheckError {
	/// The valuation does not contain a value for the variable
	Unassigned(String),
	Fail(String),
}

impl Vartype {
	/// The name of the vartype, either `"BINARY"` or `"SPIN"`.
	pub fn name(&self) -> &'static str {
		match self {
			Vartype::Binary => "BINARY",
			Vartype::Spin => "SPIN",
		}
	}

	/// The two values a variable of this type can take, the value representing
	/// `false` first.
	pub fn values(&self) -> [i8; 2] {
		match self {
			Vartype::Binary => [0, 1],
			Vartype::Spin => [-1, 1],
		}
	}

	/// Converts a truth-value into the value of this vartype.
	pub fn from_bool(&self, b: bool) -> i8 {
		self.values()[usize::from(b)]
	}

	/// Converts a value of this vartype into its truth-value, failing when the
	/// value is outside of the domain.
	pub fn to_bool(&self, label: &str, value: i8) -> Result<bool> {
		match (self, value) {
			(Vartype::Binary, 0) | (Vartype::Spin, -1) => Ok(false),
			(_, 1) => Ok(true),
			_ => Err(Error::InvalidValue {
				label: label.to_owned(),
				value,
				vartype: *self,
			}),
		}
	}
}

impl Display for Vartype {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for Vartype {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"BINARY" => Ok(Vartype::Binary),
			"SPIN" => Ok(Vartype::Spin),
			_ => Err(Error::UnknownVartype(s.to_owned())),
		}
	}
}

impl Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::MissingVariable(lbl) => write!(f, "sample does not assign variable '{lbl}'"),
			Error::MissingPlaceholder(lbl) => write!(f, "no value given for placeholder '{lbl}'"),
			Error::InvalidValue {
				label,
				value,
				vartype,
			} => write!(
				f,
				"value {value} of variable '{label}' is not a valid {vartype} value"
			),
			Error::UnknownVartype(name) => {
				write!(f, "unknown vartype '{name}', expected BINARY or SPIN")
			}
			Error::TooManyVariables { found, max } => write!(
				f,
				"model has {found} variables, which exceeds the maximum of {max}"
			),
		}
	}
}

impl error::Error for Error {}

impl Display for CheckError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			CheckError::Unassigned(lbl) => write!(f, "variable '{lbl}' is not assigned"),
			CheckError::Fail(err) => err.fmt(f),
		}
	}
}

impl error::Error for CheckError {}

impl<F: Fn(&str) -> Option<bool>> Valuation for F {
	fn value(&self, label: &str) -> Option<bool> {
		self(label)
	}
}

/// Values are interpreted as truth-values regardless of vartype: `1` is true,
/// `0` and `-1` are false.
impl Valuation for Sample {
	fn value(&self, label: &str) -> Option<bool> {
		self.get(label).map(|&v| v > 0)
	}
}
