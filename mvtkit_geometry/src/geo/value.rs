use std::{
	fmt::{Debug, Display},
	hash::Hash,
};

/// A scalar attribute value.
///
/// Equality and hashing are logical: two `Double`s are equal when their bit patterns are equal, so values
/// can be interned in a hash map. Different variants never compare equal, e.g. `Int(1) != UInt(1)`.
#[derive(Clone)]
pub enum GeoValue {
	Bool(bool),
	Double(f64),
	Float(f32),
	Int(i64),
	Null,
	String(String),
	UInt(u64),
}

impl GeoValue {
	#[must_use]
	pub fn is_null(&self) -> bool {
		matches!(self, GeoValue::Null)
	}
}

impl Debug for GeoValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::String(v) => f.debug_tuple("String").field(v).finish(),
			Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
			Self::Double(v) => f.debug_tuple("Double").field(v).finish(),
			Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
			Self::UInt(v) => f.debug_tuple("UInt").field(v).finish(),
			Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
			Self::Null => f.debug_tuple("Null").finish(),
		}
	}
}

impl From<&str> for GeoValue {
	fn from(value: &str) -> Self {
		GeoValue::String(value.to_string())
	}
}

impl From<String> for GeoValue {
	fn from(value: String) -> Self {
		GeoValue::String(value)
	}
}

impl From<i32> for GeoValue {
	fn from(value: i32) -> Self {
		if value < 0 {
			GeoValue::Int(i64::from(value))
		} else {
			GeoValue::UInt(value as u64)
		}
	}
}

impl From<u32> for GeoValue {
	fn from(value: u32) -> Self {
		GeoValue::UInt(u64::from(value))
	}
}

impl From<i64> for GeoValue {
	fn from(value: i64) -> Self {
		GeoValue::Int(value)
	}
}

impl From<u64> for GeoValue {
	fn from(value: u64) -> Self {
		GeoValue::UInt(value)
	}
}

impl From<f32> for GeoValue {
	fn from(value: f32) -> Self {
		GeoValue::Float(value)
	}
}

impl From<f64> for GeoValue {
	fn from(value: f64) -> Self {
		GeoValue::Double(value)
	}
}

impl From<bool> for GeoValue {
	fn from(value: bool) -> Self {
		GeoValue::Bool(value)
	}
}

impl<T> From<Option<T>> for GeoValue
where
	GeoValue: From<T>,
{
	fn from(value: Option<T>) -> Self {
		value.map_or(GeoValue::Null, GeoValue::from)
	}
}

impl PartialEq for GeoValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(GeoValue::Bool(a), GeoValue::Bool(b)) => a == b,
			(GeoValue::Double(a), GeoValue::Double(b)) => a.to_bits() == b.to_bits(),
			(GeoValue::Float(a), GeoValue::Float(b)) => a.to_bits() == b.to_bits(),
			(GeoValue::Int(a), GeoValue::Int(b)) => a == b,
			(GeoValue::Null, GeoValue::Null) => true,
			(GeoValue::String(a), GeoValue::String(b)) => a == b,
			(GeoValue::UInt(a), GeoValue::UInt(b)) => a == b,
			_ => false,
		}
	}
}

impl Eq for GeoValue {}

impl Hash for GeoValue {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		core::mem::discriminant(self).hash(state);
		match self {
			GeoValue::Bool(v) => v.hash(state),
			GeoValue::Double(v) => v.to_bits().hash(state),
			GeoValue::Float(v) => v.to_bits().hash(state),
			GeoValue::Int(v) => v.hash(state),
			GeoValue::Null => (),
			GeoValue::String(v) => v.hash(state),
			GeoValue::UInt(v) => v.hash(state),
		}
	}
}

impl Display for GeoValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			GeoValue::Bool(v) => write!(f, "{v}"),
			GeoValue::Double(v) => write!(f, "{v}"),
			GeoValue::Float(v) => write!(f, "{v}"),
			GeoValue::Int(v) => write!(f, "{v}"),
			GeoValue::Null => f.write_str("null"),
			GeoValue::String(v) => f.write_str(v),
			GeoValue::UInt(v) => write!(f, "{v}"),
		}
	}
}
