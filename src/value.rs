//! Dynamic field values and the type tags schemas declare for them.
//!
//! A [`Config`](crate::Config) holds heterogeneous fields, so values travel
//! as [`Value`] and schemas describe what they accept with a [`TypeSpec`].
//! `Value::Null` stands for "unset": type, domain and range rules never look
//! at it, only the `required` rule does.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A configuration value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Scalars are the values allowed as domain members.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::List(_) | Value::Map(_))
    }

    /// Name of the variant, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Numeric ordering across `Int` and `Float`. `None` when either side is
    /// not a number or the comparison involves NaN.
    pub fn cmp_number(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "none"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_nested(f, item)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key:?}: ")?;
                    write_nested(f, item)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Strings nested in containers are quoted so `["a, b"]` stays readable.
fn write_nested(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Str(s) => write!(f, "{s:?}"),
        other => write!(f, "{other}"),
    }
}

macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl From<toml::Value> for Value {
    fn from(v: toml::Value) -> Self {
        match v {
            toml::Value::String(s) => Value::Str(s),
            toml::Value::Integer(i) => Value::Int(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(d) => Value::Str(d.to_string()),
            toml::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            toml::Value::Table(table) => Value::Map(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map_or(Value::Null, Value::Float),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// A runtime type a field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
    /// Any non-null value.
    Any,
}

impl FieldType {
    /// Parse a type name as written in schema documents.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bool" | "boolean" => Some(FieldType::Bool),
            "int" | "integer" => Some(FieldType::Int),
            "float" => Some(FieldType::Float),
            "str" | "string" => Some(FieldType::Str),
            "list" | "array" => Some(FieldType::List),
            "map" | "dict" | "table" => Some(FieldType::Map),
            "any" => Some(FieldType::Any),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Str => "str",
            FieldType::List => "list",
            FieldType::Map => "map",
            FieldType::Any => "any",
        }
    }

    pub fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => false,
            (FieldType::Any, _) => true,
            (FieldType::Bool, Value::Bool(_))
            | (FieldType::Int, Value::Int(_))
            | (FieldType::Float, Value::Float(_))
            | (FieldType::Str, Value::Str(_))
            | (FieldType::List, Value::List(_))
            | (FieldType::Map, Value::Map(_)) => true,
            _ => false,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Int | FieldType::Float)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The declared type of a field: one type, or an ordered tuple of
/// alternatives whose first entry is the primary type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    Single(FieldType),
    Tuple(Vec<FieldType>),
}

impl TypeSpec {
    pub fn types(&self) -> &[FieldType] {
        match self {
            TypeSpec::Single(t) => std::slice::from_ref(t),
            TypeSpec::Tuple(ts) => ts,
        }
    }

    /// The type CLI tokens are coerced to. `None` only for an empty tuple,
    /// which schema compilation rejects.
    pub fn primary(&self) -> Option<FieldType> {
        self.types().first().copied()
    }

    pub fn accepts(&self, value: &Value) -> bool {
        self.types().iter().any(|t| t.matches(value))
    }

    /// True only for a plain `bool` declaration; those fields get an
    /// auto-inverted twin.
    pub fn is_bool(&self) -> bool {
        matches!(self, TypeSpec::Single(FieldType::Bool))
    }
}

impl From<FieldType> for TypeSpec {
    fn from(t: FieldType) -> Self {
        TypeSpec::Single(t)
    }
}

impl From<Vec<FieldType>> for TypeSpec {
    fn from(ts: Vec<FieldType>) -> Self {
        TypeSpec::Tuple(ts)
    }
}

impl<const N: usize> From<[FieldType; N]> for TypeSpec {
    fn from(ts: [FieldType; N]) -> Self {
        TypeSpec::Tuple(ts.to_vec())
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Single(t) => write!(f, "{t}"),
            TypeSpec::Tuple(ts) => {
                let names: Vec<&str> = ts.iter().map(|t| t.name()).collect();
                write!(f, "({})", names.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_does_not_match_float_or_bool() {
        assert!(FieldType::Int.matches(&Value::Int(3)));
        assert!(!FieldType::Int.matches(&Value::Float(3.0)));
        assert!(!FieldType::Int.matches(&Value::Bool(true)));
        assert!(!FieldType::Float.matches(&Value::Int(4)));
    }

    #[test]
    fn any_matches_everything_but_null() {
        assert!(FieldType::Any.matches(&Value::from("x")));
        assert!(FieldType::Any.matches(&Value::from(vec![1, 2])));
        assert!(!FieldType::Any.matches(&Value::Null));
    }

    #[test]
    fn tuple_accepts_any_member_type() {
        let spec = TypeSpec::from([FieldType::Int, FieldType::Str, FieldType::List]);
        assert!(spec.accepts(&Value::Int(0)));
        assert!(spec.accepts(&Value::from("ab")));
        assert!(spec.accepts(&Value::from(vec![1, 2])));
        assert!(!spec.accepts(&Value::Float(1.5)));
        assert_eq!(spec.primary(), Some(FieldType::Int));
    }

    #[test]
    fn only_single_bool_is_bool() {
        assert!(TypeSpec::from(FieldType::Bool).is_bool());
        assert!(!TypeSpec::from([FieldType::Bool]).is_bool());
        assert!(!TypeSpec::from(FieldType::Int).is_bool());
    }

    #[test]
    fn numbers_compare_across_variants() {
        assert_eq!(Value::Int(1).cmp_number(&Value::Float(1.5)), Some(Ordering::Less));
        assert_eq!(Value::Float(5.0).cmp_number(&Value::Int(5)), Some(Ordering::Equal));
        assert_eq!(Value::from("a").cmp_number(&Value::Int(1)), None);
    }

    #[test]
    fn type_names_parse() {
        assert_eq!(FieldType::from_name("int"), Some(FieldType::Int));
        assert_eq!(FieldType::from_name("string"), Some(FieldType::Str));
        assert_eq!(FieldType::from_name("strr"), None);
    }

    #[test]
    fn toml_values_convert() {
        let table: toml::Table = toml::from_str("a = [1, \"x\"]\nb = 2.5").unwrap();
        let value = Value::from(toml::Value::Table(table));
        let Value::Map(map) = value else {
            panic!("expected a map");
        };
        assert_eq!(map["a"], Value::List(vec![Value::Int(1), Value::from("x")]));
        assert_eq!(map["b"], Value::Float(2.5));
    }

    #[test]
    fn json_values_convert() {
        let json: serde_json::Value = serde_json::from_str(r#"{"n": 3, "l": [true, null]}"#).unwrap();
        let Value::Map(map) = Value::from(json) else {
            panic!("expected a map");
        };
        assert_eq!(map["n"], Value::Int(3));
        assert_eq!(map["l"], Value::List(vec![Value::Bool(true), Value::Null]));
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::Null.to_string(), "none");
        assert_eq!(Value::from("guest").to_string(), "guest");
        assert_eq!(Value::from(vec!["a", "b"]).to_string(), r#"["a", "b"]"#);
        assert_eq!(Value::Bool(false).to_string(), "false");
    }
}
