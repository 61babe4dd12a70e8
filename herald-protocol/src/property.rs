//! ## herald-protocol::property
//! **Ordered, typed, multi-valued key/value sets**
//!
//! A [`PropertySet`] maps unique, case-sensitive names to one or more values
//! of a single [`ValueKind`]. Insertion order is kept so that enumeration is
//! stable, but order is not part of equality for wire purposes (see
//! [`PropertySet::same_entries`]).

use std::fmt;

use thiserror::Error;

/// Errors raised when mutating a property set.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PropertyError {
    #[error("Property '{name}' holds {existing} values, cannot add a {offered}")]
    TypeMismatch {
        name: String,
        existing: ValueKind,
        offered: ValueKind,
    },
    #[error("Property '{0}' must have at least one value")]
    EmptyArray(String),
}

/// The closed set of scalar kinds a property can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    DateTime,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Short => "short",
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::String => "string",
            ValueKind::DateTime => "datetime",
        };
        f.write_str(name)
    }
}

/// A single scalar property value.
///
/// `DateTime` carries signed nanoseconds since the Unix epoch (UTC).
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    DateTime(i64),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Short(_) => ValueKind::Short,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Float(_) => ValueKind::Float,
            Value::Double(_) => ValueKind::Double,
            Value::String(_) => ValueKind::String,
            Value::DateTime(_) => ValueKind::DateTime,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Widens any integral kind (including datetime) to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Short(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) | Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    /// Narrows an integral kind to `i32`, `None` if it does not fit.
    pub fn as_i32(&self) -> Option<i32> {
        self.as_i64().and_then(|v| i32::try_from(v).ok())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Short(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::DateTime(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Short(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Property {
    name: String,
    // never empty, every element shares one kind
    values: Vec<Value>,
}

impl Property {
    fn kind(&self) -> ValueKind {
        self.values[0].kind()
    }
}

/// Ordered mapping from property name to one or more values of one kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertySet {
    entries: Vec<Property>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|p| p.name == name)
    }

    /// Sets `name` to a single value, replacing any previous values and kind.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].values = vec![value],
            None => self.entries.push(Property {
                name,
                values: vec![value],
            }),
        }
    }

    /// Sets `name` to an array of values that must all share one kind.
    pub fn set_array(
        &mut self,
        name: impl Into<String>,
        values: Vec<Value>,
    ) -> Result<(), PropertyError> {
        let name = name.into();
        let Some(first) = values.first() else {
            return Err(PropertyError::EmptyArray(name));
        };
        let kind = first.kind();
        if let Some(bad) = values.iter().find(|v| v.kind() != kind) {
            return Err(PropertyError::TypeMismatch {
                name,
                existing: kind,
                offered: bad.kind(),
            });
        }
        match self.position(&name) {
            Some(idx) => self.entries[idx].values = values,
            None => self.entries.push(Property { name, values }),
        }
        Ok(())
    }

    /// Appends a value to `name`, creating it if absent.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), PropertyError> {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => {
                let existing = self.entries[idx].kind();
                if existing != value.kind() {
                    return Err(PropertyError::TypeMismatch {
                        name,
                        existing,
                        offered: value.kind(),
                    });
                }
                self.entries[idx].values.push(value);
            }
            None => self.entries.push(Property {
                name,
                values: vec![value],
            }),
        }
        Ok(())
    }

    /// Returns the last value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.get_array(name).and_then(|values| values.last())
    }

    pub fn get_array(&self, name: &str) -> Option<&[Value]> {
        self.position(name)
            .map(|idx| self.entries[idx].values.as_slice())
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_short(&self, name: &str) -> Option<i16> {
        match self.get(name)? {
            Value::Short(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        match self.get(name)? {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_long(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_double(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_datetime(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn kind_of(&self, name: &str) -> Option<ValueKind> {
        self.position(name).map(|idx| self.entries[idx].kind())
    }

    /// Removes `name`, returning its values if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Vec<Value>> {
        self.position(name)
            .map(|idx| self.entries.remove(idx).values)
    }

    /// Property names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|p| p.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.entries
            .iter()
            .map(|p| (p.name.as_str(), p.values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of this set without the names `exclude` accepts.
    pub fn filtered<F>(&self, mut exclude: F) -> PropertySet
    where
        F: FnMut(&str) -> bool,
    {
        PropertySet {
            entries: self
                .entries
                .iter()
                .filter(|p| !exclude(&p.name))
                .cloned()
                .collect(),
        }
    }

    /// Copies every property of `other` into `self`, replacing same-named ones.
    pub fn combine(&mut self, other: &PropertySet) {
        for property in &other.entries {
            match self.position(&property.name) {
                Some(idx) => self.entries[idx].values = property.values.clone(),
                None => self.entries.push(property.clone()),
            }
        }
    }

    /// Order-independent comparison of names and values.
    pub fn same_entries(&self, other: &PropertySet) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|p| other.get_array(&p.name) == Some(p.values.as_slice()))
    }
}

impl fmt::Display for PropertySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for property in &self.entries {
            write!(f, "{} = ", property.name)?;
            if property.values.len() == 1 {
                write_value(f, &property.values[0])?;
            } else {
                f.write_str("[ ")?;
                for (i, value) in property.values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_value(f, value)?;
                }
                f.write_str(" ]")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => write!(f, "\"{s}\""),
        other => write!(f, "{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_value_and_kind() {
        let mut ps = PropertySet::new();
        ps.set("LOOPNUM", 3);
        ps.set("LOOPNUM", "three");
        assert_eq!(ps.len(), 1);
        assert_eq!(ps.get_string("LOOPNUM"), Some("three"));
        assert_eq!(ps.get_int("LOOPNUM"), None);
    }

    #[test]
    fn add_builds_arrays_of_one_kind() {
        let mut ps = PropertySet::new();
        ps.add("ccd", 1).unwrap();
        ps.add("ccd", 2).unwrap();
        assert_eq!(
            ps.get_array("ccd"),
            Some(&[Value::Int(1), Value::Int(2)][..])
        );
        assert_eq!(ps.get_int("ccd"), Some(2));

        let err = ps.add("ccd", 2.5).unwrap_err();
        assert_eq!(
            err,
            PropertyError::TypeMismatch {
                name: "ccd".into(),
                existing: ValueKind::Int,
                offered: ValueKind::Double,
            }
        );
    }

    #[test]
    fn set_array_rejects_mixed_and_empty() {
        let mut ps = PropertySet::new();
        assert!(matches!(
            ps.set_array("x", vec![]),
            Err(PropertyError::EmptyArray(_))
        ));
        assert!(matches!(
            ps.set_array("x", vec![Value::Int(1), Value::Long(2)]),
            Err(PropertyError::TypeMismatch { .. })
        ));
        assert!(!ps.exists("x"));
    }

    #[test]
    fn names_keep_insertion_order() {
        let mut ps = PropertySet::new();
        ps.set("b", 1);
        ps.set("a", 2);
        ps.set("c", 3);
        ps.set("a", 4);
        assert_eq!(ps.names().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        ps.remove("a");
        assert_eq!(ps.names().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn clone_is_deep() {
        let mut original = PropertySet::new();
        original.set("STATUS", "ok");
        let mut copy = original.clone();
        copy.set("STATUS", "changed");
        assert_eq!(original.get_string("STATUS"), Some("ok"));
    }

    #[test]
    fn same_entries_ignores_order() {
        let mut a = PropertySet::new();
        a.set("x", 1);
        a.set("y", "two");
        let mut b = PropertySet::new();
        b.set("y", "two");
        b.set("x", 1);
        assert!(a.same_entries(&b));
        assert_ne!(a, b);
        b.set("x", 2);
        assert!(!a.same_entries(&b));
    }

    #[test]
    fn filtered_and_combine() {
        let mut ps = PropertySet::new();
        ps.set("TYPE", "_E");
        ps.set("custom", 1.5);
        let custom = ps.filtered(|name| name == "TYPE");
        assert_eq!(custom.names().collect::<Vec<_>>(), vec!["custom"]);

        let mut extra = PropertySet::new();
        extra.set("custom", 2.5);
        extra.set("FOO", "bar");
        ps.combine(&extra);
        assert_eq!(ps.get_double("custom"), Some(2.5));
        assert_eq!(ps.get_string("FOO"), Some("bar"));
    }

    #[test]
    fn integral_widening() {
        assert_eq!(Value::Short(-3).as_i64(), Some(-3));
        assert_eq!(Value::Long(i64::MAX).as_i32(), None);
        assert_eq!(Value::Int(7).as_i32(), Some(7));
        assert_eq!(Value::Double(1.0).as_i64(), None);
    }
}
