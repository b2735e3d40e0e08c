//! Config introspection: the listing behind [`Config::inspect_vars`].
//!
//! Each attribute is tagged with where its value comes from, so a reader can
//! tell stored fields from derived ones at a glance:
//!
//! ```text
//! S  sentence_ending_spaces = 2
//! C  spaces = "  "
//! S  no_wrap = false
//! I  wrap = true
//! ```

use std::fmt;

use crate::config::Config;
use crate::value::Value;

/// Where an attribute's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarOrigin {
    /// Stored, declared by a schema.
    Schema,
    /// Derived by a computed function on every read.
    Computed,
    /// Negation of a stored `bool` field.
    Inverted,
}

impl VarOrigin {
    pub fn tag(self) -> char {
        match self {
            VarOrigin::Schema => 'S',
            VarOrigin::Computed => 'C',
            VarOrigin::Inverted => 'I',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarEntry {
    pub name: String,
    pub value: String,
    pub origin: VarOrigin,
}

/// Every attribute of a config with its current value, in declaration
/// order. Derived attributes follow the field they derive from.
#[derive(Debug, Clone, PartialEq)]
pub struct VarListing {
    pub entries: Vec<VarEntry>,
}

impl VarListing {
    pub fn get(&self, name: &str) -> Option<&VarEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

impl fmt::Display for VarListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}  {} = {}", entry.origin.tag(), entry.name, entry.value)?;
        }
        Ok(())
    }
}

pub fn inspect_vars(cfg: &Config) -> VarListing {
    let mut entries = Vec::new();

    for (opt, (name, value)) in cfg.options().zip(cfg.values()) {
        entries.push(VarEntry {
            name: name.to_string(),
            value: format_value(value),
            origin: VarOrigin::Schema,
        });

        let derived = [
            (opt.computed_name().map(str::to_string), VarOrigin::Computed),
            (opt.inverse_name(), VarOrigin::Inverted),
        ];
        for (derived_name, origin) in derived {
            let Some(derived_name) = derived_name else {
                continue;
            };
            let value = match cfg.get(&derived_name) {
                Ok(v) => format_value(&v),
                Err(e) => format!("<error: {e}>"),
            };
            entries.push(VarEntry {
                name: derived_name,
                value,
                origin,
            });
        }
    }

    VarListing { entries }
}

/// Format a value for display. Strings are quoted so whitespace stays visible.
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "<not set>".to_string(),
        Value::Str(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}
