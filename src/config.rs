use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::{ConfigError, DerivedKind, ReadOnlyError, SetError};
use crate::ops::{self, VarListing};
use crate::option::{self, FieldOption};
use crate::types::Schema;
use crate::validate;
use crate::value::Value;

/// Replacement help texts keyed by canonical field name.
pub type HelpMap = BTreeMap<String, String>;

/// How a name resolves inside a config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Stored(usize),
    Computed(usize),
    Inverted(usize),
}

/// Compiled options plus the name table. Shared by a config and its copies.
#[derive(Debug)]
struct Registry {
    options: Vec<FieldOption>,
    slots: HashMap<String, Slot>,
}

impl Registry {
    fn build(schemas: &[Schema], help_map: Option<&HelpMap>) -> Result<Self, ConfigError> {
        let mut options = Vec::with_capacity(schemas.len());
        for schema in schemas {
            options.push(option::compile(schema.clone())?);
        }

        if let Some(help_map) = help_map {
            for (name, text) in help_map {
                let opt = options
                    .iter_mut()
                    .find(|o| o.name() == name)
                    .ok_or_else(|| ConfigError::UnknownKey(name.clone()))?;
                opt.set_help_text(text.clone());
            }
        }

        let mut slots = HashMap::new();
        let mut short_flags: HashMap<char, &str> = HashMap::new();
        for (i, opt) in options.iter().enumerate() {
            claim(&mut slots, opt.name(), Slot::Stored(i))?;
            if let Some(flag) = opt.short_flag() {
                if let Some(owner) = short_flags.get(&flag) {
                    return Err(ConfigError::metadata(
                        opt.name(),
                        format!("short flag '-{flag}' already used by '{owner}'"),
                    ));
                }
                short_flags.insert(flag, opt.name());
            }
        }
        for (i, opt) in options.iter().enumerate() {
            if let Some(computed) = opt.computed_name() {
                claim(&mut slots, computed, Slot::Computed(i))?;
            }
            if let Some(inverse) = opt.inverse_name() {
                claim(&mut slots, &inverse, Slot::Inverted(i))?;
            }
        }

        Ok(Self { options, slots })
    }

    fn slot(&self, name: &str) -> Result<Slot, ConfigError> {
        self.slots
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownKey(name.to_string()))
    }

    fn stored_index(&self, name: &str) -> Result<usize, ConfigError> {
        match self.slot(name)? {
            Slot::Stored(i) => Ok(i),
            Slot::Computed(_) | Slot::Inverted(_) => Err(ConfigError::UnknownKey(format!(
                "{name} (derived attributes have no stored value)"
            ))),
        }
    }
}

fn claim(slots: &mut HashMap<String, Slot>, name: &str, slot: Slot) -> Result<(), ConfigError> {
    if slots.contains_key(name) {
        return Err(ConfigError::metadata(
            name,
            "name is already in use by another field or derived attribute",
        ));
    }
    slots.insert(name.to_string(), slot);
    Ok(())
}

/// A validated runtime configuration built from a list of [`Schema`]s.
///
/// Every stored value has passed the rules of its [`FieldOption`]. Computed
/// attributes are derived on each read; every plain `bool` field `x` also
/// exposes a read-only inverse `no_x` (or `x` for a field named `no_x`).
///
/// ```ignore
/// let mut cfg = Config::config_factory(&[
///     Schema::new("debug|d").field_type(FieldType::Bool),
///     Schema::new("timeout|t").default(30).range(1, 120),
/// ], None)?;
/// cfg.set("timeout", 70)?;
/// assert!(cfg.get_bool("no_debug")?);
/// ```
pub struct Config {
    registry: Arc<Registry>,
    values: Vec<Value>,
    /// `Some` while a transaction is active: the fields written so far.
    transaction: Option<BTreeSet<usize>>,
}

impl Config {
    /// Compile `schemas` and populate every field with its default.
    ///
    /// `help_map` replaces the help text of the named fields.
    pub fn config_factory(schemas: &[Schema], help_map: Option<&HelpMap>) -> Result<Self, ConfigError> {
        Self::build(schemas, help_map, Vec::new())
    }

    /// Like [`config_factory`](Self::config_factory), with `values` taking
    /// the place of the declared defaults. Keys are field names; dashes are
    /// accepted in place of underscores.
    pub fn from_dict<K, V>(
        schemas: &[Schema],
        values: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, ConfigError>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let overrides = values
            .into_iter()
            .map(|(k, v)| (option::normalize_name(k.as_ref()), v.into()))
            .collect();
        Self::build(schemas, None, overrides)
    }

    /// Construction behaves like a transaction: field rules run per value,
    /// then custom validators run against the fully populated config.
    fn build(
        schemas: &[Schema],
        help_map: Option<&HelpMap>,
        overrides: Vec<(String, Value)>,
    ) -> Result<Self, ConfigError> {
        let registry = Registry::build(schemas, help_map)?;
        let mut values: Vec<Value> = registry
            .options
            .iter()
            .map(|opt| opt.default_value().clone())
            .collect();

        for (name, value) in overrides {
            let idx = registry.stored_index(&name)?;
            values[idx] = value;
        }

        for (opt, value) in registry.options.iter().zip(&values) {
            validate::check_value(opt, value)?;
        }

        let cfg = Self {
            registry: Arc::new(registry),
            values,
            transaction: None,
        };
        for (opt, value) in cfg.registry.options.iter().zip(&cfg.values) {
            validate::run_validator(opt, value, &cfg)?;
        }

        tracing::debug!(fields = cfg.values.len(), "config created");
        Ok(cfg)
    }

    /// Read any attribute: stored, computed or auto-inverted.
    pub fn get(&self, name: &str) -> Result<Value, ConfigError> {
        match self.registry.slot(name)? {
            Slot::Stored(i) => Ok(self.values[i].clone()),
            Slot::Computed(i) => match self.registry.options[i].computed() {
                Some(computed) => computed.compute(&self.values[i], self),
                None => Err(ConfigError::UnknownKey(name.to_string())),
            },
            Slot::Inverted(i) => Ok(Value::Bool(!matches!(self.values[i], Value::Bool(true)))),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, ConfigError> {
        let value = self.get(name)?;
        value.as_bool().ok_or_else(|| mismatch(name, "bool", &value))
    }

    pub fn get_int(&self, name: &str) -> Result<i64, ConfigError> {
        let value = self.get(name)?;
        value.as_int().ok_or_else(|| mismatch(name, "int", &value))
    }

    pub fn get_float(&self, name: &str) -> Result<f64, ConfigError> {
        let value = self.get(name)?;
        value.as_float().ok_or_else(|| mismatch(name, "float", &value))
    }

    pub fn get_str(&self, name: &str) -> Result<String, ConfigError> {
        match self.get(name)? {
            Value::Str(s) => Ok(s),
            other => Err(mismatch(name, "str", &other)),
        }
    }

    /// Validate and store `value`. On failure the previous value is kept.
    ///
    /// Writes to computed or auto-inverted attributes fail with
    /// [`SetError::ReadOnly`].
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), SetError> {
        match self.registry.slot(name)? {
            Slot::Stored(i) => Ok(self.assign(i, value.into())?),
            Slot::Computed(_) => Err(read_only(name, DerivedKind::Computed)),
            Slot::Inverted(_) => Err(read_only(name, DerivedKind::Inverted)),
        }
    }

    /// Write path for callers that only ever address stored fields.
    pub(crate) fn set_stored(&mut self, name: &str, value: Value) -> Result<(), ConfigError> {
        let idx = self.registry.stored_index(name)?;
        self.assign(idx, value)
    }

    fn assign(&mut self, idx: usize, value: Value) -> Result<(), ConfigError> {
        let registry = Arc::clone(&self.registry);
        let opt = &registry.options[idx];
        validate::check_value(opt, &value)?;

        if let Some(pending) = &mut self.transaction {
            pending.insert(idx);
            tracing::debug!(field = opt.name(), %value, "field updated, validator deferred");
        } else {
            validate::run_validator(opt, &value, self)?;
            tracing::debug!(field = opt.name(), %value, "field updated");
        }
        self.values[idx] = value;
        Ok(())
    }

    /// Metadata for `name`. Derived attribute names resolve to the option
    /// of the field they derive from.
    pub fn get_meta(&self, name: &str) -> Result<&FieldOption, ConfigError> {
        let idx = match self.registry.slot(name)? {
            Slot::Stored(i) | Slot::Computed(i) | Slot::Inverted(i) => i,
        };
        Ok(&self.registry.options[idx])
    }

    /// Options in declaration order.
    pub fn options(&self) -> impl Iterator<Item = &FieldOption> {
        self.registry.options.iter()
    }

    /// Stored field names and values in declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.registry
            .options
            .iter()
            .map(FieldOption::name)
            .zip(&self.values)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.registry.options.iter().map(FieldOption::name).collect()
    }

    /// True for stored and derived names alike.
    pub fn contains(&self, name: &str) -> bool {
        self.registry.slots.contains_key(name)
    }

    /// Listing of every stored and derived attribute with its current value.
    pub fn inspect_vars(&self) -> VarListing {
        ops::inspect_vars(self)
    }

    /// An independent copy sharing only the immutable options. The copy
    /// starts outside any transaction.
    pub fn copy_config(&self) -> Config {
        Config {
            registry: Arc::clone(&self.registry),
            values: self.values.clone(),
            transaction: None,
        }
    }

    /// Defer custom validators until [`commit_transaction`](Self::commit_transaction).
    /// Field rules keep running on every write.
    pub fn start_transaction(&mut self) -> Result<(), ConfigError> {
        if self.transaction.is_some() {
            return Err(ConfigError::Transaction(
                "a transaction is already active".into(),
            ));
        }
        self.transaction = Some(BTreeSet::new());
        tracing::debug!("transaction started");
        Ok(())
    }

    /// Run the deferred validators of every field written during the
    /// transaction, in declaration order, against the resulting state.
    ///
    /// The config is idle afterwards either way. Values written during the
    /// transaction stay in place when a validator fails.
    pub fn commit_transaction(&mut self) -> Result<(), ConfigError> {
        let pending = self
            .transaction
            .take()
            .ok_or_else(|| ConfigError::Transaction("no active transaction to commit".into()))?;

        for idx in pending {
            let opt = &self.registry.options[idx];
            if let Err(e) = validate::run_validator(opt, &self.values[idx], self) {
                tracing::warn!(field = opt.name(), error = %e, "transaction commit rejected");
                return Err(e);
            }
        }
        tracing::debug!("transaction committed");
        Ok(())
    }

    pub fn is_in_transaction(&self) -> bool {
        self.transaction.is_some()
    }
}

fn mismatch(name: &str, expected: &str, value: &Value) -> ConfigError {
    ConfigError::type_error(
        name,
        format!("holds a {}, not a {expected}", value.type_name()),
    )
}

fn read_only(name: &str, kind: DerivedKind) -> SetError {
    SetError::ReadOnly(ReadOnlyError {
        name: name.to_string(),
        kind,
    })
}

impl Clone for Config {
    fn clone(&self) -> Self {
        self.copy_config()
    }
}

impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        let same_meta = Arc::ptr_eq(&self.registry, &other.registry)
            || self.registry.options == other.registry.options;
        same_meta && self.values == other.values
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("values", &self.values().collect::<BTreeMap<_, _>>())
            .field("in_transaction", &self.is_in_transaction())
            .finish_non_exhaustive()
    }
}
