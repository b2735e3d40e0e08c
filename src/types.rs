use std::fmt;
use std::sync::Arc;

use crate::config::Config;
use crate::error::ConfigError;
use crate::value::{FieldType, TypeSpec, Value};

/// Cross-field validator: receives the incoming value and the owning config.
pub type ValidatorFn = Arc<dyn Fn(&Value, &Config) -> Result<(), ConfigError> + Send + Sync>;

/// Derivation for a computed attribute: receives the backing field's stored
/// value and the owning config.
pub type ComputeFn = Arc<dyn Fn(&Value, &Config) -> Result<Value, ConfigError> + Send + Sync>;

/// A derivation function tagged with the attribute name it produces.
///
/// ```ignore
/// let spaces = Computed::new("spaces", |_, cfg| {
///     let n = cfg.get_int("num_spaces")?;
///     Ok(" ".repeat(n as usize).into())
/// });
/// ```
#[derive(Clone)]
pub struct Computed {
    field_name: String,
    func: ComputeFn,
}

impl Computed {
    pub fn new<F>(field_name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &Config) -> Result<Value, ConfigError> + Send + Sync + 'static,
    {
        Self {
            field_name: field_name.into(),
            func: Arc::new(func),
        }
    }

    /// Name of the read-only attribute this function produces.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub(crate) fn compute(&self, backing: &Value, cfg: &Config) -> Result<Value, ConfigError> {
        (self.func)(backing, cfg)
    }

    pub(crate) fn same_fn(&self, other: &Computed) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("field_name", &self.field_name)
            .finish_non_exhaustive()
    }
}

/// Declarative description of one configuration field.
///
/// A schema is inert until [`Config::config_factory`] compiles it into a
/// [`FieldOption`](crate::FieldOption); every structural rule is checked
/// there, so the builder methods never fail.
#[derive(Clone)]
pub struct Schema {
    pub(crate) name: String,
    pub(crate) default: Value,
    pub(crate) field_type: Option<TypeSpec>,
    pub(crate) domain: Option<Vec<Value>>,
    pub(crate) r_min: Option<Value>,
    pub(crate) r_max: Option<Value>,
    pub(crate) required: Option<bool>,
    pub(crate) no_validate: bool,
    pub(crate) fn_validator: Option<ValidatorFn>,
    pub(crate) fn_computed: Option<Computed>,
    pub(crate) help_text: Option<String>,
    pub(crate) help_add_default: bool,
    pub(crate) short_flag: Option<String>,
}

impl Schema {
    /// `name` may carry a short flag as `"name|x"` and may contain dashes,
    /// e.g. `"--dry-run|n"`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: Value::Null,
            field_type: None,
            domain: None,
            r_min: None,
            r_max: None,
            required: Some(false),
            no_validate: false,
            fn_validator: None,
            fn_computed: None,
            help_text: None,
            help_add_default: true,
            short_flag: None,
        }
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    pub fn field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(TypeSpec::Single(field_type));
        self
    }

    /// Accept any of `types`; the first one drives CLI coercion.
    pub fn field_types(mut self, types: impl Into<Vec<FieldType>>) -> Self {
        self.field_type = Some(TypeSpec::Tuple(types.into()));
        self
    }

    pub fn domain<V: Into<Value>>(mut self, members: impl IntoIterator<Item = V>) -> Self {
        self.domain = Some(members.into_iter().map(Into::into).collect());
        self
    }

    pub fn r_min(mut self, min: impl Into<Value>) -> Self {
        self.r_min = Some(min.into());
        self
    }

    pub fn r_max(mut self, max: impl Into<Value>) -> Self {
        self.r_max = Some(max.into());
        self
    }

    /// Inclusive bounds.
    pub fn range(self, min: impl Into<Value>, max: impl Into<Value>) -> Self {
        self.r_min(min).r_max(max)
    }

    /// `None` is accepted and treated as `false`.
    pub fn required(mut self, required: impl Into<Option<bool>>) -> Self {
        self.required = required.into();
        self
    }

    /// Skip the required, type, domain and range rules for this field.
    /// Custom validators still run.
    pub fn no_validate(mut self, no_validate: bool) -> Self {
        self.no_validate = no_validate;
        self
    }

    pub fn validator<F>(mut self, func: F) -> Self
    where
        F: Fn(&Value, &Config) -> Result<(), ConfigError> + Send + Sync + 'static,
    {
        self.fn_validator = Some(Arc::new(func));
        self
    }

    pub fn computed(mut self, computed: Computed) -> Self {
        self.fn_computed = Some(computed);
        self
    }

    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help_text = Some(text.into());
        self
    }

    pub fn help_add_default(mut self, add: bool) -> Self {
        self.help_add_default = add;
        self
    }

    /// Overrides any flag given in the name suffix.
    pub fn short_flag(mut self, flag: impl Into<String>) -> Self {
        self.short_flag = Some(flag.into());
        self
    }

    /// The raw name as declared, before normalization.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn declared_type(&self) -> Option<&TypeSpec> {
        self.field_type.as_ref()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("default", &self.default)
            .field("field_type", &self.field_type)
            .field("domain", &self.domain)
            .field("r_min", &self.r_min)
            .field("r_max", &self.r_max)
            .field("required", &self.required)
            .field("no_validate", &self.no_validate)
            .field("fn_validator", &self.fn_validator.is_some())
            .field("fn_computed", &self.fn_computed)
            .field("help_text", &self.help_text)
            .field("help_add_default", &self.help_add_default)
            .field("short_flag", &self.short_flag)
            .finish()
    }
}
