//! Schema compilation: structural validation and normalization.
//!
//! [`compile`] turns a declarative [`Schema`] into a [`FieldOption`], the
//! immutable metadata a [`Config`](crate::Config) validates values against.
//! These checks run once per field and are never bypassed, not even for
//! fields declared with `no_validate`.

use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::types::{Computed, Schema, ValidatorFn};
use crate::value::{FieldType, TypeSpec, Value};

/// Compiled, structurally valid metadata for one field.
#[derive(Clone)]
pub struct FieldOption {
    name: String,
    short_flag: Option<char>,
    default_value: Value,
    field_type: Option<TypeSpec>,
    domain: Option<Vec<Value>>,
    r_min: Option<Value>,
    r_max: Option<Value>,
    required: bool,
    do_validate: bool,
    fn_validator: Option<ValidatorFn>,
    fn_computed: Option<Computed>,
    help_text: Option<String>,
    help_add_default: bool,
}

impl FieldOption {
    /// Canonical field name: leading dashes stripped, inner dashes as underscores.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_flag(&self) -> Option<char> {
        self.short_flag
    }

    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    pub fn field_type(&self) -> Option<&TypeSpec> {
        self.field_type.as_ref()
    }

    /// First declared type; drives CLI token coercion.
    pub fn primary_type(&self) -> Option<FieldType> {
        self.field_type.as_ref().and_then(TypeSpec::primary)
    }

    pub fn is_bool(&self) -> bool {
        self.field_type.as_ref().is_some_and(TypeSpec::is_bool)
    }

    pub fn domain(&self) -> Option<&[Value]> {
        self.domain.as_deref()
    }

    pub fn r_min(&self) -> Option<&Value> {
        self.r_min.as_ref()
    }

    pub fn r_max(&self) -> Option<&Value> {
        self.r_max.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// `false` when the schema was declared with `no_validate`.
    pub fn do_validate(&self) -> bool {
        self.do_validate
    }

    pub(crate) fn validator(&self) -> Option<&ValidatorFn> {
        self.fn_validator.as_ref()
    }

    pub fn has_validator(&self) -> bool {
        self.fn_validator.is_some()
    }

    pub(crate) fn computed(&self) -> Option<&Computed> {
        self.fn_computed.as_ref()
    }

    /// Name of the computed attribute derived from this field, if any.
    pub fn computed_name(&self) -> Option<&str> {
        self.fn_computed.as_ref().map(Computed::field_name)
    }

    /// Name of the auto-inverted attribute, for plain `bool` fields.
    pub fn inverse_name(&self) -> Option<String> {
        self.is_bool().then(|| inverse_name(&self.name))
    }

    /// The help text as declared, `None` when generated.
    pub fn help_text(&self) -> Option<&str> {
        self.help_text.as_deref()
    }

    pub fn help_add_default(&self) -> bool {
        self.help_add_default
    }

    pub(crate) fn set_help_text(&mut self, text: String) {
        self.help_text = Some(text);
    }

    /// Help line shown by the CLI adapter.
    pub fn help_message(&self) -> String {
        let base = match &self.help_text {
            Some(text) => text.clone(),
            None => format!("Option: {}", self.name),
        };
        if self.help_add_default {
            format!("{base} (default '{}')", self.default_value)
        } else {
            base
        }
    }
}

impl PartialEq for FieldOption {
    fn eq(&self, other: &Self) -> bool {
        let validators_match = match (&self.fn_validator, &other.fn_validator) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        let computed_match = match (&self.fn_computed, &other.fn_computed) {
            (None, None) => true,
            (Some(a), Some(b)) => a.field_name() == b.field_name() && a.same_fn(b),
            _ => false,
        };
        validators_match
            && computed_match
            && self.name == other.name
            && self.short_flag == other.short_flag
            && self.default_value == other.default_value
            && self.field_type == other.field_type
            && self.domain == other.domain
            && self.r_min == other.r_min
            && self.r_max == other.r_max
            && self.required == other.required
            && self.do_validate == other.do_validate
            && self.help_text == other.help_text
            && self.help_add_default == other.help_add_default
    }
}

impl fmt::Debug for FieldOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOption")
            .field("name", &self.name)
            .field("short_flag", &self.short_flag)
            .field("default_value", &self.default_value)
            .field("field_type", &self.field_type)
            .field("domain", &self.domain)
            .field("r_min", &self.r_min)
            .field("r_max", &self.r_max)
            .field("required", &self.required)
            .field("do_validate", &self.do_validate)
            .field("fn_validator", &self.fn_validator.is_some())
            .field("fn_computed", &self.fn_computed)
            .field("help_text", &self.help_text)
            .field("help_add_default", &self.help_add_default)
            .finish()
    }
}

/// `no_x` ↔ `x`.
pub fn inverse_name(name: &str) -> String {
    match name.strip_prefix("no_") {
        Some(rest) => rest.to_string(),
        None => format!("no_{name}"),
    }
}

/// Strip leading dashes, then turn each remaining dash into an underscore.
/// Runs are preserved: `"--a--b"` becomes `"a__b"`.
pub fn normalize_name(name: &str) -> String {
    name.trim_start_matches('-').replace('-', "_")
}

/// Compile one schema into its option.
pub fn compile(schema: Schema) -> Result<FieldOption, ConfigError> {
    let raw_name = schema.name;
    let (left, suffix) = match raw_name.split_once('|') {
        Some((left, right)) => (left, Some(right)),
        None => (raw_name.as_str(), None),
    };

    let name = normalize_name(left);
    if name.is_empty() {
        return Err(ConfigError::metadata(
            raw_name.clone(),
            format!("Schema name not valid ({raw_name})"),
        ));
    }

    let short_flag = match schema.short_flag.as_deref().or(suffix) {
        Some(flag) => Some(parse_short_flag(&name, flag)?),
        None => None,
    };

    if let Some(spec) = &schema.field_type {
        check_type_spec(&name, spec)?;
    }

    if let Some(domain) = &schema.domain {
        check_domain(&name, domain, schema.field_type.as_ref())?;
    }

    check_range(&name, schema.r_min.as_ref(), schema.r_max.as_ref())?;

    let required = schema.required.unwrap_or(false);
    if required && schema.default.is_null() {
        return Err(ConfigError::validation(
            &name,
            "required field must declare a default",
        ));
    }

    if let Some(computed) = &schema.fn_computed
        && computed.field_name().is_empty()
    {
        return Err(ConfigError::type_error(
            &name,
            "computed function carries no output field name",
        ));
    }

    let mut default_value = schema.default;
    if default_value.is_null() && schema.field_type.as_ref().is_some_and(TypeSpec::is_bool) {
        default_value = Value::Bool(false);
    }

    Ok(FieldOption {
        name,
        short_flag,
        default_value,
        field_type: schema.field_type,
        domain: schema.domain,
        r_min: schema.r_min,
        r_max: schema.r_max,
        required,
        do_validate: !schema.no_validate,
        fn_validator: schema.fn_validator,
        fn_computed: schema.fn_computed,
        help_text: schema.help_text,
        help_add_default: schema.help_add_default,
    })
}

fn parse_short_flag(field: &str, flag: &str) -> Result<char, ConfigError> {
    let mut chars = flag.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphanumeric() => Ok(c),
        (Some(_), None) => Err(ConfigError::metadata(
            field,
            format!("short CLI flag must be alphanumeric: '{flag}'"),
        )),
        _ => Err(ConfigError::metadata(
            field,
            format!("short CLI flags must be a single character: '{flag}'"),
        )),
    }
}

fn check_type_spec(field: &str, spec: &TypeSpec) -> Result<(), ConfigError> {
    if spec.types().is_empty() {
        return Err(ConfigError::type_error(
            field,
            "field_type tuple must name at least one type",
        ));
    }
    Ok(())
}

fn check_domain(field: &str, domain: &[Value], spec: Option<&TypeSpec>) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::domain(field, "domain must not be empty"));
    }

    for (i, member) in domain.iter().enumerate() {
        if !member.is_scalar() {
            return Err(ConfigError::domain(
                field,
                format!("domain members must be scalars, got {}", member.type_name()),
            ));
        }
        if member.as_float().is_some_and(f64::is_nan) {
            return Err(ConfigError::domain(field, "NaN is not a valid domain member"));
        }
        if domain[..i].contains(member) {
            return Err(ConfigError::domain(
                field,
                format!("duplicate domain member '{member}'"),
            ));
        }
        if let Some(spec) = spec
            && !member.is_null()
            && !spec.accepts(member)
        {
            return Err(ConfigError::domain(
                field,
                format!("domain member '{member}' is not of type {spec}"),
            ));
        }
    }
    Ok(())
}

fn check_range(field: &str, r_min: Option<&Value>, r_max: Option<&Value>) -> Result<(), ConfigError> {
    for (label, bound) in [("r_min", r_min), ("r_max", r_max)] {
        if let Some(bound) = bound
            && !bound.is_number()
        {
            return Err(ConfigError::metadata(
                field,
                format!("{label} must be numeric, got {}", bound.type_name()),
            ));
        }
    }
    if let (Some(min), Some(max)) = (r_min, r_max)
        && min.cmp_number(max) == Some(std::cmp::Ordering::Greater)
    {
        return Err(ConfigError::metadata(
            field,
            format!("r_min {min} is greater than r_max {max}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn kind_of(schema: Schema) -> ErrorKind {
        compile(schema).unwrap_err().kind()
    }

    #[test]
    fn minimal_schema() {
        let opt = compile(Schema::new("username")).unwrap();
        assert_eq!(opt.name(), "username");
        assert_eq!(opt.short_flag(), None);
        assert_eq!(opt.field_type(), None);
        assert_eq!(opt.domain(), None);
        assert_eq!(opt.default_value(), &Value::Null);
        assert!(!opt.is_required());
        assert!(opt.do_validate());
        assert!(!opt.has_validator());
        assert_eq!(opt.computed_name(), None);
        assert_eq!(opt.help_message(), "Option: username (default 'none')");
    }

    #[test]
    fn dashes_are_normalized() {
        assert_eq!(normalize_name("-----go-fishing-today"), "go_fishing_today");
        assert_eq!(normalize_name("--go--working--today"), "go__working__today");
        assert_eq!(normalize_name("---a-b"), "a_b");
        let opt = compile(Schema::new("user-name|u")).unwrap();
        assert_eq!(opt.name(), "user_name");
        assert_eq!(opt.short_flag(), Some('u'));
    }

    #[test]
    fn explicit_short_flag_wins() {
        let opt = compile(Schema::new("username|u").short_flag("n")).unwrap();
        assert_eq!(opt.short_flag(), Some('n'));
        // an oversized suffix is fine when overridden
        let opt = compile(Schema::new("username|us").short_flag("u")).unwrap();
        assert_eq!(opt.short_flag(), Some('u'));
    }

    #[test]
    fn oversized_short_flag_fails() {
        let err = compile(Schema::new("username|us")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Metadata);
        assert!(err.to_string().contains("single character: 'us'"));
        assert_eq!(kind_of(Schema::new("username").short_flag("xy")), ErrorKind::Metadata);
    }

    #[test]
    fn empty_name_fails() {
        let err = compile(Schema::new("|u")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Metadata);
        assert!(err.to_string().contains("Schema name not valid (|u)"));
        assert_eq!(kind_of(Schema::new("---")), ErrorKind::Metadata);
    }

    #[test]
    fn empty_type_tuple_fails() {
        assert_eq!(
            kind_of(Schema::new("x").field_types(Vec::new())),
            ErrorKind::Type
        );
    }

    #[test]
    fn domain_rules() {
        assert_eq!(
            kind_of(Schema::new("u").domain(Vec::<Value>::new())),
            ErrorKind::Domain
        );
        assert_eq!(
            kind_of(Schema::new("u").domain([Value::from(vec![1, 2]), Value::from(vec![2, 3])])),
            ErrorKind::Domain
        );
        assert_eq!(
            kind_of(Schema::new("u").domain(["a", "a"])),
            ErrorKind::Domain
        );
        assert_eq!(
            kind_of(Schema::new("u").field_type(FieldType::Str).domain([123, 345])),
            ErrorKind::Domain
        );
        let opt = compile(
            Schema::new("u")
                .field_types([FieldType::Str, FieldType::Int])
                .domain([Value::from("guest"), Value::from(123)]),
        )
        .unwrap();
        assert_eq!(opt.domain().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn required_needs_default() {
        assert_eq!(kind_of(Schema::new("u").required(true)), ErrorKind::Validation);
        let opt = compile(Schema::new("u").required(None).default("john")).unwrap();
        assert!(!opt.is_required());
        let opt = compile(Schema::new("u").required(true).default(0)).unwrap();
        assert!(opt.is_required());
    }

    #[test]
    fn untagged_computed_fails() {
        let computed = Computed::new("", |v, _| Ok(v.clone()));
        assert_eq!(kind_of(Schema::new("u").computed(computed)), ErrorKind::Type);
    }

    #[test]
    fn range_bounds_checked() {
        assert_eq!(kind_of(Schema::new("n").range("a", 5)), ErrorKind::Metadata);
        assert_eq!(kind_of(Schema::new("n").range(10, 5)), ErrorKind::Metadata);
        assert!(compile(Schema::new("n").range(1, 5000)).is_ok());
    }

    #[test]
    fn bool_default_becomes_false() {
        let opt = compile(Schema::new("--go--working--today").field_type(FieldType::Bool)).unwrap();
        assert_eq!(opt.default_value(), &Value::Bool(false));
        assert_eq!(opt.inverse_name().as_deref(), Some("no_go__working__today"));
    }

    #[test]
    fn inverse_names() {
        assert_eq!(inverse_name("debug"), "no_debug");
        assert_eq!(inverse_name("no_wrap"), "wrap");
    }

    #[test]
    fn help_messages() {
        let opt = compile(Schema::new("w").default(1).help_add_default(false)).unwrap();
        assert_eq!(opt.help_message(), "Option: w");
        let opt = compile(Schema::new("x").default(1).help("Helptext for option x")).unwrap();
        assert_eq!(opt.help_message(), "Helptext for option x (default '1')");
        let opt = compile(
            Schema::new("z")
                .default("abc")
                .help("Helptext for option z")
                .help_add_default(false),
        )
        .unwrap();
        assert_eq!(opt.help_message(), "Helptext for option z");
    }
}
