//! Schema documents: declare fields in TOML instead of code.
//!
//! ```toml
//! [[field]]
//! name = "timeout|t"
//! type = "int"
//! default = 30
//! min = 1
//! max = 120
//! help = "Timeout in seconds"
//! ```
//!
//! Documents are strict: a key the loader doesn't know is reported with its
//! path and a best-effort line number. Keys whose value has the wrong shape
//! fail with the same error kinds schema compilation uses. Validators and
//! computed attributes can't be written in TOML; attach them to the returned
//! schemas with [`Schema::validator`] and [`Schema::computed`].

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::Schema;
use crate::value::{FieldType, Value};

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    field: Vec<RawField>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    field_type: Option<toml::Value>,
    default: Option<toml::Value>,
    min: Option<toml::Value>,
    max: Option<toml::Value>,
    required: Option<toml::Value>,
    domain: Option<toml::Value>,
    #[serde(default)]
    no_validate: bool,
    help: Option<String>,
    help_add_default: Option<bool>,
    short_flag: Option<String>,
}

/// Parse a schema document into schemas, in document order.
pub fn schemas_from_toml(content: &str) -> Result<Vec<Schema>, ConfigError> {
    let mut unknown_keys: Vec<String> = Vec::new();

    let deserializer = toml::Deserializer::new(content);
    let doc: Document = serde_ignored::deserialize(deserializer, |ignored_path| {
        unknown_keys.push(ignored_path.to_string());
    })?;

    if !unknown_keys.is_empty() {
        let errors: Vec<ConfigError> = unknown_keys
            .into_iter()
            .map(|key| {
                let line = find_key_line(content, &key);
                ConfigError::UnknownSchemaKey { key, line }
            })
            .collect();
        return Err(ConfigError::UnknownSchemaKeys(errors));
    }

    let schemas = doc
        .field
        .into_iter()
        .map(into_schema)
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(fields = schemas.len(), "schema document loaded");
    Ok(schemas)
}

fn into_schema(raw: RawField) -> Result<Schema, ConfigError> {
    let field = raw.name.clone();
    let mut schema = Schema::new(raw.name).no_validate(raw.no_validate);

    if let Some(default) = raw.default {
        schema = schema.default(Value::from(default));
    }

    match raw.field_type {
        None => {}
        Some(toml::Value::String(name)) => {
            schema = schema.field_type(type_from_name(&field, &name)?);
        }
        Some(toml::Value::Array(names)) => {
            let mut types = Vec::with_capacity(names.len());
            for name in names {
                match name {
                    toml::Value::String(name) => types.push(type_from_name(&field, &name)?),
                    other => {
                        return Err(ConfigError::type_error(
                            &field,
                            format!("type names must be strings, got {}", other.type_str()),
                        ));
                    }
                }
            }
            schema = schema.field_types(types);
        }
        Some(other) => {
            return Err(ConfigError::type_error(
                &field,
                format!("type must be a name or an array of names, got {}", other.type_str()),
            ));
        }
    }

    if let Some(min) = raw.min {
        schema = schema.r_min(numeric_bound(&field, "min", min)?);
    }
    if let Some(max) = raw.max {
        schema = schema.r_max(numeric_bound(&field, "max", max)?);
    }

    match raw.required {
        None => {}
        Some(toml::Value::Boolean(required)) => schema = schema.required(required),
        Some(other) => {
            return Err(ConfigError::required(
                &field,
                format!("required must be true or false, got {}", other.type_str()),
            ));
        }
    }

    match raw.domain {
        None => {}
        Some(toml::Value::Array(members)) => {
            schema = schema.domain(members.into_iter().map(Value::from));
        }
        Some(other) => {
            return Err(ConfigError::domain(
                &field,
                format!("domain must be an array, got {}", other.type_str()),
            ));
        }
    }

    if let Some(help) = raw.help {
        schema = schema.help(help);
    }
    if let Some(add) = raw.help_add_default {
        schema = schema.help_add_default(add);
    }
    if let Some(flag) = raw.short_flag {
        schema = schema.short_flag(flag);
    }
    Ok(schema)
}

fn type_from_name(field: &str, name: &str) -> Result<FieldType, ConfigError> {
    FieldType::from_name(name)
        .ok_or_else(|| ConfigError::type_error(field, format!("unknown type name '{name}'")))
}

fn numeric_bound(field: &str, label: &str, bound: toml::Value) -> Result<Value, ConfigError> {
    match bound {
        toml::Value::Integer(_) | toml::Value::Float(_) => Ok(Value::from(bound)),
        other => Err(ConfigError::metadata(
            field,
            format!("{label} must be numeric, got {}", other.type_str()),
        )),
    }
}

/// Find the 1-indexed line number for an ignored key path.
///
/// Paths look like `"colour"` for a top-level key or `"field.2.colour"` for
/// a key of the third `[[field]]` table. Returns 0 if the key cannot be
/// located; quoted keys and inline tables are not handled.
fn find_key_line(content: &str, key_path: &str) -> usize {
    let segments: Vec<&str> = key_path.split('.').collect();
    let (table, index, leaf) = match segments.as_slice() {
        [leaf] => (None, 0, *leaf),
        [table, index, leaf] => match index.parse::<usize>() {
            Ok(index) => (Some(*table), index, *leaf),
            Err(_) => return 0,
        },
        _ => return 0,
    };

    let mut current: Option<(&str, usize)> = None;
    let mut seen = 0usize;

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if let Some(header) = trimmed.strip_prefix("[[") {
            let name = header.trim_end_matches("]]").trim();
            if Some(name) == table {
                current = Some((name, seen));
                seen += 1;
            } else {
                current = Some((name, usize::MAX));
            }
            continue;
        }
        if trimmed.starts_with('[') {
            current = Some(("", usize::MAX));
            continue;
        }

        let in_right_table = match (table, current) {
            (None, None) => true,
            (Some(t), Some((name, n))) => t == name && n == index,
            _ => false,
        };

        if in_right_table
            && let Some(after_key) = trimmed.strip_prefix(leaf)
            && after_key.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::ErrorKind;

    const DOCUMENT: &str = r#"
[[field]]
name = "username|u"
type = "str"
default = "guest"
help = "Login name"

[[field]]
name = "timeout|t"
type = ["int", "float"]
default = 30
min = 1
max = 120

[[field]]
name = "lang"
default = "en"
domain = ["en", "nl", "fr"]
help_add_default = false

[[field]]
name = "verbose"
type = "bool"
short_flag = "v"
"#;

    fn kind_of(content: &str) -> ErrorKind {
        schemas_from_toml(content).unwrap_err().kind()
    }

    #[test]
    fn document_builds_a_config() {
        let schemas = schemas_from_toml(DOCUMENT).unwrap();
        assert_eq!(schemas.len(), 4);

        let mut cfg = Config::config_factory(&schemas, None).unwrap();
        assert_eq!(cfg.get_str("username").unwrap(), "guest");
        assert_eq!(cfg.get_int("timeout").unwrap(), 30);
        assert!(cfg.get_bool("no_verbose").unwrap());
        assert_eq!(cfg.get_meta("verbose").unwrap().short_flag(), Some('v'));
        assert_eq!(cfg.get_meta("lang").unwrap().help_message(), "Option: lang");
        assert_eq!(
            cfg.get_meta("username").unwrap().help_message(),
            "Login name (default 'guest')"
        );

        cfg.set("timeout", 2.5).unwrap();
        assert_eq!(cfg.set("timeout", 500).unwrap_err().kind(), Some(ErrorKind::Range));
        assert_eq!(cfg.set("lang", "de").unwrap_err().kind(), Some(ErrorKind::Validation));
    }

    #[test]
    fn empty_document_declares_nothing() {
        assert!(schemas_from_toml("").unwrap().is_empty());
    }

    #[test]
    fn syntax_error() {
        assert_eq!(kind_of("[[field]\nname = "), ErrorKind::SchemaDocument);
        assert!(matches!(
            schemas_from_toml("[[field]]\nname = ").unwrap_err(),
            ConfigError::SchemaDocument(_)
        ));
    }

    #[test]
    fn unknown_keys_are_reported_with_lines() {
        let content = "colour = \"red\"\n\n[[field]]\nname = \"a\"\n\n[[field]]\nname = \"b\"\ndefualt = 3\n";
        match schemas_from_toml(content).unwrap_err() {
            ConfigError::UnknownSchemaKeys(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(matches!(
                    &errors[0],
                    ConfigError::UnknownSchemaKey { key, line: 1 } if key == "colour"
                ));
                assert!(matches!(
                    &errors[1],
                    ConfigError::UnknownSchemaKey { key, line: 8 } if key == "field.1.defualt"
                ));
            }
            other => panic!("Expected UnknownSchemaKeys, got: {other:?}"),
        }
    }

    #[test]
    fn unknown_type_name() {
        let err = schemas_from_toml("[[field]]\nname = \"x\"\ntype = \"integr\"\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert!(err.to_string().contains("integr"));
        assert_eq!(kind_of("[[field]]\nname = \"x\"\ntype = 3\n"), ErrorKind::Type);
        assert_eq!(kind_of("[[field]]\nname = \"x\"\ntype = [\"int\", 3]\n"), ErrorKind::Type);
    }

    #[test]
    fn domain_must_be_an_array() {
        assert_eq!(
            kind_of("[[field]]\nname = \"u\"\ndomain = \"admin\"\n"),
            ErrorKind::Domain
        );
    }

    #[test]
    fn required_must_be_boolean() {
        assert_eq!(
            kind_of("[[field]]\nname = \"u\"\ndefault = 1\nrequired = \"no\"\n"),
            ErrorKind::Required
        );
    }

    #[test]
    fn bounds_must_be_numeric() {
        assert_eq!(kind_of("[[field]]\nname = \"n\"\nmin = \"a\"\n"), ErrorKind::Metadata);
        assert_eq!(kind_of("[[field]]\nname = \"n\"\nmax = true\n"), ErrorKind::Metadata);
    }

    #[test]
    fn structural_rules_apply_on_compile() {
        let schemas =
            schemas_from_toml("[[field]]\nname = \"u\"\ntype = \"str\"\ndomain = [1, 2]\n").unwrap();
        let err = Config::config_factory(&schemas, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
    }

    #[test]
    fn key_line_lookup() {
        let content = "[[field]]\nname = \"a\"\nx = 1\n[[field]]\nname = \"b\"\nx = 2\n";
        assert_eq!(find_key_line(content, "field.0.x"), 3);
        assert_eq!(find_key_line(content, "field.1.x"), 6);
        assert_eq!(find_key_line(content, "field.2.x"), 0);
        assert_eq!(find_key_line(content, "x"), 0);
    }
}
