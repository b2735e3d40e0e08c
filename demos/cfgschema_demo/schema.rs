use cfgschema::{Computed, ConfigError, Config, Schema, Value, schemas_from_toml};

const DOCUMENT: &str = include_str!("schema.toml");

/// Load the declared fields and attach the hooks TOML can't express.
pub fn demo_schema() -> Result<Vec<Schema>, ConfigError> {
    let schemas = schemas_from_toml(DOCUMENT)?;
    Ok(schemas
        .into_iter()
        .map(|schema| match schema.name().to_string().as_str() {
            "max_words|x" => schema.validator(check_words),
            "ending_spaces" => schema.computed(spaces()),
            "port" => schema.validator(check_port),
            _ => schema,
        })
        .collect())
}

fn check_words(value: &Value, cfg: &Config) -> Result<(), ConfigError> {
    let min = cfg.get_int("min_words")?;
    match value.as_int() {
        Some(max) if max < min => Err(ConfigError::range(
            "max_words",
            format!("max-words ({max}) must be >= min-words ({min})"),
        )),
        _ => Ok(()),
    }
}

/// Privileged ports need the admin role.
fn check_port(value: &Value, cfg: &Config) -> Result<(), ConfigError> {
    match value.as_int() {
        Some(port) if port <= 1023 && cfg.get_str("userrole")? != "admin" => {
            Err(ConfigError::validation(
                "port",
                format!("Port {port} not permitted; login as admin please."),
            ))
        }
        _ => Ok(()),
    }
}

fn spaces() -> Computed {
    Computed::new("spaces", |backing, _| {
        let n = backing.as_int().unwrap_or(1);
        Ok(Value::from(" ".repeat(usize::try_from(n).unwrap_or(1))))
    })
}
