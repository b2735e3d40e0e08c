//! Value validation: the rules every assignment goes through.
//!
//! Rules run in a fixed order and stop at the first failure:
//!
//! 1. required: a required field rejects `Null`
//! 2. type: the value must match the declared [`TypeSpec`](crate::TypeSpec)
//! 3. domain: the value must equal one of the declared members
//! 4. range: the value must lie within `[r_min, r_max]`
//! 5. custom validator, with the owning config as context
//!
//! Rules 1–4 are skipped for options compiled from a `no_validate` schema and
//! never look at `Null` beyond rule 1. Rule 5 always runs; during a
//! transaction the config defers it to commit time.

use std::cmp::Ordering;

use crate::config::Config;
use crate::error::ConfigError;
use crate::option::FieldOption;
use crate::value::Value;

/// Run rules 1–4 for `value` against `opt`.
pub fn check_value(opt: &FieldOption, value: &Value) -> Result<(), ConfigError> {
    if !opt.do_validate() {
        tracing::trace!(field = opt.name(), "validation disabled, skipping rules");
        return Ok(());
    }

    check_required(opt, value)?;
    if value.is_null() {
        return Ok(());
    }
    check_type(opt, value)?;
    check_domain(opt, value)?;
    check_range(opt, value)?;
    tracing::trace!(field = opt.name(), %value, "value passed field rules");
    Ok(())
}

/// Run rule 5, the custom validator, if the option has one.
pub fn run_validator(opt: &FieldOption, value: &Value, cfg: &Config) -> Result<(), ConfigError> {
    match opt.validator() {
        Some(validator) => {
            tracing::trace!(field = opt.name(), %value, "running custom validator");
            validator(value, cfg)
        }
        None => Ok(()),
    }
}

fn check_required(opt: &FieldOption, value: &Value) -> Result<(), ConfigError> {
    if opt.is_required() && value.is_null() {
        return Err(ConfigError::validation(
            opt.name(),
            "a value is required",
        ));
    }
    Ok(())
}

fn check_type(opt: &FieldOption, value: &Value) -> Result<(), ConfigError> {
    match opt.field_type() {
        Some(spec) if !spec.accepts(value) => Err(ConfigError::type_error(
            opt.name(),
            format!(
                "expected {spec}, got {} ('{value}')",
                value.type_name()
            ),
        )),
        _ => Ok(()),
    }
}

fn check_domain(opt: &FieldOption, value: &Value) -> Result<(), ConfigError> {
    match opt.domain() {
        Some(domain) if !domain.contains(value) => {
            let members: Vec<String> = domain.iter().map(ToString::to_string).collect();
            Err(ConfigError::validation(
                opt.name(),
                format!("'{value}' is not one of: {}", members.join(", ")),
            ))
        }
        _ => Ok(()),
    }
}

fn check_range(opt: &FieldOption, value: &Value) -> Result<(), ConfigError> {
    if opt.r_min().is_none() && opt.r_max().is_none() {
        return Ok(());
    }
    if !value.is_number() {
        return Err(ConfigError::type_error(
            opt.name(),
            format!(
                "range-checked fields need a number, got {}",
                value.type_name()
            ),
        ));
    }

    // NaN compares as None and so falls outside every range.
    let above_min = opt.r_min().is_none_or(|min| {
        matches!(value.cmp_number(min), Some(Ordering::Greater | Ordering::Equal))
    });
    let below_max = opt.r_max().is_none_or(|max| {
        matches!(value.cmp_number(max), Some(Ordering::Less | Ordering::Equal))
    });

    if !(above_min && below_max) {
        return Err(ConfigError::range(
            opt.name(),
            format!(
                "{value} is not within [{}, {}]",
                opt.r_min().map_or_else(|| "-inf".to_string(), ToString::to_string),
                opt.r_max().map_or_else(|| "inf".to_string(), ToString::to_string),
            ),
        ));
    }
    Ok(())
}
