//! Clap adapter for cfgschema.
//!
//! This module is the **optional integration layer** between a [`Config`] and
//! the [clap](https://docs.rs/clap) CLI parser. It is compiled only when the
//! `clap` Cargo feature is enabled (on by default).
//!
//! The flow has three steps, each usable on its own:
//!
//! 1. [`create_args_from_cfg`] turns every field's metadata into an
//!    [`ArgSpec`]: `-x`/`--multi-word` names, a toggle for `bool` fields and
//!    an optional value slot for everything else.
//! 2. [`build_parser`] registers the specs on a [`clap::Command`].
//! 3. [`run_parser`] parses the tokens and writes **only the supplied flags**
//!    back onto the config through the normal validated write path. Fields
//!    whose flags are absent are never touched, so a command line is a
//!    sparse update on top of whatever the config already holds.
//!
//! Tokens are coerced here rather than by clap so a malformed number
//! surfaces as the same [`ConfigError::Type`] a direct write would produce.

use std::collections::BTreeMap;
use std::ffi::OsString;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, Command};

use crate::config::Config;
use crate::error::ConfigError;
use crate::value::{FieldType, Value};

/// How a flag consumes tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgKind {
    /// `store_true`-style switch taking no value.
    Toggle,
    /// Optional value slot; the token is coerced to the given primary type,
    /// or kept as a string for untyped fields.
    Value(Option<FieldType>),
}

/// Everything needed to register one flag, apart from its names.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgKwargs {
    pub dest: String,
    pub kind: ArgKind,
    pub help: String,
    pub metavar: Option<String>,
    /// When set, the field is part of the parse result even if its flag is absent.
    pub default: Option<Value>,
}

/// A flag specification derived from one field.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    /// `["-x", "--multi-word"]`, short flag first when present.
    pub names: Vec<String>,
    pub kwargs: ArgKwargs,
}

impl ArgSpec {
    pub fn short(&self) -> Option<char> {
        self.names
            .iter()
            .filter(|n| !n.starts_with("--"))
            .find_map(|n| n.strip_prefix('-').and_then(|s| s.chars().next()))
    }

    pub fn long(&self) -> Option<&str> {
        self.names.iter().find_map(|n| n.strip_prefix("--"))
    }
}

/// Per-field adjustments merged into the generated [`ArgKwargs`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgOverride {
    pub help: Option<String>,
    pub default: Option<Value>,
    pub metavar: Option<String>,
}

/// Overrides keyed by canonical field name.
pub type ArgOverrides = BTreeMap<String, ArgOverride>;

/// The values a parse actually supplied, in the order they were applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    entries: Vec<(String, Value)>,
}

impl Namespace {
    pub fn get(&self, dest: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == dest).then_some(v))
    }

    pub fn contains(&self, dest: &str) -> bool {
        self.get(dest).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Derive one [`ArgSpec`] per field of `cfg`, in declaration order.
///
/// `cfg_kwargs` adjusts the generated help, metavar or default of named
/// fields; naming a field the config doesn't have is an error.
pub fn create_args_from_cfg(
    cfg: &Config,
    cfg_kwargs: Option<&ArgOverrides>,
) -> Result<Vec<ArgSpec>, ConfigError> {
    if let Some(overrides) = cfg_kwargs
        && let Some(unknown) = overrides.keys().find(|k| !cfg.field_names().contains(&k.as_str()))
    {
        return Err(ConfigError::UnknownKey(unknown.clone()));
    }

    let mut specs = Vec::new();
    for opt in cfg.options() {
        let mut names = Vec::with_capacity(2);
        if let Some(short) = opt.short_flag() {
            names.push(format!("-{short}"));
        }
        names.push(format!("--{}", opt.name().replace('_', "-")));

        let (kind, metavar) = if opt.is_bool() {
            (ArgKind::Toggle, None)
        } else {
            let primary = opt.primary_type();
            let metavar = match primary {
                Some(t) if t.is_numeric() => Some("NUM".to_string()),
                Some(FieldType::Str) | None => Some("CHARS".to_string()),
                Some(_) => None,
            };
            (ArgKind::Value(primary), metavar)
        };

        let mut kwargs = ArgKwargs {
            dest: opt.name().to_string(),
            kind,
            help: opt.help_message(),
            metavar,
            default: None,
        };

        if let Some(over) = cfg_kwargs.and_then(|o| o.get(opt.name())) {
            if let Some(help) = &over.help {
                kwargs.help = help.clone();
            }
            if let Some(metavar) = &over.metavar {
                kwargs.metavar = Some(metavar.clone());
            }
            if let Some(default) = &over.default {
                kwargs.default = Some(default.clone());
            }
        }

        specs.push(ArgSpec { names, kwargs });
    }
    Ok(specs)
}

/// Register `specs` on a fresh [`Command`].
///
/// The command expects arguments without the binary name. Repeating a flag
/// overrides its earlier occurrence. `--help` is always available, `-h`
/// only when no field claims it.
pub fn build_parser(specs: &[ArgSpec]) -> Command {
    let mut cmd = Command::new(env!("CARGO_PKG_NAME"))
        .no_binary_name(true)
        .args_override_self(true)
        .disable_help_flag(true);

    let claims_help = specs.iter().any(|s| s.long() == Some("help") || s.kwargs.dest == "help");
    if !claims_help {
        let mut help = Arg::new("help")
            .long("help")
            .action(ArgAction::Help)
            .help("Print help");
        if !specs.iter().any(|s| s.short() == Some('h')) {
            help = help.short('h');
        }
        cmd = cmd.arg(help);
    }

    for spec in specs {
        cmd = cmd.arg(to_arg(spec));
    }
    cmd
}

fn to_arg(spec: &ArgSpec) -> Arg {
    let mut arg = Arg::new(spec.kwargs.dest.clone()).help(spec.kwargs.help.clone());
    if let Some(long) = spec.long() {
        arg = arg.long(long.to_string());
    }
    if let Some(short) = spec.short() {
        arg = arg.short(short);
    }

    match spec.kwargs.kind {
        ArgKind::Toggle => arg.action(ArgAction::SetTrue),
        ArgKind::Value(_) => {
            arg = arg
                .action(ArgAction::Set)
                .num_args(0..=1)
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(String));
            if let Some(metavar) = &spec.kwargs.metavar {
                arg = arg.value_name(metavar.clone());
            }
            arg
        }
    }
}

/// Parse `cli_args` (or the live process arguments when `None`) and apply
/// every supplied value to `cfg`.
///
/// Values are written in spec order through the validated write path; the
/// first rejected value aborts the remaining writes. Specs are derived from
/// `cfg` when not given.
pub fn run_parser(
    cfg: &mut Config,
    specs: Option<&[ArgSpec]>,
    cli_args: Option<Vec<String>>,
) -> Result<(Command, Namespace), ConfigError> {
    let derived;
    let specs = match specs {
        Some(specs) => specs,
        None => {
            derived = create_args_from_cfg(cfg, None)?;
            &derived
        }
    };

    let mut cmd = build_parser(specs);
    let args: Vec<OsString> = match cli_args {
        Some(args) => args.into_iter().map(OsString::from).collect(),
        None => std::env::args_os().skip(1).collect(),
    };
    let matches = cmd.try_get_matches_from_mut(args)?;

    let mut namespace = Namespace::default();
    for spec in specs {
        let dest = spec.kwargs.dest.as_str();
        let supplied = matches.value_source(dest) == Some(ValueSource::CommandLine);

        let value = if supplied {
            match spec.kwargs.kind {
                ArgKind::Toggle => Value::Bool(true),
                ArgKind::Value(primary) => {
                    let raw = matches
                        .try_get_one::<String>(dest)
                        .map_err(|e| ConfigError::type_error(dest, e.to_string()))?;
                    match raw {
                        Some(raw) => coerce(dest, raw, primary)?,
                        None => Value::Null,
                    }
                }
            }
        } else if let Some(default) = &spec.kwargs.default {
            default.clone()
        } else {
            continue;
        };

        tracing::debug!(field = dest, %value, supplied, "applying command line value");
        cfg.set_stored(dest, value.clone())?;
        namespace.entries.push((dest.to_string(), value));
    }

    Ok((cmd, namespace))
}

/// Convert a raw token to the field's primary type.
fn coerce(dest: &str, raw: &str, primary: Option<FieldType>) -> Result<Value, ConfigError> {
    let invalid = |expected: FieldType| {
        ConfigError::type_error(dest, format!("invalid {expected} value: '{raw}'"))
    };

    match primary {
        None | Some(FieldType::Str) => Ok(Value::Str(raw.to_string())),
        Some(FieldType::Int) => raw
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| invalid(FieldType::Int)),
        Some(FieldType::Float) => raw
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| invalid(FieldType::Float)),
        Some(FieldType::Bool) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
            _ => Err(invalid(FieldType::Bool)),
        },
        Some(t @ (FieldType::List | FieldType::Map)) => serde_json::from_str::<serde_json::Value>(raw)
            .map(Value::from)
            .map_err(|_| invalid(t)),
        Some(FieldType::Any) => Ok(serde_json::from_str::<serde_json::Value>(raw)
            .map(Value::from)
            .unwrap_or_else(|_| Value::Str(raw.to_string()))),
    }
}
