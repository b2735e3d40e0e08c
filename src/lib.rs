//! Schema-driven, validated runtime configuration. Declare your fields, get
//! a config object that refuses bad values.
//!
//! cfgschema turns a list of declarative [`Schema`]s into a [`Config`]: a
//! runtime object whose every stored value has passed its field's type,
//! domain, range and custom checks. Fields can be read and written by name,
//! derived attributes are computed on demand, and a clap adapter maps the
//! whole thing onto command line flags.
//!
//! ```ignore
//! let mut cfg = Config::config_factory(&[
//!     Schema::new("username|u").default("guest").field_type(FieldType::Str),
//!     Schema::new("debug|d").field_type(FieldType::Bool),
//!     Schema::new("timeout|t").default(30).range(1, 120),
//! ], None)?;
//!
//! cfg.set("timeout", 70)?;
//! assert!(cfg.set("timeout", 500).is_err());
//! assert!(cfg.get_bool("no_debug")?);
//! ```
//!
//! # Design: schemas as source of truth
//!
//! A [`Schema`] is a builder that never fails. Everything it declares is
//! checked once, when [`Config::config_factory`] compiles it into a
//! [`FieldOption`]:
//!
//! - **Names** are normalized. Leading dashes are stripped and inner dashes
//!   become underscores, so `"--go-fishing"` declares `go_fishing`. A
//!   `"name|x"` suffix declares the short flag `-x`.
//! - **Types** are a single [`FieldType`] or a tuple of them. A `bool` field
//!   without a default starts out `false`.
//! - **Domains** and **ranges** restrict values. Malformed ones (an empty
//!   domain, `min > max`, a non-numeric bound) fail compilation.
//! - **Validators** receive the candidate value and the whole config, so a
//!   field can depend on its neighbours.
//!
//! There is no separate registry to keep in sync: the schema list is the
//! config's shape, its CLI and its help text.
//!
//! # Validation order
//!
//! Every write runs the same pipeline and stops at the first failure,
//! leaving the previous value in place:
//!
//! ```text
//! required   Null on a required field
//!    ↓
//! type       value matches one of the declared types
//!    ↓
//! domain     value is a member of the domain
//!    ↓
//! range      r_min <= value <= r_max
//!    ↓
//! validator  custom cross-field check
//! ```
//!
//! `Null` means "unset" and passes type, domain and range checks. Fields
//! declared with `no_validate` skip the first four steps, not the last.
//!
//! # Derived attributes
//!
//! - **Computed** attributes ([`Computed`]) are evaluated on every read from
//!   the backing field's value and the rest of the config.
//! - **Auto-inverted** attributes exist for every plain `bool` field: `debug`
//!   gets `no_debug`, `no_wrap` gets `wrap`.
//!
//! Both are read-only. Writing one fails with [`SetError::ReadOnly`], which
//! sits outside [`ConfigError`] on purpose: it signals a programming mistake
//! rather than a bad value.
//!
//! # Transactions
//!
//! Fields that validate against each other can't always be updated one at a
//! time. Between [`start_transaction`](Config::start_transaction) and
//! [`commit_transaction`](Config::commit_transaction), field rules still run
//! on every write but custom validators are deferred. Commit runs the
//! validators of every field written, in declaration order, against the
//! final state.
//!
//! ```ignore
//! cfg.start_transaction()?;
//! cfg.set("port", 80)?;          // needs admin, checked at commit
//! cfg.set("userrole", "admin")?;
//! cfg.commit_transaction()?;
//! ```
//!
//! Construction itself behaves like a transaction: defaults are checked field
//! by field, then every validator runs on the fully populated config.
//!
//! # Schema documents
//!
//! [`schemas_from_toml`] reads schemas from a TOML document with one
//! `[[field]]` table per field. Unknown keys are rejected with a line number.
//!
//! # Clap adapter
//!
//! The `cli` module (behind the `clap` Cargo feature, on by default) derives
//! one flag per field and applies a parsed command line as a sparse update:
//!
//! ```ignore
//! let (_cmd, namespace) = run_parser(&mut cfg, None, None)?;
//! ```
//!
//! Only flags the user actually passed are written, through the same
//! validated path as [`Config::set`]. To use cfgschema without clap:
//!
//! ```toml
//! cfgschema = { version = "...", default-features = false }
//! ```
//!
//! # Error handling
//!
//! All fallible operations return [`ConfigError`]; [`ConfigError::kind`]
//! gives the category (metadata, type, domain, range, required, validation
//! and so on) for callers that branch on it. See the [`error`] module.

pub mod error;
pub mod types;
pub mod value;

mod config;
mod declare;
mod ops;
mod option;
mod validate;

#[cfg(feature = "clap")]
pub mod cli;

#[cfg(test)]
mod fixtures;

#[cfg(feature = "clap")]
pub use cli::{
    ArgKind, ArgKwargs, ArgOverride, ArgOverrides, ArgSpec, Namespace, build_parser,
    create_args_from_cfg, run_parser,
};
pub use config::{Config, HelpMap};
pub use declare::schemas_from_toml;
pub use error::{ConfigError, DerivedKind, ErrorKind, ReadOnlyError, SetError};
pub use ops::{VarEntry, VarListing, VarOrigin};
pub use option::FieldOption;
pub use types::{ComputeFn, Computed, Schema, ValidatorFn};
pub use value::{FieldType, TypeSpec, Value};
