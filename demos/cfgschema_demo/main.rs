//! # cfgschema demo application
//!
//! A sample CLI tool that showcases how to integrate
//! [cfgschema](https://docs.rs/cfgschema) into a real application. This is
//! **not** a real app; it exists to demonstrate and manually verify
//! cfgschema's features.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example cfgschema_demo
//! cargo run --example cfgschema_demo -- --help
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                 | How to exercise it                                                |
//! |-------------------------|-------------------------------------------------------------------|
//! | Compiled defaults       | `cargo run --example cfgschema_demo`                              |
//! | Sparse CLI update       | `cargo run --example cfgschema_demo -- -p 3`                      |
//! | Range check             | `cargo run --example cfgschema_demo -- --paragraphs 500`          |
//! | Domain check            | `cargo run --example cfgschema_demo -- --lang de`                 |
//! | Cross-field validator   | `cargo run --example cfgschema_demo -- -m 10 -x 5`                |
//! | Transaction             | `cargo run --example cfgschema_demo -- --port 80 -r admin`        |
//! | Rejected commit         | `cargo run --example cfgschema_demo -- --port 80`                 |
//! | Computed attribute      | `cargo run --example cfgschema_demo -- --ending-spaces 4`         |
//! | Auto-inverted attribute | `cargo run --example cfgschema_demo -- --no-wrap`                 |
//! | Debug logging           | `cargo run --example cfgschema_demo -- -v` or `RUST_LOG=debug`    |

mod schema;

use cfgschema::{Config, run_parser};
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn setup_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn fail(context: &str, e: impl std::fmt::Display) -> ! {
    eprintln!("{context}:\n{e}");
    std::process::exit(1);
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    setup_tracing(args.iter().any(|a| a == "-v" || a == "--verbose"));

    let schemas = schema::demo_schema().unwrap_or_else(|e| fail("Invalid schema", e));
    let mut cfg =
        Config::config_factory(&schemas, None).unwrap_or_else(|e| fail("Failed to build config", e));

    // port and userrole validate against each other, so apply the whole
    // command line before running validators.
    cfg.start_transaction()
        .unwrap_or_else(|e| fail("Config error", e));
    let namespace = match run_parser(&mut cfg, None, Some(args)) {
        Ok((_, namespace)) => namespace,
        Err(cfgschema::ConfigError::Cli(e)) => e.exit(),
        Err(e) => fail("Invalid argument", e),
    };
    cfg.commit_transaction()
        .unwrap_or_else(|e| fail("Rejected configuration", e));

    if namespace.is_empty() {
        println!("No flags given; showing defaults.");
    } else {
        let supplied: Vec<&str> = namespace.iter().map(|(name, _)| name).collect();
        println!("Applied from command line: {}", supplied.join(", "));
    }
    println!();
    println!("{}", cfg.inspect_vars());
}
