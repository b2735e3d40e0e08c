#[cfg(test)]
pub mod test {
    use crate::config::Config;
    use crate::error::ConfigError;
    use crate::types::{Computed, Schema};
    use crate::value::{FieldType, Value};

    /// Small CLI-facing schema: a string, two bools and a ranged int.
    pub fn user_schema() -> Vec<Schema> {
        vec![
            Schema::new("username|u")
                .default("guest")
                .field_type(FieldType::Str)
                .help("Username"),
            Schema::new("debug|d")
                .default(false)
                .field_type(FieldType::Bool)
                .help("Enable debug mode"),
            Schema::new("timeout|t")
                .default(30)
                .field_type(FieldType::Int)
                .range(1, 120)
                .help("Timeout in seconds"),
            Schema::new("no_wrap")
                .default(true)
                .field_type(FieldType::Bool)
                .help("Disable text wrapping"),
        ]
    }

    // -- Cross-field validation fixture ----------------------------------------

    fn check_port_admin(value: &Value, cfg: &Config) -> Result<(), ConfigError> {
        let Some(port) = value.as_int() else {
            return Ok(());
        };
        if port <= 1023 && cfg.get_str("userrole")? != "admin" {
            return Err(ConfigError::validation(
                "port",
                format!("Port {port} not permitted; login as admin please."),
            ));
        }
        Ok(())
    }

    /// Ports below 1024 are reserved for the admin role.
    pub fn port_schema() -> Vec<Schema> {
        vec![
            Schema::new("port|p")
                .default(3274)
                .range(0, 65535)
                .field_type(FieldType::Int)
                .validator(check_port_admin),
            Schema::new("userrole|r")
                .default("guest")
                .field_type(FieldType::Str),
        ]
    }

    // -- Text generator fixture ------------------------------------------------

    fn validate_sentences(value: &Value, cfg: &Config) -> Result<(), ConfigError> {
        if value.as_int() < Some(cfg.get_int("min_sentences")?) {
            return Err(ConfigError::range(
                "max_sentences",
                "min-sentences must be <= max-sentences",
            ));
        }
        Ok(())
    }

    fn validate_words(value: &Value, cfg: &Config) -> Result<(), ConfigError> {
        if value.as_int() < Some(cfg.get_int("min_words")?) {
            return Err(ConfigError::range(
                "max_words",
                "min-words must be <= max-words",
            ));
        }
        Ok(())
    }

    fn spaces() -> Computed {
        Computed::new("spaces", |_, cfg| {
            let n = cfg.get_int("sentence_ending_spaces")?;
            Ok(Value::from(" ".repeat(usize::try_from(n).unwrap_or(0))))
        })
    }

    /// Options of a lorem-ipsum style text generator.
    pub fn ipsum_schema() -> Vec<Schema> {
        let int = FieldType::Int;
        vec![
            Schema::new("version").field_type(FieldType::Bool),
            Schema::new("read_manual").default(false).field_type(FieldType::Bool),
            Schema::new("options").default(false).field_type(FieldType::Bool),
            Schema::new("paragraphs|p").default(1).range(1, 5000).field_type(int),
            Schema::new("sentences|s").default(0).range(0, 5000).field_type(int),
            Schema::new("newlines|n").default(1).range(0, 5000).field_type(int),
            Schema::new("min_sentences|m").default(3).range(1, 5000).field_type(int),
            Schema::new("max_sentences|x")
                .default(8)
                .range(1, 5000)
                .field_type(int)
                .validator(validate_sentences),
            Schema::new("max_sections|c").default(2).range(1, 5).field_type(int),
            Schema::new("min_words").default(3).range(1, 30).field_type(int),
            Schema::new("max_words")
                .default(12)
                .range(1, 30)
                .field_type(int)
                .validator(validate_words),
            Schema::new("indent_first").default(7).range(0, 10).field_type(int),
            Schema::new("indent_next").default(3).range(0, 10).field_type(int),
            Schema::new("sentence_ending_punct")
                .default("!??......")
                .field_type(FieldType::Str),
            Schema::new("sentence_ending_spaces")
                .default(2)
                .range(1, 10)
                .field_type(int)
                .computed(spaces()),
            Schema::new("width").default(79).range(5, 5000).field_type(int),
            Schema::new("no_wrap").default(false).field_type(FieldType::Bool),
            Schema::new("with_luminaries|w").default(false).field_type(FieldType::Bool),
            Schema::new("luminary_probability|y").default(3).range(0, 10).field_type(int),
            Schema::new("luminary_lang")
                .default("en")
                .field_type(FieldType::Str)
                .domain(["en", "nl", "du", "fr", "es"]),
            Schema::new("show_annotation|a").default(false).field_type(FieldType::Bool),
            Schema::new("anno_width").default(69).range(5, 5000).field_type(int),
            Schema::new("anno_indent_first").default(4).range(0, 50).field_type(int),
            Schema::new("anno_indent_next").default(6).range(0, 50).field_type(int),
            Schema::new("anno_heading_1")
                .default("- Who They Were -")
                .field_type(FieldType::Str),
            Schema::new("anno_heading_2")
                .default("-".repeat(17))
                .field_type(FieldType::Str),
            Schema::new("tag_paragraph_start").field_type(FieldType::Str),
            Schema::new("tag_paragraph_end").field_type(FieldType::Str),
            Schema::new("tag_sentence_start").field_type(FieldType::Str),
            Schema::new("tag_sentence_end").field_type(FieldType::Str),
            Schema::new("tag_luminary_start").default(" <").field_type(FieldType::Str),
            Schema::new("tag_luminary_end").default("> ").field_type(FieldType::Str),
        ]
    }

    #[test]
    fn ipsum_schema_compiles() {
        let cfg = Config::config_factory(&ipsum_schema(), None).unwrap();
        assert_eq!(cfg.field_names().len(), ipsum_schema().len());
        assert_eq!(cfg.get_str("spaces").unwrap(), "  ");
        assert!(!cfg.get_bool("options").unwrap());
        assert!(cfg.get_bool("no_options").unwrap());
    }
}
