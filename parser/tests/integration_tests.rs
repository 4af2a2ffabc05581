use argweave_core::{
    CliSchema, CommandSchema, DefaultHandler, ItemKind, OptionDef, OptionsSchema, PositionalDef,
    Value, validate_cli,
};
use argweave_parser::{ParseError, parse, parse_cli};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_runner() -> CliSchema {
    let mut cli = CliSchema::new("runner");
    cli.options.insert("verbose", OptionDef::boolean().with_alias("v"));
    cli.options
        .insert("color", OptionDef::enumeration(["auto", "always", "never"]).with_default("auto"));
    cli.commands.insert(
        "test".into(),
        CommandSchema::new("Run tests")
            .with_option("filter", OptionDef::string().with_alias("f"))
            .with_option("jobs", OptionDef::number().with_alias("j").with_default(1.0))
            .with_positional(PositionalDef::variadic(ItemKind::String).named("paths")),
    );
    cli.commands.insert(
        "bench".into(),
        CommandSchema::new("Run benchmarks")
            .with_option("tag", OptionDef::array_of_choices(["fast", "slow"]).with_alias("t"))
            .with_positional(PositionalDef::string().named("suite").required()),
    );
    cli.default_handler = Some(DefaultHandler::Command("test".into()));
    cli
}

// ---------------------------------------------------------------------------
// Command merge
// ---------------------------------------------------------------------------

#[test]
fn test_command_merge_exact_values() {
    let mut cli = CliSchema::new("tool");
    cli.options.insert("verbose", OptionDef::boolean());
    cli.commands.insert(
        "test".into(),
        CommandSchema::new("Test").with_option("filter", OptionDef::string()),
    );
    assert!(validate_cli(&cli).is_ok());

    let result = parse_cli(&["test", "--verbose", "--filter", "x"], &cli).unwrap();
    assert_eq!(result.command.as_deref(), Some("test"));
    assert_eq!(result.values.len(), 2);
    assert_eq!(result.value("verbose"), Some(&Value::Bool(true)));
    assert_eq!(result.value("filter"), Some(&Value::from("x")));
}

#[test]
fn test_full_invocation() {
    let cli = test_runner();
    assert!(validate_cli(&cli).is_ok());

    let result = parse_cli(
        &["-v", "test", "-j", "4", "--filter=unit", "src", "tests", "--color", "never"],
        &cli,
    )
    .unwrap();

    assert_eq!(result.command.as_deref(), Some("test"));
    assert_eq!(result.value("verbose"), Some(&Value::Bool(true)));
    assert_eq!(result.value("jobs"), Some(&Value::Number(4.0)));
    assert_eq!(result.value("filter"), Some(&Value::from("unit")));
    assert_eq!(result.value("color"), Some(&Value::from("never")));
    assert_eq!(result.positionals, vec![Some(Value::from(vec!["src", "tests"]))]);
}

#[test]
fn test_default_command_applies_defaults() {
    let result = parse_cli::<&str>(&[], &test_runner()).unwrap();

    assert_eq!(result.command.as_deref(), Some("test"));
    assert_eq!(result.value("jobs"), Some(&Value::Number(1.0)));
    assert_eq!(result.value("color"), Some(&Value::from("auto")));
    assert!(result.value("verbose").is_none());
    assert_eq!(result.positionals, vec![Some(Value::Array(Vec::new()))]);
}

#[test]
fn test_local_options_do_not_leak_between_commands() {
    let err = parse_cli(&["bench", "--filter", "x", "suite"], &test_runner()).unwrap_err();
    assert_eq!(err, ParseError::UnknownOption("--filter".into()));
}

#[test]
fn test_array_of_choices_in_command() {
    let result = parse_cli(&["bench", "-t", "fast", "--tag", "slow", "io"], &test_runner()).unwrap();
    assert_eq!(result.value("tag"), Some(&Value::from(vec!["fast", "slow"])));
    assert_eq!(result.positional(0), Some(&Value::from("io")));

    let err = parse_cli(&["bench", "-t", "medium", "io"], &test_runner()).unwrap_err();
    assert!(matches!(err, ParseError::InvalidChoice { value, .. } if value == "medium"));
}

#[test]
fn test_missing_required_positional_in_command() {
    let err = parse_cli(&["bench"], &test_runner()).unwrap_err();
    assert_eq!(err, ParseError::MissingRequiredPositional("suite".into()));
}

#[test]
fn test_unknown_command_is_help_trigger() {
    let err = parse_cli(&["deploy"], &test_runner()).unwrap_err();
    assert_eq!(err, ParseError::UnknownCommand("deploy".into()));
    assert!(err.is_help_trigger());
}

// ---------------------------------------------------------------------------
// Flat parsing
// ---------------------------------------------------------------------------

#[test]
fn test_negation_idempotence() {
    let options = OptionsSchema::new().with("verbose", OptionDef::boolean());

    let result = parse(&["--no-verbose"], &options, &Vec::new()).unwrap();
    assert_eq!(result.value("verbose"), Some(&Value::Bool(false)));
    assert!(!result.values.contains_key("no-verbose"));

    let result = parse(&["--no-verbose", "--no-verbose"], &options, &Vec::new()).unwrap();
    assert_eq!(result.value("verbose"), Some(&Value::Bool(false)));

    let err = parse(&["--verbose", "--no-verbose"], &options, &Vec::new()).unwrap_err();
    assert!(err.to_string().contains("conflicting options"));
}

#[test]
fn test_negation_overrides_true_default() {
    let options = OptionsSchema::new().with("color", OptionDef::boolean().with_default(true));

    let result = parse(&["--no-color"], &options, &Vec::new()).unwrap();
    assert_eq!(result.value("color"), Some(&Value::Bool(false)));

    let result = parse::<&str>(&[], &options, &Vec::new()).unwrap();
    assert_eq!(result.value("color"), Some(&Value::Bool(true)));
}

#[test]
fn test_word_alias_spelling() {
    let options = OptionsSchema::new().with("output", OptionDef::string().with_alias("out").with_alias("o"));

    for argv in [["--output", "a"], ["--out", "a"], ["-o", "a"]] {
        let result = parse(&argv, &options, &Vec::new()).unwrap();
        assert_eq!(result.value("output"), Some(&Value::from("a")));
    }
}

#[test]
fn test_number_positional_accepts_negative() {
    let positionals = vec![PositionalDef::number().named("offset").required()];
    let result = parse(&["-3"], &OptionsSchema::new(), &positionals).unwrap();
    assert_eq!(result.positional(0), Some(&Value::Number(-3.0)));

    let result = parse(&["-0x10"], &OptionsSchema::new(), &positionals).unwrap();
    assert_eq!(result.positional(0), Some(&Value::Number(-16.0)));
}
