use std::cell::RefCell;
use std::rc::Rc;

use argweave::{
    Cli, CliError, DefaultHandler, ItemKind, OptionDef, OptionsSchema, Outcome, ParseError,
    ParseResult, Parser, PositionalDef, ValidationErrorKind, Value, handle, map, map_async, merge,
    pipe,
};
use futures::executor::block_on;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Log = Rc<RefCell<Vec<String>>>;

fn append(log: &Log, entry: &'static str) -> impl Fn(ParseResult) -> ParseResult + 'static {
    let log = Rc::clone(log);
    move |result| {
        log.borrow_mut().push(entry.to_string());
        result
    }
}

fn suffix(tag: &'static str) -> impl Fn(ParseResult) -> ParseResult + 'static {
    move |mut result| {
        let current = result
            .value("trace")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        result
            .values
            .insert("trace".into(), Value::from(format!("{current}{tag}")));
        result
    }
}

fn runner(log: &Log) -> Cli {
    let test = pipe!(
        Parser::new(
            OptionsSchema::new()
                .with("filter", OptionDef::string().with_alias("f"))
                .with("jobs", OptionDef::number().with_alias("j").with_default(1.0)),
            vec![PositionalDef::variadic(ItemKind::String).named("paths")],
        )
        .unwrap(),
        map(append(log, "test-transform")),
        handle({
            let log = Rc::clone(log);
            move |result: ParseResult| {
                log.borrow_mut().push(format!(
                    "test-handler jobs={}",
                    result.value("jobs").and_then(Value::as_number).unwrap_or(0.0)
                ));
                Ok(())
            }
        }),
    );

    let globals = Parser::from_options(
        OptionsSchema::new()
            .with("verbose", OptionDef::count().with_alias("v"))
            .with("color", OptionDef::enumeration(["auto", "never"]).with_default("auto")),
    )
    .unwrap()
    .map(append(log, "global-transform"));

    Cli::builder("runner")
        .version("0.3.0")
        .description("Runs things")
        .globals(globals)
        .command("test", "Run tests", test.with_alias("t"))
        .default_command("test")
        .build()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Transform ordering
// ---------------------------------------------------------------------------

#[test]
fn test_map_then_map_applies_f_then_g() {
    let observed = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&observed);

    let command = Parser::empty()
        .map(suffix("f"))
        .map(suffix("g"))
        .handle(move |result| {
            *sink.borrow_mut() = result.value("trace").cloned();
            Ok(())
        });
    command.run::<&str>(&[]).unwrap();

    assert_eq!(*observed.borrow(), Some(Value::from("fg")));
}

#[test]
fn test_global_transforms_run_before_command_transforms() {
    let log: Log = Rc::default();
    let cli = runner(&log);

    let outcome = cli.parse(&["-vv", "test", "-j", "3"]).unwrap();
    assert_eq!(outcome, Outcome::Handled { command: Some("test".into()) });
    assert_eq!(
        *log.borrow(),
        vec!["global-transform", "test-transform", "test-handler jobs=3"]
    );
}

#[test]
fn test_default_command_runs_full_pipeline() {
    let log: Log = Rc::default();
    let cli = runner(&log);

    cli.parse(&["--filter", "unit"]).unwrap();
    assert_eq!(log.borrow().len(), 3);
}

#[test]
fn test_async_pipeline_preserves_order() {
    let log: Log = Rc::default();
    let entries = Rc::clone(&log);

    let command = Parser::empty()
        .map(suffix("a"))
        .map_async(move |result| {
            let entries = Rc::clone(&entries);
            async move {
                entries.borrow_mut().push("async".to_string());
                Ok(suffix("b")(result))
            }
        })
        .map(suffix("c"))
        .handle_async({
            let log = Rc::clone(&log);
            move |result: ParseResult| {
                let log = Rc::clone(&log);
                async move {
                    let trace = result.value("trace").and_then(Value::as_str).unwrap_or_default();
                    log.borrow_mut().push(format!("handler {trace}"));
                    Ok(())
                }
            }
        });

    block_on(command.run_async::<&str>(&[])).unwrap();
    assert_eq!(*log.borrow(), vec!["async", "handler abc"]);
}

// ---------------------------------------------------------------------------
// Sync rejection of async
// ---------------------------------------------------------------------------

#[test]
fn test_sync_entry_point_rejects_async_transform_without_running_it() {
    let log: Log = Rc::default();
    let entries = Rc::clone(&log);
    let parser = pipe!(
        Parser::empty(),
        map(append(&log, "sync-first")),
        map_async(move |result| {
            let entries = Rc::clone(&entries);
            async move {
                entries.borrow_mut().push("async".to_string());
                Ok(result)
            }
        }),
    );

    let err = parser.parse::<&str>(&[]).unwrap_err();
    assert!(matches!(err, CliError::AsyncInSyncContext));
    assert!(err.to_string().contains("parse_async"));
    assert!(log.borrow().is_empty());
}

#[test]
fn test_cli_sync_parse_rejects_async_global_transform() {
    let globals = Parser::empty().map_async(|result| async move { Ok(result) });
    let cli = Cli::builder("x")
        .globals(globals)
        .handler(|_| Ok(()))
        .build()
        .unwrap();

    assert!(matches!(cli.parse::<&str>(&[]), Err(CliError::AsyncInSyncContext)));
    assert_eq!(
        block_on(cli.parse_async::<&str>(&[])).unwrap(),
        Outcome::Handled { command: None }
    );
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

#[test]
fn test_merge_many_parsers() {
    let source = Parser::from_positionals(vec![PositionalDef::string().named("src").required()]).unwrap();
    let dest = Parser::from_positionals(vec![PositionalDef::string().named("dst").required()]).unwrap();
    let flags = Parser::from_options(OptionsSchema::new().with("force", OptionDef::boolean().with_alias("f")))
        .unwrap()
        .map(suffix("flags"));

    let copy = merge([source, dest, flags]).unwrap();
    let result = copy.parse(&["-f", "a", "b"]).unwrap();

    assert_eq!(result.value("force"), Some(&Value::Bool(true)));
    assert_eq!(result.positional(0), Some(&Value::from("a")));
    assert_eq!(result.positional(1), Some(&Value::from("b")));
    assert_eq!(result.value("trace"), Some(&Value::from("flags")));
}

#[test]
fn test_merge_rejects_negation_collision() {
    let a = Parser::from_options(OptionsSchema::new().with("color", OptionDef::boolean())).unwrap();
    let b = Parser::from_options(OptionsSchema::new().with("no-color", OptionDef::string())).unwrap();

    let err = merge([a, b]).unwrap_err();
    assert!(matches!(
        err.kind,
        ValidationErrorKind::NegationConflict { .. } | ValidationErrorKind::AliasConflict { .. }
    ));
}

// ---------------------------------------------------------------------------
// Built-ins and errors
// ---------------------------------------------------------------------------

#[test]
fn test_help_scoped_to_command_alias() {
    let log: Log = Rc::default();
    let cli = runner(&log);

    let Outcome::Help(text) = cli.parse(&["t", "--help"]).unwrap() else {
        panic!("expected help");
    };
    assert!(text.starts_with("Usage: runner test"));
    assert!(text.contains("--filter"));
    assert!(log.borrow().is_empty());
}

#[test]
fn test_version_builtin() {
    let log: Log = Rc::default();
    assert_eq!(
        runner(&log).parse(&["--version"]).unwrap(),
        Outcome::Version("0.3.0".into())
    );

    let cli = runner(&log);
    assert_eq!(cli.parse(&["test", "--version"]).unwrap(), Outcome::Version("0.3.0".into()));
    let Outcome::Help(text) = cli.parse(&["test", "--help"]).unwrap() else {
        panic!("expected help");
    };
    assert!(text.contains("--version"));
    assert!(log.borrow().is_empty());
}

#[test]
fn test_usage_error_carries_command_scope() {
    let log: Log = Rc::default();
    let cli = runner(&log);

    let err = cli.parse(&["test", "-j", "lots"]).unwrap_err();
    assert_eq!(err.command(), Some("test"));
    assert_eq!(err.exit_code(), 2);
    assert!(matches!(err, CliError::Usage { error: ParseError::InvalidNumber { .. }, .. }));
    assert!(cli.render_help(err.command()).contains("--jobs"));
}

#[test]
fn test_handler_error_is_not_usage() {
    let cli = Cli::builder("x")
        .handler(|_| Err(anyhow::anyhow!("backend offline")))
        .build()
        .unwrap();

    let err = cli.parse::<&str>(&[]).unwrap_err();
    assert!(!err.is_usage());
    assert_eq!(err.exit_code(), 1);
    assert_eq!(err.to_string(), "handler failed: backend offline");
}

#[test]
fn test_schema_reflects_builder() {
    let log: Log = Rc::default();
    let cli = runner(&log);
    let schema = cli.schema();

    assert_eq!(schema.default_handler, Some(DefaultHandler::Command("test".into())));
    assert_eq!(schema.commands["test"].aliases, vec!["t"]);
    assert!(schema.options.contains("verbose"));
}
