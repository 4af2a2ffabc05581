//! Help text rendering.
//!
//! The built-in `--help` flag calls a [`HelpRenderer`]. [`PlainHelp`] is the
//! default: unthemed text, one section per option group.

use std::fmt::Write;

use argweave_core::{
    CliSchema, OptionDef, OptionsSchema, PositionalDef, PositionalKind, Value, overlay_options,
};

/// Produces help text for a CLI, optionally scoped to one command.
pub trait HelpRenderer {
    fn render(&self, cli: &CliSchema, command: Option<&str>) -> String;
}

impl<F> HelpRenderer for F
where
    F: Fn(&CliSchema, Option<&str>) -> String,
{
    fn render(&self, cli: &CliSchema, command: Option<&str>) -> String {
        self(cli, command)
    }
}

/// Plain-text help with `Usage`, `Commands`, `Arguments` and `Options` sections.
///
/// # Examples
///
/// ```
/// use argweave::{HelpRenderer, PlainHelp};
/// use argweave::{CliSchema, CommandSchema, OptionDef};
///
/// let mut cli = CliSchema::new("tool");
/// cli.options.insert("verbose", OptionDef::boolean().with_alias("v").with_description("Say more"));
/// cli.commands.insert("test".into(), CommandSchema::new("Run tests"));
///
/// let text = PlainHelp.render(&cli, None);
/// assert!(text.starts_with("Usage: tool [OPTIONS] <COMMAND>"));
/// assert!(text.contains("  test"));
/// assert!(text.contains("-v, --verbose"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHelp;

impl HelpRenderer for PlainHelp {
    fn render(&self, cli: &CliSchema, command: Option<&str>) -> String {
        let scoped = command.and_then(|token| cli.find_command(token));

        let (usage_name, description, options, positionals) = match scoped {
            Some((name, cmd)) => (
                format!("{} {}", cli.name, name),
                cmd.description.as_deref(),
                overlay_options(&cli.options, &cmd.options),
                cmd.positionals.as_slice(),
            ),
            None => (
                cli.name.clone(),
                cli.description.as_deref(),
                cli.options.clone(),
                cli.positionals.as_slice(),
            ),
        };

        let mut out = String::new();
        let _ = write!(out, "Usage: {usage_name} [OPTIONS]");
        if scoped.is_none() && cli.has_commands() {
            out.push_str(" <COMMAND>");
        }
        for (i, positional) in positionals.iter().enumerate().filter(|(_, p)| !p.hidden) {
            let _ = write!(out, " {}", positional_usage(positional, i));
        }
        out.push('\n');

        if let Some(description) = description {
            let _ = write!(out, "\n{description}\n");
        }

        if scoped.is_none() && cli.has_commands() {
            let rows = cli
                .commands
                .iter()
                .filter(|(_, cmd)| !cmd.hidden)
                .map(|(name, cmd)| {
                    let mut text = cmd.description.clone().unwrap_or_default();
                    if !cmd.aliases.is_empty() {
                        let _ = write!(text, " (aliases: {})", cmd.aliases.join(", "));
                    }
                    (name.clone(), text.trim().to_string())
                })
                .collect();
            section(&mut out, "Commands", rows);
        }

        let rows = positionals
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.hidden)
            .map(|(i, p)| (positional_usage(p, i), positional_text(p)))
            .collect();
        section(&mut out, "Arguments", rows);

        for (group, rows) in option_sections(&options) {
            section(&mut out, &group, rows);
        }

        let mut builtins = Vec::new();
        if options.find_by_alias("help").is_none() {
            let spelling = if options.find_by_alias("h").is_none() { "-h, --help" } else { "    --help" };
            builtins.push((spelling.to_string(), "Print help".to_string()));
        }
        if options.find_by_alias("version").is_none() {
            builtins.push(("    --version".to_string(), "Print version".to_string()));
        }
        section(&mut out, "Built-in", builtins);

        out
    }
}

fn section(out: &mut String, title: &str, rows: Vec<(String, String)>) {
    if rows.is_empty() {
        return;
    }
    let width = rows.iter().map(|(left, _)| left.len()).max().unwrap_or(0);

    let _ = write!(out, "\n{title}:\n");
    for (left, right) in rows {
        if right.is_empty() {
            let _ = writeln!(out, "  {left}");
        } else {
            let _ = writeln!(out, "  {left:width$}  {right}");
        }
    }
}

/// Visible options as rows, ungrouped first under "Options", then one
/// section per group in first-seen order.
fn option_sections(options: &OptionsSchema) -> Vec<(String, Vec<(String, String)>)> {
    let mut sections: Vec<(String, Vec<(String, String)>)> = vec![("Options".to_string(), Vec::new())];

    for (name, def) in options.iter().filter(|(_, def)| !def.hidden) {
        let title = def.group.clone().unwrap_or_else(|| "Options".to_string());
        let row = (option_spelling(name, def), option_text(def));
        match sections.iter_mut().find(|(t, _)| *t == title) {
            Some((_, rows)) => rows.push(row),
            None => sections.push((title, vec![row])),
        }
    }

    sections
}

fn option_spelling(name: &str, def: &OptionDef) -> String {
    let short = def
        .short_alias()
        .or_else(|| (name.chars().count() == 1).then_some(name));
    let mut longs: Vec<&str> = Vec::new();
    if name.chars().count() > 1 {
        longs.push(name);
    }
    longs.extend(def.aliases.iter().map(String::as_str).filter(|a| a.chars().count() > 1));

    let mut spelling = match short {
        Some(s) if longs.is_empty() => format!("-{s}"),
        Some(s) => format!("-{s}, "),
        None => "    ".to_string(),
    };
    spelling.push_str(
        &longs
            .iter()
            .map(|l| format!("--{l}"))
            .collect::<Vec<_>>()
            .join(", "),
    );
    if let Some(placeholder) = def.kind.placeholder() {
        let _ = write!(spelling, " {placeholder}");
    }
    spelling
}

fn option_text(def: &OptionDef) -> String {
    let mut text = def.description.clone().unwrap_or_default();
    if def.required {
        text.push_str(" [required]");
    }
    if let Some(default) = &def.default {
        let _ = write!(text, " [default: {}]", display_value(default));
    }
    text.trim().to_string()
}

fn positional_usage(def: &PositionalDef, index: usize) -> String {
    let name = def.display_name(index);
    match (&def.kind, def.required) {
        (PositionalKind::Variadic { .. }, true) => format!("<{name}>..."),
        (PositionalKind::Variadic { .. }, false) => format!("[{name}]..."),
        (_, true) => format!("<{name}>"),
        (_, false) => format!("[{name}]"),
    }
}

fn positional_text(def: &PositionalDef) -> String {
    let mut text = def.description.clone().unwrap_or_default();
    if let PositionalKind::Enum { choices } = &def.kind {
        let _ = write!(text, " [choices: {}]", choices.join(", "));
    }
    if let Some(default) = &def.default {
        let _ = write!(text, " [default: {}]", display_value(default));
    }
    text.trim().to_string()
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(", "),
    }
}

#[cfg(test)]
mod tests {
    use argweave_core::{CommandSchema, ItemKind};

    use super::*;

    fn cli() -> CliSchema {
        let mut cli = CliSchema::new("runner");
        cli.options.insert("verbose", OptionDef::boolean().with_alias("v"));
        cli.options.insert(
            "color",
            OptionDef::enumeration(["auto", "never"]).with_default("auto").in_group("Display"),
        );
        cli.commands.insert(
            "test".into(),
            CommandSchema::new("Run tests")
                .with_alias("t")
                .with_option("jobs", OptionDef::number().with_alias("j").with_default(2.0))
                .with_positional(PositionalDef::variadic(ItemKind::String).named("paths")),
        );
        cli.commands.insert("secret".into(), CommandSchema {
            hidden: true,
            ..CommandSchema::new("Hidden")
        });
        cli
    }

    #[test]
    fn test_top_level_lists_visible_commands() {
        let text = PlainHelp.render(&cli(), None);
        assert!(text.contains("Run tests (aliases: t)"));
        assert!(!text.contains("secret"));
        assert!(text.contains("\nDisplay:\n"));
        assert!(text.contains("[default: auto]"));
        assert!(text.contains("--version"));
    }

    #[test]
    fn test_command_scope_merges_options() {
        let text = PlainHelp.render(&cli(), Some("t"));
        assert!(text.starts_with("Usage: runner test [OPTIONS] [paths]..."));
        assert!(text.contains("-j, --jobs <number>"));
        assert!(text.contains("[default: 2]"));
        assert!(text.contains("-v, --verbose"));
        assert!(!text.contains("Commands:"));
        assert!(text.contains("    --version  Print version"));
    }

    #[test]
    fn test_builtin_rows_respect_user_options() {
        let mut cli = CliSchema::new("tool");
        cli.options.insert("host", OptionDef::string().with_alias("h"));
        let text = PlainHelp.render(&cli, None);
        assert!(text.contains("    --help"));
        assert!(!text.contains("-h, --help"));
    }

    #[test]
    fn test_closure_renderer() {
        let renderer = |cli: &CliSchema, _: Option<&str>| format!("custom {}", cli.name);
        assert_eq!(renderer.render(&CliSchema::new("x"), None), "custom x");
    }
}
