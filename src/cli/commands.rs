//! # Dot Command Handler
//!
//! Dot commands control the shell and inspect the working context. Any
//! other line is a tag invocation, `TAG [KEY=VALUE ...]`.
//!
//! | Command                 | Description                                  |
//! |-------------------------|----------------------------------------------|
//! | `.quit` / `.exit`       | Exit the shell                               |
//! | `.help`                 | Show available commands                      |
//! | `.toc`                  | List every tag the archiver knows            |
//! | `.prepare [TAG...]`     | Compile tags (all tags when none are given)  |
//! | `.commit` / `.rollback` | End the open transaction                     |
//! | `.autocommit [on\|off]` | Show or switch auto-commit                   |
//! | `.set KEY VALUE`        | Store a value in the context                 |
//! | `.unset KEY`            | Remove a key from the context                |
//! | `.context`              | Print the context as JSON                    |
//! | `.clear`                | Empty the context                            |
//! | `.table KEY`            | Print a sequence from the context as a table |
//!
//! Command names are case-insensitive. Values are parsed as JSON when they
//! parse, otherwise taken as text, so `.set id 5` stores an integer and
//! `.set title crash` stores a string.

use crate::archive::Archiver;
use crate::cli::table::TableFormatter;
use crate::driver::Connection;
use crate::librarian::Librarian;
use crate::types::{Context, Datum};

#[derive(Debug, PartialEq)]
pub enum CommandResult {
    Output(String),
    Exit,
    Continue,
    Error(String),
}

pub struct CommandHandler;

impl CommandHandler {
    pub fn is_command(input: &str) -> bool {
        input.trim().starts_with('.')
    }

    pub fn execute<A, C>(input: &str, lib: &mut Librarian<A, C>, ctx: &mut Context) -> CommandResult
    where
        A: Archiver,
        C: Connection,
    {
        let input = input.trim();
        let (cmd, rest) = match input.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (input, ""),
        };
        if cmd.is_empty() {
            return CommandResult::Continue;
        }
        let args: Vec<&str> = rest.split_whitespace().collect();

        match cmd.to_lowercase().as_str() {
            ".quit" | ".exit" | ".q" => CommandResult::Exit,
            ".help" | ".h" | ".?" => CommandResult::Output(help_text()),
            ".toc" => list_tags(lib),
            ".prepare" => prepare(lib, &args),
            ".commit" => outcome(lib.commit().map(|_| "Committed.".to_string())),
            ".rollback" => outcome(lib.rollback().map(|_| "Rolled back.".to_string())),
            ".autocommit" => auto_commit(lib, &args),
            ".set" => set(ctx, rest),
            ".unset" => unset(ctx, &args),
            ".context" => CommandResult::Output(render_context(ctx)),
            ".clear" => {
                ctx.clear();
                CommandResult::Continue
            }
            ".table" => table(ctx, &args),
            other => CommandResult::Error(format!(
                "Unknown command: {}. Type .help for available commands.",
                other
            )),
        }
    }
}

/// Parses `KEY=VALUE`.
pub fn parse_assignment(arg: &str) -> Result<(String, Datum), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), parse_value(value))),
        _ => Err(format!("expected KEY=VALUE, got '{}'", arg)),
    }
}

/// JSON when `text` parses as JSON, a text scalar otherwise.
pub fn parse_value(text: &str) -> Datum {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(json) => Datum::from_json(&json),
        Err(_) => Datum::from(text),
    }
}

pub fn render_context(ctx: &Context) -> String {
    serde_json::to_string_pretty(&ctx.to_json()).unwrap_or_else(|e| format!("<{}>", e))
}

fn help_text() -> String {
    r#"Librarian shell commands:

  TAG [KEY=VALUE ...]    Run TAG against the context (assignments first)
  .quit, .exit, .q       Exit the shell
  .help, .h, .?          Show this help message
  .toc                   List every known tag
  .prepare [TAG ...]     Compile TAGs, or every tag when none are given
  .commit                Commit the open transaction
  .rollback              Roll back the open transaction
  .autocommit [on|off]   Show or switch auto-commit
  .set KEY VALUE         Store VALUE (JSON, or plain text) under KEY
  .unset KEY             Remove KEY from the context
  .context               Print the context as JSON
  .clear                 Empty the context
  .table KEY             Show the sequence at KEY as a table

Use Ctrl+D or .quit to exit."#
        .to_string()
}

fn outcome(result: crate::error::Result<String>) -> CommandResult {
    match result {
        Ok(text) => CommandResult::Output(text),
        Err(err) => CommandResult::Error(err.to_string()),
    }
}

fn list_tags<A: Archiver, C: Connection>(lib: &mut Librarian<A, C>) -> CommandResult {
    match lib.toc() {
        Ok(tags) if tags.is_empty() => CommandResult::Output("No tags found.".to_string()),
        Ok(tags) => CommandResult::Output(tags.into_iter().collect::<Vec<_>>().join("\n")),
        Err(err) => CommandResult::Error(err.to_string()),
    }
}

fn prepare<A: Archiver, C: Connection>(lib: &mut Librarian<A, C>, tags: &[&str]) -> CommandResult {
    if tags.is_empty() {
        return outcome(lib.prepare_all().map(|n| format!("Prepared {} tag(s).", n)));
    }
    outcome(lib.prepare(tags).map(|_| format!("Prepared {} tag(s).", tags.len())))
}

fn auto_commit<A: Archiver, C: Connection>(lib: &mut Librarian<A, C>, args: &[&str]) -> CommandResult {
    match args {
        [] => {}
        [flag] if flag.eq_ignore_ascii_case("on") => lib.set_auto_commit(true),
        [flag] if flag.eq_ignore_ascii_case("off") => lib.set_auto_commit(false),
        _ => return CommandResult::Error("Usage: .autocommit [on|off]".to_string()),
    }
    let state = if lib.auto_commit() { "on" } else { "off" };
    CommandResult::Output(format!("autocommit is {}", state))
}

fn set(ctx: &mut Context, rest: &str) -> CommandResult {
    let Some((key, value)) = rest.split_once(char::is_whitespace) else {
        return CommandResult::Error("Usage: .set KEY VALUE".to_string());
    };
    ctx.insert(key, parse_value(value.trim()));
    CommandResult::Continue
}

fn unset(ctx: &mut Context, args: &[&str]) -> CommandResult {
    match args {
        [key] => match ctx.remove(key) {
            Some(_) => CommandResult::Continue,
            None => CommandResult::Error(format!("No key '{}' in context.", key)),
        },
        _ => CommandResult::Error("Usage: .unset KEY".to_string()),
    }
}

fn table(ctx: &Context, args: &[&str]) -> CommandResult {
    let [key] = args else {
        return CommandResult::Error("Usage: .table KEY".to_string());
    };
    match ctx.get(key) {
        Some(Datum::Seq(items)) if items.is_empty() => {
            CommandResult::Output("Empty set".to_string())
        }
        Some(Datum::Seq(items)) => {
            let formatter = TableFormatter::from_sequence(items);
            let count = formatter.row_count();
            CommandResult::Output(format!(
                "{}{} row{} in set",
                formatter.render(),
                count,
                if count == 1 { "" } else { "s" }
            ))
        }
        Some(other) => CommandResult::Error(format!("Key '{}' holds a {}, not a sequence.", key, other.shape())),
        None => CommandResult::Error(format!("No key '{}' in context.", key)),
    }
}
