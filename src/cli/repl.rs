//! # REPL - Read-Eval-Print Loop
//!
//! The interactive loop of the `librarian` shell. Each line is either a dot
//! command or a tag invocation:
//!
//! ```text
//! librarian> .set title crash
//! librarian> t_insert bugid=5
//! Query OK, 1 row affected (0.002 sec)
//! librarian> bugs_by_title
//! Query OK, 0 rows affected (0.001 sec)
//! librarian> .table bug
//! ```
//!
//! ## Execution Flow
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       Read Line                          │
//! └──────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Starts with '.'?                       │
//! └──────────────────────────────────────────────────────────┘
//!            │ Yes                            │ No
//!            ▼                                ▼
//! ┌──────────────────┐         ┌──────────────────────────────┐
//! │ Execute Command  │         │ Apply KEY=VALUE to context,  │
//! └──────────────────┘         │ execute TAG                  │
//!            │                 └──────────────────────────────┘
//!            ▼                                │
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Print Result                        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The context persists across lines, so values fetched by one tag feed the
//! binds of the next. Errors are printed and do not end the loop.

use std::time::{Duration, Instant};

use eyre::{Result, WrapErr};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::archive::Archiver;
use crate::cli::commands::{parse_assignment, CommandHandler, CommandResult};
use crate::cli::history::history_path;
use crate::driver::Connection;
use crate::librarian::Librarian;
use crate::types::Context;

const PROMPT: &str = "librarian> ";

pub struct Repl<A, C> {
    librarian: Librarian<A, C>,
    context: Context,
    editor: DefaultEditor,
}

impl<A: Archiver, C: Connection> Repl<A, C> {
    pub fn new(librarian: Librarian<A, C>) -> Result<Self> {
        let mut editor = DefaultEditor::new().wrap_err("failed to initialize line editor")?;

        if let Some(history_file) = history_path() {
            let _ = editor.load_history(&history_file);
        }

        Ok(Self {
            librarian,
            context: Context::new(),
            editor,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        self.print_welcome();

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    if !self.handle_line(&line) {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => println!("^C"),
                Err(ReadlineError::Eof) => {
                    println!("Bye");
                    break;
                }
                Err(err) => {
                    eprintln!("Error reading input: {}", err);
                    break;
                }
            }
        }

        self.save_history();
        self.librarian
            .disconnect()
            .wrap_err("failed to disconnect")?;
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return true;
        }
        self.editor.add_history_entry(trimmed).ok();

        if CommandHandler::is_command(trimmed) {
            return self.execute_command(trimmed);
        }

        if let Err(msg) = self.execute_tag(trimmed) {
            eprintln!("Error: {}", msg);
        }
        true
    }

    fn execute_command(&mut self, input: &str) -> bool {
        match CommandHandler::execute(input, &mut self.librarian, &mut self.context) {
            CommandResult::Exit => false,
            CommandResult::Output(text) => {
                println!("{}", text);
                true
            }
            CommandResult::Continue => true,
            CommandResult::Error(msg) => {
                eprintln!("Error: {}", msg);
                true
            }
        }
    }

    fn execute_tag(&mut self, line: &str) -> Result<(), String> {
        let mut words = line.split_whitespace();
        let Some(tag) = words.next() else {
            return Ok(());
        };
        for arg in words {
            let (key, value) = parse_assignment(arg)?;
            self.context.insert(key, value);
        }

        let start = Instant::now();
        let affected = self
            .librarian
            .execute(tag, &mut self.context)
            .map_err(|e| format!("[{}] {}", e.kind(), e))?;
        print_affected(affected, start.elapsed());
        Ok(())
    }

    fn print_welcome(&self) {
        println!("Librarian version {}", env!("CARGO_PKG_VERSION"));
        println!("Enter \".help\" for usage hints.");
        println!();
    }

    fn save_history(&mut self) {
        if let Some(history_file) = history_path() {
            if let Err(e) = self.editor.save_history(&history_file) {
                eprintln!("Warning: could not save history: {}", e);
            }
        }
    }
}

fn print_affected(rows: usize, elapsed: Duration) {
    println!(
        "Query OK, {} row{} affected ({:.3} sec)",
        rows,
        if rows == 1 { "" } else { "s" },
        elapsed.as_secs_f64()
    );
}
