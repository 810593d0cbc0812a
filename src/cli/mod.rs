//! # Librarian Shell
//!
//! Interactive front end for a template repository, built behind the `cli`
//! feature:
//!
//! - tag invocations with `KEY=VALUE` context assignments
//! - dot commands for transactions, context editing and inspection
//! - ASCII tables for fetched sequences
//! - TOML settings for the database, template directory and options
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CLI Entry Point                        │
//! │                   (bin/librarian.rs, clap)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │                         REPL Loop                           │
//! │  - Reads input via rustyline                                │
//! │  - Dispatches to command handler or tag execution           │
//! │  - Keeps one context across lines                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │   Commands        │  Table Formatter  │ History │ Settings  │
//! │  (.toc, .set,     │  ASCII box        │ ~/.lib- │ TOML file │
//! │   .commit, ...)   │  drawing          │ rarian_ │           │
//! │                   │                   │ history │           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Interactive shell over ./sql and bugs.db
//! librarian --db bugs.db --templates sql
//!
//! # One-shot run, prints the resulting context as JSON
//! librarian --db bugs.db --templates sql t_insert bugid=5 title=crash
//!
//! # Compile every tag and report failures
//! librarian --templates sql --check
//! ```

pub mod commands;
pub mod history;
pub mod repl;
pub mod settings;
pub mod table;

pub use repl::Repl;
pub use settings::{Layout, Settings, ShellLibrarian};
