//! Interactive shell over a single open `RecordStore`.

use clap::{Parser, Subcommand};
use prettytable::{Table, row};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use thiserror::Error;
use tracing::error;

use crate::record::{RecordError, RecordId, RecordStore, StoreStats};

const HELP: &str = r#"
Available commands:
  alloc [text]       - Allocate a record, optionally writing text into it
  get <block:slot>   - Show a record
  put <block:slot> <text>
                     - Overwrite a record (zero-padded to the slot size)
  free <block:slot>  - Release a record
  flush              - Write all resident blocks to disk
  stats              - Show slot usage and cache counters
  help               - Show this help message
  quit, exit, q      - Leave the shell

Text is split on whitespace and rejoined with single spaces.
"#;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Readline error: {0}")]
    Readline(#[from] ReadlineError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),
}

pub type ShellResult<T> = Result<T, ShellError>;

#[derive(Parser, Debug)]
#[command(
    no_binary_name = true,
    disable_help_flag = true,
    disable_version_flag = true,
    disable_help_subcommand = true
)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug, PartialEq)]
enum ShellCommand {
    Alloc {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    Get {
        id: RecordId,
    },
    Put {
        id: RecordId,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    Free { id: RecordId },
    Flush,
    Stats,
    Help,
    #[command(alias = "exit", alias = "q")]
    Quit,
}

/// Result of executing one shell line
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue(String),
    Quit,
}

pub struct Shell {
    store: RecordStore,
}

impl Shell {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Read and execute lines until `quit`, end of input, or a fatal store error
    pub fn run(&mut self) -> ShellResult<()> {
        let mut editor = DefaultEditor::new()?;
        println!("pagestore shell on {}. Type 'help' for commands.", self.store.path().display());

        loop {
            let line = match editor.readline("pagestore> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            editor.add_history_entry(line)?;

            match self.execute(line) {
                Ok(Outcome::Continue(output)) => {
                    if !output.is_empty() {
                        println!("{}", output);
                    }
                }
                Ok(Outcome::Quit) => break,
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "Stopping shell after fatal store error");
                    return Err(e.into());
                }
                Err(e) => println!("Error: {}", e),
            }
        }

        self.store.flush()?;
        Ok(())
    }

    /// Execute one line. Parse errors are reported as output, not as errors.
    pub fn execute(&mut self, line: &str) -> Result<Outcome, RecordError> {
        let command = match ShellLine::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => parsed.command,
            Err(e) => return Ok(Outcome::Continue(e.to_string().trim_end().to_string())),
        };

        let output = match command {
            ShellCommand::Alloc { text } => {
                let id = if text.is_empty() {
                    self.store.allocate()?
                } else {
                    self.store.insert(text.join(" ").as_bytes())?
                };
                format!("allocated {}", id)
            }
            ShellCommand::Get { id } => {
                let view = self.store.lookup(id)?;
                format!("{} {:?}", id, String::from_utf8_lossy(view.payload()))
            }
            ShellCommand::Put { id, text } => {
                self.store.store(id, text.join(" ").as_bytes())?;
                format!("stored {}", id)
            }
            ShellCommand::Free { id } => {
                self.store.free(id)?;
                format!("freed {}", id)
            }
            ShellCommand::Flush => {
                self.store.flush()?;
                "flushed".to_string()
            }
            ShellCommand::Stats => format_stats(&self.store.stats()),
            ShellCommand::Help => HELP.trim().to_string(),
            ShellCommand::Quit => return Ok(Outcome::Quit),
        };

        Ok(Outcome::Continue(output))
    }
}

/// Render store statistics as a two-column table
pub fn format_stats(stats: &StoreStats) -> String {
    let mut table = Table::new();
    table.set_titles(row!["metric", "value"]);
    table.add_row(row!["capacity", stats.capacity]);
    table.add_row(row!["used slots", stats.used_slots]);
    table.add_row(row!["free slots", stats.free_slots]);
    table.add_row(row!["frames", stats.cache.frames]);
    table.add_row(row!["wired frames", stats.cache.wired]);
    table.add_row(row!["cache hits", stats.cache.hits]);
    table.add_row(row!["cache misses", stats.cache.misses]);
    table.add_row(row!["evictions", stats.cache.evictions]);
    table.add_row(row!["block writes", stats.cache.flushes]);
    table.to_string().trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use tempfile::TempDir;

    fn setup_shell() -> (TempDir, Shell) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.fs");
        let config = StoreConfig {
            frame_count: 2,
            block_count: 4,
            slots_per_block: 4,
            slot_size: 16,
            ..StoreConfig::default()
        };
        let store = RecordStore::open(&path, config).unwrap();
        (temp_dir, Shell::new(store))
    }

    fn output(outcome: Outcome) -> String {
        match outcome {
            Outcome::Continue(output) => output,
            Outcome::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn test_parse_commands() {
        let line = ShellLine::try_parse_from(["put", "3:1", "hello", "world"]).unwrap();
        assert_eq!(
            line.command,
            ShellCommand::Put {
                id: RecordId::new(3, 1),
                text: vec!["hello".to_string(), "world".to_string()],
            }
        );

        let line = ShellLine::try_parse_from(["exit"]).unwrap();
        assert_eq!(line.command, ShellCommand::Quit);

        assert!(ShellLine::try_parse_from(["get", "nonsense"]).is_err());
    }

    #[test]
    fn test_alloc_get_put_free() {
        let (_temp_dir, mut shell) = setup_shell();

        let out = output(shell.execute("alloc hello there").unwrap());
        assert_eq!(out, "allocated 0:0");

        let out = output(shell.execute("get 0:0").unwrap());
        assert_eq!(out, "0:0 \"hello there\"");

        shell.execute("put 0:0 bye").unwrap();
        let out = output(shell.execute("get 0:0").unwrap());
        assert_eq!(out, "0:0 \"bye\"");

        let out = output(shell.execute("free 0:0").unwrap());
        assert_eq!(out, "freed 0:0");
        assert!(matches!(
            shell.execute("get 0:0"),
            Err(RecordError::NotAllocated(_))
        ));
    }

    #[test]
    fn test_text_with_leading_hyphen() {
        let (_temp_dir, mut shell) = setup_shell();

        let out = output(shell.execute("alloc -1 -x").unwrap());
        assert_eq!(out, "allocated 0:0");
        let out = output(shell.execute("get 0:0").unwrap());
        assert_eq!(out, "0:0 \"-1 -x\"");

        shell.execute("put 0:0 -b   spaced").unwrap();
        let out = output(shell.execute("get 0:0").unwrap());
        assert_eq!(out, "0:0 \"-b spaced\"");
    }

    #[test]
    fn test_store_errors_propagate() {
        let (_temp_dir, mut shell) = setup_shell();

        assert!(matches!(
            shell.execute("get 9:0"),
            Err(RecordError::InvalidRecordId(_))
        ));
        shell.execute("alloc").unwrap();
        assert!(matches!(
            shell.execute("put 0:0 this-text-is-longer-than-a-slot"),
            Err(RecordError::RecordTooLarge { .. })
        ));
    }

    #[test]
    fn test_unknown_command_reported_as_output() {
        let (_temp_dir, mut shell) = setup_shell();
        let out = output(shell.execute("bogus 1 2").unwrap());
        assert!(out.contains("bogus"));
    }

    #[test]
    fn test_stats_and_quit() {
        let (_temp_dir, mut shell) = setup_shell();
        shell.execute("alloc a").unwrap();
        shell.execute("alloc b").unwrap();

        let out = output(shell.execute("stats").unwrap());
        assert!(out.contains("used slots"));
        assert!(out.contains("wired frames"));
        assert_eq!(shell.store().stats().used_slots, 2);

        assert_eq!(shell.execute("flush").unwrap(), Outcome::Continue("flushed".to_string()));
        assert_eq!(shell.execute("quit").unwrap(), Outcome::Quit);
        assert_eq!(shell.execute("q").unwrap(), Outcome::Quit);
    }

    #[test]
    fn test_help() {
        let (_temp_dir, mut shell) = setup_shell();
        let out = output(shell.execute("help").unwrap());
        assert!(out.starts_with("Available commands:"));
    }
}
