use std::io::{self, Write};
use std::path::PathBuf;

use colored::Colorize;

use crate::bytecode::Value;
use crate::config::Config;
use crate::error::{BnuuyError, RuntimeError};
use crate::repl_highlight::SyntaxHighlighter;
use crate::vm::Vm;

const HISTORY_FILE: &str = ".bnuuy_history";

/// What the loop should do after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplAction {
    Continue,
    Exit,
}

/// Line-at-a-time interactive interpreter.
///
/// Each line is compiled into its own chunk and run on one long-lived VM, so a
/// failed line never leaks state into the next one.
pub struct Repl {
    vm: Vm,
    history: Vec<String>,
    history_file: PathBuf,
    highlighter: SyntaxHighlighter,
    highlighting_enabled: bool,
}

impl Repl {
    pub fn new(config: Config) -> Self {
        Self::with_history_file(config, Self::get_history_path())
    }

    pub fn with_history_file(config: Config, history_file: PathBuf) -> Self {
        let mut repl = Self {
            vm: Vm::with_config(config),
            history: Vec::new(),
            history_file,
            highlighter: SyntaxHighlighter::new(),
            highlighting_enabled: true,
        };
        repl.load_history();
        repl
    }

    fn get_history_path() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            home.join(HISTORY_FILE)
        } else {
            PathBuf::from(HISTORY_FILE)
        }
    }

    fn load_history(&mut self) {
        if let Ok(content) = std::fs::read_to_string(&self.history_file) {
            for line in content.lines() {
                if !line.trim().is_empty() {
                    self.history.push(line.to_string());
                }
            }
        }
    }

    fn save_history(&self) {
        if let Some(parent) = self.history_file.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let content = self.history.join("\n");
        if let Err(e) = std::fs::write(&self.history_file, content) {
            tracing::warn!(error = %e, path = %self.history_file.display(), "could not save history");
        }
    }

    pub fn config(&self) -> &Config {
        self.vm.config()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn run(&mut self) {
        println!("Bnuuy - REPL");
        println!("Type .help for available commands.\n");

        let stdin = io::stdin();

        loop {
            print!("> ");
            let _ = io::stdout().flush();

            let mut line = String::new();
            match stdin.read_line(&mut line) {
                Ok(0) => {
                    self.save_history();
                    println!("Goodbye!");
                    break;
                }
                Ok(_) => {
                    if self.handle_line(line.trim_end()) == ReplAction::Exit {
                        self.save_history();
                        println!("Goodbye!");
                        break;
                    }
                }
                Err(e) => {
                    eprintln!("{} {}", "Error:".red().bold(), e);
                    self.save_history();
                    break;
                }
            }
        }
    }

    /// Handle one line of input: a dot command or an expression.
    pub fn handle_line(&mut self, line: &str) -> ReplAction {
        if line.trim().is_empty() {
            return ReplAction::Continue;
        }
        if line == ".exit" || line == ".quit" || line == "exit" {
            return ReplAction::Exit;
        }

        self.history.push(line.to_string());

        if line.starts_with('.') {
            self.handle_magic_command(line);
            return ReplAction::Continue;
        }

        if self.highlighting_enabled {
            println!("{}", self.highlighter.highlight(line));
        }
        match self.eval(line) {
            Ok(value) => println!("{}", value),
            Err(e) => eprintln!("{}", format_error(&e)),
        }
        ReplAction::Continue
    }

    /// Compile and run one line on the session's VM.
    pub fn eval(&mut self, source: &str) -> Result<Value, BnuuyError> {
        self.vm.interpret(source)
    }

    fn handle_magic_command(&mut self, line: &str) {
        match line {
            ".help" => self.cmd_help(),
            ".history" | ".hist" => self.cmd_history(),
            ".code" => {
                let config = self.vm.config_mut();
                config.print_code = !config.print_code;
                println!("Chunk dump {}.", on_off(config.print_code));
            }
            ".trace" => {
                let config = self.vm.config_mut();
                config.trace_execution = !config.trace_execution;
                println!("Execution trace {}.", on_off(config.trace_execution));
            }
            ".highlight" | ".highlight on" => {
                self.highlighting_enabled = true;
                println!("Syntax highlighting enabled.");
            }
            ".highlight off" => {
                self.highlighting_enabled = false;
                println!("Syntax highlighting disabled.");
            }
            _ => println!(
                "Unknown command: {}. Type .help for available commands.",
                line
            ),
        }
    }

    fn cmd_help(&self) {
        println!();
        println!("Bnuuy REPL Commands");
        println!();
        println!(".help          - Show this help message");
        println!(".history       - Show command history");
        println!(".code          - Toggle dumping each compiled chunk");
        println!(".trace         - Toggle the execution trace");
        println!(".highlight on/off - Enable/disable syntax highlighting");
        println!(".exit / Ctrl+D - Exit the REPL");
        println!();
    }

    fn cmd_history(&self) {
        println!("History:");
        for (i, entry) in self.history.iter().enumerate() {
            println!("{:4}  {}", i + 1, entry);
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// Render an error for the terminal: message in red, location dimmed.
pub fn format_error(error: &BnuuyError) -> String {
    match error {
        BnuuyError::Compile(e) => e.to_string().red().to_string(),
        BnuuyError::Runtime(RuntimeError::TypeMismatch { message, line }) => {
            format!("{}\n{}", message.red(), format!("[line {}] in script", line).dimmed())
        }
        BnuuyError::Runtime(e) => e.to_string().red().to_string(),
        BnuuyError::Io(e) => format!("{} {}", "Error:".red().bold(), e),
    }
}

pub fn run_repl(config: Config) {
    let mut repl = Repl::new(config);
    repl.run();
}
