// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interactive prompt over a loaded package.

use crate::call;
use owo_colors::OwoColorize;
use rpglib_bundle::value::format_number;
use rpglib_bundle::{Bundle, ExposureKind, Package, Value};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Config, Editor, Helper};
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

/// REPL configuration constants
const HISTORY_FILE: &str = ".rpglib_history";
const MAX_HISTORY_SIZE: usize = 1000;

/// A bundle loaded into a host, as the prompt sees it
pub struct Session {
    /// The bundle that was loaded
    pub bundle: Bundle,
    /// Where the adapter exposed it
    pub exposure: ExposureKind,
    /// The loaded package, unless a loader instantiated it on our behalf
    pub package: Option<Arc<Package>>,
    /// Main exports
    pub exports: Value,
}

impl Session {
    /// Exported names, sorted
    pub fn export_names(&self) -> Vec<String> {
        self.exports
            .as_object()
            .map(|obj| obj.keys())
            .unwrap_or_default()
    }
}

/// REPL commands that can be executed with a dot prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Exit,
    Clear,
    Version,
    Modules,
    Load,
}

impl ReplCommand {
    /// Parse a REPL command from input string
    pub fn parse(input: &str) -> Option<(Self, Option<&str>)> {
        let input = input.trim();
        let rest = input.strip_prefix('.')?;

        let parts: Vec<&str> = rest.splitn(2, char::is_whitespace).collect();
        let cmd = parts.first()?.to_lowercase();
        let arg = parts.get(1).copied();

        match cmd.as_str() {
            "help" | "h" | "?" => Some((ReplCommand::Help, arg)),
            "exit" | "quit" | "q" => Some((ReplCommand::Exit, arg)),
            "clear" | "cls" => Some((ReplCommand::Clear, arg)),
            "version" | "v" => Some((ReplCommand::Version, arg)),
            "modules" | "m" => Some((ReplCommand::Modules, arg)),
            "load" | "l" => Some((ReplCommand::Load, arg)),
            _ => None,
        }
    }

    /// Get all available commands for help/completion
    pub fn all_commands() -> &'static [(&'static str, &'static str)] {
        &[
            (".help", "Show this help message"),
            (".exit", "Exit the REPL"),
            (".clear", "Clear the screen"),
            (".version", "Show version information"),
            (".modules", "List the bundle's modules"),
            (".load <file>", "Evaluate each line of a file"),
        ]
    }
}

/// Completion, hints and highlighting for exported names
#[derive(Default)]
struct RpglibHelper {
    names: Vec<String>,
}

impl RpglibHelper {
    fn new(session: &Session) -> Self {
        let global = session.bundle.global_name();
        let exports = session.export_names();

        let mut names: Vec<String> = exports.clone();
        names.push(global.to_string());
        names.extend(exports.iter().map(|name| format!("{}.{}", global, name)));
        names.extend(
            ReplCommand::all_commands()
                .iter()
                .filter_map(|(cmd, _)| cmd.split_whitespace().next())
                .map(String::from),
        );

        Self { names }
    }

    fn is_name(&self, word: &str) -> bool {
        self.names.iter().any(|name| name == word)
    }
}

/// Start of the word ending at `pos`
fn word_start(line: &str, pos: usize) -> usize {
    line[..pos]
        .rfind(|c: char| !c.is_alphanumeric() && c != '_' && c != '$' && c != '.')
        .map(|i| i + 1)
        .unwrap_or(0)
}

impl Completer for RpglibHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = word_start(line, pos);
        let word = &line[start..pos];
        if word.is_empty() {
            return Ok((pos, vec![]));
        }

        let matches: Vec<Pair> = self
            .names
            .iter()
            .filter(|name| name.starts_with(word))
            .map(|name| Pair {
                display: name.clone(),
                replacement: name[word.len()..].to_string(),
            })
            .collect();

        Ok((pos, matches))
    }
}

impl Hinter for RpglibHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if pos < line.len() {
            return None;
        }

        let word = &line[word_start(line, pos)..];
        if word.len() < 2 {
            return None;
        }

        self.names
            .iter()
            .find(|name| name.starts_with(word) && name.len() > word.len())
            .map(|name| name[word.len()..].to_string().dimmed().to_string())
    }
}

impl Highlighter for RpglibHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let mut result = String::with_capacity(line.len() * 2);
        let mut current_word = String::new();
        let mut in_string = None;

        for c in line.chars() {
            if let Some(quote) = in_string {
                current_word.push(c);
                if c == quote {
                    result.push_str(&current_word.green().to_string());
                    current_word.clear();
                    in_string = None;
                }
                continue;
            }

            if c.is_alphanumeric() || matches!(c, '_' | '$' | '.' | '-' | '+') {
                current_word.push(c);
                continue;
            }

            if !current_word.is_empty() {
                result.push_str(&self.highlight_word(&current_word));
                current_word.clear();
            }
            match c {
                '"' | '\'' => {
                    current_word.push(c);
                    in_string = Some(c);
                }
                '(' | ')' => result.push_str(&c.to_string().yellow().to_string()),
                _ => result.push(c),
            }
        }

        if in_string.is_some() {
            result.push_str(&current_word.green().to_string());
        } else if !current_word.is_empty() {
            result.push_str(&self.highlight_word(&current_word));
        }

        Cow::Owned(result)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl RpglibHelper {
    fn highlight_word(&self, word: &str) -> String {
        const LITERALS: &[&str] = &["true", "false", "null", "undefined", "NaN", "Infinity"];

        if word.starts_with('.') {
            word.magenta().to_string()
        } else if self.is_name(word) {
            word.cyan().to_string()
        } else if LITERALS.contains(&word) {
            word.blue().to_string()
        } else if word.parse::<f64>().is_ok() {
            word.yellow().to_string()
        } else {
            word.to_string()
        }
    }
}

impl Validator for RpglibHelper {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();

        if !is_balanced(input) {
            return Ok(ValidationResult::Incomplete);
        }

        let trimmed = input.trim();
        if trimmed.ends_with(',') || trimmed.ends_with('(') {
            return Ok(ValidationResult::Incomplete);
        }

        Ok(ValidationResult::Valid(None))
    }
}

/// Check if parentheses and quotes are balanced
fn is_balanced(input: &str) -> bool {
    let mut depth = 0usize;
    let mut in_string = None;
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if c == '\\' && in_string.is_some() {
            escape_next = true;
            continue;
        }

        match in_string {
            Some(quote) if c == quote => in_string = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => in_string = Some(c),
                '(' => depth += 1,
                ')' => {
                    if depth == 0 {
                        return true; // Stray ')' is reported by the parser
                    }
                    depth -= 1;
                }
                _ => {}
            },
        }
    }

    depth == 0 && in_string.is_none()
}

impl Helper for RpglibHelper {}

/// The interactive prompt
pub struct Repl {
    session: Session,
    editor: Editor<RpglibHelper, DefaultHistory>,
    history_path: PathBuf,
}

impl Repl {
    /// Create a new REPL over `session`
    pub fn new(session: Session) -> rustyline::Result<Self> {
        let config = Config::builder()
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .max_history_size(MAX_HISTORY_SIZE)?
            .auto_add_history(true)
            .build();

        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(RpglibHelper::new(&session)));

        // Determine history file path
        let history_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rpglib")
            .join(HISTORY_FILE);

        if let Some(parent) = history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        // Missing history is fine on first run
        let _ = editor.load_history(&history_path);

        Ok(Self {
            session,
            editor,
            history_path,
        })
    }

    /// Run the REPL main loop
    pub fn run(&mut self) -> rustyline::Result<()> {
        self.print_banner();

        loop {
            let prompt = self.format_prompt();

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();

                    if trimmed.is_empty() {
                        continue;
                    }

                    if let Some((cmd, arg)) = ReplCommand::parse(trimmed) {
                        match self.execute_command(cmd, arg) {
                            CommandResult::Continue => continue,
                            CommandResult::Exit => break,
                        }
                    }

                    self.eval_and_print(trimmed);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".dimmed());
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "^D".dimmed());
                    break;
                }
                Err(err) => {
                    eprintln!("{}: {:?}", "Error".red().bold(), err);
                    break;
                }
            }
        }

        let _ = self.editor.save_history(&self.history_path);

        println!();
        Ok(())
    }

    fn print_banner(&self) {
        let bundle = &self.session.bundle;
        println!();
        println!(
            "  {} {} {}",
            bundle.name().white().bold(),
            "v".dimmed(),
            bundle.version().bright_yellow()
        );
        println!(
            "  {} {}",
            "exposed via".dimmed(),
            describe_exposure(self.session.exposure, bundle.global_name()).cyan()
        );
        println!(
            "  {} {}",
            "exports".dimmed(),
            self.session.export_names().join(", ")
        );
        println!();
        println!(
            "  {} {} {}",
            "Type".dimmed(),
            ".help".cyan(),
            "for available commands".dimmed()
        );
        println!();
    }

    fn format_prompt(&self) -> String {
        format!(
            "{} ",
            format!("{}>", self.session.bundle.name().to_lowercase())
                .bright_green()
                .bold()
        )
    }

    fn execute_command(&mut self, cmd: ReplCommand, arg: Option<&str>) -> CommandResult {
        match cmd {
            ReplCommand::Help => {
                self.print_help();
                CommandResult::Continue
            }
            ReplCommand::Exit => CommandResult::Exit,
            ReplCommand::Clear => {
                print!("\x1B[2J\x1B[H");
                CommandResult::Continue
            }
            ReplCommand::Version => {
                print_version(&self.session.bundle);
                CommandResult::Continue
            }
            ReplCommand::Modules => {
                print_modules(&self.session.bundle, self.session.package.as_deref());
                CommandResult::Continue
            }
            ReplCommand::Load => {
                if let Some(path) = arg {
                    self.load_file(path);
                } else {
                    eprintln!(
                        "{}: {} {}",
                        "Error".red().bold(),
                        ".load".cyan(),
                        "requires a file path".dimmed()
                    );
                }
                CommandResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "REPL Commands:".white().bold());
        println!();

        for (cmd, desc) in ReplCommand::all_commands() {
            println!("  {:16} {}", cmd.cyan(), desc.dimmed());
        }

        println!();
        println!("{}", "Expressions:".white().bold());
        println!();
        println!("  {:16} {}", "div(10, 2)".cyan(), "Call an export".dimmed());
        println!("  {:16} {}", "join a b c".cyan(), "Call with bare arguments".dimmed());
        println!("  {:16} {}", "sum".cyan(), "Show an export".dimmed());
        println!();
        println!("{}", "Keyboard Shortcuts:".white().bold());
        println!();
        println!("  {:16} {}", "Ctrl+C".yellow(), "Cancel current input".dimmed());
        println!("  {:16} {}", "Ctrl+D".yellow(), "Exit REPL".dimmed());
        println!("  {:16} {}", "Tab".yellow(), "Autocomplete".dimmed());
        println!();
    }

    fn load_file(&mut self, path: &str) {
        let path = std::path::Path::new(path.trim());

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("{}: {}: {}", "Error".red().bold(), path.display(), e);
                return;
            }
        };

        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
                continue;
            }
            println!("{} {}", ">".dimmed(), line);
            self.eval_and_print(line);
        }
    }

    fn eval_and_print(&mut self, input: &str) {
        let session = &self.session;
        match call::evaluate(&session.exports, session.bundle.global_name(), input) {
            Ok(value) => println!("{}", format_value(&value)),
            Err(e) => print_error(&e),
        }
    }
}

/// Result of executing a REPL command
enum CommandResult {
    Continue,
    Exit,
}

/// Human description of where a bundle was exposed
pub fn describe_exposure(kind: ExposureKind, global_name: &str) -> String {
    match kind {
        ExposureKind::ModuleSystem => "module.exports".to_string(),
        ExposureKind::AnonymousLoader => "define([], factory)".to_string(),
        ExposureKind::Global(scope) => format!("{}.{}", scope, global_name),
    }
}

/// Print version information
pub fn print_version(bundle: &Bundle) {
    println!();
    println!("{}: {}", "rpglib".bright_cyan().bold(), crate::VERSION.yellow());
    println!("{}: {}", bundle.name().dimmed(), bundle.version());
    println!();
}

/// Print the module table, marking instantiated modules
pub fn print_modules(bundle: &Bundle, package: Option<&Package>) {
    let loaded = package.map(Package::loaded_modules).unwrap_or_default();

    for record in bundle.table().records() {
        let id = record.id();
        let marker = if loaded.contains(id) {
            "●".green().to_string()
        } else {
            "○".dimmed().to_string()
        };
        let role = if id == bundle.main() {
            " (main)".yellow().to_string()
        } else if bundle.entries().contains(id) {
            " (entry)".dimmed().to_string()
        } else {
            String::new()
        };

        println!(
            "{} {:>4}  {}{}",
            marker,
            id.as_str().cyan(),
            record.name().unwrap_or("<anonymous>"),
            role
        );
        for (specifier, target) in record.dependencies() {
            println!("        {} {} {}", specifier.dimmed(), "->".dimmed(), target);
        }
    }
}

/// Format a value for display with syntax coloring
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".blue().dimmed().to_string(),
        Value::Null => "null".blue().to_string(),
        Value::Boolean(b) => b.to_string().yellow().to_string(),
        Value::Number(n) => format_number(*n).yellow().to_string(),
        Value::String(s) => format!("'{}'", s).green().to_string(),
        Value::Object(_) => value.to_string().cyan().to_string(),
        Value::Function(func) => format!("[Function: {}]", func.name).magenta().to_string(),
    }
}

/// Print a formatted error message
pub fn print_error(error: &anyhow::Error) {
    let error_str = error.to_string();

    // Split error type from message
    if let Some(colon_pos) = error_str.find(':') {
        let (error_type, message) = error_str.split_at(colon_pos);
        eprintln!("{}{}", error_type.red().bold(), message);
    } else {
        eprintln!("{}", error_str.red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repl_command_parse() {
        assert!(matches!(
            ReplCommand::parse(".help"),
            Some((ReplCommand::Help, None))
        ));
        assert!(matches!(
            ReplCommand::parse(".modules"),
            Some((ReplCommand::Modules, None))
        ));
        assert!(matches!(
            ReplCommand::parse(".load calls.txt"),
            Some((ReplCommand::Load, Some("calls.txt")))
        ));
        assert!(ReplCommand::parse("div(1, 2)").is_none());
        assert!(ReplCommand::parse(".nope").is_none());
    }

    #[test]
    fn test_is_balanced() {
        assert!(is_balanced("div(1, 2)"));
        assert!(is_balanced("join('(')"));
        assert!(!is_balanced("div(1, 2"));
        assert!(!is_balanced("join(\"a"));
    }

    #[test]
    fn test_describe_exposure() {
        use rpglib_bundle::GlobalScope;
        assert_eq!(
            describe_exposure(ExposureKind::Global(GlobalScope::Window), "RPGLib"),
            "window.RPGLib"
        );
        assert_eq!(describe_exposure(ExposureKind::ModuleSystem, "RPGLib"), "module.exports");
    }
}
