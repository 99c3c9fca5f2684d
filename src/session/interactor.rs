//! Request sources for interactive sessions
//!
//! The interactive session reads its requests through the [`Interactor`] trait
//! so it can run against a terminal or against a script.

use colored::*;
use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Write};
use std::sync::Mutex;

/// Banner shown before the first request is read from the user
pub const WELCOME_TEXT: &str = "Welcome! Describe the task you want completed, then press Enter:";

/// Answer to the continuation prompt that ends the session
pub const EXIT_ANSWER: &str = "N";

/// Blocking source of user requests.
pub trait Interactor: Send + Sync {
    /// Request for round 0
    fn first_request(&self) -> String;

    /// Request for a later round and whether the user is done
    fn new_request(&self) -> (String, bool);

    /// Whether to keep the finished run as experience
    fn experience_asker(&self) -> bool;
}

/// Print `text` in one of the named terminal colors
pub fn print_with_color(text: &str, color: &str) {
    let styled = match color {
        "red" => text.red(),
        "green" => text.green(),
        "yellow" => text.yellow(),
        "blue" => text.blue(),
        "magenta" => text.magenta(),
        "cyan" => text.cyan(),
        _ => text.normal(),
    };
    println!("{}", styled);
}

/// Interactor reading answers line by line, from stdin unless another reader
/// is supplied.
///
/// End of input or a failed read counts as the user being done: the
/// continuation prompt reports completion and the experience prompt declines.
pub struct TerminalInteractor<R = BufReader<io::Stdin>> {
    input: Mutex<R>,
}

impl TerminalInteractor {
    /// Interactor bound to the process's stdin
    pub fn new() -> Self {
        Self::with_reader(BufReader::new(io::stdin()))
    }
}

impl Default for TerminalInteractor {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BufRead + Send> TerminalInteractor<R> {
    /// Interactor reading from `input`
    pub fn with_reader(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }

    /// Next line without its line ending, or `None` at end of input or on a
    /// read error.
    fn read_line(&self) -> Option<String> {
        let _ = io::stdout().flush();
        let mut input = self.input.lock().unwrap_or_else(|e| e.into_inner());
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => {
                tracing::info!("input closed");
                None
            }
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                tracing::warn!("Failed to read input: {}", e);
                None
            }
        }
    }
}

impl<R: BufRead + Send> Interactor for TerminalInteractor<R> {
    fn first_request(&self) -> String {
        print_with_color(WELCOME_TEXT, "cyan");
        self.read_line().unwrap_or_default()
    }

    fn new_request(&self) -> (String, bool) {
        print_with_color(
            &format!("Please enter your new request. Enter '{}' for exit.", EXIT_ANSWER),
            "cyan",
        );
        match self.read_line() {
            Some(request) => {
                let complete = is_exit_answer(&request);
                (request, complete)
            }
            None => (String::new(), true),
        }
    }

    fn experience_asker(&self) -> bool {
        print_with_color(
            "Would you like to save the current conversation flow for future reference by the agent? [Y/N]",
            "magenta",
        );
        self.read_line()
            .is_some_and(|answer| answer.trim().eq_ignore_ascii_case("y"))
    }
}

/// Whether a continuation answer means "no more work"
pub fn is_exit_answer(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case(EXIT_ANSWER)
}

/// Interactor replaying canned answers, with call counters.
///
/// When the continuation script runs dry, `new_request` reports completion.
#[derive(Debug, Default)]
pub struct ScriptedInteractor {
    state: Mutex<ScriptState>,
}

#[derive(Debug, Default)]
struct ScriptState {
    first: Option<String>,
    continuations: VecDeque<(String, bool)>,
    save_experience: bool,
    first_calls: usize,
    new_calls: usize,
    experience_calls: usize,
}

impl ScriptedInteractor {
    /// Empty script: no first request, completes on the first continuation prompt
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer for the first-request prompt
    pub fn with_first_request(self, request: impl Into<String>) -> Self {
        self.update(|s| s.first = Some(request.into()));
        self
    }

    /// Queue an answer for the continuation prompt
    pub fn then(self, request: impl Into<String>, complete: bool) -> Self {
        self.update(|s| s.continuations.push_back((request.into(), complete)));
        self
    }

    /// Answer for the experience prompt
    pub fn save_experience(self, save: bool) -> Self {
        self.update(|s| s.save_experience = save);
        self
    }

    /// Times the first-request prompt was shown
    pub fn first_request_calls(&self) -> usize {
        self.read(|s| s.first_calls)
    }

    /// Times the continuation prompt was shown
    pub fn new_request_calls(&self) -> usize {
        self.read(|s| s.new_calls)
    }

    /// Times the experience prompt was shown
    pub fn experience_calls(&self) -> usize {
        self.read(|s| s.experience_calls)
    }

    fn update(&self, f: impl FnOnce(&mut ScriptState)) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state);
    }

    fn read<T>(&self, f: impl FnOnce(&ScriptState) -> T) -> T {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&state)
    }
}

impl Interactor for ScriptedInteractor {
    fn first_request(&self) -> String {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.first_calls += 1;
        state.first.clone().unwrap_or_default()
    }

    fn new_request(&self) -> (String, bool) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.new_calls += 1;
        state
            .continuations
            .pop_front()
            .unwrap_or_else(|| (EXIT_ANSWER.to_string(), true))
    }

    fn experience_asker(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.experience_calls += 1;
        state.save_experience
    }
}
