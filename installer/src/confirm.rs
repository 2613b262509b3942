//! The confirmation gate.
//!
//! Every user-facing decision goes through [`ConfirmationGate::decide`]. The
//! precedence is fixed: an explicit `--non-interactive` flag wins, then a
//! stdin that is not a terminal (the `curl ... | sh` path), and only then an
//! interactive prompt. Unattended runs therefore never block on input.

use console::Term;
use log::debug;
use std::io::{self, BufRead, IsTerminal};

/// Why a decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    /// `--non-interactive` was given.
    ExplicitFlag,
    /// Standard input is not attached to a terminal.
    PipedInput,
    /// The operator answered the prompt affirmatively (or just pressed enter).
    UserAccepted,
    /// The operator answered with something starting with `n`.
    UserDeclined,
}

/// Outcome of a single confirmation point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallDecision {
    /// Whether to proceed.
    pub accepted: bool,
    /// Which precedence rule produced the answer.
    pub reason: DecisionReason,
}

/// Terminal access used by the gate.
#[cfg_attr(test, mockall::automock)]
pub trait Prompter {
    /// Returns true when standard input is an interactive terminal.
    fn is_interactive(&self) -> bool;

    /// Shows `prompt` and reads one line of input.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the terminal.
    fn ask(&self, prompt: &str) -> std::io::Result<String>;
}

/// Writes prompts to stderr and reads answers from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn is_interactive(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    fn ask(&self, prompt: &str) -> io::Result<String> {
        Term::stderr().write_str(&format!("{prompt} [Y/n] "))?;
        read_answer(&mut io::stdin().lock())
    }
}

/// Reads one answer from `input`, the stream `is_interactive` checked.
/// End of input is an error, so a closed stdin never counts as consent.
fn read_answer(input: &mut impl BufRead) -> io::Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

/// Single yes/no policy shared by every component.
pub struct ConfirmationGate<'a> {
    non_interactive: bool,
    prompter: &'a dyn Prompter,
}

impl<'a> ConfirmationGate<'a> {
    /// Creates a gate.
    #[must_use]
    pub fn new(non_interactive: bool, prompter: &'a dyn Prompter) -> Self {
        Self {
            non_interactive,
            prompter,
        }
    }

    /// Decides whether to proceed with the action described by `prompt`.
    ///
    /// # Examples
    ///
    /// ```
    /// use coqui_installer::confirm::{ConfirmationGate, DecisionReason, TerminalPrompter};
    ///
    /// let prompter = TerminalPrompter;
    /// let gate = ConfirmationGate::new(true, &prompter);
    /// let decision = gate.decide("Install git?");
    /// assert!(decision.accepted);
    /// assert_eq!(decision.reason, DecisionReason::ExplicitFlag);
    /// ```
    #[must_use]
    pub fn decide(&self, prompt: &str) -> InstallDecision {
        if self.non_interactive {
            return InstallDecision {
                accepted: true,
                reason: DecisionReason::ExplicitFlag,
            };
        }
        if !self.prompter.is_interactive() {
            return InstallDecision {
                accepted: true,
                reason: DecisionReason::PipedInput,
            };
        }
        let answer = match self.prompter.ask(prompt) {
            Ok(answer) => answer,
            Err(err) => {
                debug!("prompt failed, treating as decline: {err}");
                return InstallDecision {
                    accepted: false,
                    reason: DecisionReason::UserDeclined,
                };
            }
        };
        if answer_accepts(&answer) {
            InstallDecision {
                accepted: true,
                reason: DecisionReason::UserAccepted,
            }
        } else {
            InstallDecision {
                accepted: false,
                reason: DecisionReason::UserDeclined,
            }
        }
    }

    /// Shorthand for `self.decide(prompt).accepted`.
    #[must_use]
    pub fn confirm(&self, prompt: &str) -> bool {
        self.decide(prompt).accepted
    }
}

/// Returns true unless the trimmed, lower-cased answer starts with `n`.
#[must_use]
pub fn answer_accepts(answer: &str) -> bool {
    !answer.trim().to_lowercase().starts_with('n')
}
