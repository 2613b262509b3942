//! Shared test utilities for the installer crate.
//!
//! Available to unit tests and, through the `test-support` feature, to the
//! integration tests under `tests/`.

use crate::confirm::Prompter;
use crate::dirs::BaseDirs;
use crate::download::{DownloadError, Downloader};
use crate::error::{InstallerError, Result};
use crate::exec::{CommandExecutor, render_command};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};

/// Argument placeholder that matches any single argument.
pub const ANY_ARG: &str = "<any>";

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
pub fn success_output() -> Output {
    output_with_stdout("")
}

/// Creates a successful command `Output` with the given stdout.
pub fn output_with_stdout(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Filesystem change applied when a stubbed command runs.
#[derive(Debug, Clone)]
enum SideEffect {
    File(PathBuf),
    Dir(PathBuf),
}

impl SideEffect {
    fn apply(&self) -> std::io::Result<()> {
        match self {
            Self::File(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, b"#!/bin/sh\n")
            }
            Self::Dir(path) => std::fs::create_dir_all(path),
        }
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    cmd: String,
    args: Vec<String>,
    result: Result<Output>,
    effects: Vec<SideEffect>,
}

impl ExpectedCall {
    /// Expects `cmd args...` and answers with a successful, silent exit.
    pub fn new(cmd: &str, args: &[&str]) -> Self {
        Self {
            cmd: cmd.to_owned(),
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
            result: Ok(success_output()),
            effects: Vec::new(),
        }
    }

    /// Answers with a successful exit printing `stdout`.
    #[must_use]
    pub fn stdout(mut self, stdout: &str) -> Self {
        self.result = Ok(output_with_stdout(stdout));
        self
    }

    /// Answers with exit code 1 and `stderr`.
    #[must_use]
    pub fn fails(mut self, stderr: &str) -> Self {
        self.result = Ok(failure_output(stderr));
        self
    }

    /// Answers as if the program does not exist.
    #[must_use]
    pub fn not_found(mut self) -> Self {
        self.result = Err(std::io::Error::from(std::io::ErrorKind::NotFound).into());
        self
    }

    /// Creates a file at `path` when the call runs successfully.
    #[must_use]
    pub fn creates_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.effects.push(SideEffect::File(path.into()));
        self
    }

    /// Creates a directory at `path` when the call runs successfully.
    #[must_use]
    pub fn creates_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.effects.push(SideEffect::Dir(path.into()));
        self
    }

    fn matches(&self, cmd: &str, args: &[&str]) -> bool {
        self.cmd == cmd
            && self.args.len() == args.len()
            && self
                .args
                .iter()
                .zip(args)
                .all(|(expected, actual)| expected == ANY_ARG || expected == actual)
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Expected calls are consumed in order; a call that does not match the
/// next expectation yields [`InstallerError::StubMismatch`].
#[derive(Debug, Default)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
    binaries: HashMap<String, PathBuf>,
    invocations: RefCell<Vec<String>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            ..Self::default()
        }
    }

    /// Makes `which(name)` resolve to `path`.
    #[must_use]
    pub fn with_binary(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.binaries.insert(name.to_owned(), path.into());
        self
    }

    /// Every command line run so far.
    pub fn invocations(&self) -> Vec<String> {
        self.invocations.borrow().clone()
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        let remaining: Vec<String> = self
            .expected
            .borrow()
            .iter()
            .map(|call| render_command(&call.cmd, &call.args))
            .collect();
        assert!(
            remaining.is_empty(),
            "expected further command invocations: {remaining:?}"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        let rendered = std::iter::once(cmd)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.invocations.borrow_mut().push(rendered.clone());

        let call = self
            .expected
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| InstallerError::StubMismatch {
                message: format!("unexpected command: {rendered}"),
            })?;
        if !call.matches(cmd, args) {
            return Err(InstallerError::StubMismatch {
                message: format!(
                    "expected `{}`, got `{rendered}`",
                    render_command(&call.cmd, &call.args)
                ),
            });
        }
        if matches!(&call.result, Ok(output) if output.status.success()) {
            for effect in &call.effects {
                effect.apply()?;
            }
        }
        call.result
    }

    fn which(&self, binary: &str) -> Option<PathBuf> {
        self.binaries.get(binary).cloned()
    }
}

/// Serves canned downloads from memory.
#[derive(Debug, Default)]
pub struct StubDownloader {
    bodies: HashMap<String, Vec<u8>>,
    requests: RefCell<Vec<String>>,
}

impl StubDownloader {
    /// Creates a downloader with no resources; every fetch is a 404.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` for `url`.
    #[must_use]
    pub fn with_body(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_owned(), body.into());
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    fn body(&self, url: &str) -> std::result::Result<&[u8], DownloadError> {
        self.requests.borrow_mut().push(url.to_owned());
        self.bodies
            .get(url)
            .map(Vec::as_slice)
            .ok_or_else(|| DownloadError::NotFound {
                url: url.to_owned(),
            })
    }
}

impl Downloader for StubDownloader {
    fn fetch_text(&self, url: &str) -> std::result::Result<String, DownloadError> {
        let body = self.body(url)?;
        Ok(String::from_utf8_lossy(body).into_owned())
    }

    fn fetch_to_file(&self, url: &str, dest: &Path) -> std::result::Result<(), DownloadError> {
        let body = self.body(url)?;
        std::fs::write(dest, body)?;
        Ok(())
    }
}

/// Answers prompts from a fixed script.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    interactive: bool,
    answers: RefCell<VecDeque<String>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    /// A prompter whose stdin is not a terminal.
    pub fn piped() -> Self {
        Self::default()
    }

    /// A terminal prompter that replies with `answers` in order; running out
    /// of answers reads as end-of-file.
    pub fn interactive(answers: &[&str]) -> Self {
        Self {
            interactive: true,
            answers: RefCell::new(answers.iter().map(|a| (*a).to_owned()).collect()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// Prompts shown so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn ask(&self, prompt: &str) -> std::io::Result<String> {
        self.prompts.borrow_mut().push(prompt.to_owned());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::UnexpectedEof))
    }
}

/// [`BaseDirs`] rooted in a scratch directory.
///
/// Layout under `root`: `home/`, `data/`, `usr-local-bin/` (created) and
/// `home/.local/bin/` (created on demand by the installer).
#[derive(Debug, Clone)]
pub struct StubDirs {
    root: PathBuf,
}

impl StubDirs {
    /// Creates the layout under `root`.
    ///
    /// # Panics
    ///
    /// Panics if the scratch directories cannot be created.
    #[allow(clippy::expect_used, reason = "scratch setup failure aborts the test")]
    pub fn new(root: &Path) -> Self {
        let dirs = Self {
            root: root.to_path_buf(),
        };
        for dir in [dirs.home(), dirs.data(), dirs.system_bin()] {
            std::fs::create_dir_all(&dir).expect("create stub directory");
        }
        dirs
    }

    /// Removes the system bin directory so it is no longer writable.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be removed.
    #[must_use]
    #[allow(clippy::expect_used, reason = "scratch setup failure aborts the test")]
    pub fn without_system_bin_on_disk(self) -> Self {
        std::fs::remove_dir_all(self.system_bin()).expect("remove stub system bin");
        self
    }

    /// Stub home directory.
    pub fn home(&self) -> PathBuf {
        self.root.join("home")
    }

    /// Stub data directory.
    pub fn data(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Stub system bin directory.
    pub fn system_bin(&self) -> PathBuf {
        self.root.join("usr-local-bin")
    }

    /// Stub user bin directory.
    pub fn user_bin(&self) -> PathBuf {
        self.home().join(".local").join("bin")
    }
}

impl BaseDirs for StubDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        Some(self.home())
    }

    fn data_dir(&self) -> Option<PathBuf> {
        Some(self.data())
    }

    fn system_bin_dir(&self) -> Option<PathBuf> {
        Some(self.system_bin())
    }

    fn user_bin_dir(&self) -> Option<PathBuf> {
        Some(self.user_bin())
    }
}
