//! Subprocess execution that reports failures as values instead of errors

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::thread;
use tracing::{error, info, warn};

/// A program invocation: program name plus arguments, no shell involved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<Arg>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Arg {
    value: String,
    /// Rendering used in logs when the value carries a secret
    redacted: Option<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(Arg {
            value: value.into(),
            redacted: None,
        });
        self
    }

    pub fn args<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            self = self.arg(value);
        }
        self
    }

    /// Append `<prefix><secret>`; logs show `<prefix>***`
    pub fn secret_arg(mut self, prefix: &str, secret: &str) -> Self {
        self.args.push(Arg {
            value: format!("{}{}", prefix, secret),
            redacted: Some(format!("{}***", prefix)),
        });
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Argument values as passed to the process (secrets included)
    pub fn arg_values(&self) -> Vec<&str> {
        self.args.iter().map(|a| a.value.as_str()).collect()
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args.iter().map(|a| &a.value));
        cmd
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            let shown = arg.redacted.as_deref().unwrap_or(&arg.value);
            if shown.is_empty() || shown.contains(char::is_whitespace) {
                write!(f, " \"{}\"", shown)?;
            } else {
                write!(f, " {}", shown)?;
            }
        }
        Ok(())
    }
}

/// How a process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitInfo {
    Code(i32),
    /// Terminated without an exit code (killed by a signal)
    Signal,
    /// The process could not be started at all
    SpawnFailed(String),
}

impl fmt::Display for ExitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitInfo::Code(code) => write!(f, "exit code {}", code),
            ExitInfo::Signal => write!(f, "terminated by signal"),
            ExitInfo::SpawnFailed(reason) => write!(f, "failed to start: {}", reason),
        }
    }
}

impl From<ExitStatus> for ExitInfo {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => ExitInfo::Code(code),
            None => ExitInfo::Signal,
        }
    }
}

/// Captured outcome of one command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub succeeded: bool,
    pub exit: ExitInfo,
}

impl CommandResult {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            succeeded: true,
            exit: ExitInfo::Code(0),
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            succeeded: false,
            exit: ExitInfo::Code(exit_code),
        }
    }

    pub fn spawn_failed(reason: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            succeeded: false,
            exit: ExitInfo::SpawnFailed(reason.into()),
        }
    }

    fn from_output(output: &Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            succeeded: output.status.success(),
            exit: output.status.into(),
        }
    }
}

/// Run a command to completion, capturing stdout and stderr
pub fn run(command: &CommandLine) -> CommandResult {
    info!("Running: {}", command);

    let result = match command
        .to_command()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
    {
        Ok(output) => CommandResult::from_output(&output),
        Err(e) => CommandResult::spawn_failed(e.to_string()),
    };

    log_outcome(&command.to_string(), &result);
    result
}

/// Run `producer | filter > output`, failing if either side fails
pub fn run_piped(producer: &CommandLine, filter: &CommandLine, output: &Path) -> CommandResult {
    let shown = format!("{} | {} > \"{}\"", producer, filter, output.display());
    info!("Running: {}", shown);

    let result = pipe_into_file(producer, filter, output);
    log_outcome(&shown, &result);
    result
}

fn pipe_into_file(producer: &CommandLine, filter: &CommandLine, output: &Path) -> CommandResult {
    let file = match File::create(output) {
        Ok(file) => file,
        Err(e) => {
            return CommandResult::spawn_failed(format!(
                "cannot create {}: {}",
                output.display(),
                e
            ))
        }
    };

    let mut upstream = match producer
        .to_command()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            return CommandResult::spawn_failed(format!("{}: {}", producer.program(), e))
        }
    };

    let upstream_stdout = match upstream.stdout.take() {
        Some(stdout) => stdout,
        None => {
            reap(&mut upstream);
            return CommandResult::spawn_failed(format!(
                "{}: stdout not captured",
                producer.program()
            ));
        }
    };

    // Drained on its own thread so a chatty producer cannot fill the pipe and stall
    let upstream_stderr = upstream.stderr.take().map(|mut stderr| {
        thread::spawn(move || {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf);
            buf
        })
    });

    let downstream = filter
        .to_command()
        .stdin(Stdio::from(upstream_stdout))
        .stdout(Stdio::from(file))
        .stderr(Stdio::piped())
        .spawn();

    let downstream = match downstream {
        Ok(child) => child,
        Err(e) => {
            reap(&mut upstream);
            return CommandResult::spawn_failed(format!("{}: {}", filter.program(), e));
        }
    };

    let downstream_output = downstream.wait_with_output();
    let upstream_status = upstream.wait();
    let upstream_stderr = upstream_stderr
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    let mut stderr = upstream_stderr;
    let (downstream_exit, downstream_ok) = match downstream_output {
        Ok(out) => {
            stderr.push_str(&String::from_utf8_lossy(&out.stderr));
            (ExitInfo::from(out.status), out.status.success())
        }
        Err(e) => (ExitInfo::SpawnFailed(e.to_string()), false),
    };
    let (upstream_exit, upstream_ok) = match upstream_status {
        Ok(status) => (ExitInfo::from(status), status.success()),
        Err(e) => (ExitInfo::SpawnFailed(e.to_string()), false),
    };

    // The producer's failure is the one worth reporting
    let exit = if !upstream_ok {
        upstream_exit
    } else {
        downstream_exit
    };

    CommandResult {
        stdout: String::new(),
        stderr,
        succeeded: upstream_ok && downstream_ok,
        exit,
    }
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn log_outcome(shown: &str, result: &CommandResult) {
    let stdout = result.stdout.trim();
    let stderr = result.stderr.trim();

    if !stdout.is_empty() {
        info!("Stdout: {}", stdout);
    }

    if result.succeeded {
        if !stderr.is_empty() {
            warn!("Stderr: {}", stderr);
        }
        return;
    }

    error!("Command failed: {}", shown);
    error!("Exit: {}", result.exit);
    if !stderr.is_empty() {
        error!("Stderr: {}", stderr);
    }
}
