//! Command execution abstraction for testability
//!
//! The pipeline talks to external tools only through [`CommandExecutor`],
//! so tests can substitute scripted results for real subprocesses.

use super::command::{self, CommandLine, CommandResult};
use std::path::Path;

/// Abstraction for command execution, enabling mocking in tests
pub trait CommandExecutor: Send + Sync {
    /// Run a single command and capture its output
    fn run(&self, command: &CommandLine) -> CommandResult;

    /// Run `producer | filter > output`
    fn run_piped(
        &self,
        producer: &CommandLine,
        filter: &CommandLine,
        output: &Path,
    ) -> CommandResult;
}

/// Default implementation using real subprocess calls
#[derive(Debug, Clone, Default)]
pub struct RealExecutor;

impl RealExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for RealExecutor {
    fn run(&self, command: &CommandLine) -> CommandResult {
        command::run(command)
    }

    fn run_piped(
        &self,
        producer: &CommandLine,
        filter: &CommandLine,
        output: &Path,
    ) -> CommandResult {
        command::run_piped(producer, filter, output)
    }
}

/// A mock executor for testing that records calls and returns configured responses
/// Available for use in external test crates
pub mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Recorded command invocation
    #[derive(Clone, Debug)]
    pub struct CommandCall {
        pub program: String,
        pub args: Vec<String>,
        /// Filter program and redirect target for piped invocations
        pub piped_into: Option<(String, PathBuf)>,
    }

    impl CommandCall {
        /// `program` or `program subcommand`, the keys responses are registered under
        pub fn matches(&self, key: &str) -> bool {
            key == self.program || key == subcommand_key(&self.program, &self.args)
        }
    }

    /// Response configuration for mock
    #[derive(Clone, Debug)]
    pub enum MockResponse {
        Success { stdout: String },
        Failure { stderr: String, exit_code: i32 },
    }

    impl MockResponse {
        pub fn ok() -> Self {
            MockResponse::Success {
                stdout: String::new(),
            }
        }

        pub fn stdout(stdout: &str) -> Self {
            MockResponse::Success {
                stdout: stdout.to_string(),
            }
        }

        pub fn fail(exit_code: i32, stderr: &str) -> Self {
            MockResponse::Failure {
                stderr: stderr.to_string(),
                exit_code,
            }
        }

        fn to_result(&self) -> CommandResult {
            match self {
                MockResponse::Success { stdout } => CommandResult::success(stdout.clone()),
                MockResponse::Failure { stderr, exit_code } => {
                    CommandResult::failure(*exit_code, stderr.clone())
                }
            }
        }
    }

    impl Default for MockResponse {
        fn default() -> Self {
            MockResponse::ok()
        }
    }

    /// Mock executor for testing
    #[derive(Clone)]
    pub struct MockExecutor {
        /// Recorded command invocations
        pub calls: Arc<Mutex<Vec<CommandCall>>>,
        /// Queued responses per key; the last one repeats once the queue drains
        responses: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
        /// Default response when no specific response is configured
        default_response: Arc<Mutex<MockResponse>>,
        /// Whether piped invocations create their redirect target, like a shell would
        write_outputs: bool,
    }

    impl Default for MockExecutor {
        fn default() -> Self {
            Self {
                calls: Arc::default(),
                responses: Arc::default(),
                default_response: Arc::default(),
                write_outputs: true,
            }
        }
    }

    impl MockExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a response for `program` or `program subcommand`
        pub fn expect(self, key: &str, response: MockResponse) -> Self {
            self.responses
                .lock()
                .unwrap()
                .entry(key.to_string())
                .or_default()
                .push_back(response);
            self
        }

        /// Set the default response for unconfigured programs
        pub fn with_default_response(self, response: MockResponse) -> Self {
            *self.default_response.lock().unwrap() = response;
            self
        }

        /// Piped invocations leave no output file behind
        pub fn without_output_files(mut self) -> Self {
            self.write_outputs = false;
            self
        }

        /// Get all recorded calls
        pub fn get_calls(&self) -> Vec<CommandCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Calls matching `program` or `program subcommand`
        pub fn calls_to(&self, key: &str) -> Vec<CommandCall> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.matches(key))
                .cloned()
                .collect()
        }

        pub fn was_called(&self, key: &str) -> bool {
            self.call_count(key) > 0
        }

        pub fn call_count(&self, key: &str) -> usize {
            self.calls_to(key).len()
        }

        fn record_call(&self, command: &CommandLine, piped_into: Option<(String, PathBuf)>) {
            self.calls.lock().unwrap().push(CommandCall {
                program: command.program().to_string(),
                args: command.arg_values().iter().map(|s| s.to_string()).collect(),
                piped_into,
            });
        }

        fn next_response(&self, command: &CommandLine) -> CommandResult {
            let args: Vec<String> = command.arg_values().iter().map(|s| s.to_string()).collect();
            let specific = subcommand_key(command.program(), &args);

            let mut responses = self.responses.lock().unwrap();
            for key in [specific.as_str(), command.program()] {
                if let Some(queue) = responses.get_mut(key) {
                    let response = if queue.len() > 1 {
                        queue.pop_front()
                    } else {
                        queue.front().cloned()
                    };
                    if let Some(response) = response {
                        return response.to_result();
                    }
                }
            }

            self.default_response.lock().unwrap().to_result()
        }
    }

    fn subcommand_key(program: &str, args: &[String]) -> String {
        match args.first() {
            Some(first) => format!("{} {}", program, first),
            None => program.to_string(),
        }
    }

    impl CommandExecutor for MockExecutor {
        fn run(&self, command: &CommandLine) -> CommandResult {
            self.record_call(command, None);
            self.next_response(command)
        }

        fn run_piped(
            &self,
            producer: &CommandLine,
            filter: &CommandLine,
            output: &Path,
        ) -> CommandResult {
            self.record_call(
                producer,
                Some((filter.program().to_string(), output.to_path_buf())),
            );
            if self.write_outputs {
                let _ = std::fs::write(output, b"-- mock dump\n");
            }
            self.next_response(producer)
        }
    }
}
