//! Shell command runner.
//!
//! Commands run through `sh -c` in the project root. Output of both pipes
//! is streamed line by line (so `--verbose` can echo it live) and buffered
//! for classification.

use crate::steps::base::{StepContext, StepError, StepOutput};
use std::collections::BTreeMap;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::{Stream, StreamExt};

/// Exit code used when a command could not be started at all.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

/// One event from a running command.
#[derive(Debug)]
pub enum CommandEvent {
    Line(String),
    Exited(i32),
}

pub struct CommandRunner;

impl CommandRunner {
    /// Spawn `command` and stream its output lines, ending with its exit
    /// code.
    ///
    /// The child is killed if the stream is dropped before it exits.
    pub fn stream(
        command: String,
        working_dir: &Path,
        env: BTreeMap<String, String>,
    ) -> Pin<Box<dyn Stream<Item = Result<CommandEvent, StepError>> + Send>> {
        let working_dir = working_dir.to_path_buf();

        let stream = async_stream::stream! {
            tracing::debug!(%command, dir = %working_dir.display(), "spawning command");

            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(&command);
            cmd.current_dir(&working_dir);
            cmd.envs(&env);
            cmd.stdin(Stdio::null());
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
            cmd.kill_on_drop(true);

            let mut child = match cmd.spawn() {
                Ok(child) => child,
                Err(source) => {
                    yield Err(StepError::Spawn { command: command.clone(), source });
                    return;
                }
            };

            let Some(stdout) = child.stdout.take() else {
                yield Err(StepError::MissingPipe("stdout"));
                return;
            };
            let Some(stderr) = child.stderr.take() else {
                yield Err(StepError::MissingPipe("stderr"));
                return;
            };

            let stdout_lines = LinesStream::new(BufReader::new(stdout).lines());
            let stderr_lines = LinesStream::new(BufReader::new(stderr).lines());
            let mut lines = stdout_lines.merge(stderr_lines);

            while let Some(line) = lines.next().await {
                match line {
                    Ok(line) => yield Ok(CommandEvent::Line(line)),
                    // Non-UTF-8 output ends line reading; the exit code
                    // still decides the result.
                    Err(err) => {
                        tracing::debug!(%command, "stopped reading output: {err}");
                        break;
                    }
                }
            }

            match child.wait().await {
                // Terminated by a signal: no code.
                Ok(status) => yield Ok(CommandEvent::Exited(status.code().unwrap_or(1))),
                Err(source) => yield Err(StepError::Wait { command: command.clone(), source }),
            }
        };

        Box::pin(stream)
    }

    /// Run `command` to completion and buffer its output.
    ///
    /// Never fails: a command that cannot be spawned yields exit code 127
    /// with the error text as output.
    pub async fn run(command: &str, ctx: &StepContext) -> StepOutput {
        let mut stream = Self::stream(command.to_string(), &ctx.project_root, ctx.env_vars());
        let mut output = Vec::new();
        let mut exit_code = None;

        while let Some(event) = stream.next().await {
            match event {
                Ok(CommandEvent::Line(line)) => {
                    if ctx.verbose {
                        eprintln!("{line}");
                    }
                    output.extend_from_slice(line.as_bytes());
                    output.push(b'\n');
                }
                Ok(CommandEvent::Exited(code)) => exit_code = Some(code),
                Err(err) => {
                    tracing::warn!("{err}");
                    output.extend_from_slice(err.to_string().as_bytes());
                    output.push(b'\n');
                    exit_code = Some(SPAWN_FAILURE_EXIT_CODE);
                }
            }
        }

        StepOutput::new(exit_code.unwrap_or(SPAWN_FAILURE_EXIT_CODE), output)
    }
}
