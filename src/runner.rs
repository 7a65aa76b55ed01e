use log::{debug, warn};
use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};

const STREAM_BUFFER_SIZE: usize = 4096;

/// Executes one shell command to completion and returns everything the
/// command printed on stdout. The engine classifies that text; exit codes
/// alone cannot distinguish the remediable conditions.
pub trait CommandRunner {
    fn run(&mut self, command: &str) -> String;
}

/// Production runner: spawns the command through `sh -c`, echoes stdout to
/// the terminal line by line while capturing it, then reaps the child.
/// Command strings fold stderr into stdout with `2>&1` where the engine
/// needs it captured; otherwise stderr passes straight through.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ShellRunner {
    fn run(&mut self, command: &str) -> String {
        debug!("running: {}", command);

        let mut child = match Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdout(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!("failed to spawn '{}': {}", command, e);
                return String::new();
            }
        };

        let mut captured = String::new();
        if let Some(stdout) = child.stdout.take() {
            let mut reader = BufReader::with_capacity(STREAM_BUFFER_SIZE, stdout);
            let mut line = Vec::new();
            loop {
                line.clear();
                match reader.read_until(b'\n', &mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        let chunk = String::from_utf8_lossy(&line);
                        print!("{}", chunk);
                        let _ = std::io::stdout().flush();
                        captured.push_str(&chunk);
                    }
                    Err(e) => {
                        warn!("error reading output of '{}': {}", command, e);
                        break;
                    }
                }
            }
        }

        match child.wait() {
            Ok(status) => {
                if status.code() == Some(2) {
                    eprintln!("pacman error: package not found or similar.");
                } else if !status.success() {
                    debug!("'{}' exited with {}", command, status);
                }
            }
            Err(e) => warn!("failed to wait for '{}': {}", command, e),
        }

        captured
    }
}
