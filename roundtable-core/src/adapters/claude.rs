use std::process::Stdio;

use async_stream::stream;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::models::EngineKind;

use super::traits::EngineAdapter;
use super::types::{AgentEvent, AgentEventStream, AgentTask};

pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Settings for the Claude Code CLI invocation.
#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    /// Binary name or path, resolved through PATH when bare.
    pub binary: String,
    pub model: String,
    /// Tools the engine may use. Kept read-only so a chat turn can never
    /// modify the member's repository.
    pub allowed_tools: Vec<String>,
    pub max_turns: u32,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            binary: "claude".to_string(),
            model: DEFAULT_CLAUDE_MODEL.to_string(),
            allowed_tools: vec![
                "Read".to_string(),
                "Glob".to_string(),
                "Grep".to_string(),
            ],
            max_turns: 50,
        }
    }
}

/// Runs a turn through the Claude Code CLI in stream-json mode and maps
/// its output lines onto [`AgentEvent`]s.
pub struct ClaudeAdapter {
    config: ClaudeConfig,
}

impl ClaudeAdapter {
    pub fn new(config: ClaudeConfig) -> Self {
        Self { config }
    }
}

impl EngineAdapter for ClaudeAdapter {
    fn engine(&self) -> EngineKind {
        EngineKind::Claude
    }

    fn run(&self, task: AgentTask) -> AgentEventStream {
        let config = self.config.clone();

        Box::pin(stream! {
            let mut command = Command::new(&config.binary);
            command
                .arg("--print")
                .arg("--output-format")
                .arg("stream-json")
                .arg("--verbose")
                .arg("--model")
                .arg(&config.model)
                .arg("--append-system-prompt")
                .arg(&task.system_prompt)
                .arg("--allowed-tools")
                .arg(config.allowed_tools.join(","))
                .arg("--max-turns")
                .arg(config.max_turns.to_string())
                .arg(&task.prompt)
                .current_dir(&task.repo_path)
                .env("ANTHROPIC_API_KEY", &task.api_key)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                // Dropping the stream mid-turn must also stop the engine.
                .kill_on_drop(true);

            let mut child = match command.spawn() {
                Ok(child) => child,
                Err(e) => {
                    yield AgentEvent::Error {
                        message: format!("Failed to start {}: {}", config.binary, e),
                    };
                    return;
                }
            };

            let stdout = match child.stdout.take() {
                Some(stdout) => stdout,
                None => {
                    yield AgentEvent::Error {
                        message: "Claude process produced no stdout handle".to_string(),
                    };
                    return;
                }
            };

            // Stderr must be drained while stdout is read; a chatty engine
            // blocks on a full pipe otherwise.
            let stderr_task = child.stderr.take().map(|mut stderr| {
                tokio::spawn(async move {
                    let mut buf = String::new();
                    let _ = stderr.read_to_string(&mut buf).await;
                    buf
                })
            });

            let mut lines = BufReader::new(stdout).lines();
            let mut accumulated = String::new();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        let value: serde_json::Value = match serde_json::from_str(line) {
                            Ok(value) => value,
                            Err(_) => {
                                debug!(line, "Skipping non-JSON line from Claude");
                                continue;
                            }
                        };
                        match value.get("type").and_then(|t| t.as_str()) {
                            Some("assistant") => {
                                for text in assistant_text_blocks(&value) {
                                    accumulated.push_str(&text);
                                    yield AgentEvent::Chunk { text };
                                }
                            }
                            Some("result") => {
                                yield AgentEvent::Done { text: accumulated };
                                return;
                            }
                            _ => {}
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        yield AgentEvent::Error {
                            message: format!("Failed to read Claude output: {}", e),
                        };
                        return;
                    }
                }
            }

            // EOF without a result line. A clean exit still counts as a
            // finished turn; anything else is reported with stderr attached.
            let stderr_tail = match stderr_task {
                Some(handle) => handle.await.unwrap_or_default(),
                None => String::new(),
            };

            match child.wait().await {
                Ok(status) if status.success() => {
                    yield AgentEvent::Done { text: accumulated };
                }
                Ok(status) => {
                    let detail = stderr_tail.trim();
                    let message = if detail.is_empty() {
                        format!("Claude exited with {}", status)
                    } else {
                        format!("Claude exited with {}: {}", status, truncate_detail(detail))
                    };
                    yield AgentEvent::Error { message };
                }
                Err(e) => {
                    yield AgentEvent::Error {
                        message: format!("Failed to wait for Claude: {}", e),
                    };
                }
            }
        })
    }
}

/// Pull the text blocks out of an `assistant` stream-json line.
fn assistant_text_blocks(value: &serde_json::Value) -> Vec<String> {
    value
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_array())
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn truncate_detail(detail: &str) -> String {
    const MAX: usize = 500;
    if detail.chars().count() <= MAX {
        detail.to_string()
    } else {
        let cut: String = detail.chars().take(MAX).collect();
        format!("{}...", cut)
    }
}
