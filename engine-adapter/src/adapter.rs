//! The Engine Process Adapter: one live GTP engine process, driven by a
//! single owning task so that the "at most one in-flight command" invariant
//! holds structurally rather than by caller discipline.
//!
//! Mirrors the send/receive task split a relay connection uses for a socket:
//! one task owns the child's stdin/stdout and processes commands strictly in
//! order, a second drains stderr as a side channel, and `tokio::select!`
//! races the process's natural exit against the hard-kill timer on
//! `kill()`.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::sleep;

use crate::error::Error;
use crate::framing::{classify_frame, extract_frames, try_extract_json_frame, FrameClass};
use crate::state::EpaState;

const HARD_KILL_DELAY: Duration = Duration::from_secs(5);

/// A line of stderr output, classified per the chat-channel convention
/// (`DISCUSSION:`/`MALKOVICH:` prefixes) or passed through as a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StderrEvent {
    Chat { channel: ChatChannel, body: String },
    Diagnostic(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatChannel {
    Discussion,
    Malkovich,
}

fn classify_stderr_line(line: &str) -> StderrEvent {
    if let Some(body) = line.strip_prefix("DISCUSSION:") {
        StderrEvent::Chat { channel: ChatChannel::Discussion, body: body.trim().to_string() }
    } else if let Some(body) = line.strip_prefix("MALKOVICH:") {
        StderrEvent::Chat { channel: ChatChannel::Malkovich, body: body.trim().to_string() }
    } else {
        StderrEvent::Diagnostic(line.to_string())
    }
}

/// Whether the adapter's wire transport frames commands as plain GTP text
/// or wraps them for a JSON-speaking engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Text,
    Json,
}

struct CommandRequest {
    text: String,
    /// JSON transport only: closes the request stream after this command.
    final_command: bool,
    respond: oneshot::Sender<Result<String, Error>>,
}

enum Envelope {
    Command(CommandRequest),
    /// Best-effort `quit` plus teardown; never waits for a framed reply.
    Kill,
}

/// A handle to a running (or dying) engine process. Cheap to clone; every
/// clone shares the same underlying process and command queue.
#[derive(Clone)]
pub struct EngineProcessAdapter {
    command_tx: mpsc::UnboundedSender<Envelope>,
    state_rx: watch::Receiver<EpaState>,
    /// Set once a command-level or protocol-level error has been observed
    /// for this game; never cleared. The enclosing game layer is expected to
    /// resign after a small number of retries once this is set.
    failed: Arc<AtomicBool>,
}

impl EngineProcessAdapter {
    /// Spawns `program args...` and starts its owning tasks. The adapter is
    /// `Ready` as soon as the process starts; callers still need to run the
    /// capability handshake (`list_commands`, optionally
    /// `kata-list_time_settings`) before issuing real commands.
    pub fn spawn(
        program: &str,
        args: &[String],
        transport: Transport,
    ) -> Result<(Self, mpsc::UnboundedReceiver<StderrEvent>), std::io::Error> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take().expect("piped stdin");
        let stdout = child.stdout.take().expect("piped stdout");
        let stderr = child.stderr.take().expect("piped stderr");

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(EpaState::Ready);
        let (stderr_tx, stderr_rx) = mpsc::unbounded_channel();
        let failed = Arc::new(AtomicBool::new(false));

        tokio::spawn(run_io_task(
            child,
            stdin,
            stdout,
            command_rx,
            state_tx,
            transport,
            failed.clone(),
        ));
        tokio::spawn(run_stderr_task(stderr, stderr_tx));

        Ok((Self { command_tx, state_rx, failed }, stderr_rx))
    }

    /// Issues one GTP command and awaits its completion. Resolves with
    /// [`Error::DeadEngine`] immediately if the adapter is already dead.
    pub async fn command(&self, text: impl Into<String>) -> Result<String, Error> {
        self.command_inner(text.into(), false).await
    }

    /// Like [`Self::command`], but for JSON transport closes the request
    /// stream after this command (used for the final command of a game).
    pub async fn command_final(&self, text: impl Into<String>) -> Result<String, Error> {
        self.command_inner(text.into(), true).await
    }

    async fn command_inner(&self, text: String, final_command: bool) -> Result<String, Error> {
        if self.state_rx.borrow().is_dead() {
            return Err(Error::DeadEngine);
        }
        let (respond, receiver) = oneshot::channel();
        let request = CommandRequest { text, final_command, respond };
        if self.command_tx.send(Envelope::Command(request)).is_err() {
            return Err(Error::DeadEngine);
        }
        receiver.await.unwrap_or(Err(Error::DeadEngine))
    }

    /// Current lifecycle state, as last observed by the owning task.
    pub fn state(&self) -> EpaState {
        *self.state_rx.borrow()
    }

    /// Whether a command-level or protocol-level error has been observed on
    /// this adapter since it was spawned. Sticky: never resets. The caller
    /// decides whether and when to stop retrying and resign the game.
    pub fn failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    /// Sends `quit` best-effort, stops accepting further commands, and
    /// guarantees the process is gone within [`HARD_KILL_DELAY`] even if it
    /// never replies. Never waits for a framed response to `quit` itself.
    pub fn kill(&self) {
        let _ = self.command_tx.send(Envelope::Kill);
    }
}

async fn run_io_task(
    mut child: Child,
    mut stdin: tokio::process::ChildStdin,
    stdout: tokio::process::ChildStdout,
    mut command_rx: mpsc::UnboundedReceiver<Envelope>,
    state_tx: watch::Sender<EpaState>,
    transport: Transport,
    failed: Arc<AtomicBool>,
) {
    let mut reader = BufReader::new(stdout);
    let mut buffer = String::new();

    while let Some(envelope) = command_rx.recv().await {
        let request = match envelope {
            Envelope::Command(request) => request,
            Envelope::Kill => {
                let _ = stdin.write_all(b"quit\n").await;
                let _ = stdin.flush().await;
                break;
            }
        };

        let _ = state_tx.send(EpaState::Busy);

        let write_result = async {
            stdin.write_all(request.text.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.flush().await
        }
        .await;

        if let Err(io_err) = write_result {
            failed.store(true, Ordering::SeqCst);
            let _ = request.respond.send(Err(Error::TransportError(io_err)));
            break;
        }

        if transport == Transport::Json && request.final_command {
            let _ = stdin.shutdown().await;
        }

        let outcome = read_one_frame(&mut reader, &mut buffer, transport).await;
        if matches!(
            outcome,
            Err(Error::ProtocolFailure(_)) | Err(Error::UnexpectedOutput(_)) | Err(Error::TransportError(_)) | Err(Error::EngineExited)
        ) {
            failed.store(true, Ordering::SeqCst);
        }
        let died = matches!(outcome, Err(Error::EngineExited));
        let _ = request.respond.send(outcome);

        if died {
            break;
        }
        let _ = state_tx.send(EpaState::Ready);
    }

    let _ = state_tx.send(EpaState::Dead);
    tokio::select! {
        _ = child.wait() => {}
        _ = sleep(HARD_KILL_DELAY) => {
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
    }

    // Drain anything still queued (callers that enqueued before the death
    // was observed) so every command gets exactly one completion.
    while let Some(envelope) = command_rx.recv().await {
        if let Envelope::Command(request) = envelope {
            let _ = request.respond.send(Err(Error::DeadEngine));
        }
    }
}

async fn read_one_frame(
    reader: &mut BufReader<tokio::process::ChildStdout>,
    buffer: &mut String,
    transport: Transport,
) -> Result<String, Error> {
    loop {
        match transport {
            Transport::Json => {
                if let Some(value) = try_extract_json_frame(buffer) {
                    let text = value
                        .get("response")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    return finish_frame(&text);
                }
            }
            Transport::Text => {
                let frames = extract_frames(buffer);
                if let Some(frame) = frames.into_iter().next() {
                    return finish_frame(&frame);
                }
            }
        }

        let mut line = String::new();
        let read = reader.read_line(&mut line).await.map_err(Error::TransportError)?;
        if read == 0 {
            return Err(Error::EngineExited);
        }
        buffer.push_str(&line);
    }
}

fn finish_frame(frame: &str) -> Result<String, Error> {
    match classify_frame(frame) {
        FrameClass::Success(body) => Ok(body),
        FrameClass::Failure(body) => Err(Error::ProtocolFailure(body)),
        FrameClass::Violation(body) => Err(Error::UnexpectedOutput(body)),
    }
}

async fn run_stderr_task(
    stderr: tokio::process::ChildStderr,
    stderr_tx: mpsc::UnboundedSender<StderrEvent>,
) {
    let mut reader = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = reader.next_line().await {
        if stderr_tx.send(classify_stderr_line(&line)).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_chat_lines_are_classified_by_prefix() {
        assert_eq!(
            classify_stderr_line("DISCUSSION: I think this is close"),
            StderrEvent::Chat {
                channel: ChatChannel::Discussion,
                body: "I think this is close".to_string()
            }
        );
        assert_eq!(
            classify_stderr_line("MALKOVICH: winrate 54%"),
            StderrEvent::Chat { channel: ChatChannel::Malkovich, body: "winrate 54%".to_string() }
        );
        assert_eq!(
            classify_stderr_line("loading weights..."),
            StderrEvent::Diagnostic("loading weights...".to_string())
        );
    }

    #[tokio::test]
    async fn commands_after_kill_resolve_with_dead_engine() {
        let (adapter, _stderr_rx) = EngineProcessAdapter::spawn("cat", &[], Transport::Text)
            .expect("spawn cat as a stand-in process");
        adapter.kill();
        // give the io task a chance to observe the quit and tear down.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let result = adapter.command("genmove b").await;
        assert!(matches!(result, Err(Error::DeadEngine)));
    }

    #[tokio::test]
    async fn a_protocol_failure_sticks_the_failed_flag() {
        // A stand-in "engine" that ignores its input entirely and always
        // answers with a GTP failure frame.
        let (adapter, _stderr_rx) = EngineProcessAdapter::spawn(
            "sh",
            &["-c".to_string(), "printf '? unacceptable move\\n\\n'".to_string()],
            Transport::Text,
        )
        .expect("spawn sh as a stand-in process");
        assert!(!adapter.failed());
        let result = adapter.command("genmove b").await;
        assert!(matches!(result, Err(Error::ProtocolFailure(_))));
        assert!(adapter.failed());
    }
}
