//! Browser driver subprocess speaking line-delimited JSON on stdin/stdout.
//!
//! ```text
//! driver → {"type":"ready"}
//! host   → {"type":"run","task":"...","llm":{...}}
//! driver → {"ok":true,"history":...} | {"ok":false,"error":"..."}
//! ```
//!
//! Lines on stdout that are not JSON objects are treated as driver chatter
//! and logged. Stderr is forwarded to `tracing` at debug level.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{ChildStdin, ChildStdout, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub struct BrowserSessionArgs {
    pub cmd: String,
    pub args: Vec<String>,
    pub envs: HashMap<String, String>,
    pub ready_timeout: Duration,
}

#[derive(Debug, Serialize)]
pub struct LlmSpec<'a> {
    pub provider: &'static str,
    pub model: &'a str,
    pub base_url: &'a str,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DriverRequest<'a> {
    Run { task: &'a str, llm: LlmSpec<'a> },
}

#[derive(Debug, Deserialize)]
pub struct DriverReply {
    pub ok: bool,
    #[serde(default)]
    pub history: Value,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize)]
struct DriverNotice {
    #[serde(rename = "type")]
    kind: String,
}

pub struct BrowserSession {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    alive: Arc<AtomicBool>,
    kill_tx: Option<oneshot::Sender<()>>,
    watcher: Option<JoinHandle<()>>,
}

impl BrowserSession {
    /// Spawns the driver and waits for its ready notice.
    pub async fn launch(args: &BrowserSessionArgs) -> Result<Self> {
        let mut child = Command::new(&args.cmd)
            .args(&args.args)
            .envs(&args.envs)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn browser driver `{}`", args.cmd))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("browser driver stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("browser driver stdout unavailable"))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(target: "taskpilot::driver", "{}", line);
                }
            });
        }

        let alive = Arc::new(AtomicBool::new(true));
        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        let watcher = {
            let alive = alive.clone();
            tokio::spawn(async move {
                // a dropped sender counts as a kill request
                let exited = tokio::select! {
                    status = child.wait() => Some(status),
                    _ = kill_rx => None,
                };
                match exited {
                    Some(Ok(s)) => tracing::info!("browser driver exited: {}", s),
                    Some(Err(e)) => tracing::warn!("browser driver wait failed: {}", e),
                    None => {
                        if let Err(e) = child.kill().await {
                            tracing::warn!("failed to kill browser driver: {}", e);
                        }
                    }
                }
                alive.store(false, Ordering::SeqCst);
            })
        };

        let mut session = Self {
            stdin,
            stdout: BufReader::new(stdout).lines(),
            alive,
            kill_tx: Some(kill_tx),
            watcher: Some(watcher),
        };

        match tokio::time::timeout(args.ready_timeout, session.wait_ready()).await {
            Ok(Ok(())) => Ok(session),
            Ok(Err(e)) => {
                session.shutdown().await;
                Err(e)
            }
            Err(_) => {
                session.shutdown().await;
                bail!(
                    "browser driver did not report ready within {:?}",
                    args.ready_timeout
                )
            }
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Sends one request and waits for the matching reply line.
    pub async fn request(&mut self, req: &DriverRequest<'_>) -> Result<DriverReply> {
        let mut line = serde_json::to_string(req)?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .context("writing to browser driver")?;
        self.stdin.flush().await.context("flushing browser driver stdin")?;

        loop {
            let Some(raw) = self.next_line().await? else {
                bail!("browser driver exited before replying");
            };
            match serde_json::from_str::<DriverReply>(&raw) {
                Ok(reply) => return Ok(reply),
                Err(_) => tracing::debug!(target: "taskpilot::driver", "{}", raw),
            }
        }
    }

    /// Kills the driver and waits for the watcher to observe it.
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.kill_tx.take() {
            let _ = tx.send(());
        }
        if let Some(watcher) = self.watcher.take() {
            let _ = watcher.await;
        }
        self.alive.store(false, Ordering::SeqCst);
    }

    async fn wait_ready(&mut self) -> Result<()> {
        loop {
            let Some(raw) = self.next_line().await? else {
                bail!("browser driver exited during startup");
            };
            match serde_json::from_str::<DriverNotice>(&raw) {
                Ok(notice) if notice.kind == "ready" => return Ok(()),
                _ => tracing::debug!(target: "taskpilot::driver", "{}", raw),
            }
        }
    }

    async fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            match self
                .stdout
                .next_line()
                .await
                .context("reading browser driver stdout")?
            {
                Some(line) if line.trim().is_empty() => continue,
                other => return Ok(other),
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serde_json::json;

    const ECHO_DRIVER: &str = r#"echo 'starting up'
echo '{"type":"ready"}'
while read line; do
  case "$line" in
    *fail*) echo '{"ok":false,"error":"page not reachable"}' ;;
    *) echo '{"ok":true,"history":["visited"]}' ;;
  esac
done"#;

    fn sh(script: &str, ready_ms: u64) -> BrowserSessionArgs {
        BrowserSessionArgs {
            cmd: "sh".into(),
            args: vec!["-c".into(), script.into()],
            envs: HashMap::new(),
            ready_timeout: Duration::from_millis(ready_ms),
        }
    }

    fn run(task: &str) -> DriverRequest<'_> {
        DriverRequest::Run {
            task,
            llm: LlmSpec {
                provider: "ollama",
                model: "deepseek",
                base_url: "http://localhost:11434",
                temperature: 0.2,
            },
        }
    }

    #[test]
    fn run_request_wire_shape() {
        let v = serde_json::to_value(run("open x")).unwrap();
        assert_eq!(
            v,
            json!({
                "type": "run",
                "task": "open x",
                "llm": {
                    "provider": "ollama",
                    "model": "deepseek",
                    "base_url": "http://localhost:11434",
                    "temperature": 0.2f32
                }
            })
        );
    }

    #[tokio::test]
    async fn round_trips_requests_with_driver() {
        let mut session = BrowserSession::launch(&sh(ECHO_DRIVER, 5_000)).await.unwrap();
        assert!(session.is_alive());

        let ok = session.request(&run("open example.com")).await.unwrap();
        assert!(ok.ok);
        assert_eq!(ok.history, json!(["visited"]));

        let failed = session.request(&run("please fail")).await.unwrap();
        assert!(!failed.ok);
        assert_eq!(failed.error.as_deref(), Some("page not reachable"));

        session.shutdown().await;
        assert!(!session.is_alive());
    }

    #[tokio::test]
    async fn driver_exit_marks_session_dead() {
        let script = r#"echo '{"type":"ready"}'; read line; exit 0"#;
        let mut session = BrowserSession::launch(&sh(script, 5_000)).await.unwrap();

        assert!(session.request(&run("anything")).await.is_err());
        for _ in 0..50 {
            if !session.is_alive() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!session.is_alive());
    }

    #[tokio::test]
    async fn silent_driver_times_out_during_startup() {
        let err = BrowserSession::launch(&sh("sleep 5", 100))
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("did not report ready"));
    }

    #[tokio::test]
    async fn missing_binary_fails_to_spawn() {
        let args = BrowserSessionArgs {
            cmd: "/nonexistent/taskpilot-driver".into(),
            args: vec![],
            envs: HashMap::new(),
            ready_timeout: Duration::from_secs(1),
        };
        assert!(BrowserSession::launch(&args).await.is_err());
    }
}
