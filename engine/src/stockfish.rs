use crate::uci::{parse_uci_message, UciMessage};
use crate::EngineError;
use chess::EvaluatedPosition;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

/// Configuration for spawning and tuning the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Explicit engine binary; common install locations are searched otherwise.
    pub path: Option<PathBuf>,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
    pub init_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: None,
            threads: None,
            hash_mb: None,
            init_timeout: Duration::from_secs(10),
        }
    }
}

enum Request {
    Evaluate {
        fen: String,
        depth: u32,
        reply: mpsc::Sender<EvaluatedPosition>,
    },
    Quit,
}

/// A running Stockfish process. Evaluations are queued and run one at a time.
pub struct StockfishEngine {
    process: Child,
    requests: mpsc::Sender<Request>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish instance and complete the UCI handshake.
    #[tracing::instrument(level = "info")]
    pub async fn spawn(config: EngineConfig) -> Result<Self, EngineError> {
        let path = find_stockfish_path(config.path.as_deref()).ok_or(EngineError::NotFound)?;
        tracing::info!("Found Stockfish at: {:?}", path);

        let mut process = tokio::process::Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn Stockfish: {}", e);
                EngineError::Spawn(e)
            })?;

        let mut stdin = process.stdin.take().ok_or(EngineError::MissingPipe("stdin"))?;
        let stdout = process.stdout.take().ok_or(EngineError::MissingPipe("stdout"))?;

        // Spawn output reader task
        let (event_tx, mut events) = mpsc::channel::<UciMessage>(64);
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::warn!("Stockfish stdout EOF - engine closed");
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        tracing::trace!("UCI << {}", trimmed);
                        match parse_uci_message(trimmed) {
                            Ok(msg) => {
                                if event_tx.send(msg).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => tracing::trace!("Ignoring UCI line: {}", e),
                        }
                    }
                    Err(e) => {
                        tracing::error!("Error reading from Stockfish stdout: {}", e);
                        break;
                    }
                }
            }
            tracing::debug!("Output reader task exiting");
        });

        send_line(&mut stdin, "uci").await?;
        wait_for(&mut events, config.init_timeout, |msg| {
            matches!(msg, UciMessage::UciOk)
        })
        .await?;

        if let Some(threads) = config.threads {
            let threads = threads.clamp(1, 16);
            tracing::info!("Setting Threads to {}", threads);
            send_line(&mut stdin, &format!("setoption name Threads value {}", threads)).await?;
        }
        if let Some(hash_mb) = config.hash_mb {
            let hash_mb = hash_mb.clamp(1, 2048);
            tracing::info!("Setting Hash to {} MB", hash_mb);
            send_line(&mut stdin, &format!("setoption name Hash value {}", hash_mb)).await?;
        }

        send_line(&mut stdin, "isready").await?;
        wait_for(&mut events, config.init_timeout, |msg| {
            matches!(msg, UciMessage::ReadyOk)
        })
        .await?;

        // Spawn request processor task
        let (requests, mut request_rx) = mpsc::channel::<Request>(8);
        tokio::spawn(async move {
            while let Some(request) = request_rx.recv().await {
                match request {
                    Request::Evaluate { fen, depth, reply } => {
                        if let Err(e) = run_search(&mut stdin, &mut events, &fen, depth, &reply).await {
                            tracing::error!("Evaluation of {} failed: {}", fen, e);
                            break;
                        }
                    }
                    Request::Quit => {
                        let _ = send_line(&mut stdin, "quit").await;
                        break;
                    }
                }
            }
            tracing::debug!("Request processor task exiting");
        });

        tracing::info!("Stockfish engine spawned and initialized successfully");
        Ok(Self { process, requests })
    }

    /// Evaluate `fen` to `depth`. The receiver yields evaluations of
    /// increasing depth; the last one carries the engine's chosen best move.
    /// Dropping the receiver stops the search early.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn evaluate(
        &self,
        fen: &str,
        depth: u32,
    ) -> Result<mpsc::Receiver<EvaluatedPosition>, EngineError> {
        let (reply, rx) = mpsc::channel(64);
        self.requests
            .send(Request::Evaluate {
                fen: fen.to_string(),
                depth,
                reply,
            })
            .await
            .map_err(|_| EngineError::Closed)?;
        Ok(rx)
    }

    /// Shutdown the engine
    pub async fn shutdown(mut self) {
        let _ = self.requests.send(Request::Quit).await;
        let _ = tokio::time::timeout(Duration::from_secs(1), self.process.wait()).await;
        let _ = self.process.kill().await;
    }
}

async fn send_line<W: AsyncWrite + Unpin>(stdin: &mut W, line: &str) -> Result<(), EngineError> {
    tracing::trace!("UCI >> {}", line);
    stdin.write_all(line.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await?;
    Ok(())
}

async fn wait_for(
    events: &mut mpsc::Receiver<UciMessage>,
    timeout: Duration,
    done: impl Fn(&UciMessage) -> bool,
) -> Result<(), EngineError> {
    let wait = async {
        while let Some(msg) = events.recv().await {
            if done(&msg) {
                return Ok(());
            }
        }
        Err(EngineError::Closed)
    };
    tokio::time::timeout(timeout, wait)
        .await
        .map_err(|_| EngineError::Timeout)?
}

/// Run one `go depth` search, forwarding each deeper evaluation to `reply`.
///
/// Consumes engine output up to and including `bestmove`, so the engine is
/// idle again when this returns.
async fn run_search<W: AsyncWrite + Unpin>(
    stdin: &mut W,
    events: &mut mpsc::Receiver<UciMessage>,
    fen: &str,
    depth: u32,
    reply: &mpsc::Sender<EvaluatedPosition>,
) -> Result<(), EngineError> {
    send_line(stdin, &format!("position fen {}", fen)).await?;
    send_line(stdin, &format!("go depth {}", depth)).await?;
    tracing::info!("Starting engine calculation with depth={}", depth);

    let mut latest: Option<EvaluatedPosition> = None;
    let mut listening = true;

    while let Some(msg) = events.recv().await {
        match msg {
            UciMessage::Info(info) => {
                let Some(eval) = info.to_evaluation(fen) else {
                    continue;
                };
                if latest.as_ref().is_some_and(|l| l.depth >= eval.depth) {
                    latest = Some(eval);
                    continue;
                }
                if listening && reply.send(eval.clone()).await.is_err() {
                    tracing::debug!("Evaluation receiver dropped, stopping search");
                    send_line(stdin, "stop").await?;
                    listening = false;
                }
                latest = Some(eval);
            }
            UciMessage::BestMove { mv, .. } => {
                if let (true, Some(mut last)) = (listening, latest) {
                    if mv.is_some() {
                        last.best_move = mv;
                    }
                    let _ = reply.send(last).await;
                }
                return Ok(());
            }
            _ => {}
        }
    }

    Err(EngineError::Closed)
}

/// Find Stockfish executable, preferring an explicit path
fn find_stockfish_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    // Common paths to check
    let paths = [
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
        "stockfish", // In PATH
    ];

    for path_str in paths {
        let path = Path::new(path_str);
        if path.exists() || path_str == "stockfish" {
            // Try to verify it's actually runnable
            if std::process::Command::new(path_str)
                .arg("--help")
                .output()
                .is_ok()
            {
                return Some(PathBuf::from(path_str));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::AnalysisScore;

    const FEN: &str = chess::STARTING_FEN;

    fn script(lines: &[&str]) -> mpsc::Receiver<UciMessage> {
        let (tx, rx) = mpsc::channel(lines.len() + 1);
        for line in lines {
            tx.try_send(parse_uci_message(line).unwrap()).unwrap();
        }
        rx
    }

    #[tokio::test]
    async fn test_search_reports_improving_depths() {
        let mut events = script(&[
            "info depth 1 score cp 10 pv d2d4",
            "info depth 2 score cp 25 pv e2e4 e7e5",
            "info depth 2 score cp 30 lowerbound pv e2e4",
            "info depth 3 score cp 20 pv e2e4 c7c5",
            "bestmove e2e4 ponder c7c5",
        ]);
        let mut stdin = Vec::new();
        let (tx, mut rx) = mpsc::channel(16);

        run_search(&mut stdin, &mut events, FEN, 3, &tx).await.unwrap();
        drop(tx);

        let sent = String::from_utf8(stdin).unwrap();
        assert_eq!(sent, format!("position fen {}\ngo depth 3\n", FEN));

        let mut depths = Vec::new();
        let mut last = None;
        while let Some(eval) = rx.recv().await {
            depths.push(eval.depth);
            last = Some(eval);
        }
        assert_eq!(depths, vec![1, 2, 3, 3]);
        let last = last.unwrap();
        assert_eq!(last.best_move.as_deref(), Some("e2e4"));
        assert_eq!(last.score, AnalysisScore::Centipawns(20));
    }

    #[tokio::test]
    async fn test_dropped_receiver_stops_search() {
        let mut events = script(&[
            "info depth 1 score cp 10 pv d2d4",
            "info depth 2 score cp 25 pv e2e4",
            "bestmove e2e4",
        ]);
        let mut stdin = Vec::new();
        let (tx, rx) = mpsc::channel(16);
        drop(rx);

        run_search(&mut stdin, &mut events, FEN, 20, &tx).await.unwrap();
        let sent = String::from_utf8(stdin).unwrap();
        assert!(sent.ends_with("stop\n"));
        assert_eq!(sent.matches("stop").count(), 1);
    }

    #[tokio::test]
    async fn test_engine_exit_mid_search() {
        let mut events = script(&["info depth 1 score cp 10 pv d2d4"]);
        let mut stdin = Vec::new();
        let (tx, _rx) = mpsc::channel(16);
        let result = run_search(&mut stdin, &mut events, FEN, 5, &tx).await;
        assert!(matches!(result, Err(EngineError::Closed)));
    }

    #[test]
    fn test_explicit_missing_path() {
        assert!(find_stockfish_path(Some(Path::new("/nonexistent/stockfish"))).is_none());
    }
}
