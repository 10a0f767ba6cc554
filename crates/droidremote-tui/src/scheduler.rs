//! Lanes — one bounded queue and one worker task per command target.
//!
//! ```text
//!   CommandScheduler::submit(cmd)
//!         │
//!         ├── Lane::Connect          → worker → runner.run() ─┐
//!         ├── Lane::Transport        → worker → runner.run() ─┼─→ done_tx (CommandOutcome)
//!         └── Lane::Volume(stream)   → worker → runner.run() ─┘
//! ```
//!
//! A lane runs at most one command at a time and completes them in the order
//! they were submitted.  Lanes are created on first use and live until the
//! scheduler is dropped.

use std::collections::HashMap;
use std::sync::Arc;

use droidremote_proto::protocol::{BridgeCommand, Lane};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::adb::{BridgeError, CommandOutput, CommandRunner};

/// Commands a lane may hold (running one included) before new ones are refused.
pub const LANE_DEPTH: usize = 8;

struct Job {
    id: u64,
    command: BridgeCommand,
}

/// Result of one command, reported back to whoever owns the scheduler.
#[derive(Debug)]
pub struct CommandOutcome {
    pub id: u64,
    pub command: BridgeCommand,
    pub result: Result<CommandOutput, BridgeError>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("{0} queue is full")]
    LaneFull(Lane),
    #[error("{0} worker is gone")]
    LaneClosed(Lane),
}

pub struct CommandScheduler<R: CommandRunner> {
    runner: Arc<R>,
    lanes: HashMap<Lane, mpsc::Sender<Job>>,
    done_tx: mpsc::Sender<CommandOutcome>,
    next_id: u64,
}

impl<R: CommandRunner> CommandScheduler<R> {
    pub fn new(runner: Arc<R>, done_tx: mpsc::Sender<CommandOutcome>) -> Self {
        Self {
            runner,
            lanes: HashMap::new(),
            done_tx,
            next_id: 1,
        }
    }

    /// Queue `command` on its lane.  Returns the job id used in the outcome.
    pub fn submit(&mut self, command: BridgeCommand) -> Result<u64, SubmitError> {
        let lane = command.lane();
        let id = self.next_id;
        self.next_id += 1;

        let tx = self
            .lanes
            .entry(lane)
            .or_insert_with(|| spawn_lane(lane, Arc::clone(&self.runner), self.done_tx.clone()));

        match tx.try_send(Job { id, command }) {
            Ok(()) => {
                debug!("lane {}: queued job #{}", lane, id);
                Ok(id)
            }
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!("lane {}: full, dropping {}", lane, job.command.describe());
                Err(SubmitError::LaneFull(lane))
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                // Worker ended (outcome receiver dropped); forget the lane so
                // the next submit starts a fresh one.
                warn!("lane {}: worker gone, dropping {}", lane, job.command.describe());
                self.lanes.remove(&lane);
                Err(SubmitError::LaneClosed(lane))
            }
        }
    }
}

fn spawn_lane<R: CommandRunner>(
    lane: Lane,
    runner: Arc<R>,
    done_tx: mpsc::Sender<CommandOutcome>,
) -> mpsc::Sender<Job> {
    let (tx, mut rx) = mpsc::channel::<Job>(LANE_DEPTH);
    tokio::spawn(async move {
        debug!("lane {}: worker started", lane);
        while let Some(job) = rx.recv().await {
            let result = runner.run(&job.command).await;
            if let Ok(out) = &result {
                debug!(
                    "lane {}: job #{} ok stdout={:?} stderr={:?}",
                    lane, job.id, out.stdout, out.stderr
                );
            }
            let outcome = CommandOutcome {
                id: job.id,
                command: job.command,
                result,
            };
            if done_tx.send(outcome).await.is_err() {
                break;
            }
        }
        debug!("lane {}: worker stopped", lane);
    });
    tx
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use droidremote_proto::protocol::{TransportKey, VolumeStream};
    use std::future::Future;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every command and answers from a caller-supplied policy.
    pub(crate) struct RecordingRunner {
        pub calls: Mutex<Vec<BridgeCommand>>,
        respond: Box<dyn Fn(&BridgeCommand) -> (Duration, Result<(), String>) + Send + Sync>,
    }

    impl RecordingRunner {
        pub(crate) fn ok() -> Self {
            Self::with(|_| (Duration::ZERO, Ok(())))
        }

        pub(crate) fn with(
            respond: impl Fn(&BridgeCommand) -> (Duration, Result<(), String>)
                + Send
                + Sync
                + 'static,
        ) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                respond: Box::new(respond),
            }
        }

        pub(crate) fn calls(&self) -> Vec<BridgeCommand> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(
            &self,
            command: &BridgeCommand,
        ) -> impl Future<Output = Result<CommandOutput, BridgeError>> + Send {
            let (delay, answer) = (self.respond)(command);
            let command = command.clone();
            async move {
                tokio::time::sleep(delay).await;
                self.calls.lock().unwrap().push(command);
                answer
                    .map(|_| CommandOutput::default())
                    .map_err(BridgeError::Rejected)
            }
        }
    }

    fn volume(level: u32) -> BridgeCommand {
        BridgeCommand::SetVolume {
            stream: VolumeStream::Media,
            level,
        }
    }

    #[tokio::test]
    async fn same_lane_completes_in_submission_order() {
        // Earlier jobs are slower; a lane must still finish them first.
        let runner = Arc::new(RecordingRunner::with(|cmd| match cmd {
            BridgeCommand::SetVolume { level, .. } => {
                (Duration::from_millis(40 - 10 * *level as u64), Ok(()))
            }
            _ => (Duration::ZERO, Ok(())),
        }));
        let (done_tx, mut done_rx) = mpsc::channel(16);
        let mut scheduler = CommandScheduler::new(Arc::clone(&runner), done_tx);

        for level in 1..=3 {
            scheduler.submit(volume(level)).unwrap();
        }

        let mut order = Vec::new();
        for _ in 0..3 {
            let outcome = tokio::time::timeout(Duration::from_secs(2), done_rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert!(outcome.result.is_ok());
            order.push(outcome.command);
        }
        assert_eq!(order, vec![volume(1), volume(2), volume(3)]);
        assert_eq!(runner.calls(), order);
    }

    #[tokio::test]
    async fn lanes_run_independently() {
        // A slow volume command must not hold up a transport key.
        let runner = Arc::new(RecordingRunner::with(|cmd| match cmd {
            BridgeCommand::SetVolume { .. } => (Duration::from_millis(200), Ok(())),
            _ => (Duration::ZERO, Ok(())),
        }));
        let (done_tx, mut done_rx) = mpsc::channel(16);
        let mut scheduler = CommandScheduler::new(Arc::clone(&runner), done_tx);

        scheduler.submit(volume(4)).unwrap();
        scheduler
            .submit(BridgeCommand::KeyEvent(TransportKey::PlayPause))
            .unwrap();

        let first = done_rx.recv().await.unwrap();
        assert_eq!(first.command, BridgeCommand::KeyEvent(TransportKey::PlayPause));
        let second = done_rx.recv().await.unwrap();
        assert_eq!(second.command, volume(4));
    }

    #[tokio::test]
    async fn full_lane_refuses_new_commands() {
        let runner = Arc::new(RecordingRunner::with(|_| (Duration::from_secs(5), Ok(()))));
        let (done_tx, _done_rx) = mpsc::channel(16);
        let mut scheduler = CommandScheduler::new(runner, done_tx);

        // One job may already be pulled by the worker, so allow one extra.
        let mut refused = None;
        for level in 0..(LANE_DEPTH as u32 + 2) {
            if let Err(e) = scheduler.submit(volume(level)) {
                refused = Some(e);
                break;
            }
        }
        assert_eq!(
            refused,
            Some(SubmitError::LaneFull(Lane::Volume(VolumeStream::Media)))
        );
    }

    #[tokio::test]
    async fn failures_are_reported_not_raised() {
        let runner = Arc::new(RecordingRunner::with(|_| {
            (Duration::ZERO, Err("device offline".to_string()))
        }));
        let (done_tx, mut done_rx) = mpsc::channel(4);
        let mut scheduler = CommandScheduler::new(runner, done_tx);

        let id = scheduler
            .submit(BridgeCommand::KeyEvent(TransportKey::Stop))
            .unwrap();
        let outcome = done_rx.recv().await.unwrap();
        assert_eq!(outcome.id, id);
        assert_eq!(
            outcome.result.unwrap_err().to_string(),
            "device offline"
        );
    }
}
