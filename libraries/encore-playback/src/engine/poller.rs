//! Position sampling loop
//!
//! Runs only while the transport is playing and ready. Each tick asks the
//! engine task to sample the playhead; dropping the poller cancels the loop.

use super::command::Command;
use std::time::Duration;
use tokio::sync::mpsc::WeakUnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub(crate) struct PositionPoller {
    handle: JoinHandle<()>,
}

impl PositionPoller {
    pub(crate) fn start(period: Duration, commands: WeakUnboundedSender<Command>) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(tx) = commands.upgrade() else {
                    break;
                };
                if tx.send(Command::PollPosition).is_err() {
                    break;
                }
            }
        });

        Self { handle }
    }
}

impl Drop for PositionPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
