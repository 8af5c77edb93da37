use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::Sender;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::api::ViewerApi;
use crate::events::ViewerEvent;

/// Polls `/status` until cancelled and forwards every answer, failures included.
///
/// The interval is measured from the end of one poll to the start of the next,
/// so slow answers never overlap. Reaching the ready state does not stop the loop.
#[instrument(skip_all, name = "status_sync", fields(interval = %humantime::format_duration(interval)))]
pub async fn run<A: ViewerApi>(
    api: A,
    interval: Duration,
    events: Sender<ViewerEvent>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut polls: u64 = 0;
    loop {
        let result = select! {
            _ = cancel.cancelled() => break,
            result = api.status() => result,
        };
        polls += 1;
        if events.send(ViewerEvent::Status(result)).await.is_err() {
            debug!("session closed; stopping status sync");
            break;
        }
        select! {
            _ = cancel.cancelled() => break,
            _ = sleep(interval) => {}
        }
    }
    info!(polls, "status sync stopped");
    Ok(())
}
