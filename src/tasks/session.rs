use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::api::ViewerApi;
use crate::events::ViewerEvent;
use crate::session::{Request, Session};
use crate::surface::Surface;

/// Owns the [`Session`] and applies events strictly in arrival order.
///
/// Requests the session emits run concurrently; each posts its outcome back
/// through `feedback` as a new event. Nothing deduplicates them, so a second
/// apply or start issued before the first answers is sent as well.
#[instrument(skip_all, name = "session")]
pub async fn run<A: ViewerApi, S: Surface>(
    mut session: Session<S>,
    api: A,
    feedback: Sender<ViewerEvent>,
    mut events: Receiver<ViewerEvent>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut in_flight = JoinSet::new();

    if let Some(request) = session.begin() {
        dispatch(&api, request, &feedback, &mut in_flight, &cancel);
    }

    loop {
        select! {
            _ = cancel.cancelled() => break,

            event = events.recv() => {
                let Some(event) = event else {
                    debug!("event channel closed");
                    break;
                };
                if let Some(request) = session.handle(event) {
                    dispatch(&api, request, &feedback, &mut in_flight, &cancel);
                }
            }

            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(err) = joined {
                    warn!(error = %err, "request task failed");
                }
            }
        }
    }

    in_flight.shutdown().await;
    info!(report = %session.report(), "session stopped");
    Ok(())
}

fn dispatch<A: ViewerApi>(
    api: &A,
    request: Request,
    feedback: &Sender<ViewerEvent>,
    in_flight: &mut JoinSet<()>,
    cancel: &CancellationToken,
) {
    debug!(?request, "dispatching request");
    let api = api.clone();
    let feedback = feedback.clone();
    let cancel = cancel.clone();
    in_flight.spawn(async move {
        let outcome = async {
            match request {
                Request::FetchImage(request) => {
                    let result = api.fetch_image(request.clone()).await;
                    ViewerEvent::ImageFetched { request, result }
                }
                Request::Start(request) => ViewerEvent::JobStarted(api.start(request).await),
                Request::ApplyFilter(request) => {
                    ViewerEvent::FilterApplied(api.apply_filter(request).await)
                }
            }
        };
        let event = select! {
            _ = cancel.cancelled() => return,
            event = outcome => event,
        };
        if feedback.send(event).await.is_err() {
            debug!("session gone before response arrived");
        }
    });
}
