use tracing::{debug, info, warn};
use viewer_wire::{Identifier, JobStatus};

use crate::error::ApiError;
use crate::session::ImageReferencePair;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPhase {
    /// No full render adopted yet.
    Pending,
    /// At least one full render adopted; `full` is the latest.
    Ready { full: Identifier },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    Idle,
    ShowFull(Identifier),
    ShowPreview(Identifier),
}

/// Reconciles `/status` answers with the client's image pointers.
///
/// There is no way back from `Ready` and no terminal phase; a full render
/// with a new name (a restarted job) is adopted again.
#[derive(Debug)]
pub struct StatusSync {
    phase: SyncPhase,
    last_error: Option<String>,
}

impl StatusSync {
    pub fn new(adopted_full: Option<Identifier>) -> Self {
        let phase = match adopted_full.filter(|id| !id.is_empty()) {
            Some(full) => SyncPhase::Ready { full },
            None => SyncPhase::Pending,
        };
        Self {
            phase,
            last_error: None,
        }
    }

    pub fn phase(&self) -> &SyncPhase {
        &self.phase
    }

    pub fn reconcile(
        &mut self,
        status: &JobStatus,
        images: &mut ImageReferencePair,
        displaying: bool,
    ) -> SyncAction {
        self.note_server_error(status.error.as_deref());

        if let (true, Some(full)) = (status.done, status.full()) {
            let already_adopted = matches!(&self.phase, SyncPhase::Ready { full: current } if current == full);
            if !already_adopted {
                match &self.phase {
                    SyncPhase::Pending => info!(%full, "full render ready"),
                    SyncPhase::Ready { full: previous } => {
                        info!(%previous, %full, "new full render ready")
                    }
                }
                self.phase = SyncPhase::Ready { full: full.clone() };
                images.full = Some(full.clone());
                if let Some(preview) = status.preview() {
                    images.preview = Some(preview.clone());
                }
                return SyncAction::ShowFull(full.clone());
            }
        }

        match status.preview() {
            Some(preview) if !displaying => {
                debug!(%preview, "nothing displayed; showing preview");
                images.preview = Some(preview.clone());
                SyncAction::ShowPreview(preview.clone())
            }
            _ => SyncAction::Idle,
        }
    }

    /// Forgets the adopted full render so the next finished job is shown even
    /// when the server reuses its name.
    pub fn restart(&mut self) {
        if let SyncPhase::Ready { full } = &self.phase {
            debug!(%full, "job restarted; awaiting a new full render");
        }
        self.phase = SyncPhase::Pending;
    }

    /// A failed poll counts as an empty, not-done answer.
    pub fn poll_failed(&mut self, err: &ApiError) -> SyncAction {
        warn!(error = %err, "status poll failed");
        SyncAction::Idle
    }

    fn note_server_error(&mut self, error: Option<&str>) {
        if error == self.last_error.as_deref() {
            return;
        }
        if let Some(message) = error {
            warn!(error = message, "server reported processing error");
        }
        self.last_error = error.map(str::to_string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(done: bool, preview: Option<&str>, full: Option<&str>) -> JobStatus {
        JobStatus {
            done,
            preview: preview.map(Identifier::from),
            full: full.map(Identifier::from),
            error: None,
        }
    }

    #[test]
    fn preview_shown_when_nothing_displayed() {
        let mut sync = StatusSync::new(None);
        let mut images = ImageReferencePair::default();
        let action = sync.reconcile(&status(false, Some("p1"), None), &mut images, false);
        assert_eq!(action, SyncAction::ShowPreview(Identifier::from("p1")));
        assert_eq!(images.preview, Some(Identifier::from("p1")));
        assert_eq!(sync.phase(), &SyncPhase::Pending);
    }

    #[test]
    fn preview_ignored_while_something_is_displayed() {
        let mut sync = StatusSync::new(None);
        let mut images = ImageReferencePair::default();
        let action = sync.reconcile(&status(false, Some("p1"), None), &mut images, true);
        assert_eq!(action, SyncAction::Idle);
        assert!(images.preview.is_none());
    }

    #[test]
    fn done_with_full_becomes_ready() {
        let mut sync = StatusSync::new(None);
        let mut images = ImageReferencePair::default();
        let action = sync.reconcile(&status(true, Some("p1"), Some("f1")), &mut images, true);
        assert_eq!(action, SyncAction::ShowFull(Identifier::from("f1")));
        assert_eq!(images.full, Some(Identifier::from("f1")));
        assert_eq!(images.preview, Some(Identifier::from("p1")));
        assert_eq!(
            sync.phase(),
            &SyncPhase::Ready {
                full: Identifier::from("f1")
            }
        );
    }

    #[test]
    fn full_without_done_is_not_adopted() {
        let mut sync = StatusSync::new(None);
        let mut images = ImageReferencePair::default();
        let action = sync.reconcile(&status(false, None, Some("f1")), &mut images, true);
        assert_eq!(action, SyncAction::Idle);
        assert_eq!(sync.phase(), &SyncPhase::Pending);
    }

    #[test]
    fn same_full_is_adopted_once_and_new_full_again() {
        let mut sync = StatusSync::new(None);
        let mut images = ImageReferencePair::default();
        let ready = status(true, Some("p1"), Some("f1"));
        assert!(matches!(
            sync.reconcile(&ready, &mut images, true),
            SyncAction::ShowFull(_)
        ));
        assert_eq!(sync.reconcile(&ready, &mut images, true), SyncAction::Idle);

        let restarted = status(true, Some("p2"), Some("f2"));
        assert_eq!(
            sync.reconcile(&restarted, &mut images, true),
            SyncAction::ShowFull(Identifier::from("f2"))
        );
        assert_eq!(images.preview, Some(Identifier::from("p2")));
    }

    #[test]
    fn seeded_full_starts_ready() {
        let mut sync = StatusSync::new(Some(Identifier::from("f0")));
        let mut images = ImageReferencePair::default();
        assert_eq!(
            sync.reconcile(&status(true, None, Some("f0")), &mut images, true),
            SyncAction::Idle
        );
        assert!(matches!(sync.phase(), SyncPhase::Ready { .. }));
    }

    #[test]
    fn restart_readopts_a_reused_full_name() {
        let mut sync = StatusSync::new(None);
        let mut images = ImageReferencePair::default();
        let ready = status(true, Some("p1"), Some("f1"));
        sync.reconcile(&ready, &mut images, true);
        sync.restart();
        assert_eq!(sync.phase(), &SyncPhase::Pending);
        assert_eq!(
            sync.reconcile(&ready, &mut images, true),
            SyncAction::ShowFull(Identifier::from("f1"))
        );
    }

    #[test]
    fn failed_poll_is_idle() {
        let mut sync = StatusSync::new(None);
        let err = ApiError::Http {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(sync.poll_failed(&err), SyncAction::Idle);
        assert_eq!(sync.phase(), &SyncPhase::Pending);
    }
}
