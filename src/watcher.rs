use std::future::Future;

use tokio::sync::watch;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::height::HeightSync;
use crate::injector::Injector;
use crate::page::{HostPage, HostSnapshot};
use crate::protocol::HostEvent;
use crate::state::Status;

/// Source of host page events.
///
/// The host app exposes no routing events, so mutation batches stand in for
/// navigation. Each batch arrives already coalesced by the observer.
pub trait ChangeNotifier {
    /// The next host event, or `None` once the host page is gone.
    ///
    /// Must be cancel safe: an event is only consumed when it is returned.
    fn next_event(&mut self) -> impl Future<Output = Option<HostEvent>>;

    fn unsubscribe(&mut self);
}

/// Routes host events into the injector and drives height sync.
pub struct Watcher<P> {
    injector: Injector<P>,
    heights: HeightSync,
    status: watch::Sender<Status>,
    passes: u64,
    failed_passes: u64,
}

impl<P: HostPage> Watcher<P> {
    pub fn new(injector: Injector<P>, quiet: Duration) -> (Self, watch::Receiver<Status>) {
        let (status, rx) = watch::channel(Status::default());
        let watcher = Self {
            injector,
            heights: HeightSync::new(quiet),
            status,
            passes: 0,
            failed_passes: 0,
        };
        (watcher, rx)
    }

    pub fn injector(&self) -> &Injector<P> {
        &self.injector
    }

    /// Reconcile once eagerly, then on every event until the host goes away.
    pub async fn run<N: ChangeNotifier>(&mut self, notifier: &mut N) {
        self.reconcile();
        self.publish();

        loop {
            tokio::select! {
                event = notifier.next_event() => match event {
                    Some(event) => self.dispatch(event),
                    None => {
                        info!("host page closed the session");
                        break;
                    }
                },
                px = self.heights.settled() => self.resize(px),
            }
            self.publish();
        }

        notifier.unsubscribe();
    }

    pub fn dispatch(&mut self, event: HostEvent) {
        match event {
            HostEvent::Ready(snapshot) | HostEvent::Mutations(snapshot) => {
                self.refresh(snapshot);
                self.reconcile();
            }
            HostEvent::TriggerActivated(snapshot) => {
                self.refresh(snapshot);
                match self.injector.open() {
                    Ok(true) => {}
                    Ok(false) => debug!("trigger activated with frame already open"),
                    Err(err) => warn!(%err, "could not open analysis frame"),
                }
            }
            HostEvent::TabActivated(snapshot) => {
                self.refresh(snapshot);
                if let Err(err) = self.injector.close() {
                    warn!(%err, "could not close analysis frame");
                }
            }
            HostEvent::FrameMessage { data } => self.heights.receive(data),
        }
    }

    fn refresh(&mut self, snapshot: HostSnapshot) {
        self.injector.page_mut().refresh(snapshot);
    }

    fn reconcile(&mut self) {
        self.passes += 1;
        match self.injector.reconcile() {
            Ok(outcome) => debug!(?outcome, "reconciled"),
            Err(err) => {
                self.failed_passes += 1;
                warn!(%err, "reconciliation pass failed");
            }
        }
    }

    fn resize(&mut self, px: Option<f64>) {
        let Some(px) = px else {
            return;
        };
        match self.injector.apply_height(px) {
            Ok(true) => debug!(px, "frame resized"),
            Ok(false) => {}
            Err(err) => warn!(%err, px, "could not resize frame"),
        }
    }

    fn publish(&self) {
        let injector = &self.injector;
        self.status.send_replace(Status {
            phase: injector.phase(),
            location: injector.page().location().to_string(),
            params: injector.params().map(|params| params.snapshot()),
            frame: injector.frame(),
            frame_src: injector.frame_src().map(str::to_owned),
            passes: self.passes,
            failed_passes: self.failed_passes,
            height_pending: self.heights.is_pending(),
        });
    }
}
