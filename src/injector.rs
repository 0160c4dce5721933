use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::config::PageLayout;
use crate::equality::is_equal;
use crate::page::{FrameHandle, HostPage, PageError};
use crate::params::{ExtractError, ReportParams};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    #[default]
    Closed,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NotReportView,
    Idle,
    Unchanged,
    Retargeted,
}

#[derive(Debug, Error)]
pub enum InjectError {
    #[error(transparent)]
    Page(#[from] PageError),
    #[error("not a report view: {0}")]
    NotReportView(#[from] ExtractError),
}

/// What is currently injected. `frame` is set exactly while the frame is open,
/// and `params`/`src` describe what it shows.
#[derive(Debug, Default)]
pub(crate) struct InjectorState {
    pub(crate) params: Option<ReportParams>,
    pub(crate) frame: Option<FrameHandle>,
    pub(crate) src: Option<String>,
}

/// Keeps the trigger tab and analysis frame in step with the host location.
///
/// Owns the page and all injection state for one page session. Handlers run one
/// at a time on the event loop, so nothing here is shared.
pub struct Injector<P> {
    pub(crate) page: P,
    pub(crate) layout: PageLayout,
    pub(crate) base_url: Url,
    pub(crate) state: InjectorState,
}

impl<P: HostPage> Injector<P> {
    pub fn new(page: P, layout: PageLayout, base_url: Url) -> Self {
        Self {
            page,
            layout,
            base_url,
            state: InjectorState::default(),
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn phase(&self) -> Phase {
        if self.state.frame.is_some() {
            Phase::Open
        } else {
            Phase::Closed
        }
    }

    pub fn params(&self) -> Option<&ReportParams> {
        self.state.params.as_ref()
    }

    pub fn frame(&self) -> Option<FrameHandle> {
        self.state.frame
    }

    pub fn frame_src(&self) -> Option<&str> {
        self.state.src.as_deref()
    }

    /// Bring injected UI in line with the current location.
    ///
    /// Safe to call on every mutation batch: a pass that finds nothing to do
    /// leaves the page untouched. It never opens the frame.
    pub fn reconcile(&mut self) -> Result<Outcome, InjectError> {
        let params = match ReportParams::from_location(self.page.location()) {
            Ok(params) => params,
            Err(reason) => {
                debug!(%reason, "not a report view");
                self.teardown()?;
                return Ok(Outcome::NotReportView);
            }
        };

        let outcome = if self.state.frame.is_none() {
            Outcome::Idle
        } else if self
            .state
            .params
            .as_ref()
            .is_some_and(|current| is_equal(&current.snapshot(), &params.snapshot()))
        {
            Outcome::Unchanged
        } else {
            self.retarget(params)?;
            Outcome::Retargeted
        };

        self.show_trigger()?;
        Ok(outcome)
    }

    fn teardown(&mut self) -> Result<(), InjectError> {
        if self.page.contains(&self.layout.trigger) {
            self.page.set_visible(&self.layout.trigger, false)?;
        }
        self.close()?;
        Ok(())
    }

    fn show_trigger(&mut self) -> Result<(), PageError> {
        let layout = &self.layout;
        if self.page.contains(&layout.trigger) {
            return self.page.set_visible(&layout.trigger, true);
        }
        if !self.page.contains(&layout.tab_bar) {
            return Err(PageError::MissingElement(layout.tab_bar.clone()));
        }
        self.page
            .insert_trigger(&layout.tab_bar, &layout.trigger, &layout.trigger_label)?;
        info!(trigger = %layout.trigger, "trigger tab injected");
        Ok(())
    }
}
