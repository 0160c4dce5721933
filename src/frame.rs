use tracing::{debug, info, warn};

use crate::injector::{InjectError, Injector, InjectorState};
use crate::page::{HostPage, PageError};
use crate::params::ReportParams;

impl<P: HostPage> Injector<P> {
    /// Inject the analysis frame in place of the content region.
    ///
    /// Returns `Ok(false)` when a frame is already open.
    pub fn open(&mut self) -> Result<bool, InjectError> {
        if self.state.frame.is_some() {
            return Ok(false);
        }

        let params = ReportParams::from_location(self.page.location())?;
        let layout = &self.layout;
        if !self.page.contains(&layout.content) {
            return Err(PageError::MissingElement(layout.content.clone()).into());
        }

        let src = params.frame_url(&self.base_url).to_string();
        self.page.remove_body_class(&layout.compare_class)?;
        self.page.set_visible(&layout.content, false)?;
        let frame = self.page.insert_frame(&layout.content, &layout.frame, &src)?;
        if self.page.contains(&layout.trigger) {
            self.page.set_selected(&layout.trigger, true)?;
        }

        info!(%frame, %src, "analysis frame opened");
        self.state.params = Some(params);
        self.state.frame = Some(frame);
        self.state.src = Some(src);
        Ok(true)
    }

    /// Remove the frame and give the host its content region back.
    pub fn close(&mut self) -> Result<bool, InjectError> {
        let Some(frame) = self.state.frame else {
            return Ok(false);
        };
        self.page.remove_frame(frame)?;
        self.state = InjectorState::default();

        let layout = &self.layout;
        if self.page.contains(&layout.content) {
            self.page.set_visible(&layout.content, true)?;
        } else {
            warn!(content = %layout.content, "content region gone; nothing to reveal");
        }
        if self.page.contains(&layout.trigger) {
            self.page.set_selected(&layout.trigger, false)?;
        }

        info!(%frame, "analysis frame closed");
        Ok(true)
    }

    pub(crate) fn retarget(&mut self, params: ReportParams) -> Result<(), PageError> {
        let Some(frame) = self.state.frame else {
            return Ok(());
        };

        let src = params.frame_url(&self.base_url).to_string();
        self.page.set_frame_source(frame, &src)?;

        info!(%frame, %src, "analysis frame retargeted");
        self.state.params = Some(params);
        self.state.src = Some(src);
        Ok(())
    }

    pub fn apply_height(&mut self, px: f64) -> Result<bool, PageError> {
        let Some(frame) = self.state.frame else {
            debug!(px, "height settled with no frame open");
            return Ok(false);
        };
        if !(px.is_finite() && px > 0.0) {
            return Ok(false);
        }

        self.page.set_frame_height(frame, px)?;
        Ok(true)
    }
}
