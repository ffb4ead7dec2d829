//! Post-FINALIZE processing status loop.
//!
//! Some media (video, GIF) is processed by the server after FINALIZE. The
//! poller waits as long as the server asks (`check_after_secs`), issues
//! STATUS, and repeats until the server reports `succeeded` or `failed`.

use std::time::Duration;

use mediadrop_protocol::{ApiResponse, MediaId, ProcessingInfo, ProcessingState, UploadCommand};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::UploadError;
use crate::transport::{Transport, send_command};
use crate::types::UploadEvent;

/// Poll scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Wait before the first STATUS when the server gives no hint.
    pub initial_delay: Duration,
    /// Wait before every later STATUS when the server gives no hint.
    pub subsequent_delay: Duration,
    /// Give up after this many STATUS calls. `None` polls until a terminal
    /// state.
    pub max_polls: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            subsequent_delay: Duration::from_secs(3),
            max_polls: None,
        }
    }
}

impl PollConfig {
    /// Wait before STATUS number `polls_done + 1`.
    pub fn delay_for(&self, info: &ProcessingInfo, polls_done: u32) -> Duration {
        match info.check_after_secs {
            Some(secs) => Duration::from_secs(secs),
            None if polls_done == 0 => self.initial_delay,
            None => self.subsequent_delay,
        }
    }
}

/// Drives STATUS polling for one media id.
pub struct ProcessingPoller<'a, T: Transport + ?Sized> {
    transport: &'a T,
    config: &'a PollConfig,
    events_tx: Option<&'a mpsc::Sender<UploadEvent>>,
}

impl<'a, T: Transport + ?Sized> ProcessingPoller<'a, T> {
    pub fn new(transport: &'a T, config: &'a PollConfig) -> Self {
        Self {
            transport,
            config,
            events_tx: None,
        }
    }

    /// Sends progress events to `events_tx`. The receiver must be drained
    /// concurrently; a full channel blocks polling.
    pub fn with_events(mut self, events_tx: Option<&'a mpsc::Sender<UploadEvent>>) -> Self {
        self.events_tx = events_tx;
        self
    }

    /// Polls until processing settles.
    ///
    /// `response` is the FINALIZE response and `info` its decoded
    /// `processing_info`. Returns the response that carried `succeeded`
    /// (or the first response without `processing_info`).
    pub async fn poll(
        &self,
        media_id: &MediaId,
        response: ApiResponse,
        info: ProcessingInfo,
    ) -> Result<ApiResponse, UploadError> {
        let mut response = response;
        let mut info = info;
        let mut polls: u32 = 0;

        loop {
            match info.state {
                ProcessingState::Succeeded => {
                    info!(media_id = %media_id, polls, "processing succeeded");
                    return Ok(response);
                }
                ProcessingState::Failed => {
                    let message = info.error_message().to_string();
                    warn!(media_id = %media_id, polls, error = %message, "processing failed");
                    return Err(UploadError::ProcessingFailed(message));
                }
                ProcessingState::Pending | ProcessingState::InProgress => {}
            }

            if let Some(max) = self.config.max_polls
                && polls >= max
            {
                warn!(media_id = %media_id, polls, "giving up on processing");
                return Err(UploadError::PollLimit { polls });
            }

            let delay = self.config.delay_for(&info, polls);
            info!(
                media_id = %media_id,
                state = ?info.state,
                progress_percent = info.progress_percent,
                delay_secs = delay.as_secs_f64(),
                "processing in progress"
            );
            self.emit(UploadEvent::Processing {
                media_id: media_id.clone(),
                state: info.state,
                progress_percent: info.progress_percent,
                check_after: delay,
            })
            .await;

            tokio::time::sleep(delay).await;

            response = send_command(self.transport, &UploadCommand::status(media_id)).await?;
            polls += 1;
            debug!(media_id = %media_id, polls, "status received");

            match response.processing_info()? {
                Some(next) => info = next,
                None => {
                    debug!(
                        media_id = %media_id,
                        "status without processing_info, treating as done"
                    );
                    return Ok(response);
                }
            }
        }
    }

    async fn emit(&self, event: UploadEvent) {
        if let Some(tx) = self.events_tx {
            let _ = tx.send(event).await;
        }
    }
}
