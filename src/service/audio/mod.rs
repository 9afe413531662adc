//! Audio capture.
//!
//! The device itself is an external collaborator behind [`GenericAudioSource`].
//! [`Recorder`] owns the capture session: at most one recording is active, and
//! the device is released on every exit path.

use std::{
    ops::Deref,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::base::types::{AssistantError, Res, Void};

// Traits.

/// Generic audio source trait that devices must implement.
#[async_trait]
pub trait GenericAudioSource: Send + Sync + 'static {
    /// Acquire the microphone and begin capturing.
    ///
    /// Failing here means the device could not be acquired (e.g., permission denied).
    async fn start(&self) -> Void;

    /// Stop capturing and return the recorded audio.
    async fn stop(&self) -> Res<Vec<u8>>;

    /// Release the device; must be safe to call in any state.
    fn release(&self);
}

// Structs.

/// Audio source for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct AudioClient {
    inner: Arc<dyn GenericAudioSource>,
}

impl Deref for AudioClient {
    type Target = dyn GenericAudioSource;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl AudioClient {
    pub fn new(inner: Arc<dyn GenericAudioSource>) -> Self {
        Self { inner }
    }

    /// A source for hosts without a capture device.
    pub fn unavailable() -> Self {
        Self::new(Arc::new(NoDevice))
    }
}

/// A single-session recorder over an audio source.
pub struct Recorder {
    source: AudioClient,
    active: AtomicBool,
}

impl Recorder {
    pub fn new(source: AudioClient) -> Self {
        Self {
            source,
            active: AtomicBool::new(false),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Begin a recording session.
    ///
    /// Rejected while another session is active. A device failure releases the
    /// device and is reported as a permission failure.
    #[instrument(name = "Recorder::start", skip_all)]
    pub async fn start(&self) -> Void {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(AssistantError::validation("A recording is already in progress."));
        }

        if let Err(err) = self.source.start().await {
            warn!("Could not start recording: {err:#}");

            self.source.release();
            self.active.store(false, Ordering::SeqCst);

            return Err(AssistantError::permission("Could not access microphone. Please grant permission."));
        }

        info!("Recording started.");

        Ok(())
    }

    /// End the active recording session and return its audio.
    #[instrument(name = "Recorder::stop", skip_all)]
    pub async fn stop(&self) -> Res<Vec<u8>> {
        if !self.is_recording() {
            return Err(AssistantError::validation("No recording is in progress."));
        }

        let result = self.source.stop().await;

        self.source.release();
        self.active.store(false, Ordering::SeqCst);

        match result {
            Ok(audio) => {
                info!("Recording stopped ({} bytes).", audio.len());
                Ok(audio)
            }
            Err(err) => {
                warn!("Could not stop recording: {err:#}");
                Err(AssistantError::transport("Failed to process voice recording."))
            }
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if self.is_recording() {
            self.source.release();
        }
    }
}

// Specific implementations.

/// The audio source of a host with no microphone; every start is refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDevice;

#[async_trait]
impl GenericAudioSource for NoDevice {
    async fn start(&self) -> Void {
        Err(anyhow::anyhow!("no audio input device is available"))
    }

    async fn stop(&self) -> Res<Vec<u8>> {
        Ok(Vec::new())
    }

    fn release(&self) {}
}

// Tests.
