//! Read-aloud of bot messages.
//!
//! There is one speech channel for the whole client. Only one utterance is
//! ever audible: starting a new one, receiving a new bot response and
//! shutting down all stop the current one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Output device for synthesized speech.
pub trait SpeechChannel: Send + Sync {
    fn speak(&self, utterance_id: u64, text: &str);

    /// Cancels whatever is being spoken.
    fn cancel(&self);
}

/// Channel for terminals without speech output.
#[derive(Debug, Default)]
pub struct SilentSpeech;

impl SpeechChannel for SilentSpeech {
    fn speak(&self, utterance_id: u64, text: &str) {
        tracing::debug!(
            "[SilentSpeech] Utterance {} ({} chars) not spoken",
            utterance_id,
            text.len()
        );
    }

    fn cancel(&self) {}
}

pub struct ReadAloud {
    channel: Arc<dyn SpeechChannel>,
    current: Mutex<Option<u64>>,
    next_id: AtomicU64,
}

impl ReadAloud {
    pub fn new(channel: Arc<dyn SpeechChannel>) -> Self {
        Self {
            channel,
            current: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Speaks `text`, stopping any previous utterance first.
    pub fn read_aloud(&self, text: &str) -> u64 {
        self.stop_all_speech();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut current) = self.current.lock() {
            *current = Some(id);
        }
        self.channel.speak(id, text);
        id
    }

    /// Cancels any in-flight utterance.
    pub fn stop_all_speech(&self) {
        let stopped = self.current.lock().ok().and_then(|mut current| current.take());
        if let Some(id) = stopped {
            tracing::debug!("[ReadAloud] Stopping utterance {}", id);
        }
        self.channel.cancel();
    }

    /// Called by the channel when an utterance ends on its own.
    pub fn finished(&self, utterance_id: u64) {
        if let Ok(mut current) = self.current.lock() {
            if *current == Some(utterance_id) {
                *current = None;
            }
        }
    }

    pub fn speaking(&self) -> Option<u64> {
        self.current.lock().ok().and_then(|current| *current)
    }
}
