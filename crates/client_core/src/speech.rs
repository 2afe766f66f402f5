//! Speech output seam. The session owns one engine and talks to it through [`SpeechEngine`].
//!
//! End-of-utterance notifications arrive out of band: engines are built with a
//! callback and invoke it with the [`UtteranceId`] returned from `speak`.

use shared::domain::UtteranceId;
use thiserror::Error;

#[cfg(feature = "native-speech")]
pub use native::NativeSpeechEngine;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpeechError {
    #[error("speech output is not available: {0}")]
    Unavailable(String),
    #[error("speech backend error: {0}")]
    Backend(String),
}

pub type UtteranceEndHandler = Box<dyn Fn(UtteranceId) + Send + Sync + 'static>;

pub trait SpeechEngine {
    /// Starts speaking `text` and returns the id later passed to the end callback.
    fn speak(&mut self, text: &str) -> Result<UtteranceId, SpeechError>;

    /// Stops whatever is being spoken. Succeeds when nothing is playing.
    fn cancel(&mut self) -> Result<(), SpeechError>;
}

impl<T: SpeechEngine + ?Sized> SpeechEngine for Box<T> {
    fn speak(&mut self, text: &str) -> Result<UtteranceId, SpeechError> {
        (**self).speak(text)
    }

    fn cancel(&mut self) -> Result<(), SpeechError> {
        (**self).cancel()
    }
}

/// Stand-in used when no native backend is compiled in or it failed to start.
#[derive(Debug, Clone)]
pub struct UnavailableSpeechEngine {
    reason: String,
}

impl UnavailableSpeechEngine {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SpeechEngine for UnavailableSpeechEngine {
    fn speak(&mut self, _text: &str) -> Result<UtteranceId, SpeechError> {
        Err(SpeechError::Unavailable(self.reason.clone()))
    }

    fn cancel(&mut self) -> Result<(), SpeechError> {
        Ok(())
    }
}

/// Native engine when the feature is enabled, otherwise [`UnavailableSpeechEngine`].
pub fn platform_speech_engine(on_end: UtteranceEndHandler) -> Box<dyn SpeechEngine> {
    #[cfg(feature = "native-speech")]
    {
        match NativeSpeechEngine::new(on_end) {
            Ok(engine) => Box::new(engine),
            Err(err) => {
                tracing::error!("failed to initialize speech engine: {err}");
                Box::new(UnavailableSpeechEngine::new(err.to_string()))
            }
        }
    }
    #[cfg(not(feature = "native-speech"))]
    {
        drop(on_end);
        tracing::warn!("built without native speech support; playback is disabled");
        Box::new(UnavailableSpeechEngine::new(
            "built without the native-speech feature",
        ))
    }
}

/// The utterance a native backend is currently speaking. It is claimed before the
/// backend is asked to speak so an end reported from inside `speak` still
/// matches; the backend's own id is attached once `speak` returns it.
#[cfg_attr(not(feature = "native-speech"), allow(dead_code))]
#[derive(Debug)]
struct UtteranceSlot<N> {
    current: Option<(Option<N>, UtteranceId)>,
}

#[cfg_attr(not(feature = "native-speech"), allow(dead_code))]
impl<N: PartialEq> UtteranceSlot<N> {
    fn new() -> Self {
        Self { current: None }
    }

    fn begin(&mut self, id: UtteranceId) {
        self.current = Some((None, id));
    }

    /// No-op when `id` already finished or was replaced.
    fn attach(&mut self, id: UtteranceId, native: Option<N>) {
        if let Some((slot, current)) = &mut self.current {
            if *current == id {
                *slot = native;
            }
        }
    }

    /// Claims the current utterance if `finished` belongs to it. Before the
    /// native id is attached any end is taken as ours.
    fn finish(&mut self, finished: &N) -> Option<UtteranceId> {
        let is_current = match &self.current {
            Some((Some(native), _)) => native == finished,
            Some((None, _)) => true,
            None => false,
        };
        if is_current {
            self.current.take().map(|(_, id)| id)
        } else {
            None
        }
    }

    fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(feature = "native-speech")]
mod native {
    use std::sync::{Arc, Mutex};

    use shared::domain::UtteranceId;
    use tracing::{debug, warn};

    use super::{SpeechEngine, SpeechError, UtteranceEndHandler, UtteranceSlot};

    type CurrentUtterance = Arc<Mutex<UtteranceSlot<tts::UtteranceId>>>;

    fn with_slot<R>(
        current: &CurrentUtterance,
        f: impl FnOnce(&mut UtteranceSlot<tts::UtteranceId>) -> R,
    ) -> Option<R> {
        match current.lock() {
            Ok(mut guard) => Some(f(&mut guard)),
            Err(_) => {
                warn!("utterance slot lock poisoned");
                None
            }
        }
    }

    pub struct NativeSpeechEngine {
        tts: tts::Tts,
        next_id: u64,
        current: CurrentUtterance,
    }

    impl NativeSpeechEngine {
        pub fn new(on_end: UtteranceEndHandler) -> Result<Self, SpeechError> {
            let tts = tts::Tts::default().map_err(|err| SpeechError::Backend(err.to_string()))?;
            let current: CurrentUtterance = Arc::new(Mutex::new(UtteranceSlot::new()));

            if tts.supported_features().utterance_callbacks {
                let slot = Arc::clone(&current);
                tts.on_utterance_end(Some(Box::new(move |finished: tts::UtteranceId| {
                    if let Some(id) = with_slot(&slot, |slot| slot.finish(&finished)).flatten() {
                        on_end(id);
                    }
                })))
                .map_err(|err| SpeechError::Backend(err.to_string()))?;
            } else {
                warn!("speech backend does not report utterance completion; playback clears on stop");
            }

            Ok(Self {
                tts,
                next_id: 1,
                current,
            })
        }
    }

    impl SpeechEngine for NativeSpeechEngine {
        fn speak(&mut self, text: &str) -> Result<UtteranceId, SpeechError> {
            let id = UtteranceId(self.next_id);
            self.next_id += 1;

            with_slot(&self.current, |slot| slot.begin(id));
            match self.tts.speak(text, true) {
                Ok(native) => {
                    with_slot(&self.current, |slot| slot.attach(id, native));
                }
                Err(err) => {
                    with_slot(&self.current, UtteranceSlot::clear);
                    return Err(SpeechError::Backend(err.to_string()));
                }
            }
            debug!(utterance = %id, chars = text.chars().count(), "speaking");
            Ok(id)
        }

        fn cancel(&mut self) -> Result<(), SpeechError> {
            with_slot(&self.current, UtteranceSlot::clear);
            self.tts
                .stop()
                .map(|_| ())
                .map_err(|err| SpeechError::Backend(err.to_string()))
        }
    }
}
