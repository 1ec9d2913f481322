//! Requested voice configuration and progress reporting

/// A requested configuration
///
/// Plain data; each backend applies the fields it understands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceParams {
    /// Voice name or model identifier
    pub voice: Option<String>,
    pub pitch: Option<f32>,
    /// Speed in the backend's own units
    pub speed: Option<f32>,
    /// Speaker of a multi-speaker model
    pub speaker: Option<String>,
    pub language: Option<String>,
}

impl VoiceParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn pitch(mut self, pitch: f32) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Checkpoint reported during a long-running operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    /// Percentage complete, 0-100
    Percent(u8),
    /// Operation finished
    Done,
}

impl ProgressStatus {
    /// Numeric form: the percentage, or -1 when done
    pub fn code(&self) -> i32 {
        match self {
            ProgressStatus::Percent(p) => i32::from(*p),
            ProgressStatus::Done => -1,
        }
    }
}

/// Caller-supplied progress callback, invoked synchronously on the calling thread
pub type ProgressReporter<'a> = &'a mut dyn FnMut(ProgressStatus, &str);
