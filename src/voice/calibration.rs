//! Speaking-rate calibration
//!
//! Speed settings mean different things per backend (words per minute for
//! espeak-ng and the OS engines, nothing at all for neural models), so the
//! only comparable figure is the rate measured from real output. Calibration
//! speaks a fixed phrase through any [`Voice`] and measures the WAV it wrote.

use super::Voice;
use crate::{audio, Result};
use log::info;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where [`Voice::calibrate_rate`] writes its reference recording
pub const CALIBRATION_OUTPUT: &str = "./output/calibration.wav";

const NARRATIVE: &str = "At the edge of the harbour stood a small white lighthouse, \
and every evening the keeper climbed its spiral stairs to light the lamp. \
Fishing boats returning late would look for the steady beam sweeping across the water, \
and the children of the village would count its flashes from their windows before falling asleep. \
On stormy nights the keeper stayed awake until dawn, listening to the waves break against \
the rocks and writing in a worn leather logbook the names of every boat that came safely home. \
When the old keeper finally retired, the whole village gathered on the pier to thank him, \
and for the first time in forty years someone else climbed the stairs to light the lamp.";

const DEFINITION: &str = "A kettle is a vessel used for boiling water, usually made of \
metal or plastic, with a lid, a handle and a spout. Some kettles are heated on a stove, \
while electric kettles contain their own heating element and switch off automatically \
once the water boils.";

const MONOLOGUE: &str = "Good morning, and welcome aboard the early train to the coast. \
Before we leave the station, I would like to tell you a little about the journey ahead. \
For the first hour we will follow the river through farmland and small market towns, \
where you may see herons standing in the shallows and cattle grazing along the banks. \
After crossing the old stone viaduct, the line climbs into the hills, and on a clear day \
you can see the distant mountains to the north, still capped with snow well into spring. \
Shortly after the tunnel, please look out of the windows on the right hand side, because \
the valley opens up and the sea appears for the first time, grey and silver under the morning sky. \
The refreshment trolley will pass through the carriages twice, once after the viaduct and again \
before we reach the coast, offering tea, coffee, sandwiches and fresh pastries from the \
bakery in town. We expect to arrive on time, a few minutes before ten o'clock. \
Please keep your belongings with you, mind the gap when leaving the train, \
and thank you for travelling with us today. We hope you enjoy the view.";

/// Reference phrases available for calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationPhrase {
    /// Long narrative passage
    Narrative,
    /// Short definitional passage
    Definition,
    /// Long narrative monologue, used by default
    #[default]
    Monologue,
}

impl CalibrationPhrase {
    pub fn text(&self) -> &'static str {
        match self {
            CalibrationPhrase::Narrative => NARRATIVE,
            CalibrationPhrase::Definition => DEFINITION,
            CalibrationPhrase::Monologue => MONOLOGUE,
        }
    }
}

/// Measured speaking rate of one configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationResult {
    pub words_per_minute: f64,
    /// Phrase that was spoken
    pub phrase: &'static str,
    /// Duration of the written recording
    pub duration: Duration,
    /// Where the recording was written
    pub path: PathBuf,
}

/// Words per minute of `text` spoken over `duration_secs`
///
/// Words are whitespace-separated. A non-positive duration gives 0.0.
pub fn words_per_minute(text: &str, duration_secs: f64) -> f64 {
    if duration_secs <= 0.0 {
        return 0.0;
    }
    text.split_whitespace().count() as f64 / duration_secs * 60.0
}

/// Speak `phrase` through `voice` into `path` and measure the result
pub fn calibrate<V: Voice + ?Sized>(
    voice: &mut V,
    phrase: CalibrationPhrase,
    path: &Path,
) -> Result<CalibrationResult> {
    let text = phrase.text();
    voice.speak(text, Some(path))?;

    let duration = audio::wav_duration(path)?;
    let wpm = words_per_minute(text, duration.as_secs_f64());
    info!(
        "{} voice '{}' speaks at {:.1} wpm ({:.2}s)",
        voice.voice_type(),
        voice.name(),
        wpm,
        duration.as_secs_f64()
    );

    Ok(CalibrationResult {
        words_per_minute: wpm,
        phrase: text,
        duration,
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_per_minute_exact() {
        assert_eq!(words_per_minute("the quick brown fox", 4.0), 60.0);
        assert_eq!(words_per_minute("one two three", 1.5), 120.0);
    }

    #[test]
    fn test_words_per_minute_ignores_extra_whitespace() {
        assert_eq!(words_per_minute("  the  quick\nbrown\tfox ", 2.0), 120.0);
    }

    #[test]
    fn test_words_per_minute_zero_duration() {
        assert_eq!(words_per_minute("hello", 0.0), 0.0);
        assert_eq!(words_per_minute("hello", -3.0), 0.0);
    }

    #[test]
    fn test_phrases() {
        let words = |p: CalibrationPhrase| p.text().split_whitespace().count();
        let long = words(CalibrationPhrase::Narrative);
        let short = words(CalibrationPhrase::Definition);
        let default = words(CalibrationPhrase::default());
        assert!(short < long);
        assert!(short < default);
        assert_eq!(CalibrationPhrase::default(), CalibrationPhrase::Monologue);
    }
}
