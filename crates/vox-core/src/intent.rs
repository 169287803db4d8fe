//! Intent schema — the closed vocabulary of recognized command intents.
//!
//! The model is instructed to emit exactly one of these wire tags. Anything
//! else it invents is coerced to [`IntentKind::General`] here, in one place,
//! rather than scattered default-cases in the orchestrator.

use serde::{Deserialize, Serialize};

/// What action a command maps to.
///
/// Wire tags match the strings the prompt instructs the model to emit
/// (e.g. `google-search`, `calculator-open`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentKind {
    /// Plain conversational answer; also the coercion target for unknown tags.
    #[default]
    #[serde(rename = "general")]
    General,
    /// Open a web search for the extracted query.
    #[serde(rename = "google-search")]
    GoogleSearch,
    /// Search videos for the extracted query.
    #[serde(rename = "youtube-search")]
    YoutubeSearch,
    /// Play a video matching the extracted query.
    #[serde(rename = "youtube-play")]
    YoutubePlay,
    /// Speak the current time.
    #[serde(rename = "get-time")]
    GetTime,
    /// Speak the current date.
    #[serde(rename = "get-date")]
    GetDate,
    /// Speak the current weekday.
    #[serde(rename = "get-day")]
    GetDay,
    /// Speak the current month.
    #[serde(rename = "get-month")]
    GetMonth,
    /// Open the calculator.
    #[serde(rename = "calculator-open")]
    CalculatorOpen,
    /// Open Instagram.
    #[serde(rename = "instagram-open")]
    InstagramOpen,
    /// Open Facebook.
    #[serde(rename = "facebook-open")]
    FacebookOpen,
    /// Show the weather.
    #[serde(rename = "weather-show")]
    WeatherShow,
}

impl IntentKind {
    /// All kinds, in prompt-vocabulary order.
    pub const ALL: [IntentKind; 12] = [
        IntentKind::General,
        IntentKind::GoogleSearch,
        IntentKind::YoutubeSearch,
        IntentKind::YoutubePlay,
        IntentKind::GetTime,
        IntentKind::GetDate,
        IntentKind::GetDay,
        IntentKind::GetMonth,
        IntentKind::CalculatorOpen,
        IntentKind::InstagramOpen,
        IntentKind::FacebookOpen,
        IntentKind::WeatherShow,
    ];

    /// Parse a wire tag, coercing anything unrecognized to [`IntentKind::General`].
    ///
    /// The model occasionally invents tags (`"search"`, `"time"`, typos); the
    /// contract is that an unknown tag degrades to a general reply instead of
    /// failing the whole interpretation.
    #[must_use]
    pub fn coerce(tag: &str) -> Self {
        Self::from_tag(tag).unwrap_or_else(|| {
            tracing::warn!(tag, "unknown intent tag, coercing to general");
            IntentKind::General
        })
    }

    /// Parse a wire tag exactly; `None` for anything outside the vocabulary.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "general" => Some(IntentKind::General),
            "google-search" => Some(IntentKind::GoogleSearch),
            "youtube-search" => Some(IntentKind::YoutubeSearch),
            "youtube-play" => Some(IntentKind::YoutubePlay),
            "get-time" => Some(IntentKind::GetTime),
            "get-date" => Some(IntentKind::GetDate),
            "get-day" => Some(IntentKind::GetDay),
            "get-month" => Some(IntentKind::GetMonth),
            "calculator-open" => Some(IntentKind::CalculatorOpen),
            "instagram-open" => Some(IntentKind::InstagramOpen),
            "facebook-open" => Some(IntentKind::FacebookOpen),
            "weather-show" => Some(IntentKind::WeatherShow),
            _ => None,
        }
    }

    /// The wire tag for this kind.
    #[must_use]
    pub fn as_tag(self) -> &'static str {
        match self {
            IntentKind::General => "general",
            IntentKind::GoogleSearch => "google-search",
            IntentKind::YoutubeSearch => "youtube-search",
            IntentKind::YoutubePlay => "youtube-play",
            IntentKind::GetTime => "get-time",
            IntentKind::GetDate => "get-date",
            IntentKind::GetDay => "get-day",
            IntentKind::GetMonth => "get-month",
            IntentKind::CalculatorOpen => "calculator-open",
            IntentKind::InstagramOpen => "instagram-open",
            IntentKind::FacebookOpen => "facebook-open",
            IntentKind::WeatherShow => "weather-show",
        }
    }

    /// True for the four clock/date kinds whose response text is computed
    /// locally instead of trusting the model.
    #[must_use]
    pub fn is_calendar(self) -> bool {
        matches!(
            self,
            IntentKind::GetTime | IntentKind::GetDate | IntentKind::GetDay | IntentKind::GetMonth
        )
    }

    /// True for kinds that carry a search query to a search/video page.
    #[must_use]
    pub fn needs_search_query(self) -> bool {
        matches!(
            self,
            IntentKind::GoogleSearch | IntentKind::YoutubeSearch | IntentKind::YoutubePlay
        )
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
