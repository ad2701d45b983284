use serde::Deserialize;

/// Tunables shared by every extractor. Hosts typically deserialize this from
/// their own settings file; every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractorConfig {
    /// How many bytes before a call are searched for `await` / `yield` when
    /// deciding whether the call is awaited on the spot.
    pub await_window: usize,
    /// Input parameter name assumed when no workflow signature is found.
    pub fallback_input_name: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            await_window: 16,
            fallback_input_name: "input".to_string(),
        }
    }
}

impl ExtractorConfig {
    pub fn with_await_window(mut self, bytes: usize) -> Self {
        self.await_window = bytes;
        self
    }

    pub fn with_fallback_input_name(mut self, name: impl Into<String>) -> Self {
        self.fallback_input_name = name.into();
        self
    }

    /// Parses a JSON settings fragment, e.g. `{"awaitWindow": 24}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
