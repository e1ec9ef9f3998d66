//! The translation capability behind the sync engine. The engine only sees
//! the [`Translator`] trait; the DeepL HTTP client lives here so that rate
//! limiting and credentials never leak into the sync logic.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api-free.deepl.com";
const DEFAULT_RATE_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("missing DEEPL_API_KEY in environment")]
    MissingApiKey,
    #[error("translation request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("translation service returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("translation response contained no translations")]
    EmptyResponse,
}

/// Options forwarded verbatim to the provider. `tag_handling = "xml"` plus
/// `ignore_tags = ["ph"]` is how shielded placeholders survive the round trip.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TranslateOptions {
    pub tag_handling: Option<String>,
    pub ignore_tags: Vec<String>,
}

impl TranslateOptions {
    pub fn xml_ignoring(tag: &str) -> Self {
        TranslateOptions {
            tag_handling: Some("xml".to_string()),
            ignore_tags: vec![tag.to_string()],
        }
    }
}

/// One fallible, rate-limited call. Implementations must be safe to invoke
/// strictly sequentially; docloc never issues concurrent calls.
pub trait Translator {
    fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        options: &TranslateOptions,
    ) -> Result<String, TranslateError>;
}

#[derive(Debug, Serialize)]
struct DeepLRequest<'a> {
    text: [&'a str; 1],
    source_lang: &'a str,
    target_lang: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag_handling: Option<&'a str>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    ignore_tags: &'a [String],
}

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}

pub struct DeepLClient {
    api_key: String,
    api_url: String,
    rate_delay: Duration,
    client: reqwest::blocking::Client,
}

impl DeepLClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        DeepLClient {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            rate_delay: DEFAULT_RATE_DELAY,
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Build a client from `DEEPL_API_KEY` / `DEEPL_API_URL`. Missing key is
    /// a configuration failure and must abort the run before any work starts.
    pub fn from_env() -> Result<Self, TranslateError> {
        let key = std::env::var("DEEPL_API_KEY").map_err(|_| TranslateError::MissingApiKey)?;
        let mut c = DeepLClient::new(key);
        if let Ok(url) = std::env::var("DEEPL_API_URL") {
            c.api_url = url;
        }
        Ok(c)
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_rate_delay(mut self, delay: Duration) -> Self {
        self.rate_delay = delay;
        self
    }
}

impl Translator for DeepLClient {
    fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        options: &TranslateOptions,
    ) -> Result<String, TranslateError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let request = DeepLRequest {
            text: [text],
            source_lang,
            target_lang,
            tag_handling: options.tag_handling.as_deref(),
            ignore_tags: &options.ignore_tags,
        };

        let response = self
            .client
            .post(format!("{}/v2/translate", self.api_url))
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&request)
            .send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(TranslateError::Api { status, body });
        }

        let parsed: DeepLResponse = response.json()?;
        let translated = parsed
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or(TranslateError::EmptyResponse)?;

        // Courtesy pause between calls to stay under the provider rate limit.
        std::thread::sleep(self.rate_delay);

        tracing::debug!(
            event = "translate_call",
            target = target_lang,
            chars = text.len()
        );
        Ok(translated)
    }
}
