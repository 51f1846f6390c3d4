//! Provider capability probing.
//!
//! The models-listing endpoint is the only portable way to fingerprint an
//! OpenAI-compatible backend. The probe tries several credential-header
//! combinations (some gateways reject unexpected auth headers outright) and
//! falls back to successively shorter base-path prefixes, because some APIs
//! serve `/models` above their versioned sub-path.

use std::time::Duration;

use serde::Deserialize;

use crate::url::{models_url, probe_prefixes};

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Named providers recognized by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    DeepSeek,
    Vllm,
    OpenRouter,
    Unknown,
}

/// Whether a probed capability is known to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogprobSupport {
    Supported,
    Unsupported,
    Unknown,
}

/// How prefill text must be encoded for chat requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefillEncoding {
    /// A trailing assistant message is continued as-is.
    AssistantTail,
    /// The trailing assistant message carries a vendor flag marking it as a
    /// continuation rather than a completed turn.
    MessageFlag { key: &'static str },
    /// The request body carries continuation flags.
    BodyFlags {
        flags: &'static [(&'static str, bool)],
    },
    /// Chat prefill is not supported by this provider.
    Unsupported,
    Unknown,
}

/// Capability descriptor consumed by the query step. This is pure data;
/// an unknown backend is a valid descriptor, not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderCapabilities {
    pub provider: Provider,
    pub logprobs: LogprobSupport,
    pub prefill: PrefillEncoding,
    /// Vendor-required temperature override for logprob-only querying.
    /// Folklore encoded as data; greedy decoding is still intended.
    pub needs_temperature: Option<f64>,
}

impl ProviderCapabilities {
    pub fn unknown() -> Self {
        Self {
            provider: Provider::Unknown,
            logprobs: LogprobSupport::Unknown,
            prefill: PrefillEncoding::Unknown,
            needs_temperature: None,
        }
    }

    pub fn for_provider(provider: Provider) -> Self {
        match provider {
            Provider::OpenAi => Self {
                provider,
                logprobs: LogprobSupport::Supported,
                prefill: PrefillEncoding::Unsupported,
                needs_temperature: None,
            },
            Provider::DeepSeek => Self {
                provider,
                logprobs: LogprobSupport::Supported,
                prefill: PrefillEncoding::MessageFlag { key: "prefix" },
                needs_temperature: Some(1.0),
            },
            Provider::Vllm => Self {
                provider,
                logprobs: LogprobSupport::Supported,
                prefill: PrefillEncoding::BodyFlags {
                    flags: &[
                        ("continue_final_message", true),
                        ("add_generation_prompt", false),
                    ],
                },
                needs_temperature: None,
            },
            Provider::OpenRouter => Self {
                provider,
                logprobs: LogprobSupport::Unknown,
                prefill: PrefillEncoding::AssistantTail,
                needs_temperature: None,
            },
            Provider::Unknown => Self::unknown(),
        }
    }
}

/// One entry of a `/models` listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub owned_by: String,
}

/// Parsed `/models` listing payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelsPayload {
    #[serde(default)]
    pub data: Vec<ModelEntry>,
}

/// Classify a models listing into a provider by owner strings and model ids.
pub fn classify_models_payload(payload: &ModelsPayload) -> Provider {
    let mut openai_signature = false;
    for entry in &payload.data {
        let id = entry.id.to_ascii_lowercase();
        let owner = entry.owned_by.to_ascii_lowercase();

        if owner.contains("deepseek") || id.starts_with("deepseek") {
            return Provider::DeepSeek;
        }
        if owner.contains("vllm") {
            return Provider::Vllm;
        }
        if owner.contains("openrouter") || id.contains("openrouter") {
            return Provider::OpenRouter;
        }
        if owner == "openai" || owner == "openai-internal" || owner == "system" {
            openai_signature = true;
        }
        if id.starts_with("gpt-") || id.starts_with("o1") || id.starts_with("o3") {
            openai_signature = true;
        }
    }

    if openai_signature {
        Provider::OpenAi
    } else {
        Provider::Unknown
    }
}

/// Probe a backend and return its capability descriptor.
///
/// Unreachable or unrecognizable backends degrade to
/// [`ProviderCapabilities::unknown`]; callers must handle unknown gracefully.
pub async fn detect_capabilities(base_url: &str, api_key: &str) -> ProviderCapabilities {
    let http = match reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() {
        Ok(http) => http,
        Err(error) => {
            log::warn!("capability probe could not build a client: {error}");
            return ProviderCapabilities::unknown();
        }
    };

    for prefix in probe_prefixes(base_url) {
        let url = models_url(&prefix);
        match probe_models_endpoint(&http, &url, api_key).await {
            Some(payload) => {
                let provider = classify_models_payload(&payload);
                if provider != Provider::Unknown {
                    return ProviderCapabilities::for_provider(provider);
                }
                log::debug!("models listing at {url} had no recognizable signature");
            }
            None => log::debug!("models probe failed at {url}, trying a shorter prefix"),
        }
    }

    ProviderCapabilities::unknown()
}

async fn probe_models_endpoint(
    http: &reqwest::Client,
    url: &str,
    api_key: &str,
) -> Option<ModelsPayload> {
    // Header combinations, most likely first. Some CORS-sensitive gateways
    // only accept one of these.
    let attempts: [&[(&str, String)]; 3] = [
        &[("authorization", format!("Bearer {}", api_key.trim()))],
        &[("x-api-key", api_key.trim().to_string())],
        &[],
    ];

    for headers in attempts {
        if api_key.trim().is_empty() && !headers.is_empty() {
            continue;
        }

        let mut request = http.get(url);
        for (key, value) in headers {
            request = request.header(*key, value);
        }

        let response = match request.send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                log::debug!("models probe at {url} returned HTTP {}", response.status());
                continue;
            }
            Err(error) => {
                log::debug!("models probe at {url} failed: {error}");
                continue;
            }
        };

        match response.json::<ModelsPayload>().await {
            Ok(payload) if !payload.data.is_empty() => return Some(payload),
            Ok(_) => continue,
            Err(error) => {
                log::debug!("models probe at {url} returned unparseable JSON: {error}");
                continue;
            }
        }
    }

    None
}
