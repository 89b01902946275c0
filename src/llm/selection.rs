//! Provider selection policy.
//!
//! Pure decision of which provider serves a completion:
//!
//! 1. A preference naming a known provider wins. Unknown names are logged and
//!    ignored.
//! 2. Otherwise the intent label is matched case-insensitively against the
//!    keyword rules below. First matching rule wins.
//! 3. Otherwise [`DEFAULT_PROVIDER`].

use crate::llm::types::ProviderIdentity;
use tracing::warn;

/// Fast and cheap; used when nothing else applies
pub const DEFAULT_PROVIDER: ProviderIdentity = ProviderIdentity::Google;

/// Intent keyword rules, checked in order.
pub const INTENT_RULES: &[(&[&str], ProviderIdentity)] = &[
    (&["code", "programming"], ProviderIdentity::Anthropic),
    (&["creative", "story"], ProviderIdentity::OpenAI),
    (&["image", "vision"], ProviderIdentity::Google),
];

pub fn select_provider(preference: Option<&str>, intent: Option<&str>) -> ProviderIdentity {
    if let Some(preference) = preference.map(str::trim).filter(|p| !p.is_empty()) {
        match preference.parse::<ProviderIdentity>() {
            Ok(provider) => return provider,
            Err(_) => warn!(preference, "invalid provider preference, ignoring"),
        }
    }

    intent
        .and_then(provider_for_intent)
        .unwrap_or(DEFAULT_PROVIDER)
}

/// Keyword-rule match for an intent label, if any
pub fn provider_for_intent(intent: &str) -> Option<ProviderIdentity> {
    let intent = intent.to_lowercase();
    INTENT_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| intent.contains(k)))
        .map(|(_, provider)| *provider)
}
