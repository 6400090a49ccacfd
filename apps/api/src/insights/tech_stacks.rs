//! Popular tech stacks, generated once and shared by every caller.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::errors::AppError;
use crate::fallback::default_tech_stacks;
use crate::insights::prompts::TECH_STACKS_PROMPT_TEMPLATE;
use crate::llm_client::normalize::{cap_strings, clamp_str, Bounded};
use crate::llm_client::prompts::{fill_template, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{generate_json, TextGenerator};

pub const TECH_STACKS_TTL: Duration = Duration::from_secs(12 * 60 * 60);
/// Fallback data is retried sooner than a real answer.
pub const TECH_STACKS_FALLBACK_TTL: Duration = Duration::from_secs(2 * 60 * 60);

const MAX_STACKS: usize = 10;
const MAX_NAME_CHARS: usize = 80;
const MAX_ITEMS: usize = 6;
const MAX_DESCRIPTION_CHARS: usize = 200;

pub type TechStackCache = TtlCache<(), Vec<TechStack>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechStack {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl Bounded for TechStack {
    fn bound(self) -> Self {
        TechStack {
            name: clamp_str(self.name.trim().to_string(), MAX_NAME_CHARS),
            items: cap_strings(self.items, MAX_ITEMS, MAX_NAME_CHARS),
            description: clamp_str(self.description.trim().to_string(), MAX_DESCRIPTION_CHARS),
        }
    }
}

/// Models answer either `{"stacks": [...]}` or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TechStackReply {
    Wrapped { stacks: Vec<TechStack> },
    Bare(Vec<TechStack>),
}

#[derive(Debug)]
pub struct TechStackList(pub Vec<TechStack>);

impl<'de> Deserialize<'de> for TechStackList {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stacks = match TechStackReply::deserialize(deserializer)? {
            TechStackReply::Wrapped { stacks } | TechStackReply::Bare(stacks) => stacks,
        };
        Ok(TechStackList(stacks))
    }
}

impl Bounded for TechStackList {
    fn bound(self) -> Self {
        TechStackList(
            self.0
                .into_iter()
                .map(Bounded::bound)
                .filter(|s| !s.name.is_empty())
                .take(MAX_STACKS)
                .collect(),
        )
    }
}

pub fn build_tech_stacks_prompt() -> String {
    fill_template(TECH_STACKS_PROMPT_TEMPLATE, &[("json_only", JSON_ONLY_INSTRUCTION)])
}

/// Returns the cached stack list, regenerating it when stale. On upstream
/// failure the static list is served and cached for the shorter TTL.
pub async fn resolve_tech_stacks(
    llm: &Arc<dyn TextGenerator>,
    cache: &TechStackCache,
    timeout: Duration,
) -> Vec<TechStack> {
    let generated = cache
        .get_or_compute((), TECH_STACKS_TTL, || async {
            debug!("Tech stack cache miss, generating");
            let TechStackList(stacks) =
                generate_json::<TechStackList>(llm, build_tech_stacks_prompt(), timeout).await?;
            if stacks.is_empty() {
                return Err(AppError::UpstreamParse(
                    "model returned no tech stacks".to_string(),
                ));
            }
            Ok::<_, AppError>(stacks)
        })
        .await;

    match generated {
        Ok(stacks) => stacks,
        Err(e) => {
            warn!("Tech stack generation failed, serving fallback: {e}");
            let fallback = default_tech_stacks();
            cache.insert((), fallback.clone(), TECH_STACKS_FALLBACK_TTL);
            fallback
        }
    }
}
