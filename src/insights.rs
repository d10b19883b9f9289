//! Country market insights: cache, live provider with ordered model
//! fallback, then the deterministic synthetic generator.

use crate::cache::InsightCache;
use crate::error::InsightError;
use crate::normalize::parse_insights;
use crate::prompt::build_insight_prompt;
use crate::provider::{generate_with_fallback, TextProvider};
use crate::synthetic::synthetic_insights;
use crate::types::{CountryInsights, MarketContext};
use crate::util::next_timestamp_millis;
use std::sync::Arc;
use tracing::{info, warn};

/// Where a returned insight came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightSource {
    Cache,
    Provider,
    Synthetic,
}

pub struct InsightService {
    cache: Arc<dyn InsightCache>,
    /// `None` when no credential is configured.
    provider: Option<Arc<dyn TextProvider>>,
    models: Vec<String>,
}

impl InsightService {
    pub fn new(
        cache: Arc<dyn InsightCache>,
        provider: Option<Arc<dyn TextProvider>>,
        models: Vec<String>,
    ) -> Self {
        Self {
            cache,
            provider,
            models,
        }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Insights for `country`.
    ///
    /// Returns `Err` only for fatal provider failures (auth, quota, network);
    /// see [`Self::country_insights_or_fallback`] for the never-failing form.
    pub async fn country_insights(
        &self,
        country: &str,
        context: &MarketContext,
    ) -> Result<(CountryInsights, InsightSource), InsightError> {
        if let Some(hit) = self.cache.get(country) {
            return Ok((hit, InsightSource::Cache));
        }

        let Some(provider) = self.provider.as_deref() else {
            info!(country, "no provider credential, using synthetic insights");
            return Ok((self.synthesize(country), InsightSource::Synthetic));
        };

        let prompt = build_insight_prompt(country, context);
        let reply = match generate_with_fallback(provider, &self.models, &prompt).await {
            Ok(reply) => reply,
            Err(InsightError::ProviderUnavailable { model, reason }) => {
                warn!(country, tried = %model, reason = %reason, "no model variant available, using synthetic insights");
                return Ok((self.synthesize(country), InsightSource::Synthetic));
            }
            Err(e) => return Err(e),
        };

        match parse_insights(&reply.text, country, next_timestamp_millis()) {
            Ok(insights) => {
                info!(country, model = %reply.model, carriers = insights.carriers.len(), "provider insights ready");
                self.cache.set(country, &insights);
                Ok((insights, InsightSource::Provider))
            }
            Err(e) => {
                warn!(country, model = %reply.model, error = %e, "provider reply rejected, using synthetic insights");
                Ok((self.synthesize(country), InsightSource::Synthetic))
            }
        }
    }

    /// Like [`Self::country_insights`], but a fatal provider failure is
    /// converted into synthetic insights instead of an error.
    pub async fn country_insights_or_fallback(
        &self,
        country: &str,
        context: &MarketContext,
    ) -> (CountryInsights, InsightSource) {
        match self.country_insights(country, context).await {
            Ok(result) => result,
            Err(e) => {
                warn!(country, error = %e, "insight acquisition failed, using synthetic insights");
                (self.synthesize(country), InsightSource::Synthetic)
            }
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cached_keys(&self) -> Vec<String> {
        self.cache.list_keys()
    }

    fn synthesize(&self, country: &str) -> CountryInsights {
        let insights = synthetic_insights(country, next_timestamp_millis());
        self.cache.set(country, &insights);
        insights
    }
}
