//! Pin resolution: pin reference in, single media descriptor out.

use std::sync::Arc;

use crate::api::PinterestApi;
use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::links::{extract_pin_id, InputLink, LinkTarget, PinReference};
use crate::media::MediaDescriptor;
use crate::resolve::markup::{LdJsonStrategy, MetaTagStrategy, OembedStrategy, PatternScanStrategy};
use crate::resolve::pin_data::{EmbeddedDataStrategy, PinApiStrategy};
use crate::resolve::strategy::{ExtractionStrategy, PinContext};

/// The default extraction chain, most structured source first.
pub fn default_strategies() -> Vec<Box<dyn ExtractionStrategy>> {
    vec![
        Box::new(PinApiStrategy),
        Box::new(EmbeddedDataStrategy),
        Box::new(LdJsonStrategy),
        Box::new(MetaTagStrategy),
        Box::new(OembedStrategy),
        Box::new(PatternScanStrategy),
    ]
}

/// Turns pin references into downloadable media descriptors.
pub struct PinResolver {
    api: Arc<PinterestApi>,
    config: ResolverConfig,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl PinResolver {
    pub fn new(api: Arc<PinterestApi>, config: ResolverConfig) -> Self {
        Self {
            api,
            config,
            strategies: default_strategies(),
        }
    }

    /// Replace the extraction chain.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Pin reference for a classified pin link.
    ///
    /// Short links are followed to the pin they redirect to.
    pub async fn reference_for(&self, link: &InputLink) -> Result<PinReference> {
        match &link.target {
            LinkTarget::Pin { id } => Ok(PinReference::with_source(id, &link.normalized)),
            LinkTarget::ShortPin => {
                let page = self.api.get_page(&link.normalized).await?;
                let id = extract_pin_id(page.final_url.path())
                    .or_else(|| extract_pin_id(&page.body))
                    .ok_or_else(|| {
                        Error::Resolution(format!("{} does not lead to a pin", link.normalized))
                    })?;
                tracing::debug!("Short link {} resolved to pin {}", link.normalized, id);
                Ok(PinReference::with_source(id, &link.normalized))
            }
            LinkTarget::Profile { .. } | LinkTarget::None => {
                Err(Error::InvalidLink(link.raw.clone()))
            }
        }
    }

    /// Resolve a pin to the single best media file.
    ///
    /// A failed page fetch is a network error; when no strategy finds
    /// acceptable media the pin fails with a resolution error.
    pub async fn resolve(&self, pin: &PinReference) -> Result<MediaDescriptor> {
        let page_url = self.api.endpoints().pin_page(&pin.id)?;
        let page = self.api.get_page(page_url.as_str()).await?;
        let ctx = PinContext::new(pin, &page, &self.api, &self.config);

        for strategy in &self.strategies {
            match strategy.extract(&ctx).await {
                Ok(Some(descriptor)) => {
                    tracing::debug!(
                        "Pin {} resolved by {} to {} {}",
                        pin.id,
                        strategy.name(),
                        descriptor.kind,
                        descriptor.url
                    );
                    return Ok(descriptor);
                }
                Ok(None) => {
                    tracing::debug!("Strategy {} found nothing for pin {}", strategy.name(), pin.id);
                }
                Err(e @ Error::Rejected(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!("Strategy {} failed for pin {}: {}", strategy.name(), pin.id, e);
                }
            }
        }

        Err(Error::Resolution(format!(
            "no {} media found for pin {}",
            self.config.quality, pin.id
        )))
    }
}
