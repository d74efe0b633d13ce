//! Ordered transformer execution.

use thiserror::Error;

use crate::config::{ProxyConfig, TransformerKind};
use crate::dom::{Document, SelectorError};
use crate::transform::template::TemplateError;
use crate::transform::{
    AppContainerTransformer, Exchange, ImportMapTransformer, MetaTransformer, NavigationTransformer,
    TransformError, Transformer,
};

/// A transformer could not be built from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid selector: {0}")]
    Selector(#[from] SelectorError),
    #[error("invalid template: {0}")]
    Template(#[from] TemplateError),
}

/// Transformers in execution order.
#[derive(Debug, Default)]
pub struct TransformerChain {
    transformers: Vec<Box<dyn Transformer>>,
}

impl TransformerChain {
    pub fn new(transformers: Vec<Box<dyn Transformer>>) -> Self {
        Self { transformers }
    }

    /// Build the chain named by `transform.chain`, in that order.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, BuildError> {
        let mut transformers: Vec<Box<dyn Transformer>> = Vec::with_capacity(config.transform.chain.len());
        for kind in &config.transform.chain {
            let transformer: Box<dyn Transformer> = match kind {
                TransformerKind::Importmap => Box::new(ImportMapTransformer::new(&config.importmap)),
                TransformerKind::Apps => Box::new(AppContainerTransformer::new(&config.apps)),
                TransformerKind::Meta => {
                    Box::new(MetaTransformer::new(&config.proxy.path_separator, &config.meta))
                }
                TransformerKind::Navigation => Box::new(NavigationTransformer::new(
                    &config.navigation,
                    &config.proxy.template_paths,
                )?),
            };
            transformers.push(transformer);
        }
        Ok(Self::new(transformers))
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Whether any transformer wants this response.
    pub fn applies(&self, exchange: &Exchange<'_>) -> bool {
        self.transformers.iter().any(|t| t.should_transform(exchange))
    }

    /// Run every applicable transformer in order; the first error stops
    /// the chain.
    pub fn run(&self, exchange: &Exchange<'_>, doc: &mut Document) -> Result<(), TransformError> {
        for transformer in &self.transformers {
            if !transformer.should_transform(exchange) {
                tracing::trace!(transformer = transformer.name(), "Transformer skipped");
                continue;
            }
            transformer.transform(exchange, doc)?;
            tracing::debug!(transformer = transformer.name(), "Transformer applied");
        }
        Ok(())
    }
}
