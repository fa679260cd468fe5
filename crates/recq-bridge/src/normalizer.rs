//! # Ingestion
//!
//! `Normalizer` is the single entry point through which legacy components
//! reach the planner. Each component is ingested once:
//!
//! 1. structural check (no empty conjunctions),
//! 2. schema validation against the record type reached through the configured
//!    field prefix, unless disabled,
//! 3. normalization into the builder, under the configured field prefix.
//!
//! Nothing is registered with the builder when an earlier step fails.

use crate::component::QueryComponent;
use crate::config::NormalizerConfig;
use crate::error::BridgeError;
use recq_core::predicate::QueryPredicate;
use recq_core::record::RecordDescriptor;
use recq_core::select::ExpressionBuilder;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    /// Normalizer with the given configuration.
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Validate `component` against `descriptor` and register its correlated
    /// form with `builder`. Returns the registered predicates.
    pub fn ingest(
        &self,
        component: &QueryComponent,
        descriptor: &RecordDescriptor,
        builder: &mut dyn ExpressionBuilder,
    ) -> Result<Vec<Arc<QueryPredicate>>, BridgeError> {
        if component.has_empty_conjunction() {
            return Err(BridgeError::EmptyConjunction);
        }
        if self.config.validate_components {
            if let Err(e) = component.validate(descriptor, &self.config.field_prefix) {
                debug!("Rejected component '{}' for {}: {}", component, descriptor.name, e);
                return Err(e.into());
            }
        }
        let predicates = component.normalize(builder, &self.config.field_prefix);
        debug!(
            "Normalized '{}' into {} predicate(s) on {}",
            component,
            predicates.len(),
            builder.correlation_base()
        );
        Ok(predicates)
    }

    /// Ingest every component in order. Stops at the first failure; components
    /// before it stay registered.
    pub fn ingest_all<'a>(
        &self,
        components: impl IntoIterator<Item = &'a QueryComponent>,
        descriptor: &RecordDescriptor,
        builder: &mut dyn ExpressionBuilder,
    ) -> Result<Vec<Arc<QueryPredicate>>, BridgeError> {
        let mut all = Vec::new();
        for component in components {
            all.extend(self.ingest(component, descriptor, builder)?);
        }
        Ok(all)
    }
}
