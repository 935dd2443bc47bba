//! The signal registry: a process-local table of named signal instances,
//! constructed by the embedding caller rather than populated through a
//! global mutable singleton (SPEC_FULL.md §9 "Global registries → process-
//! local tables injected at construction"; the reference implementation's
//! module-level `SIGNAL_REGISTRY` dict is the thing being replaced here).

use std::collections::HashMap;
use std::sync::Arc;

use crate::cluster::ClusterSignal;
use crate::embedding::EmbeddingSignal;
use crate::error::SignalError;
use crate::model::ModelSignal;
use crate::splitter::SplitterSignal;
use crate::text::TextSignal;

/// Holds one named table per signal variant. A dataset or executor run is
/// constructed with its own `SignalRegistry` rather than reaching for a
/// global; tests construct a fresh one per case instead of calling a
/// process-wide `clear()` between them, except where a test genuinely needs
/// to assert clearing behavior itself.
#[derive(Default)]
pub struct SignalRegistry {
    text: HashMap<String, Arc<dyn TextSignal>>,
    splitter: HashMap<String, Arc<dyn SplitterSignal>>,
    embedding: HashMap<String, Arc<dyn EmbeddingSignal>>,
    model: HashMap<String, Arc<dyn ModelSignal>>,
    cluster: HashMap<String, Arc<dyn ClusterSignal>>,
}

macro_rules! variant_methods {
    ($field:ident, $trait_:ty, $register:ident, $get:ident, $contains:ident) => {
        /// # Errors
        ///
        /// Returns `SignalError::AlreadyRegistered` if the name is taken.
        pub fn $register(&mut self, signal: Arc<$trait_>) -> Result<(), SignalError> {
            let name = signal.name().to_string();
            if self.$field.contains_key(&name) {
                return Err(SignalError::AlreadyRegistered(name));
            }
            self.$field.insert(name, signal);
            Ok(())
        }

        /// # Errors
        ///
        /// Returns `SignalError::NotFound` if no signal is registered under
        /// `name`.
        pub fn $get(&self, name: &str) -> Result<Arc<$trait_>, SignalError> {
            self.$field.get(name).cloned().ok_or_else(|| SignalError::NotFound(name.to_string()))
        }

        #[must_use]
        pub fn $contains(&self, name: &str) -> bool {
            self.$field.contains_key(name)
        }
    };
}

impl SignalRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    variant_methods!(text, dyn TextSignal, register_text, get_text, has_text);
    variant_methods!(splitter, dyn SplitterSignal, register_splitter, get_splitter, has_splitter);
    variant_methods!(embedding, dyn EmbeddingSignal, register_embedding, get_embedding, has_embedding);
    variant_methods!(model, dyn ModelSignal, register_model, get_model, has_model);
    variant_methods!(cluster, dyn ClusterSignal, register_cluster, get_cluster, has_cluster);

    /// Drops every registered signal. Only meaningful in tests that need to
    /// assert on a registry's empty state; production callers should just
    /// construct a fresh `SignalRegistry` instead (spec.md §4.D).
    #[cfg(test)]
    pub fn clear(&mut self) {
        self.text.clear();
        self.splitter.clear();
        self.embedding.clear();
        self.model.clear();
        self.cluster.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{InputType, SignalMeta};
    use crate::text::TextStatisticsSignal;

    #[test]
    fn register_then_get_round_trips() {
        let mut registry = SignalRegistry::new();
        registry.register_text(Arc::new(TextStatisticsSignal)).unwrap();

        let found = registry.get_text("text_statistics").unwrap();
        assert_eq!(found.input_type(), InputType::Text);
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = SignalRegistry::new();
        registry.register_text(Arc::new(TextStatisticsSignal)).unwrap();
        let err = registry.register_text(Arc::new(TextStatisticsSignal)).unwrap_err();
        assert!(matches!(err, SignalError::AlreadyRegistered(_)));
    }

    #[test]
    fn missing_signal_is_not_found() {
        let registry = SignalRegistry::new();
        let err = registry.get_text("nope").unwrap_err();
        assert!(matches!(err, SignalError::NotFound(_)));
    }

    #[test]
    fn clear_empties_every_table() {
        let mut registry = SignalRegistry::new();
        registry.register_text(Arc::new(TextStatisticsSignal)).unwrap();
        assert!(registry.has_text("text_statistics"));
        registry.clear();
        assert!(!registry.has_text("text_statistics"));
    }
}
