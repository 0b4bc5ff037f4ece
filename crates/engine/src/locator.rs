//! Entity model discovery.
//!
//! The concrete model name is deployment specific. [`ModelLocator`] runs a
//! bounded search over strategies of decreasing confidence and remembers the
//! name that worked, re-validating it on every later call.

use std::sync::{PoisonError, RwLock};

use intake_util::{contains_any_hint, proper_name_from_slug};
use tracing::{debug, warn};

use crate::{
    backend::{BackendClient, ModelHandle},
    config::ResolverConfig,
};

/// Strategy that produced a located model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateStrategy {
    /// The name cached by an earlier call was still valid.
    Cached,
    /// A registry entry matched one of the hints.
    RegistryHint,
    /// A literal or slug-derived name guess was accepted.
    NameGuess,
}

/// A model acquired by the locator.
pub struct LocatedModel {
    pub model: Box<dyn ModelHandle>,
    /// Name the model was acquired under; this is what gets cached.
    pub name: String,
    pub strategy: LocateStrategy,
}

/// Finds the entity model inside a backend's schema registry.
#[derive(Debug)]
pub struct ModelLocator {
    hints: Vec<String>,
    name_guesses: Vec<String>,
    cached_name: RwLock<Option<String>>,
}

impl ModelLocator {
    pub fn new(hints: Vec<String>, name_guesses: Vec<String>) -> Self {
        Self {
            hints,
            name_guesses,
            cached_name: RwLock::new(None),
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.model_hints.clone(), config.model_name_guesses.clone())
    }

    /// Name remembered from the last successful lookup.
    pub fn cached_name(&self) -> Option<String> {
        self.cached_name.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Forgets the remembered name.
    pub fn invalidate(&self) {
        self.store(None);
    }

    /// Locates the entity model on `client`.
    ///
    /// Tries, in order: the cached name, registry entries matching a hint,
    /// then literal name guesses followed by slug-derived guesses. Returns
    /// `None` when every strategy is exhausted.
    pub fn resolve(&self, client: &dyn BackendClient) -> Option<LocatedModel> {
        let located = self
            .from_cache(client)
            .or_else(|| self.from_registry(client))
            .or_else(|| self.from_guesses(client));

        match &located {
            Some(found) => debug!(model = %found.name, strategy = ?found.strategy, "entity model located"),
            None => warn!(hints = ?self.hints, "no entity model matched any lookup strategy"),
        }
        located
    }

    fn from_cache(&self, client: &dyn BackendClient) -> Option<LocatedModel> {
        let name = self.cached_name()?;
        match client.switch_to(&name) {
            Ok(model) => Some(LocatedModel {
                model,
                name,
                strategy: LocateStrategy::Cached,
            }),
            Err(error) => {
                debug!(model = %name, %error, "cached model no longer available");
                self.invalidate();
                None
            }
        }
    }

    fn from_registry(&self, client: &dyn BackendClient) -> Option<LocatedModel> {
        let entries = match client.schema_registry() {
            Ok(entries) => entries,
            Err(error) => {
                debug!(%error, "schema registry enumeration failed");
                return None;
            }
        };

        entries.into_iter().find_map(|(key, descriptor)| {
            let identity = descriptor
                .identity_parts()
                .chain(Some(key.trim()).filter(|key| !key.is_empty()))
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            if !contains_any_hint(&identity, &self.hints) {
                return None;
            }
            match client.switch_to(&key) {
                Ok(model) => {
                    self.store(Some(key.clone()));
                    Some(LocatedModel {
                        model,
                        name: key,
                        strategy: LocateStrategy::RegistryHint,
                    })
                }
                Err(error) => {
                    debug!(model = %key, %error, "hinted registry entry could not be acquired");
                    None
                }
            }
        })
    }

    fn from_guesses(&self, client: &dyn BackendClient) -> Option<LocatedModel> {
        self.guess_candidates(client.slug().as_deref().unwrap_or_default())
            .into_iter()
            .find_map(|candidate| {
                let model = client.switch_to(&candidate).ok()?;
                if model.schema().is_none_or(|schema| schema.is_empty()) {
                    debug!(model = %candidate, "guessed model exposes no schema");
                    return None;
                }
                self.store(Some(candidate.clone()));
                Some(LocatedModel {
                    model,
                    name: candidate,
                    strategy: LocateStrategy::NameGuess,
                })
            })
    }

    /// Literal guesses first, then the client's proper name suffixed by each guess.
    fn guess_candidates(&self, slug: &str) -> Vec<String> {
        let proper_name = proper_name_from_slug(slug);
        let mut candidates = self.name_guesses.clone();
        if !proper_name.is_empty() {
            candidates.extend(self.name_guesses.iter().map(|guess| format!("{proper_name}{guess}")));
        }
        candidates
    }

    fn store(&self, name: Option<String>) {
        *self.cached_name.write().unwrap_or_else(PoisonError::into_inner) = name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guess_candidates_append_slug_derived_names() {
        let locator = ModelLocator::new(vec!["inquir".into()], vec!["Inquiry".into(), "Deal".into()]);
        assert_eq!(
            locator.guess_candidates("acme-crm"),
            vec!["Inquiry", "Deal", "AcmeCrmInquiry", "AcmeCrmDeal"]
        );
        assert_eq!(locator.guess_candidates(""), vec!["Inquiry", "Deal"]);
    }

    #[test]
    fn invalidate_clears_the_cached_name() {
        let locator = ModelLocator::from_config(&ResolverConfig::default());
        locator.store(Some("Inquiry".into()));
        assert_eq!(locator.cached_name().as_deref(), Some("Inquiry"));
        locator.invalidate();
        assert_eq!(locator.cached_name(), None);
    }
}
