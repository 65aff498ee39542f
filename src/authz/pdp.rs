//! Policy decision point
//!
//! Entry point for authorization requests. Resolves the policy state named by
//! the request, hands it to the configured language backend and turns every
//! failure into a deny.

use super::decision::AuthorizationDecision;
use super::model::{AuthorizationContext, AuthorizationRequest};
use super::store::PolicyStore;
use crate::config::EngineConfig;
use crate::core::commit::Commit;
use crate::core::manager::ObjectManager;
use crate::core::object::ObjectId;
use crate::core::store::ObjectStore;
use crate::error::Result;
use crate::languages::{LanguageAbstraction, LanguageRegistry};
use std::sync::Arc;
use tracing::{info, warn};

pub struct PolicyDecisionPoint {
    config: EngineConfig,
    registry: Arc<LanguageRegistry>,
    language: Arc<dyn LanguageAbstraction>,
}

impl PolicyDecisionPoint {
    /// Create a decision point using the backend named by `config.language`
    pub fn new(config: EngineConfig, registry: Arc<LanguageRegistry>) -> Result<Self> {
        config.validate()?;
        let language = registry.get(&config.language)?;
        Ok(PolicyDecisionPoint {
            config,
            registry,
            language,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Decide a request against the commit it references
    ///
    /// Never returns an error: any failure while loading or evaluating yields
    /// a deny carrying admin and user reasons.
    pub fn authorize(
        &self,
        store: &dyn ObjectStore,
        request: &AuthorizationRequest,
    ) -> AuthorizationDecision {
        let result = request
            .policy_store
            .validate()
            .and_then(|commit_id| PolicyStore::load(store, &self.registry, &commit_id))
            .and_then(|policy_store| {
                self.language
                    .authorization_check(&request.request_id, &policy_store, &request.context)
            });
        self.finish(&request.request_id, result)
    }

    /// Decide a request against an already loaded policy store
    pub fn authorize_with_store(
        &self,
        request_id: &str,
        policy_store: &PolicyStore,
        ctx: &AuthorizationContext,
    ) -> AuthorizationDecision {
        let result = self
            .language
            .authorization_check(request_id, policy_store, ctx);
        self.finish(request_id, result)
    }

    /// Commits between `from` and `to`, oldest first
    ///
    /// Bounded by `max_commit_history`.
    pub fn commit_history(
        &self,
        store: &dyn ObjectStore,
        from: &ObjectId,
        to: &ObjectId,
    ) -> Result<(bool, Vec<Commit>)> {
        ObjectManager::new().build_commit_history(
            store,
            from,
            to,
            true,
            self.config.max_commit_history,
        )
    }

    fn finish(
        &self,
        request_id: &str,
        result: Result<AuthorizationDecision>,
    ) -> AuthorizationDecision {
        match result {
            Ok(decision) => {
                info!(request_id, decision = decision.decision(), "authorization decided");
                decision
            }
            Err(err) => {
                warn!(
                    request_id,
                    class = ?err.class(),
                    error = %err,
                    "authorization failed, denying"
                );
                AuthorizationDecision::from_error(request_id, &err, self.config.share_admin_reason)
            }
        }
    }
}

impl std::fmt::Debug for PolicyDecisionPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyDecisionPoint")
            .field("config", &self.config)
            .field("language", &self.language.language_specification().language)
            .finish()
    }
}

/// Shorthand used by embedders that only need the default backends
pub fn default_decision_point(config: EngineConfig) -> Result<PolicyDecisionPoint> {
    let registry = LanguageRegistry::with_defaults()?;
    PolicyDecisionPoint::new(config, Arc::new(registry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::model::{Action, PolicyStoreRef, Resource, Subject};
    use crate::core::store::MemoryObjectStore;
    use crate::error::PolicyError;

    fn request(commit_id: &str) -> AuthorizationRequest {
        AuthorizationRequest::new(
            "req-1",
            PolicyStoreRef::new(1, "ledger", commit_id),
            AuthorizationContext::new(
                Subject::user("alice"),
                Resource::new("Document", "42"),
                Action::new("Document::Read"),
            ),
        )
    }

    #[test]
    fn test_unknown_backend() {
        let config = EngineConfig {
            language: "rego".into(),
            ..Default::default()
        };
        assert!(matches!(
            default_decision_point(config),
            Err(PolicyError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_missing_commit_fails_closed() {
        let pdp = default_decision_point(EngineConfig::default()).unwrap();
        let store = MemoryObjectStore::new();
        let commit = ObjectId::of(b"nowhere");

        let decision = pdp.authorize(&store, &request(commit.as_str()));
        assert!(!decision.decision());
        assert_eq!(decision.id(), "req-1");
        assert!(decision.admin_error().unwrap().message().contains(commit.as_str()));
        assert!(!decision.user_error().unwrap().message().contains(commit.as_str()));
    }

    #[test]
    fn test_malformed_store_ref_fails_closed() {
        let pdp = default_decision_point(EngineConfig::default()).unwrap();
        let decision = pdp.authorize(&MemoryObjectStore::new(), &request("not-a-commit"));
        assert!(!decision.decision());
        assert_eq!(decision.user_error().unwrap().code(), "400");
    }
}
