//! Role-tagged registration of cache tiers.
//!
//! The orchestration layer never inspects tier types at runtime to decide
//! which cache is which; roles are named when the registry is constructed.
//! There is always exactly one primary (the local tier) and at most one
//! secondary (the distributed tier).

use std::sync::Arc;

use crate::error::CacheError;
use crate::tier::CacheTier;

/// Role a tier plays in the two-tier layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheRole {
    /// The process-local tier every read goes through.
    Primary,
    /// The shared, network-backed tier, kept in sync through invalidation.
    Secondary,
}

impl std::fmt::Display for CacheRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheRole::Primary => write!(f, "primary"),
            CacheRole::Secondary => write!(f, "secondary"),
        }
    }
}

/// The tiers available to the orchestration layer, tagged by role.
#[derive(Clone)]
pub struct CacheRegistry {
    primary: Arc<dyn CacheTier>,
    secondary: Option<Arc<dyn CacheTier>>,
}

impl CacheRegistry {
    /// Create a registry with the given primary tier and no secondary.
    pub fn new(primary: Arc<dyn CacheTier>) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    /// Register a tier under an explicit role, replacing whatever held that
    /// role before.
    #[must_use]
    pub fn register(mut self, role: CacheRole, tier: Arc<dyn CacheTier>) -> Self {
        match role {
            CacheRole::Primary => self.primary = tier,
            CacheRole::Secondary => self.secondary = Some(tier),
        }
        self
    }

    /// The primary (local) tier.
    pub fn primary(&self) -> &Arc<dyn CacheTier> {
        &self.primary
    }

    /// The secondary (distributed) tier, when one is registered.
    pub fn secondary(&self) -> Option<&Arc<dyn CacheTier>> {
        self.secondary.as_ref()
    }

    /// Clear every registered tier in full.
    ///
    /// Both clears are attempted even when the first fails; the first error
    /// is returned so a partial invalidation is never silently swallowed.
    pub async fn clear_all(&self) -> Result<(), CacheError> {
        let mut first_error = None;

        if let Err(error) = self.primary.clear().await {
            tracing::warn!(role = %CacheRole::Primary, %error, "tier clear failed");
            first_error.get_or_insert(error);
        }
        if let Some(secondary) = &self.secondary {
            if let Err(error) = secondary.clear().await {
                tracing::warn!(role = %CacheRole::Secondary, %error, "tier clear failed");
                first_error.get_or_insert(error);
            }
        }

        match first_error {
            None => Ok(()),
            Some(error) => Err(error),
        }
    }
}
