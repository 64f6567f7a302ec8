// 🧩 Entity Resolver - many raw spellings → one canonical auditor
//
// "Display name is a VALUE (can grow), entity key is IDENTITY (never changes)"
//
// Problem solved:
// - "Andre", "andre perkasa", "Andre Perkasa Ginting" → one auditor entity
// - The entity shows its longest observed spelling
// - The key is fixed at creation so renderers can key rows across refreshes
//
// Greedy and single-pass: tokens are resolved in order of first appearance,
// so a different input order can cluster differently. Entities grow and get
// renamed, they are never split.

use crate::names::{self, NormalizedName};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

// ============================================================================
// ENTITY ID / MATCH KIND
// ============================================================================

/// Index of an entity inside one resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    /// Normalized key already registered
    Exact,

    /// One key is a substring (or prefix) of the other
    Containment,

    /// Only the first names agree
    FirstToken,

    /// No candidate, a new entity was created
    New,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub entity: EntityId,
    pub kind: MatchKind,
    /// The entity took this token as its new display name
    pub renamed: bool,
}

// ============================================================================
// CANONICAL ENTITY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalEntity {
    /// Stable fingerprint of the token that created the entity
    pub key: String,

    /// Longest observed spelling, original casing
    pub display_name: String,

    /// Normalized form of `display_name`; containment and first-token
    /// matching compare against this
    pub canonical_key: String,

    /// Every normalized token that maps here, in order of first appearance
    pub members: Vec<String>,
}

impl CanonicalEntity {
    fn new(name: &NormalizedName) -> Self {
        CanonicalEntity {
            key: entity_fingerprint(&name.key),
            display_name: name.display.clone(),
            canonical_key: name.key.clone(),
            members: vec![name.key.clone()],
        }
    }

    fn add_member(&mut self, key: &str) {
        if !self.members.iter().any(|m| m == key) {
            self.members.push(key.to_string());
        }
    }

    fn contains_or_contained(&self, key: &str) -> bool {
        self.canonical_key.contains(key) || key.contains(&self.canonical_key)
    }

    pub fn first_token(&self) -> &str {
        names::first_token(&self.canonical_key)
    }
}

// ============================================================================
// ENTITY RESOLVER
// ============================================================================

/// Caller-owned registry of resolved auditors for one data snapshot
#[derive(Debug, Clone, Default)]
pub struct EntityResolver {
    entities: Vec<CanonicalEntity>,
    by_key: HashMap<String, EntityId>,
}

impl EntityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize then resolve; None when the raw string is a title or noise
    pub fn resolve_raw(&mut self, raw: &str) -> Option<Resolution> {
        names::normalize(raw).map(|name| self.resolve(&name))
    }

    /// Resolve one normalized token (exact → containment → first token → new)
    pub fn resolve(&mut self, name: &NormalizedName) -> Resolution {
        // 1. Exact
        if let Some(&id) = self.by_key.get(&name.key) {
            return Resolution {
                entity: id,
                kind: MatchKind::Exact,
                renamed: false,
            };
        }

        // 2. Containment
        if let Some(idx) = self
            .entities
            .iter()
            .position(|entity| entity.contains_or_contained(&name.key))
        {
            let renamed = self.attach(idx, name, true);
            return Resolution {
                entity: EntityId(idx),
                kind: MatchKind::Containment,
                renamed,
            };
        }

        // 3. First token
        let first = name.first_token();
        if let Some(idx) = self
            .entities
            .iter()
            .position(|entity| !first.is_empty() && entity.first_token() == first)
        {
            self.attach(idx, name, false);
            return Resolution {
                entity: EntityId(idx),
                kind: MatchKind::FirstToken,
                renamed: false,
            };
        }

        // 4. New entity
        let id = EntityId(self.entities.len());
        self.entities.push(CanonicalEntity::new(name));
        self.by_key.insert(name.key.clone(), id);
        tracing::debug!(entity = %name.display, "new auditor entity");

        Resolution {
            entity: id,
            kind: MatchKind::New,
            renamed: false,
        }
    }

    /// Register `name` as a member of entity `idx`; rename when allowed and longer
    fn attach(&mut self, idx: usize, name: &NormalizedName, allow_rename: bool) -> bool {
        let entity = &mut self.entities[idx];
        entity.add_member(&name.key);

        let renamed = allow_rename && name.char_len() > entity.canonical_key.chars().count();
        if renamed {
            tracing::debug!(
                from = %entity.display_name,
                to = %name.display,
                "auditor entity renamed to longer variant"
            );
            entity.display_name = name.display.clone();
            entity.canonical_key = name.key.clone();
        }

        self.by_key.insert(name.key.clone(), EntityId(idx));
        renamed
    }

    /// Entity for an already-seen normalized key
    pub fn lookup(&self, key: &str) -> Option<EntityId> {
        self.by_key.get(key).copied()
    }

    pub fn entity(&self, id: EntityId) -> Option<&CanonicalEntity> {
        self.entities.get(id.0)
    }

    pub fn display_name(&self, id: EntityId) -> Option<&str> {
        self.entity(id).map(|e| e.display_name.as_str())
    }

    pub fn entities(&self) -> &[CanonicalEntity] {
        &self.entities
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        (0..self.entities.len()).map(EntityId)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// First 16 hex chars of SHA-256 over the creating token
pub fn entity_fingerprint(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    hex[..16].to_string()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(resolver: &mut EntityResolver, raw: &str) -> Resolution {
        resolver.resolve_raw(raw).unwrap()
    }

    #[test]
    fn test_exact_match_reuses_entity() {
        let mut resolver = EntityResolver::new();

        let a = resolve(&mut resolver, "Budi Santoso");
        let b = resolve(&mut resolver, "  BUDI  santoso ");

        assert_eq!(a.kind, MatchKind::New);
        assert_eq!(b.kind, MatchKind::Exact);
        assert_eq!(a.entity, b.entity);
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn test_containment_grows_display_name() {
        let mut resolver = EntityResolver::new();

        let short = resolve(&mut resolver, "Andre");
        let long = resolve(&mut resolver, "Andre Perkasa Ginting");

        assert_eq!(short.entity, long.entity);
        assert_eq!(long.kind, MatchKind::Containment);
        assert!(long.renamed);
        assert_eq!(
            resolver.display_name(short.entity),
            Some("Andre Perkasa Ginting")
        );

        // Identity does not move with the name
        let entity = resolver.entity(short.entity).unwrap();
        assert_eq!(entity.key, entity_fingerprint("andre"));
        assert_eq!(entity.members, vec!["andre", "andre perkasa ginting"]);
    }

    #[test]
    fn test_containment_shorter_variant_keeps_name() {
        let mut resolver = EntityResolver::new();

        let long = resolve(&mut resolver, "Andre Perkasa Ginting");
        let short = resolve(&mut resolver, "Andre Perkasa");

        assert_eq!(long.entity, short.entity);
        assert!(!short.renamed);
        assert_eq!(
            resolver.display_name(long.entity),
            Some("Andre Perkasa Ginting")
        );
        // The shorter spelling now resolves exactly
        assert_eq!(resolver.lookup("andre perkasa"), Some(long.entity));
    }

    #[test]
    fn test_first_token_fallback() {
        let mut resolver = EntityResolver::new();

        let a = resolve(&mut resolver, "Budi Santoso");
        let b = resolve(&mut resolver, "Budi Hartono");

        assert_eq!(b.kind, MatchKind::FirstToken);
        assert_eq!(a.entity, b.entity);
        assert_eq!(resolver.display_name(a.entity), Some("Budi Santoso"));
    }

    #[test]
    fn test_distinct_names_create_entities() {
        let mut resolver = EntityResolver::new();

        let a = resolve(&mut resolver, "Budi Santoso");
        let b = resolve(&mut resolver, "Ani");
        let c = resolve(&mut resolver, "Citra Lestari");

        assert_ne!(a.entity, b.entity);
        assert_ne!(b.entity, c.entity);
        assert_eq!(resolver.len(), 3);
    }

    #[test]
    fn test_titles_never_create_entities() {
        let mut resolver = EntityResolver::new();

        assert!(resolver.resolve_raw("S.E.").is_none());
        assert!(resolver.resolve_raw("Dr.").is_none());
        assert!(resolver.is_empty());
    }

    #[test]
    fn test_resolution_is_order_dependent() {
        // "ani" is a substring of "daniel": whichever arrives second joins the first
        let mut forward = EntityResolver::new();
        resolve(&mut forward, "Ani");
        resolve(&mut forward, "Daniel");
        assert_eq!(forward.len(), 1);
        assert_eq!(forward.entities()[0].display_name, "Daniel");

        // With a third name in between, clustering changes with order
        let mut a = EntityResolver::new();
        resolve(&mut a, "Budi Santoso");
        resolve(&mut a, "Budi Hartono Wijaya");
        assert_eq!(a.len(), 1);
        assert_eq!(a.entities()[0].display_name, "Budi Santoso");

        let mut b = EntityResolver::new();
        resolve(&mut b, "Budi Hartono Wijaya");
        resolve(&mut b, "Budi Santoso");
        assert_eq!(b.len(), 1);
        assert_eq!(b.entities()[0].display_name, "Budi Hartono Wijaya");
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(entity_fingerprint("budi"), entity_fingerprint("budi"));
        assert_ne!(entity_fingerprint("budi"), entity_fingerprint("ani"));
        assert_eq!(entity_fingerprint("budi").len(), 16);
    }
}
