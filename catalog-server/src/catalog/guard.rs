//! Uniqueness guard
//!
//! Best-effort pre-check run before product writes. The unique indexes in the
//! database remain the authoritative backstop; the guard exists so that callers
//! get a ranked, actionable conflict instead of a raw constraint error.
//!
//! # Rules
//!
//! | Rule | Fields | Default severity |
//! |------|--------|------------------|
//! | `NameCategory` | name + category_id | critical |
//! | `Sku` | sku | critical |
//! | `Name` | name | high |
//! | `Slug` | slug | high |

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use shared::models::{
    DuplicateConflict, DuplicateGroup, DuplicateMember, DuplicateReport, DuplicateRule,
    DuplicateSummary, FilteredProducts, Product, Severity, Suggestion,
};
use shared::util::now_millis;
use thiserror::Error;

use super::slug::slugify;
use super::store::ProductStore;
use super::CatalogError;
use crate::db::repository::RepoError;

/// Upper bound on counter suffixes tried before falling back to a timestamp
pub const MAX_ATTEMPTS: u32 = 100;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("duplicate validation unavailable: {0}")]
    Unavailable(#[from] RepoError),
}

impl From<GuardError> for CatalogError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::Unavailable(e) => CatalogError::Unavailable(e),
        }
    }
}

/// Candidate fields a rule may read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateField {
    Name,
    CategoryId,
    Slug,
    Sku,
}

impl CandidateField {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "name" => Some(Self::Name),
            "category_id" | "categoryId" => Some(Self::CategoryId),
            "slug" => Some(Self::Slug),
            "sku" => Some(Self::Sku),
            _ => None,
        }
    }
}

fn rule_fields(rule: DuplicateRule) -> &'static [CandidateField] {
    match rule {
        DuplicateRule::Name => &[CandidateField::Name],
        DuplicateRule::NameCategory => &[CandidateField::Name, CandidateField::CategoryId],
        DuplicateRule::Slug => &[CandidateField::Slug],
        DuplicateRule::Sku => &[CandidateField::Sku],
    }
}

#[derive(Debug, Clone)]
pub struct GuardConfig {
    pub case_sensitive: bool,
    pub trim_whitespace: bool,
    /// Rules reading any of these fields are disabled
    pub exclude_fields: HashSet<CandidateField>,
    pub severities: HashMap<DuplicateRule, Severity>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            trim_whitespace: true,
            exclude_fields: HashSet::new(),
            severities: DuplicateRule::ALL
                .iter()
                .map(|r| (*r, r.default_severity()))
                .collect(),
        }
    }
}

impl GuardConfig {
    pub fn is_enabled(&self, rule: DuplicateRule) -> bool {
        !rule_fields(rule)
            .iter()
            .any(|f| self.exclude_fields.contains(f))
    }

    pub fn severity(&self, rule: DuplicateRule) -> Severity {
        self.severities
            .get(&rule)
            .copied()
            .unwrap_or_else(|| rule.default_severity())
    }

    pub fn normalize(&self, value: &str) -> String {
        let v = if self.trim_whitespace {
            value.trim()
        } else {
            value
        };
        if self.case_sensitive {
            v.to_string()
        } else {
            v.to_lowercase()
        }
    }

    /// Key stored alongside a product name and used for name lookups
    pub fn name_key(&self, name: &str) -> String {
        self.normalize(name)
    }
}

/// Values checked against the existing catalog
#[derive(Debug, Clone, Default)]
pub struct DuplicateCandidate {
    pub name: Option<String>,
    pub category_id: Option<i64>,
    pub slug: Option<String>,
    pub sku: Option<String>,
}

impl DuplicateCandidate {
    pub fn named(name: impl Into<String>, category_id: Option<i64>) -> Self {
        Self {
            name: Some(name.into()),
            category_id,
            ..Self::default()
        }
    }

    pub fn with_sku(mut self, sku: Option<String>) -> Self {
        self.sku = sku;
        self
    }

    pub fn with_slug(mut self, slug: Option<String>) -> Self {
        self.slug = slug;
        self
    }
}

#[derive(Clone)]
pub struct UniquenessGuard {
    store: Arc<dyn ProductStore>,
    config: GuardConfig,
}

impl std::fmt::Debug for UniquenessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniquenessGuard")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl UniquenessGuard {
    pub fn new(store: Arc<dyn ProductStore>, config: GuardConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Products whose name collides with `name` under the configured normalization
    async fn same_name(&self, name: &str, exclude_id: Option<i64>) -> Result<Vec<Product>, GuardError> {
        let wanted = self.config.normalize(name);
        let candidates = self.store.find_by_name_key(&self.config.name_key(name)).await?;
        Ok(candidates
            .into_iter()
            .filter(|p| Some(p.id) != exclude_id && self.config.normalize(&p.name) == wanted)
            .collect())
    }

    /// Run every enabled rule the candidate supplies fields for.
    ///
    /// Returns all collisions, most severe first. Empty means no collision.
    pub async fn check_candidate(
        &self,
        candidate: &DuplicateCandidate,
        exclude_id: Option<i64>,
    ) -> Result<Vec<DuplicateConflict>, GuardError> {
        let mut conflicts = Vec::new();

        let name = candidate
            .name
            .as_deref()
            .filter(|n| !self.config.normalize(n).is_empty());
        let wants_name = self.config.is_enabled(DuplicateRule::Name);
        let wants_name_category = candidate.category_id.is_some()
            && self.config.is_enabled(DuplicateRule::NameCategory);

        if let Some(name) = name
            && (wants_name || wants_name_category)
        {
            let same = self.same_name(name, exclude_id).await?;

            if wants_name && let Some(existing) = same.first() {
                conflicts.push(
                    self.conflict_with(DuplicateRule::Name, candidate, existing, exclude_id)
                        .await?,
                );
            }

            if wants_name_category
                && let Some(existing) = same.iter().find(|p| p.category_id == candidate.category_id)
            {
                conflicts.push(
                    self.conflict_with(DuplicateRule::NameCategory, candidate, existing, exclude_id)
                        .await?,
                );
            }
        }

        if let Some(slug) = candidate.slug.as_deref().filter(|s| !s.trim().is_empty())
            && self.config.is_enabled(DuplicateRule::Slug)
            && let Some(existing) = self.store.find_by_slug(slug.trim()).await?
            && Some(existing.id) != exclude_id
            && self.config.normalize(&existing.slug) == self.config.normalize(slug)
        {
            conflicts.push(
                self.conflict_with(DuplicateRule::Slug, candidate, &existing, exclude_id)
                    .await?,
            );
        }

        if let Some(sku) = candidate.sku.as_deref().filter(|s| !s.trim().is_empty())
            && self.config.is_enabled(DuplicateRule::Sku)
            && let Some(existing) = self.store.find_by_sku(sku.trim()).await?
            && Some(existing.id) != exclude_id
            && self.config.normalize(&existing.sku) == self.config.normalize(sku)
        {
            conflicts.push(
                self.conflict_with(DuplicateRule::Sku, candidate, &existing, exclude_id)
                    .await?,
            );
        }

        // Stable: equal severities keep rule evaluation order
        conflicts.sort_by(|a, b| b.severity.cmp(&a.severity));
        Ok(conflicts)
    }

    /// Conflict for `candidate` colliding with `existing` under `rule`.
    ///
    /// Name rules carry a generated alternative name.
    pub async fn conflict_with(
        &self,
        rule: DuplicateRule,
        candidate: &DuplicateCandidate,
        existing: &Product,
        exclude_id: Option<i64>,
    ) -> Result<DuplicateConflict, GuardError> {
        let severity = self.config.severity(rule);
        let conflict = match rule {
            DuplicateRule::Name | DuplicateRule::NameCategory => {
                let name = candidate.name.as_deref().unwrap_or(&existing.name);
                let suggested = self
                    .generate_unique_name(name, candidate.category_id, exclude_id)
                    .await?;
                let (field, message, hint) = if rule == DuplicateRule::Name {
                    (
                        "name",
                        format!("A product named '{}' already exists", existing.name),
                        format!("Use a different name, for example '{suggested}'"),
                    )
                } else {
                    (
                        "name+category_id",
                        format!(
                            "A product named '{}' already exists in this category",
                            existing.name
                        ),
                        format!(
                            "Change the name (for example '{suggested}') or pick another category"
                        ),
                    )
                };
                DuplicateConflict {
                    rule,
                    field: field.into(),
                    value: name.to_string(),
                    existing_id: existing.id,
                    severity,
                    message,
                    suggestion: Suggestion {
                        message: hint,
                        suggested_name: Some(suggested),
                    },
                }
            }
            DuplicateRule::Slug => DuplicateConflict {
                rule,
                field: "slug".into(),
                value: candidate.slug.clone().unwrap_or_else(|| existing.slug.clone()),
                existing_id: existing.id,
                severity,
                message: format!("The slug '{}' is already in use", existing.slug),
                suggestion: Suggestion {
                    message: "A disambiguated slug will be generated automatically".into(),
                    suggested_name: None,
                },
            },
            DuplicateRule::Sku => DuplicateConflict {
                rule,
                field: "sku".into(),
                value: candidate.sku.clone().unwrap_or_else(|| existing.sku.clone()),
                existing_id: existing.id,
                severity,
                message: format!("The SKU '{}' is already assigned to another product", existing.sku),
                suggestion: Suggestion {
                    message: "The SKU must be regenerated; omit it to get a generated one".into(),
                    suggested_name: None,
                },
            },
        };
        Ok(conflict)
    }

    /// Ok when there is no collision, otherwise the most severe one
    pub async fn validate(
        &self,
        candidate: &DuplicateCandidate,
        exclude_id: Option<i64>,
    ) -> Result<(), CatalogError> {
        let conflicts = self.check_candidate(candidate, exclude_id).await?;
        match conflicts.into_iter().next() {
            None => Ok(()),
            Some(primary) => Err(CatalogError::Conflict(Box::new(primary))),
        }
    }

    async fn name_taken(
        &self,
        name: &str,
        category_id: Option<i64>,
        exclude_id: Option<i64>,
    ) -> Result<bool, GuardError> {
        let stored: Vec<Product> = self
            .store
            .find_by_name_key(&self.config.name_key(name))
            .await?
            .into_iter()
            .filter(|p| Some(p.id) != exclude_id)
            .collect();
        // The (name_key, category_id) index rejects these whatever rules are enabled
        if category_id.is_some() && stored.iter().any(|p| p.category_id == category_id) {
            return Ok(true);
        }
        if !self.config.is_enabled(DuplicateRule::Name) {
            return Ok(false);
        }
        let wanted = self.config.normalize(name);
        Ok(stored
            .iter()
            .any(|p| self.config.normalize(&p.name) == wanted))
    }

    /// First free name among `base`, `base (1)`, `base (2)`, ...; after
    /// [`MAX_ATTEMPTS`] tries, `base_<epoch millis>`.
    pub async fn generate_unique_name(
        &self,
        base: &str,
        category_id: Option<i64>,
        exclude_id: Option<i64>,
    ) -> Result<String, GuardError> {
        let base = base.trim();
        for attempt in 0..MAX_ATTEMPTS {
            let candidate = if attempt == 0 {
                base.to_string()
            } else {
                format!("{base} ({attempt})")
            };
            if !self.name_taken(&candidate, category_id, exclude_id).await? {
                return Ok(candidate);
            }
        }
        tracing::warn!(base, "Unique name attempts exhausted, using timestamp suffix");
        Ok(format!("{base}_{}", now_millis()))
    }

    /// Slug derived from `name` that no other product uses: `slug`, `slug-1`,
    /// `slug-2`, ...; after [`MAX_ATTEMPTS`] tries, `slug-<epoch millis>`.
    pub async fn generate_unique_slug(
        &self,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<String, GuardError> {
        let base = slugify(name);
        for attempt in 0..MAX_ATTEMPTS {
            let candidate = if attempt == 0 {
                base.clone()
            } else {
                format!("{base}-{attempt}")
            };
            match self.store.find_by_slug(&candidate).await? {
                Some(existing) if Some(existing.id) != exclude_id => continue,
                _ => return Ok(candidate),
            }
        }
        tracing::warn!(base = %base, "Unique slug attempts exhausted, using timestamp suffix");
        Ok(format!("{base}-{}", now_millis()))
    }

    fn group_key(&self, product: &Product) -> String {
        let category = product
            .category_id
            .map(|c| c.to_string())
            .unwrap_or_else(|| "none".to_string());
        format!("{}|{}", self.config.normalize(&product.name), category)
    }

    /// Group the whole catalog by normalized (name, category) in one pass
    pub async fn detect_all_duplicates(&self) -> Result<DuplicateReport, GuardError> {
        let products = self.store.find_all().await?;
        Ok(self.group_duplicates(&products))
    }

    fn group_duplicates(&self, products: &[Product]) -> DuplicateReport {
        let mut index: HashMap<String, usize> = HashMap::with_capacity(products.len());
        let mut buckets: Vec<(String, Vec<&Product>)> = Vec::new();

        for product in products {
            let key = self.group_key(product);
            match index.get(&key) {
                Some(&i) => buckets[i].1.push(product),
                None => {
                    index.insert(key.clone(), buckets.len());
                    buckets.push((key, vec![product]));
                }
            }
        }

        let mut groups: Vec<DuplicateGroup> = buckets
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(key, members)| {
                let keep = members
                    .iter()
                    .max_by_key(|p| p.created_at)
                    .map(|p| p.id)
                    .unwrap_or_default();
                DuplicateGroup {
                    suggestion: format!(
                        "Consolidate {} products named '{}': keep product {} (most recent) and merge or remove the others",
                        members.len(),
                        members[0].name,
                        keep
                    ),
                    count: members.len(),
                    products: members.into_iter().map(DuplicateMember::from).collect(),
                    key,
                }
            })
            .collect();
        groups.sort_by(|a, b| b.count.cmp(&a.count));

        let products_in_groups: usize = groups.iter().map(|g| g.count).sum();
        DuplicateReport {
            total_products: products.len(),
            duplicate_groups: groups.len(),
            summary: DuplicateSummary {
                products_in_groups,
                redundant_products: products_in_groups - groups.len(),
            },
            groups,
        }
    }

    /// Keep one product per normalized (name, category), preferring the most
    /// recently created, at the position where the key was first seen
    pub fn filter_duplicates(&self, products: Vec<Product>) -> FilteredProducts {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut items: Vec<Product> = Vec::with_capacity(products.len());
        let mut removed = 0;

        for product in products {
            let key = self.group_key(&product);
            match index.get(&key) {
                Some(&i) => {
                    removed += 1;
                    if product.created_at > items[i].created_at {
                        items[i] = product;
                    }
                }
                None => {
                    index.insert(key, items.len());
                    items.push(product);
                }
            }
        }

        FilteredProducts {
            items,
            removed,
            duplicates_found: removed > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::{MemoryCatalog, product};

    fn guard(store: &Arc<MemoryCatalog>) -> UniquenessGuard {
        UniquenessGuard::new(store.clone(), GuardConfig::default())
    }

    #[tokio::test]
    async fn test_no_conflict_on_empty_catalog() {
        let store = Arc::new(MemoryCatalog::new());
        let conflicts = guard(&store)
            .check_candidate(&DuplicateCandidate::named("Widget", Some(1)), None)
            .await
            .unwrap();
        assert!(conflicts.is_empty());
    }

    #[tokio::test]
    async fn test_name_collision_is_case_and_space_insensitive() {
        let store = Arc::new(MemoryCatalog::new());
        store.insert(product(10, "Widget", Some(1)));

        let conflicts = guard(&store)
            .check_candidate(&DuplicateCandidate::named("  wIDGET ", Some(1)), None)
            .await
            .unwrap();

        let rules: Vec<DuplicateRule> = conflicts.iter().map(|c| c.rule).collect();
        assert_eq!(rules, vec![DuplicateRule::NameCategory, DuplicateRule::Name]);
        assert!(conflicts.iter().all(|c| c.existing_id == 10));
        assert_eq!(conflicts[0].severity, Severity::Critical);
        assert_eq!(
            conflicts[0].suggestion.suggested_name.as_deref(),
            Some("wIDGET (1)")
        );
    }

    #[tokio::test]
    async fn test_same_name_other_category_hits_name_rule_only() {
        let store = Arc::new(MemoryCatalog::new());
        store.insert(product(10, "Widget", Some(1)));

        let conflicts = guard(&store)
            .check_candidate(&DuplicateCandidate::named("Widget", Some(2)), None)
            .await
            .unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].rule, DuplicateRule::Name);
        assert_eq!(conflicts[0].severity, Severity::High);
    }

    #[tokio::test]
    async fn test_excluded_field_disables_rule() {
        let store = Arc::new(MemoryCatalog::new());
        store.insert(product(10, "Widget", Some(1)));

        let mut config = GuardConfig::default();
        config.exclude_fields.insert(CandidateField::CategoryId);
        let guard = UniquenessGuard::new(store.clone(), config);

        let conflicts = guard
            .check_candidate(&DuplicateCandidate::named("Widget", Some(1)), None)
            .await
            .unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].rule, DuplicateRule::Name);
    }

    #[tokio::test]
    async fn test_case_sensitive_config() {
        let store = Arc::new(MemoryCatalog::new());
        store.insert(product(10, "Widget", Some(1)));

        let config = GuardConfig {
            case_sensitive: true,
            ..GuardConfig::default()
        };
        let guard = UniquenessGuard::new(store.clone(), config);
        let conflicts = guard
            .check_candidate(&DuplicateCandidate::named("widget", Some(1)), None)
            .await
            .unwrap();
        assert!(conflicts.is_empty());
    }

    #[tokio::test]
    async fn test_exclude_id_never_collides_with_itself() {
        let store = Arc::new(MemoryCatalog::new());
        let mut p = product(10, "Widget", Some(1));
        p.sku = "PRD-A".into();
        store.insert(p);

        let candidate = DuplicateCandidate::named("Widget", Some(1))
            .with_sku(Some("PRD-A".into()))
            .with_slug(Some("widget".into()));
        let conflicts = guard(&store)
            .check_candidate(&candidate, Some(10))
            .await
            .unwrap();
        assert!(conflicts.is_empty());
    }

    #[tokio::test]
    async fn test_severity_ordering_across_all_rules() {
        let store = Arc::new(MemoryCatalog::new());
        let mut a = product(1, "Lamp", Some(1));
        a.slug = "desk-lamp".into();
        store.insert(a);
        let mut b = product(2, "Chair", Some(1));
        b.sku = "PRD-XYZ".into();
        store.insert(b);

        let candidate = DuplicateCandidate::named("Lamp", Some(1))
            .with_slug(Some("desk-lamp".into()))
            .with_sku(Some("prd-xyz".into()));
        let conflicts = guard(&store).check_candidate(&candidate, None).await.unwrap();

        let rules: Vec<DuplicateRule> = conflicts.iter().map(|c| c.rule).collect();
        assert_eq!(
            rules,
            vec![
                DuplicateRule::NameCategory,
                DuplicateRule::Sku,
                DuplicateRule::Name,
                DuplicateRule::Slug,
            ]
        );
        assert_eq!(conflicts[1].existing_id, 2);
        assert!(conflicts[3].suggestion.suggested_name.is_none());
    }

    #[tokio::test]
    async fn test_validate_surfaces_primary_conflict() {
        let store = Arc::new(MemoryCatalog::new());
        store.insert(product(10, "Widget", Some(1)));
        let g = guard(&store);

        assert!(g
            .validate(&DuplicateCandidate::named("Gadget", Some(1)), None)
            .await
            .is_ok());

        match g
            .validate(&DuplicateCandidate::named("Widget", Some(1)), None)
            .await
        {
            Err(CatalogError::Conflict(c)) => {
                assert_eq!(c.rule, DuplicateRule::NameCategory);
                assert_eq!(c.existing_id, 10);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_unique_name_counts_up() {
        let store = Arc::new(MemoryCatalog::new());
        store.insert(product(1, "Widget", Some(1)));
        store.insert(product(2, "Widget (1)", Some(1)));
        let g = guard(&store);

        assert_eq!(
            g.generate_unique_name("Widget", Some(1), None).await.unwrap(),
            "Widget (2)"
        );
        assert_eq!(
            g.generate_unique_name("Gadget", Some(1), None).await.unwrap(),
            "Gadget"
        );
        // The excluded product does not block its own name
        assert_eq!(
            g.generate_unique_name("Widget", Some(1), Some(1)).await.unwrap(),
            "Widget"
        );
    }

    #[tokio::test]
    async fn test_generate_unique_name_falls_back_to_timestamp() {
        let store = Arc::new(MemoryCatalog::new());
        store.insert(product(1, "Widget", None));
        for n in 1..MAX_ATTEMPTS as i64 {
            store.insert(product(n + 1, &format!("Widget ({n})"), None));
        }

        let name = guard(&store)
            .generate_unique_name("Widget", None, None)
            .await
            .unwrap();
        let suffix = name.strip_prefix("Widget_").unwrap();
        assert!(suffix.parse::<i64>().is_ok());
    }

    #[tokio::test]
    async fn test_generate_unique_slug() {
        let store = Arc::new(MemoryCatalog::new());
        let g = guard(&store);
        assert_eq!(g.generate_unique_slug("Blue Widget", None).await.unwrap(), "blue-widget");

        let mut p = product(1, "Blue Widget", None);
        p.slug = "blue-widget".into();
        store.insert(p);
        let mut p = product(2, "Blue Widget 2", None);
        p.slug = "blue-widget-1".into();
        store.insert(p);

        assert_eq!(
            g.generate_unique_slug("Blue  Widget!", None).await.unwrap(),
            "blue-widget-2"
        );
        // Idempotent for the product that owns the slug
        assert_eq!(
            g.generate_unique_slug("Blue Widget", Some(1)).await.unwrap(),
            "blue-widget"
        );
        assert_eq!(g.generate_unique_slug("???", None).await.unwrap(), "product");
    }

    #[tokio::test]
    async fn test_store_failure_is_unavailable() {
        let store = Arc::new(MemoryCatalog::new());
        store.fail_lookups(true);
        let err = guard(&store)
            .check_candidate(&DuplicateCandidate::named("Widget", Some(1)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::Unavailable(_)));
        assert!(matches!(CatalogError::from(err), CatalogError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_detect_all_duplicates() {
        let store = Arc::new(MemoryCatalog::new());
        let mut a = product(1, "Widget", Some(1));
        a.created_at = 100;
        let mut b = product(2, " widget", Some(1));
        b.created_at = 300;
        let c = product(3, "Widget", Some(2));
        let d = product(4, "Gadget", None);
        let mut e = product(5, "GADGET", None);
        e.created_at = 50;
        let mut f = product(6, "gadget ", None);
        f.created_at = 60;
        for p in [a, b, c, d, e, f] {
            store.insert(p);
        }

        let report = guard(&store).detect_all_duplicates().await.unwrap();
        assert_eq!(report.total_products, 6);
        assert_eq!(report.duplicate_groups, 2);
        assert_eq!(report.groups[0].key, "gadget|none");
        assert_eq!(report.groups[0].count, 3);
        assert_eq!(report.groups[1].key, "widget|1");
        assert!(report.groups[1].suggestion.contains("keep product 2"));
        assert_eq!(
            report.summary,
            DuplicateSummary {
                products_in_groups: 5,
                redundant_products: 3,
            }
        );
    }

    #[test]
    fn test_filter_duplicates_keeps_newest_in_first_position() {
        let store = Arc::new(MemoryCatalog::new());
        let g = guard(&store);

        let mut a = product(1, "Widget", Some(1));
        a.created_at = 100;
        let b = product(2, "Chair", Some(1));
        let mut c = product(3, "WIDGET", Some(1));
        c.created_at = 200;
        let mut d = product(4, "widget", Some(1));
        d.created_at = 150;

        let filtered = g.filter_duplicates(vec![a, b, c, d]);
        let ids: Vec<i64> = filtered.items.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 2]);
        assert_eq!(filtered.removed, 2);
        assert!(filtered.duplicates_found);

        let clean = g.filter_duplicates(vec![product(9, "Solo", None)]);
        assert_eq!(clean.removed, 0);
        assert!(!clean.duplicates_found);
    }
}
