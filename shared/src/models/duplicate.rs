//! Duplicate detection types
//!
//! Produced by the uniqueness guard: per-candidate conflicts and the
//! catalog-wide duplicate report.

use serde::{Deserialize, Serialize};

use super::Product;

/// Collision severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Uniqueness rule that produced a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateRule {
    /// Same normalized name anywhere in the catalog
    Name,
    /// Same normalized name inside the same category
    NameCategory,
    Slug,
    Sku,
}

impl DuplicateRule {
    /// Evaluation order used by the guard
    pub const ALL: [DuplicateRule; 4] = [
        DuplicateRule::Name,
        DuplicateRule::NameCategory,
        DuplicateRule::Slug,
        DuplicateRule::Sku,
    ];

    /// Candidate fields the rule reads
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Self::Name => &["name"],
            Self::NameCategory => &["name", "category_id"],
            Self::Slug => &["slug"],
            Self::Sku => &["sku"],
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            Self::NameCategory | Self::Sku => Severity::Critical,
            Self::Name | Self::Slug => Severity::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::NameCategory => "name_category",
            Self::Slug => "slug",
            Self::Sku => "sku",
        }
    }
}

/// Actionable hint attached to a conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub message: String,
    /// Alternate non-colliding name, for name based rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_name: Option<String>,
}

/// A single uniqueness collision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateConflict {
    pub rule: DuplicateRule,
    /// Offending field (`name`, `name+category_id`, `slug`, `sku`)
    pub field: String,
    /// Offending value as supplied by the caller
    pub value: String,
    pub existing_id: i64,
    pub severity: Severity,
    pub message: String,
    pub suggestion: Suggestion,
}

/// Product summary inside a duplicate group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateMember {
    pub id: i64,
    pub name: String,
    pub category_id: Option<i64>,
    pub slug: String,
    pub created_at: i64,
}

impl From<&Product> for DuplicateMember {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            category_id: p.category_id,
            slug: p.slug.clone(),
            created_at: p.created_at,
        }
    }
}

/// Products sharing a normalized (name, category) key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Normalized `name|category_id` key
    pub key: String,
    pub count: usize,
    pub products: Vec<DuplicateMember>,
    pub suggestion: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateSummary {
    /// Products that belong to some duplicate group
    pub products_in_groups: usize,
    /// Products that would be removed by keeping one per group
    pub redundant_products: usize,
}

/// Catalog-wide duplicate scan result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub total_products: usize,
    pub duplicate_groups: usize,
    pub groups: Vec<DuplicateGroup>,
    pub summary: DuplicateSummary,
}

/// Result set with duplicates removed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilteredProducts {
    pub items: Vec<Product>,
    pub removed: usize,
    pub duplicates_found: bool,
}
