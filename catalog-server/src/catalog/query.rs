//! Product query criteria
//!
//! [`QueryCriteriaBuilder`] turns loosely typed listing filters into a
//! store-agnostic [`QueryCriteria`]. It never touches the store; rendering the
//! criteria to SQL is the repository's job.

use serde::Deserialize;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Product attribute a predicate or ordering refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Name,
    Description,
    Price,
    Stock,
    Sku,
    CategoryId,
    /// Tag association (through `product_tag`)
    TagId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Gte,
    Lte,
    /// Substring match
    Contains,
    /// Membership in a list
    In,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    IntegerList(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: Field,
    pub op: Op,
    pub value: Value,
}

impl Predicate {
    pub fn new(field: Field, op: Op, value: Value) -> Self {
        Self { field, op, value }
    }
}

/// One AND-ed term of the criteria
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Predicate(Predicate),
    /// Satisfied when any of the predicates holds
    AnyOf(Vec<Predicate>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Category,
    Tags,
}

/// Related entity to load with the products
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationSpec {
    pub relation: Relation,
    /// Restricts the result set (inner join) instead of only enriching it
    pub filtering: bool,
}

/// Sortable product attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Id,
    Name,
    Price,
    Stock,
    Sku,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Parse against the allow-list; unknown names fall back to `CreatedAt`
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "id" => Self::Id,
            "name" => Self::Name,
            "price" => Self::Price,
            "stock" => Self::Stock,
            "sku" => Self::Sku,
            "createdAt" | "created_at" => Self::CreatedAt,
            "updatedAt" | "updated_at" => Self::UpdatedAt,
            _ => Self::CreatedAt,
        }
    }

    pub fn field(&self) -> Field {
        match self {
            Self::Id => Field::Id,
            Self::Name => Field::Name,
            Self::Price => Field::Price,
            Self::Stock => Field::Stock,
            Self::Sku => Field::Sku,
            Self::CreatedAt => Field::CreatedAt,
            Self::UpdatedAt => Field::UpdatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Store-agnostic description of a product listing
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCriteria {
    pub conditions: Vec<Condition>,
    pub relations: Vec<RelationSpec>,
    pub page: u32,
    pub page_size: u32,
    pub limit: u32,
    pub offset: u64,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl QueryCriteria {
    pub fn includes(&self, relation: Relation) -> bool {
        self.relations.iter().any(|r| r.relation == relation)
    }
}

impl Default for QueryCriteria {
    fn default() -> Self {
        QueryCriteriaBuilder::new().build()
    }
}

/// Which filter a condition came from; re-applying a filter replaces it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterKey {
    Category,
    Tags,
    PriceMin,
    PriceMax,
    Search,
    Sku,
    MinStock,
}

/// Fluent, by-value builder for [`QueryCriteria`]
#[derive(Debug, Clone)]
pub struct QueryCriteriaBuilder {
    conditions: Vec<(FilterKey, Condition)>,
    relations: Vec<RelationSpec>,
    page: u32,
    page_size: u32,
    sort_by: SortField,
    sort_order: SortOrder,
}

impl Default for QueryCriteriaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCriteriaBuilder {
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
            relations: Vec::new(),
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }

    fn set(mut self, key: FilterKey, condition: Condition) -> Self {
        match self.conditions.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = condition,
            None => self.conditions.push((key, condition)),
        }
        self
    }

    fn clear(mut self, key: FilterKey) -> Self {
        self.conditions.retain(|(k, _)| *k != key);
        self
    }

    fn relation(mut self, relation: Relation, filtering: bool) -> Self {
        self.relations.push(RelationSpec {
            relation,
            filtering,
        });
        self
    }

    pub fn filter_by_category(self, category_id: i64) -> Self {
        self.set(
            FilterKey::Category,
            Condition::Predicate(Predicate::new(
                Field::CategoryId,
                Op::Eq,
                Value::Integer(category_id),
            )),
        )
        .relation(Relation::Category, false)
    }

    /// Products carrying any of the given tags; an empty list clears the filter
    pub fn filter_by_tags(self, tag_ids: &[i64]) -> Self {
        if tag_ids.is_empty() {
            return self.clear(FilterKey::Tags);
        }
        let mut ids = tag_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        self.set(
            FilterKey::Tags,
            Condition::Predicate(Predicate::new(Field::TagId, Op::In, Value::IntegerList(ids))),
        )
        .relation(Relation::Tags, true)
    }

    pub fn filter_by_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        if let Some(min) = min {
            self = self.set(
                FilterKey::PriceMin,
                Condition::Predicate(Predicate::new(Field::Price, Op::Gte, Value::Float(min))),
            );
        }
        if let Some(max) = max {
            self = self.set(
                FilterKey::PriceMax,
                Condition::Predicate(Predicate::new(Field::Price, Op::Lte, Value::Float(max))),
            );
        }
        self
    }

    /// Free-text search over name and description; blank text clears it
    pub fn search(self, text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return self.clear(FilterKey::Search);
        }
        self.set(
            FilterKey::Search,
            Condition::AnyOf(vec![
                Predicate::new(Field::Name, Op::Contains, Value::Text(text.to_string())),
                Predicate::new(Field::Description, Op::Contains, Value::Text(text.to_string())),
            ]),
        )
    }

    pub fn filter_by_sku(self, sku: &str) -> Self {
        let sku = sku.trim();
        if sku.is_empty() {
            return self.clear(FilterKey::Sku);
        }
        self.set(
            FilterKey::Sku,
            Condition::Predicate(Predicate::new(Field::Sku, Op::Contains, Value::Text(sku.to_string()))),
        )
    }

    pub fn filter_by_min_stock(self, min_stock: i64) -> Self {
        self.set(
            FilterKey::MinStock,
            Condition::Predicate(Predicate::new(Field::Stock, Op::Gte, Value::Integer(min_stock))),
        )
    }

    pub fn with_category_details(self) -> Self {
        self.relation(Relation::Category, false)
    }

    pub fn with_tags(self) -> Self {
        self.relation(Relation::Tags, false)
    }

    /// Page numbers below 1 become 1; sizes are clamped to `1..=MAX_PAGE_SIZE`
    pub fn paginate(mut self, page: u32, page_size: u32) -> Self {
        self.page = page.max(1);
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn order_by(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_by = field;
        self.sort_order = order;
        self
    }

    /// Build from raw request filters; unparsable values count as absent
    pub fn from_filters(filters: &ProductFilters) -> Self {
        let mut builder = Self::new();

        if let Some(category_id) = parse_opt::<i64>(&filters.category_id) {
            builder = builder.filter_by_category(category_id);
        }
        if let Some(raw) = filters.tag_ids.as_deref() {
            builder = builder.filter_by_tags(&parse_id_list(raw));
        }
        builder = builder.filter_by_price_range(
            parse_opt::<f64>(&filters.price_min).filter(|v| v.is_finite()),
            parse_opt::<f64>(&filters.price_max).filter(|v| v.is_finite()),
        );
        if let Some(text) = filters.search.as_deref() {
            builder = builder.search(text);
        }
        if let Some(sku) = filters.sku.as_deref() {
            builder = builder.filter_by_sku(sku);
        }
        if filters.min_stock.is_some() {
            builder = builder.filter_by_min_stock(parse_opt::<i64>(&filters.min_stock).unwrap_or(0));
        }

        let page = parse_opt::<i64>(&filters.page).unwrap_or(DEFAULT_PAGE as i64);
        let page_size = parse_opt::<i64>(&filters.page_size).unwrap_or(DEFAULT_PAGE_SIZE as i64);
        builder = builder.paginate(clamp_u32(page), clamp_u32(page_size));

        let sort_by = filters
            .sort_by
            .as_deref()
            .map(SortField::parse)
            .unwrap_or_default();
        let sort_order = filters
            .sort_order
            .as_deref()
            .map(SortOrder::parse)
            .unwrap_or_default();
        builder.order_by(sort_by, sort_order)
    }

    /// Finish the criteria; relations requested more than once survive once,
    /// filtering if any request was filtering
    pub fn build(self) -> QueryCriteria {
        let mut relations: Vec<RelationSpec> = Vec::new();
        for spec in self.relations {
            match relations.iter_mut().find(|r| r.relation == spec.relation) {
                Some(existing) => existing.filtering |= spec.filtering,
                None => relations.push(spec),
            }
        }

        QueryCriteria {
            conditions: self.conditions.into_iter().map(|(_, c)| c).collect(),
            relations,
            page: self.page,
            page_size: self.page_size,
            limit: self.page_size,
            offset: u64::from(self.page.saturating_sub(1)).saturating_mul(u64::from(self.page_size)),
            sort_by: self.sort_by,
            sort_order: self.sort_order,
        }
    }
}

/// Raw listing filters as they arrive on the query string
///
/// Every field is kept as text so malformed values degrade to defaults
/// instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilters {
    #[serde(alias = "categoryId", alias = "category")]
    pub category_id: Option<String>,
    /// Comma-separated tag ids
    #[serde(alias = "tagIds", alias = "tags")]
    pub tag_ids: Option<String>,
    #[serde(alias = "priceMin", alias = "minPrice")]
    pub price_min: Option<String>,
    #[serde(alias = "priceMax", alias = "maxPrice")]
    pub price_max: Option<String>,
    #[serde(alias = "q")]
    pub search: Option<String>,
    pub sku: Option<String>,
    #[serde(alias = "minStock")]
    pub min_stock: Option<String>,
    pub page: Option<String>,
    #[serde(alias = "pageSize", alias = "limit")]
    pub page_size: Option<String>,
    #[serde(alias = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(alias = "sortOrder", alias = "order")]
    pub sort_order: Option<String>,
}

fn parse_opt<T: std::str::FromStr>(raw: &Option<String>) -> Option<T> {
    raw.as_deref().and_then(|s| s.trim().parse().ok())
}

fn clamp_u32(v: i64) -> u32 {
    v.clamp(1, u32::MAX as i64) as u32
}

/// Parse `"1, 2,x,3"` into `[1, 2, 3]`, skipping invalid items
pub fn parse_id_list(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|s| s.trim().parse::<i64>().ok())
        .collect()
}
