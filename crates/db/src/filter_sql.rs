//! Render a composed [`ListingQuery`] into a parameterised WHERE clause.
//!
//! Each predicate becomes one condition; the visibility rule is always
//! appended. Values are never interpolated, only `$n` placeholders.

use estate_core::filter::Predicate;
use estate_core::listing::ListingStatus;
use estate_core::query::{ListingQuery, Sort, Visibility};
use estate_core::types::{DbId, Decimal};

/// Typed bind value for dynamically-built listing queries.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Numeric(Decimal),
    Int(i32),
    Id(DbId),
    TextArray(Vec<String>),
}

/// A rendered WHERE clause (always non-empty) plus its binds in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFilterSql {
    pub where_clause: String,
    pub binds: Vec<BindValue>,
    /// Placeholder index to use for the next bind (LIMIT/OFFSET).
    pub next_idx: u32,
}

pub fn build_listing_filter(query: &ListingQuery) -> ListingFilterSql {
    let mut conditions: Vec<String> = Vec::new();
    let mut binds: Vec<BindValue> = Vec::new();
    let mut bind_idx = 1u32;

    for predicate in &query.predicates {
        let column = predicate.column();
        let (condition, value) = match predicate {
            Predicate::TextContains { needle, .. } => (
                format!("{column} ILIKE ${bind_idx}"),
                BindValue::Text(format!("%{}%", escape_like(needle))),
            ),
            Predicate::AtLeast { bound, .. } => {
                (format!("{column} >= ${bind_idx}"), BindValue::Numeric(*bound))
            }
            Predicate::AtMost { bound, .. } => {
                (format!("{column} <= ${bind_idx}"), BindValue::Numeric(*bound))
            }
            Predicate::CountEquals { value, .. } => {
                (format!("{column} = ${bind_idx}"), BindValue::Int(*value))
            }
            Predicate::TypeIs(property_type) => (
                format!("{column} = ${bind_idx}"),
                BindValue::Text(property_type.as_str().to_string()),
            ),
            Predicate::HasAmenities(amenities) => (
                format!("{column} @> ${bind_idx}"),
                BindValue::TextArray(amenities.clone()),
            ),
        };
        conditions.push(condition);
        binds.push(value);
        bind_idx += 1;
    }

    let published = ListingStatus::Published.as_str();
    let draft = ListingStatus::Draft.as_str();
    let archived = ListingStatus::Archived.as_str();
    match query.visibility {
        Visibility::Published => conditions.push(format!("status = '{published}'")),
        Visibility::PublishedOrDraftsOf(dealer_id) => {
            conditions.push(format!(
                "(status = '{published}' OR (status = '{draft}' AND dealer_id = ${bind_idx}))"
            ));
            binds.push(BindValue::Id(dealer_id));
            bind_idx += 1;
        }
        Visibility::OwnedBy(dealer_id) => {
            conditions.push(format!(
                "dealer_id = ${bind_idx} AND status <> '{archived}'"
            ));
            binds.push(BindValue::Id(dealer_id));
            bind_idx += 1;
        }
    }

    ListingFilterSql {
        where_clause: format!("WHERE {}", conditions.join(" AND ")),
        binds,
        next_idx: bind_idx,
    }
}

/// `ORDER BY` for a sort; ties break on id in the same direction.
pub fn order_by(sort: Sort) -> String {
    let dir = sort.direction.keyword();
    format!("ORDER BY {} {dir}, id {dir}", sort.key.column())
}

/// Escape LIKE metacharacters so user text matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.trim().chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
