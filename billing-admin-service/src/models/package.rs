use super::column;
use crate::services::query::{
    FilterField, FilterPredicate, MappingError, Operator, PredicateError, PredicateSet,
    QueryTemplate, SortDirection, SortField,
};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;

/// Internet package offered to customers.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub id: i64,
    pub name: String,
    /// Monthly price in minor currency units
    pub price: i64,
    /// Advertised speed, e.g. `20Mbps`
    pub speed: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The package fields embedded in customer and invoice rows.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageRef {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub speed: String,
}

#[derive(Debug, Clone)]
pub struct NewPackage {
    pub name: String,
    pub price: i64,
    pub speed: String,
}

#[derive(Debug, Clone, Copy)]
pub enum PackageFilter {
    Name,
    Speed,
}

impl FilterField for PackageFilter {
    fn key(self) -> &'static str {
        match self {
            PackageFilter::Name => "name",
            PackageFilter::Speed => "speed",
        }
    }

    fn column(self) -> &'static str {
        match self {
            PackageFilter::Name => "p.name",
            PackageFilter::Speed => "p.speed",
        }
    }

    fn allowed_operators(self) -> &'static [Operator] {
        &[Operator::ILike, Operator::Eq]
    }
}

#[derive(Debug, Clone, Copy)]
pub enum PackageSort {
    Name,
    Price,
    Speed,
    CreatedAt,
}

impl SortField for PackageSort {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "name" => Some(PackageSort::Name),
            "price" => Some(PackageSort::Price),
            "speed" => Some(PackageSort::Speed),
            "created_at" => Some(PackageSort::CreatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            PackageSort::Name => "p.name",
            PackageSort::Price => "p.price",
            PackageSort::Speed => "p.speed",
            PackageSort::CreatedAt => "p.created_at",
        }
    }
}

/// Optional list filters. Unset fields add no condition.
#[derive(Debug, Clone, Default)]
pub struct PackageFilters {
    pub name: Option<String>,
    pub speed: Option<String>,
}

impl PackageFilters {
    pub fn predicates(self) -> Result<PredicateSet, PredicateError> {
        Ok(PredicateSet::new()
            .with(FilterPredicate::new(PackageFilter::Name, Operator::ILike, self.name)?)
            .with(FilterPredicate::new(PackageFilter::Speed, Operator::ILike, self.speed)?))
    }
}

impl Package {
    pub const TEMPLATE: QueryTemplate = QueryTemplate {
        select: "SELECT p.id, p.name, p.price, p.speed, p.created_at, p.updated_at FROM packages p",
        count: "SELECT COUNT(*) FROM packages p",
        default_sort: "p.name",
        default_direction: SortDirection::Asc,
    };

    pub const ID_COLUMN: &'static str = "p.id";

    pub fn from_row(row: &PgRow) -> Result<Self, MappingError> {
        let price: i64 = column(row, "price")?;
        if price < 0 {
            return Err(MappingError::new("price", "negative price"));
        }

        Ok(Self {
            id: column(row, "id")?,
            name: column(row, "name")?,
            price,
            speed: column(row, "speed")?,
            created_at: column(row, "created_at")?,
            updated_at: column(row, "updated_at")?,
        })
    }
}

impl PackageRef {
    /// Read the `package_*` columns joined into another entity's row.
    pub(crate) fn from_joined_row(row: &PgRow) -> Result<Self, MappingError> {
        Ok(Self {
            id: column(row, "package_id")?,
            name: column(row, "package_name")?,
            price: column(row, "package_price")?,
            speed: column(row, "package_speed")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::query::{QueryComposer, SqlValue};

    #[test]
    fn test_filters_render_against_trusted_columns() {
        let predicates = PackageFilters {
            name: Some("fiber".to_string()),
            speed: None,
        }
        .predicates()
        .unwrap();

        let query = QueryComposer::count(&Package::TEMPLATE, &predicates);

        assert_eq!(query.sql, "SELECT COUNT(*) FROM packages p WHERE p.name ILIKE $1");
        assert_eq!(query.params, vec![SqlValue::Text("%fiber%".to_string())]);
    }

    #[test]
    fn test_sort_keys_map_to_columns() {
        assert_eq!(PackageSort::from_key("price").map(SortField::column), Some("p.price"));
        assert!(PackageSort::from_key("p.price; DROP TABLE packages").is_none());
    }
}
