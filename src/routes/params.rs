use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Default, Clone, Copy, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Page number, default 1
    pub page: Option<i64>,
    /// Items per page, default 20, at most 100
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    Oldest,
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockFilter {
    /// In stock but below the low-stock threshold.
    Low,
    Out,
}

/// Catalog filters. Pagination fields are inlined since query strings cannot carry
/// typed values through a flattened struct.
#[derive(Debug, Default, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Case-insensitive substring of the product name
    pub q: Option<String>,
    pub category_id: Option<Uuid>,
    #[param(inline)]
    pub stock: Option<StockFilter>,
    #[param(inline)]
    pub sort: Option<ProductSort>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        let p = Pagination {
            page: Some(0),
            per_page: Some(500),
        };
        assert_eq!(p.normalize(), (1, 100, 0));
        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
        let p = Pagination {
            page: Some(3),
            per_page: Some(10),
        };
        assert_eq!(p.normalize(), (3, 10, 20));

        let huge = Pagination {
            page: Some(i64::MAX),
            per_page: Some(20),
        };
        assert_eq!(huge.normalize(), (i64::MAX, 20, i64::MAX));
    }

    #[test]
    fn product_query_parses_sort_and_stock() {
        let query: ProductQuery =
            serde_json::from_value(serde_json::json!({ "sort": "price_desc", "stock": "low" }))
                .unwrap();
        assert_eq!(query.sort, Some(ProductSort::PriceDesc));
        assert_eq!(query.stock, Some(StockFilter::Low));
        assert_eq!(query.pagination().normalize(), (1, 20, 0));
    }
}
