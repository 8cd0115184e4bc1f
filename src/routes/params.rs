use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn page(page: i64) -> Self {
        Self {
            page: Some(page),
            per_page: None,
        }
    }

    /// `(page, per_page, offset)`; `default_per_page` applies when the
    /// client does not ask for a page size. Huge page numbers saturate, so
    /// they land past the last row instead of overflowing.
    pub fn normalize(&self, default_per_page: i64) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(default_per_page).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}
