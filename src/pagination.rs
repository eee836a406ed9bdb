use serde::{Deserialize, Serialize};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 1000;
const DEFAULT_SORT: &str = "id.asc";

/// ListQuery
///
/// Query parameters accepted by the collection endpoints. Values are parsed leniently:
/// anything that is not a positive integer falls back to the default.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page_size: Option<String>,
    pub current_page: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: &'static str,
    pub order: SortOrder,
}

/// PageRequest
///
/// A resolved listing request: bounds plus an ORDER BY made only of whitelisted columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page_size: i64,
    pub current_page: i64,
    pub sort: Vec<SortKey>,
}

impl PageRequest {
    pub fn from_query(query: &ListQuery, sortable: &[&'static str]) -> Self {
        let page_size =
            positive_or(query.page_size.as_deref(), DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
        let current_page = positive_or(query.current_page.as_deref(), 1);
        let sort = parse_sort(query.sort.as_deref().unwrap_or(DEFAULT_SORT), sortable);

        Self {
            page_size,
            current_page,
            sort,
        }
    }

    pub fn offset(&self) -> i64 {
        self.page_size.saturating_mul(self.current_page - 1)
    }

    /// Renders `ORDER BY ...`, defaulting to `id ASC` when no usable key was given.
    pub fn order_by(&self) -> String {
        if self.sort.is_empty() {
            return "ORDER BY id ASC".to_string();
        }
        let keys: Vec<String> = self
            .sort
            .iter()
            .map(|key| format!("{} {}", key.column, key.order.as_sql()))
            .collect();
        format!("ORDER BY {}", keys.join(", "))
    }

    pub fn info(&self, count: i64) -> PageInfo {
        PageInfo {
            count,
            current_page: self.current_page,
            page_size: self.page_size,
            pages: (count + self.page_size - 1) / self.page_size,
        }
    }
}

/// Paging metadata returned alongside each listed collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub count: i64,
    pub current_page: i64,
    pub page_size: i64,
    pub pages: i64,
}

/// parse_sort
///
/// Parses `field.order` segments separated by `,` or `;`, e.g. `id.asc,name.desc`.
/// Segments with an unknown field or an order other than asc/desc are dropped.
pub fn parse_sort(raw: &str, sortable: &[&'static str]) -> Vec<SortKey> {
    raw.split([',', ';'])
        .filter_map(|segment| {
            let (field, order) = segment.trim().split_once('.')?;
            let column = *sortable.iter().find(|column| **column == field)?;
            let order = match order.to_ascii_uppercase().as_str() {
                "ASC" => SortOrder::Asc,
                "DESC" => SortOrder::Desc,
                _ => return None,
            };
            Some(SortKey { column, order })
        })
        .collect()
}

fn positive_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}
