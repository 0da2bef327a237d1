//! Page requests and page results.
//!
//! Mirrors the query contract of the dashboard frontend: zero-based `page`,
//! `size` defaulting to 10 and clamped to 2000, optional `sort=property[,dir]`.
//! `Page<T>` serializes in the same JSON shape the frontend already consumes
//! (`content`, `totalElements`, `totalPages`, `number`, ...).

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::CrmError;
use crate::types::Record;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 2000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub property: String,
    pub direction: Direction,
}

impl Sort {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Desc,
        }
    }

    /// Parse `property` or `property,asc|desc`.
    pub fn parse(raw: &str) -> Result<Self, CrmError> {
        let mut parts = raw.split(',').map(str::trim);
        let property = parts.next().unwrap_or_default();
        if property.is_empty() {
            return Err(CrmError::InvalidInput("empty sort property".into()));
        }
        let direction = match parts.next() {
            None => Direction::Asc,
            Some(d) if d.eq_ignore_ascii_case("asc") => Direction::Asc,
            Some(d) if d.eq_ignore_ascii_case("desc") => Direction::Desc,
            Some(other) => {
                return Err(CrmError::InvalidInput(format!(
                    "invalid sort direction '{other}'"
                )))
            }
        };
        if parts.next().is_some() {
            return Err(CrmError::InvalidInput(format!("malformed sort '{raw}'")));
        }
        Ok(Self {
            property: property.to_string(),
            direction,
        })
    }

    /// Reject properties the record kind does not expose.
    pub fn check_for<R: Record>(&self) -> Result<(), CrmError> {
        if R::SORTABLE.contains(&self.property.as_str()) {
            Ok(())
        } else {
            Err(CrmError::InvalidInput(format!(
                "unknown sort property '{}' for {}",
                self.property,
                R::KIND
            )))
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        write!(f, "{},{}", self.property, dir)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Option<Sort>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: None,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self::from_params(Some(page.into()), Some(size.into()))
    }

    /// Normalize raw query values: negative pages become 0, sizes below 1
    /// fall back to the default and sizes above the maximum are clamped.
    pub fn from_params(page: Option<i64>, size: Option<i64>) -> Self {
        let page = page.unwrap_or(0).clamp(0, i64::from(u32::MAX)) as u32;
        let size = match size {
            Some(s) if s >= 1 => s.min(i64::from(MAX_PAGE_SIZE)) as u32,
            _ => DEFAULT_PAGE_SIZE,
        };
        Self {
            page,
            size,
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u32,
    pub size: u32,
    pub total_elements: u64,
    pub sort: Option<Sort>,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            number: request.page,
            size: request.size,
            total_elements,
            sort: request.sort.clone(),
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 1;
        }
        self.total_elements.div_ceil(u64::from(self.size))
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    pub fn is_last(&self) -> bool {
        u64::from(self.number) + 1 >= self.total_pages()
    }
}

#[derive(Serialize)]
struct SortBody {
    sorted: bool,
    unsorted: bool,
    empty: bool,
}

impl SortBody {
    fn of(sort: &Option<Sort>) -> Self {
        let sorted = sort.is_some();
        Self {
            sorted,
            unsorted: !sorted,
            empty: !sorted,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageableBody {
    page_number: u32,
    page_size: u32,
    offset: u64,
    paged: bool,
    unpaged: bool,
    sort: SortBody,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageBody<'a, T> {
    content: &'a [T],
    pageable: PageableBody,
    total_elements: u64,
    total_pages: u64,
    number: u32,
    size: u32,
    number_of_elements: usize,
    first: bool,
    last: bool,
    empty: bool,
    sort: SortBody,
}

impl<T: Serialize> Serialize for Page<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PageBody {
            content: &self.content,
            pageable: PageableBody {
                page_number: self.number,
                page_size: self.size,
                offset: u64::from(self.number) * u64::from(self.size),
                paged: true,
                unpaged: false,
                sort: SortBody::of(&self.sort),
            },
            total_elements: self.total_elements,
            total_pages: self.total_pages(),
            number: self.number,
            size: self.size,
            number_of_elements: self.content.len(),
            first: self.is_first(),
            last: self.is_last(),
            empty: self.content.is_empty(),
            sort: SortBody::of(&self.sort),
        }
        .serialize(serializer)
    }
}
