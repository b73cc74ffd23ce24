//! Pagination Engine: one window of a filtered scan plus the matching total, read concurrently.

use crate::criteria::Criteria;
use crate::entity::{Entity, EntityField};
use crate::error::{AppError, ValidationKind};
use crate::store::{Direction, EntityStore, ScanQuery, Sort};
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OversizePolicy {
    Clamp,
    Reject,
}

#[derive(Clone, Copy, Debug)]
pub struct PageLimits {
    pub default_limit: u64,
    pub max_limit: u64,
    pub oversize: OversizePolicy,
}

impl Default for PageLimits {
    fn default() -> Self {
        PageLimits {
            default_limit: 20,
            max_limit: 1000,
            oversize: OversizePolicy::Clamp,
        }
    }
}

/// Caller's window request. `limit: None` takes the configured default.
#[derive(Clone, Debug, PartialEq)]
pub struct PageRequest<F> {
    pub offset: u64,
    pub limit: Option<u64>,
    pub sort: Vec<Sort<F>>,
}

impl<F> Default for PageRequest<F> {
    fn default() -> Self {
        PageRequest {
            offset: 0,
            limit: None,
            sort: Vec::new(),
        }
    }
}

impl<F> PageRequest<F> {
    pub fn new(offset: u64, limit: u64) -> Self {
        PageRequest {
            offset,
            limit: Some(limit),
            sort: Vec::new(),
        }
    }

    pub fn sorted_by(mut self, sort: Sort<F>) -> Self {
        self.sort.push(sort);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageLinks {
    pub first: Window,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<Window>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Window>,
    pub last: Window,
}

/// Navigation derived from offset, limit and total only.
pub fn page_links(offset: u64, limit: u64, total: u64) -> PageLinks {
    if limit == 0 {
        let only = Window { offset: 0, limit: 0 };
        return PageLinks {
            first: only,
            prev: None,
            next: None,
            last: only,
        };
    }
    let last_offset = if total == 0 { 0 } else { (total - 1) / limit * limit };
    let prev = (offset > 0).then(|| Window {
        offset: offset.saturating_sub(limit).min(last_offset),
        limit,
    });
    let next = (offset.saturating_add(limit) < total).then(|| Window {
        offset: offset + limit,
        limit,
    });
    PageLinks {
        first: Window { offset: 0, limit },
        prev,
        next,
        last: Window {
            offset: last_offset,
            limit,
        },
    }
}

#[derive(Clone, Debug)]
pub struct Page<E> {
    pub items: Vec<E>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

impl<E> Page<E> {
    pub fn links(&self) -> PageLinks {
        page_links(self.offset, self.limit, self.total)
    }
}

/// Apply defaults, the limit policy and the sort allow-list.
pub fn normalize<E: Entity>(
    request: PageRequest<E::Field>,
    limits: &PageLimits,
) -> Result<(u64, u64, Vec<Sort<E::Field>>), AppError> {
    let mut limit = request.limit.unwrap_or(limits.default_limit);
    if limit > limits.max_limit {
        match limits.oversize {
            OversizePolicy::Clamp => limit = limits.max_limit,
            OversizePolicy::Reject => {
                return Err(AppError::field_validation(
                    ValidationKind::LimitTooLarge,
                    E::NAME,
                    "limit",
                    format!("limit must be at most {}", limits.max_limit),
                ))
            }
        }
    }
    if let Some(s) = request.sort.iter().find(|s| !s.field.def().sortable) {
        return Err(AppError::field_validation(
            ValidationKind::UnsortableField,
            E::NAME,
            s.field.name(),
            format!("cannot sort by {}", s.field.name()),
        ));
    }
    Ok((request.offset, limit, request.sort))
}

/// Issue the count and the bounded scan together; fail the page if either fails.
pub async fn fetch_page<E: Entity>(
    store: &dyn EntityStore<E>,
    criteria: Criteria<E::Field>,
    request: PageRequest<E::Field>,
    limits: &PageLimits,
) -> Result<Page<E>, AppError> {
    let (offset, limit, sort) = normalize::<E>(request, limits)?;
    let query = ScanQuery {
        criteria: criteria.clone(),
        sort,
        offset,
        limit: Some(limit),
    };
    let items = async move {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let bound = usize::try_from(limit).unwrap_or(usize::MAX);
        store.scan(query).take(bound).try_collect::<Vec<E>>().await
    };
    let (total, items) = tokio::try_join!(store.count_matching(&criteria), items)?;
    tracing::debug!(entity = E::NAME, offset, limit, total, returned = items.len(), "page");
    Ok(Page {
        items,
        total,
        offset,
        limit,
    })
}

/// Read `offset`, `limit` and repeatable `sort=field[,asc|desc]` from query pairs.
pub fn parse_page_request<'a, E, I>(params: I) -> Result<PageRequest<E::Field>, AppError>
where
    E: Entity,
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut request = PageRequest::default();
    for (key, raw) in params {
        match key {
            "offset" => {
                let n: i64 = raw.trim().parse().map_err(|_| bad_number::<E>("offset", raw))?;
                request.offset = u64::try_from(n).map_err(|_| {
                    AppError::field_validation(
                        ValidationKind::BadOffset,
                        E::NAME,
                        "offset",
                        "offset must not be negative",
                    )
                })?;
            }
            "limit" => {
                let n: u64 = raw.trim().parse().map_err(|_| bad_number::<E>("limit", raw))?;
                request.limit = Some(n);
            }
            "sort" => request.sort.push(parse_sort::<E>(raw)?),
            _ => {}
        }
    }
    Ok(request)
}

fn parse_sort<E: Entity>(raw: &str) -> Result<Sort<E::Field>, AppError> {
    let (name, dir) = match raw.split_once(',') {
        Some((name, dir)) => (name.trim(), dir.trim()),
        None => (raw.trim(), "asc"),
    };
    let field = E::Field::parse(name).ok_or_else(|| {
        AppError::field_validation(
            ValidationKind::UnknownField,
            E::NAME,
            name,
            format!("unknown sort field '{}'", name),
        )
    })?;
    let direction = if dir.eq_ignore_ascii_case("asc") {
        Direction::Asc
    } else if dir.eq_ignore_ascii_case("desc") {
        Direction::Desc
    } else {
        return Err(AppError::field_validation(
            ValidationKind::InvalidValue,
            E::NAME,
            "sort",
            format!("invalid sort direction '{}'", dir),
        ));
    };
    Ok(Sort { field, direction })
}

fn bad_number<E: Entity>(name: &'static str, raw: &str) -> AppError {
    AppError::field_validation(
        ValidationKind::InvalidValue,
        E::NAME,
        name,
        format!("{} must be an integer, got '{}'", name, raw),
    )
}
