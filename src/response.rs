//! Standard response envelope helpers.

use crate::service::{Page, PageLinks};
use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
}

#[derive(Serialize)]
pub struct SuccessPage<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[derive(Serialize)]
pub struct PageMeta {
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
    pub links: PageLinks,
}

#[derive(Serialize)]
pub struct MetaCount {
    pub count: u64,
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::CREATED, Json(SuccessOne { data }))
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::OK, Json(SuccessOne { data }))
}

pub fn success_page<T: Serialize>(page: Page<T>) -> (StatusCode, Json<SuccessPage<T>>) {
    let meta = PageMeta {
        total: page.total,
        offset: page.offset,
        limit: page.limit,
        links: page.links(),
    };
    (
        StatusCode::OK,
        Json(SuccessPage {
            data: page.items,
            meta,
        }),
    )
}

pub fn success_count(count: u64) -> (StatusCode, Json<SuccessOne<MetaCount>>) {
    (StatusCode::OK, Json(SuccessOne { data: MetaCount { count } }))
}
