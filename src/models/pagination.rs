//! 列表响应的统一结构

use serde::{Deserialize, Serialize};

/// One normalized list shape for every list endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Shapes the backend uses for lists: a bare array or a paginated wrapper.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListPayload<T> {
    Bare(Vec<T>),
    Paged {
        #[serde(alias = "data", alias = "results", alias = "content")]
        items: Vec<T>,
        #[serde(default)]
        total: Option<u64>,
    },
}

impl<T> From<ListPayload<T>> for Listing<T> {
    fn from(payload: ListPayload<T>) -> Self {
        match payload {
            ListPayload::Bare(items) => {
                let total = items.len() as u64;
                Self { items, total }
            }
            ListPayload::Paged { items, total } => {
                let total = total.unwrap_or(items.len() as u64);
                Self { items, total }
            }
        }
    }
}

impl<T> Listing<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
