#![allow(dead_code)]
use serde::Serialize;
use stash_core::{CacheArgs, CacheKey, KeyPart};

/// A filing record as a business operation would return it.
#[derive(Debug, Clone, Serialize)]
pub struct Filing {
    pub company: String,
    pub year: u16,
    pub form: String,
}

pub fn filing(company: &str, year: u16) -> Filing {
    Filing {
        company: company.to_string(),
        year,
        form: "10-K".to_string(),
    }
}

/// Parameters of `FilingService::search(company, year)`.
pub const SEARCH_PARAMS: [&str; 2] = ["company", "year"];

/// Key for a `search` call bound the way the memoizer binds it.
pub fn search_key(positional: &[&dyn KeyPart], named: &[(&str, &dyn KeyPart)]) -> CacheKey {
    CacheKey::new(
        "FilingService",
        "search",
        CacheArgs::bind(&SEARCH_PARAMS, positional, named),
    )
}
