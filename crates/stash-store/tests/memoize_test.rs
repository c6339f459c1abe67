mod common;

use std::borrow::Cow;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use common::memory_cache;
use serde::{Deserialize, Serialize};
use stash_store::stash_core::{KeyPart, ManualClock, cache_args};
use stash_store::{CacheAware, CacheStore, Memoized};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Filing {
    company: String,
    year: Option<u16>,
    form: String,
}

struct FilingService {
    cache: Option<CacheStore>,
    fetches: AtomicU32,
}

impl CacheAware for FilingService {
    fn cache_store(&self) -> Option<&CacheStore> {
        self.cache.as_ref()
    }
}

static SEARCH: Memoized = Memoized::new("search").with_params(&["company", "year"]);
static LATEST: Memoized = Memoized::new("latest").with_ttl(Duration::from_secs(60));

impl FilingService {
    fn new(cache: Option<CacheStore>) -> Self {
        Self {
            cache,
            fetches: AtomicU32::new(0),
        }
    }

    fn fetches(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// `search(company, year=None)`, callable positionally or by name.
    async fn search(
        &self,
        positional: &[&dyn KeyPart],
        named: &[(&str, &dyn KeyPart)],
        company: &str,
        year: Option<u16>,
    ) -> Vec<Filing> {
        SEARCH
            .call(self, SEARCH.bind(positional, named), || async {
                self.fetches.fetch_add(1, Ordering::SeqCst);
                vec![Filing {
                    company: company.to_string(),
                    year,
                    form: "10-K".to_string(),
                }]
            })
            .await
    }

    async fn latest(&self, company: &str) -> Result<Filing, String> {
        LATEST
            .try_call(self, cache_args!(company), || async {
                self.fetches.fetch_add(1, Ordering::SeqCst);
                if company.is_empty() {
                    return Err("company required".to_string());
                }
                Ok(Filing {
                    company: company.to_string(),
                    year: Some(2024),
                    form: "10-Q".to_string(),
                })
            })
            .await
    }

    fn count_blocking(&self, company: &str) -> u64 {
        SEARCH.call_blocking(self, cache_args!(company, kind = "count"), || {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            company.len() as u64
        })
    }

    fn parse_blocking(&self, raw: &str) -> Result<i64, std::num::ParseIntError> {
        LATEST.try_call_blocking(self, cache_args!(raw), || {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            raw.parse::<i64>()
        })
    }
}

#[tokio::test]
async fn test_hit_skips_operation() {
    let (cache, _clock) = memory_cache();
    let service = FilingService::new(Some(cache));

    let first = service.search(&[&"Acme"], &[], "Acme", None).await;
    let second = service.search(&[&"Acme"], &[], "Acme", None).await;

    assert_eq!(first, second);
    assert_eq!(service.fetches(), 1);
}

#[tokio::test]
async fn test_positional_and_keyword_calls_share_slot() {
    let (cache, _clock) = memory_cache();
    let service = FilingService::new(Some(cache.clone()));

    service.search(&[&"Acme"], &[], "Acme", None).await;
    service
        .search(&[], &[("company", &"Acme"), ("year", &None::<u16>)], "Acme", None)
        .await;

    assert_eq!(service.fetches(), 1);
    assert_eq!(cache.entry_count().await, Some(1));
}

#[tokio::test]
async fn test_namespace_is_owner_type() {
    let (cache, _clock) = memory_cache();
    let service = FilingService::new(Some(cache.clone()));

    service.search(&[&"Acme", &2023u16], &[], "Acme", Some(2023)).await;

    let stored = cache
        .get("FilingService", "search", &cache_args!(company = "Acme", year = 2023))
        .await;
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_without_cache_always_computes() {
    let service = FilingService::new(None);

    service.search(&[&"Acme"], &[], "Acme", None).await;
    service.search(&[&"Acme"], &[], "Acme", None).await;

    assert_eq!(service.fetches(), 2);
}

#[tokio::test]
async fn test_errors_are_not_cached() {
    let (cache, _clock) = memory_cache();
    let service = FilingService::new(Some(cache.clone()));

    assert!(service.latest("").await.is_err());
    assert!(service.latest("").await.is_err());
    assert_eq!(service.fetches(), 2);
    assert_eq!(cache.entry_count().await, Some(0));

    assert_eq!(service.latest("Acme").await.unwrap().form, "10-Q");
    assert_eq!(service.latest("Acme").await.unwrap().form, "10-Q");
    assert_eq!(service.fetches(), 3);
}

#[tokio::test]
async fn test_ttl_override_expires_entry() {
    let (cache, clock): (CacheStore, ManualClock) = memory_cache();
    let service = FilingService::new(Some(cache));

    service.latest("Acme").await.unwrap();
    clock.advance(chrono::Duration::seconds(61));
    service.latest("Acme").await.unwrap();

    assert_eq!(service.fetches(), 2);
}

#[tokio::test]
async fn test_undecodable_entry_is_a_miss() {
    let (cache, _clock) = memory_cache();
    let service = FilingService::new(Some(cache.clone()));

    // same slot, wrong shape
    cache
        .set("FilingService", "latest", &cache_args!(company = "Acme"), "garbage", None)
        .await;

    let filing = service.latest("Acme").await.unwrap();
    assert_eq!(filing.company, "Acme");
    assert_eq!(service.fetches(), 1);

    // recomputed value replaced the bad entry
    service.latest("Acme").await.unwrap();
    assert_eq!(service.fetches(), 1);

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.writes, 2);
}

#[tokio::test]
async fn test_unsigned_above_i64_max_is_served_from_cache() {
    let (cache, _clock) = memory_cache();
    let service = FilingService::new(Some(cache.clone()));
    let op = Memoized::new("largest_id");

    for _ in 0..3 {
        let id: u64 = op
            .call(&service, cache_args!(), || async {
                service.fetches.fetch_add(1, Ordering::SeqCst);
                u64::MAX
            })
            .await;
        assert_eq!(id, u64::MAX);
    }

    assert_eq!(service.fetches(), 1);
    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.writes, 1);
}

#[test]
fn test_blocking_memoization() {
    let (cache, _clock) = memory_cache();
    let service = FilingService::new(Some(cache));

    assert_eq!(service.count_blocking("Acme"), 4);
    assert_eq!(service.count_blocking("Acme"), 4);
    assert_eq!(service.fetches(), 1);

    assert!(service.parse_blocking("x").is_err());
    assert_eq!(service.parse_blocking("12").unwrap(), 12);
    assert_eq!(service.parse_blocking("12").unwrap(), 12);
    assert_eq!(service.fetches(), 3);
}

#[tokio::test]
async fn test_blocking_memoization_on_current_thread_still_computes() {
    let (cache, _clock) = memory_cache();
    let service = FilingService::new(Some(cache));

    // the cache refuses to block here, the operation still runs
    assert_eq!(service.count_blocking("Acme"), 4);
    assert_eq!(service.count_blocking("Acme"), 4);
    assert_eq!(service.fetches(), 2);
}

#[tokio::test]
async fn test_custom_namespace() {
    struct Renamed(CacheStore);

    impl CacheAware for Renamed {
        fn cache_store(&self) -> Option<&CacheStore> {
            Some(&self.0)
        }

        fn cache_namespace(&self) -> Cow<'static, str> {
            Cow::Borrowed("news")
        }
    }

    let (cache, _clock) = memory_cache();
    let owner = Renamed(cache.clone());
    let op = Memoized::new("headline");

    let value: String = op
        .call(&owner, cache_args!(), || async { "Acme rises".to_string() })
        .await;

    assert_eq!(value, "Acme rises");
    assert_eq!(cache.invalidate_namespace("news").await, 1);
}
