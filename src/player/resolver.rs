//! Signed url resolution
//!
//! Storage-backed assets are played through time-limited signed urls. The
//! resolver itself lives outside this crate; [`SignedUrlCache`] keeps the
//! most recent urls and re-signs them before they expire.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::error::PlaybackResult;

/// Re-signs a storage asset. May block on the network round-trip.
pub trait UrlResolver {
    fn resolve_playable_url(&mut self, asset_key: &str, ttl: Duration) -> PlaybackResult<String>;
}

impl<F> UrlResolver for F
where
    F: FnMut(&str, Duration) -> PlaybackResult<String>,
{
    fn resolve_playable_url(&mut self, asset_key: &str, ttl: Duration) -> PlaybackResult<String> {
        self(asset_key, ttl)
    }
}

/// Urls closer than this to expiry are treated as expired.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

struct SignedUrl {
    url: String,
    expires_at: Instant,
}

pub struct SignedUrlCache {
    resolver: Box<dyn UrlResolver>,
    ttl: Duration,
    urls: LruCache<String, SignedUrl>,
}

impl SignedUrlCache {
    pub fn new(resolver: Box<dyn UrlResolver>, ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            resolver,
            ttl,
            urls: LruCache::new(capacity),
        }
    }

    /// A playable url for `asset_key`, re-signed when missing or about to expire.
    pub fn resolve(&mut self, asset_key: &str, now: Instant) -> PlaybackResult<String> {
        if let Some(signed) = self.urls.get(asset_key) {
            if signed.expires_at > now + EXPIRY_MARGIN {
                return Ok(signed.url.clone());
            }
        }
        self.refresh(asset_key, now)
    }

    /// Always asks the resolver for a fresh url.
    pub fn refresh(&mut self, asset_key: &str, now: Instant) -> PlaybackResult<String> {
        self.urls.pop(asset_key);
        let url = self.resolver.resolve_playable_url(asset_key, self.ttl)?;
        log::debug!("SignedUrlCache: re-signed {}", asset_key);
        self.urls.put(
            asset_key.to_string(),
            SignedUrl {
                url: url.clone(),
                // An unrepresentable expiry re-signs on every use.
                expires_at: now.checked_add(self.ttl).unwrap_or(now),
            },
        );
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlaybackError;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting_cache(ttl: Duration) -> (SignedUrlCache, Rc<Cell<u32>>) {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let resolver = move |key: &str, _ttl: Duration| -> PlaybackResult<String> {
            counter.set(counter.get() + 1);
            Ok(format!("https://cdn.example.com/{}?sig={}", key, counter.get()))
        };
        (SignedUrlCache::new(Box::new(resolver), ttl, 2), calls)
    }

    #[test]
    fn test_resolve_uses_cache_until_expiry() {
        let (mut cache, calls) = counting_cache(Duration::from_secs(3600));
        let now = Instant::now();

        let first = cache.resolve("audio/s1.mp3", now).unwrap();
        let second = cache.resolve("audio/s1.mp3", now + Duration::from_secs(60)).unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);

        let late = now + Duration::from_secs(3590);
        let third = cache.resolve("audio/s1.mp3", late).unwrap();
        assert_ne!(first, third);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_refresh_always_resigns() {
        let (mut cache, calls) = counting_cache(Duration::from_secs(3600));
        let now = Instant::now();
        cache.resolve("k", now).unwrap();
        cache.refresh("k", now).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_capacity_evicts_least_recent() {
        let (mut cache, calls) = counting_cache(Duration::from_secs(3600));
        let now = Instant::now();
        cache.resolve("a", now).unwrap();
        cache.resolve("b", now).unwrap();
        cache.resolve("c", now).unwrap();
        cache.resolve("a", now).unwrap();
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_resolver_failure_propagates() {
        let resolver = |key: &str, _ttl: Duration| -> PlaybackResult<String> {
            Err(PlaybackError::UrlResolve {
                key: key.to_string(),
                reason: "403".to_string(),
            })
        };
        let mut cache = SignedUrlCache::new(Box::new(resolver), Duration::from_secs(60), 4);
        assert!(matches!(
            cache.resolve("k", Instant::now()),
            Err(PlaybackError::UrlResolve { .. })
        ));
    }
}
