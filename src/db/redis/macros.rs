/// Read-through caching for lookups that may find nothing.
///
/// Returns the cached value when present. Otherwise awaits `$block`, which
/// must yield `AppResult<Option<T>>`, and queues a cache write for `Some`
/// results only, so misses are always retried against the store. A failed
/// cache read is logged and treated as a miss.
///
/// # Arguments
/// * `$cache`: a [`Cache`](crate::db::Cache)
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to read and write
/// * `$ttl`: time-to-live in seconds
/// * `$block`: future producing the value on a miss
///
/// # Example
/// ```rust,ignore
/// let movie = cached!(cache, CacheKey::Movie(id.clone()), ttl, store.find_movie_by_id(&id))?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => Ok(Some(cached)),
            other => {
                if let Err(e) = other {
                    tracing::warn!(key = %key, error = %e, "Cache read failed");
                }
                match $block.await {
                    Ok(Some(value)) => {
                        $cache.set_in_background(&key, &value, $ttl);
                        Ok(Some(value))
                    }
                    result => result,
                }
            }
        }
    }};
}
