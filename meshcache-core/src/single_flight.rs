//  Copyright 2024 MrCroxx
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

//! Per-key request coalescing ("single flight").
//!
//! At most one call to the supplied future runs per key at a time; callers
//! that arrive while a call is in flight wait on it and receive the same
//! result instead of starting a redundant load. The table lock is held only
//! across registry lookup/install/delete, never across the caller's future,
//! so unrelated keys never head-of-line block on each other.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;

use meshcache_common::{Error, SharedError};
use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Coalesces concurrent loads for the same key.
///
/// `T` is the value every waiter of a cycle receives a clone of; the error
/// side is always a [`SharedError`] so it, too, can be fanned out cheaply.
pub struct SingleFlight<T> {
    calls: Mutex<HashMap<String, Vec<oneshot::Sender<Result<T, SharedError>>>>>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self { calls: Mutex::new(HashMap::new()) }
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` at most once for `key` among all callers whose calls overlap.
    ///
    /// If a call for `key` is already in flight, this registers a waiter and
    /// returns whatever that call eventually produces. Otherwise this becomes
    /// the executor: it runs `f`, stores the result, wakes every waiter that
    /// arrived meanwhile, clears the registry entry, and returns the result.
    /// A caller arriving after the entry is cleared starts a fresh cycle —
    /// `SingleFlight` coalesces, it does not memoize.
    pub async fn run<F, Fut>(&self, key: &str, f: F) -> Result<T, SharedError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        self.run_with(key, f, || {}).await
    }

    /// Like [`Self::run`], but invokes `on_coalesce` synchronously whenever
    /// this call joins an in-flight call as a waiter rather than becoming
    /// its executor. Used to feed coalescing metrics without complicating
    /// the common-case call site.
    pub async fn run_with<F, Fut, C>(&self, key: &str, f: F, on_coalesce: C) -> Result<T, SharedError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
        C: FnOnce(),
    {
        let mut calls = self.calls.lock();
        match calls.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let (tx, rx) = oneshot::channel();
                occupied.get_mut().push(tx);
                drop(calls);
                on_coalesce();
                rx.await.unwrap_or_else(|_| {
                    Err(SharedError::new(Error::loader_failure(
                        "single-flight executor dropped without delivering a result",
                    )))
                })
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Vec::new());
                drop(calls);

                let outcome = tokio::spawn(f()).await;
                let result: Result<T, SharedError> = match outcome {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(err)) => Err(SharedError::new(err)),
                    Err(join_err) => Err(SharedError::new(Error::loader_failure(format!(
                        "loader task panicked: {join_err}"
                    )))),
                };

                let waiters = self.calls.lock().remove(key).unwrap_or_default();
                for tx in waiters {
                    let _ = tx.send(result.clone());
                }
                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use meshcache_common::ErrorKind;

    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_calls_coalesce_to_one_execution() {
        let flight = Arc::new(SingleFlight::<i32>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let flight = flight.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                flight
                    .run("x", || {
                        let calls = calls.clone();
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            Ok::<_, Error>(42)
                        }
                    })
                    .await
            }));
        }

        for h in handles {
            assert_eq!(*h.await.unwrap().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn a_fresh_cycle_starts_after_the_prior_one_completes() {
        let flight = SingleFlight::<i32>::new();
        let calls = AtomicUsize::new(0);

        let run = |n: i32| async {
            flight
                .run("k", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { Ok::<_, Error>(n) }
                })
                .await
        };

        assert_eq!(*run(1).await.unwrap(), 1);
        assert_eq!(*run(2).await.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn error_is_delivered_verbatim_and_not_memoized() {
        let flight = SingleFlight::<i32>::new();
        let attempts = AtomicUsize::new(0);

        let result = flight
            .run("missing", || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(Error::loader_failure("no such key"))
            })
            .await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::LoaderFailure);

        let result = flight
            .run("missing", || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(Error::loader_failure("no such key"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2, "no negative caching: loader reran");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn a_panicking_loader_unblocks_every_waiter() {
        let flight = Arc::new(SingleFlight::<i32>::new());

        let mut handles = Vec::new();
        for i in 0..5 {
            let flight = flight.clone();
            handles.push(tokio::spawn(async move {
                flight
                    .run("panics", || async move {
                        tokio::time::sleep(Duration::from_millis(10 * i)).await;
                        if i == 0 {
                            panic!("boom");
                        }
                        Ok::<_, Error>(1)
                    })
                    .await
            }));
        }

        for h in handles {
            let outcome = h.await.unwrap();
            assert_eq!(outcome.unwrap_err().kind(), ErrorKind::LoaderFailure);
        }
    }
}
