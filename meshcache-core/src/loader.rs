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

//! The user-supplied "load a value for a key" capability.

use async_trait::async_trait;
use meshcache_common::Error;

/// Loads the authoritative value for a key when it is missing from every
/// cache layer.
///
/// Deciding how to reach the source of truth is entirely the caller's
/// business — `Group` only ever invokes this trait.
#[async_trait]
pub trait Loader: Send + Sync + 'static {
    async fn load(&self, key: &str) -> Result<Vec<u8>, Error>;
}

/// Adapts a plain async function into a [`Loader`].
pub struct LoaderFn<F> {
    f: F,
}

impl<F> LoaderFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Loader for LoaderFn<F>
where
    F: Fn(&str) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Vec<u8>, Error>> + Send,
{
    async fn load(&self, key: &str) -> Result<Vec<u8>, Error> {
        (self.f)(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn function_adapter_round_trips() {
        let loader = LoaderFn::new(|key: &str| {
            let key = key.to_string();
            async move { Ok(key.into_bytes()) }
        });
        assert_eq!(loader.load("hello").await.unwrap(), b"hello".to_vec());
    }

    #[tokio::test]
    async fn function_adapter_propagates_errors() {
        let loader = LoaderFn::new(|_: &str| async { Err(Error::loader_failure("no source")) });
        assert!(loader.load("x").await.is_err());
    }
}
