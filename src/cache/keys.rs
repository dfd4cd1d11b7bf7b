//! Cache key derivation.
//!
//! A key is `<resource>[/<id>]?<sorted query>#<caller scope>`. Parameters are
//! sorted by name and blank values are dropped, so requests that differ only in
//! parameter order or empty fields share an entry. The scope is a truncated
//! SHA-256 of the bearer token, which keeps one caller's responses away from
//! another's without holding the token itself in memory.

use std::fmt;

use sha2::{Digest, Sha256};
use url::form_urlencoded;

use crate::domain::{auth::BearerToken, resource::Resource};

const ANONYMOUS_SCOPE: &str = "anon";
const FINGERPRINT_BYTES: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn builder(resource: Resource) -> CacheKeyBuilder {
        CacheKeyBuilder {
            path: resource.as_str().to_string(),
            params: Vec::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    path: String,
    params: Vec<(String, String)>,
}

impl CacheKeyBuilder {
    pub fn entity(mut self, id: &str) -> Self {
        self.path.push('/');
        self.path
            .extend(form_urlencoded::byte_serialize(id.trim().as_bytes()));
        self
    }

    pub fn param(mut self, name: &str, value: Option<&str>) -> Self {
        if let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) {
            self.params.push((name.to_string(), value.to_string()));
        }
        self
    }

    pub fn params<N, V>(self, pairs: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: AsRef<str>,
        V: AsRef<str>,
    {
        pairs.into_iter().fold(self, |builder, (name, value)| {
            builder.param(name.as_ref(), Some(value.as_ref()))
        })
    }

    pub fn build(mut self, bearer: Option<&BearerToken>) -> CacheKey {
        self.params.sort();
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish();
        CacheKey(format!(
            "{}?{}#{}",
            self.path,
            query,
            token_fingerprint(bearer)
        ))
    }
}

/// Short stable identifier for the caller, or `anon` without a token.
pub fn token_fingerprint(bearer: Option<&BearerToken>) -> String {
    match bearer {
        Some(token) => {
            let digest = Sha256::digest(token.as_str().as_bytes());
            hex::encode(&digest[..FINGERPRINT_BYTES])
        }
        None => ANONYMOUS_SCOPE.to_string(),
    }
}
