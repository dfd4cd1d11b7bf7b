use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::http::StatusCode;
use bytes::Bytes;
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::application::error::ProxyError;
use crate::application::gateway::{
    RequestBody, UploadPart, UpstreamGateway, UpstreamReply, UpstreamRequest,
};
use crate::application::normalize::{Normalized, Normalizer};
use crate::application::search;
use crate::cache::{CacheKey, ResponseStore, SingleFlight};
use crate::domain::auth::BearerToken;
use crate::domain::content::{ContentNode, assemble_content_tree};
use crate::domain::envelope::{Envelope, ListPage};
use crate::domain::lenient;
use crate::domain::resource::Resource;
use crate::domain::search::SearchResponse;

pub const MISSING_ID: &str = "Thiếu id";
pub const MISSING_BOOK_ID: &str = "Thiếu book_id";
pub const MISSING_SEARCH_TERM: &str = "Thiếu từ khóa tìm kiếm";
pub const MISSING_ACTIVATION_FIELDS: &str = "Thiếu code_id hoặc book_code";
pub const MISSING_UPLOAD: &str = "Thiếu tệp tải lên";

const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    /// Served from the response store.
    Cache,
    /// Freshly normalized upstream data; eligible for caching.
    Upstream,
    /// Upstream body forwarded as-is; never cached.
    Passthrough,
}

/// Body ready to be written to the browser.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Bytes,
    pub source: ReplySource,
}

impl Reply {
    fn cached(body: Bytes) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: JSON_CONTENT_TYPE.to_string(),
            body,
            source: ReplySource::Cache,
        }
    }

    fn canonical<T: Serialize>(value: &T) -> Result<Self, ProxyError> {
        let body = serde_json::to_vec(value)
            .map_err(|err| ProxyError::internal(format!("failed to serialize response: {err}")))?;
        Ok(Self {
            status: StatusCode::OK,
            content_type: JSON_CONTENT_TYPE.to_string(),
            body: Bytes::from(body),
            source: ReplySource::Upstream,
        })
    }

    fn passthrough(reply: UpstreamReply) -> Self {
        Self {
            status: StatusCode::from_u16(reply.status).unwrap_or(StatusCode::OK),
            content_type: reply
                .content_type
                .unwrap_or_else(|| JSON_CONTENT_TYPE.to_string()),
            body: reply.body,
            source: ReplySource::Passthrough,
        }
    }
}

/// Query parameters accepted by list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub take: Option<String>,
    pub sort_field: Option<String>,
    pub sort_type: Option<String>,
    pub search: Option<String>,
    pub book_id: Option<String>,
}

impl ListParams {
    fn resolved_take(&self, default_take: NonZeroU32) -> u32 {
        self.take
            .as_deref()
            .and_then(|raw| raw.trim().parse::<NonZeroU32>().ok())
            .unwrap_or(default_take)
            .get()
    }

    // `take` is resolved separately so the upstream and the cache key agree on it.
    fn forwarded(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("page", self.page.as_deref()),
            ("sort_field", self.sort_field.as_deref()),
            ("sort_type", self.sort_type.as_deref()),
            ("search", self.search.as_deref()),
            ("book_id", self.book_id.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(|value| (name, value))
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ActivationRequest {
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub code_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub book_code: Option<String>,
}

/// Orchestrates cache, single-flight, upstream gateway and the shape
/// reconcilers for every proxied endpoint.
pub struct ContentService {
    gateway: Arc<dyn UpstreamGateway>,
    cache: Arc<dyn ResponseStore>,
    flights: SingleFlight<Result<Reply, ProxyError>>,
    normalizer: Normalizer,
    default_take: NonZeroU32,
}

impl ContentService {
    pub fn new(
        gateway: Arc<dyn UpstreamGateway>,
        cache: Arc<dyn ResponseStore>,
        default_take: NonZeroU32,
    ) -> Self {
        Self {
            gateway,
            cache,
            flights: SingleFlight::new(),
            normalizer: Normalizer::default(),
            default_take,
        }
    }

    pub fn cache(&self) -> &Arc<dyn ResponseStore> {
        &self.cache
    }

    /// Single record of `resource`, wrapped in the success envelope.
    pub async fn entity(
        &self,
        resource: Resource,
        id: &str,
        bearer: Option<BearerToken>,
    ) -> Result<Reply, ProxyError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ProxyError::validation(MISSING_ID));
        }

        let key = CacheKey::builder(resource).entity(id).build(bearer.as_ref());
        self.cached(key, resource, || async {
            let request = UpstreamRequest::get([resource.as_str(), id]).bearer(bearer.clone());
            let reply = self.fetch(request).await?;
            let Some(payload) = parse_payload(&reply, resource.as_str()) else {
                return Ok(Reply::passthrough(reply));
            };

            let entity = match payload {
                Value::Object(mut fields) if fields.contains_key("data") => {
                    fields.remove("data").unwrap_or(Value::Null)
                }
                other => other,
            };
            Reply::canonical(&Envelope::success(entity))
        })
        .await
    }

    /// Normalized page of `resource`.
    pub async fn list(
        &self,
        resource: Resource,
        params: &ListParams,
        bearer: Option<BearerToken>,
    ) -> Result<Reply, ProxyError> {
        self.paged(resource, params, bearer, Ok).await
    }

    /// Menu entries of one book, assembled into chapter/exam trees.
    pub async fn menu_tree(
        &self,
        params: &ListParams,
        bearer: Option<BearerToken>,
    ) -> Result<Reply, ProxyError> {
        let has_book = params
            .book_id
            .as_deref()
            .is_some_and(|book_id| !book_id.trim().is_empty());
        if !has_book {
            return Err(ProxyError::validation(MISSING_BOOK_ID));
        }

        self.paged(Resource::MenuBook, params, bearer, |page| {
            let page = page.map(read_nodes);
            let pagination = page.pagination;
            let tree = assemble_content_tree(page.data);
            if tree.dropped > 0 {
                debug!(
                    dropped = tree.dropped,
                    "menu entries whose parent is not on this page were dropped"
                );
            }
            Ok(ListPage {
                pagination,
                data: tree.roots,
            })
        })
        .await
    }

    /// Cross-type search. Results are computed per call and never cached.
    pub async fn search(
        &self,
        term: Option<&str>,
        bearer: Option<BearerToken>,
    ) -> Result<Reply, ProxyError> {
        let term = term
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .ok_or_else(|| ProxyError::validation(MISSING_SEARCH_TERM))?;

        let request = UpstreamRequest::get(["search"])
            .query("search", term)
            .bearer(bearer);
        let reply = self.fetch(request).await?;
        let Some(payload) = parse_payload(&reply, "search") else {
            return Ok(Reply::passthrough(reply));
        };

        let results = search::aggregate(&payload);
        debug!(
            term,
            total = results.counts().total,
            "search results aggregated"
        );
        Reply::canonical(&Envelope::success(SearchResponse::from(results)))
    }

    /// Forwards a book-code activation. The upstream body is returned as-is.
    pub async fn activate(
        &self,
        request: ActivationRequest,
        bearer: Option<BearerToken>,
    ) -> Result<Reply, ProxyError> {
        let (Some(code_id), Some(book_code)) = (request.code_id, request.book_code) else {
            return Err(ProxyError::validation(MISSING_ACTIVATION_FIELDS));
        };
        let bearer = bearer.ok_or(ProxyError::Unauthorized)?;

        let body = serde_json::json!({ "code_id": code_id, "book_code": book_code });
        let request = UpstreamRequest::post(["books", "activate"])
            .bearer(Some(bearer))
            .body(RequestBody::Json(body));
        let reply = self.fetch(request).await?;
        Ok(Reply::passthrough(reply))
    }

    /// Forwards a multipart upload authenticated by the session cookie.
    pub async fn upload(
        &self,
        parts: Vec<UploadPart>,
        token: Option<BearerToken>,
    ) -> Result<Reply, ProxyError> {
        let token = token.ok_or(ProxyError::Unauthorized)?;
        if !parts.iter().any(|part| part.file_name.is_some()) {
            return Err(ProxyError::validation(MISSING_UPLOAD));
        }

        let request = UpstreamRequest::post(["media", "upload"])
            .bearer(Some(token))
            .body(RequestBody::Multipart(parts));
        let reply = self.fetch(request).await?;
        Ok(Reply::passthrough(reply))
    }

    async fn paged<T, F>(
        &self,
        resource: Resource,
        params: &ListParams,
        bearer: Option<BearerToken>,
        shape: F,
    ) -> Result<Reply, ProxyError>
    where
        T: Serialize,
        F: FnOnce(ListPage<Value>) -> Result<ListPage<T>, ProxyError>,
    {
        let take = params.resolved_take(self.default_take);
        let take_text = take.to_string();
        let key = CacheKey::builder(resource)
            .params(params.forwarded())
            .param("take", Some(take_text.as_str()))
            .build(bearer.as_ref());

        self.cached(key, resource, || async {
            let request = params.forwarded().fold(
                UpstreamRequest::get([resource.as_str()]).bearer(bearer.clone()),
                |request, (name, value)| request.query(name, value),
            );
            let reply = self.fetch(request.query("take", take_text.clone())).await?;
            let Some(payload) = parse_payload(&reply, resource.as_str()) else {
                return Ok(Reply::passthrough(reply));
            };

            match self.normalizer.normalize(payload, take) {
                Normalized::Page(page) => Reply::canonical(&Envelope::success(shape(page)?)),
                Normalized::Unrecognized(_) => Ok(Reply::passthrough(reply)),
            }
        })
        .await
    }

    async fn cached<F, Fut>(
        &self,
        key: CacheKey,
        resource: Resource,
        produce: F,
    ) -> Result<Reply, ProxyError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Reply, ProxyError>>,
    {
        if let Some(entry) = self.cache.get(&key) {
            counter!("bookgate_cache_hit_total", "resource" => resource.as_str()).increment(1);
            debug!(cache = "hit", %key, "serving cached response");
            return Ok(Reply::cached(entry.payload));
        }
        counter!("bookgate_cache_miss_total", "resource" => resource.as_str()).increment(1);
        debug!(cache = "miss", %key, "fetching from upstream");

        self.flights
            .run(key.as_str(), || async {
                // A leader that finished just before this flight started has
                // already populated the store.
                if let Some(entry) = self.cache.get(&key) {
                    return Ok(Reply::cached(entry.payload));
                }
                let reply = produce().await?;
                if reply.source == ReplySource::Upstream {
                    self.cache.put(key.clone(), reply.body.clone());
                }
                Ok(reply)
            })
            .await
    }

    async fn fetch(&self, request: UpstreamRequest) -> Result<UpstreamReply, ProxyError> {
        let path = request.path();
        counter!(
            "bookgate_upstream_requests_total",
            "method" => request.method.to_string(),
            "resource" => request.segments.first().cloned().unwrap_or_default()
        )
        .increment(1);

        let reply = self.gateway.fetch(request).await?;
        if reply.is_success() {
            return Ok(reply);
        }

        let message = reply.error_message();
        debug!(status = reply.status, path = %path, %message, "upstream returned an error status");
        Err(ProxyError::Upstream {
            status: reply.status,
            message,
        })
    }
}

fn parse_payload(reply: &UpstreamReply, resource: &str) -> Option<Value> {
    match serde_json::from_slice::<Value>(&reply.body) {
        Ok(payload) => Some(payload),
        Err(err) => {
            warn!(
                resource,
                status = reply.status,
                error = %err,
                "upstream body is not JSON; passing through uncached"
            );
            None
        }
    }
}

fn read_nodes(records: Vec<Value>) -> Vec<ContentNode> {
    records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<ContentNode>(record) {
            Ok(node) => Some(node),
            Err(err) => {
                warn!(error = %err, "skipping unreadable menu-book record");
                None
            }
        })
        .collect()
}
