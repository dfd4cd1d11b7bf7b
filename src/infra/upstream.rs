//! reqwest-backed [`UpstreamGateway`].

use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use reqwest::{
    Client, Url,
    header::CONTENT_TYPE,
    multipart::{Form, Part},
};
use tracing::{debug, warn};

use crate::application::gateway::{
    GatewayError, RequestBody, UploadPart, UpstreamGateway, UpstreamReply, UpstreamRequest,
};
use crate::config::UpstreamSettings;
use crate::infra::error::InfraError;

#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: Client,
    base: Url,
    timeout: Duration,
}

impl HttpGateway {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build upstream client: {err}"))
            })?;

        Ok(Self {
            client,
            base: settings.base_url.clone(),
            timeout: settings.timeout,
        })
    }

    fn url(&self, request: &UpstreamRequest) -> Result<Url, GatewayError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::invalid_request("upstream base URL cannot take a path"))?
            .pop_if_empty()
            .extend(request.segments.iter().map(String::as_str));

        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }

    fn classify(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout(self.timeout)
        } else {
            GatewayError::transport(err.to_string())
        }
    }
}

fn multipart_form(parts: Vec<UploadPart>) -> Result<Form, GatewayError> {
    parts.into_iter().try_fold(Form::new(), |form, upload| {
        let mut part = Part::bytes(upload.data.to_vec());
        if let Some(file_name) = upload.file_name {
            part = part.file_name(file_name);
        }
        if let Some(content_type) = upload.content_type.as_deref() {
            part = part.mime_str(content_type).map_err(|err| {
                GatewayError::invalid_request(format!(
                    "invalid content type `{content_type}` for part `{}`: {err}",
                    upload.name
                ))
            })?;
        }
        Ok(form.part(upload.name, part))
    })
}

#[async_trait]
impl UpstreamGateway for HttpGateway {
    async fn fetch(&self, request: UpstreamRequest) -> Result<UpstreamReply, GatewayError> {
        let url = self.url(&request)?;
        let UpstreamRequest {
            method,
            bearer,
            body,
            ..
        } = request;

        let mut builder = self.client.request(method.clone(), url.clone());
        if let Some(token) = bearer.as_ref() {
            builder = builder.bearer_auth(token.as_str());
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(parts) => builder.multipart(multipart_form(parts)?),
        };

        let response = builder.send().await.map_err(|err| {
            counter!("bookgate_upstream_failures_total").increment(1);
            let error = self.classify(err);
            warn!(
                target = "bookgate::upstream",
                method = %method,
                path = url.path(),
                error = %error,
                "upstream request failed"
            );
            error
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|err| self.classify(err))?;

        debug!(
            target = "bookgate::upstream",
            method = %method,
            path = url.path(),
            status,
            bytes = body.len(),
            "upstream responded"
        );

        Ok(UpstreamReply {
            status,
            content_type,
            body,
        })
    }
}
