use crate::{Error, NetworkSnafu, Result, ServiceSnafu, UnauthorizedSnafu};
use reqwest::{
    Method, RequestBuilder, Response, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::Serialize;
use snafu::prelude::*;
use std::{fmt::Display, time::Duration};
use url::Url;

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    Works,
    Search { keyword: String },
    Work { id: u64 },
    Tracks { id: u64 },
    Tags,
    Performers,
    Circles,
    Cover { id: u64 },
}

impl Endpoint {
    fn segments(&self) -> Vec<String> {
        match self {
            Endpoint::Login => vec!["auth".into(), "me".into()],
            Endpoint::Works => vec!["works".into()],
            Endpoint::Search { keyword } => vec!["search".into(), keyword.clone()],
            Endpoint::Work { id } => vec!["work".into(), id.to_string()],
            Endpoint::Tracks { id } => vec!["tracks".into(), id.to_string()],
            Endpoint::Tags => vec!["tags".into()],
            Endpoint::Performers => vec!["vas".into()],
            Endpoint::Circles => vec!["circles".into()],
            Endpoint::Cover { id } => vec!["cover".into(), format!("{id}.jpg")],
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let endpoint = match self {
            Endpoint::Login => "auth/me",
            Endpoint::Works => "works",
            Endpoint::Search { .. } => "search",
            Endpoint::Work { .. } => "work",
            Endpoint::Tracks { .. } => "tracks",
            Endpoint::Tags => "tags",
            Endpoint::Performers => "vas",
            Endpoint::Circles => "circles",
            Endpoint::Cover { .. } => "cover",
        };

        f.write_str(endpoint)
    }
}

/// Thin typed wrapper around `reqwest` that knows the catalog's base url,
/// attaches the bearer token and classifies failed responses.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|error| Error::InvalidArgument {
            message: format!("invalid base url {base_url}: {error}"),
        })?;

        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidArgument {
                message: format!("{base_url} cannot be used as a base url"),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).map_err(|_| Error::InvalidArgument {
                message: format!("invalid user agent {user_agent}"),
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context(NetworkSnafu)?;

        Ok(Self { client, base_url })
    }

    /// Resolves an endpoint against the base url. Every segment is
    /// percent-encoded, so a keyword containing `/` or `?` stays one segment.
    pub fn url(&self, endpoint: &Endpoint) -> Url {
        let mut url = self.base_url.clone();

        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(endpoint.segments());
        }

        url
    }

    pub async fn get(
        &self,
        endpoint: &Endpoint,
        params: Option<&[(&str, String)]>,
        token: Option<&str>,
    ) -> Result<String> {
        let url = self.url(endpoint);
        debug!("calling {} endpoint, with params {params:?}", url);

        let mut request = self.request(Method::GET, url, token);
        if let Some(params) = params {
            request = request.query(params);
        }

        let response = request.send().await.context(NetworkSnafu)?;
        self.handle_response(endpoint, response).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        endpoint: &Endpoint,
        body: &B,
        token: Option<&str>,
    ) -> Result<String> {
        let url = self.url(endpoint);
        debug!("posting to {} endpoint", url);

        let response = self
            .request(Method::POST, url, token)
            .json(body)
            .send()
            .await
            .context(NetworkSnafu)?;

        self.handle_response(endpoint, response).await
    }

    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let request = self.client.request(method, url);

        match token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    async fn handle_response(&self, endpoint: &Endpoint, response: Response) -> Result<String> {
        let status = response.status();

        if status.is_success() {
            return response.text().await.context(NetworkSnafu);
        }

        warn!("{endpoint} responded with {status}");

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UnauthorizedSnafu {
                endpoint: endpoint.to_string(),
            }
            .fail(),
            _ => ServiceSnafu {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            }
            .fail(),
        }
    }
}
