use crate::{
    DecodeSnafu, Error, Result,
    gateway::{Endpoint, HttpGateway},
    models::{Circle, CoverSize, PageQuery, PagedWorks, Performer, Tag, TrackNode, Work},
};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::{sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tracing::instrument;

pub const DEFAULT_BASE_URL: &str = "https://api.asmr-200.com/api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("asmr-player/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Catalog client. Every read works without a token; signing in only widens
/// what the service is willing to return.
#[derive(Debug)]
pub struct Client {
    gateway: HttpGateway,
    user_token: RwLock<Option<Arc<str>>>,
}

macro_rules! get {
    ($self:ident, $endpoint:expr, $params:expr) => {{
        let endpoint = $endpoint;
        let token = $self.token().await;
        let response = $self
            .gateway
            .get(&endpoint, $params, token.as_deref())
            .await?;

        serde_json::from_str(response.as_str()).context(DecodeSnafu {
            endpoint: endpoint.to_string(),
        })
    }};
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let gateway = HttpGateway::new(&config.base_url, config.timeout, &config.user_agent)?;

        Ok(Self {
            gateway,
            user_token: Default::default(),
        })
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user_token.read().await.is_some()
    }

    async fn token(&self) -> Option<Arc<str>> {
        self.user_token.read().await.clone()
    }

    /// Restores a token obtained earlier, e.g. from the environment.
    pub async fn set_token(&self, token: impl Into<Arc<str>>) {
        *self.user_token.write().await = Some(token.into());
    }

    pub async fn sign_out(&self) {
        *self.user_token.write().await = None;
    }

    /// Exchange credentials for a bearer token.
    ///
    /// Returns `Ok(false)` when the service rejects the exchange; the current
    /// token, if any, is kept in that case.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<bool> {
        if username.is_empty() || password.is_empty() {
            return Err(Error::InvalidCredentials);
        }

        info!("logging in as {} with password **HIDDEN**", username);

        let credentials = LoginRequest {
            name: username,
            password,
        };

        let response = match self
            .gateway
            .post_json(&Endpoint::Login, &credentials, None)
            .await
        {
            Ok(response) => response,
            Err(Error::Service { status, .. }) => {
                warn!("login rejected with HTTP {status}");
                return Ok(false);
            }
            Err(Error::Unauthorized { .. }) => {
                warn!("login rejected, check username and password");
                return Ok(false);
            }
            Err(error) => return Err(error),
        };

        let login: LoginResponse =
            serde_json::from_str(response.as_str()).context(DecodeSnafu {
                endpoint: Endpoint::Login.to_string(),
            })?;

        *self.user_token.write().await = Some(login.token.into());
        info!("Successfully logged in");

        Ok(true)
    }

    #[instrument(skip(self))]
    pub async fn list_works(&self, query: &PageQuery) -> Result<PagedWorks> {
        let params = Self::page_params(query)?;

        get!(self, Endpoint::Works, Some(&params))
    }

    #[instrument(skip(self))]
    pub async fn search(&self, keyword: &str, query: &PageQuery) -> Result<PagedWorks> {
        let keyword = keyword.trim();
        ensure!(
            !keyword.is_empty(),
            crate::InvalidArgumentSnafu {
                message: "search keyword must not be empty",
            }
        );
        let params = Self::page_params(query)?;

        get!(
            self,
            Endpoint::Search {
                keyword: keyword.to_string()
            },
            Some(&params)
        )
    }

    pub async fn work_detail(&self, id: u64) -> Result<Work> {
        get!(self, Endpoint::Work { id }, None)
    }

    pub async fn track_tree(&self, id: u64) -> Result<Vec<TrackNode>> {
        get!(self, Endpoint::Tracks { id }, None)
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        get!(self, Endpoint::Tags, None)
    }

    /// Voice actors known to the catalog.
    pub async fn list_performers(&self) -> Result<Vec<Performer>> {
        get!(self, Endpoint::Performers, None)
    }

    pub async fn list_circles(&self) -> Result<Vec<Circle>> {
        get!(self, Endpoint::Circles, None)
    }

    /// Cover image url. Unknown size names fall back to the full image so a
    /// listing never fails over artwork.
    pub fn cover_art_url(&self, work_id: u64, size: &str) -> String {
        self.cover_url(work_id, size.parse().unwrap_or_default())
    }

    pub fn cover_url(&self, work_id: u64, size: CoverSize) -> String {
        let mut url = self.gateway.url(&Endpoint::Cover { id: work_id });
        url.query_pairs_mut().append_pair("type", size.as_query());
        url.to_string()
    }

    fn page_params(query: &PageQuery) -> Result<Vec<(&'static str, String)>> {
        ensure!(
            query.page >= 1,
            crate::InvalidArgumentSnafu {
                message: "page numbers start at 1",
            }
        );

        Ok(query.params())
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    name: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Order, SortDirection};
    use axum::{
        Json, Router,
        extract::{OriginalUri, Path, Query, State},
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::{get, post},
    };
    use serde_json::{Value, json};
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
    };

    const TOKEN: &str = "secret-token";

    #[derive(Default)]
    struct Hits(AtomicUsize);

    impl Hits {
        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            == Some(format!("Bearer {TOKEN}").as_str())
    }

    async fn works(
        State(hits): State<Arc<Hits>>,
        Query(params): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        hits.0.fetch_add(1, Ordering::SeqCst);

        if params.get("page").map(String::as_str) == Some("500") {
            return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
        }

        Json(json!({
            "works": [
                {"id": 2, "title": "Second", "circle": {"id": 1, "name": "A"}},
                {"id": 1, "title": "First", "circle": {"id": 1, "name": "A"},
                 "rate_average_2dp": 4.5, "dl_count": 10, "price": 0, "tags": []}
            ],
            "pagination": {"currentPage": 1, "pageSize": 2, "totalCount": 5},
            "echo": params,
        }))
        .into_response()
    }

    async fn search(
        State(hits): State<Arc<Hits>>,
        Path(keyword): Path<String>,
        OriginalUri(uri): OriginalUri,
    ) -> Json<Value> {
        hits.0.fetch_add(1, Ordering::SeqCst);

        Json(json!({
            "works": [{"id": 9, "title": keyword, "source_id": uri.path()}],
            "pagination": {"currentPage": 1, "pageSize": 20, "totalCount": 1}
        }))
    }

    async fn work(Path(id): Path<u64>) -> impl IntoResponse {
        match id {
            404 => StatusCode::NOT_FOUND.into_response(),
            999 => Json(json!({"unexpected": true})).into_response(),
            _ => Json(json!({"id": id, "title": "Detail"})).into_response(),
        }
    }

    async fn tracks(Path(id): Path<u64>) -> Json<Value> {
        Json(json!([
            {"type": "folder", "title": format!("work {id}"), "children": [
                {"type": "audio", "title": "01.mp3", "mediaStreamUrl": "https://cdn/01.mp3", "duration": 30.0}
            ]}
        ]))
    }

    async fn tags(headers: HeaderMap) -> impl IntoResponse {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }

        Json(json!([{"id": 1, "name": "sleep"}, {"id": 2, "name": "rain"}])).into_response()
    }

    async fn login(Json(body): Json<Value>) -> impl IntoResponse {
        if body["name"] == "user" && body["password"] == "pass" {
            Json(json!({"token": TOKEN, "user": {"name": "user"}})).into_response()
        } else if body["name"] == "busy" {
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        } else {
            StatusCode::UNAUTHORIZED.into_response()
        }
    }

    async fn slow() -> &'static str {
        tokio::time::sleep(Duration::from_secs(5)).await;
        "[]"
    }

    async fn serve() -> (Client, Arc<Hits>) {
        let hits = Arc::new(Hits::default());

        let app = Router::new()
            .route("/api/works", get(works))
            .route("/api/search/{keyword}", get(search))
            .route("/api/work/{id}", get(work))
            .route("/api/tracks/{id}", get(tracks))
            .route("/api/tags", get(tags))
            .route("/api/vas", get(slow))
            .route("/api/auth/me", post(login))
            .with_state(hits.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::new(ClientConfig {
            base_url: format!("http://{address}/api"),
            timeout: Duration::from_millis(500),
            ..Default::default()
        })
        .unwrap();

        (client, hits)
    }

    #[tokio::test]
    async fn lists_works_in_server_order() {
        let (client, _) = serve().await;
        let query = PageQuery {
            page: 1,
            order: Order::CreateDate,
            sort: SortDirection::Desc,
            subtitle_only: false,
        };

        let page = client.list_works(&query).await.unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(
            page.works.iter().map(|w| w.id).collect::<Vec<_>>(),
            vec![2, 1]
        );
        assert!(page.has_more());

        let again = client.list_works(&query).await.unwrap();
        assert_eq!(page, again);
    }

    #[tokio::test]
    async fn non_success_status_is_a_service_error() {
        let (client, _) = serve().await;

        let error = client
            .list_works(&PageQuery::new().with_page(500))
            .await
            .unwrap_err();

        assert!(matches!(error, Error::Service { status: 500, .. }));
        assert_eq!(error.status(), Some(500));

        let error = client.work_detail(404).await.unwrap_err();
        assert_eq!(error.status(), Some(404));
    }

    #[tokio::test]
    async fn page_zero_never_reaches_the_network() {
        let (client, hits) = serve().await;

        let error = client
            .list_works(&PageQuery::new().with_page(0))
            .await
            .unwrap_err();

        assert!(matches!(error, Error::InvalidArgument { .. }));
        assert_eq!(hits.count(), 0);
    }

    #[tokio::test]
    async fn empty_keyword_is_rejected_before_any_request() {
        let (client, hits) = serve().await;

        for keyword in ["", "   "] {
            let error = client
                .search(keyword, &PageQuery::for_search())
                .await
                .unwrap_err();
            assert!(matches!(error, Error::InvalidArgument { .. }));
        }

        assert_eq!(hits.count(), 0);
    }

    #[tokio::test]
    async fn keyword_is_sent_as_one_encoded_segment() {
        let (client, hits) = serve().await;

        let page = client
            .search("rain night", &PageQuery::for_search())
            .await
            .unwrap();

        assert_eq!(hits.count(), 1);
        assert_eq!(page.works[0].title, "rain night");
        assert_eq!(
            page.works[0].source_id.as_deref(),
            Some("/api/search/rain%20night")
        );
    }

    #[tokio::test]
    async fn shape_mismatch_is_a_decode_error() {
        let (client, _) = serve().await;

        let error = client.work_detail(999).await.unwrap_err();

        assert!(matches!(error, Error::Decode { .. }));
    }

    #[tokio::test]
    async fn detail_and_tracks_can_be_fetched_concurrently() {
        let (client, _) = serve().await;

        let (work, tracks) =
            tokio::try_join!(client.work_detail(7), client.track_tree(7)).unwrap();

        assert_eq!(work.id, 7);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].title(), "work 7");
    }

    #[tokio::test]
    async fn taxonomy_requires_a_token() {
        let (client, _) = serve().await;

        let error = client.list_tags().await.unwrap_err();
        assert!(error.is_unauthorized());

        assert!(client.authenticate("user", "pass").await.unwrap());
        assert!(client.is_authenticated().await);

        let tags = client.list_tags().await.unwrap();
        assert_eq!(
            tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            vec!["sleep", "rain"]
        );

        client.sign_out().await;
        assert!(client.list_tags().await.unwrap_err().is_unauthorized());
    }

    #[tokio::test]
    async fn rejected_login_returns_false_and_keeps_state() {
        let (client, _) = serve().await;

        assert!(!client.authenticate("user", "wrong").await.unwrap());
        assert!(!client.is_authenticated().await);

        assert!(matches!(
            client.authenticate("", "pass").await,
            Err(Error::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn blank_password_is_sent_to_the_service() {
        let (client, _) = serve().await;

        assert!(!client.authenticate("user", "   ").await.unwrap());
        assert!(matches!(
            client.authenticate("user", "").await,
            Err(Error::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn unavailable_service_rejects_login_and_keeps_token() {
        let (client, _) = serve().await;
        client.set_token(TOKEN).await;

        assert!(!client.authenticate("busy", "pass").await.unwrap());
        assert!(client.is_authenticated().await);
        assert_eq!(client.list_tags().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn restored_token_is_presented() {
        let (client, _) = serve().await;

        client.set_token(TOKEN).await;

        assert_eq!(client.list_tags().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn timeout_is_a_network_error() {
        let (client, _) = serve().await;

        let error = client.list_performers().await.unwrap_err();

        assert!(matches!(error, Error::Network { .. }));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_network_error() {
        let client = Client::new(ClientConfig {
            base_url: "http://127.0.0.1:1/api".to_string(),
            timeout: Duration::from_millis(500),
            ..Default::default()
        })
        .unwrap();

        let error = client.list_works(&PageQuery::new()).await.unwrap_err();

        assert!(matches!(error, Error::Network { .. }));
    }

    #[test]
    fn cover_url_falls_back_to_full_size() {
        let client = Client::new(ClientConfig::default()).unwrap();

        assert_eq!(
            client.cover_art_url(123, "thumbnail"),
            "https://api.asmr-200.com/api/cover/123.jpg?type=sam"
        );
        assert_eq!(
            client.cover_art_url(123, "small"),
            "https://api.asmr-200.com/api/cover/123.jpg?type=240x240"
        );
        assert_eq!(
            client.cover_art_url(123, "enormous"),
            "https://api.asmr-200.com/api/cover/123.jpg?type=main"
        );
    }
}
