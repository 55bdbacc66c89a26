//! HTTP implementation of the backend API

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::client::{ApiResponse, ScreenApi};
use crate::config::ApiConfig;
use crate::draft::{GroupDraft, PlanDraft};
use crate::entity::cabinet::Cabinet;
use crate::entity::group::{AddGroupRequest, GroupDetail, GroupSummary};
use crate::entity::material::{AddMaterialRequest, Material, MaterialQuery};
use crate::entity::plan::{AddPlanRequest, PlanDetail, PlanSummary};
use crate::entity::{Created, Page, PageQuery};
use crate::error::{AppError, AppResult};
use crate::session::{Session, User};

const CABINETS: &str = "/wscharge/cabinets";
const MATERIALS: &str = "/wscharge/screen/materials";
const GROUPS: &str = "/wscharge/screen/groups";
const PLANS: &str = "/wscharge/screen/plans";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthData {
    user: User,
    token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    valid: bool,
    #[serde(default)]
    user: Option<User>,
}

/// Client for the rental backend, authenticated through a shared [`Session`]
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<RwLock<Session>>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: Arc<RwLock<Session>>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<RwLock<Session>> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Attach credentials, send, and unwrap the envelope
    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        path: &str,
    ) -> AppResult<ApiResponse<T>> {
        let builder = match self.session.read().await.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        debug!("API request: {}", path);
        let response = builder.send().await.map_err(|e| {
            error!("API request to {} failed: {}", path, e);
            AppError::from(e)
        })?;
        let status = response.status();
        let body = response.bytes().await?;

        if status == StatusCode::UNAUTHORIZED {
            warn!("Unauthorized response from {}, clearing session", path);
            self.session.write().await.clear();
            return Err(AppError::Unauthorized);
        }

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiResponse<serde_json::Value>>(&body)
                .ok()
                .and_then(|r| r.failure_message());
            error!("API error from {}: {} {:?}", path, status, message);
            if status == StatusCode::NOT_FOUND && message.is_none() {
                return Err(AppError::NotFound(path.to_string()));
            }
            return Err(AppError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<ApiResponse<T>> {
        self.send(self.request(Method::GET, path), path).await
    }

    async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &(impl Serialize + ?Sized),
    ) -> AppResult<ApiResponse<T>> {
        self.send(self.request(Method::GET, path).query(query), path)
            .await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + ?Sized),
    ) -> AppResult<ApiResponse<T>> {
        self.send(self.request(Method::POST, path).json(body), path)
            .await
    }

    async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + ?Sized),
    ) -> AppResult<ApiResponse<T>> {
        self.send(self.request(Method::PUT, path).json(body), path)
            .await
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.send::<serde_json::Value>(self.request(Method::DELETE, path), path)
            .await?
            .into_unit()
    }

    // ---------------------------------------------------------------------
    // Auth
    // ---------------------------------------------------------------------

    /// Log in and store the token in the shared session
    pub async fn login(&self, email: &str, password: &str) -> AppResult<User> {
        let data: AuthData = self
            .post("/auth/login", &LoginRequest { email, password })
            .await?
            .into_data("login")?;
        debug!("Token expires in {:?}s", data.expires_in);
        self.session
            .write()
            .await
            .store(data.token, data.user.clone());
        Ok(data.user)
    }

    /// Log out; the local session is cleared even if the server call fails
    pub async fn logout(&self) -> AppResult<()> {
        let result = self
            .post::<serde_json::Value>("/auth/logout", &serde_json::json!({}))
            .await
            .and_then(ApiResponse::into_unit);
        self.session.write().await.clear();
        result
    }

    pub async fn current_user(&self) -> AppResult<User> {
        let user: User = self.get("/auth/me").await?.into_data("user")?;
        self.session.write().await.set_user(user.clone());
        Ok(user)
    }

    /// Check the stored token; an invalid one is dropped from the session
    pub async fn verify_token(&self) -> AppResult<bool> {
        if !self.session.read().await.is_authenticated() {
            return Ok(false);
        }
        let data: VerifyData = self
            .post("/auth/verify", &serde_json::json!({}))
            .await?
            .into_data("verification")?;
        let mut session = self.session.write().await;
        match (data.valid, data.user) {
            (true, Some(user)) => {
                session.set_user(user);
                Ok(true)
            }
            _ => {
                session.clear();
                Ok(false)
            }
        }
    }

    // ---------------------------------------------------------------------
    // Cabinets
    // ---------------------------------------------------------------------

    pub async fn cabinets(&self, query: PageQuery) -> AppResult<Page<Cabinet>> {
        self.list(CABINETS, &query).await?.into_data("cabinets")
    }

    // ---------------------------------------------------------------------
    // Materials
    // ---------------------------------------------------------------------

    pub async fn materials(&self, query: MaterialQuery) -> AppResult<Page<Material>> {
        self.list(MATERIALS, &query).await?.into_data("materials")
    }

    pub async fn add_material(&self, request: &AddMaterialRequest) -> AppResult<i64> {
        let created: Created = self.post(MATERIALS, request).await?.into_data("material id")?;
        info!("Material registered: {} (id {})", request.name, created.id);
        Ok(created.id)
    }

    pub async fn delete_material(&self, id: i64) -> AppResult<()> {
        self.delete(&format!("{MATERIALS}/{id}")).await
    }

    // ---------------------------------------------------------------------
    // Groups
    // ---------------------------------------------------------------------

    pub async fn groups(&self, query: PageQuery) -> AppResult<Page<GroupSummary>> {
        self.list(GROUPS, &query).await?.into_data("groups")
    }

    pub async fn group_detail(&self, id: i64) -> AppResult<GroupDetail> {
        self.get(&format!("{GROUPS}/{id}"))
            .await?
            .into_data("group")
    }

    pub async fn add_group(&self, request: &AddGroupRequest) -> AppResult<i64> {
        let created: Created = self.post(GROUPS, request).await?.into_data("group id")?;
        Ok(created.id)
    }

    pub async fn update_group(&self, id: i64, request: &AddGroupRequest) -> AppResult<()> {
        self.put::<serde_json::Value>(&format!("{GROUPS}/{id}"), request)
            .await?
            .into_unit()
    }

    pub async fn delete_group(&self, id: i64) -> AppResult<()> {
        self.delete(&format!("{GROUPS}/{id}")).await
    }

    // ---------------------------------------------------------------------
    // Plans
    // ---------------------------------------------------------------------

    pub async fn plans(&self, query: PageQuery) -> AppResult<Page<PlanSummary>> {
        self.list(PLANS, &query).await?.into_data("plans")
    }

    pub async fn plan_detail(&self, id: i64) -> AppResult<PlanDetail> {
        self.get(&format!("{PLANS}/{id}"))
            .await?
            .into_data("plan")
    }

    pub async fn add_plan(&self, request: &AddPlanRequest) -> AppResult<i64> {
        let created: Created = self.post(PLANS, request).await?.into_data("plan id")?;
        Ok(created.id)
    }

    pub async fn update_plan(&self, id: i64, request: &AddPlanRequest) -> AppResult<()> {
        self.put::<serde_json::Value>(&format!("{PLANS}/{id}"), request)
            .await?
            .into_unit()
    }

    pub async fn delete_plan(&self, id: i64) -> AppResult<()> {
        self.delete(&format!("{PLANS}/{id}")).await
    }
}

#[async_trait]
impl ScreenApi<GroupDraft> for ApiClient {
    async fn fetch(&self, id: i64) -> AppResult<GroupDraft> {
        Ok(self.group_detail(id).await?.into())
    }

    async fn create(&self, request: &AddGroupRequest) -> AppResult<i64> {
        self.add_group(request).await
    }

    async fn update(&self, id: i64, request: &AddGroupRequest) -> AppResult<()> {
        self.update_group(id, request).await
    }
}

#[async_trait]
impl ScreenApi<PlanDraft> for ApiClient {
    async fn fetch(&self, id: i64) -> AppResult<PlanDraft> {
        Ok(self.plan_detail(id).await?.into())
    }

    async fn create(&self, request: &AddPlanRequest) -> AppResult<i64> {
        self.add_plan(request).await
    }

    async fn update(&self, id: i64, request: &AddPlanRequest) -> AppResult<()> {
        self.update_plan(id, request).await
    }
}
