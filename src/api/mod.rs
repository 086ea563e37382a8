use crate::models::{FileRecord, Note, NoteLink, Profile, User};
use crate::storage::{TOKEN_KEY, USER_KEY};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Conflict,
    NotFound,
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    /// Classify a non-2xx response. The backend responds with JSON maps
    /// carrying an `error` (sometimes `message`) field; when present that text
    /// is surfaced verbatim, otherwise a fixed fallback string.
    fn from_status(status: reqwest::StatusCode, body: &str, ctx: &str) -> Self {
        let kind = match status.as_u16() {
            401 | 403 => ApiErrorKind::Unauthorized,
            404 => ApiErrorKind::NotFound,
            409 => ApiErrorKind::Conflict,
            _ => ApiErrorKind::Http,
        };
        let message = extract_backend_message(body)
            .unwrap_or_else(|| format!("{ctx} ({status})"));
        Self { kind, message }
    }
}

fn extract_backend_message(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    v.get("error")
        .or_else(|| v.get("message"))
        .and_then(|m| m.as_str())
        .map(|s| s.to_string())
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let default_api_url = "http://localhost:8080/api".to_string();

        // Deployment overrides the base URL via `window.ENV.API_URL`.
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    if let Ok(api_url) = js_sys::Reflect::get(&env, &"API_URL".into()) {
                        if let Some(url_str) = api_url.as_string() {
                            return Self { api_url: url_str };
                        }
                    }
                }
            }
        }

        Self {
            api_url: default_api_url,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn get_api_url() -> String {
    EnvConfig::new().api_url
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Both auth endpoints answer with the token plus the account fields flattened
/// alongside it.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthResponse {
    pub token: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
}

impl AuthResponse {
    pub fn user(&self) -> User {
        User {
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct ValidateResponse {
    pub valid: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct CountResponse {
    pub count: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NoteLinkRequest {
    pub source_note_id: i64,
    pub target_note_id: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}

/// File bytes read out of a `web_sys::File`, ready for a multipart request.
#[derive(Clone, Debug)]
pub(crate) struct UploadPayload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub(crate) fn notes_search_path(keyword: &str) -> String {
    format!("/notes/search?keyword={}", urlencoding::encode(keyword))
}

#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) token: Option<String>,
}

impl ApiClient {
    #[allow(dead_code)]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            token: None,
        }
    }

    pub fn load_from_storage() -> Self {
        let base_url = get_api_url();
        let token = leptos::web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .and_then(|s| s.get_item(TOKEN_KEY).ok().flatten());

        Self { base_url, token }
    }

    pub fn save_to_storage(&self) {
        if let Some(storage) =
            leptos::web_sys::window().and_then(|w| w.local_storage().ok().flatten())
        {
            if let Some(token) = &self.token {
                let _ = storage.set_item(TOKEN_KEY, token);
            }
        }
    }

    pub fn clear_storage() {
        if let Some(storage) =
            leptos::web_sys::window().and_then(|w| w.local_storage().ok().flatten())
        {
            let _ = storage.remove_item(TOKEN_KEY);
            let _ = storage.remove_item(USER_KEY);
        }
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub(crate) fn get_auth_token(&self) -> Option<String> {
        self.token.clone()
    }

    /// Presence check only; expiry and signature are the backend's business
    /// on every subsequent call.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn logout(&mut self) {
        self.token = None;
        Self::clear_storage();
    }

    fn with_auth_headers(
        mut req: reqwest::RequestBuilder,
        token: Option<String>,
    ) -> reqwest::RequestBuilder {
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        req
    }

    fn builder(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.base_url, path);
        Self::with_auth_headers(client.request(method, url), self.get_auth_token())
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        res: reqwest::Response,
        ctx: &str,
    ) -> ApiResult<T> {
        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body, ctx))
        }
    }

    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&impl serde::Serialize>,
    ) -> ApiResult<T> {
        let mut req = self.builder(method, path);
        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;
        Self::decode(res, "Request failed").await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(reqwest::Method::GET, path, None::<&()>).await
    }

    /// DELETE endpoints answer with a JSON status map; the payload is
    /// irrelevant to the client, only success/failure matters.
    async fn delete(&self, path: &str) -> ApiResult<()> {
        let res = self
            .builder(reqwest::Method::DELETE, path)
            .send()
            .await
            .map_err(ApiError::network)?;

        if res.status().is_success() {
            Ok(())
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body, "Request failed"))
        }
    }

    fn multipart_part(payload: UploadPayload) -> ApiResult<reqwest::multipart::Part> {
        reqwest::multipart::Part::bytes(payload.bytes)
            .file_name(payload.file_name)
            .mime_str(&payload.mime_type)
            .map_err(ApiError::parse)
    }

    async fn post_multipart<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> ApiResult<T> {
        let res = self
            .builder(reqwest::Method::POST, path)
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::network)?;
        Self::decode(res, "Upload failed").await
    }

    // ---- auth ----

    pub async fn login(&self, username: &str, password: &str) -> ApiResult<AuthResponse> {
        self.request(
            reqwest::Method::POST,
            "/auth/login",
            Some(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            }),
        )
        .await
    }

    pub async fn register(&self, req: &RegisterRequest) -> ApiResult<AuthResponse> {
        self.request(reqwest::Method::POST, "/auth/register", Some(req))
            .await
    }

    pub async fn validate_token(&self) -> ApiResult<bool> {
        let res: ValidateResponse = self.get_json("/auth/validate").await?;
        Ok(res.valid)
    }

    // ---- notes ----

    pub async fn list_notes(&self) -> ApiResult<Vec<Note>> {
        self.get_json("/notes").await
    }

    #[allow(dead_code)]
    pub async fn get_note(&self, id: i64) -> ApiResult<Note> {
        self.get_json(&format!("/notes/{id}")).await
    }

    pub async fn create_note(&self, note: &Note) -> ApiResult<Note> {
        self.request(reqwest::Method::POST, "/notes", Some(note))
            .await
    }

    pub async fn update_note(&self, id: i64, note: &Note) -> ApiResult<Note> {
        self.request(reqwest::Method::PUT, &format!("/notes/{id}"), Some(note))
            .await
    }

    pub async fn delete_note(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/notes/{id}")).await
    }

    /// Server-side keyword search. The raw query string is passed through as
    /// a parameter; the client never filters the result.
    pub async fn search_notes(&self, keyword: &str) -> ApiResult<Vec<Note>> {
        self.get_json(&notes_search_path(keyword)).await
    }

    pub async fn count_notes(&self) -> ApiResult<u64> {
        let res: CountResponse = self.get_json("/notes/count").await?;
        Ok(res.count)
    }

    // ---- note links ----

    pub async fn list_links(&self) -> ApiResult<Vec<NoteLink>> {
        self.get_json("/note-links").await
    }

    /// 409 means the backend already holds a link for this pair; whether
    /// uniqueness is ordered or unordered is the backend's decision and
    /// deliberately opaque here.
    pub async fn create_link(&self, source_note_id: i64, target_note_id: i64) -> ApiResult<NoteLink> {
        self.request(
            reqwest::Method::POST,
            "/note-links",
            Some(&NoteLinkRequest {
                source_note_id,
                target_note_id,
            }),
        )
        .await
    }

    pub async fn delete_link(&self, link_id: i64) -> ApiResult<()> {
        self.delete(&format!("/note-links/{link_id}")).await
    }

    // ---- files ----

    pub async fn list_files(&self) -> ApiResult<Vec<FileRecord>> {
        self.get_json("/files").await
    }

    pub async fn upload_file(&self, payload: UploadPayload) -> ApiResult<FileRecord> {
        let form = reqwest::multipart::Form::new().part("file", Self::multipart_part(payload)?);
        self.post_multipart("/files/upload", form).await
    }

    pub async fn upload_files(&self, payloads: Vec<UploadPayload>) -> ApiResult<Vec<FileRecord>> {
        let mut form = reqwest::multipart::Form::new();
        for payload in payloads {
            form = form.part("files", Self::multipart_part(payload)?);
        }
        self.post_multipart("/files/upload-multiple", form).await
    }

    pub async fn download_file(&self, id: i64) -> ApiResult<Vec<u8>> {
        let res = self
            .builder(reqwest::Method::GET, &format!("/files/download/{id}"))
            .send()
            .await
            .map_err(ApiError::network)?;

        if res.status().is_success() {
            let bytes = res.bytes().await.map_err(ApiError::network)?;
            Ok(bytes.to_vec())
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body, "Download failed"))
        }
    }

    pub async fn delete_file(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/files/{id}")).await
    }

    // ---- profile ----

    pub async fn get_profile(&self) -> ApiResult<Profile> {
        self.get_json("/profile").await
    }

    pub async fn update_profile(&self, req: &ProfileUpdateRequest) -> ApiResult<Profile> {
        self.request(reqwest::Method::PUT, "/profile", Some(req))
            .await
    }

    pub async fn upload_profile_image(&self, payload: UploadPayload) -> ApiResult<Profile> {
        let form = reqwest::multipart::Form::new().part("file", Self::multipart_part(payload)?);
        self.post_multipart("/profile/upload-image", form).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_response_contract_deserialize() {
        // Contract based on notake-backend: AuthController
        let json = r#"{
            "token": "jwt-token",
            "username": "u",
            "email": "u@example.com",
            "fullName": "U Ser",
            "role": "USER"
        }"#;
        let parsed: AuthResponse = serde_json::from_str(json).expect("auth response should parse");
        assert_eq!(parsed.token, "jwt-token");
        assert_eq!(parsed.user().full_name, "U Ser");
    }

    #[test]
    fn register_request_serializes_camel_case() {
        let req = RegisterRequest {
            username: "u".to_string(),
            email: "u@example.com".to_string(),
            password: "pass".to_string(),
            full_name: "U Ser".to_string(),
        };
        let v = serde_json::to_value(req).expect("should serialize");
        assert_eq!(v["fullName"], "U Ser");
        assert!(v.get("full_name").is_none());
    }

    #[test]
    fn link_request_serializes_camel_case() {
        let req = NoteLinkRequest {
            source_note_id: 1,
            target_note_id: 2,
        };
        let v = serde_json::to_value(req).expect("should serialize");
        assert_eq!(v["sourceNoteId"], 1);
        assert_eq!(v["targetNoteId"], 2);
    }

    #[test]
    fn profile_update_omits_unset_fields() {
        let req = ProfileUpdateRequest {
            bio: Some("hi".to_string()),
            ..Default::default()
        };
        let v = serde_json::to_value(req).expect("should serialize");
        assert_eq!(v["bio"], "hi");
        assert!(v.get("location").is_none());
        assert!(v.get("dateOfBirth").is_none());
    }

    #[test]
    fn count_and_validate_contracts() {
        let c: CountResponse = serde_json::from_str(r#"{"count": 12}"#).expect("count");
        assert_eq!(c.count, 12);
        let val: ValidateResponse = serde_json::from_str(r#"{"valid": false}"#).expect("valid");
        assert!(!val.valid);
    }

    #[test]
    fn search_path_url_encodes_keyword() {
        assert_eq!(
            notes_search_path("rust & wasm"),
            "/notes/search?keyword=rust%20%26%20wasm"
        );
        assert_eq!(notes_search_path("abc"), "/notes/search?keyword=abc");
    }

    #[test]
    fn error_classification_by_status() {
        let conflict = ApiError::from_status(
            reqwest::StatusCode::CONFLICT,
            r#"{"error": "Link already exists"}"#,
            "Request failed",
        );
        assert_eq!(conflict.kind, ApiErrorKind::Conflict);
        assert_eq!(conflict.message, "Link already exists");

        let unauthorized =
            ApiError::from_status(reqwest::StatusCode::UNAUTHORIZED, "", "Request failed");
        assert_eq!(unauthorized.kind, ApiErrorKind::Unauthorized);

        let missing =
            ApiError::from_status(reqwest::StatusCode::NOT_FOUND, "{}", "Request failed");
        assert_eq!(missing.kind, ApiErrorKind::NotFound);

        let server = ApiError::from_status(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "not json",
            "Request failed",
        );
        assert_eq!(server.kind, ApiErrorKind::Http);
        assert!(server.message.starts_with("Request failed"));
    }

    #[test]
    fn backend_message_extraction_prefers_error_field() {
        assert_eq!(
            extract_backend_message(r#"{"error": "boom", "message": "other"}"#).as_deref(),
            Some("boom")
        );
        assert_eq!(
            extract_backend_message(r#"{"message": "gone"}"#).as_deref(),
            Some("gone")
        );
        assert!(extract_backend_message("plain text").is_none());
    }

    #[test]
    fn api_client_token_presence_is_authentication() {
        let mut client = ApiClient::new("http://localhost:8080/api".to_string());
        assert!(!client.is_authenticated());
        client.set_token("my-jwt-token".to_string());
        assert!(client.is_authenticated());
        assert_eq!(client.get_auth_token().as_deref(), Some("my-jwt-token"));
    }
}
