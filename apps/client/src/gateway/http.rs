//! reqwest implementation of [`BackendGateway`].
//!
//! Every call except register/login carries the session's bearer credential
//! through [`RequestAuth`]. Error bodies are decoded here, once, into
//! [`ErrorDetail`]; callers never probe raw JSON.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::ErrorDetail;
use crate::gateway::{BackendGateway, GatewayError};
use crate::models::analysis::{OptimizeRequest, SkillGapReport, SkillGapRequest};
use crate::models::resume::{OptimizedResume, ResumeFile, ResumeRecord, UploadReceipt};
use crate::models::user::{AccessToken, LoginForm, RegisterRequest};
use crate::session::RequestAuth;

const REGISTER_ENDPOINT: &str = "/auth/register";
const LOGIN_ENDPOINT: &str = "/auth/login";
const UPLOAD_ENDPOINT: &str = "/resume/upload";
const HISTORY_ENDPOINT: &str = "/resume/history";
const SKILL_GAP_ENDPOINT: &str = "/skill-gap/analyze";
const OPTIMIZE_ENDPOINT: &str = "/resume/optimize";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<ErrorDetail>,
}

#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    auth: RequestAuth,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration, auth: RequestAuth) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    // ── request builders (kept separate from sending so headers are testable) ──

    fn register_request(&self, request: &RegisterRequest) -> RequestBuilder {
        self.client.post(self.url(REGISTER_ENDPOINT)).json(request)
    }

    fn login_request(&self, email: &str, password: &str) -> RequestBuilder {
        self.client.post(self.url(LOGIN_ENDPOINT)).form(&LoginForm {
            username: email,
            password,
        })
    }

    fn upload_request(&self, file: &ResumeFile) -> Result<RequestBuilder, GatewayError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(file.content_type)?;
        let form = Form::new().part("file", part);
        Ok(self
            .auth
            .apply(self.client.post(self.url(UPLOAD_ENDPOINT)))
            .multipart(form))
    }

    fn history_request(&self) -> RequestBuilder {
        self.auth.apply(self.client.get(self.url(HISTORY_ENDPOINT)))
    }

    fn skill_gap_request(&self, request: &SkillGapRequest) -> RequestBuilder {
        self.auth
            .apply(self.client.post(self.url(SKILL_GAP_ENDPOINT)))
            .json(request)
    }

    fn optimize_request(&self, request: &OptimizeRequest) -> RequestBuilder {
        self.auth
            .apply(self.client.post(self.url(OPTIMIZE_ENDPOINT)))
            .json(request)
    }

    /// Sends and returns the response only if the status is a success.
    async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<Response, GatewayError> {
        debug!("Calling {endpoint}");
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!("Could not read error body from {endpoint}: {e}");
                String::new()
            }
        };
        warn!("{endpoint} returned {status}");
        Err(api_error(status.as_u16(), &body))
    }

    async fn send_json<R: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<R, GatewayError> {
        let response = self.send(request, endpoint).await?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| GatewayError::Decode(format!("{endpoint}: {e}")))
    }
}

/// Builds the typed failure for a non-success response body.
fn api_error(status: u16, body: &str) -> GatewayError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail);
    GatewayError::Api { status, detail }
}

#[async_trait]
impl BackendGateway for HttpGateway {
    async fn register_account(&self, request: &RegisterRequest) -> Result<(), GatewayError> {
        self.send(self.register_request(request), REGISTER_ENDPOINT)
            .await
            .map(|_| ())
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AccessToken, GatewayError> {
        self.send_json(self.login_request(email, password), LOGIN_ENDPOINT)
            .await
    }

    async fn upload_resume(&self, file: &ResumeFile) -> Result<UploadReceipt, GatewayError> {
        let request = self.upload_request(file)?;
        self.send_json(request, UPLOAD_ENDPOINT).await
    }

    async fn list_resume_history(&self) -> Result<Vec<ResumeRecord>, GatewayError> {
        self.send_json(self.history_request(), HISTORY_ENDPOINT)
            .await
    }

    async fn analyze_skill_gap(
        &self,
        request: &SkillGapRequest,
    ) -> Result<SkillGapReport, GatewayError> {
        let report: SkillGapReport = self
            .send_json(self.skill_gap_request(request), SKILL_GAP_ENDPOINT)
            .await?;
        report.check_bounds().map_err(GatewayError::Decode)?;
        Ok(report)
    }

    async fn optimize_resume(
        &self,
        request: &OptimizeRequest,
    ) -> Result<OptimizedResume, GatewayError> {
        self.send_json(self.optimize_request(request), OPTIMIZE_ENDPOINT)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::normalize_message;
    use crate::models::analysis::LearningPreference;
    use crate::models::resume::ResumeId;
    use crate::session::storage::MemoryCredentialStore;
    use crate::session::SessionStore;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn gateway() -> (HttpGateway, SessionStore) {
        let auth = RequestAuth::default();
        let session = SessionStore::hydrate(Box::new(MemoryCredentialStore::default()), auth.clone());
        let gateway = HttpGateway::new("http://service.test/api/", Duration::from_secs(5), auth).unwrap();
        (gateway, session)
    }

    fn authorization(request: RequestBuilder) -> Option<String> {
        request
            .build()
            .unwrap()
            .headers()
            .get("authorization")
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let (gateway, _) = gateway();
        assert_eq!(gateway.url(HISTORY_ENDPOINT), "http://service.test/api/resume/history");
    }

    #[test]
    fn test_next_call_after_login_carries_credential() {
        let (gateway, session) = gateway();
        assert_eq!(authorization(gateway.history_request()), None);

        session.login("tok-9").unwrap();
        assert_eq!(
            authorization(gateway.history_request()).as_deref(),
            Some("Bearer tok-9")
        );

        let request = SkillGapRequest {
            resume_id: ResumeId::from("1"),
            role_name: "Engineer".to_string(),
            learning_preference: LearningPreference::CodingProjects,
        };
        assert_eq!(
            authorization(gateway.skill_gap_request(&request)).as_deref(),
            Some("Bearer tok-9")
        );

        session.logout().unwrap();
        assert_eq!(authorization(gateway.history_request()), None);
    }

    #[test]
    fn test_auth_endpoints_never_carry_credential() {
        let (gateway, session) = gateway();
        session.login("tok").unwrap();

        let login = gateway.login_request("a@b.co", "pw");
        assert_eq!(authorization(login), None);

        let register = gateway.register_request(&RegisterRequest {
            email: "a@b.co".to_string(),
            password: "password1".to_string(),
        });
        assert_eq!(authorization(register), None);
    }

    #[test]
    fn test_login_is_form_encoded() {
        let (gateway, _) = gateway();
        let request = gateway.login_request("a@b.co", "p w").build().unwrap();
        assert_eq!(
            request.headers()["content-type"],
            "application/x-www-form-urlencoded"
        );
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(std::str::from_utf8(body).unwrap(), "username=a%40b.co&password=p+w");
    }

    #[test]
    fn test_upload_is_multipart_with_bearer() {
        let (gateway, session) = gateway();
        session.login("tok").unwrap();
        let file = ResumeFile::new("cv.pdf", b"%PDF-1.4".to_vec());
        let request = gateway.upload_request(&file).unwrap().build().unwrap();
        let content_type = request.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
        assert_eq!(request.headers()["authorization"], "Bearer tok");
    }

    #[test]
    fn test_api_error_decodes_both_detail_shapes() {
        let plain = api_error(404, r#"{"detail": "Resume not found."}"#);
        assert_eq!(plain.user_message("x"), "Resume not found.");

        let fields = api_error(
            422,
            r#"{"detail": [{"loc": ["body", "role_name"], "msg": "field required", "type": "missing"}]}"#,
        );
        assert_eq!(fields.user_message("x"), "role_name: field required");
    }

    #[test]
    fn test_api_error_with_unrecognized_body() {
        for body in ["", "<html>502</html>", r#"{"error": "boom"}"#, r#"{"detail": {"a": 1}}"#] {
            let err = api_error(502, body);
            assert_eq!(err.status(), Some(502));
            assert_eq!(normalize_message(err.detail(), "fallback"), "fallback");
        }
    }

    /// Accepts one connection, answers it with `response` verbatim and closes.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{addr}")
    }

    fn local_gateway(base_url: String) -> HttpGateway {
        HttpGateway {
            client: Client::builder().no_proxy().build().unwrap(),
            base_url,
            auth: RequestAuth::default(),
        }
    }

    #[tokio::test]
    async fn test_error_body_decoded_from_response() {
        let base = serve_once(
            "HTTP/1.1 404 Not Found\r\ncontent-type: application/json\r\ncontent-length: 31\r\nconnection: close\r\n\r\n{\"detail\": \"Resume not found.\"}",
        )
        .await;
        let gateway = local_gateway(base);

        let err = gateway.list_resume_history().await.unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert_eq!(err.user_message("fallback"), "Resume not found.");
    }

    #[tokio::test]
    async fn test_truncated_error_body_keeps_status_without_detail() {
        let base = serve_once(
            "HTTP/1.1 502 Bad Gateway\r\ncontent-type: application/json\r\ncontent-length: 64\r\n\r\n{\"detail\": \"Resu",
        )
        .await;
        let gateway = local_gateway(base);

        let err = gateway.list_resume_history().await.unwrap_err();

        assert!(matches!(
            err,
            GatewayError::Api {
                status: 502,
                detail: None
            }
        ));
        assert_eq!(err.user_message("fallback"), "fallback");
    }
}
