//! 외부 계산 서비스/언어 설정 서비스 클라이언트.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT_LANGUAGE;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::i18n::Language;
use crate::model::{CalculationInputs, CalculationResults};

/// 원격 호출 실패 유형.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// 서비스가 error 필드로 응답함. 메시지는 사용자에게 그대로 보여준다.
    #[error("{0}")]
    Remote(String),
    /// 네트워크 실패 또는 해석할 수 없는 응답
    #[error("통신 오류: {0}")]
    Transport(String),
}

/// 전력/전류 계산을 위임하는 외부 서비스.
pub trait ComputationService {
    fn calculate(
        &self,
        inputs: &CalculationInputs,
        lang: Language,
    ) -> Result<CalculationResults, ServiceError>;
}

/// 언어 설정을 서버에 기록하는 서비스.
pub trait LanguageService {
    fn switch_language(&self, lang: Language) -> Result<(), ServiceError>;
}

#[derive(Debug, Serialize)]
struct LanguageRequest<'a> {
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct LanguageResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// 빈 문자열, false, 0, null인 `error`는 오류로 보지 않는다.
fn is_set(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => true,
    }
}

/// 계산 응답 본문을 해석한다. `error` 필드가 있으면 HTTP 상태와 관계없이 원격 오류다.
pub fn parse_calculation_response(body: &str) -> Result<CalculationResults, ServiceError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ServiceError::Transport(format!("invalid JSON response: {e}")))?;
    if let Some(err) = value.get("error").filter(|v| is_set(v)) {
        let msg = err
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        return Err(ServiceError::Remote(msg));
    }
    serde_json::from_value(value)
        .map_err(|e| ServiceError::Transport(format!("unexpected response shape: {e}")))
}

/// 언어 전환 응답을 해석한다.
pub fn parse_language_response(body: &str) -> Result<(), ServiceError> {
    let resp: LanguageResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::Transport(format!("invalid JSON response: {e}")))?;
    if resp.success {
        Ok(())
    } else {
        Err(ServiceError::Remote(
            resp.error
                .unwrap_or_else(|| "language switch rejected".to_string()),
        ))
    }
}

/// HTTP(JSON) 기반 서비스 구현.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        lang: Option<Language>,
        body: &T,
    ) -> Result<String, ServiceError> {
        let url = format!("{}{path}", self.base_url);
        let mut req = self.client.post(&url).json(body);
        if let Some(lang) = lang {
            req = req.header(ACCEPT_LANGUAGE, lang.as_code());
        }
        let resp = req.send().map_err(|e| {
            error!(%url, error = %e, "request failed");
            ServiceError::Transport(e.to_string())
        })?;
        debug!(%url, status = %resp.status(), "response received");
        resp.text().map_err(|e| {
            error!(%url, error = %e, "response body unreadable");
            ServiceError::Transport(e.to_string())
        })
    }
}

impl ComputationService for HttpBackend {
    fn calculate(
        &self,
        inputs: &CalculationInputs,
        lang: Language,
    ) -> Result<CalculationResults, ServiceError> {
        let body = self.post_json("/api/calculate", Some(lang), inputs)?;
        parse_calculation_response(&body)
    }
}

impl LanguageService for HttpBackend {
    fn switch_language(&self, lang: Language) -> Result<(), ServiceError> {
        let body = self.post_json(
            "/api/switch-language",
            None,
            &LanguageRequest {
                language: lang.as_code(),
            },
        )?;
        parse_language_response(&body)
    }
}
