//! Startup registration with an external service registrar.

use async_trait::async_trait;
use serde::Serialize;

use crate::{config::RegistrationSettings, error::RegistrationError};

/// JSON body posted to the registrar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub service_name: String,
    pub service_identifier: String,
    #[serde(rename = "websocketURL")]
    pub websocket_url: String,
    /// Sent as the string `"true"`, as the registrar expects.
    pub available: String,
}

impl From<&RegistrationSettings> for RegistrationRequest {
    fn from(settings: &RegistrationSettings) -> Self {
        Self {
            service_name: settings.service_name.clone(),
            service_identifier: settings.service_id.clone(),
            websocket_url: settings.websocket_url.clone(),
            available: "true".to_string(),
        }
    }
}

/// Announces this server to a registrar.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceRegistrar: Send + Sync {
    async fn register(&self, request: RegistrationRequest) -> Result<(), RegistrationError>;
}

/// Registrar reached with a single HTTP `POST`.
pub struct HttpRegistrar {
    client: reqwest::Client,
    url: String,
}

impl HttpRegistrar {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ServiceRegistrar for HttpRegistrar {
    async fn register(&self, request: RegistrationRequest) -> Result<(), RegistrationError> {
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RegistrationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistrationError::Status(status.as_u16()));
        }
        tracing::info!(status = status.as_u16(), url = %self.url, "server registered");
        Ok(())
    }
}

/// Register with `registrar`, applying the failure policy of `settings`.
///
/// A failure is returned only when registration is required; otherwise it is
/// logged and swallowed.
pub async fn register_service(
    registrar: &dyn ServiceRegistrar,
    settings: &RegistrationSettings,
) -> Result<(), RegistrationError> {
    match registrar.register(RegistrationRequest::from(settings)).await {
        Ok(()) => Ok(()),
        Err(e) if settings.required => Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "service registration failed; continuing without it");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn settings(required: bool) -> RegistrationSettings {
        RegistrationSettings {
            registrar_url: "http://localhost:3030/webservers/register".to_string(),
            service_name: "local_service".to_string(),
            service_id: "0123abcd".to_string(),
            websocket_url: "localhost:8080/connect/0123abcd".to_string(),
            required,
        }
    }

    #[test]
    fn test_request_body_shape() {
        // テスト項目: 登録リクエストの JSON ボディが登録先の期待する形になる
        // when (操作):
        let body = serde_json::to_value(RegistrationRequest::from(&settings(true))).unwrap();

        // then (期待する結果):
        assert_eq!(
            body,
            serde_json::json!({
                "serviceName": "local_service",
                "serviceIdentifier": "0123abcd",
                "websocketURL": "localhost:8080/connect/0123abcd",
                "available": "true",
            })
        );
    }

    #[tokio::test]
    async fn test_register_service_success() {
        // テスト項目: 登録成功時は Ok を返す
        // given (前提条件):
        let mut registrar = MockServiceRegistrar::new();
        registrar
            .expect_register()
            .with(eq(RegistrationRequest::from(&settings(true))))
            .times(1)
            .returning(|_| Ok(()));

        // when (操作):
        let result = register_service(&registrar, &settings(true)).await;

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_required_registration_failure_is_fatal() {
        // テスト項目: 必須の登録が失敗するとエラーが返される
        let mut registrar = MockServiceRegistrar::new();
        registrar
            .expect_register()
            .returning(|_| Err(RegistrationError::Status(503)));

        let result = register_service(&registrar, &settings(true)).await;

        assert_eq!(result, Err(RegistrationError::Status(503)));
    }

    #[tokio::test]
    async fn test_optional_registration_failure_is_ignored() {
        // テスト項目: 任意の登録が失敗しても起動は継続できる
        let mut registrar = MockServiceRegistrar::new();
        registrar
            .expect_register()
            .returning(|_| Err(RegistrationError::Request("connection refused".to_string())));

        let result = register_service(&registrar, &settings(false)).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_http_registrar_unreachable_is_request_error() {
        // テスト項目: 到達できない登録先は Request エラーになる
        // given (前提条件): 何も待ち受けていないポート
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let registrar = HttpRegistrar::new(format!("http://{addr}/register"));

        // when (操作):
        let result = registrar
            .register(RegistrationRequest::from(&settings(true)))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(RegistrationError::Request(_))));
    }
}
