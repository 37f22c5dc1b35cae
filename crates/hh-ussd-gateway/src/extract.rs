//! Carrier callback payloads.
//!
//! USSD aggregators post `application/x-www-form-urlencoded`; the dashboard
//! and test tools post JSON. Both decode into the same request types.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// USSD callback body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UssdRequest {
    pub session_id: String,
    #[serde(default)]
    pub service_code: Option<String>,
    pub phone_number: String,
    /// Cumulative `*`-joined input; empty on dial-in.
    #[serde(default)]
    pub text: String,
}

/// Inbound SMS body.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsRequest {
    pub from: String,
    #[serde(default)]
    pub text: String,
}

/// Rejected carrier payload.
#[derive(Debug)]
pub struct PayloadRejection(pub String);

impl IntoResponse for PayloadRejection {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.0).into_response()
    }
}

/// JSON or form body, chosen by `Content-Type`.
#[derive(Debug, Clone)]
pub struct CarrierPayload<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for CarrierPayload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = PayloadRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            Json::<T>::from_request(req, state)
                .await
                .map(|Json(value)| Self(value))
                .map_err(|e| PayloadRejection(e.body_text()))
        } else {
            Form::<T>::from_request(req, state)
                .await
                .map(|Form(value)| Self(value))
                .map_err(|e| PayloadRejection(e.body_text()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    async fn extract<T: DeserializeOwned>(
        content_type: &str,
        body: &str,
    ) -> Result<T, PayloadRejection> {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        CarrierPayload::<T>::from_request(req, &())
            .await
            .map(|CarrierPayload(value)| value)
    }

    #[tokio::test]
    async fn test_json_payload() {
        let req: UssdRequest = extract(
            "application/json",
            r#"{"sessionId":"ATUid_1","serviceCode":"*123#","phoneNumber":"+919000000001","text":"1*2"}"#,
        )
        .await
        .unwrap();
        assert_eq!(req.session_id, "ATUid_1");
        assert_eq!(req.service_code.as_deref(), Some("*123#"));
        assert_eq!(req.text, "1*2");
    }

    #[tokio::test]
    async fn test_form_payload() {
        let req: UssdRequest = extract(
            "application/x-www-form-urlencoded",
            "sessionId=ATUid_2&phoneNumber=%2B919000000002&text=",
        )
        .await
        .unwrap();
        assert_eq!(req.phone_number, "+919000000002");
        assert_eq!(req.text, "");
        assert_eq!(req.service_code, None);
    }

    #[tokio::test]
    async fn test_missing_field_rejected() {
        let result = extract::<SmsRequest>("application/json", r#"{"text":"HELP"}"#).await;
        assert!(result.is_err());
    }
}
