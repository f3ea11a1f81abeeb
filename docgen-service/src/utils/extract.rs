use axum::{
    extract::{FromRequest, Request},
    http::{header, HeaderValue, StatusCode},
    Form, Json,
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;

/// Deserializes the body as JSON when the request says so, otherwise as an
/// urlencoded form. A request without a content type is read as a form, so an
/// empty POST reaches validation. Bodies that parse but carry wrongly typed fields are 422,
/// anything else unreadable is 400.
pub struct FormOrJson<T>(pub T);

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

fn rejection(status: StatusCode, body_text: String) -> AppError {
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        AppError::UnprocessableEntity(anyhow::anyhow!(body_text))
    } else {
        AppError::BadRequest(anyhow::anyhow!(body_text))
    }
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for FormOrJson<T>
where
    T: DeserializeOwned + Send + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(mut req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !req.headers().contains_key(header::CONTENT_TYPE) {
            req.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            );
        }

        if is_json(&req) {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| rejection(e.status(), e.body_text()))?;
            Ok(FormOrJson(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| rejection(e.status(), e.body_text()))?;
            Ok(FormOrJson(value))
        }
    }
}
