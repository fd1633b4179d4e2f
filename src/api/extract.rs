//! Request extractors

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
    Json,
};

use crate::error::AppError;

/// JSON body whose data errors (wrong field types, `null` where a value is
/// required) are reported as validation failures rather than 422.
///
/// Syntax errors and a missing content type keep axum's own rejection.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(JsonRejection::JsonDataError(err)) => {
                Err(AppError::Validation(err.body_text()).into_response())
            }
            Err(rejection) => Err(rejection.into_response()),
        }
    }
}
