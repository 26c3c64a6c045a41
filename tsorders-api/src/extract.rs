use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use tsorders_core::schemas::Validate;

use crate::error::AppError;

/// JSON body that has been deserialized and checked with [`Validate`].
///
/// Malformed bodies and rule violations are both answered with 422.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::ValidationError(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}
