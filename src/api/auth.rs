use actix_web::{http::header::AUTHORIZATION, FromRequest, HttpRequest};
use futures::future::{ready, Ready};

use super::{
    auth_utils::decode_token,
    errors::{AuthError, TodoApiError},
};
use crate::models::identity::Identity;

/// Capability check run before any store access.
///
/// Resolves the caller identity from the `Authorization` header or rejects
/// the request.
pub fn authenticate(req: &HttpRequest) -> Result<Identity, AuthError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::NoAuthorizationHeader)?;

    decode_token(header)
}

/// Extractor for handlers that require an authenticated caller
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(Identity);

impl FromRequest for Authenticated {
    type Error = TodoApiError;
    // Using `Ready` Future as we don't do any
    // async operation in the `from_request` function
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = authenticate(req).map(Authenticated).map_err(|err| {
            log::warn!("rejected {} {}: {}", req.method(), req.path(), err);
            TodoApiError::AuthError(err)
        });

        ready(result)
    }
}

/// Implement deref for `Authenticated` to
/// directly refer to `Identity` when using `.` notation
impl std::ops::Deref for Authenticated {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
