// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Extractors for bearer-token authenticated endpoints.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, web::Data, FromRequest, HttpRequest};
use rptvbackend::crypto::tokens::{AccessClaims, AccessTokenVerifier};
use rptvtypes::identifiers::Role;
use tracing::{debug, error};

use crate::errors::ApiError;

/// The verified claims of the request's bearer token.
#[derive(Debug, Clone)]
pub struct Authenticated(pub AccessClaims);

impl FromRequest for Authenticated {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req).map(Self))
    }
}

/// Like [`Authenticated`], but the token must carry the `ADMIN` role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AccessClaims);

impl FromRequest for AdminUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req).and_then(|claims| {
            if claims.roles.contains(Role::Admin) {
                Ok(Self(claims))
            } else {
                Err(ApiError::forbidden("Access denied"))
            }
        }))
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty()).then_some(token)
}

fn authenticate(req: &HttpRequest) -> Result<AccessClaims, ApiError> {
    let Some(verifier) = req.app_data::<Data<AccessTokenVerifier>>() else {
        error!("No access token verifier registered");
        return Err(ApiError::internal());
    };
    let token = bearer_token(req).ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;
    verifier.verify(token).map_err(|error| {
        debug!(%error, "Rejected access token");
        ApiError::unauthorized("Invalid access token")
    })
}
