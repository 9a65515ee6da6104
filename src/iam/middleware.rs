// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::web::Data;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use std::future::{Ready, ready};
use std::pin::Pin;
use std::rc::Rc;

use super::identity::Identity;
use crate::app_state::AppState;
use crate::config::ValidatedConfig;

/// Id of the session the request arrived with, when that session is live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

/// Identity helpers attached to every request by [`IdentityMiddlewareFactory`].
pub trait IdentityRequest {
    fn identity(&self) -> Option<Identity>;
    fn session_id(&self) -> Option<String>;
}

impl IdentityRequest for HttpRequest {
    fn identity(&self) -> Option<Identity> {
        self.extensions().get::<Identity>().cloned()
    }

    fn session_id(&self) -> Option<String> {
        self.extensions()
            .get::<SessionId>()
            .map(|session| session.0.clone())
    }
}

/// The caller of a handler, possibly anonymous. Passed on to every service call
/// that needs to know who is acting.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    identity: Option<Identity>,
    requested_path: String,
}

impl Caller {
    pub fn new(identity: Option<Identity>, requested_path: impl Into<String>) -> Self {
        Self {
            identity,
            requested_path: requested_path.into(),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Path and query of the request, where a login should send the caller back to.
    pub fn requested_path(&self) -> &str {
        &self.requested_path
    }
}

impl FromRequest for Caller {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let requested_path = req
            .uri()
            .path_and_query()
            .map(|path| path.as_str().to_string())
            .unwrap_or_else(|| req.path().to_string());
        ready(Ok(Caller::new(req.identity(), requested_path)))
    }
}

/// Resolves the session cookie into an [`Identity`] in the request extensions.
pub struct IdentityMiddlewareFactory;

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct IdentityMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let state = req.app_data::<Data<AppState>>().cloned();
        let config = req.app_data::<Data<ValidatedConfig>>().cloned();
        let service = self.service.clone();

        Box::pin(async move {
            if let (Some(state), Some(config)) = (state, config)
                && let Some(cookie) = req.cookie(&config.session.cookie_name)
            {
                let session_id = cookie.value().to_string();
                if let Some(identity) = state.sessions.current(&session_id).await {
                    log::debug!(
                        "Session resolved for account {} ({})",
                        identity.account_id,
                        identity.role
                    );
                    req.extensions_mut().insert(identity);
                    req.extensions_mut().insert(SessionId(session_id));
                }
            }

            service.call(req).await
        })
    }
}
