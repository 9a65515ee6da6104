// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

pub mod ws;

use actix_http::Request;
use actix_web::body::BoxBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use newsdesk::app_state::AppState;
use newsdesk::config::ValidatedConfig;
use newsdesk::iam::{IdentityMiddlewareFactory, hash_password};
use newsdesk::roles::Role;
use newsdesk::store::{Account, Category, Database, StoreError, Tag};
use serde_json::Value;
use std::sync::Arc;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const STAFF_EMAIL: &str = "staff@example.com";
pub const LECTURER_EMAIL: &str = "lecturer@example.com";
pub const PASSWORD: &str = "test-password";

pub const ADMIN_ID: i16 = 1;
pub const STAFF_ID: i16 = 2;
pub const LECTURER_ID: i16 = 3;

pub const NEWS_CATEGORY_ID: i16 = 1;
pub const CAMPUS_TAG_ID: i32 = 1;

pub struct TestHarness {
    pub config: Arc<ValidatedConfig>,
    pub app_state: Arc<AppState>,
    pub database: Database,
}

#[derive(Clone)]
pub struct AppBundle {
    pub config: Arc<ValidatedConfig>,
    pub app_state: Arc<AppState>,
}

fn account(id: i16, name: &str, email: &str, role: Role, config: &ValidatedConfig) -> Account {
    Account {
        id,
        name: name.to_string(),
        email: email.to_string(),
        password_hash: hash_password(PASSWORD, &config.password).expect("hash"),
        role,
    }
}

impl TestHarness {
    /// Admin, staff and lecturer accounts sharing [`PASSWORD`], one category and one tag.
    pub async fn new() -> Self {
        let config = Arc::new(ValidatedConfig::for_tests());
        let database = Database::in_memory();
        let seed_config = config.clone();
        database
            .commit(move |tables| {
                for seeded in [
                    account(ADMIN_ID, "Admin User", ADMIN_EMAIL, Role::Admin, &seed_config),
                    account(STAFF_ID, "Staff User", STAFF_EMAIL, Role::Staff, &seed_config),
                    account(
                        LECTURER_ID,
                        "Lecturer User",
                        LECTURER_EMAIL,
                        Role::Lecturer,
                        &seed_config,
                    ),
                ] {
                    tables.accounts.insert(seeded.id, seeded);
                }
                tables.categories.insert(
                    NEWS_CATEGORY_ID,
                    Category {
                        id: NEWS_CATEGORY_ID,
                        name: "News".to_string(),
                        description: "Campus news".to_string(),
                        parent_id: None,
                        is_active: true,
                    },
                );
                tables.tags.insert(
                    CAMPUS_TAG_ID,
                    Tag {
                        id: CAMPUS_TAG_ID,
                        name: "Campus".to_string(),
                        note: None,
                    },
                );
                Ok::<_, StoreError>(())
            })
            .await
            .expect("seed");

        let app_state = Arc::new(AppState::new(database.clone(), &config));
        Self {
            config,
            app_state,
            database,
        }
    }

    pub fn app_bundle(&self) -> AppBundle {
        AppBundle {
            config: self.config.clone(),
            app_state: self.app_state.clone(),
        }
    }
}

pub fn build_test_app(
    bundle: AppBundle,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::from(bundle.config))
        .app_data(web::Data::from(bundle.app_state))
        .wrap(IdentityMiddlewareFactory)
        .configure(newsdesk::configure)
}

/// Logs in through `POST /login` and returns the session cookie.
pub async fn login<S>(app: &S, email: &str, password: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(serde_json::json!({ "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK, "login as {}", email);
    let cookie_name = ValidatedConfig::for_tests().session.cookie_name;
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == cookie_name)
        .map(|cookie| cookie.into_owned())
        .expect("session cookie")
}

pub async fn send<S>(
    app: &S,
    req: test::TestRequest,
    cookie: Option<&Cookie<'static>>,
) -> ServiceResponse<BoxBody>
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>,
{
    let req = match cookie {
        Some(cookie) => req.cookie(cookie.clone()),
        None => req,
    };
    test::call_service(app, req.to_request()).await
}

pub async fn read_json(resp: ServiceResponse<BoxBody>) -> Value {
    let body = test::read_body(resp).await;
    serde_json::from_slice(&body).expect("json body")
}

pub fn location(resp: &ServiceResponse<BoxBody>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
