// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::{
    ADMIN_EMAIL, LECTURER_EMAIL, PASSWORD, STAFF_EMAIL, TestHarness, build_test_app, location,
    login, read_json, send,
};
use serde_json::json;

#[actix_web::test]
async fn anonymous_mutation_redirects_to_login_with_return_path() {
    let harness = TestHarness::new().await;
    let app = test::init_service(build_test_app(harness.app_bundle())).await;

    let resp = send(
        &app,
        test::TestRequest::post()
            .uri("/api/tags?from=menu")
            .set_json(json!({ "name": "Sports" })),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        location(&resp),
        "/login?return_path=%2Fapi%2Ftags%3Ffrom%3Dmenu"
    );
}

#[actix_web::test]
async fn insufficient_role_redirects_to_access_denied() {
    let harness = TestHarness::new().await;
    let app = test::init_service(build_test_app(harness.app_bundle())).await;
    let staff = login(&app, STAFF_EMAIL, PASSWORD).await;

    let resp = send(
        &app,
        test::TestRequest::post()
            .uri("/api/tags")
            .set_json(json!({ "name": "Sports" })),
        Some(&staff),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/access-denied");

    let resp = send(&app, test::TestRequest::get().uri("/access-denied"), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = read_json(resp).await;
    assert_eq!(body["code"], "access_denied");
}

#[actix_web::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let harness = TestHarness::new().await;
    let app = test::init_service(build_test_app(harness.app_bundle())).await;

    let wrong_password = send(
        &app,
        test::TestRequest::post()
            .uri("/login")
            .set_json(json!({ "email": ADMIN_EMAIL, "password": "nope" })),
        None,
    )
    .await;
    let wrong_status = wrong_password.status();
    let wrong_body = read_json(wrong_password).await;

    let unknown_email = send(
        &app,
        test::TestRequest::post()
            .uri("/login")
            .set_json(json!({ "email": "ghost@example.com", "password": PASSWORD })),
        None,
    )
    .await;
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), wrong_status);
    assert_eq!(read_json(unknown_email).await, wrong_body);
    assert_eq!(wrong_body["code"], "invalid_credentials");
}

#[actix_web::test]
async fn login_honours_only_local_return_paths() {
    let harness = TestHarness::new().await;
    let app = test::init_service(build_test_app(harness.app_bundle())).await;

    for (requested, expected) in [
        (Some("/api/articles?page=2"), "/api/articles?page=2"),
        (Some("//evil.example/"), "/"),
        (Some("https://evil.example/"), "/"),
        (None, "/"),
    ] {
        let resp = send(
            &app,
            test::TestRequest::post().uri("/login").set_json(json!({
                "email": LECTURER_EMAIL,
                "password": PASSWORD,
                "return_path": requested,
            })),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_json(resp).await;
        assert_eq!(body["return_path"], expected);
        assert_eq!(body["identity"]["role"], 3);
        assert!(body["identity"].get("password_hash").is_none());
    }
}

#[actix_web::test]
async fn me_follows_the_session_until_logout() {
    let harness = TestHarness::new().await;
    let app = test::init_service(build_test_app(harness.app_bundle())).await;

    let resp = send(&app, test::TestRequest::get().uri("/api/me"), None).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/login?return_path=%2Fapi%2Fme");

    let cookie = login(&app, ADMIN_EMAIL, PASSWORD).await;
    let resp = send(&app, test::TestRequest::get().uri("/api/me"), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["email"], ADMIN_EMAIL);
    assert_eq!(body["role"], 1);

    let resp = send(&app, test::TestRequest::post().uri("/logout"), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, test::TestRequest::get().uri("/api/me"), Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[actix_web::test]
async fn registration_creates_lecturers_once_per_email() {
    let harness = TestHarness::new().await;
    let app = test::init_service(build_test_app(harness.app_bundle())).await;

    let payload = json!({
        "name": "New Lecturer",
        "email": "new@example.com",
        "password": "fresh-password",
    });
    let resp = send(
        &app,
        test::TestRequest::post().uri("/register").set_json(&payload),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = read_json(resp).await;
    assert_eq!(body["role"], 3);

    let resp = send(
        &app,
        test::TestRequest::post().uri("/register").set_json(&payload),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(read_json(resp).await["code"], "conflict");

    login(&app, "new@example.com", "fresh-password").await;
}
