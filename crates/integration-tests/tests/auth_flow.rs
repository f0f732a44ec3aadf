//! Login, registration, and logout flows through the real HTTP surface.

#![allow(clippy::unwrap_used)]

use sweet_shop_integration_tests::{TestContext, flash_message, location_of, query_param};

#[tokio::test]
async fn health_endpoint_responds() {
    let ctx = TestContext::spawn().await;
    let response = ctx.get("/health").await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn shop_page_renders_for_anonymous_visitors() {
    let ctx = TestContext::spawn().await;
    let body = ctx.get("/").await.text().await.unwrap();
    assert!(body.contains("Ladoo"));
    assert!(body.contains("Log in"));
}

#[tokio::test]
async fn login_with_wrong_password_shows_server_message() {
    let ctx = TestContext::spawn().await;
    let response = ctx
        .post_form(
            "/auth/login",
            &[
                ("email", "customer@sweetshop.test"),
                ("password", "wrong-password"),
            ],
        )
        .await;

    let location = location_of(&response);
    assert!(location.starts_with("/auth/login"));
    assert_eq!(
        flash_message(&location, "error").as_deref(),
        Some("Incorrect username or password")
    );
}

#[tokio::test]
async fn login_establishes_a_session() {
    let ctx = TestContext::spawn().await;
    ctx.login("customer@sweetshop.test", "caramel-999").await;

    let body = ctx.get("/").await.text().await.unwrap();
    assert!(body.contains("customer@sweetshop.test"));
    assert!(body.contains("Log out"));
}

#[tokio::test]
async fn registration_signs_the_user_in() {
    let ctx = TestContext::spawn().await;
    let response = ctx
        .post_form(
            "/auth/register",
            &[
                ("email", "newbie@sweetshop.test"),
                ("password", "toffee-apple-1"),
                ("password_confirm", "toffee-apple-1"),
            ],
        )
        .await;
    assert_eq!(location_of(&response), "/");

    let body = ctx.get("/").await.text().await.unwrap();
    assert!(body.contains("newbie@sweetshop.test"));
}

#[tokio::test]
async fn registration_logs_in_through_the_token_endpoint() {
    let ctx = TestContext::spawn().await;
    assert_eq!(ctx.mock.lock().token_requests, 0);

    ctx.post_form(
        "/auth/register",
        &[
            ("email", "newbie@sweetshop.test"),
            ("password", "toffee-apple-1"),
            ("password_confirm", "toffee-apple-1"),
        ],
    )
    .await;

    // The account is created and then signed in with a real credential
    // exchange, not the register response's token
    assert_eq!(ctx.mock.lock().token_requests, 1);
}

#[tokio::test]
async fn registration_rejects_mismatched_passwords_locally() {
    let ctx = TestContext::spawn().await;
    let users_before = ctx.mock.lock().users.len();

    let response = ctx
        .post_form(
            "/auth/register",
            &[
                ("email", "newbie@sweetshop.test"),
                ("password", "toffee-apple-1"),
                ("password_confirm", "different-thing"),
            ],
        )
        .await;

    let location = location_of(&response);
    assert_eq!(
        flash_message(&location, "error").as_deref(),
        Some("Passwords do not match")
    );
    // The check failed before any request reached the API
    assert_eq!(ctx.mock.lock().users.len(), users_before);
}

#[tokio::test]
async fn registration_rejects_short_passwords_locally() {
    let ctx = TestContext::spawn().await;
    let users_before = ctx.mock.lock().users.len();

    let response = ctx
        .post_form(
            "/auth/register",
            &[
                ("email", "newbie@sweetshop.test"),
                ("password", "short"),
                ("password_confirm", "short"),
            ],
        )
        .await;

    assert_eq!(
        flash_message(&location_of(&response), "error").as_deref(),
        Some("Password must be at least 8 characters")
    );
    assert_eq!(ctx.mock.lock().users.len(), users_before);
}

#[tokio::test]
async fn registration_surfaces_duplicate_email_error() {
    let ctx = TestContext::spawn().await;
    let response = ctx
        .post_form(
            "/auth/register",
            &[
                ("email", "customer@sweetshop.test"),
                ("password", "toffee-apple-1"),
                ("password_confirm", "toffee-apple-1"),
            ],
        )
        .await;

    assert_eq!(
        flash_message(&location_of(&response), "error").as_deref(),
        Some("Email already registered")
    );
}

#[tokio::test]
async fn logout_drops_identity_and_cart() {
    let ctx = TestContext::spawn().await;
    ctx.login("customer@sweetshop.test", "caramel-999").await;

    let ladoo = ctx.mock.lock().sweet_named("Ladoo").unwrap().id;
    ctx.post_form("/cart/add", &[("sweet_id", &ladoo.to_string())])
        .await;

    let response = ctx.post_form("/auth/logout", &[]).await;
    assert_eq!(location_of(&response), "/auth/login");

    let body = ctx.get("/").await.text().await.unwrap();
    assert!(body.contains("Log in"));
    assert!(body.contains("Your cart is empty"));
}

#[tokio::test]
async fn order_history_requires_login() {
    let ctx = TestContext::spawn().await;
    let response = ctx.get("/account/orders").await;
    let location = location_of(&response);
    assert!(location.starts_with("/auth/login"));
    assert_eq!(
        query_param(&location, "next").as_deref(),
        Some("/account/orders")
    );
}

#[tokio::test]
async fn login_returns_to_the_page_that_required_it() {
    let ctx = TestContext::spawn().await;

    let response = ctx
        .post_form(
            "/auth/login",
            &[
                ("email", "customer@sweetshop.test"),
                ("password", "caramel-999"),
                ("next", "/account/orders"),
            ],
        )
        .await;
    assert_eq!(location_of(&response), "/account/orders");
}

#[tokio::test]
async fn login_ignores_offsite_redirect_targets() {
    let ctx = TestContext::spawn().await;

    for target in ["https://evil.example/", "//evil.example"] {
        let response = ctx
            .post_form(
                "/auth/login",
                &[
                    ("email", "customer@sweetshop.test"),
                    ("password", "caramel-999"),
                    ("next", target),
                ],
            )
            .await;
        assert_eq!(location_of(&response), "/", "for {target}");
    }
}
