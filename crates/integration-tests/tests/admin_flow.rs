//! Admin back-office flows: access gating, product CRUD, order status, roles.

#![allow(clippy::unwrap_used)]

use sweet_shop_integration_tests::{TestContext, flash_message, location_of, query_param};

#[tokio::test]
async fn admin_pages_bounce_anonymous_visitors_to_login() {
    let ctx = TestContext::spawn().await;
    for path in ["/admin/sweets", "/admin/orders", "/admin/users"] {
        let response = ctx.get(path).await;
        let location = location_of(&response);
        assert!(location.starts_with("/auth/login"), "for {path}: {location}");
        assert_eq!(query_param(&location, "next").as_deref(), Some(path));
    }
}

#[tokio::test]
async fn admin_pages_bounce_non_admins_home() {
    let ctx = TestContext::spawn().await;
    ctx.login("customer@sweetshop.test", "caramel-999").await;

    let response = ctx.get("/admin/sweets").await;
    assert_eq!(location_of(&response), "/");
}

#[tokio::test]
async fn product_table_shows_hidden_and_sold_out_sweets() {
    let ctx = TestContext::spawn().await;
    ctx.login("admin@sweetshop.test", "sugar-rush-8").await;

    let body = ctx.get("/admin/sweets").await.text().await.unwrap();
    assert!(body.contains("Ladoo"));
    assert!(body.contains("Sold Out Fudge"));
    assert!(body.contains("Secret Batch"));
    assert!(body.contains("Hidden"));
}

#[tokio::test]
async fn admin_can_create_a_sweet() {
    let ctx = TestContext::spawn().await;
    ctx.login("admin@sweetshop.test", "sugar-rush-8").await;

    let response = ctx
        .post_form(
            "/admin/sweets",
            &[
                ("name", "Jalebi"),
                ("description", "Crispy spirals"),
                ("category", "Traditional"),
                ("price", "1.75"),
                ("stock_quantity", "20"),
                ("is_available", "on"),
            ],
        )
        .await;

    let location = location_of(&response);
    assert!(location.starts_with("/admin/sweets"));
    assert_eq!(
        flash_message(&location, "success").as_deref(),
        Some("Created Jalebi")
    );
    assert!(ctx.mock.lock().sweet_named("Jalebi").is_some());

    // The new sweet reaches the shop page on the next snapshot
    let body = ctx.get("/").await.text().await.unwrap();
    assert!(body.contains("Jalebi"));
}

#[tokio::test]
async fn create_rejects_blank_name_before_the_api() {
    let ctx = TestContext::spawn().await;
    ctx.login("admin@sweetshop.test", "sugar-rush-8").await;
    let sweets_before = ctx.mock.lock().sweets.len();

    let response = ctx
        .post_form(
            "/admin/sweets",
            &[
                ("name", "   "),
                ("category", "Traditional"),
                ("price", "1.75"),
                ("stock_quantity", "20"),
                ("is_available", "on"),
            ],
        )
        .await;

    assert_eq!(
        flash_message(&location_of(&response), "error").as_deref(),
        Some("Name is required")
    );
    assert_eq!(ctx.mock.lock().sweets.len(), sweets_before);
}

#[tokio::test]
async fn duplicate_name_error_comes_from_the_server() {
    let ctx = TestContext::spawn().await;
    ctx.login("admin@sweetshop.test", "sugar-rush-8").await;

    let response = ctx
        .post_form(
            "/admin/sweets",
            &[
                ("name", "Ladoo"),
                ("category", "Traditional"),
                ("price", "1.75"),
                ("stock_quantity", "20"),
                ("is_available", "on"),
            ],
        )
        .await;

    assert_eq!(
        flash_message(&location_of(&response), "error").as_deref(),
        Some("Sweet with this name already exists")
    );
}

#[tokio::test]
async fn admin_can_update_and_delete_a_sweet() {
    let ctx = TestContext::spawn().await;
    ctx.login("admin@sweetshop.test", "sugar-rush-8").await;
    let ladoo = ctx.mock.lock().sweet_named("Ladoo").unwrap().id;

    let response = ctx
        .post_form(
            &format!("/admin/sweets/{ladoo}"),
            &[
                ("name", "Ladoo"),
                ("category", "Traditional"),
                ("price", "2.50"),
                ("stock_quantity", "15"),
                ("is_available", "on"),
            ],
        )
        .await;
    assert_eq!(
        flash_message(&location_of(&response), "success").as_deref(),
        Some("Updated Ladoo")
    );
    {
        let data = ctx.mock.lock();
        let sweet = data.sweet_named("Ladoo").unwrap();
        assert!((sweet.price - 2.5).abs() < f64::EPSILON);
        assert_eq!(sweet.stock_quantity, 15);
    }

    let response = ctx
        .post_form(&format!("/admin/sweets/{ladoo}/delete"), &[])
        .await;
    assert_eq!(
        flash_message(&location_of(&response), "success").as_deref(),
        Some("Sweet deleted")
    );
    assert!(ctx.mock.lock().sweet_named("Ladoo").is_none());
}

#[tokio::test]
async fn unchecked_availability_box_hides_the_sweet() {
    let ctx = TestContext::spawn().await;
    ctx.login("admin@sweetshop.test", "sugar-rush-8").await;
    let ladoo = ctx.mock.lock().sweet_named("Ladoo").unwrap().id;

    // Browser forms omit unchecked checkboxes entirely
    ctx.post_form(
        &format!("/admin/sweets/{ladoo}"),
        &[
            ("name", "Ladoo"),
            ("category", "Traditional"),
            ("price", "2.00"),
            ("stock_quantity", "10"),
        ],
    )
    .await;

    assert!(!ctx.mock.lock().sweet_named("Ladoo").unwrap().is_available);
    let body = ctx.get("/").await.text().await.unwrap();
    assert!(!body.contains("Ladoo"));
}

#[tokio::test]
async fn admin_sees_all_orders_and_can_change_status() {
    let ctx = TestContext::spawn().await;

    // A customer places an order first
    ctx.login("customer@sweetshop.test", "caramel-999").await;
    let ladoo = ctx.mock.lock().sweet_named("Ladoo").unwrap().id;
    ctx.post_form("/cart/add", &[("sweet_id", &ladoo.to_string())])
        .await;
    ctx.post_form("/checkout", &[]).await;
    ctx.post_form("/auth/logout", &[]).await;

    ctx.login("admin@sweetshop.test", "sugar-rush-8").await;
    let body = ctx.get("/admin/orders").await.text().await.unwrap();
    assert!(body.contains("customer@sweetshop.test"));
    assert!(body.contains("Ladoo"));

    let order_id = ctx.mock.lock().orders[0].id;
    let response = ctx
        .post_form(
            &format!("/admin/orders/{order_id}/status"),
            &[("status", "Shipped")],
        )
        .await;
    assert_eq!(
        flash_message(&location_of(&response), "success").as_deref(),
        Some(format!("Order #{order_id} is now Shipped").as_str())
    );
    assert_eq!(ctx.mock.lock().orders[0].status, "Shipped");
}

#[tokio::test]
async fn unknown_status_is_rejected_before_the_api() {
    let ctx = TestContext::spawn().await;
    ctx.login("admin@sweetshop.test", "sugar-rush-8").await;

    let response = ctx
        .post_form("/admin/orders/1/status", &[("status", "teleported")])
        .await;
    assert_eq!(
        flash_message(&location_of(&response), "error").as_deref(),
        Some("Unknown order status")
    );
}

#[tokio::test]
async fn admin_can_promote_a_customer() {
    let ctx = TestContext::spawn().await;
    ctx.login("admin@sweetshop.test", "sugar-rush-8").await;

    let body = ctx.get("/admin/users").await.text().await.unwrap();
    assert!(body.contains("admin@sweetshop.test"));
    assert!(body.contains("customer@sweetshop.test"));

    let customer_id = ctx
        .mock
        .lock()
        .users
        .iter()
        .find(|u| u.email == "customer@sweetshop.test")
        .unwrap()
        .id;

    let response = ctx
        .post_form(
            &format!("/admin/users/{customer_id}/admin"),
            &[("is_admin", "true")],
        )
        .await;
    let message = flash_message(&location_of(&response), "success").unwrap();
    assert!(message.contains("now an admin"));
    assert!(
        ctx.mock
            .lock()
            .users
            .iter()
            .find(|u| u.id == customer_id)
            .unwrap()
            .is_admin
    );
}

#[tokio::test]
async fn self_demotion_is_blocked_before_the_api() {
    let ctx = TestContext::spawn().await;
    ctx.login("admin@sweetshop.test", "sugar-rush-8").await;

    let admin_id = ctx
        .mock
        .lock()
        .users
        .iter()
        .find(|u| u.email == "admin@sweetshop.test")
        .unwrap()
        .id;

    let response = ctx
        .post_form(
            &format!("/admin/users/{admin_id}/admin"),
            &[("is_admin", "false")],
        )
        .await;
    assert_eq!(
        flash_message(&location_of(&response), "error").as_deref(),
        Some("You cannot remove your own admin access")
    );

    // The flag never changed server-side
    assert!(
        ctx.mock
            .lock()
            .users
            .iter()
            .find(|u| u.id == admin_id)
            .unwrap()
            .is_admin
    );
}
