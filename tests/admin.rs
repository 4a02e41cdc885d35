mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use blogroll::orm::groups;
use common::{body_string, location, TestEnv};
use sea_orm::{entity::*, PaginatorTrait};

#[actix_rt::test]
async fn admin_is_for_staff_only() {
    let env = TestEnv::new().await;
    env.create_user("anna").await;
    env.create_staff("root").await;
    let app = init_app!(env);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/admin/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/admin/");

    let cookie = login!(app, "anna");
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/admin/")
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/admin/groups/")
            .cookie(cookie)
            .set_form(&[("title", "Nope"), ("slug", "nope"), ("description", "no")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(groups::Entity::find().count(env.conn()).await.unwrap(), 0);

    let cookie = login!(app, "root");
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/admin/")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("Site administration"));
}

#[actix_rt::test]
async fn staff_create_groups() {
    let env = TestEnv::new().await;
    env.create_staff("root").await;
    env.create_group("Poetry", "poetry").await;
    let app = init_app!(env);
    let cookie = login!(app, "root");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/admin/groups/")
            .cookie(cookie.clone())
            .set_form(&[
                ("title", "Short stories"),
                ("slug", "short-stories"),
                ("description", "Stories that fit on a page."),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/admin/");

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/group/short-stories/")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/admin/groups/")
            .cookie(cookie)
            .set_form(&[
                ("title", "Poems again"),
                ("slug", "poetry"),
                ("description", "Duplicate slug."),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp)
        .await
        .contains("Group with this Slug already exists."));
    assert_eq!(groups::Entity::find().count(env.conn()).await.unwrap(), 2);
}
