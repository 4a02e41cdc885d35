mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use blogroll::orm::{comments, posts};
use common::{body_string, count_posts, location, multipart_body, TestEnv, SMALL_GIF};
use sea_orm::{entity::*, PaginatorTrait};

#[actix_rt::test]
async fn index_lists_posts_newest_first() {
    let env = TestEnv::new().await;
    let anna = env.create_user("anna").await;
    env.create_post(&anna, "first post", None).await;
    env.create_post(&anna, "second post", None).await;
    let app = init_app!(env);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("Latest posts"));

    let first = html.find("first post").expect("first post shown");
    let second = html.find("second post").expect("second post shown");
    assert!(second < first);
}

#[actix_rt::test]
async fn listings_are_paginated_by_ten() {
    let env = TestEnv::new().await;
    let anna = env.create_user("anna").await;
    let group = env.create_group("Poetry", "poetry").await;
    for i in 0..13 {
        env.create_post(&anna, &format!("post number {}", i), Some(&group))
            .await;
    }
    let app = init_app!(env);

    for base in ["/", "/group/poetry/", "/profile/anna/"] {
        let resp =
            test::call_service(&app, test::TestRequest::get().uri(base).to_request()).await;
        assert_eq!(count_posts(&body_string(resp).await), 10, "{}", base);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("{}?page=2", base))
                .to_request(),
        )
        .await;
        assert_eq!(count_posts(&body_string(resp).await), 3, "{} page 2", base);
    }
}

#[actix_rt::test]
async fn bad_page_numbers_fall_back() {
    let env = TestEnv::new().await;
    let anna = env.create_user("anna").await;
    for i in 0..13 {
        env.create_post(&anna, &format!("post number {}", i), None)
            .await;
    }
    let app = init_app!(env);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/profile/anna/?page=abc").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(count_posts(&body_string(resp).await), 10);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/profile/anna/?page=99").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(count_posts(&body_string(resp).await), 3);
}

#[actix_rt::test]
async fn group_page_only_shows_its_posts() {
    let env = TestEnv::new().await;
    let anna = env.create_user("anna").await;
    let poetry = env.create_group("Poetry", "poetry").await;
    let prose = env.create_group("Prose", "prose").await;
    env.create_post(&anna, "a short poem", Some(&poetry)).await;
    env.create_post(&anna, "a long novel", Some(&prose)).await;
    let app = init_app!(env);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/group/poetry/").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("group-title"));
    assert!(html.contains("Poetry"));
    assert!(html.contains("All about Poetry"));
    assert!(html.contains("a short poem"));
    assert!(!html.contains("a long novel"));
}

#[actix_rt::test]
async fn unknown_pages_are_404() {
    let env = TestEnv::new().await;
    let app = init_app!(env);

    for uri in ["/posts/999/", "/group/nothing/", "/profile/nobody/", "/no/such/page/"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(
            resp.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store",
            "{}",
            uri
        );
        let html = body_string(resp).await;
        assert!(html.contains("404 Not Found"), "{}", uri);
    }
}

#[actix_rt::test]
async fn post_detail_shows_author_count_and_comments() {
    let env = TestEnv::new().await;
    let anna = env.create_user("anna").await;
    let bob = env.create_user("bob").await;
    env.create_post(&anna, "older post", None).await;
    let post = env.create_post(&anna, "newer post", None).await;
    blogroll::comment::insert_comment(env.conn(), post.id, bob.id, "nice one".to_owned())
        .await
        .unwrap();
    let app = init_app!(env);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/", post.id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("newer post"));
    assert!(html.contains("Posts by this author: 2"));
    assert!(html.contains("nice one"));
    assert!(html.contains("/profile/bob/"));
    // Guests get no comment form and no edit link.
    assert!(!html.contains("comment-form"));
    assert!(!html.contains(&format!("/posts/{}/edit/", post.id)));
}

#[actix_rt::test]
async fn create_post_redirects_to_profile() {
    let env = TestEnv::new().await;
    env.create_user("anna").await;
    let group = env.create_group("Poetry", "poetry").await;
    let app = init_app!(env);
    let cookie = login!(app, "anna");

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/create/")
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("New post"));
    assert!(html.contains("Poetry"));

    let group_id = group.id.to_string();
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .cookie(cookie)
            .set_form(&[("text", "hello from anna"), ("group", group_id.as_str())])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/anna/");

    let stored = posts::Entity::find().all(env.conn()).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].text, "hello from anna");
    assert_eq!(stored[0].group_id, Some(group.id));
}

#[actix_rt::test]
async fn empty_post_is_rejected() {
    let env = TestEnv::new().await;
    env.create_user("anna").await;
    let app = init_app!(env);
    let cookie = login!(app, "anna");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .cookie(cookie)
            .set_form(&[("text", "   ")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("This field is required."));
    assert_eq!(posts::Entity::find().count(env.conn()).await.unwrap(), 0);
}

#[actix_rt::test]
async fn guests_are_sent_to_login() {
    let env = TestEnv::new().await;
    let anna = env.create_user("anna").await;
    let post = env.create_post(&anna, "anna's post", None).await;
    let app = init_app!(env);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/create/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");

    let edit = format!("/posts/{}/edit/", post.id);
    let resp = test::call_service(&app, test::TestRequest::get().uri(&edit).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/auth/login/?next={}", edit));

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .set_form(&[("text", "sneaky")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(posts::Entity::find().count(env.conn()).await.unwrap(), 1);
}

#[actix_rt::test]
async fn author_edits_post() {
    let env = TestEnv::new().await;
    let anna = env.create_user("anna").await;
    let group = env.create_group("Poetry", "poetry").await;
    let post = env.create_post(&anna, "draft", Some(&group)).await;
    let app = init_app!(env);
    let cookie = login!(app, "anna");
    let edit = format!("/posts/{}/edit/", post.id);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&edit)
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("Edit post"));
    assert!(html.contains(">draft</textarea>"));
    assert!(html.contains(" selected>Poetry"));

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&edit)
            .cookie(cookie)
            .set_form(&[("text", "final"), ("group", "")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let stored = posts::Entity::find_by_id(post.id)
        .one(env.conn())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.text, "final");
    assert_eq!(stored.group_id, None);
    assert_eq!(stored.author_id, anna.id);
}

#[actix_rt::test]
async fn only_the_author_may_edit() {
    let env = TestEnv::new().await;
    let anna = env.create_user("anna").await;
    env.create_user("bob").await;
    let post = env.create_post(&anna, "anna's words", None).await;
    let app = init_app!(env);
    let cookie = login!(app, "bob");
    let edit = format!("/posts/{}/edit/", post.id);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&edit)
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&edit)
            .cookie(cookie)
            .set_form(&[("text", "bob's words")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let stored = posts::Entity::find_by_id(post.id)
        .one(env.conn())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.text, "anna's words");
}

#[actix_rt::test]
async fn users_comment_and_guests_cannot() {
    let env = TestEnv::new().await;
    let anna = env.create_user("anna").await;
    env.create_user("bob").await;
    let post = env.create_post(&anna, "talk to me", None).await;
    let app = init_app!(env);
    let comment_url = format!("/posts/{}/comment/", post.id);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&comment_url)
            .set_form(&[("text", "guest words")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/auth/login/"));
    assert_eq!(comments::Entity::find().count(env.conn()).await.unwrap(), 0);

    let cookie = login!(app, "bob");
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&comment_url)
            .cookie(cookie.clone())
            .set_form(&[("text", "hi anna")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    assert_eq!(comments::Entity::find().count(env.conn()).await.unwrap(), 1);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/", post.id))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    let html = body_string(resp).await;
    assert!(html.contains("hi anna"));
    assert!(html.contains("comment-form"));
}

#[actix_rt::test]
async fn image_upload_is_stored_and_shown() {
    let env = TestEnv::new().await;
    env.create_user("anna").await;
    let group = env.create_group("Poetry", "poetry").await;
    let app = init_app!(env);
    let cookie = login!(app, "anna");

    let group_id = group.id.to_string();
    let (content_type, body) = multipart_body(
        &[("text", "a picture"), ("group", group_id.as_str())],
        Some(("image", "small.gif", SMALL_GIF)),
    );
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .cookie(cookie)
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/anna/");

    let stored = posts::Entity::find().one(env.conn()).await.unwrap().unwrap();
    assert_eq!(stored.image.as_deref(), Some("posts/small.gif"));
    assert!(env.media.path().join("posts/small.gif").exists());

    let pages = [
        "/".to_owned(),
        "/profile/anna/".to_owned(),
        "/group/poetry/".to_owned(),
        format!("/posts/{}/", stored.id),
    ];
    for uri in pages.iter() {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        let html = body_string(resp).await;
        assert!(html.contains("class=\"post-image\""), "{}", uri);
        assert!(html.contains("small.gif"), "{}", uri);
    }

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/media/posts/small.gif")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn non_image_upload_is_rejected() {
    let env = TestEnv::new().await;
    env.create_user("anna").await;
    let app = init_app!(env);
    let cookie = login!(app, "anna");

    let (content_type, body) = multipart_body(
        &[("text", "not a picture")],
        Some(("image", "notes.txt", b"just text")),
    );
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .cookie(cookie)
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("Upload a valid image."));
    assert_eq!(posts::Entity::find().count(env.conn()).await.unwrap(), 0);
}
