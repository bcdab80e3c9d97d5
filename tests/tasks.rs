mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashSet;

use common::{
    bearer, create_category, create_task, init_app, register_and_login, send, Harness,
};

fn task_payload(title: &str, priority: &str, due_date: &str) -> Value {
    json!({
        "title": title,
        "description": format!("{} description", title),
        "priority": priority,
        "dueDate": due_date
    })
}

#[actix_rt::test]
async fn test_task_crud_flow() {
    let harness = Harness::new();
    let app = init_app(&harness).await;
    let alice = register_and_login(&app, "alice").await;

    let task = create_task(&app, &alice, task_payload("Write report", "High", "2025-03-12")).await;
    assert_eq!(task["title"], "Write report");
    assert_eq!(task["priority"], "High");
    assert_eq!(task["dueDate"], "2025-03-12");
    assert_eq!(task["isCompleted"], false);
    assert_eq!(task["isPublic"], false);
    assert_eq!(task["authorUsername"], "alice");
    let id = task["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/tasks/{}", id))
        .insert_header(bearer(&alice.access_token))
        .to_request();
    let (status, fetched) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], task["id"]);

    harness.tick();
    let req = test::TestRequest::patch()
        .uri(&format!("/tasks/{}", id))
        .insert_header(bearer(&alice.access_token))
        .set_json(json!({ "isCompleted": true, "title": "Write final report" }))
        .to_request();
    let (status, updated) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK, "update failed: {}", updated);
    assert_eq!(updated["isCompleted"], true);
    assert_eq!(updated["title"], "Write final report");
    assert_eq!(updated["priority"], "High");
    assert_ne!(updated["updatedAt"], task["updatedAt"]);

    let req = test::TestRequest::delete()
        .uri(&format!("/tasks/{}", id))
        .insert_header(bearer(&alice.access_token))
        .to_request();
    let (status, deleted) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["id"], task["id"]);

    let req = test::TestRequest::get()
        .uri(&format!("/tasks/{}", id))
        .insert_header(bearer(&alice.access_token))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_update_can_clear_nullable_fields() {
    let harness = Harness::new();
    let app = init_app(&harness).await;
    let alice = register_and_login(&app, "alice").await;
    let category = create_category(&app, &alice, "Work").await;

    let mut payload = task_payload("Quarterly report", "High", "2025-03-12");
    payload["categoryId"] = category["id"].clone();
    payload["fileUrl"] = json!("file-1-1.pdf");
    let task = create_task(&app, &alice, payload).await;
    assert_eq!(task["description"], "Quarterly report description");

    let req = test::TestRequest::patch()
        .uri(&format!("/tasks/{}", task["id"].as_str().unwrap()))
        .insert_header(bearer(&alice.access_token))
        .set_json(json!({ "categoryId": null, "description": null }))
        .to_request();
    let (status, updated) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK, "update failed: {}", updated);
    assert!(updated["categoryId"].is_null());
    assert!(updated["category"].is_null());
    assert!(updated["description"].is_null());
    // Keys that were not sent keep their values.
    assert_eq!(updated["fileUrl"], "file-1-1.pdf");
    assert_eq!(updated["title"], "Quarterly report");

    let req = test::TestRequest::get()
        .uri(&format!("/tasks/{}", task["id"].as_str().unwrap()))
        .insert_header(bearer(&alice.access_token))
        .to_request();
    let (_, fetched) = send(&app, req).await;
    assert!(fetched["categoryId"].is_null());
    assert!(fetched["description"].is_null());

    let req = test::TestRequest::patch()
        .uri(&format!("/tasks/{}", task["id"].as_str().unwrap()))
        .insert_header(bearer(&alice.access_token))
        .set_json(json!({ "fileUrl": null }))
        .to_request();
    let (_, updated) = send(&app, req).await;
    assert!(updated["fileUrl"].is_null());
}

#[actix_rt::test]
async fn test_task_responses_embed_category() {
    let harness = Harness::new();
    let app = init_app(&harness).await;
    let alice = register_and_login(&app, "alice").await;
    let bob = register_and_login(&app, "bob").await;
    let work = create_category(&app, &alice, "Work").await;
    let home = create_category(&app, &alice, "Home").await;

    let mut payload = task_payload("Shared plan", "Medium", "2025-03-20");
    payload["categoryId"] = work["id"].clone();
    payload["isPublic"] = json!(true);
    let task = create_task(&app, &alice, payload).await;
    let id = task["id"].as_str().unwrap().to_string();
    assert_eq!(task["category"], work);

    let plain = create_task(&app, &alice, task_payload("Loose end", "Low", "2025-03-20")).await;
    assert!(plain["category"].is_null());

    let req = test::TestRequest::get()
        .uri(&format!("/tasks/{}", id))
        .insert_header(bearer(&alice.access_token))
        .to_request();
    let (_, fetched) = send(&app, req).await;
    assert_eq!(fetched["category"]["name"], "Work");

    let req = test::TestRequest::get()
        .uri(&format!("/tasks?categoryId={}", work["id"].as_str().unwrap()))
        .insert_header(bearer(&alice.access_token))
        .to_request();
    let (_, listed) = send(&app, req).await;
    assert_eq!(listed["data"][0]["category"], work);

    let req = test::TestRequest::get()
        .uri("/tasks/public/alice")
        .insert_header(bearer(&bob.access_token))
        .to_request();
    let (_, public) = send(&app, req).await;
    assert_eq!(public[0]["category"]["name"], "Work");

    let req = test::TestRequest::patch()
        .uri(&format!("/tasks/{}", id))
        .insert_header(bearer(&alice.access_token))
        .set_json(json!({ "categoryId": home["id"] }))
        .to_request();
    let (status, updated) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK, "update failed: {}", updated);
    assert_eq!(updated["category"], home);
}

#[actix_rt::test]
async fn test_create_task_validation() {
    let harness = Harness::new();
    let app = init_app(&harness).await;
    let alice = register_and_login(&app, "alice").await;

    let cases = vec![
        (task_payload("", "High", "2025-03-12"), "empty title"),
        (task_payload(&"a".repeat(201), "High", "2025-03-12"), "long title"),
        (task_payload("Bad date", "High", "12/03/2025"), "unparseable due date"),
        (task_payload("Bad priority", "Urgent", "2025-03-12"), "unknown priority"),
        (
            json!({ "title": "No due date", "priority": "Low" }),
            "missing due date",
        ),
        (
            json!({
                "title": "Unknown category",
                "priority": "Low",
                "dueDate": "2025-03-12",
                "categoryId": "00000000-0000-0000-0000-000000000000"
            }),
            "dangling category",
        ),
    ];

    for (payload, description) in cases {
        let req = test::TestRequest::post()
            .uri("/tasks")
            .insert_header(bearer(&alice.access_token))
            .set_json(&payload)
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "case '{}': {}", description, body);
    }
}

#[actix_rt::test]
async fn test_ownership_is_enforced_on_writes() {
    let harness = Harness::new();
    let app = init_app(&harness).await;
    let alice = register_and_login(&app, "alice").await;
    let bob = register_and_login(&app, "bob").await;

    let mut ids = Vec::new();
    for is_public in [false, true] {
        let mut payload = task_payload("Alice's task", "Medium", "2025-03-20");
        payload["isPublic"] = json!(is_public);
        let task = create_task(&app, &alice, payload).await;
        ids.push(task["id"].as_str().unwrap().to_string());
    }

    for id in &ids {
        let req = test::TestRequest::patch()
            .uri(&format!("/tasks/{}", id))
            .insert_header(bearer(&bob.access_token))
            .set_json(json!({ "title": "Hijacked" }))
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "You can only update your own tasks");

        let req = test::TestRequest::delete()
            .uri(&format!("/tasks/{}", id))
            .insert_header(bearer(&bob.access_token))
            .to_request();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    // Nothing changed for the owner.
    let req = test::TestRequest::get()
        .uri("/tasks")
        .insert_header(bearer(&alice.access_token))
        .to_request();
    let (_, body) = send(&app, req).await;
    assert_eq!(body["meta"]["total"], 2);
    for task in body["data"].as_array().unwrap() {
        assert_eq!(task["title"], "Alice's task");
    }

    let req = test::TestRequest::patch()
        .uri("/tasks/00000000-0000-0000-0000-000000000000")
        .insert_header(bearer(&bob.access_token))
        .set_json(json!({ "title": "Ghost" }))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_visibility_of_single_task() {
    let harness = Harness::new();
    let app = init_app(&harness).await;
    let alice = register_and_login(&app, "alice").await;
    let bob = register_and_login(&app, "bob").await;

    let private = create_task(&app, &alice, task_payload("Diary", "Low", "2025-03-20")).await;
    let mut payload = task_payload("Shared list", "Low", "2025-03-20");
    payload["isPublic"] = json!(true);
    let public = create_task(&app, &alice, payload).await;

    let req = test::TestRequest::get()
        .uri(&format!("/tasks/{}", private["id"].as_str().unwrap()))
        .insert_header(bearer(&bob.access_token))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!("/tasks/{}", public["id"].as_str().unwrap()))
        .insert_header(bearer(&bob.access_token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Shared list");

    let req = test::TestRequest::get()
        .uri("/tasks/not-a-uuid")
        .insert_header(bearer(&bob.access_token))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_public_tasks_by_user() {
    let harness = Harness::new();
    let app = init_app(&harness).await;
    let alice = register_and_login(&app, "alice").await;
    let bob = register_and_login(&app, "bob").await;

    create_task(&app, &alice, task_payload("Hidden", "Low", "2025-03-20")).await;
    for title in ["First public", "Second public"] {
        harness.tick();
        let mut payload = task_payload(title, "Low", "2025-03-20");
        payload["isPublic"] = json!(true);
        create_task(&app, &alice, payload).await;
    }

    let req = test::TestRequest::get()
        .uri("/tasks/public/alice")
        .insert_header(bearer(&bob.access_token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Second public", "First public"]);

    let req = test::TestRequest::get()
        .uri("/tasks/public/nobody")
        .insert_header(bearer(&bob.access_token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[actix_rt::test]
async fn test_list_is_scoped_and_filtered() {
    let harness = Harness::new();
    let app = init_app(&harness).await;
    let alice = register_and_login(&app, "alice").await;
    let bob = register_and_login(&app, "bob").await;

    for (title, priority) in [("Taxes", "High"), ("Groceries", "Medium"), ("Laundry", "Low")] {
        harness.tick();
        create_task(&app, &alice, task_payload(title, priority, "2025-03-15")).await;
    }
    let mut payload = task_payload("Bob's urgent", "High", "2025-03-15");
    payload["isPublic"] = json!(true);
    create_task(&app, &bob, payload).await;

    let req = test::TestRequest::get()
        .uri("/tasks?priority=High")
        .insert_header(bearer(&alice.access_token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["title"], "Taxes");
    assert_eq!(body["meta"]["total"], 1);

    // Search is a case-insensitive literal substring of the title.
    let req = test::TestRequest::get()
        .uri("/tasks?search=GROC")
        .insert_header(bearer(&alice.access_token))
        .to_request();
    let (_, body) = send(&app, req).await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Groceries");

    let req = test::TestRequest::get()
        .uri("/tasks?search=%25")
        .insert_header(bearer(&alice.access_token))
        .to_request();
    let (_, body) = send(&app, req).await;
    assert_eq!(body["meta"]["total"], 0);

    // Newest first.
    let req = test::TestRequest::get()
        .uri("/tasks")
        .insert_header(bearer(&alice.access_token))
        .to_request();
    let (_, body) = send(&app, req).await;
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Laundry", "Groceries", "Taxes"]);
}

#[actix_rt::test]
async fn test_status_filter() {
    let harness = Harness::new();
    let app = init_app(&harness).await;
    let alice = register_and_login(&app, "alice").await;

    let done = create_task(&app, &alice, task_payload("Done", "Low", "2025-03-15")).await;
    create_task(&app, &alice, task_payload("Pending", "Low", "2025-03-15")).await;

    let req = test::TestRequest::patch()
        .uri(&format!("/tasks/{}", done["id"].as_str().unwrap()))
        .insert_header(bearer(&alice.access_token))
        .set_json(json!({ "isCompleted": true }))
        .to_request();
    send(&app, req).await;

    for (status_param, expected) in [("completed", "Done"), ("incomplete", "Pending")] {
        let req = test::TestRequest::get()
            .uri(&format!("/tasks?status={}", status_param))
            .insert_header(bearer(&alice.access_token))
            .to_request();
        let (_, body) = send(&app, req).await;
        assert_eq!(body["meta"]["total"], 1, "status={}", status_param);
        assert_eq!(body["data"][0]["title"], expected);
    }
}

#[actix_rt::test]
async fn test_due_date_range_is_inclusive() {
    let harness = Harness::new();
    let app = init_app(&harness).await;
    let alice = register_and_login(&app, "alice").await;

    for (title, due) in [("Early", "2025-03-14"), ("On the day", "2025-03-15"), ("Late", "2025-03-16")] {
        harness.tick();
        create_task(&app, &alice, task_payload(title, "Low", due)).await;
    }

    let req = test::TestRequest::get()
        .uri("/tasks?startDate=2025-03-15&endDate=2025-03-15")
        .insert_header(bearer(&alice.access_token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "On the day");

    let req = test::TestRequest::get()
        .uri("/tasks?startDate=2025-03-15")
        .insert_header(bearer(&alice.access_token))
        .to_request();
    let (_, body) = send(&app, req).await;
    assert_eq!(body["meta"]["total"], 2);

    let req = test::TestRequest::get()
        .uri("/tasks?endDate=2025-03-14")
        .insert_header(bearer(&alice.access_token))
        .to_request();
    let (_, body) = send(&app, req).await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Early");
}

#[actix_rt::test]
async fn test_pagination_covers_every_task_once() {
    let harness = Harness::new();
    let app = init_app(&harness).await;
    let alice = register_and_login(&app, "alice").await;

    let total = 23;
    for i in 0..total {
        harness.tick();
        create_task(&app, &alice, task_payload(&format!("Task {}", i), "Low", "2025-04-01")).await;
    }

    let limit = 5;
    let mut seen = HashSet::new();
    let mut page = 1;
    loop {
        let req = test::TestRequest::get()
            .uri(&format!("/tasks?page={}&limit={}", page, limit))
            .insert_header(bearer(&alice.access_token))
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["total"], total);
        assert_eq!(body["meta"]["page"], page);
        assert_eq!(body["meta"]["limit"], limit);
        assert_eq!(body["meta"]["lastPage"], 5);

        let data = body["data"].as_array().unwrap();
        if data.is_empty() {
            break;
        }
        for task in data {
            assert!(seen.insert(task["id"].as_str().unwrap().to_string()));
        }
        page += 1;
    }
    assert_eq!(seen.len(), total);
    assert_eq!(page, 6);
}

#[actix_rt::test]
async fn test_pagination_bounds() {
    let harness = Harness::new();
    let app = init_app(&harness).await;
    let alice = register_and_login(&app, "alice").await;

    for query in ["page=0", "limit=0", "limit=101", "page=abc", "priority=Urgent", "startDate=tomorrow"] {
        let req = test::TestRequest::get()
            .uri(&format!("/tasks?{}", query))
            .insert_header(bearer(&alice.access_token))
            .to_request();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query '{}' was accepted", query);
    }

    let req = test::TestRequest::get()
        .uri("/tasks")
        .insert_header(bearer(&alice.access_token))
        .to_request();
    let (_, body) = send(&app, req).await;
    assert_eq!(
        body["meta"],
        json!({ "total": 0, "page": 1, "lastPage": 0, "limit": 10 })
    );
}
