use std::convert::TryFrom;

use actix_web::{web, HttpResponse};

use super::auth::Authenticated;
use super::dtos::todo::{ApiResponse, CreateTodoDTO, ListTodosQuery, UpdateTodoDTO};
use super::errors::TodoApiError;
use crate::models::todo_model::{NewTodo, TodoId, TodoPatch, TodoQuery};
use crate::store::TodoStore;

pub type Store = web::Data<dyn TodoStore>;

fn parse_todo_id(raw: &str) -> Result<TodoId, TodoApiError> {
    Ok(raw.parse::<TodoId>()?)
}

/// Api handler for getting all todos for a user
pub async fn get_todos(
    auth: Authenticated,
    params: web::Query<ListTodosQuery>,
    store: Store,
) -> Result<HttpResponse, actix_web::Error> {
    let query = TodoQuery::try_from(params.into_inner())?;

    let list = web::block(move || store.list(&auth, &query)).await??;

    Ok(HttpResponse::Ok().json(ApiResponse::list(list)))
}

/// Get a single todo
pub async fn get_todo(
    auth: Authenticated,
    todo_id: web::Path<String>,
    store: Store,
) -> Result<HttpResponse, actix_web::Error> {
    let todo_id = parse_todo_id(&todo_id)?;

    let todo = web::block(move || store.get(&auth, &todo_id)).await??;

    Ok(HttpResponse::Ok().json(ApiResponse::data(todo)))
}

/// Create a new todo
pub async fn create_todo(
    auth: Authenticated,
    request_data: web::Json<CreateTodoDTO>,
    store: Store,
) -> Result<HttpResponse, actix_web::Error> {
    let new_todo = NewTodo::try_from(request_data.into_inner())?;

    let inserted = web::block(move || store.create(&auth, new_todo)).await??;

    Ok(HttpResponse::Created()
        .json(ApiResponse::data(inserted).with_message("Todo created successfully")))
}

/// Partially update a todo, only supplied fields change
pub async fn update_todo(
    auth: Authenticated,
    todo_id: web::Path<String>,
    request_data: web::Json<UpdateTodoDTO>,
    store: Store,
) -> Result<HttpResponse, actix_web::Error> {
    let todo_id = parse_todo_id(&todo_id)?;
    let patch = TodoPatch::try_from(request_data.into_inner())?;

    let updated = web::block(move || store.update(&auth, &todo_id, patch)).await??;

    Ok(HttpResponse::Ok()
        .json(ApiResponse::data(updated).with_message("Todo updated successfully")))
}

/// Flip a todo's completeness
pub async fn toggle_todo(
    auth: Authenticated,
    todo_id: web::Path<String>,
    store: Store,
) -> Result<HttpResponse, actix_web::Error> {
    let todo_id = parse_todo_id(&todo_id)?;

    let toggled = web::block(move || store.toggle(&auth, &todo_id)).await??;

    let message = if toggled.completed {
        "Todo marked as completed"
    } else {
        "Todo marked as incomplete"
    };

    Ok(HttpResponse::Ok().json(ApiResponse::data(toggled).with_message(message)))
}

/// Api to Delete a TODO
pub async fn delete_todo(
    auth: Authenticated,
    todo_id: web::Path<String>,
    store: Store,
) -> Result<HttpResponse, actix_web::Error> {
    let todo_id = parse_todo_id(&todo_id)?;

    web::block(move || store.delete(&auth, &todo_id)).await??;

    Ok(HttpResponse::Ok().json(ApiResponse::message("Todo deleted successfully")))
}

/// Remove every completed todo of the caller
pub async fn delete_completed_todos(
    auth: Authenticated,
    store: Store,
) -> Result<HttpResponse, actix_web::Error> {
    let deleted = web::block(move || store.delete_all_completed(&auth)).await??;

    let mut body = ApiResponse::message(format!("{} completed todos deleted", deleted));
    body.deleted_count = Some(deleted);

    Ok(HttpResponse::Ok().json(body))
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use actix_web::{
        dev::{Service, ServiceResponse},
        http::{header::AUTHORIZATION, StatusCode},
        test, web, App,
    };
    use serde_json::{json, Value};

    use crate::api::api::{configure, json_config, query_config};
    use crate::api::auth_utils::encode_token;
    use crate::models::identity::Identity;
    use crate::store::{MemoryTodoStore, TodoStore};

    struct Caller {
        token: String,
    }

    impl Caller {
        fn new() -> Self {
            let identity = Identity::new(uuid::Uuid::new_v4());
            Self {
                token: encode_token(&identity, chrono::Duration::hours(1)).unwrap(),
            }
        }

        fn bearer(&self) -> (actix_web::http::header::HeaderName, String) {
            (AUTHORIZATION, format!("Bearer {}", self.token))
        }
    }

    async fn app(
    ) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
    {
        let store: Arc<dyn TodoStore> = Arc::new(MemoryTodoStore::new());

        test::init_service(
            App::new()
                .app_data(web::Data::from(store))
                .app_data(json_config())
                .app_data(query_config())
                .service(web::scope("/api").configure(configure)),
        )
        .await
    }

    async fn send(
        app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
        req: test::TestRequest,
    ) -> (StatusCode, Value) {
        let response = test::call_service(app, req.to_request()).await;
        let status = response.status();
        let body: Value = test::read_body_json(response).await;
        (status, body)
    }

    async fn create(
        app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
        caller: &Caller,
        body: Value,
    ) -> Value {
        let (status, body) = send(
            app,
            test::TestRequest::post()
                .uri("/api/todos")
                .insert_header(caller.bearer())
                .set_json(body),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    fn titles(body: &Value) -> Vec<String> {
        body["data"]
            .as_array()
            .expect("list data")
            .iter()
            .map(|todo| todo["title"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[actix_web::test]
    async fn test_requires_identity() {
        let app = app().await;

        let (status, body) = send(&app, test::TestRequest::get().uri("/api/todos")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "No Authorization Header");

        let (status, _) = send(
            &app,
            test::TestRequest::get()
                .uri("/api/todos")
                .insert_header((AUTHORIZATION, "Bearer not-a-jwt")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_create_returns_envelope() {
        let app = app().await;
        let caller = Caller::new();

        let (status, body) = send(
            &app,
            test::TestRequest::post()
                .uri("/api/todos")
                .insert_header(caller.bearer())
                .set_json(json!({"title": "  Buy milk ", "priority": "high", "dueDate": "2024-06-30"})),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Todo created successfully");
        assert_eq!(body["data"]["title"], "Buy milk");
        assert_eq!(body["data"]["priority"], "high");
        assert_eq!(body["data"]["completed"], false);
        assert_eq!(body["data"]["dueDate"], "2024-06-30");
    }

    #[actix_web::test]
    async fn test_create_validation_errors() {
        let app = app().await;
        let caller = Caller::new();

        let (status, body) = send(
            &app,
            test::TestRequest::post()
                .uri("/api/todos")
                .insert_header(caller.bearer())
                .set_json(json!({"title": " ", "priority": "urgent"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"].as_array().map(Vec::len), Some(2));

        let (status, body) = send(
            &app,
            test::TestRequest::post()
                .uri("/api/todos")
                .insert_header(caller.bearer())
                .set_json(json!({"title": "a".repeat(200)})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);

        let (status, _) = send(
            &app,
            test::TestRequest::post()
                .uri("/api/todos")
                .insert_header(caller.bearer())
                .set_json(json!({"title": "a".repeat(201)})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_malformed_body_uses_envelope() {
        let app = app().await;
        let caller = Caller::new();

        let (status, body) = send(
            &app,
            test::TestRequest::post()
                .uri("/api/todos")
                .insert_header(caller.bearer())
                .insert_header(("content-type", "application/json"))
                .set_payload("{not json"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn test_invalid_id_and_not_found_are_distinct() {
        let app = app().await;
        let caller = Caller::new();

        let (status, body) = send(
            &app,
            test::TestRequest::get()
                .uri("/api/todos/not-a-uuid")
                .insert_header(caller.bearer()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid todo ID");

        let (status, body) = send(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/todos/{}", uuid::Uuid::new_v4()))
                .insert_header(caller.bearer()),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Todo not found");
    }

    #[actix_web::test]
    async fn test_priority_filter_scenario() {
        let app = app().await;
        let caller = Caller::new();

        create(&app, &caller, json!({"title": "Buy milk", "priority": "high"})).await;

        let (_, high) = send(
            &app,
            test::TestRequest::get()
                .uri("/api/todos?priority=high")
                .insert_header(caller.bearer()),
        )
        .await;
        assert_eq!(titles(&high), vec!["Buy milk"]);
        assert_eq!(high["count"], 1);

        let (status, low) = send(
            &app,
            test::TestRequest::get()
                .uri("/api/todos?priority=low")
                .insert_header(caller.bearer()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(low["count"], 0);
        assert!(titles(&low).is_empty());
    }

    #[actix_web::test]
    async fn test_completed_via_put_leaves_active_list() {
        let app = app().await;
        let caller = Caller::new();

        let todo = create(&app, &caller, json!({"title": "Call mum", "description": "Sunday"})).await;
        let uri = format!("/api/todos/{}", todo["id"].as_str().unwrap());

        let (status, body) = send(
            &app,
            test::TestRequest::put()
                .uri(&uri)
                .insert_header(caller.bearer())
                .set_json(json!({"completed": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Todo updated successfully");
        assert_eq!(body["data"]["description"], "Sunday");

        let (_, active) = send(
            &app,
            test::TestRequest::get()
                .uri("/api/todos?completed=false")
                .insert_header(caller.bearer()),
        )
        .await;
        assert!(titles(&active).is_empty());

        let (_, done) = send(
            &app,
            test::TestRequest::get()
                .uri("/api/todos?completed=true")
                .insert_header(caller.bearer()),
        )
        .await;
        assert_eq!(titles(&done), vec!["Call mum"]);
    }

    #[actix_web::test]
    async fn test_update_rejects_null_for_required_fields() {
        let app = app().await;
        let caller = Caller::new();

        let todo = create(&app, &caller, json!({"title": "Call mum", "priority": "low"})).await;
        let uri = format!("/api/todos/{}", todo["id"].as_str().unwrap());

        for (body, field) in [
            (json!({"title": null}), "title"),
            (json!({"priority": null}), "priority"),
            (json!({"completed": null}), "completed"),
        ] {
            let (status, response) = send(
                &app,
                test::TestRequest::put()
                    .uri(&uri)
                    .insert_header(caller.bearer())
                    .set_json(body),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", response);
            assert_eq!(response["errors"][0]["field"], field);
        }

        let (_, fetched) = send(&app, test::TestRequest::get().uri(&uri).insert_header(caller.bearer())).await;
        assert_eq!(fetched["data"]["title"], "Call mum");
        assert_eq!(fetched["data"]["priority"], "low");
        assert_eq!(fetched["data"]["completed"], false);
    }

    #[actix_web::test]
    async fn test_offset_due_date_keeps_written_date() {
        let app = app().await;
        let caller = Caller::new();

        let todo = create(
            &app,
            &caller,
            json!({"title": "Flight", "dueDate": "2024-06-30T01:00:00+05:00"}),
        )
        .await;

        assert_eq!(todo["dueDate"], "2024-06-30");
    }

    #[actix_web::test]
    async fn test_default_list_is_newest_first() {
        let app = app().await;
        let caller = Caller::new();

        for title in ["first", "second", "third"] {
            create(&app, &caller, json!({ "title": title })).await;
            // distinct created_at values
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let (_, body) = send(
            &app,
            test::TestRequest::get().uri("/api/todos").insert_header(caller.bearer()),
        )
        .await;
        assert_eq!(titles(&body), vec!["third", "second", "first"]);

        let (_, body) = send(
            &app,
            test::TestRequest::get()
                .uri("/api/todos?sortBy=createdAt&order=asc")
                .insert_header(caller.bearer()),
        )
        .await;
        assert_eq!(titles(&body), vec!["first", "second", "third"]);
    }

    #[actix_web::test]
    async fn test_list_sorts_by_priority() {
        let app = app().await;
        let caller = Caller::new();

        for (title, priority) in [("b", "high"), ("c", "low"), ("d", "medium"), ("e", "low")] {
            create(&app, &caller, json!({"title": title, "priority": priority})).await;
        }

        let (_, body) = send(
            &app,
            test::TestRequest::get()
                .uri("/api/todos?sortBy=priority&order=asc")
                .insert_header(caller.bearer()),
        )
        .await;
        assert_eq!(titles(&body), vec!["c", "e", "d", "b"]);

        let (status, body) = send(
            &app,
            test::TestRequest::get()
                .uri("/api/todos?sortBy=title")
                .insert_header(caller.bearer()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "sortBy");
    }

    #[actix_web::test]
    async fn test_toggle_and_delete_flow() {
        let app = app().await;
        let caller = Caller::new();

        let todo = create(&app, &caller, json!({"title": "Water plants"})).await;
        let uri = format!("/api/todos/{}", todo["id"].as_str().unwrap());

        let (status, body) = send(
            &app,
            test::TestRequest::patch()
                .uri(&format!("{}/toggle", uri))
                .insert_header(caller.bearer()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Todo marked as completed");
        assert_eq!(body["data"]["completed"], true);

        let (_, body) = send(
            &app,
            test::TestRequest::patch()
                .uri(&format!("{}/toggle", uri))
                .insert_header(caller.bearer()),
        )
        .await;
        assert_eq!(body["message"], "Todo marked as incomplete");
        assert_eq!(body["data"]["completed"], false);

        let (status, body) = send(
            &app,
            test::TestRequest::delete().uri(&uri).insert_header(caller.bearer()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "message": "Todo deleted successfully"}));

        let (status, _) = send(&app, test::TestRequest::get().uri(&uri).insert_header(caller.bearer())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            test::TestRequest::delete().uri(&uri).insert_header(caller.bearer()),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_other_callers_cannot_touch_todo() {
        let app = app().await;
        let owner = Caller::new();
        let intruder = Caller::new();

        let todo = create(&app, &owner, json!({"title": "Private"})).await;
        let uri = format!("/api/todos/{}", todo["id"].as_str().unwrap());

        for req in [
            test::TestRequest::get().uri(&uri),
            test::TestRequest::put().uri(&uri).set_json(json!({"title": "Mine now"})),
            test::TestRequest::patch().uri(&format!("{}/toggle", uri)),
            test::TestRequest::delete().uri(&uri),
        ] {
            let (status, _) = send(&app, req.insert_header(intruder.bearer())).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }

        let (_, listed) = send(
            &app,
            test::TestRequest::get().uri("/api/todos").insert_header(intruder.bearer()),
        )
        .await;
        assert_eq!(listed["count"], 0);

        let (_, fetched) = send(&app, test::TestRequest::get().uri(&uri).insert_header(owner.bearer())).await;
        assert_eq!(fetched["data"]["title"], "Private");
        assert_eq!(fetched["data"]["completed"], false);
    }

    #[actix_web::test]
    async fn test_delete_completed_reports_count() {
        let app = app().await;
        let caller = Caller::new();

        let (status, body) = send(
            &app,
            test::TestRequest::delete().uri("/api/todos").insert_header(caller.bearer()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "0 completed todos deleted");
        assert_eq!(body["deletedCount"], 0);

        let todo = create(&app, &caller, json!({"title": "Done already"})).await;
        create(&app, &caller, json!({"title": "Still open"})).await;
        send(
            &app,
            test::TestRequest::patch()
                .uri(&format!("/api/todos/{}/toggle", todo["id"].as_str().unwrap()))
                .insert_header(caller.bearer()),
        )
        .await;

        let (_, body) = send(
            &app,
            test::TestRequest::delete().uri("/api/todos").insert_header(caller.bearer()),
        )
        .await;
        assert_eq!(body["message"], "1 completed todos deleted");

        let (_, listed) = send(
            &app,
            test::TestRequest::get().uri("/api/todos").insert_header(caller.bearer()),
        )
        .await;
        assert_eq!(titles(&listed), vec!["Still open"]);
    }
}
