use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use tracing::info;

use crate::api::dto::{SubTaskPayload, TodoPayload};
use crate::api::error::ApiError;
use crate::models::todo::{SubTask, TodoDraft};
use crate::service::TodoService;

/// A missing or unreadable body reaches the service as `None`.
fn todo_draft(
    payload: Option<web::Json<TodoPayload>>,
    req: &HttpRequest,
) -> Result<Option<TodoDraft>, ApiError> {
    let Some(payload) = payload else {
        return Ok(None);
    };
    let payload = payload.into_inner();
    payload
        .validate()
        .map_err(|errors| ApiError::validation(errors, req))?;
    Ok(Some(payload.into_draft()))
}

fn sub_task(
    payload: Option<web::Json<SubTaskPayload>>,
    req: &HttpRequest,
) -> Result<Option<SubTask>, ApiError> {
    let Some(payload) = payload else {
        return Ok(None);
    };
    let payload = payload.into_inner();
    payload
        .validate()
        .map_err(|errors| ApiError::validation(errors, req))?;
    Ok(Some(payload.into_sub_task()))
}

#[get("/todos")]
pub async fn get_todos(
    req: HttpRequest,
    service: web::Data<TodoService>,
) -> Result<HttpResponse, ApiError> {
    info!("GET /api/todos - Retrieving all todos");
    let todos = service
        .list_todos()
        .await
        .map_err(|err| ApiError::from_service(err, &req))?;
    Ok(HttpResponse::Ok().json(todos))
}

#[get("/todos/{id}")]
pub async fn get_todo_by_id(
    req: HttpRequest,
    service: web::Data<TodoService>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    info!("GET /api/todos/{} - Retrieving todo by id", id);
    let todo = service
        .get_todo(&id)
        .await
        .map_err(|err| ApiError::from_service(err, &req))?;
    Ok(HttpResponse::Ok().json(todo))
}

#[post("/todos")]
pub async fn create_todo(
    req: HttpRequest,
    service: web::Data<TodoService>,
    payload: Option<web::Json<TodoPayload>>,
) -> Result<HttpResponse, ApiError> {
    info!("POST /api/todos - Creating new todo");
    let draft = todo_draft(payload, &req)?;
    let todo = service
        .create_todo(draft)
        .await
        .map_err(|err| ApiError::from_service(err, &req))?;
    Ok(HttpResponse::Created().json(todo))
}

#[put("/todos/{id}")]
pub async fn update_todo_by_id(
    req: HttpRequest,
    service: web::Data<TodoService>,
    id: web::Path<String>,
    payload: Option<web::Json<TodoPayload>>,
) -> Result<HttpResponse, ApiError> {
    info!("PUT /api/todos/{} - Updating todo", id);
    let draft = todo_draft(payload, &req)?;
    let todo = service
        .update_todo(&id, draft)
        .await
        .map_err(|err| ApiError::from_service(err, &req))?;
    Ok(HttpResponse::Ok().json(todo))
}

#[delete("/todos/{id}")]
pub async fn delete_todo_by_id(
    req: HttpRequest,
    service: web::Data<TodoService>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    info!("DELETE /api/todos/{} - Deleting todo", id);
    service
        .delete_todo(&id)
        .await
        .map_err(|err| ApiError::from_service(err, &req))?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/todos/{id}/subtasks")]
pub async fn add_sub_task(
    req: HttpRequest,
    service: web::Data<TodoService>,
    id: web::Path<String>,
    payload: Option<web::Json<SubTaskPayload>>,
) -> Result<HttpResponse, ApiError> {
    info!("POST /api/todos/{}/subtasks - Adding subtask to todo", id);
    let sub_task = sub_task(payload, &req)?;
    let todo = service
        .add_sub_task(&id, sub_task)
        .await
        .map_err(|err| ApiError::from_service(err, &req))?;
    Ok(HttpResponse::Ok().json(todo))
}

#[put("/todos/{todo_id}/subtasks/{sub_task_id}")]
pub async fn update_sub_task(
    req: HttpRequest,
    service: web::Data<TodoService>,
    path: web::Path<(String, String)>,
    payload: Option<web::Json<SubTaskPayload>>,
) -> Result<HttpResponse, ApiError> {
    let (todo_id, sub_task_id) = path.into_inner();
    info!("PUT /api/todos/{}/subtasks/{} - Updating subtask", todo_id, sub_task_id);
    let sub_task = sub_task(payload, &req)?;
    let todo = service
        .update_sub_task(&todo_id, &sub_task_id, sub_task)
        .await
        .map_err(|err| ApiError::from_service(err, &req))?;
    Ok(HttpResponse::Ok().json(todo))
}

#[delete("/todos/{todo_id}/subtasks/{sub_task_id}")]
pub async fn delete_sub_task(
    req: HttpRequest,
    service: web::Data<TodoService>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (todo_id, sub_task_id) = path.into_inner();
    info!("DELETE /api/todos/{}/subtasks/{} - Deleting subtask", todo_id, sub_task_id);
    let todo = service
        .delete_sub_task(&todo_id, &sub_task_id)
        .await
        .map_err(|err| ApiError::from_service(err, &req))?;
    Ok(HttpResponse::Ok().json(todo))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(get_todos)
            .service(create_todo)
            .service(get_todo_by_id)
            .service(update_todo_by_id)
            .service(delete_todo_by_id)
            .service(add_sub_task)
            .service(update_sub_task)
            .service(delete_sub_task),
    );
}
