use reqwest::{
    blocking::{Client, RequestBuilder},
    header::{AUTHORIZATION, CONTENT_TYPE},
    StatusCode,
};
use serde::de::DeserializeOwned;

use crate::api::dtos::todo::{ApiResponse, CreateTodoDTO, UpdateTodoDTO};
use crate::errors::TodoError;
use crate::models::todo_model::{Todo, TodoId, TodoQuery};
use crate::utils::make_api_url;

/// Operations of the remote todo API, as seen by the client
pub trait TodoApi {
    fn list(&self, query: &TodoQuery) -> Result<Vec<Todo>, TodoError>;

    fn get(&self, id: &TodoId) -> Result<Todo, TodoError>;

    fn create(&self, todo: &CreateTodoDTO) -> Result<Todo, TodoError>;

    fn update(&self, id: &TodoId, patch: &UpdateTodoDTO) -> Result<Todo, TodoError>;

    fn toggle(&self, id: &TodoId) -> Result<Todo, TodoError>;

    fn delete(&self, id: &TodoId) -> Result<(), TodoError>;

    /// Returns how many todos were removed
    fn delete_completed(&self) -> Result<usize, TodoError>;
}

/// `TodoApi` over HTTP with a saved bearer token
pub struct HttpTodoApi {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpTodoApi {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(make_api_url("todos"), token)
    }

    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn todo_url(&self, id: &TodoId) -> String {
        format!("{}/{}", self.base_url, id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(CONTENT_TYPE, "application/json")
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<ApiResponse<T>, TodoError> {
        let response = self.authorized(request).send()?;

        let status = response.status();
        let body = response.text()?;

        parse_envelope(status, &body)
    }
}

/// Turns a raw response into its envelope, mapping failures to `TodoError`
fn parse_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<ApiResponse<T>, TodoError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(body)
            .ok()
            .and_then(|envelope| envelope.message);

        if status == StatusCode::UNAUTHORIZED {
            return Err(TodoError::Unauthorized(message));
        }

        return Err(TodoError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let envelope: ApiResponse<T> = serde_json::from_str(body)?;

    if !envelope.success {
        return Err(TodoError::Api {
            status: status.as_u16(),
            message: envelope.message,
        });
    }

    Ok(envelope)
}

fn into_data<T>(envelope: ApiResponse<T>) -> Result<T, TodoError> {
    envelope
        .data
        .ok_or_else(|| TodoError::UnexpectedResponse(String::from("response has no data")))
}

impl TodoApi for HttpTodoApi {
    fn list(&self, query: &TodoQuery) -> Result<Vec<Todo>, TodoError> {
        let request = self.client.get(&self.base_url).query(&query.to_params());

        into_data(self.send(request)?)
    }

    fn get(&self, id: &TodoId) -> Result<Todo, TodoError> {
        into_data(self.send(self.client.get(self.todo_url(id)))?)
    }

    fn create(&self, todo: &CreateTodoDTO) -> Result<Todo, TodoError> {
        into_data(self.send(self.client.post(&self.base_url).json(todo))?)
    }

    fn update(&self, id: &TodoId, patch: &UpdateTodoDTO) -> Result<Todo, TodoError> {
        into_data(self.send(self.client.put(self.todo_url(id)).json(patch))?)
    }

    fn toggle(&self, id: &TodoId) -> Result<Todo, TodoError> {
        let url = format!("{}/toggle", self.todo_url(id));

        into_data(self.send(self.client.patch(url))?)
    }

    fn delete(&self, id: &TodoId) -> Result<(), TodoError> {
        self.send::<serde_json::Value>(self.client.delete(self.todo_url(id)))?;

        Ok(())
    }

    fn delete_completed(&self) -> Result<usize, TodoError> {
        let envelope = self.send::<serde_json::Value>(self.client.delete(&self.base_url))?;

        Ok(envelope.deleted_count.unwrap_or(0))
    }
}
