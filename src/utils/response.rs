use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct StatusBody {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Serialize)]
pub struct DataBody<T>
where
    T: Serialize,
{
    pub data: T,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn status(status: &'static str) -> impl IntoResponse {
    (StatusCode::OK, Json(StatusBody { status }))
}

pub fn created(message: impl Into<String>) -> impl IntoResponse {
    let body = MessageBody {
        message: message.into(),
    };
    (StatusCode::CREATED, Json(body))
}

pub fn data<T>(data: T) -> impl IntoResponse
where
    T: Serialize,
{
    (StatusCode::OK, Json(DataBody { data }))
}

pub fn error(message: impl Into<String>, status: StatusCode) -> Response {
    let body = ErrorBody {
        error: message.into(),
    };

    (status, Json(body)).into_response()
}
