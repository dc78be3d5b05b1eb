use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

mod health_check;
mod licenses;
mod subscriptions;

pub use health_check::*;
pub use licenses::*;
pub use subscriptions::*;

const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal Server Error";

/// Body returned by every endpoint that does not return records.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

pub fn message_response(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(MessageBody {
        message: String::from(message),
    })
}

/// Renders an error as a JSON message. Server errors never expose their cause to clients.
pub fn error_message_response<E: ResponseError + ?Sized>(error: &E) -> HttpResponse {
    let status = error.status_code();

    if status.is_server_error() {
        return message_response(status, INTERNAL_SERVER_ERROR_MESSAGE);
    }

    message_response(status, &error.to_string())
}

pub fn error_chain_fmt(
    error: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}", error)?;

    let mut current = error.source();

    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }

    Ok(())
}
