use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    new_subscriber::{NewSubscriber, NewSubscriberBody},
    subscriber::Subscriber,
};
use crate::routes::{error_chain_fmt, error_message_response, message_response};

const UNIQUE_VIOLATION_CODE: &str = "23505";

#[tracing::instrument(
    name = "Creating a new subscriber handler",
    skip(body, db_pool),
    fields(
        subscriber_email = %body.email,
    )
)]
pub async fn handle_create_subscription(
    body: web::Json<NewSubscriberBody>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, SubscribeError> {
    let new_subscriber: NewSubscriber = body.try_into().map_err(|err| {
        tracing::error!("Validation error: {:?}", err);
        SubscribeError::ValidationError(err)
    })?;

    insert_subscriber(&new_subscriber, &db_pool)
        .await
        .map_err(SubscribeError::StoreSubscriberError)?;

    Ok(message_response(
        StatusCode::CREATED,
        "Subscription created successfully!",
    ))
}

#[tracing::instrument(name = "Listing every subscriber", skip(db_pool))]
pub async fn handle_list_subscribers(
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, SubscriberQueryError> {
    let subscribers = fetch_subscribers(&db_pool)
        .await
        .map_err(SubscriberQueryError::FetchSubscribersError)?;

    Ok(HttpResponse::Ok().json(subscribers))
}

#[tracing::instrument(
    name = "Insert a new subscriber into the database",
    skip(new_subscriber, db_pool)
)]
async fn insert_subscriber(
    new_subscriber: &NewSubscriber,
    db_pool: &PgPool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO subscribers (id, email, created_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new_subscriber.email.as_ref())
    .bind(Utc::now())
    .execute(db_pool)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            tracing::error!(
                "{} is already subscribed: {:?}",
                new_subscriber.email.as_ref(),
                err
            );
        } else {
            tracing::error!("Failed to execute query: {:?}", err);
        }
        err
    })?;

    Ok(())
}

#[tracing::instrument(name = "Fetch every subscriber from the database", skip(db_pool))]
async fn fetch_subscribers(db_pool: &PgPool) -> Result<Vec<Subscriber>, sqlx::Error> {
    sqlx::query_as::<_, Subscriber>(
        r#"
        SELECT id, email, created_at FROM subscribers
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(db_pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to execute query: {:?}", err);
        err
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .map_or(false, |code| code == UNIQUE_VIOLATION_CODE)
}

// Invalid emails are rejected before reaching the store. A duplicated email is not told apart
// from any other database failure: both are answered with 500.
#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Failed to store the new subscriber.")]
    StoreSubscriberError(#[source] sqlx::Error),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::ValidationError(_) => StatusCode::BAD_REQUEST,
            SubscribeError::StoreSubscriberError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        error_message_response(self)
    }
}

#[derive(thiserror::Error)]
pub enum SubscriberQueryError {
    #[error("Failed to fetch subscribers from the database.")]
    FetchSubscribersError(#[source] sqlx::Error),
}

impl std::fmt::Debug for SubscriberQueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscriberQueryError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscriberQueryError::FetchSubscribersError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        error_message_response(self)
    }
}
