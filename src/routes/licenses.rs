use actix_multipart::{Multipart, MultipartError};
use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use chrono::Utc;
use futures_util::TryStreamExt;
use sqlx::PgPool;

use crate::domain::{
    license::License,
    license_form::{LicenseForm, LicenseFormError, NewLicense},
    license_id::LicenseId,
};
use crate::routes::{error_chain_fmt, error_message_response, message_response};

#[tracing::instrument(
    name = "Submitting a new license application",
    skip(payload, db_pool),
    fields(license_id = tracing::field::Empty)
)]
pub async fn handle_submit_license(
    payload: Multipart,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, SubmitLicenseError> {
    let new_license = read_license_form(payload).await.map_err(|err| {
        tracing::error!("Invalid license application: {:?}", err);
        err
    })?;
    let license_id = insert_license(&new_license, &db_pool)
        .await
        .map_err(SubmitLicenseError::StoreLicenseError)?;

    tracing::Span::current().record("license_id", tracing::field::display(&license_id));

    Ok(message_response(
        StatusCode::CREATED,
        "License application submitted successfully!",
    ))
}

#[tracing::instrument(name = "Listing every license", skip(db_pool))]
pub async fn handle_list_licenses(
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, LicenseQueryError> {
    let licenses = fetch_licenses(&db_pool)
        .await
        .map_err(LicenseQueryError::FetchLicensesError)?;

    Ok(HttpResponse::Ok().json(licenses))
}

#[tracing::instrument(name = "Getting a license by id", skip(db_pool))]
pub async fn handle_get_license(
    path: web::Path<String>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, LicenseQueryError> {
    // Malformed ids never reach the database
    let license_id = LicenseId::parse(path.into_inner()).map_err(|err| {
        tracing::error!("Validation error: {:?}", err);
        LicenseQueryError::InvalidLicenseId(err)
    })?;

    let license = fetch_license_by_id(&license_id, &db_pool)
        .await
        .map_err(LicenseQueryError::FetchLicensesError)?
        .ok_or(LicenseQueryError::LicenseNotFound)?;

    Ok(HttpResponse::Ok().json(license))
}

#[tracing::instrument(name = "Listing the licenses of an applicant", skip(db_pool))]
pub async fn handle_list_licenses_by_email(
    path: web::Path<String>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, LicenseQueryError> {
    let licenses = fetch_licenses_by_email(path.as_str(), &db_pool)
        .await
        .map_err(LicenseQueryError::FetchLicensesError)?;

    if licenses.is_empty() {
        return Err(LicenseQueryError::NoLicensesForEmail);
    }

    Ok(HttpResponse::Ok().json(licenses))
}

async fn read_license_form(mut payload: Multipart) -> Result<NewLicense, SubmitLicenseError> {
    let mut form = LicenseForm::default();

    while let Some(mut field) = payload.try_next().await? {
        let content_disposition = field.content_disposition();
        let field_name = content_disposition.get_name().map(String::from);
        // Only parts with a filename are uploads
        let is_file = content_disposition.get_filename().is_some();
        let mut content = Vec::new();

        while let Some(chunk) = field.try_next().await? {
            content.extend_from_slice(&chunk);
        }

        match field_name {
            Some(field_name) if is_file => form.push_file(&field_name, content),
            Some(field_name) => form.push_text(&field_name, content)?,
            None => {}
        }
    }

    Ok(form.finish()?)
}

#[tracing::instrument(
    name = "Insert a new license into the database",
    skip(new_license, db_pool),
    fields(
        photo_bytes = new_license.photo.len(),
        nid_copy_bytes = new_license.nid_copy.len()
    )
)]
async fn insert_license(
    new_license: &NewLicense,
    db_pool: &PgPool,
) -> Result<LicenseId, sqlx::Error> {
    let license_id = LicenseId::generate();

    sqlx::query(
        r#"
        INSERT INTO licenses (
            id, name, email, applicant_id, vehicle_no, chess_no,
            present_address, permanent_address, photo, nid_copy, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(license_id.as_ref())
    .bind(new_license.name.as_deref())
    .bind(new_license.email.as_deref())
    .bind(new_license.applicant_id.as_deref())
    .bind(new_license.vehicle_no.as_deref())
    .bind(new_license.chess_no.as_deref())
    .bind(new_license.present_address.as_deref())
    .bind(new_license.permanent_address.as_deref())
    .bind(new_license.photo.encode())
    .bind(new_license.nid_copy.encode())
    .bind(Utc::now())
    .execute(db_pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to execute query: {:?}", err);
        err
    })?;

    Ok(license_id)
}

#[tracing::instrument(name = "Fetch every license from the database", skip(db_pool))]
async fn fetch_licenses(db_pool: &PgPool) -> Result<Vec<License>, sqlx::Error> {
    sqlx::query_as::<_, License>(
        r#"
        SELECT * FROM licenses
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

#[tracing::instrument(name = "Fetch a license by id from the database", skip(db_pool))]
async fn fetch_license_by_id(
    license_id: &LicenseId,
    db_pool: &PgPool,
) -> Result<Option<License>, sqlx::Error> {
    sqlx::query_as::<_, License>("SELECT * FROM licenses WHERE id = $1")
        .bind(license_id.as_ref())
        .fetch_optional(db_pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to execute query: {:?}", err);
            err
        })
}

#[tracing::instrument(name = "Fetch the licenses of an email from the database", skip(db_pool))]
async fn fetch_licenses_by_email(
    email: &str,
    db_pool: &PgPool,
) -> Result<Vec<License>, sqlx::Error> {
    sqlx::query_as::<_, License>(
        r#"
        SELECT * FROM licenses
        WHERE email = $1
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(email)
    .fetch_all(db_pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to execute query: {:?}", err);
        err
    })
}

#[derive(thiserror::Error)]
pub enum SubmitLicenseError {
    #[error("Invalid multipart form data.")]
    InvalidMultipart(#[from] MultipartError),
    #[error(transparent)]
    ValidationError(#[from] LicenseFormError),
    #[error("Failed to store the license application.")]
    StoreLicenseError(#[source] sqlx::Error),
}

impl std::fmt::Debug for SubmitLicenseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubmitLicenseError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubmitLicenseError::InvalidMultipart(_) => StatusCode::BAD_REQUEST,
            SubmitLicenseError::ValidationError(_) => StatusCode::BAD_REQUEST,
            SubmitLicenseError::StoreLicenseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        error_message_response(self)
    }
}

#[derive(thiserror::Error)]
pub enum LicenseQueryError {
    #[error("Invalid license id.")]
    InvalidLicenseId(String),
    #[error("License not found.")]
    LicenseNotFound,
    #[error("No licenses found for the provided email.")]
    NoLicensesForEmail,
    #[error("Failed to fetch licenses from the database.")]
    FetchLicensesError(#[source] sqlx::Error),
}

impl std::fmt::Debug for LicenseQueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for LicenseQueryError {
    fn status_code(&self) -> StatusCode {
        match self {
            LicenseQueryError::InvalidLicenseId(_) => StatusCode::BAD_REQUEST,
            LicenseQueryError::LicenseNotFound => StatusCode::NOT_FOUND,
            LicenseQueryError::NoLicensesForEmail => StatusCode::NOT_FOUND,
            LicenseQueryError::FetchLicensesError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        error_message_response(self)
    }
}
