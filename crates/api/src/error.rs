use actix_web::{
    http::{header, StatusCode},
    HttpResponse,
};
use calgate_infra::repos::CalendarError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid argument: `{0}`")]
    InvalidArgument(String),
    #[error("404 Not found. Error message: `{0}`")]
    NotFound(String),
    #[error("Permission denied: `{0}`")]
    PermissionDenied(String),
    #[error("Aborted: `{0}`")]
    Aborted(String),
    #[error("Not implemented: `{0}`")]
    Unimplemented(String),
    #[error("Internal server error")]
    Internal,
}

impl actix_web::error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match *self {
            Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::Aborted(_) => StatusCode::CONFLICT,
            Self::Unimplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header((header::CONTENT_TYPE, "text/html; charset=utf-8"))
            .body(self.to_string())
    }
}

impl From<CalendarError> for ApiError {
    fn from(err: CalendarError) -> Self {
        match err {
            CalendarError::NotFound => Self::NotFound("event or calendar not found".into()),
            CalendarError::ReadOnly => Self::PermissionDenied("calendar is read-only".into()),
            CalendarError::InvalidEvent(msg) => Self::InvalidArgument(msg),
            CalendarError::Other(err) => {
                tracing::error!(error = %err, "calendar backend error");
                Self::Internal
            }
        }
    }
}
