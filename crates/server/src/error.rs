use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{
    auth::AuthError, handovers::HandoverError, invoices::InvoiceError, receipts::ReceiptError,
    staff::StaffError,
};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Invoice(#[from] InvoiceError),
    #[error(transparent)]
    Receipt(#[from] ReceiptError),
    #[error(transparent)]
    Handover(#[from] HandoverError),
    #[error(transparent)]
    Staff(#[from] StaffError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Json(#[from] JsonRejection),
    #[error(transparent)]
    Path(#[from] PathRejection),
    #[error(transparent)]
    Query(#[from] QueryRejection),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Invoice(err) => match err {
                InvoiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
                InvoiceError::NotFound
                | InvoiceError::ItemNotFound
                | InvoiceError::ProductNotFound => StatusCode::NOT_FOUND,
                InvoiceError::RemainingBalance { .. } | InvoiceError::CodeExhausted(_) => {
                    StatusCode::CONFLICT
                }
                InvoiceError::MissingHeader
                | InvoiceError::InvalidType(_)
                | InvoiceError::MissingDescription
                | InvoiceError::InvalidQuantity
                | InvoiceError::MissingUnitPrice
                | InvoiceError::NegativeUnitPrice
                | InvoiceError::NegativeDownPayment
                | InvoiceError::InvalidReference => StatusCode::BAD_REQUEST,
            },
            ApiError::Receipt(err) => match err {
                ReceiptError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
                ReceiptError::InvoiceNotFound | ReceiptError::NotFound => StatusCode::NOT_FOUND,
                ReceiptError::InvoiceCancelled => StatusCode::CONFLICT,
                ReceiptError::MissingInvoiceCode | ReceiptError::InvalidAmount => {
                    StatusCode::BAD_REQUEST
                }
            },
            ApiError::Handover(err) => match err {
                HandoverError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
                HandoverError::MissingFields => StatusCode::BAD_REQUEST,
                HandoverError::InvoiceNotFound
                | HandoverError::StaffNotFound
                | HandoverError::NotFound => StatusCode::NOT_FOUND,
            },
            ApiError::Staff(err) => match err {
                StaffError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
                StaffError::MissingName => StatusCode::BAD_REQUEST,
                StaffError::DuplicateNim => StatusCode::CONFLICT,
                StaffError::NotFound => StatusCode::NOT_FOUND,
            },
            ApiError::Auth(err) => match err {
                AuthError::Database(_) | AuthError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AuthError::MissingCredentials | AuthError::MissingEmail => StatusCode::BAD_REQUEST,
                AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::InvalidCredentials | AuthError::InvalidToken => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
            },
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // Missing route params are a wiring bug and keep axum's 500.
            ApiError::Path(rejection) => rejection.status(),
            ApiError::Json(_) | ApiError::Query(_) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            match &self {
                ApiError::Json(rejection) => rejection.body_text(),
                ApiError::Path(rejection) => rejection.body_text(),
                ApiError::Query(rejection) => rejection.body_text(),
                other => other.to_string(),
            }
        };

        (status, Json(ApiResponse::<()>::error(&message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from(InvoiceError::RemainingBalance { balance: 10 }).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(InvoiceError::InvalidQuantity).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ReceiptError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(StaffError::DuplicateNim).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(sqlx::Error::PoolTimedOut).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
