use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use till::error::TillError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Misconfigured {key}: {reason}")]
    Config { key: &'static str, reason: String },

    #[error(transparent)]
    Till(#[from] TillError),

    #[error("Internal error: {0}")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload => StatusCode::BAD_REQUEST,
            AppError::Config { .. } | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Till(error) => till_status(error),
        }
    }
}

fn till_status(error: &TillError) -> StatusCode {
    use TillError::*;

    match error {
        UnknownProduct(_) | UnknownLine(_) | UnknownOrder(_) | UnknownTable(_)
        | UnknownPayment(_) => StatusCode::NOT_FOUND,
        UnavailableProduct(_) | UnknownOption { .. } | MissingOption { .. } | ZeroQuantity
        | EmptyCart | InvalidSlug(_) | Invalid { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        OrderClosed { .. } | InvalidTransition { .. } | PaymentExpired(_)
        | PaymentSettled(_) | AlreadyPaid(_) => StatusCode::CONFLICT,
        Decode(_) | Io(_) | Fetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        (status, self.to_string()).into_response()
    }
}
