use actix_web::HttpResponse;
use derive_more::Display;

#[derive(Debug, Display)]
pub enum ServerError {
    /// Note content was empty. The write handler swallows this one on
    /// purpose, blank submissions are dropped without telling the user.
    EmptyContent,
    DieselError,
    EnvironmentError,
    R2D2Error,
    MigrationError,
    TemplateError,
    IoError,
}

impl From<r2d2::Error> for ServerError {
    fn from(_: r2d2::Error) -> ServerError {
        ServerError::R2D2Error
    }
}

impl From<std::env::VarError> for ServerError {
    fn from(_: std::env::VarError) -> ServerError {
        ServerError::EnvironmentError
    }
}

impl From<diesel::result::Error> for ServerError {
    fn from(_: diesel::result::Error) -> ServerError {
        ServerError::DieselError
    }
}

impl From<diesel::result::ConnectionError> for ServerError {
    fn from(_: diesel::result::ConnectionError) -> ServerError {
        ServerError::DieselError
    }
}

impl From<askama::Error> for ServerError {
    fn from(_: askama::Error) -> ServerError {
        ServerError::TemplateError
    }
}

impl From<std::io::Error> for ServerError {
    fn from(_: std::io::Error) -> ServerError {
        ServerError::IoError
    }
}

impl actix_web::error::ResponseError for ServerError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServerError::EmptyContent => {
                HttpResponse::BadRequest().body("Invalid Request: note content must not be empty.")
            }
            ServerError::DieselError => {
                HttpResponse::InternalServerError().body("Library Error: Diesel Error.")
            }
            ServerError::EnvironmentError => HttpResponse::InternalServerError()
                .body("Server Error: Use of an uninitialized environment variable."),
            ServerError::R2D2Error => {
                HttpResponse::InternalServerError().body("Server Error: Pooling Error.")
            }
            ServerError::MigrationError => {
                HttpResponse::InternalServerError().body("Server Error: Schema Migration Failed.")
            }
            ServerError::TemplateError => {
                HttpResponse::InternalServerError().body("Library Error: Template Rendering Failed.")
            }
            ServerError::IoError => {
                HttpResponse::InternalServerError().body("Server Error: I/O Error.")
            }
        }
    }
}
