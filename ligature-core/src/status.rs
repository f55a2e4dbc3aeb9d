// HTTP status codes emitted by the binding layer

/// Status codes the binding and shaping pipeline can produce.
///
/// This is deliberately limited to the codes this layer emits itself;
/// arbitrary codes declared on a [`ResponseDescriptor`](crate::ResponseDescriptor)
/// are carried as plain `u16` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    // 2xx Success
    Ok = 200,
    Created = 201,
    NoContent = 204,

    // 4xx Client Errors
    BadRequest = 400,
    NotFound = 404,
    UnprocessableEntity = 422,

    // 5xx Server Errors
    InternalServerError = 500,
}

impl HttpStatus {
    /// Get the numeric status code
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the reason phrase for the status code
    pub fn reason(&self) -> &'static str {
        match self {
            HttpStatus::Ok => "OK",
            HttpStatus::Created => "Created",
            HttpStatus::NoContent => "No Content",
            HttpStatus::BadRequest => "Bad Request",
            HttpStatus::NotFound => "Not Found",
            HttpStatus::UnprocessableEntity => "Unprocessable Entity",
            HttpStatus::InternalServerError => "Internal Server Error",
        }
    }

    /// Look up a status from its numeric code
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            200 => Some(HttpStatus::Ok),
            201 => Some(HttpStatus::Created),
            204 => Some(HttpStatus::NoContent),
            400 => Some(HttpStatus::BadRequest),
            404 => Some(HttpStatus::NotFound),
            422 => Some(HttpStatus::UnprocessableEntity),
            500 => Some(HttpStatus::InternalServerError),
            _ => None,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.code())
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        assert_eq!(HttpStatus::from_code(400), Some(HttpStatus::BadRequest));
        assert_eq!(HttpStatus::BadRequest.code(), 400);
        assert_eq!(HttpStatus::from_code(999), None);
    }

    #[test]
    fn test_error_classes() {
        assert!(HttpStatus::BadRequest.is_client_error());
        assert!(!HttpStatus::BadRequest.is_server_error());
        assert!(HttpStatus::InternalServerError.is_server_error());
        assert!(!HttpStatus::Ok.is_client_error());
    }
}
