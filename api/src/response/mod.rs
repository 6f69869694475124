use serde::Serialize;

/// Standardized API response wrapper for all outgoing JSON responses.
///
/// ```json
/// {
///   "success": true,
///   "data": { ... },
///   "message": "Some message"
/// }
/// ```
///
/// Attendance validation endpoints always carry a `ValidationOutcome` in `data`, so
/// clients branch on `data.errorCode` rather than on `message`.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn new(success: bool, data: T, message: impl Into<String>) -> Self {
        Self {
            success,
            data,
            message: message.into(),
        }
    }

    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self::new(true, data, message)
    }

    /// Error response with default `data`.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self::new(false, T::default(), message)
    }
}
