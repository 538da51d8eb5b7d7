/// Coarse classification of backend HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    /// 401, or 422 from the token validator on mutating calls.
    Unauthenticated,
    NotFound,
    /// 400 or 409 on create: the record already exists.
    Conflict,
    ClientError,
    ServerError,
}

impl StatusClass {
    pub fn of(code: u16) -> Self {
        match code {
            200..=299 => StatusClass::Success,
            401 | 422 => StatusClass::Unauthenticated,
            404 => StatusClass::NotFound,
            409 => StatusClass::Conflict,
            400..=499 => StatusClass::ClientError,
            _ => StatusClass::ServerError,
        }
    }

    pub fn is_success(self) -> bool {
        self == StatusClass::Success
    }
}
