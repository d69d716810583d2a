use super::ApiError;

/// Result of one logical API call.
///
/// The executor never returns `Err` or panics; every failure, including
/// transport errors, ends up in [`Outcome::Failure`].
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Outcome<T> {
    Success(T),
    Failure(ApiError),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            Outcome::Success(data) => Some(data),
            Outcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(e) => Some(e),
        }
    }

    /// User-facing message for a failure
    pub fn error_message(&self) -> Option<String> {
        self.error().map(|e| e.to_string())
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(data) => Outcome::Success(f(data)),
            Outcome::Failure(e) => Outcome::Failure(e),
        }
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        match self {
            Outcome::Success(data) => Ok(data),
            Outcome::Failure(e) => Err(e),
        }
    }
}

impl<T> From<Result<T, ApiError>> for Outcome<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => Outcome::Success(data),
            Err(e) => Outcome::Failure(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message() {
        let outcome: Outcome<()> = Outcome::Failure(ApiError::ServerError);
        assert!(!outcome.is_success());
        assert_eq!(
            outcome.error_message().as_deref(),
            Some("Server error. Please try again later.")
        );
    }

    #[test]
    fn test_map_keeps_failure() {
        let outcome: Outcome<i32> = Outcome::Failure(ApiError::GithubNotLinked);
        let mapped = outcome.map(|n| n * 2);
        assert_eq!(mapped, Outcome::Failure(ApiError::GithubNotLinked));

        let ok = Outcome::Success(21).map(|n| n * 2);
        assert_eq!(ok.payload(), Some(&42));
    }
}
