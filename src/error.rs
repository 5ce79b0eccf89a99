//! Crate-wide error type.
//!
//! Every failure carries the process exit code it maps to, so `main` can stay a
//! thin `match` over `app::run()`.

/// Configuration or user-input error (schema mismatch, bad `--set`, ...).
pub const EXIT_CONFIG: u8 = 2;
/// The model artifact is missing, unreadable, or unsupported.
pub const EXIT_MODEL: u8 = 3;
/// Anything that fails after startup (terminal, rendering, exports).
pub const EXIT_RUNTIME: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, message)
    }

    pub fn model(message: impl Into<String>) -> Self {
        Self::new(EXIT_MODEL, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(EXIT_RUNTIME, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_map_to_exit_codes() {
        assert_eq!(AppError::config("x").exit_code(), EXIT_CONFIG);
        assert_eq!(AppError::model("x").exit_code(), EXIT_MODEL);
        assert_eq!(AppError::runtime("x").exit_code(), EXIT_RUNTIME);
        assert_eq!(AppError::runtime("boom").to_string(), "boom");
    }
}
