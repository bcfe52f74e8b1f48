use crate::services::error::ApiError;

/// Read a required environment variable, failing with a message that names
/// the variable and tells the operator how to fix it.
pub fn required_env(variable: &str, instruction: &str) -> Result<String, ApiError> {
    match std::env::var(variable) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ApiError::Config {
            variable: variable.to_string(),
            instruction: instruction.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_variable_is_trimmed() {
        std::env::set_var("TOOLBRIDGE_TEST_ENV_PRESENT", "  value  ");
        let value = required_env("TOOLBRIDGE_TEST_ENV_PRESENT", "unused").unwrap();
        assert_eq!(value, "value");
        std::env::remove_var("TOOLBRIDGE_TEST_ENV_PRESENT");
    }

    #[test]
    fn test_absent_variable_fails_with_instruction() {
        let err = required_env("TOOLBRIDGE_TEST_ENV_ABSENT", "Set it to something.").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("TOOLBRIDGE_TEST_ENV_ABSENT"));
        assert!(message.contains("Set it to something."));
    }

    #[test]
    fn test_blank_variable_counts_as_absent() {
        std::env::set_var("TOOLBRIDGE_TEST_ENV_BLANK", "   ");
        let result = required_env("TOOLBRIDGE_TEST_ENV_BLANK", "Set it.");
        assert!(result.is_err());
        std::env::remove_var("TOOLBRIDGE_TEST_ENV_BLANK");
    }
}
