//! Validation helpers for DTOs.

use validator::ValidationError;

/// Expected invite code length: two concatenated 12-character segments.
const INVITE_CODE_LENGTH: usize = 24;

/// Validates that an invite code is 24 lowercase base-36 characters.
pub fn validate_invite_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != INVITE_CODE_LENGTH {
        let mut err = ValidationError::new("invite_code_length");
        err.message = Some(
            format!(
                "Invite code must be exactly {INVITE_CODE_LENGTH} characters (got {})",
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        let mut err = ValidationError::new("invite_code_format");
        err.message =
            Some("Invite code must contain only lowercase letters and digits".into());
        return Err(err);
    }

    Ok(())
}
