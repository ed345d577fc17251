//! Input validation helpers
//!
//! Request bodies derive [`validator::Validate`]; [`validate_body`] turns the
//! collected field errors into a 400 with one message per field in `details`.

use shared::AppError;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Validate a request body, mapping failures to `ValidationFailed`.
pub fn validate_body<T: Validate>(body: &T) -> Result<(), AppError> {
    body.validate().map_err(into_app_error)
}

fn into_app_error(errors: ValidationErrors) -> AppError {
    let mut fields = Vec::new();
    collect(&errors, &mut fields);
    fields.sort();
    let mut err = AppError::validation("Validation failed");
    for (field, message) in fields {
        err = err.with_detail(field, message);
    }
    err
}

/// First message per field; nested (flattened) bodies report their own field names
fn collect(errors: &ValidationErrors, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(list) => {
                let message = list
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{field} is invalid"));
                out.push((field.to_string(), message));
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, out),
            ValidationErrorsKind::List(items) => {
                for inner in items.values() {
                    collect(inner, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Body {
        #[validate(email(message = "Invalid email address"))]
        email: String,
        #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
        password: String,
    }

    #[test]
    fn test_field_messages_in_details() {
        let err = validate_body(&Body {
            email: "nope".into(),
            password: "123".into(),
        })
        .unwrap_err();
        assert_eq!(err.code, shared::ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        assert_eq!(details["email"], "Invalid email address");
        assert_eq!(details["password"], "Password must be at least 6 characters");
    }

    #[derive(Validate)]
    struct Outer {
        #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
        rating: i32,
        #[validate(nested)]
        inner: Body,
    }

    #[test]
    fn test_nested_fields_are_reported() {
        let err = validate_body(&Outer {
            rating: 9,
            inner: Body {
                email: "jane@example.com".into(),
                password: "1".into(),
            },
        })
        .unwrap_err();
        let details = err.details.unwrap();
        assert_eq!(details["rating"], "Rating must be between 1 and 5");
        assert_eq!(details["password"], "Password must be at least 6 characters");
        assert!(details.get("email").is_none());
    }

    #[test]
    fn test_valid_body_passes() {
        assert!(
            validate_body(&Body {
                email: "jane@example.com".into(),
                password: "secret1".into(),
            })
            .is_ok()
        );
    }
}
