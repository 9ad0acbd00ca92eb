//! Request validation as explicit rule functions.
//!
//! Each rule returns `Ok(())` or the message for its field. A [`Validator`]
//! runs rules in order and keeps the first failure per field, so handlers can
//! report every bad field at once as a 422 with a field-keyed map.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::{AppError, FieldErrors};

pub type RuleResult = Result<(), String>;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 20;

pub trait Validate {
    fn validate(&self, v: &mut Validator);
}

#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `result` under `field` unless that field already failed.
    pub fn check(&mut self, field: &str, result: RuleResult) -> &mut Self {
        if let Err(message) = result {
            self.errors.entry(field.to_string()).or_insert(message);
        }
        self
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(self.errors))
        }
    }
}

pub fn run<T: Validate + ?Sized>(value: &T) -> Result<(), AppError> {
    let mut validator = Validator::new();
    value.validate(&mut validator);
    validator.finish()
}

pub fn required(field: &str, value: &str) -> RuleResult {
    if value.trim().is_empty() {
        return Err(format!("{field} should not be empty"));
    }
    Ok(())
}

pub fn email(field: &str, value: &str) -> RuleResult {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return Err(format!("{field} must be an email"));
    };
    let domain_ok = domain
        .split_once('.')
        .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty() && !tail.ends_with('.'));
    if local.is_empty() || !domain_ok || value.contains(char::is_whitespace) {
        return Err(format!("{field} must be an email"));
    }
    Ok(())
}

pub fn min_len(field: &str, value: &str, min: usize) -> RuleResult {
    if value.chars().count() < min {
        return Err(format!(
            "{field} must be longer than or equal to {min} characters"
        ));
    }
    Ok(())
}

pub fn max_len(field: &str, value: &str, max: usize) -> RuleResult {
    if value.chars().count() > max {
        return Err(format!(
            "{field} must be shorter than or equal to {max} characters"
        ));
    }
    Ok(())
}

pub fn passwords_match(password: &str, confirm: &str) -> RuleResult {
    if password != confirm {
        return Err("Passwords do not match".to_string());
    }
    Ok(())
}

pub fn url(field: &str, value: &str) -> RuleResult {
    match reqwest::Url::parse(value.trim()) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(format!("{field} must be a URL address")),
    }
}

pub fn one_of(field: &str, value: &str, allowed: &[&str]) -> RuleResult {
    if !allowed.contains(&value) {
        return Err(format!(
            "{field} must be one of the following values: {}",
            allowed.join(", ")
        ));
    }
    Ok(())
}

/// Lowercased and trimmed; all email comparisons go through this.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// JSON body extractor that runs the body's rules before the handler sees it.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        run(&value)?;
        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Signup {
        email: String,
        password: String,
        confirm: String,
    }

    impl Validate for Signup {
        fn validate(&self, v: &mut Validator) {
            v.check("email", required("email", &self.email))
                .check("email", email("email", &self.email))
                .check("password", required("password", &self.password))
                .check("password", min_len("password", &self.password, MIN_PASSWORD_LEN))
                .check("confirmPassword", passwords_match(&self.password, &self.confirm));
        }
    }

    #[test]
    fn collects_first_failure_per_field() {
        let err = run(&Signup {
            email: String::new(),
            password: "abc".to_string(),
            confirm: "abcd".to_string(),
        })
        .expect_err("validation should fail");

        let errors = err.field_errors().expect("field errors should be present");
        assert_eq!(errors["email"], "email should not be empty");
        assert_eq!(
            errors["password"],
            "password must be longer than or equal to 6 characters"
        );
        assert_eq!(errors["confirmPassword"], "Passwords do not match");
    }

    #[test]
    fn accepts_valid_input() {
        run(&Signup {
            email: "alice@x.com".to_string(),
            password: "secret1".to_string(),
            confirm: "secret1".to_string(),
        })
        .expect("validation should pass");
    }

    #[test]
    fn email_rule_rejects_common_mistakes() {
        assert!(email("email", "alice@x.com").is_ok());
        assert!(email("email", "alice").is_err());
        assert!(email("email", "@x.com").is_err());
        assert!(email("email", "alice@x").is_err());
        assert!(email("email", "ali ce@x.com").is_err());
    }

    #[test]
    fn url_rule_requires_http_scheme() {
        assert!(url("redirect_url", "https://app.example.com/reset").is_ok());
        assert!(url("redirect_url", "javascript:alert(1)").is_err());
        assert!(url("redirect_url", "not a url").is_err());
    }

    #[test]
    fn one_of_lists_allowed_values() {
        let err = one_of("url_or_otp", "sms", &["url", "otp"]).expect_err("sms is not allowed");
        assert_eq!(
            err,
            "url_or_otp must be one of the following values: url, otp"
        );
    }

    #[test]
    fn normalize_email_lowercases_and_trims() {
        assert_eq!(normalize_email("  Alice@X.com "), "alice@x.com");
    }
}
