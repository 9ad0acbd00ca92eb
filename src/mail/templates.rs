use askama::Template;

use crate::error::AppError;

#[derive(Template)]
#[template(path = "mail/welcome.txt")]
pub struct WelcomeMail<'a> {
    pub app_name: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub login_url: String,
}

#[derive(Template)]
#[template(path = "mail/password_reset.txt")]
pub struct PasswordResetMail<'a> {
    pub app_name: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub is_otp: bool,
    pub token: &'a str,
    pub reset_link: &'a str,
    pub expires_in_minutes: i64,
}

impl WelcomeMail<'_> {
    pub fn subject(&self) -> String {
        format!("Welcome to {} - Account Created Successfully", self.app_name)
    }
}

impl PasswordResetMail<'_> {
    pub fn subject(&self) -> String {
        format!("Password Reset Request for {}", self.app_name)
    }
}

pub fn render<T: Template>(template: &T) -> Result<String, AppError> {
    template.render().map_err(|err| {
        tracing::error!(error = %err, "mail template failed to render");
        AppError::internal("Mail template failed to render")
    })
}

#[cfg(test)]
mod tests {
    use super::{PasswordResetMail, WelcomeMail, render};

    #[test]
    fn welcome_mail_names_user_and_app() {
        let mail = WelcomeMail {
            app_name: "Acme",
            name: "Alice",
            email: "alice@x.com",
            login_url: "http://localhost:5173/login".to_string(),
        };
        let body = render(&mail).expect("render");

        assert!(body.contains("Hi Alice"));
        assert!(body.contains("alice@x.com"));
        assert_eq!(mail.subject(), "Welcome to Acme - Account Created Successfully");
    }

    #[test]
    fn otp_mail_shows_code_and_url_mail_shows_link() {
        let otp = render(&PasswordResetMail {
            app_name: "Acme",
            name: "Alice",
            email: "alice@x.com",
            is_otp: true,
            token: "123456",
            reset_link: "http://front/password/reset?token=123456&email=alice@x.com",
            expires_in_minutes: 10,
        })
        .expect("render");
        assert!(otp.contains("Your one-time code is: 123456"));
        assert!(!otp.contains("http://front"));

        let url = render(&PasswordResetMail {
            app_name: "Acme",
            name: "Alice",
            email: "alice@x.com",
            is_otp: false,
            token: "abcd",
            reset_link: "http://front/password/reset?token=abcd&email=alice@x.com",
            expires_in_minutes: 10,
        })
        .expect("render");
        assert!(url.contains("Reset your password here: http://front/password/reset?token=abcd"));
        assert!(url.contains("expires in 10 minutes"));
    }
}
