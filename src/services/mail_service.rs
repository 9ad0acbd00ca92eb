use crate::{
    config::GeneralConfig,
    db::entities::{password_reset_token, user},
    mail::{
        Mailer,
        templates::{PasswordResetMail, WelcomeMail, render},
    },
};

/// Builds notification mails and hands them to the queue. Nothing here can
/// fail the caller.
#[derive(Clone)]
pub struct MailService {
    mailer: Mailer,
    general: GeneralConfig,
}

impl MailService {
    pub fn new(mailer: Mailer, general: GeneralConfig) -> Self {
        Self { mailer, general }
    }

    pub async fn welcome(&self, user: &user::Model) {
        let mail = WelcomeMail {
            app_name: &self.general.app_name,
            name: &user.name,
            email: &user.email,
            login_url: format!("{}/login", self.general.frontend_url.trim_end_matches('/')),
        };
        match render(&mail) {
            Ok(body) => {
                let message = self.mailer.message(&user.email, mail.subject(), body);
                self.mailer.notify(message).await;
            }
            Err(err) => tracing::warn!(user_id = %user.id, error = %err, "welcome mail skipped"),
        }
    }

    pub async fn password_reset(
        &self,
        user: &user::Model,
        token: &password_reset_token::Model,
        reset_link: &str,
        expires_in_minutes: i64,
    ) {
        let mail = PasswordResetMail {
            app_name: &self.general.app_name,
            name: &user.name,
            email: &token.email,
            is_otp: token.mode == "otp",
            token: &token.token,
            reset_link,
            expires_in_minutes,
        };
        match render(&mail) {
            Ok(body) => {
                let message = self.mailer.message(&token.email, mail.subject(), body);
                self.mailer.notify(message).await;
            }
            Err(err) => tracing::warn!(user_id = %user.id, error = %err, "reset mail skipped"),
        }
    }

    pub fn frontend_url(&self) -> &str {
        self.general.frontend_url.trim_end_matches('/')
    }
}
