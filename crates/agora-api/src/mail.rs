use chrono::Duration;
use tracing::info;

/// An outgoing message carrying a single-use token link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Out-of-band delivery for verification and reset tokens.
pub trait Mailer: Send + Sync {
    fn send(&self, mail: &Mail) -> anyhow::Result<()>;
}

/// Writes mail to the log instead of sending it. Development default.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, mail: &Mail) -> anyhow::Result<()> {
        info!(to = %mail.to, subject = %mail.subject, "{}", mail.body);
        Ok(())
    }
}

pub fn verification_mail(to: &str, public_url: &str, token: &str, ttl: Duration) -> Mail {
    Mail {
        to: to.to_string(),
        subject: "Verify your account".into(),
        body: format!(
            "Confirm your email address within {} minutes: {}/verify-account/{}",
            ttl.num_minutes(),
            public_url.trim_end_matches('/'),
            token
        ),
    }
}

pub fn reset_mail(to: &str, public_url: &str, token: &str, ttl: Duration) -> Mail {
    Mail {
        to: to.to_string(),
        subject: "Reset your password".into(),
        body: format!(
            "Reset your password within {} minutes: {}/reset-password/{}",
            ttl.num_minutes(),
            public_url.trim_end_matches('/'),
            token
        ),
    }
}
