//! Transactional mail relay. Only password-reset mail goes out; when SMTP is
//! not configured the caller logs and moves on.

use anyhow::Context;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::args::Args;

#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl Mailer {
    /// Returns `None` when no SMTP host is configured.
    pub fn from_args(args: &Args) -> anyhow::Result<Option<Self>> {
        let Some(host) = args.smtp_host.as_deref() else {
            return Ok(None);
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .context("invalid SMTP relay host")?;
        if let (Some(user), Some(password)) = (&args.smtp_user, &args.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Some(Mailer {
            transport: builder.build(),
            from: args.mail_from.clone(),
        }))
    }

    pub async fn send_password_reset(&self, to: &str, name: &str, link: &str) -> anyhow::Result<()> {
        let body = format!(
            "Hola {name},\n\n\
             Recibimos una solicitud para restablecer tu contraseña de AlanMath.\n\
             Abre este enlace para elegir una nueva (expira en una hora):\n\n{link}\n\n\
             Si no fuiste tú, ignora este correo.\n"
        );
        let message = Message::builder()
            .from(self.from.parse().context("invalid sender address")?)
            .to(to.parse().context("invalid recipient address")?)
            .subject("Restablece tu contraseña de AlanMath")
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        self.transport
            .send(message)
            .await
            .context("SMTP send failed")?;
        Ok(())
    }
}
