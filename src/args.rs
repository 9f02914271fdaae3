use clap::Parser;

/// Runtime configuration, read from flags or the environment (a `.env` file
/// is loaded before parsing).
#[derive(Clone, Debug, Parser)]
pub struct Args {
    /// Path to the SQLite database file
    #[clap(long, env = "DB_PATH", default_value = "alanmath.db")]
    pub db_path: String,

    /// Port to serve the API on
    #[clap(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Public base URL, used for OAuth redirects and payment back-urls
    #[clap(long, env = "PUBLIC_URL", default_value = "http://localhost:8080")]
    pub public_url: String,

    /// Google OAuth client id; OAuth login is disabled when absent
    #[clap(long, env = "GOOGLE_CLIENT_ID")]
    pub google_client_id: Option<String>,

    /// Google OAuth client secret
    #[clap(long, env = "GOOGLE_CLIENT_SECRET")]
    pub google_client_secret: Option<String>,

    /// Payment gateway API base URL
    #[clap(long, env = "PAYMENT_API_URL", default_value = "https://api.mercadopago.com")]
    pub payment_api_url: String,

    /// Payment gateway access token; payments are disabled when absent
    #[clap(long, env = "PAYMENT_ACCESS_TOKEN")]
    pub payment_access_token: Option<String>,

    /// SMTP relay host; outbound mail is disabled when absent
    #[clap(long, env = "SMTP_HOST")]
    pub smtp_host: Option<String>,

    /// SMTP username
    #[clap(long, env = "SMTP_USER")]
    pub smtp_user: Option<String>,

    /// SMTP password
    #[clap(long, env = "SMTP_PASSWORD")]
    pub smtp_password: Option<String>,

    /// Sender address for transactional mail
    #[clap(long, env = "MAIL_FROM", default_value = "AlanMath <no-reply@alanmath.com>")]
    pub mail_from: String,
}
