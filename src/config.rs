use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub host: String,
    pub user: String,
    pub pass: String,
    pub from: String,
    pub reply_to: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub frontend_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let frontend_url =
            std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "inventra".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "inventra-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        let mail = MailConfig {
            host: std::env::var("EMAIL_HOST").unwrap_or_default(),
            user: std::env::var("EMAIL_USER").unwrap_or_default(),
            pass: std::env::var("EMAIL_PASS").unwrap_or_default(),
            from: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "noreply@inventra.dev".into()),
            reply_to: std::env::var("EMAIL_REPLY_TO")
                .unwrap_or_else(|_| "support@inventra.dev".into()),
        };
        Ok(Self {
            database_url,
            frontend_url,
            jwt,
            mail,
        })
    }
}
