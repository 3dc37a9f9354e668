use crate::users::repo_types::{ResetToken, User};
use sqlx::PgPool;
use uuid::Uuid;

impl User {
    /// Find a user by email. The match is case-sensitive, emails are
    /// stored exactly as registered.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, photo, phone, bio, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, photo, phone, bio, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password. Phone and bio fall back to
    /// the table defaults.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, photo, phone, bio, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Persist the merged profile fields of an already-loaded record.
    pub async fn update_profile(db: &PgPool, user: &User) -> anyhow::Result<User> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, email = $3, photo = $4, phone = $5, bio = $6
            WHERE id = $1
            RETURNING id, name, email, password_hash, photo, phone, bio, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.photo)
        .bind(&user.phone)
        .bind(&user.bio)
        .fetch_one(db)
        .await?;
        Ok(updated)
    }

    pub async fn update_password_hash(
        db: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await?;
        Ok(())
    }
}

impl ResetToken {
    /// Store a new reset grant, dropping any outstanding one so a single
    /// token is live per user.
    pub async fn replace_for_user(db: &PgPool, token: &ResetToken) -> anyhow::Result<()> {
        let mut tx = db.begin().await?;
        sqlx::query(r#"DELETE FROM reset_tokens WHERE user_id = $1"#)
            .bind(token.user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO reset_tokens (token_hash, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&token.token_hash)
        .bind(token.user_id)
        .bind(token.created_at)
        .bind(token.expires_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Atomically consume a live token by digest. The conditional delete
    /// guarantees at most one of two concurrent calls gets the row; an
    /// expired or already-consumed token yields `None`.
    pub async fn consume(db: &PgPool, token_hash: &str) -> anyhow::Result<Option<Uuid>> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            DELETE FROM reset_tokens
            WHERE token_hash = $1 AND expires_at > now()
            RETURNING user_id
            "#,
        )
        .bind(token_hash)
        .fetch_optional(db)
        .await?;
        Ok(user_id)
    }

    /// Remove tokens past their expiry. Returns how many were dropped.
    pub async fn sweep_expired(db: &PgPool) -> anyhow::Result<u64> {
        let result = sqlx::query(r#"DELETE FROM reset_tokens WHERE expires_at <= now()"#)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}
