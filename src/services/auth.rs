use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{AuthResponse, Claims, LoginRequest, RegisterRequest, User, UserResponse};

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Authentication service
pub struct AuthService;

impl AuthService {
    /// Register a new user via the public endpoint
    pub async fn register(db: &Database, config: &Config, req: RegisterRequest) -> Result<AuthResponse> {
        if !config.app.open_registration {
            return Err(AppError::Forbidden(
                "Registration is disabled. Please contact an administrator.".to_string(),
            ));
        }

        let email = Self::normalize_email(&req.email);
        let name = req.name.trim().to_string();

        let user = Self::insert_user(db, &email, &req.password, &name, false).await?;
        let access_token = Self::generate_access_token(&user, config)?;

        Ok(AuthResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: config.jwt.token_expire_hours * 3600,
            user: UserResponse::from(user),
        })
    }

    /// Validate and persist a new user row. Shared by public registration and
    /// the admin create-user path.
    pub async fn insert_user(
        db: &Database,
        email: &str,
        password: &str,
        name: &str,
        is_admin: bool,
    ) -> Result<User> {
        if !email.validate_email() {
            return Err(AppError::BadRequest("Invalid email format".to_string()));
        }

        if password.len() < 6 {
            return Err(AppError::BadRequest(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(db.pool())
            .await?;

        if existing.is_some() {
            return Err(AppError::BadRequest("User already exists".to_string()));
        }

        let password_hash = Self::hash_password(password)?;
        let user_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, password_hash, is_admin, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user_id)
        .bind(email)
        .bind(name)
        .bind(&password_hash)
        .bind(is_admin)
        .bind(&now)
        .bind(&now)
        .execute(db.pool())
        .await?;

        let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(&user_id)
            .fetch_one(db.pool())
            .await?;

        Ok(user)
    }

    /// Login user.
    /// Unknown email and wrong password produce the same response so the
    /// failure cannot be used to enumerate accounts.
    pub async fn login(db: &Database, config: &Config, req: LoginRequest) -> Result<AuthResponse> {
        let email = Self::normalize_email(&req.email);

        let user: User = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

        if !Self::verify_password(&req.password, &user.password_hash)? {
            return Err(AppError::Unauthorized("Invalid email or password".to_string()));
        }

        let access_token = Self::generate_access_token(&user, config)?;

        Ok(AuthResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: config.jwt.token_expire_hours * 3600,
            user: UserResponse::from(user),
        })
    }

    /// Create the default admin account when no admin exists yet
    pub async fn ensure_default_admin(db: &Database) -> Result<()> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE is_admin = 1")
            .fetch_one(db.pool())
            .await?;

        if count.0 == 0 {
            Self::insert_user(db, DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD, "Admin User", true)
                .await?;
            tracing::info!(
                "Created default admin user: {} / {}",
                DEFAULT_ADMIN_EMAIL,
                DEFAULT_ADMIN_PASSWORD
            );
        }

        Ok(())
    }

    /// Lower-case and trim an email for storage and lookup
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Generate access token (JWT)
    fn generate_access_token(user: &User, config: &Config) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::hours(config.jwt.token_expire_hours as i64);

        let claims = Claims {
            sub: user.id.clone(),
            jti: Uuid::new_v4().to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt.secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Validate access token and extract claims
    pub fn validate_token(token: &str, config: &Config) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt.secret.as_bytes()),
            &validation,
        )
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

        Ok(token_data.claims)
    }

    /// Hash password using Argon2
    pub fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
            .to_string();

        Ok(password_hash)
    }

    /// Verify password against hash
    fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
