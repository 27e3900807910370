use actix_web::{get, post, web, HttpResponse};
use serde::{Serialize, Deserialize};
use sqlx::{PgPool, postgres::{PgRow, PgQueryAs}, FromRow, Error};
use sqlx_core::row::Row;
use crate::{
    AppState,
    lib::{
        Result,
        auth::{self, Claims},
        error::{ServerError, InternalError},
    },
};

/// A registered account in the admin store. The password never leaves the store layer.
#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub user_id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

struct UserCredentials {
    user: User,
    password: String,
}

impl<'a> FromRow<'a, PgRow<'a>> for User {
    fn from_row(row: &PgRow) -> std::result::Result<Self, Error> {
        Ok(User {
            user_id: row.try_get("user_id")?,
            username: row.try_get("username")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
        })
    }
}

impl<'a> FromRow<'a, PgRow<'a>> for UserCredentials {
    fn from_row(row: &PgRow) -> std::result::Result<Self, Error> {
        Ok(UserCredentials {
            user: User::from_row(row)?,
            password: row.try_get("password")?,
        })
    }
}

impl User {
    pub async fn find(user_id: i32, db_pool: &PgPool) -> Result<User> {
        sqlx::query_as("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(db_pool).await.map_err(ServerError::if_row_not_found("user"))
    }

    pub async fn find_by_username(username: &str, db_pool: &PgPool) -> Result<User> {
        sqlx::query_as("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(db_pool).await.map_err(ServerError::if_row_not_found("user"))
    }
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
struct TokenResponse {
    access_token: String,
    token_type: &'static str,
    user: User,
}

fn token_response(user: User) -> Result<HttpResponse> {
    let token = auth::create_jwt(&Claims::new(user.user_id, user.username.clone()))?;
    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token: token,
        token_type: "bearer",
        user,
    }))
}

#[post("/register")]
pub async fn register(state: web::Data<AppState>, data: web::Json<RegisterRequest>) -> Result<HttpResponse> {
    let username_taken: Option<(i32,)> = sqlx::query_as("SELECT user_id FROM users WHERE username = $1")
        .bind(&data.username)
        .fetch_optional(&state.db_pool).await.map_err(ServerError::from)?;
    if username_taken.is_some() {
        Err(InternalError::UsernameTaken)?
    }
    let email_taken: Option<(i32,)> = sqlx::query_as("SELECT user_id FROM users WHERE email = $1")
        .bind(&data.email)
        .fetch_optional(&state.db_pool).await.map_err(ServerError::from)?;
    if email_taken.is_some() {
        Err(InternalError::EmailTaken)?
    }

    let inserted: (i32,) = sqlx::query_as(
        "INSERT INTO users (username, first_name, last_name, email, password)
        VALUES($1, $2, $3, $4, $5) RETURNING user_id")
        .bind(&data.username)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .bind(&data.password)
        .fetch_one(&state.db_pool).await.map_err(ServerError::from)?;

    token_response(User {
        user_id: inserted.0,
        username: data.username.clone(),
        first_name: data.first_name.clone(),
        last_name: data.last_name.clone(),
        email: data.email.clone(),
    })
}

#[post("/login")]
pub async fn login(state: web::Data<AppState>, data: web::Json<LoginRequest>) -> Result<HttpResponse> {
    let credentials: Option<UserCredentials> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(&data.username)
        .fetch_optional(&state.db_pool).await.map_err(ServerError::from)?;

    match credentials {
        Some(credentials) if credentials.password == data.password => token_response(credentials.user),
        _ => Err(InternalError::InvalidCredentials.into()),
    }
}

#[get("/me")]
pub async fn get_current_user(state: web::Data<AppState>, claims: Claims) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(User::find(claims.uid, &state.db_pool).await?))
}
