use crate::form::{required_text, FormErrors, NON_FIELD_ERRORS};
use crate::orm::users;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, FromQueryResult};
use serde::Deserialize;

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern"));

/// A mini struct for holding only what information we need about a client.
#[derive(Clone, Debug, FromQueryResult)]
pub struct ClientUser {
    pub id: i32,
    pub username: String,
    pub is_staff: bool,
}

/// Public face of a user, as shown on profiles and post pages.
#[derive(Clone, Debug, PartialEq, FromQueryResult)]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserProfile {
    /// Full name, or the username when no name was given.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.to_owned()
        } else {
            full.to_owned()
        }
    }
}

pub async fn get_client_user(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<ClientUser>, DbErr> {
    users::Entity::find_by_id(id)
        .select_only()
        .column(users::Column::Id)
        .column(users::Column::Username)
        .column(users::Column::IsStaff)
        .into_model::<ClientUser>()
        .one(db)
        .await
}

pub async fn get_profile_by_id(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<UserProfile>, DbErr> {
    select_profile()
        .filter(users::Column::Id.eq(id))
        .into_model::<UserProfile>()
        .one(db)
        .await
}

pub async fn get_profile_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<UserProfile>, DbErr> {
    select_profile()
        .filter(users::Column::Username.eq(username))
        .into_model::<UserProfile>()
        .one(db)
        .await
}

fn select_profile() -> Select<users::Entity> {
    users::Entity::find()
        .select_only()
        .column(users::Column::Id)
        .column(users::Column::Username)
        .column(users::Column::FirstName)
        .column(users::Column::LastName)
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::error!("verify_password: stored hash is unreadable: {}", e);
            false
        }
    }
}

/// Returns the user if the credentials match.
pub async fn authenticate(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<Option<users::Model>, DbErr> {
    let user = users::Entity::find()
        .filter(users::Column::Username.eq(username.trim()))
        .one(db)
        .await?;

    Ok(user.filter(|user| verify_password(password, &user.password)))
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupFormData {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

/// Signup data which passed validation.
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Checks everything about a signup form that does not need the database.
pub fn validate_signup_form(form: &SignupFormData) -> Result<NewUser, FormErrors> {
    let mut errors = FormErrors::default();

    let username = required_text(&mut errors, "username", &form.username, Some(USERNAME_MAX_LEN));
    if !username.is_empty() && !USERNAME_PATTERN.is_match(&username) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }

    let email = form.email.trim().to_owned();
    if !email.is_empty() && !is_plausible_email(&email) {
        errors.add("email", "Enter a valid email address.");
    }

    validate_new_password(&mut errors, &form.password1, &form.password2);

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewUser {
        username,
        first_name: form.first_name.trim().to_owned(),
        last_name: form.last_name.trim().to_owned(),
        email,
        password: form.password1.to_owned(),
    })
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}

/// Errors go on the confirmation field, the way they are shown next to it.
fn validate_new_password(errors: &mut FormErrors, password1: &str, password2: &str) {
    if password1.is_empty() {
        errors.add("password1", "This field is required.");
        return;
    }
    if password1 != password2 {
        errors.add("password2", "The two password fields didn't match.");
        return;
    }
    if password1.chars().count() < PASSWORD_MIN_LEN {
        errors.add(
            "password2",
            format!(
                "This password is too short. It must contain at least {} characters.",
                PASSWORD_MIN_LEN
            ),
        );
    }
}

/// Inserts a validated user. Returns form errors if the username is taken.
pub async fn insert_new_user(
    db: &DatabaseConnection,
    new_user: NewUser,
) -> Result<Result<users::Model, FormErrors>, DbErr> {
    let taken = users::Entity::find()
        .filter(users::Column::Username.eq(new_user.username.as_str()))
        .one(db)
        .await?
        .is_some();
    if taken {
        let mut errors = FormErrors::default();
        errors.add("username", "A user with that username already exists.");
        return Ok(Err(errors));
    }

    let password = hash_password(&new_user.password).map_err(|e| DbErr::Custom(e.to_string()))?;
    let user = users::ActiveModel {
        username: Set(new_user.username),
        email: Set(new_user.email),
        first_name: Set(new_user.first_name),
        last_name: Set(new_user.last_name),
        password: Set(password),
        is_staff: Set(false),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(Ok(user))
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PasswordChangeFormData {
    pub old_password: String,
    pub new_password1: String,
    pub new_password2: String,
}

/// Verifies the old password and stores the new one.
pub async fn change_password(
    db: &DatabaseConnection,
    user_id: i32,
    form: &PasswordChangeFormData,
) -> Result<Result<(), FormErrors>, DbErr> {
    let user = users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("user {}", user_id)))?;

    let mut errors = FormErrors::default();
    if !verify_password(&form.old_password, &user.password) {
        errors.add(
            "old_password",
            "Your old password was entered incorrectly. Please enter it again.",
        );
    }
    let mut password_errors = FormErrors::default();
    validate_new_password(&mut password_errors, &form.new_password1, &form.new_password2);
    for message in password_errors.get("password1") {
        errors.add("new_password1", message.to_owned());
    }
    for message in password_errors.get("password2") {
        errors.add("new_password2", message.to_owned());
    }
    if !errors.is_empty() {
        return Ok(Err(errors));
    }

    let password = hash_password(&form.new_password1).map_err(|e| DbErr::Custom(e.to_string()))?;
    let mut user: users::ActiveModel = user.into();
    user.password = Set(password);
    user.update(db).await?;

    Ok(Ok(()))
}

/// Error shown when the login form does not match a user.
pub fn login_failed() -> FormErrors {
    let mut errors = FormErrors::default();
    errors.add(
        NON_FIELD_ERRORS,
        "Please enter a correct username and password. Note that both fields may be case-sensitive.",
    );
    errors
}
