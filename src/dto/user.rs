use serde::Deserialize;

use crate::middleware::CsrfField;

pub const FIELD_NAME: &str = "name";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_PASSWORD: &str = "password";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserLoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub csrf_token: String,
}

impl UserSignupForm {
    /// Copy safe to echo back into a page: the password never is.
    pub fn redisplay(&self) -> Self {
        Self {
            password: String::new(),
            ..self.clone()
        }
    }
}

impl UserLoginForm {
    pub fn redisplay(&self) -> Self {
        Self {
            password: String::new(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogoutForm {
    #[serde(default)]
    pub csrf_token: String,
}

impl CsrfField for UserSignupForm {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

impl CsrfField for UserLoginForm {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

impl CsrfField for LogoutForm {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}
