//! Server-rendered pages.
//!
//! Pages are compiled `maud` templates registered by name in a
//! [`TemplateCache`] built once at startup. Each page pulls what it needs out
//! of a [`TemplateData`] bag and fails with a [`TemplateError`] when something
//! is missing, so a broken page surfaces as a 500 instead of half a document.

mod layout;
mod pages;

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use maud::Markup;
use thiserror::Error;

use crate::domain::Snippet;
use crate::dto::{SnippetCreateForm, UserLoginForm, UserSignupForm};
use crate::util::Validator;

pub const HOME_PAGE: &str = "home.html";
pub const VIEW_PAGE: &str = "view.html";
pub const CREATE_PAGE: &str = "create.html";
pub const SIGNUP_PAGE: &str = "signup.html";
pub const LOGIN_PAGE: &str = "login.html";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template {0:?} does not exist")]
    UnknownPage(String),
    #[error("template {page:?} requires {field}")]
    MissingData {
        page: &'static str,
        field: &'static str,
    },
}

/// Form values echoed back into a page.
#[derive(Debug, Clone)]
pub enum FormData {
    SnippetCreate(SnippetCreateForm),
    Signup(UserSignupForm),
    Login(UserLoginForm),
}

/// Everything a page may draw on. Built per request.
#[derive(Debug, Clone, Default)]
pub struct TemplateData {
    pub current_year: i32,
    pub snippet: Option<Snippet>,
    pub snippets: Vec<Snippet>,
    pub form: Option<FormData>,
    pub errors: Validator,
    pub flash: Option<String>,
    pub authenticated: bool,
    pub csrf_token: String,
}

impl TemplateData {
    pub fn with_form(mut self, form: FormData) -> Self {
        self.form = Some(form);
        self
    }

    pub fn with_errors(mut self, errors: Validator) -> Self {
        self.errors = errors;
        self
    }
}

type PageRenderer = fn(&TemplateData) -> Result<Markup, TemplateError>;

pub struct TemplateCache {
    pages: HashMap<&'static str, PageRenderer>,
}

impl TemplateCache {
    pub fn new() -> Self {
        let mut registry: HashMap<&'static str, PageRenderer> = HashMap::new();
        registry.insert(HOME_PAGE, pages::home);
        registry.insert(VIEW_PAGE, pages::view);
        registry.insert(CREATE_PAGE, pages::create);
        registry.insert(SIGNUP_PAGE, pages::signup);
        registry.insert(LOGIN_PAGE, pages::login);
        Self { pages: registry }
    }

    /// Renders `page` completely into a string; nothing is written to the
    /// client unless this succeeds.
    pub fn render(&self, page: &str, data: &TemplateData) -> Result<String, TemplateError> {
        let renderer = self
            .pages
            .get(page)
            .ok_or_else(|| TemplateError::UnknownPage(page.to_string()))?;
        Ok(renderer(data)?.into_string())
    }

    pub fn contains(&self, page: &str) -> bool {
        self.pages.contains_key(page)
    }
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// `17 Mar 2024 at 10:15`, always in UTC.
pub fn human_date<Tz: TimeZone>(t: &DateTime<Tz>) -> String {
    t.with_timezone(&Utc).format("%d %b %Y at %H:%M").to_string()
}
