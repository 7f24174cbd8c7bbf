use maud::{DOCTYPE, Markup, html};

use super::TemplateData;

pub(super) fn base(title: &str, data: &TemplateData, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) " - Snippetbox" }
                link rel="stylesheet" href="/static/css/main.css";
            }
            body {
                header {
                    h1 { a href="/" { "Snippetbox" } }
                }
                (nav(data))
                main {
                    @if let Some(flash) = &data.flash {
                        div.flash { (flash) }
                    }
                    (content)
                }
                footer { "Powered by Rust in " (data.current_year) }
                script src="/static/js/main.js" type="text/javascript" {}
            }
        }
    }
}

fn nav(data: &TemplateData) -> Markup {
    html! {
        nav {
            div {
                a href="/" { "Home" }
                @if data.authenticated {
                    a href="/snippet/create" { "Create snippet" }
                }
            }
            div {
                @if data.authenticated {
                    form action="/user/logout" method="POST" {
                        (csrf_field(data))
                        button { "Logout" }
                    }
                } @else {
                    a href="/user/signup" { "Signup" }
                    a href="/user/login" { "Login" }
                }
            }
        }
    }
}

pub(super) fn csrf_field(data: &TemplateData) -> Markup {
    html! {
        input type="hidden" name="csrf_token" value=(data.csrf_token);
    }
}

/// Joined messages for `field`, if any.
pub(super) fn field_error(data: &TemplateData, field: &str) -> Markup {
    html! {
        @if let Some(message) = data.errors.field_error(field) {
            label.error { (message) }
        }
    }
}
