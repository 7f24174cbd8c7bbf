use maud::{Markup, html};

use super::layout::{base, csrf_field, field_error};
use super::{
    CREATE_PAGE, FormData, LOGIN_PAGE, SIGNUP_PAGE, TemplateData, TemplateError, VIEW_PAGE,
    human_date,
};

pub(super) fn home(data: &TemplateData) -> Result<Markup, TemplateError> {
    let content = html! {
        h2 { "Latest Snippets" }
        @if data.snippets.is_empty() {
            p { "There's nothing to see here... yet!" }
        } @else {
            table {
                tr {
                    th { "Title" }
                    th { "Created" }
                    th { "ID" }
                }
                @for snippet in &data.snippets {
                    tr {
                        td { a href={ "/snippet/view/" (snippet.id) } { (snippet.title) } }
                        td { (human_date(&snippet.created)) }
                        td { "#" (snippet.id) }
                    }
                }
            }
        }
    };
    Ok(base("Home", data, content))
}

pub(super) fn view(data: &TemplateData) -> Result<Markup, TemplateError> {
    let snippet = data.snippet.as_ref().ok_or(TemplateError::MissingData {
        page: VIEW_PAGE,
        field: "snippet",
    })?;

    let content = html! {
        div.snippet {
            div.metadata {
                strong { (snippet.title) }
                span { "#" (snippet.id) }
            }
            pre { code { (snippet.content) } }
            div.metadata {
                time { "Created: " (human_date(&snippet.created)) }
                time { "Expires: " (human_date(&snippet.expires)) }
            }
        }
    };
    Ok(base(&format!("Snippet #{}", snippet.id), data, content))
}

pub(super) fn create(data: &TemplateData) -> Result<Markup, TemplateError> {
    let Some(FormData::SnippetCreate(form)) = &data.form else {
        return Err(TemplateError::MissingData {
            page: CREATE_PAGE,
            field: "snippet create form",
        });
    };

    let content = html! {
        form action="/snippet/create" method="POST" {
            (csrf_field(data))
            div {
                label { "Title:" }
                (field_error(data, "title"))
                input type="text" name="title" value=(form.title);
            }
            div {
                label { "Content:" }
                (field_error(data, "content"))
                textarea name="content" { (form.content) }
            }
            div {
                label { "Delete in:" }
                (field_error(data, "expires"))
                input type="radio" name="expires" value="365" checked[form.expires == 365];
                " One Year "
                input type="radio" name="expires" value="7" checked[form.expires == 7];
                " One Week "
                input type="radio" name="expires" value="1" checked[form.expires == 1];
                " One Day"
            }
            div {
                input type="submit" value="Publish snippet";
            }
        }
    };
    Ok(base("Create a New Snippet", data, content))
}

pub(super) fn signup(data: &TemplateData) -> Result<Markup, TemplateError> {
    let Some(FormData::Signup(form)) = &data.form else {
        return Err(TemplateError::MissingData {
            page: SIGNUP_PAGE,
            field: "signup form",
        });
    };

    let content = html! {
        form action="/user/signup" method="POST" novalidate {
            (csrf_field(data))
            div {
                label { "Name:" }
                (field_error(data, "name"))
                input type="text" name="name" value=(form.name);
            }
            div {
                label { "Email:" }
                (field_error(data, "email"))
                input type="email" name="email" value=(form.email);
            }
            div {
                label { "Password:" }
                (field_error(data, "password"))
                input type="password" name="password";
            }
            div {
                input type="submit" value="Signup";
            }
        }
    };
    Ok(base("Signup", data, content))
}

pub(super) fn login(data: &TemplateData) -> Result<Markup, TemplateError> {
    let Some(FormData::Login(form)) = &data.form else {
        return Err(TemplateError::MissingData {
            page: LOGIN_PAGE,
            field: "login form",
        });
    };

    let content = html! {
        form action="/user/login" method="POST" novalidate {
            (csrf_field(data))
            @for error in data.errors.non_field_errors() {
                div.error { (error) }
            }
            div {
                label { "Email:" }
                (field_error(data, "email"))
                input type="email" name="email" value=(form.email);
            }
            div {
                label { "Password:" }
                (field_error(data, "password"))
                input type="password" name="password";
            }
            div {
                input type="submit" value="Login";
            }
        }
    };
    Ok(base("Login", data, content))
}
