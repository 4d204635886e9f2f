//! HTML templates for the web interface
//!
//! Simple inline HTML templates without a template engine.

use axum::http::StatusCode;

use crate::forms::{FormErrors, LoginForm, RegisterForm};
use crate::session::Flash;

/// Common CSS styles for all pages
const COMMON_STYLES: &str = r#"
    body {
        font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
        max-width: 480px;
        margin: 40px auto;
        padding: 0 20px;
        background: #f5f5f5;
    }
    .container {
        background: white;
        padding: 30px;
        border-radius: 8px;
        box-shadow: 0 2px 4px rgba(0,0,0,0.1);
    }
    h1 {
        color: #333;
        border-bottom: 2px solid #0066cc;
        padding-bottom: 10px;
    }
    .form-group {
        margin: 15px 0;
    }
    label {
        display: block;
        font-weight: bold;
        margin-bottom: 5px;
        color: #333;
    }
    input[type="text"],
    input[type="email"],
    input[type="password"] {
        width: 100%;
        padding: 10px;
        border: 1px solid #ddd;
        border-radius: 4px;
        font-size: 14px;
        box-sizing: border-box;
    }
    button {
        background: #0066cc;
        color: white;
        padding: 10px 20px;
        border: none;
        border-radius: 4px;
        cursor: pointer;
        font-size: 14px;
        font-weight: bold;
    }
    .flash {
        padding: 10px;
        border-radius: 4px;
        margin: 10px 0;
    }
    .flash-success { color: #3c763d; background: #dff0d8; }
    .flash-info { color: #31708f; background: #d9edf7; }
    .flash-error, .error { color: #d9534f; background: #f2dede; }
    .field-error {
        color: #d9534f;
        font-size: 13px;
        margin-top: 4px;
    }
"#;

/// Escape text for use in HTML bodies and attribute values.
pub fn html_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Constellate - {title}</title>
    <style>{COMMON_STYLES}</style>
</head>
<body>
    <div class="container">
{body}
    </div>
</body>
</html>"#,
        title = html_escape(title),
    )
}

fn flashes_html(flashes: &[Flash]) -> String {
    flashes
        .iter()
        .map(|flash| {
            format!(
                r#"<div class="flash flash-{}">{}</div>"#,
                flash.level.as_str(),
                html_escape(&flash.message)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn form_errors_html(errors: &FormErrors) -> String {
    errors
        .form()
        .iter()
        .map(|message| format!(r#"<div class="error">{}</div>"#, html_escape(message)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn csrf_field(token: Option<&str>) -> String {
    token.map_or(String::new(), |t| {
        format!(r#"<input type="hidden" name="csrf_token" value="{}">"#, html_escape(t))
    })
}

/// One labelled input plus its error message, if any.
fn input_group(
    name: &str,
    label: &str,
    kind: &str,
    value: &str,
    placeholder: &str,
    errors: &FormErrors,
) -> String {
    let error_html = errors.field(name).map_or(String::new(), |e| {
        format!(r#"<div class="field-error">{}</div>"#, html_escape(e))
    });

    format!(
        r#"<div class="form-group">
    <label for="{name}">{label}</label>
    <input type="{kind}" id="{name}" name="{name}" value="{value}" placeholder="{placeholder}">
    {error_html}
</div>"#,
        value = html_escape(value),
        placeholder = html_escape(placeholder),
    )
}

/// Build `/login`, carrying a `next` target when there is one.
pub fn login_url(next: Option<&str>) -> String {
    match next {
        Some(next) => format!(
            "/login?{}",
            url::form_urlencoded::Serializer::new(String::new())
                .append_pair("next", next)
                .finish()
        ),
        None => "/login".to_string(),
    }
}

/// Render the login page
pub fn login_page(
    form: &LoginForm,
    errors: &FormErrors,
    flashes: &[Flash],
    csrf_token: Option<&str>,
    next: Option<&str>,
) -> String {
    let checked = if form.remember() { " checked" } else { "" };

    let body = format!(
        r#"        <h1>Login</h1>
{flashes}
{form_errors}
        <form method="post" action="{action}">
            {csrf}
            {username}
            {password}
            <div class="form-group">
                <label><input type="checkbox" name="remember_me" value="y"{checked}> Remember Me</label>
            </div>
            <button type="submit">Log In</button>
        </form>
        <p>No account yet? <a href="/register">Register</a></p>"#,
        flashes = flashes_html(flashes),
        form_errors = form_errors_html(errors),
        action = html_escape(&login_url(next)),
        csrf = csrf_field(csrf_token),
        username = input_group(
            "username",
            "Username",
            "text",
            &form.username,
            "Enter your username",
            errors
        ),
        password = input_group("password", "Password", "password", "", "Enter your password", errors),
    );

    layout("Login", &body)
}

/// Render the registration page
pub fn register_page(
    form: &RegisterForm,
    errors: &FormErrors,
    flashes: &[Flash],
    csrf_token: Option<&str>,
) -> String {
    let body = format!(
        r#"        <h1>Register</h1>
{flashes}
{form_errors}
        <form method="post" action="/register">
            {csrf}
            {username}
            {email}
            {password}
            {password2}
            <button type="submit">Register</button>
        </form>
        <p>Already registered? <a href="/login">Log in</a></p>"#,
        flashes = flashes_html(flashes),
        form_errors = form_errors_html(errors),
        csrf = csrf_field(csrf_token),
        username = input_group(
            "username",
            "Username",
            "text",
            &form.username,
            "Choose a username (3-80 characters)",
            errors
        ),
        email = input_group(
            "email",
            "Email (Optional)",
            "email",
            form.email.as_deref().unwrap_or_default(),
            "Enter your email (optional)",
            errors
        ),
        password = input_group(
            "password",
            "Password",
            "password",
            "",
            "Choose a password (min 6 characters)",
            errors
        ),
        password2 = input_group(
            "password2",
            "Confirm Password",
            "password",
            "",
            "Confirm your password",
            errors
        ),
    );

    layout("Register", &body)
}

/// Render the placeholder graph page
pub fn graph_page(username: &str, flashes: &[Flash]) -> String {
    let body = format!(
        r#"{flashes}
        <h1>Welcome, {username}!</h1><p>Graph view coming soon...</p>
        <p><a href="/logout">Log out</a></p>"#,
        flashes = flashes_html(flashes),
        username = html_escape(username),
    );

    layout("Graph", &body)
}

/// Render the page shown to anonymous callers of protected routes
pub fn unauthorized_page(next: &str) -> String {
    let body = format!(
        r#"        <h1>Unauthorized</h1>
        <p>Please log in to access this page.</p>
        <p><a href="{login}">Log in</a></p>"#,
        login = html_escape(&login_url(Some(next))),
    );

    layout("Unauthorized", &body)
}

/// Render a server error page, with the error text in debug mode
pub fn error_page(status: StatusCode, detail: Option<&str>) -> String {
    let detail_html = detail.map_or(String::new(), |d| {
        format!(r#"<pre class="error">{}</pre>"#, html_escape(d))
    });

    let body = format!(
        r#"        <h1>{status}</h1>
        <p>Something went wrong while handling your request.</p>
        {detail_html}"#,
        status = html_escape(&status.to_string()),
    );

    layout("Error", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FlashLevel;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_login_url_encodes_next() {
        assert_eq!(login_url(None), "/login");
        assert_eq!(login_url(Some("/graph")), "/login?next=%2Fgraph");
    }

    #[test]
    fn test_graph_page_escapes_username() {
        let html = graph_page("<b>mallory</b>", &[]);
        assert!(html.contains("Welcome, &lt;b&gt;mallory&lt;/b&gt;!"));
        assert!(!html.contains("<b>mallory</b>"));
    }

    #[test]
    fn test_register_page_keeps_values_but_not_passwords() {
        let form = RegisterForm {
            username: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            password: "secret1".to_string(),
            password2: "secret1".to_string(),
            csrf_token: None,
        };
        let mut errors = FormErrors::default();
        errors.add_field("username", "Username already exists. Please choose a different one.");
        let flashes = [Flash {
            level: FlashLevel::Error,
            message: "An error occurred".to_string(),
        }];

        let html = register_page(&form, &errors, &flashes, Some("tok"));

        assert!(html.contains(r#"value="alice""#));
        assert!(html.contains(r#"value="alice@example.com""#));
        assert!(!html.contains("secret1"));
        assert!(html.contains("Username already exists"));
        assert!(html.contains(r#"class="flash flash-error""#));
        assert!(html.contains(r#"name="csrf_token" value="tok""#));
    }

    #[test]
    fn test_error_page_detail_only_when_given() {
        let plain = error_page(StatusCode::INTERNAL_SERVER_ERROR, None);
        assert!(plain.contains("500 Internal Server Error"));
        assert!(!plain.contains("<pre"));

        let verbose = error_page(StatusCode::INTERNAL_SERVER_ERROR, Some("database error: boom"));
        assert!(verbose.contains("database error: boom"));
    }
}
