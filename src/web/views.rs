//! Server-rendered HTML.

use crate::{
    client::{messages::SIGN_UP_SUCCEEDED, FormStatus, Theme},
    gate::{SIGN_IN_PATH, SIGN_UP_PATH},
    identity::Subject,
};
use std::{fmt::Write, time::Duration};

pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(theme: &Theme, title: &str, head: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ru">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
{head}<style>
body {{ font-family: {font}; max-width: 420px; margin: 40px auto; }}
button, .button {{ background: {primary}; color: white; border: 0; padding: 8px 16px; border-radius: 4px; }}
.alert-error {{ color: #c92a2a; }}
.alert-success {{ color: #2b8a3e; }}
.field-error {{ color: #c92a2a; font-size: small; }}
</style>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape(title),
        font = theme.font_family,
        primary = theme.primary_color,
    )
}

fn field_error(error: Option<&str>) -> String {
    error.map_or_else(String::new, |error| {
        format!(r#"<p class="field-error">{}</p>"#, escape(error))
    })
}

fn banners(status: &FormStatus) -> String {
    let mut out = String::new();
    if let Some(error) = &status.error {
        let _ = write!(
            out,
            r#"<div class="alert-error" role="alert"><strong>Ошибка</strong> {}</div>"#,
            escape(error)
        );
    }
    if status.success {
        let _ = write!(
            out,
            r#"<div class="alert-success" role="status"><strong>Успешно!</strong> {}</div>"#,
            escape(SIGN_UP_SUCCEEDED)
        );
    }
    out
}

pub(crate) fn home(theme: &Theme, user: Option<&Subject>) -> String {
    let body = match user {
        Some(user) => format!(
            r#"<h1>Linkery</h1>
<p>Вы вошли как {email}</p>
<a class="button" href="/dashboard">Панель управления</a>
<form method="post" action="/auth/signout"><button type="submit">Выйти</button></form>"#,
            email = escape(&user.email)
        ),
        None => format!(
            r#"<h1>Linkery</h1>
<a class="button" href="{SIGN_IN_PATH}">Войти</a>
<a href="{SIGN_UP_PATH}">Регистрация</a>"#
        ),
    };
    layout(theme, "Linkery", "", &body)
}

pub(crate) fn dashboard(theme: &Theme, user: &Subject) -> String {
    let body = format!(
        r#"<h1>Панель управления</h1>
<p>{email}</p>
<a href="/">На главную</a>"#,
        email = escape(&user.email)
    );
    layout(theme, "Панель управления", "", &body)
}

pub(crate) fn sign_in(theme: &Theme, status: &FormStatus) -> String {
    let body = format!(
        r#"<h1>Добро пожаловать!</h1>
<p>Нет аккаунта? <a href="{SIGN_UP_PATH}">Зарегистрируйтесь</a></p>
{banners}
<form method="post" action="{SIGN_IN_PATH}">
<label>Email <input type="email" name="email" placeholder="your@email.com" value="{email}" required></label>
{email_error}
<label>Пароль <input type="password" name="password" placeholder="Ваш пароль" required></label>
{password_error}
<button type="submit">Войти</button>
</form>"#,
        banners = banners(status),
        email = escape(&status.email),
        email_error = field_error(status.field_errors.email),
        password_error = field_error(status.field_errors.password),
    );
    layout(theme, "Вход", "", &body)
}

pub(crate) fn sign_up(
    theme: &Theme,
    status: &FormStatus,
    redirect_after: Option<Duration>,
) -> String {
    let head = redirect_after.map_or_else(String::new, |delay| {
        format!(
            "<meta http-equiv=\"refresh\" content=\"{};url={SIGN_IN_PATH}\">\n",
            delay.as_secs()
        )
    });
    let body = format!(
        r#"<h1>Регистрация</h1>
<p>Уже есть аккаунт? <a href="{SIGN_IN_PATH}">Войти</a></p>
{banners}
<form method="post" action="{SIGN_UP_PATH}">
<label>Email <input type="email" name="email" placeholder="your@email.com" value="{email}" required></label>
{email_error}
<label>Пароль <input type="password" name="password" placeholder="Ваш пароль" required></label>
<small>Минимум 6 символов, должен содержать буквы и цифры</small>
{password_error}
<label>Подтвердите пароль <input type="password" name="confirm_password" placeholder="Повторите пароль" required></label>
{confirm_error}
<button type="submit">Зарегистрироваться</button>
</form>"#,
        banners = banners(status),
        email = escape(&status.email),
        email_error = field_error(status.field_errors.email),
        password_error = field_error(status.field_errors.password),
        confirm_error = field_error(status.field_errors.confirm_password),
    );
    layout(theme, "Регистрация", &head, &body)
}

pub(crate) fn not_found(theme: &Theme) -> String {
    layout(
        theme,
        "Страница не найдена",
        "",
        r#"<h1>404</h1><a href="/">На главную</a>"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html() {
        assert_eq!(
            escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn layout_applies_theme() {
        let html = home(&Theme::default(), None);
        assert!(html.contains("font-family: var(--font-geist-sans)"));
        assert!(html.contains("background: blue"));
    }

    #[test]
    fn sign_up_success_refreshes_to_sign_in() {
        let status = FormStatus {
            success: true,
            ..FormStatus::default()
        };
        let html = sign_up(&Theme::default(), &status, Some(Duration::from_millis(3000)));
        assert!(html.contains(r#"content="3;url=/auth/signin""#));
        assert!(html.contains(SIGN_UP_SUCCEEDED));
    }

    #[test]
    fn user_input_is_escaped() {
        let status = FormStatus {
            email: "<script>".to_string(),
            error: Some("<b>".to_string()),
            ..FormStatus::default()
        };
        let html = sign_in(&Theme::default(), &status);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;b&gt;"));
    }
}
