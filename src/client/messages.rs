//! User-facing form messages (Russian locale) and provider error localization.

pub const EMAIL_REQUIRED: &str = "Email обязателен";
pub const EMAIL_INVALID: &str = "Введите корректный email";
pub const EMAIL_TOO_SHORT: &str = "Email слишком короткий";
pub const EMAIL_INCOMPLETE: &str = "Введите полный email адрес";

pub const PASSWORD_REQUIRED: &str = "Пароль обязателен";
pub const PASSWORD_TOO_SHORT: &str = "Пароль должен содержать минимум 6 символов";
pub const PASSWORD_NEEDS_LETTER: &str = "Пароль должен содержать хотя бы одну букву";
pub const PASSWORD_NEEDS_DIGIT: &str = "Пароль должен содержать хотя бы одну цифру";

pub const CONFIRM_REQUIRED: &str = "Подтверждение пароля обязательно";
pub const CONFIRM_MISMATCH: &str = "Пароли не совпадают";

pub const SIGN_IN_FAILED: &str = "Ошибка при входе";
pub const SIGN_UP_FAILED: &str = "Ошибка при регистрации";
pub const UNEXPECTED_ERROR: &str = "Произошла непредвиденная ошибка";
pub const SIGN_UP_SUCCEEDED: &str = "Регистрация прошла успешно. Проверьте email для подтверждения.";

pub const WRONG_CREDENTIALS: &str = "Неверный email или пароль";
pub const ALREADY_REGISTERED: &str = "Этот email уже зарегистрирован. Попробуйте войти.";
pub const INVALID_EMAIL_ADDRESS: &str =
    "Некорректный email адрес. Используйте реальный email (например, example@gmail.com)";

// Order matters: "invalid login credentials" also contains "invalid".
const TRANSLATIONS: [(&str, &str); 3] = [
    ("invalid login credentials", WRONG_CREDENTIALS),
    ("already registered", ALREADY_REGISTERED),
    ("invalid", INVALID_EMAIL_ADDRESS),
];

/// Localize a provider rejection message, falling back to `default` when the
/// provider sent nothing. Unknown messages are shown as-is.
#[must_use]
pub fn localize(message: &str, default: &str) -> String {
    let message = message.trim();
    if message.is_empty() {
        return default.to_string();
    }

    let lower = message.to_lowercase();
    TRANSLATIONS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map_or_else(|| message.to_string(), |(_, text)| (*text).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_provider_messages_are_translated() {
        assert_eq!(localize("Invalid login credentials", SIGN_IN_FAILED), WRONG_CREDENTIALS);
        assert_eq!(localize("User already registered", SIGN_UP_FAILED), ALREADY_REGISTERED);
        assert_eq!(
            localize("Unable to validate email address: invalid format", SIGN_UP_FAILED),
            INVALID_EMAIL_ADDRESS
        );
        assert_eq!(localize("Email address is INVALID", SIGN_UP_FAILED), INVALID_EMAIL_ADDRESS);
    }

    #[test]
    fn empty_message_uses_default() {
        assert_eq!(localize("", SIGN_IN_FAILED), SIGN_IN_FAILED);
        assert_eq!(localize("  ", SIGN_UP_FAILED), SIGN_UP_FAILED);
    }

    #[test]
    fn unknown_message_is_passed_through() {
        assert_eq!(
            localize("Email rate limit exceeded", SIGN_IN_FAILED),
            "Email rate limit exceeded"
        );
    }
}
