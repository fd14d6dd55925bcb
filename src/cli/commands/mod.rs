use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub mod identity;
pub mod logging;

pub const ARG_PORT: &str = "port";
pub const ARG_PUBLIC_URL: &str = "public-url";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("linkery")
        .about("Session-gated web front")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("LINKERY_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_PUBLIC_URL)
                .long(ARG_PUBLIC_URL)
                .help("Public base URL of the site, session cookies are Secure when it is https")
                .default_value("http://localhost:8080")
                .env("LINKERY_PUBLIC_URL"),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session cookie lifetime in seconds")
                .default_value("604800")
                .env("LINKERY_SESSION_TTL_SECONDS")
                .value_parser(clap::value_parser!(u64)),
        );

    let command = identity::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENV_VARS: [&str; 6] = [
        "LINKERY_PORT",
        "LINKERY_PUBLIC_URL",
        "LINKERY_SESSION_TTL_SECONDS",
        "LINKERY_IDENTITY_URL",
        "LINKERY_IDENTITY_API_KEY",
        "LINKERY_LOG_LEVEL",
    ];

    fn without_env<F: FnOnce()>(f: F) {
        temp_env::with_vars(ENV_VARS.map(|name| (name, None::<&str>)), f);
    }

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "linkery");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Session-gated web front".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_defaults() {
        without_env(|| {
            let matches = new().get_matches_from(vec![
                "linkery",
                "--identity-url",
                "https://auth.linkery.dev",
                "--identity-api-key",
                "anon-key",
            ]);
            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(8080));
            assert_eq!(
                matches.get_one::<String>(ARG_PUBLIC_URL).cloned(),
                Some("http://localhost:8080".to_string())
            );
            assert_eq!(
                matches.get_one::<u64>(ARG_SESSION_TTL_SECONDS).copied(),
                Some(604_800)
            );
            assert_eq!(matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(), Some(0));
        });
    }

    #[test]
    fn test_identity_args_are_required() {
        without_env(|| {
            let result = new().try_get_matches_from(vec!["linkery"]);
            assert!(result.is_err());

            let result = new().try_get_matches_from(vec![
                "linkery",
                "--identity-url",
                "https://auth.linkery.dev",
            ]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("LINKERY_PORT", Some("443")),
                ("LINKERY_PUBLIC_URL", Some("https://linkery.dev")),
                ("LINKERY_SESSION_TTL_SECONDS", Some("3600")),
                ("LINKERY_IDENTITY_URL", Some("https://auth.linkery.dev")),
                ("LINKERY_IDENTITY_API_KEY", Some("anon-key")),
                ("LINKERY_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec!["linkery"]);
                assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(443));
                assert_eq!(
                    matches.get_one::<String>(ARG_PUBLIC_URL).cloned(),
                    Some("https://linkery.dev".to_string())
                );
                assert_eq!(
                    matches.get_one::<u64>(ARG_SESSION_TTL_SECONDS).copied(),
                    Some(3600)
                );
                assert_eq!(
                    matches
                        .get_one::<String>(identity::ARG_IDENTITY_URL)
                        .cloned(),
                    Some("https://auth.linkery.dev".to_string())
                );
                assert_eq!(
                    matches
                        .get_one::<String>(identity::ARG_IDENTITY_API_KEY)
                        .cloned(),
                    Some("anon-key".to_string())
                );
                assert_eq!(matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("LINKERY_LOG_LEVEL", Some(level)),
                    ("LINKERY_IDENTITY_URL", Some("https://auth.linkery.dev")),
                    ("LINKERY_IDENTITY_API_KEY", Some("anon-key")),
                ],
                || {
                    let matches = new().get_matches_from(vec!["linkery"]);
                    assert_eq!(
                        matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                        u8::try_from(index).ok()
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_flags() {
        for count in 1..=4_u8 {
            without_env(|| {
                let flag = format!("-{}", "v".repeat(usize::from(count)));
                let matches = new().get_matches_from(vec![
                    "linkery".to_string(),
                    "--identity-url".to_string(),
                    "https://auth.linkery.dev".to_string(),
                    "--identity-api-key".to_string(),
                    "anon-key".to_string(),
                    flag,
                ]);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(count)
                );
            });
        }
    }

    #[test]
    fn test_invalid_log_level_from_env() {
        let vars = ENV_VARS.map(|name| (name, (name == "LINKERY_LOG_LEVEL").then_some("loud")));
        temp_env::with_vars(vars, || {
            let result = new().try_get_matches_from([
                "linkery",
                "--identity-url",
                "https://auth.linkery.dev",
                "--identity-api-key",
                "anon-key",
            ]);
            assert!(result.is_err());
        });
    }
}
