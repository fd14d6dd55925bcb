use clap::{Arg, Command};

pub const ARG_IDENTITY_URL: &str = "identity-url";
pub const ARG_IDENTITY_API_KEY: &str = "identity-api-key";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_IDENTITY_URL)
                .long(ARG_IDENTITY_URL)
                .help("Identity provider base URL, example: https://<project>.supabase.co")
                .env("LINKERY_IDENTITY_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_IDENTITY_API_KEY)
                .long(ARG_IDENTITY_API_KEY)
                .help("Identity provider public (anon) API key")
                .env("LINKERY_IDENTITY_API_KEY")
                .hide_env_values(true)
                .required(true),
        )
}
