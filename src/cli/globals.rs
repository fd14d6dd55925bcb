use secrecy::SecretString;

/// Identity provider settings shared by every action.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub identity_url: String,
    pub identity_api_key: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(identity_url: String) -> Self {
        Self {
            identity_url,
            identity_api_key: SecretString::default(),
        }
    }

    pub fn set_api_key(&mut self, api_key: SecretString) {
        self.identity_api_key = api_key;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let mut args = GlobalArgs::new("https://auth.linkery.dev".to_string());
        assert_eq!(args.identity_url, "https://auth.linkery.dev");
        assert_eq!(args.identity_api_key.expose_secret(), "");

        args.set_api_key(SecretString::from("anon-key".to_string()));
        assert_eq!(args.identity_api_key.expose_secret(), "anon-key");
        assert!(!format!("{args:?}").contains("anon-key"));
    }
}
