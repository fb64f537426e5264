use std::borrow::Cow;

use regex::{Captures, Regex};

/// Replaces `${VAR}` and `${VAR:-default}` tokens with environment values.
///
/// A variable that is unset or empty falls back to its default. Tokens
/// without a default whose variable is unset are kept as-is.
pub fn substitute(src: &str) -> String {
    let regex = match Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}") {
        Ok(regex) => regex,
        Err(err) => {
            log::error!("{}", err);
            return src.to_string();
        }
    };

    let substituted: Cow<str> = regex.replace_all(src, |caps: &Captures| {
        let env_key = &caps[1];
        match std::env::var(env_key) {
            Ok(env_value) if !env_value.is_empty() => env_value,
            _ => match caps.get(2) {
                Some(default_value) => default_value.as_str().to_string(),
                None => caps[0].to_string(),
            },
        }
    });

    substituted.into_owned()
}

/// Returns whether the value still carries an unresolved `${...}` token
pub fn is_unresolved(value: &str) -> bool {
    value.contains("${")
}
