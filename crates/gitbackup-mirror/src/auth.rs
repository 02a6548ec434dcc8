//! Transport authentication.
//!
//! Credentials are handed to gix as process-local configuration overrides
//! when a mirror is opened; nothing is written to the mirror's config file.

use gitbackup_core::Credentials;
use tracing::warn;

/// Identity used for ref updates made by git-backup.
const IDENTITY_OVERRIDES: [&str; 2] = ["user.name=git-backup", "user.email=git-backup@localhost"];

/// Returns the configuration overrides for opening a mirror of `url`.
pub fn config_overrides(credentials: &Credentials, url: &str) -> Vec<String> {
    let mut overrides: Vec<String> = IDENTITY_OVERRIDES.iter().map(|s| s.to_string()).collect();

    match credentials {
        Credentials::None => {},
        Credentials::SshKey { private_key } => {
            overrides.push(format!(
                "core.sshCommand=ssh -i {} -o IdentitiesOnly=yes",
                shell_quote(&private_key.to_string_lossy())
            ));
        },
        Credentials::Token {
            host,
            username,
            token,
        } => {
            if !is_https_on_host(url, host) {
                warn!(
                    "Token for {} will not be offered to non-matching URL {}",
                    host, url
                );
            }
            let key = format!("credential.https://{}.helper", host);
            overrides.push(format!("{}=", key));
            overrides.push(format!(
                "{}=!f() {{ echo username={}; echo password={}; }}; f",
                key,
                shell_quote(username),
                shell_quote(token)
            ));
        },
    }

    overrides
}

/// Returns true if `url` is an HTTPS URL on exactly `host`.
pub fn is_https_on_host(url: &str, host: &str) -> bool {
    match gix::url::parse(url.into()) {
        Ok(parsed) => parsed.scheme == gix::url::Scheme::Https && parsed.host() == Some(host),
        Err(_) => false,
    }
}

/// Quotes `value` for a POSIX shell.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
