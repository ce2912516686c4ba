use std::env;
use std::str::FromStr;
use tracing::warn;

/// Returns the variable's value, or `default` when it is unset or blank.
pub fn get_env_var_or(var: &str, default: &str) -> String {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => default.to_string(),
    }
}

/// Returns the variable's value when it is set and not blank.
pub fn get_optional_env_var(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parses the variable, falling back to `default` when it is unset or does not parse.
pub fn get_env_var_parsed<T: FromStr>(var: &str, default: T) -> T {
    match get_optional_env_var(var) {
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!("Ignoring unparseable value {:?} for {}", value, var);
            default
        }),
        None => default,
    }
}
