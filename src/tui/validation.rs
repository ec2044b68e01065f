//! Input validation guard rails for flow steps.

use url::Url;

pub fn required(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("This field is required.".to_string());
    }
    Ok(())
}

pub fn site_name(value: &str) -> Result<(), String> {
    required(value)?;
    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err("Use lowercase letters, digits, '-' or '_' only.".to_string());
    }
    Ok(())
}

pub fn domain(value: &str) -> Result<(), String> {
    required(value)?;
    if value.chars().any(|c| c.is_whitespace()) {
        return Err("Domain must not contain whitespace.".to_string());
    }
    if !value.contains('.') {
        return Err("Domain must contain at least one dot.".to_string());
    }
    Ok(())
}

/// Repository URL; empty is allowed and means "start a fresh project".
/// Accepts https/ssh/git URLs and scp-like `git@host:path` shapes.
pub fn repo_url_optional(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }
    if let Some(rest) = value.strip_prefix("git@") {
        if rest.contains(':') && !rest.contains(char::is_whitespace) {
            return Ok(());
        }
        return Err("Expected git@host:path".to_string());
    }
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "https" | "http" | "ssh" | "git") => Ok(()),
        Ok(url) => Err(format!("Unsupported URL scheme: {}", url.scheme())),
        Err(_) => Err("Not a valid repository URL.".to_string()),
    }
}

/// Branch name; empty is allowed (the step's default fills it in).
pub fn branch_optional(value: &str) -> Result<(), String> {
    if value.chars().any(|c| c.is_whitespace()) {
        return Err("Branch name must not contain whitespace.".to_string());
    }
    Ok(())
}

/// Single word; empty is allowed (defaulted fields).
pub fn token_optional(value: &str) -> Result<(), String> {
    if value.chars().any(|c| c.is_whitespace()) {
        return Err("Must be a single word.".to_string());
    }
    Ok(())
}

pub fn db_identifier(value: &str) -> Result<(), String> {
    required(value)?;
    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err("Use lowercase letters, digits or '_' only.".to_string());
    }
    Ok(())
}

pub fn secret(value: &str) -> Result<(), String> {
    required(value)?;
    if value.chars().count() < 8 {
        return Err("Must be at least 8 characters.".to_string());
    }
    Ok(())
}

/// Digits only; empty is allowed (defaulted count fields).
pub fn count_optional(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err("Digits only.".to_string());
    }
    Ok(())
}

pub fn port(value: &str) -> Result<(), String> {
    required(value)?;
    match value.parse::<u32>() {
        Ok(n) if (1..=65535).contains(&n) => Ok(()),
        _ => Err("Expected a port between 1 and 65535.".to_string()),
    }
}
