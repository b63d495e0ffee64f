//! Service configuration files under `META-INF/services/`.

use crate::descriptor::is_qualified_name;

pub const SERVICES_PREFIX: &str = "META-INF/services/";

/// Parse the provider class names listed in a service configuration file.
///
/// `#` starts a comment; blank lines are skipped; duplicates keep their
/// first position.
pub fn parse_providers(content: &[u8]) -> Result<Vec<String>, String> {
    let text = std::str::from_utf8(content)
        .map_err(|_| "service configuration file is not valid UTF-8".to_string())?;

    let mut providers: Vec<String> = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        if !is_qualified_name(line) {
            return Err(format!(
                "line {}: illegal provider-class name '{}'",
                index + 1,
                line
            ));
        }
        if !providers.iter().any(|p| p == line) {
            providers.push(line.to_string());
        }
    }
    Ok(providers)
}
