//! Minimal reader for the main section of `META-INF/MANIFEST.MF`.

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Manifest {
    main: Vec<(String, String)>,
}

impl Manifest {
    /// Parse the main section. Parsing stops at the first blank line; lines
    /// starting with a single space continue the previous value.
    pub fn parse(bytes: &[u8]) -> Result<Self, String> {
        let text = std::str::from_utf8(bytes).map_err(|_| "manifest is not valid UTF-8")?;
        let mut main: Vec<(String, String)> = Vec::new();

        for (index, line) in text.lines().enumerate() {
            if line.is_empty() {
                break;
            }
            if let Some(continued) = line.strip_prefix(' ') {
                let Some((_, value)) = main.last_mut() else {
                    return Err(format!("manifest line {}: continuation without header", index + 1));
                };
                value.push_str(continued);
                continue;
            }
            let Some((name, value)) = line.split_once(':') else {
                return Err(format!("manifest line {}: invalid header field", index + 1));
            };
            if name.is_empty() {
                return Err(format!("manifest line {}: empty header name", index + 1));
            }
            main.push((name.to_string(), value.trim_start().to_string()));
        }

        Ok(Self { main })
    }

    /// Look up a main attribute; names are case-insensitive.
    pub fn main_attribute(&self, name: &str) -> Option<&str> {
        self.main
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
