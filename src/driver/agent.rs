//! Driver identification sent during the connection handshake.

use std::collections::HashMap;

use crate::bolt::PackStreamValue;

/// Immutable record identifying this driver build to the server. Built
/// once per driver from compile-time environment data and attached to
/// HELLO as the `bolt_agent` metadata map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoltAgent {
    /// Product identifier, e.g. "graphbolt-driver/0.1.0"
    pub product: String,
    /// Host platform, semicolon-joined OS, architecture and family
    pub platform: String,
    /// Implementation language
    pub language: String,
    /// Language toolchain details, when known
    pub language_details: Option<String>,
}

impl BoltAgent {
    /// Build the agent record for the given driver version.
    pub fn of(driver_version: &str) -> Self {
        let platform = [
            std::env::consts::OS,
            std::env::consts::ARCH,
            std::env::consts::FAMILY,
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("; ");

        let language = match option_env!("CARGO_PKG_RUST_VERSION") {
            Some(rust_version) if !rust_version.is_empty() => format!("Rust/{}", rust_version),
            _ => "Rust".to_string(),
        };

        Self {
            product: format!("graphbolt-driver/{}", driver_version),
            platform,
            language,
            language_details: None,
        }
    }

    /// Convert to the HELLO `bolt_agent` metadata map. Absent fields are
    /// omitted rather than sent empty.
    pub fn to_map(&self) -> HashMap<String, PackStreamValue> {
        let mut map = HashMap::new();
        map.insert(
            "product".to_string(),
            PackStreamValue::String(self.product.clone()),
        );
        if !self.platform.is_empty() {
            map.insert(
                "platform".to_string(),
                PackStreamValue::String(self.platform.clone()),
            );
        }
        map.insert(
            "language".to_string(),
            PackStreamValue::String(self.language.clone()),
        );
        if let Some(ref details) = self.language_details {
            map.insert(
                "language_details".to_string(),
                PackStreamValue::String(details.clone()),
            );
        }
        map
    }
}

impl Default for BoltAgent {
    fn default() -> Self {
        Self::of(env!("CARGO_PKG_VERSION"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_carries_driver_version() {
        let agent = BoltAgent::of("1.2.3");
        assert_eq!(agent.product, "graphbolt-driver/1.2.3");
    }

    #[test]
    fn platform_is_semicolon_joined() {
        let agent = BoltAgent::default();
        assert!(agent.platform.contains(std::env::consts::OS));
        assert!(agent.platform.contains(std::env::consts::ARCH));
        assert!(agent.platform.contains("; "));
    }

    #[test]
    fn language_names_rust() {
        let agent = BoltAgent::default();
        assert!(agent.language.starts_with("Rust"));
    }

    #[test]
    fn map_form_omits_absent_fields() {
        let agent = BoltAgent::of("0.1.0");
        let map = agent.to_map();
        assert_eq!(
            map.get("product").unwrap().as_str(),
            Some("graphbolt-driver/0.1.0")
        );
        assert!(map.contains_key("platform"));
        assert!(map.contains_key("language"));
        assert!(!map.contains_key("language_details"));
    }
}
