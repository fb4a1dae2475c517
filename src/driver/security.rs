//! TLS security plans.
//!
//! A [`SecurityPlan`] fixes, once per driver, how sockets to the server
//! are secured: whether TLS is required at all, which certificates are
//! trusted, whether hostnames are verified, and how certificate
//! revocation is treated. Plans are immutable and shared read-only across
//! every connection they secure.

use std::path::Path;

use native_tls::{Certificate, TlsConnector};
use tracing::debug;

use super::error::{DriverError, DriverResult};

/// How certificate revocation is checked during the TLS handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevocationCheckingStrategy {
    /// No revocation checking
    #[default]
    NoChecks,
    /// Check revocation when revocation data is available, continue
    /// otherwise (soft fail)
    VerifyIfPresent,
    /// Require a successful revocation check
    Strict,
}

impl RevocationCheckingStrategy {
    /// Whether the strategy requires any revocation checking at all.
    pub fn requires_revocation_checking(&self) -> bool {
        !matches!(self, RevocationCheckingStrategy::NoChecks)
    }
}

/// An immutable TLS trust configuration for outgoing connections.
#[derive(Debug, Clone)]
pub struct SecurityPlan {
    requires_encryption: bool,
    connector: Option<TlsConnector>,
    requires_hostname_verification: bool,
    revocation_strategy: RevocationCheckingStrategy,
}

impl SecurityPlan {
    /// Plain TCP: no TLS, no hostname verification, no revocation
    /// checking.
    pub fn insecure() -> Self {
        Self {
            requires_encryption: false,
            connector: None,
            requires_hostname_verification: false,
            revocation_strategy: RevocationCheckingStrategy::NoChecks,
        }
    }

    /// TLS trusting the platform's certificate store, with hostname
    /// verification.
    ///
    /// A platform without a usable trust store fails plan construction;
    /// there is no fallback.
    pub fn for_system_ca_signed_certificates(
        strategy: RevocationCheckingStrategy,
    ) -> DriverResult<Self> {
        let connector = build_connector(&[], true, strategy)?;
        Ok(Self {
            requires_encryption: true,
            connector: Some(connector),
            requires_hostname_verification: true,
            revocation_strategy: strategy,
        })
    }

    /// TLS trusting only the certificates in the given PEM files, used
    /// instead of (not in addition to) the platform store. Any unreadable
    /// or malformed file fails the whole plan.
    pub fn for_custom_ca_signed_certificates(
        cert_files: &[impl AsRef<Path>],
        strategy: RevocationCheckingStrategy,
    ) -> DriverResult<Self> {
        let certificates = load_certificates(cert_files)?;
        let connector = build_connector(&certificates, true, strategy)?;
        Ok(Self {
            requires_encryption: true,
            connector: Some(connector),
            requires_hostname_verification: true,
            revocation_strategy: strategy,
        })
    }

    /// TLS accepting every certificate and hostname. For explicitly
    /// insecure and test configurations only.
    pub fn for_all_certificates() -> DriverResult<Self> {
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(|e| DriverError::configuration(format!("TLS context setup failed: {}", e)))?;
        Ok(Self {
            requires_encryption: true,
            connector: Some(connector),
            requires_hostname_verification: false,
            revocation_strategy: RevocationCheckingStrategy::NoChecks,
        })
    }

    /// Whether connections under this plan must use TLS.
    pub fn requires_encryption(&self) -> bool {
        self.requires_encryption
    }

    /// The TLS connector, present iff encryption is required.
    pub fn connector(&self) -> Option<&TlsConnector> {
        self.connector.as_ref()
    }

    /// Whether the server certificate must match the hostname.
    pub fn requires_hostname_verification(&self) -> bool {
        self.requires_hostname_verification
    }

    /// The configured revocation-checking strategy.
    pub fn revocation_strategy(&self) -> RevocationCheckingStrategy {
        self.revocation_strategy
    }
}

fn load_certificates(cert_files: &[impl AsRef<Path>]) -> DriverResult<Vec<Certificate>> {
    let mut certificates = Vec::with_capacity(cert_files.len());
    for file in cert_files {
        let path = file.as_ref();
        let pem = std::fs::read(path).map_err(|e| {
            DriverError::configuration(format!(
                "cannot read certificate file {}: {}",
                path.display(),
                e
            ))
        })?;
        let certificate = Certificate::from_pem(&pem).map_err(|e| {
            DriverError::configuration(format!(
                "malformed certificate file {}: {}",
                path.display(),
                e
            ))
        })?;
        certificates.push(certificate);
    }
    Ok(certificates)
}

/// Build the TLS connector. Custom certificates replace the built-in
/// roots entirely. Revocation mechanics (OCSP transport, stapling) are
/// delegated to the platform verifier; the strategy is recorded on the
/// plan for the connection layer.
fn build_connector(
    custom_certificates: &[Certificate],
    verify_hostnames: bool,
    strategy: RevocationCheckingStrategy,
) -> DriverResult<TlsConnector> {
    let mut builder = TlsConnector::builder();

    if !custom_certificates.is_empty() {
        builder.disable_built_in_roots(true);
        for certificate in custom_certificates {
            builder.add_root_certificate(certificate.clone());
        }
    }
    builder.danger_accept_invalid_hostnames(!verify_hostnames);

    if strategy.requires_revocation_checking() {
        debug!(?strategy, "revocation checking delegated to platform verifier");
    }

    builder
        .build()
        .map_err(|e| DriverError::configuration(format!("TLS context setup failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn insecure_plan() {
        let plan = SecurityPlan::insecure();
        assert!(!plan.requires_encryption());
        assert!(plan.connector().is_none());
        assert!(!plan.requires_hostname_verification());
        assert_eq!(
            plan.revocation_strategy(),
            RevocationCheckingStrategy::NoChecks
        );
    }

    #[test]
    fn system_ca_plan_verifies_hostnames() {
        let plan =
            SecurityPlan::for_system_ca_signed_certificates(RevocationCheckingStrategy::NoChecks)
                .unwrap();
        assert!(plan.requires_encryption());
        assert!(plan.connector().is_some());
        assert!(plan.requires_hostname_verification());
    }

    #[test]
    fn trust_all_plan_skips_hostname_verification() {
        let plan = SecurityPlan::for_all_certificates().unwrap();
        assert!(plan.requires_encryption());
        assert!(plan.connector().is_some());
        assert!(!plan.requires_hostname_verification());
    }

    #[test]
    fn revocation_strategy_is_carried() {
        let plan =
            SecurityPlan::for_system_ca_signed_certificates(RevocationCheckingStrategy::Strict)
                .unwrap();
        assert_eq!(plan.revocation_strategy(), RevocationCheckingStrategy::Strict);
        assert!(plan.revocation_strategy().requires_revocation_checking());

        assert!(RevocationCheckingStrategy::VerifyIfPresent.requires_revocation_checking());
        assert!(!RevocationCheckingStrategy::NoChecks.requires_revocation_checking());
    }

    #[test]
    fn missing_certificate_file_fails_the_plan() {
        let err = SecurityPlan::for_custom_ca_signed_certificates(
            &["/nonexistent/ca.pem"],
            RevocationCheckingStrategy::NoChecks,
        )
        .unwrap_err();
        assert!(matches!(err, DriverError::Configuration(_)));
    }

    #[test]
    fn malformed_certificate_file_fails_the_plan() {
        let mut file = tempfile_path("not-a-cert.pem");
        writeln!(file.1, "this is not PEM data").unwrap();

        let err = SecurityPlan::for_custom_ca_signed_certificates(
            &[file.0.as_path()],
            RevocationCheckingStrategy::NoChecks,
        )
        .unwrap_err();
        assert!(matches!(err, DriverError::Configuration(_)));

        std::fs::remove_file(&file.0).ok();
    }

    fn tempfile_path(name: &str) -> (std::path::PathBuf, std::fs::File) {
        let path = std::env::temp_dir().join(format!("graphbolt-test-{}-{}", std::process::id(), name));
        let file = std::fs::File::create(&path).unwrap();
        (path, file)
    }
}
