// Credentials interactor - Show, set and validate stored platform credentials

use std::sync::Arc;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::CredentialMasking;
use crate::engine::AdapterRegistry;
use crate::ports::*;

/// Interactor for managing stored credentials
pub struct CredentialsInteractor {
    credential_store: Arc<dyn CredentialStorePort>,
    registry: AdapterRegistry,
    log_port: Arc<dyn LogPort>,
}

impl CredentialsInteractor {
    pub fn new(
        credential_store: Arc<dyn CredentialStorePort>,
        registry: AdapterRegistry,
        log_port: Arc<dyn LogPort>,
    ) -> Self {
        Self {
            credential_store,
            registry,
            log_port,
        }
    }

    /// Location of the credential file
    pub fn store_path(&self) -> String {
        self.credential_store.store_path()
    }

    /// Every stored blob with secret values masked
    pub async fn show(&self) -> Result<CredentialMap, DomainError> {
        let credentials = self.credential_store.load_all().await?;
        Ok(credentials
            .into_iter()
            .map(|(platform, blob)| (platform, CredentialMasking::masked(&blob)))
            .collect())
    }

    /// Replace the credentials of a supported platform
    pub async fn set(&self, platform: &str, credentials: CredentialBlob) -> Result<(), DomainError> {
        let platform = self.supported(platform)?;
        self.credential_store
            .set_platform_credentials(&platform, credentials)
            .await?;
        self.log_port
            .info(&format!(
                "Saved {} credentials to {}",
                platform,
                self.credential_store.store_path()
            ))
            .await;
        Ok(())
    }

    /// Check stored credentials locally, for one platform or all supported ones
    pub async fn validate(
        &self,
        platform: Option<&str>,
    ) -> Result<Vec<(PlatformId, CredentialCheck)>, DomainError> {
        let platforms = match platform {
            Some(name) => vec![self.supported(name)?],
            None => self.registry.platforms().cloned().collect(),
        };

        let stored = self.credential_store.load_all().await?;
        let mut checks = Vec::with_capacity(platforms.len());
        for platform in platforms {
            let Some(adapter) = self.registry.get(&platform) else {
                continue;
            };
            let blob = stored.get(&platform).cloned().unwrap_or_default();
            let check = adapter.validate_credentials(&blob);
            if !check.valid {
                self.log_port
                    .warn(&format!("{} credentials invalid: {}", platform, check.message))
                    .await;
            }
            checks.push((platform, check));
        }
        Ok(checks)
    }

    fn supported(&self, name: &str) -> Result<PlatformId, DomainError> {
        let platform = PlatformId::parse(name)?;
        if !self.registry.contains(&platform) {
            return Err(DomainError::UnknownPlatform(name.to_string()));
        }
        Ok(platform)
    }
}
