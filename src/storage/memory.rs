//! In-process credential store.
//!
//! Built once and never mutated, so lookups need no lock.

use super::{CredentialStore, StoreError};
use crate::models::AdminCredential;
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    credentials: HashMap<String, AdminCredential>,
}

impl MemoryCredentialStore {
    pub fn new(credentials: impl IntoIterator<Item = AdminCredential>) -> Self {
        Self {
            credentials: credentials
                .into_iter()
                .map(|c| (c.identifier.clone(), c))
                .collect(),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<AdminCredential>, StoreError> {
        Ok(self.credentials.get(identifier).cloned())
    }
}
