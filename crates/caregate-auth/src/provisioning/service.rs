//! Bulk user creation behind the access guard.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use caregate_core::types::CallerId;
use caregate_entity::user::Role;
use serde_json::Value;
use tracing::{info, warn};
use validator::Validate;

use crate::access::AccessGuard;
use crate::error::{AccessDenied, ProviderError};
use crate::password::PasswordValidator;
use crate::provider::UserProvisioner;
use crate::rate::RateToken;

use super::{NewUserRequest, ProvisionResult};

/// Creates users in bulk on behalf of an admin.
///
/// The whole batch is refused up front unless the caller passes the access
/// guard as an admin. Past that point every item succeeds or fails on its
/// own.
#[derive(Debug, Clone)]
pub struct ProvisioningService {
    guard: AccessGuard,
    provisioner: Arc<dyn UserProvisioner>,
    passwords: PasswordValidator,
    limit: NonZeroU32,
    call_timeout: Duration,
}

impl ProvisioningService {
    /// Creates the service. `limit` is the admin rate budget per interval.
    pub fn new(
        guard: AccessGuard,
        provisioner: Arc<dyn UserProvisioner>,
        passwords: PasswordValidator,
        limit: NonZeroU32,
        call_timeout: Duration,
    ) -> Self {
        Self {
            guard,
            provisioner,
            passwords,
            limit,
            call_timeout,
        }
    }

    /// Authorizes the caller, then provisions each item independently.
    pub async fn provision(
        &self,
        caller: &CallerId,
        rate_token: &RateToken,
        items: Vec<Value>,
    ) -> Result<Vec<ProvisionResult>, AccessDenied> {
        let admin = self
            .guard
            .authorize(caller, &[Role::Admin], None, rate_token, self.limit)?;

        let mut results = Vec::with_capacity(items.len());
        for item in items {
            results.push(self.provision_one(item).await);
        }

        let created = results.iter().filter(|r| r.success).count();
        info!(
            admin_id = %admin.user_id,
            total = results.len(),
            created,
            failed = results.len() - created,
            "Bulk provisioning completed"
        );
        Ok(results)
    }

    async fn provision_one(&self, item: Value) -> ProvisionResult {
        let email = item
            .get("email")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let request: NewUserRequest = match serde_json::from_value(item) {
            Ok(request) => request,
            Err(e) => return ProvisionResult::failed(email, format!("Malformed entry: {e}")),
        };
        if let Err(e) = request.validate() {
            return ProvisionResult::failed(email, format!("Validation failed: {e}"));
        }
        let role: Role = match request.role.parse() {
            Ok(role) => role,
            Err(e) => return ProvisionResult::failed(email, e.message),
        };
        if let Err(e) = self.passwords.validate(&request.password) {
            return ProvisionResult::failed(email, e.message);
        }

        let created = match tokio::time::timeout(
            self.call_timeout,
            self.provisioner
                .create_user(&request.email, &request.password, role),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Unavailable("provisioner timed out".to_string())),
        };

        match created {
            Ok(user_id) => {
                info!(user_id = %user_id, role = %role, "User provisioned");
                ProvisionResult::created(request.email)
            }
            Err(ProviderError::Rejected(reason)) => ProvisionResult::failed(request.email, reason),
            Err(e) => {
                warn!(error = %e, "Provisioner call failed");
                ProvisionResult::failed(request.email, "Identity provider unavailable")
            }
        }
    }
}
