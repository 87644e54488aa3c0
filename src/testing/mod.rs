// testing/mod.rs - in-memory stand-ins for the user store and billing provider
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::config::AppConfig;
use crate::database::models::{Profile, ProfileUpdate};
use crate::database::{DatabaseError, DatabaseManager};
use crate::roles::{Role, RoleSet};
use crate::services::{BillingError, BillingProvider, CanceledSubscription, Directory, PortalSession};
use crate::state::AppState;

/// A bare profile with a fresh id.
pub fn profile(email: &str, manager_id: Option<Uuid>) -> Profile {
    let now = Utc::now();
    Profile {
        id: Uuid::new_v4(),
        email: email.to_string(),
        full_name: None,
        manager_id,
        language: "en".to_string(),
        stripe_customer_id: None,
        stripe_subscription_id: None,
        subscription_status: None,
        created_at: now,
        updated_at: now,
    }
}

/// Directory kept in memory. Profiles come back in insertion order.
#[derive(Default)]
pub struct MemoryDirectory {
    profiles: Mutex<Vec<Profile>>,
    roles: Mutex<HashMap<Uuid, RoleSet>>,
    role_fetches: AtomicUsize,
    failing: AtomicBool,
    failing_writes: AtomicBool,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: Profile, roles: &[Role]) {
        self.roles
            .lock()
            .unwrap()
            .insert(profile.id, roles.iter().copied().collect());
        self.profiles.lock().unwrap().push(profile);
    }

    pub fn grant(&self, user_id: Uuid, role: Role) {
        self.roles.lock().unwrap().entry(user_id).or_default().insert(role);
    }

    /// How many times `roles_for` reached the store.
    pub fn role_fetches(&self) -> usize {
        self.role_fetches.load(Ordering::SeqCst)
    }

    /// Makes every subsequent call fail like a broken connection.
    pub fn fail_queries(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    /// Makes profile and role writes fail while reads keep working.
    pub fn fail_writes(&self, fail: bool) {
        self.failing_writes.store(fail, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<(), DatabaseError> {
        self.check()?;
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(DatabaseError::QueryError("read-only replica".to_string()));
        }
        Ok(())
    }

    fn check(&self) -> Result<(), DatabaseError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DatabaseError::QueryError("connection refused".to_string()));
        }
        Ok(())
    }

    fn select(&self, pred: impl Fn(&Profile) -> bool) -> Vec<Profile> {
        self.profiles.lock().unwrap().iter().filter(|p| pred(p)).cloned().collect()
    }

    fn modify(&self, id: Uuid, change: impl FnOnce(&mut Profile)) -> Result<Profile, DatabaseError> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| DatabaseError::NotFound(format!("profile {}", id)))?;
        change(profile);
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    fn role_set(&self, user_id: Uuid) -> RoleSet {
        self.roles.lock().unwrap().get(&user_id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn profile(&self, id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        self.check()?;
        Ok(self.select(|p| p.id == id).into_iter().next())
    }

    async fn profiles(&self) -> Result<Vec<Profile>, DatabaseError> {
        self.check()?;
        Ok(self.select(|_| true))
    }

    async fn profiles_managed_by(&self, manager_id: Uuid) -> Result<Vec<Profile>, DatabaseError> {
        self.check()?;
        Ok(self.select(|p| p.manager_id == Some(manager_id)))
    }

    async fn profiles_managed_by_any(&self, manager_ids: &[Uuid]) -> Result<Vec<Profile>, DatabaseError> {
        self.check()?;
        Ok(self.select(|p| p.manager_id.is_some_and(|m| manager_ids.contains(&m))))
    }

    async fn sub_managers_of(&self, manager_id: Uuid) -> Result<Vec<Profile>, DatabaseError> {
        self.check()?;
        let reports = self.select(|p| p.manager_id == Some(manager_id));
        Ok(reports
            .into_iter()
            .filter(|p| self.role_set(p.id).has_manager_role())
            .collect())
    }

    async fn profile_by_subscription(&self, subscription_id: &str) -> Result<Option<Profile>, DatabaseError> {
        self.check()?;
        Ok(self
            .select(|p| p.stripe_subscription_id.as_deref() == Some(subscription_id))
            .into_iter()
            .next())
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Profile, DatabaseError> {
        self.check_write()?;
        self.modify(id, |p| {
            if let Some(name) = &update.full_name {
                p.full_name = Some(name.clone());
            }
            if let Some(language) = update.language {
                p.language = language.as_str().to_string();
            }
        })
    }

    async fn set_manager(&self, id: Uuid, manager_id: Option<Uuid>) -> Result<Profile, DatabaseError> {
        self.check_write()?;
        self.modify(id, |p| p.manager_id = manager_id)
    }

    async fn set_subscription_status(&self, id: Uuid, status: Option<&str>) -> Result<(), DatabaseError> {
        self.check_write()?;
        self.modify(id, |p| p.subscription_status = status.map(str::to_string))?;
        Ok(())
    }

    async fn roles_for(&self, user_id: Uuid) -> Result<Vec<Role>, DatabaseError> {
        self.check()?;
        self.role_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.role_set(user_id).iter().collect())
    }

    async fn grant_role(&self, user_id: Uuid, role: Role) -> Result<bool, DatabaseError> {
        self.check_write()?;
        Ok(self.roles.lock().unwrap().entry(user_id).or_default().insert(role))
    }

    async fn revoke_role(&self, user_id: Uuid, role: Role) -> Result<bool, DatabaseError> {
        self.check_write()?;
        Ok(self
            .roles
            .lock()
            .unwrap()
            .get_mut(&user_id)
            .is_some_and(|roles| roles.remove(role)))
    }
}

/// Records every billing call and answers with canned values.
pub struct MockBilling {
    pub portal_url: String,
    pub cancel_status: String,
    pub portal_calls: Mutex<Vec<(String, String)>>,
    pub cancel_calls: Mutex<Vec<String>>,
}

impl Default for MockBilling {
    fn default() -> Self {
        Self {
            portal_url: "https://billing.example.test/session/abc".to_string(),
            cancel_status: "canceled".to_string(),
            portal_calls: Mutex::new(Vec::new()),
            cancel_calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockBilling {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn portal_calls(&self) -> Vec<(String, String)> {
        self.portal_calls.lock().unwrap().clone()
    }

    pub fn cancel_calls(&self) -> Vec<String> {
        self.cancel_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BillingProvider for MockBilling {
    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Result<PortalSession, BillingError> {
        self.portal_calls
            .lock()
            .unwrap()
            .push((customer_id.to_string(), return_url.to_string()));
        Ok(PortalSession {
            id: "bps_test".to_string(),
            url: self.portal_url.clone(),
        })
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> Result<CanceledSubscription, BillingError> {
        self.cancel_calls.lock().unwrap().push(subscription_id.to_string());
        Ok(CanceledSubscription {
            id: subscription_id.to_string(),
            status: self.cancel_status.clone(),
        })
    }
}

/// App state over the given fakes. The pool is lazy and never touched by
/// routes that only read the directory. Must be called inside a runtime.
pub fn test_state(directory: Arc<MemoryDirectory>, billing: Arc<MockBilling>) -> AppState {
    let config = AppConfig::for_tests();
    let db = DatabaseManager::connect_lazy(&config.database).expect("lazy pool");
    AppState::new(config, db, billing).with_directory(directory)
}

/// `Authorization` header value for `user_id`, signed with the test secret.
pub fn bearer(user_id: Uuid) -> String {
    let config = AppConfig::for_tests();
    let claims = Claims::new(user_id, None, 1);
    let token = generate_jwt(&claims, &config.security.jwt_secret).expect("sign test token");
    format!("Bearer {}", token)
}
