use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use super::*;

#[derive(Clone, Default)]
struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.lock().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.items.lock().await.remove(key);
        Ok(())
    }
}

fn service() -> (DemoAuth<MemoryStorage, MemoryStorage>, MemoryStorage, MemoryStorage) {
    let local = MemoryStorage::default();
    let session = MemoryStorage::default();
    (
        DemoAuth::new(local.clone(), session.clone()),
        local,
        session,
    )
}

#[tokio::test]
async fn rejects_unknown_email_and_wrong_password() {
    let (mut auth, local, session) = service();
    let err = auth
        .login("nobody@example.com", DEMO_PASSWORD, false)
        .await
        .expect_err("unknown email");
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert_eq!(err.to_string(), "incorrect email or password");

    let err = auth
        .login("admin@riahisolutions.com", "admin", true)
        .await
        .expect_err("wrong password");
    let api: ApiError = err.into();
    assert_eq!(api.code, ErrorCode::Unauthorized);

    assert!(!auth.is_authenticated());
    assert!(local.items.lock().await.is_empty());
    assert!(session.items.lock().await.is_empty());
}

#[tokio::test]
async fn login_without_remember_me_writes_session_storage() {
    let (mut auth, local, session) = service();
    let user = auth
        .login("  SARAH.BENALI@riahisolutions.com ", DEMO_PASSWORD, false)
        .await
        .expect("login");
    assert_eq!(user.first_name, "Sarah");
    assert!(user.last_login.is_some());
    assert!(auth.refresh_session());

    let token = session
        .get_item(TOKEN_KEY)
        .await
        .expect("get")
        .expect("token");
    assert!(token.starts_with("demo-token-"));
    assert!(session.get_item(USER_KEY).await.expect("get").is_some());
    assert!(local.items.lock().await.is_empty());

    let expires = auth.session_expires_at().expect("expiry");
    assert!(expires <= Utc::now() + Duration::minutes(SESSION_TTL_MINUTES));
}

#[tokio::test]
async fn remembered_login_is_restored_by_a_new_service() {
    let (mut auth, local, _session) = service();
    auth.login("admin@riahisolutions.com", DEMO_PASSWORD, true)
        .await
        .expect("login");
    let expires = auth.session_expires_at().expect("expiry");
    assert!(expires > Utc::now() + Duration::days(REMEMBER_ME_TTL_DAYS - 1));

    let mut restarted = DemoAuth::new(local.clone(), MemoryStorage::default());
    let restored = restarted.restore().await.expect("restore").expect("user");
    assert_eq!(restored.email, "admin@riahisolutions.com");
    assert_eq!(restarted.current_user(), Some(&restored));
    assert_eq!(restored.to_user().role, UserRole::Admin);
}

#[tokio::test]
async fn restore_without_token_stays_signed_out() {
    let (mut auth, local, _session) = service();
    local
        .set_item(USER_KEY, "{\"not\":\"complete\"}")
        .await
        .expect("set");
    assert!(auth.restore().await.expect("restore").is_none());
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn malformed_stored_user_is_discarded() {
    let (mut auth, local, _session) = service();
    local.set_item(USER_KEY, "{broken").await.expect("set");
    local.set_item(TOKEN_KEY, "demo-token-1").await.expect("set");

    assert!(auth.restore().await.expect("restore").is_none());
    assert!(local.get_item(USER_KEY).await.expect("get").is_none());
    assert!(local.get_item(TOKEN_KEY).await.expect("get").is_none());
}

#[tokio::test]
async fn logout_clears_both_storages() {
    let (mut auth, local, session) = service();
    auth.login("admin@riahisolutions.com", DEMO_PASSWORD, true)
        .await
        .expect("login");
    session.set_item(TOKEN_KEY, "stale").await.expect("set");

    auth.logout().await.expect("logout");
    assert!(!auth.is_authenticated());
    assert!(auth.session_expires_at().is_none());
    assert!(local.items.lock().await.is_empty());
    assert!(session.items.lock().await.is_empty());
}

#[test]
fn unknown_role_string_maps_to_standard() {
    let mut account = demo_accounts().remove(0);
    account.role = "auditor".into();
    let user = account.to_user();
    assert_eq!(user.role, UserRole::Standard);
    assert_eq!(user.display_name(), "Mohamed Aziz Riahi");
}
