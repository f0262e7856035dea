use auth::{DemoAuth, SessionStorage, DEMO_PASSWORD, TOKEN_KEY, USER_KEY};
use storage::Storage;

fn local_url(dir: &tempfile::TempDir) -> String {
    let path = dir.path().join("local.db");
    format!("sqlite://{}", path.to_string_lossy().replace('\\', "/"))
}

#[tokio::test]
async fn remembered_sign_in_survives_reopening_local_storage() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = local_url(&dir);

    {
        let local = Storage::new(&url).await.expect("local");
        let session = Storage::in_memory().await.expect("session");
        let mut auth = DemoAuth::new(local, session);
        auth.login("admin@riahisolutions.com", DEMO_PASSWORD, true)
            .await
            .expect("login");
    }

    let local = Storage::new(&url).await.expect("reopen local");
    assert!(local.get_item(TOKEN_KEY).await.expect("token").is_some());
    let session = Storage::in_memory().await.expect("fresh session");
    let mut auth = DemoAuth::new(local, session);
    let restored = auth.restore().await.expect("restore").expect("user");
    assert_eq!(restored.email, "admin@riahisolutions.com");
    assert!(auth.is_authenticated());
}

#[tokio::test]
async fn session_only_sign_in_is_lost_with_the_process() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = local_url(&dir);

    {
        let local = Storage::new(&url).await.expect("local");
        let session = Storage::in_memory().await.expect("session");
        let mut auth = DemoAuth::new(local.clone(), session.clone());
        auth.login("sarah.benali@riahisolutions.com", DEMO_PASSWORD, false)
            .await
            .expect("login");
        assert!(session.get_item(USER_KEY).await.expect("user").is_some());
        assert!(local.get_item(USER_KEY).await.expect("user").is_none());
    }

    let local = Storage::new(&url).await.expect("reopen local");
    let session = Storage::in_memory().await.expect("fresh session");
    let mut auth = DemoAuth::new(local, session);
    assert!(auth.restore().await.expect("restore").is_none());
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn logout_clears_persisted_credentials() {
    let dir = tempfile::tempdir().expect("tempdir");
    let local = Storage::new(&local_url(&dir)).await.expect("local");
    let session = Storage::in_memory().await.expect("session");
    let mut auth = DemoAuth::new(local.clone(), session);

    auth.login("admin@riahisolutions.com", DEMO_PASSWORD, true)
        .await
        .expect("login");
    auth.logout().await.expect("logout");

    assert!(local.keys().await.expect("keys").is_empty());
    assert!(auth.current_user().is_none());
}
