use uuid::Uuid;

use super::*;
use crate::net::fake::{FakeBackend, PanickingBackend, profile};

fn router_for(fake: FakeBackend) -> (Arc<FakeBackend>, AppRouter) {
    let fake = Arc::new(fake);
    let session = Arc::new(SessionStore::new(fake.clone()));
    (fake, AppRouter::new(session))
}

fn complete_user() -> FakeBackend {
    FakeBackend::signed_in(profile(Uuid::nil(), Some("ann"), Some("Ann Lee"), None), Some("ann@example.com"))
}

fn incomplete_user() -> FakeBackend {
    FakeBackend::signed_in(profile(Uuid::nil(), None, Some("Ann Lee"), None), Some("ann@example.com"))
}

// =============================================================================
// Route
// =============================================================================

#[test]
fn parse_known_routes() {
    assert_eq!(Route::parse("/"), Route::Home);
    assert_eq!(Route::parse(""), Route::Home);
    assert_eq!(Route::parse("/login"), Route::Login);
    assert_eq!(Route::parse("/register/"), Route::Register);
    assert_eq!(Route::parse("/forgot-password"), Route::ForgotPassword);
    assert_eq!(Route::parse("/update-password?token=x"), Route::UpdatePassword);
    assert_eq!(Route::parse("/complete-profile"), Route::CompleteProfile);
    assert_eq!(Route::parse("/about#team"), Route::About);
    assert_eq!(Route::parse("/posts/5"), Route::Post("5".into()));
    assert_eq!(Route::parse("/profile/abc-123"), Route::Profile("abc-123".into()));
}

#[test]
fn parse_unknown_routes() {
    assert_eq!(Route::parse("/posts"), Route::NotFound("/posts".into()));
    assert_eq!(Route::parse("/posts/5/edit"), Route::NotFound("/posts/5/edit".into()));
    assert_eq!(Route::parse("/settings"), Route::NotFound("/settings".into()));
    assert_eq!(Route::parse("login"), Route::NotFound("login".into()));
}

#[test]
fn path_round_trips_through_parse() {
    for route in [
        Route::Login,
        Route::Register,
        Route::ForgotPassword,
        Route::UpdatePassword,
        Route::CompleteProfile,
        Route::Home,
        Route::Post("9".into()),
        Route::Profile("u".into()),
        Route::About,
    ] {
        assert_eq!(Route::parse(&route.path()), route);
    }
}

#[test]
fn public_routes() {
    assert!(Route::Login.is_public());
    assert!(Route::Register.is_public());
    assert!(Route::ForgotPassword.is_public());
    assert!(!Route::UpdatePassword.is_public());
    assert!(!Route::Home.is_public());
}

// =============================================================================
// AppRouter::push
// =============================================================================

#[tokio::test]
async fn post_without_session_lands_on_login() {
    let (_fake, mut router) = router_for(FakeBackend::new());
    assert_eq!(router.push("/posts/5").await, Route::Login);
    assert_eq!(router.current(), Some(&Route::Login));
}

#[tokio::test]
async fn login_while_complete_lands_on_home() {
    let (_fake, mut router) = router_for(complete_user());
    assert_eq!(router.push("/login").await, Route::Home);
}

#[tokio::test]
async fn home_while_incomplete_lands_on_completion_form() {
    let (_fake, mut router) = router_for(incomplete_user());
    assert_eq!(router.push("/").await, Route::CompleteProfile);
}

#[tokio::test]
async fn login_while_incomplete_chains_to_completion_form() {
    let (_fake, mut router) = router_for(incomplete_user());
    assert_eq!(router.push("/login").await, Route::CompleteProfile);
}

#[tokio::test]
async fn completing_profile_unlocks_routes() {
    let (_fake, mut router) = router_for(incomplete_user());
    assert_eq!(router.push("/about").await, Route::CompleteProfile);
    router
        .session()
        .complete_profile("ann", "Ann Lee")
        .await
        .unwrap();
    assert_eq!(router.push("/about").await, Route::About);
    assert_eq!(router.push("/complete-profile").await, Route::Home);
}

#[tokio::test]
async fn unknown_route_is_guarded_like_any_other() {
    let (_fake, mut router) = router_for(complete_user());
    assert_eq!(router.push("/nope").await, Route::NotFound("/nope".into()));
    let (_fake, mut router) = router_for(FakeBackend::new());
    assert_eq!(router.push("/nope").await, Route::Login);
}

// =============================================================================
// AppRouter::logout
// =============================================================================

#[tokio::test]
async fn logout_navigates_to_login() {
    let (fake, mut router) = router_for(complete_user());
    router.push("/posts/1").await;
    assert_eq!(router.logout().await, Some(Route::Login));
    assert_eq!(fake.count("sign_out"), 1);
    assert!(router.session().current_identity().await.is_none());
}

#[tokio::test]
async fn failed_logout_stays_on_current_route() {
    let (fake, mut router) = router_for(complete_user());
    router.push("/posts/1").await;
    fake.fail("sign_out");
    assert_eq!(router.logout().await, Some(Route::Post("1".into())));
    assert!(router.session().current_identity().await.is_some());
}

#[tokio::test]
async fn panicking_guard_lands_on_login_after_bounded_redirects() {
    let session = Arc::new(SessionStore::new(Arc::new(PanickingBackend)));
    let mut router = AppRouter::new(session);
    assert_eq!(router.push("/posts/5").await, Route::Login);
    assert_eq!(router.current(), Some(&Route::Login));
    assert_eq!(router.push("/login").await, Route::Login);
}
