use super::*;

/// # Safety
/// Only `from_env_scenarios` touches the `SUPABASE_*` variables, so no other
/// test in this crate races with it.
unsafe fn clear_supabase_env() {
    unsafe {
        std::env::remove_var("SUPABASE_URL");
        std::env::remove_var("SUPABASE_ANON_KEY");
        std::env::remove_var("SUPABASE_PROFILE_BUCKET");
        std::env::remove_var("SUPABASE_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("SUPABASE_CONNECT_TIMEOUT_SECS");
    }
}

#[test]
fn from_env_scenarios() {
    unsafe { clear_supabase_env() };
    let err = SupabaseConfig::from_env().unwrap_err();
    assert!(matches!(err, BackendError::MissingConfig { ref var } if var == "SUPABASE_URL"));

    unsafe { std::env::set_var("SUPABASE_URL", "https://abc.supabase.co/") };
    let err = SupabaseConfig::from_env().unwrap_err();
    assert!(matches!(err, BackendError::MissingConfig { ref var } if var == "SUPABASE_ANON_KEY"));

    unsafe { std::env::set_var("SUPABASE_ANON_KEY", "anon") };
    let cfg = SupabaseConfig::from_env().unwrap();
    assert_eq!(cfg.url, "https://abc.supabase.co");
    assert_eq!(cfg.anon_key, "anon");
    assert_eq!(cfg.profile_bucket, DEFAULT_PROFILE_BUCKET);
    assert_eq!(cfg.timeouts, HttpTimeouts::default());

    unsafe {
        std::env::set_var("SUPABASE_PROFILE_BUCKET", "avatars");
        std::env::set_var("SUPABASE_REQUEST_TIMEOUT_SECS", "5");
        std::env::set_var("SUPABASE_CONNECT_TIMEOUT_SECS", "not-a-number");
    }
    let cfg = SupabaseConfig::from_env().unwrap();
    assert_eq!(cfg.profile_bucket, "avatars");
    assert_eq!(cfg.timeouts, HttpTimeouts { request_secs: 5, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS });

    unsafe { clear_supabase_env() };
}

#[test]
fn new_rejects_non_http_url() {
    let err = SupabaseConfig::new("ftp://x", "k".into(), "profiles".into(), HttpTimeouts::default()).unwrap_err();
    assert!(err.to_string().contains("must be http(s)"));
}

#[test]
fn new_trims_trailing_slashes() {
    let cfg = SupabaseConfig::new(" http://localhost:54321// ", "k".into(), "profiles".into(), HttpTimeouts::default())
        .unwrap();
    assert_eq!(cfg.url, "http://localhost:54321");
}
