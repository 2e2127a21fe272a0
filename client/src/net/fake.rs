//! In-memory `Backend` used by unit tests.
//!
//! Records every call by operation name so tests can assert on network
//! traffic, and can be told to fail any operation.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use uuid::Uuid;

use super::types::{AuthSession, AuthUser, FileUpload, NewProfile, ProfileRow, ProfileUpdate, SignUpResponse};
use super::{Backend, BackendError};

/// Default GoTrue password policy.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Default)]
pub struct FakeState {
    pub session: Option<AuthSession>,
    pub profiles: Vec<ProfileRow>,
    pub files: HashMap<String, Vec<u8>>,
    /// email -> (user id, password)
    pub accounts: HashMap<String, (Uuid, String)>,
    /// Operation names that return an error.
    pub failing: HashSet<&'static str>,
    /// Sign-up succeeds but returns no user.
    pub sign_up_without_user: bool,
    /// Per-file download latency, to shuffle completion order.
    pub download_delay_ms: HashMap<String, u64>,
}

#[derive(Default)]
pub struct FakeBackend {
    pub state: Mutex<FakeState>,
    calls: Mutex<Vec<&'static str>>,
}

#[must_use]
pub fn session_for(id: Uuid, email: Option<&str>) -> AuthSession {
    AuthSession {
        access_token: format!("token-{id}"),
        refresh_token: None,
        user: AuthUser { id, email: email.map(str::to_owned) },
    }
}

#[must_use]
pub fn profile(id: Uuid, username: Option<&str>, full_name: Option<&str>, picture: Option<&str>) -> ProfileRow {
    ProfileRow {
        id,
        username: username.map(str::to_owned),
        full_name: full_name.map(str::to_owned),
        profile_picture: picture.map(str::to_owned),
        email: None,
    }
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fake with an active session and matching profile row.
    #[must_use]
    pub fn signed_in(row: ProfileRow, email: Option<&str>) -> Self {
        let fake = Self::new();
        {
            let mut state = fake.state.lock().unwrap();
            state.session = Some(session_for(row.id, email));
            state.profiles.push(row);
        }
        fake
    }

    pub fn add_profile(&self, row: ProfileRow) {
        self.state.lock().unwrap().profiles.push(row);
    }

    pub fn add_file(&self, name: &str, bytes: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(name.to_owned(), bytes.to_vec());
    }

    pub fn fail(&self, op: &'static str) {
        self.state.lock().unwrap().failing.insert(op);
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn count(&self, op: &'static str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    fn record(&self, op: &'static str) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(op);
        if self.state.lock().unwrap().failing.contains(op) {
            return Err(BackendError::Api { status: 500, message: format!("{op} failed") });
        }
        Ok(())
    }
}

fn contains_ci(haystack: Option<&String>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

#[async_trait::async_trait]
impl Backend for FakeBackend {
    async fn get_session(&self) -> Result<Option<AuthSession>, BackendError> {
        self.record("get_session")?;
        Ok(self.state.lock().unwrap().session.clone())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        self.record("sign_in")?;
        let mut state = self.state.lock().unwrap();
        match state.accounts.get(email) {
            Some((id, pw)) if pw == password => {
                let session = session_for(*id, Some(email));
                state.session = Some(session.clone());
                Ok(session)
            }
            _ => Err(BackendError::Api { status: 400, message: "Invalid login credentials".into() }),
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, BackendError> {
        self.record("sign_up")?;
        let mut state = self.state.lock().unwrap();
        if state.sign_up_without_user {
            return Ok(SignUpResponse::default());
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(BackendError::Api {
                status: 422,
                message: format!("Password should be at least {MIN_PASSWORD_LEN} characters."),
            });
        }
        if state.accounts.contains_key(email) {
            return Err(BackendError::Api { status: 422, message: "User already registered".into() });
        }
        let id = Uuid::new_v4();
        state.accounts.insert(email.to_owned(), (id, password.to_owned()));
        let session = session_for(id, Some(email));
        state.session = Some(session.clone());
        Ok(SignUpResponse { user: Some(session.user.clone()), session: Some(session) })
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.record("sign_out")?;
        self.state.lock().unwrap().session = None;
        Ok(())
    }

    async fn reset_password_for_email(&self, _email: &str) -> Result<(), BackendError> {
        self.record("reset_password")
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<ProfileRow>, BackendError> {
        self.record("get_profile")?;
        let state = self.state.lock().unwrap();
        Ok(state.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn search_profiles(&self, query: &str) -> Result<Vec<ProfileRow>, BackendError> {
        self.record("search_profiles")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .profiles
            .iter()
            .filter(|p| contains_ci(p.full_name.as_ref(), query) || contains_ci(p.username.as_ref(), query))
            .cloned()
            .collect())
    }

    async fn insert_profile(&self, profile: &NewProfile) -> Result<(), BackendError> {
        self.record("insert_profile")?;
        let mut state = self.state.lock().unwrap();
        let duplicate = state
            .profiles
            .iter()
            .any(|p| p.id == profile.id || p.username.as_deref() == Some(profile.username.as_str()));
        if duplicate {
            return Err(BackendError::Api {
                status: 409,
                message: "duplicate key value violates unique constraint \"profiles_username_key\"".into(),
            });
        }
        state.profiles.push(ProfileRow {
            id: profile.id,
            username: Some(profile.username.clone()),
            full_name: Some(profile.full_name.clone()),
            profile_picture: profile.profile_picture.clone(),
            email: Some(profile.email.clone()),
        });
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<(), BackendError> {
        self.record("update_profile")?;
        let mut state = self.state.lock().unwrap();
        let Some(row) = state.profiles.iter_mut().find(|p| p.id == id) else {
            return Err(BackendError::Api { status: 404, message: "no such profile".into() });
        };
        if let Some(username) = &update.username {
            row.username = Some(username.clone());
        }
        if let Some(full_name) = &update.full_name {
            row.full_name = Some(full_name.clone());
        }
        Ok(())
    }

    async fn upload_file(&self, name: &str, file: &FileUpload) -> Result<(), BackendError> {
        self.record("upload_file")?;
        let mut state = self.state.lock().unwrap();
        if state.files.contains_key(name) {
            return Err(BackendError::Api { status: 409, message: "The resource already exists".into() });
        }
        state.files.insert(name.to_owned(), file.bytes.clone());
        Ok(())
    }

    async fn download_file(&self, name: &str) -> Result<Vec<u8>, BackendError> {
        self.record("download_file")?;
        let delay = self
            .state
            .lock()
            .unwrap()
            .download_delay_ms
            .get(name)
            .copied();
        if let Some(ms) = delay {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        self.state
            .lock()
            .unwrap()
            .files
            .get(name)
            .cloned()
            .ok_or_else(|| BackendError::Api { status: 404, message: "Object not found".into() })
    }
}

/// Backend whose every call panics, for exercising fail-closed paths.
pub struct PanickingBackend;

#[async_trait::async_trait]
impl Backend for PanickingBackend {
    async fn get_session(&self) -> Result<Option<AuthSession>, BackendError> {
        panic!("get_session exploded")
    }

    async fn sign_in_with_password(&self, _email: &str, _password: &str) -> Result<AuthSession, BackendError> {
        panic!("sign_in exploded")
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> Result<SignUpResponse, BackendError> {
        panic!("sign_up exploded")
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        panic!("sign_out exploded")
    }

    async fn reset_password_for_email(&self, _email: &str) -> Result<(), BackendError> {
        panic!("reset_password exploded")
    }

    async fn get_profile(&self, _id: Uuid) -> Result<Option<ProfileRow>, BackendError> {
        panic!("get_profile exploded")
    }

    async fn search_profiles(&self, _query: &str) -> Result<Vec<ProfileRow>, BackendError> {
        panic!("search_profiles exploded")
    }

    async fn insert_profile(&self, _profile: &NewProfile) -> Result<(), BackendError> {
        panic!("insert_profile exploded")
    }

    async fn update_profile(&self, _id: Uuid, _update: &ProfileUpdate) -> Result<(), BackendError> {
        panic!("update_profile exploded")
    }

    async fn upload_file(&self, _name: &str, _file: &FileUpload) -> Result<(), BackendError> {
        panic!("upload_file exploded")
    }

    async fn download_file(&self, _name: &str) -> Result<Vec<u8>, BackendError> {
        panic!("download_file exploded")
    }
}
