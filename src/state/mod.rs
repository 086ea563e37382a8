use crate::api::{ApiClient, AuthResponse};
use crate::models::{Note, User};
use crate::storage::{load_user_from_storage, save_user_to_storage};
use leptos::prelude::*;

/// Top-level application state, provided once through Leptos context. The
/// session (token + cached user) lives here and is injected into everything
/// that needs it; there is no ambient global.
#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,
    pub current_user: RwSignal<Option<User>>,

    /// Notes for the dashboard (loaded from backend, non-paginated).
    pub notes: RwSignal<Vec<Note>>,
    pub notes_loading: RwSignal<bool>,
    pub notes_error: RwSignal<Option<String>>,

    /// Total note count as reported by the backend.
    pub note_count: RwSignal<Option<u64>>,

    /// Dashboard search box. Filters the loaded list locally as you type;
    /// the explicit Search action sends it to the server.
    pub search_query: RwSignal<String>,
}

impl AppState {
    pub fn new() -> Self {
        let stored_client = ApiClient::load_from_storage();
        let stored_user = load_user_from_storage();

        Self {
            api_client: RwSignal::new(stored_client),
            current_user: RwSignal::new(stored_user),
            notes: RwSignal::new(vec![]),
            notes_loading: RwSignal::new(false),
            notes_error: RwSignal::new(None),
            note_count: RwSignal::new(None),
            search_query: RwSignal::new(String::new()),
        }
    }

    /// Persist a successful login/register response as the current session.
    pub fn apply_session(&self, response: &AuthResponse) {
        let mut api_client = self.api_client.get_untracked();
        api_client.set_token(response.token.clone());
        api_client.save_to_storage();

        let user = response.user();
        save_user_to_storage(&user);

        self.api_client.set(api_client);
        self.current_user.set(Some(user));
    }

    /// Drop the session unconditionally and synchronously. No network call.
    pub fn clear_session(&self) {
        let mut api_client = self.api_client.get_untracked();
        api_client.logout();
        self.api_client.set(api_client);
        self.current_user.set(None);
        self.notes.set(vec![]);
        self.note_count.set(None);
    }

    pub fn is_authenticated(&self) -> bool {
        self.api_client.get().is_authenticated()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub AppState);
