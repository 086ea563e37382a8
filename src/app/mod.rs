use crate::pages::{
    BoardPage, FilesPage, LoginPage, NotesPage, ProfilePage, RegistrationPage, RootAuthed,
    RootPage,
};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new()));

    // IMPORTANT:
    // - Leptos CSR requires the `csr` feature on `leptos`.
    // - router hooks require a <Router> context.
    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("login") view=LoginPage />
                <Route path=path!("signup") view=RegistrationPage />
                <Route path=path!("notes") view=move || view! {
                    <RootAuthed>
                        <NotesPage />
                    </RootAuthed>
                } />
                <Route path=path!("board") view=move || view! {
                    <RootAuthed>
                        <BoardPage />
                    </RootAuthed>
                } />
                <Route path=path!("files") view=move || view! {
                    <RootAuthed>
                        <FilesPage />
                    </RootAuthed>
                } />
                <Route path=path!("profile") view=move || view! {
                    <RootAuthed>
                        <ProfilePage />
                    </RootAuthed>
                } />
                <Route path=path!("") view=RootPage />
            </Routes>
        </Router>
    }
}
