use crate::api::{ApiError, ApiErrorKind, ProfileUpdateRequest, RegisterRequest, UploadPayload};
use crate::board::{BoardModel, ClickOutcome, NODE_HEIGHT, NODE_WIDTH};
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardContent,
    CardDescription, CardHeader, CardTitle, Input, Label, Spinner, Textarea,
};
use crate::models::{FileRecord, Note, Profile};
use crate::state::AppContext;
use crate::util::{format_date, format_file_size, sniff_category};
use leptos::html;
use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::JsCast;

/// Clear the session and bounce to the auth screen. Used whenever the
/// backend answers 401 on a gated call.
fn force_relogin(app_state: AppContext) {
    app_state.0.clear_session();
    let _ = window().location().set_href("/login");
}

/// Route an API failure: authentication errors force re-login, everything
/// else lands in the page's error banner.
fn surface_error(app_state: AppContext, e: &ApiError, slot: RwSignal<Option<String>>) {
    if e.kind == ApiErrorKind::Unauthorized {
        force_relogin(app_state);
    } else {
        slot.set(Some(e.to_string()));
    }
}

fn alert(message: &str) {
    let _ = window().alert_with_message(message);
}

fn confirm(message: &str) -> bool {
    window().confirm_with_message(message).unwrap_or(false)
}

/// Pull the bytes out of a picked `File` so they can travel in a multipart
/// request body.
async fn read_file_payload(file: web_sys::File) -> Result<UploadPayload, String> {
    let buffer = wasm_bindgen_futures::JsFuture::from(file.array_buffer())
        .await
        .map_err(|_| format!("Could not read {}", file.name()))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    Ok(UploadPayload {
        file_name: file.name(),
        mime_type: file.type_(),
        bytes,
    })
}

/// Hand downloaded bytes to the browser through an object URL and a
/// synthetic anchor click.
fn trigger_download(bytes: &[u8], mime: &str, file_name: &str) -> Result<(), String> {
    let array = js_sys::Uint8Array::from(bytes);
    let parts = js_sys::Array::new();
    parts.push(&array.buffer());

    let options = web_sys::BlobPropertyBag::new();
    options.set_type(mime);
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)
        .map_err(|_| "Could not build download blob".to_string())?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)
        .map_err(|_| "Could not create download URL".to_string())?;

    let document = window()
        .document()
        .ok_or_else(|| "No document".to_string())?;
    let anchor: web_sys::HtmlAnchorElement = document
        .create_element("a")
        .map_err(|_| "Could not create anchor".to_string())?
        .unchecked_into();
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();
    let _ = web_sys::Url::revoke_object_url(&url);
    Ok(())
}

#[component]
fn ErrorBanner(error: RwSignal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || error.get().is_some() fallback=|| ().into_view()>
            {move || {
                error.get().map(|e| view! {
                    <Alert class="border-destructive/30">
                        <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                    </Alert>
                })
            }}
        </Show>
    }
}

#[component]
fn SuccessBanner(message: RwSignal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || message.get().is_some() fallback=|| ().into_view()>
            {move || {
                message.get().map(|m| view! {
                    <Alert class="border-green-600/30">
                        <AlertDescription class="text-green-700 text-xs">{m}</AlertDescription>
                    </Alert>
                })
            }}
        </Show>
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let username: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let username_val = username.get();
        let password_val = password.get();
        let api_client = app_state.0.api_client.get_untracked();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.login(&username_val, &password_val).await {
                Ok(response) => {
                    app_state.0.apply_session(&response);
                    let _ = window().location().set_href("/");
                }
                Err(e) => {
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <a href="/" class="text-sm font-medium text-foreground">"Notake"</a>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">"Log in"</CardTitle>
                        <CardDescription class="text-xs">"Use your username and password to continue."</CardDescription>
                    </CardHeader>

                    <CardContent>
                        <form class="flex flex-col gap-3" on:submit=on_submit>
                            <div class="flex flex-col gap-1.5">
                                <Label html_for="username" class="text-xs">"Username"</Label>
                                <Input
                                    id="username"
                                    r#type="text"
                                    placeholder="yourname"
                                    bind_value=username
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="password" class="text-xs">"Password"</Label>
                                <Input
                                    id="password"
                                    r#type="password"
                                    placeholder="••••••••"
                                    bind_value=password
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            <ErrorBanner error=error />

                            <Button
                                class="w-full"
                                size=ButtonSize::Sm
                                attr:disabled=move || loading.get()
                            >
                                <span class="inline-flex items-center gap-2">
                                    <Show when=move || loading.get() fallback=|| ().into_view()>
                                        <Spinner />
                                    </Show>
                                    {move || if loading.get() { "Signing in..." } else { "Continue" }}
                                </span>
                            </Button>

                            <div class="pt-1 text-xs text-muted-foreground">
                                "No account? "
                                <a class="text-primary underline underline-offset-4" href="/signup">"Sign up"</a>
                            </div>
                        </form>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

#[component]
pub fn RegistrationPage() -> impl IntoView {
    let username: RwSignal<String> = RwSignal::new(String::new());
    let email: RwSignal<String> = RwSignal::new(String::new());
    let full_name: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let confirm_password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let username_val = username.get();
        let email_val = email.get();
        let full_name_val = full_name.get();
        let password_val = password.get();
        let confirm_password_val = confirm_password.get();
        let api_client = app_state.0.api_client.get_untracked();

        if password_val != confirm_password_val {
            error.set(Some("Passwords do not match".to_string()));
            return;
        }

        if password_val.len() < 6 {
            error.set(Some("Password must be at least 6 characters".to_string()));
            return;
        }

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            let req = RegisterRequest {
                username: username_val,
                email: email_val,
                password: password_val,
                full_name: full_name_val,
            };
            match api_client.register(&req).await {
                Ok(response) => {
                    // Registration answers with a token; sign straight in.
                    app_state.0.apply_session(&response);
                    let _ = window().location().set_href("/");
                }
                Err(e) => {
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <a href="/" class="text-sm font-medium text-foreground">"Notake"</a>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">"Create account"</CardTitle>
                        <CardDescription class="text-xs">"A few details and you are in."</CardDescription>
                    </CardHeader>

                    <CardContent>
                        <form class="flex flex-col gap-3" on:submit=on_submit>
                            <div class="flex flex-col gap-1.5">
                                <Label html_for="username" class="text-xs">"Username"</Label>
                                <Input id="username" r#type="text" placeholder="yourname"
                                    bind_value=username required=true class="h-8 text-sm" />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="email" class="text-xs">"Email"</Label>
                                <Input id="email" r#type="email" placeholder="you@example.com"
                                    bind_value=email required=true class="h-8 text-sm" />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="full_name" class="text-xs">"Full name"</Label>
                                <Input id="full_name" r#type="text" placeholder="Your Name"
                                    bind_value=full_name required=true class="h-8 text-sm" />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="password" class="text-xs">"Password"</Label>
                                <Input id="password" r#type="password" placeholder="••••••••"
                                    bind_value=password required=true class="h-8 text-sm" />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="confirm_password" class="text-xs">"Confirm password"</Label>
                                <Input id="confirm_password" r#type="password" placeholder="••••••••"
                                    bind_value=confirm_password required=true class="h-8 text-sm" />
                            </div>

                            <ErrorBanner error=error />

                            <Button class="w-full" size=ButtonSize::Sm attr:disabled=move || loading.get()>
                                <span class="inline-flex items-center gap-2">
                                    <Show when=move || loading.get() fallback=|| ().into_view()>
                                        <Spinner />
                                    </Show>
                                    {move || if loading.get() { "Creating..." } else { "Create account" }}
                                </span>
                            </Button>

                            <div class="pt-1 text-xs text-muted-foreground">
                                "Already have an account? "
                                <a class="text-primary underline underline-offset-4" href="/login">"Sign in"</a>
                            </div>
                        </form>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

#[component]
fn AppShell(children: Children) -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    let on_logout = move |_| {
        app_state.0.clear_session();
        let _ = window().location().set_href("/login");
    };

    let display_name = move || {
        app_state
            .0
            .current_user
            .get()
            .map(|u| {
                if u.full_name.trim().is_empty() {
                    u.username
                } else {
                    u.full_name
                }
            })
            .unwrap_or_default()
    };

    view! {
        <div class="min-h-screen bg-background">
            <header class="border-b">
                <div class="mx-auto flex h-12 w-full max-w-[1080px] items-center justify-between px-4">
                    <div class="flex items-center gap-5">
                        <a href="/" class="text-sm font-semibold text-foreground">"Notake"</a>
                        <nav class="flex items-center gap-3 text-xs text-muted-foreground">
                            <a class="hover:text-foreground" href="/">"Notes"</a>
                            <a class="hover:text-foreground" href="/board">"Board"</a>
                            <a class="hover:text-foreground" href="/files">"Files"</a>
                            <a class="hover:text-foreground" href="/profile">"Profile"</a>
                        </nav>
                    </div>

                    <div class="flex items-center gap-3">
                        <span class="hidden text-xs text-muted-foreground sm:block">{display_name}</span>
                        <Button variant=ButtonVariant::Ghost size=ButtonSize::Sm on:click=on_logout>
                            "Sign out"
                        </Button>
                    </div>
                </div>
            </header>

            <main class="mx-auto w-full max-w-[1080px] px-4 py-6">
                {children()}
            </main>
        </div>
    }
}

/// Session gate for the authenticated area. Redirects to the auth screen when
/// no token is stored, and fires a best-effort validation probe; an invalid
/// token bounces back to login.
#[component]
pub fn RootAuthed(children: Children) -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    if !app_state.0.api_client.get_untracked().is_authenticated() {
        let _ = window().location().set_href("/login");
        return view! {
            <div class="px-4 py-8 text-xs text-muted-foreground">"Redirecting to login..."</div>
        }
        .into_any();
    }

    Effect::new(move |_| {
        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            match api_client.validate_token().await {
                Ok(true) => {}
                Ok(false) => force_relogin(app_state),
                Err(e) if e.kind == ApiErrorKind::Unauthorized => force_relogin(app_state),
                // A flaky probe must not log anyone out.
                Err(e) => warn!("token validation probe failed: {e}"),
            }
        });
    });

    view! { <AppShell>{children()}</AppShell> }.into_any()
}

#[component]
pub fn RootPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let is_authenticated = move || app_state.0.is_authenticated();

    view! {
        <Show when=is_authenticated fallback=move || view! { <LoginPage /> }>
            <RootAuthed>
                <NotesPage />
            </RootAuthed>
        </Show>
    }
}

#[component]
pub fn NotesPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let notes = app_state.0.notes;
    let loading = app_state.0.notes_loading;
    let error = app_state.0.notes_error;
    let success: RwSignal<Option<String>> = RwSignal::new(None);

    // Modal state (create when `editing_id` is None).
    let show_modal: RwSignal<bool> = RwSignal::new(false);
    let editing_id: RwSignal<Option<i64>> = RwSignal::new(None);
    let form_title: RwSignal<String> = RwSignal::new(String::new());
    let form_content: RwSignal<String> = RwSignal::new(String::new());
    let saving: RwSignal<bool> = RwSignal::new(false);

    let refresh_count = move || {
        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            match api_client.count_notes().await {
                Ok(count) => app_state.0.note_count.set(Some(count)),
                Err(e) => warn!("note count fetch failed: {e}"),
            }
        });
    };

    let load_notes = move || {
        if loading.get_untracked() {
            return;
        }
        let api_client = app_state.0.api_client.get_untracked();
        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.list_notes().await {
                Ok(list) => notes.set(list),
                Err(e) => surface_error(app_state, &e, error),
            }
            loading.set(false);
        });
        refresh_count();
    };

    Effect::new(move |_| {
        load_notes();
    });

    // Server-side keyword search; an empty query reloads the full list.
    let on_search = move |_| {
        let keyword = app_state.0.search_query.get_untracked();
        if keyword.trim().is_empty() {
            load_notes();
            return;
        }
        let api_client = app_state.0.api_client.get_untracked();
        loading.set(true);
        error.set(None);
        spawn_local(async move {
            match api_client.search_notes(&keyword).await {
                Ok(list) => notes.set(list),
                Err(e) => surface_error(app_state, &e, error),
            }
            loading.set(false);
        });
    };

    // Local title filter over whatever is loaded. Presentation convenience
    // only; the Search button asks the server.
    let visible_notes = move || {
        let q = app_state.0.search_query.get().trim().to_lowercase();
        notes
            .get()
            .into_iter()
            .filter(|n| q.is_empty() || n.title.to_lowercase().contains(&q))
            .collect::<Vec<_>>()
    };

    let open_create = move |_| {
        editing_id.set(None);
        form_title.set(String::new());
        form_content.set(String::new());
        success.set(None);
        show_modal.set(true);
    };

    let open_edit = move |note: Note| {
        editing_id.set(note.id);
        form_title.set(note.title);
        form_content.set(note.content);
        success.set(None);
        show_modal.set(true);
    };

    let close_modal = move |_| {
        show_modal.set(false);
    };

    let on_save = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if saving.get_untracked() {
            return;
        }

        let title = form_title.get_untracked();
        let content = form_content.get_untracked();
        if title.trim().is_empty() || content.trim().is_empty() {
            error.set(Some("Title and content are required".to_string()));
            return;
        }

        let api_client = app_state.0.api_client.get_untracked();
        let id = editing_id.get_untracked();
        saving.set(true);
        error.set(None);

        spawn_local(async move {
            let draft = Note::draft(&title, &content);
            let result = match id {
                Some(id) => api_client.update_note(id, &draft).await,
                None => api_client.create_note(&draft).await,
            };
            match result {
                Ok(_) => {
                    success.set(Some(if id.is_some() {
                        "Note updated".to_string()
                    } else {
                        "Note created".to_string()
                    }));
                    show_modal.set(false);
                    load_notes();
                }
                Err(e) => surface_error(app_state, &e, error),
            }
            saving.set(false);
        });
    };

    let on_delete = move |note: Note| {
        let Some(id) = note.id else { return };
        if !confirm("Delete this note?") {
            return;
        }
        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            match api_client.delete_note(id).await {
                Ok(()) => {
                    success.set(Some("Note deleted".to_string()));
                    load_notes();
                }
                Err(e) => surface_error(app_state, &e, error),
            }
        });
    };

    view! {
        <div class="flex flex-col gap-4">
            <div class="flex items-center justify-between">
                <div class="space-y-1">
                    <h1 class="text-xl font-semibold">"My Notes"</h1>
                    <p class="text-xs text-muted-foreground">
                        {move || match app_state.0.note_count.get() {
                            Some(count) => format!("{count} total"),
                            None => "Capture your thoughts and ideas".to_string(),
                        }}
                    </p>
                </div>
                <Button size=ButtonSize::Sm on:click=open_create>"New note"</Button>
            </div>

            <div class="flex items-center gap-2">
                <Input
                    id="search"
                    r#type="text"
                    placeholder="Filter by title, or search the server..."
                    bind_value=app_state.0.search_query
                    class="h-8 max-w-xs text-sm"
                />
                <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=on_search>
                    "Search"
                </Button>
            </div>

            <ErrorBanner error=error />
            <SuccessBanner message=success />

            <Show
                when=move || !visible_notes().is_empty()
                fallback=move || view! {
                    <Card>
                        <CardContent>
                            <div class="py-8 text-center text-xs text-muted-foreground">
                                {move || if loading.get() {
                                    "Loading notes..."
                                } else {
                                    "No notes yet. Create your first one."
                                }}
                            </div>
                        </CardContent>
                    </Card>
                }
            >
                <div class="grid grid-cols-1 gap-4 md:grid-cols-2 lg:grid-cols-3">
                    {move || {
                        visible_notes()
                            .into_iter()
                            .map(|note| {
                                let edit_note = note.clone();
                                let delete_note = note.clone();
                                view! {
                                    <Card class="gap-2 py-4">
                                        <CardHeader class="px-4">
                                            <CardTitle class="truncate text-sm">{note.title.clone()}</CardTitle>
                                            <CardDescription class="text-xs">
                                                {note.created_at.as_deref().map(format_date).unwrap_or_default()}
                                            </CardDescription>
                                        </CardHeader>
                                        <CardContent class="px-4">
                                            <p class="line-clamp-4 text-xs text-muted-foreground">{note.content.clone()}</p>
                                            <div class="mt-3 flex gap-2">
                                                <Button
                                                    variant=ButtonVariant::Outline
                                                    size=ButtonSize::Sm
                                                    on:click=move |_| open_edit(edit_note.clone())
                                                >
                                                    "Edit"
                                                </Button>
                                                <Button
                                                    variant=ButtonVariant::Destructive
                                                    size=ButtonSize::Sm
                                                    on:click=move |_| on_delete(delete_note.clone())
                                                >
                                                    "Delete"
                                                </Button>
                                            </div>
                                        </CardContent>
                                    </Card>
                                }
                            })
                            .collect_view()
                    }}
                </div>
            </Show>

            <Show when=move || show_modal.get() fallback=|| ().into_view()>
                <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4">
                    <div class="w-full max-w-lg rounded-xl border bg-background p-5 shadow-lg">
                        <h2 class="mb-3 text-sm font-semibold">
                            {move || if editing_id.get().is_some() { "Edit note" } else { "Create note" }}
                        </h2>
                        <form class="flex flex-col gap-3" on:submit=on_save>
                            <div class="flex flex-col gap-1.5">
                                <Label html_for="note_title" class="text-xs">"Title"</Label>
                                <Input id="note_title" r#type="text" placeholder="Enter note title"
                                    bind_value=form_title required=true autofocus=true class="h-8 text-sm" />
                            </div>
                            <div class="flex flex-col gap-1.5">
                                <Label html_for="note_content" class="text-xs">"Content"</Label>
                                <Textarea id="note_content" placeholder="Write your note here..."
                                    bind_value=form_content required=true rows=10 />
                            </div>
                            <div class="flex justify-end gap-2">
                                <Button
                                    variant=ButtonVariant::Outline
                                    size=ButtonSize::Sm
                                    attr:r#type="button"
                                    on:click=close_modal
                                >
                                    "Cancel"
                                </Button>
                                <Button size=ButtonSize::Sm attr:disabled=move || saving.get()>
                                    {move || if saving.get() { "Saving..." } else { "Save" }}
                                </Button>
                            </div>
                        </form>
                    </div>
                </div>
            </Show>
        </div>
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum BoardViewMode {
    Graph,
    Cards,
}

#[component]
pub fn BoardPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    let board: RwSignal<Option<BoardModel>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let view_mode: RwSignal<BoardViewMode> = RwSignal::new(BoardViewMode::Graph);

    let load_board = move || {
        if loading.get_untracked() {
            return;
        }
        let api_client = app_state.0.api_client.get_untracked();
        loading.set(true);
        error.set(None);

        spawn_local(async move {
            // Notes and links are fetched in parallel; if either fails the
            // whole load fails and no partial graph is shown.
            let (notes_res, links_res) =
                futures::join!(api_client.list_notes(), api_client.list_links());
            match (notes_res, links_res) {
                (Ok(notes), Ok(links)) => {
                    board.set(Some(BoardModel::new(&notes, links)));
                }
                (Err(e), _) | (_, Err(e)) => {
                    board.set(None);
                    surface_error(app_state, &e, error);
                }
            }
            loading.set(false);
        });
    };

    Effect::new(move |_| {
        load_board();
    });

    let on_toggle_linking = move |_| {
        board.update(|b| {
            if let Some(b) = b {
                b.toggle_linking();
            }
        });
    };

    let on_node_mousedown = move |node_id: i64, ev: web_sys::MouseEvent| {
        board.update(|b| {
            if let Some(b) = b {
                b.pointer_down(node_id, ev.client_x() as f64, ev.client_y() as f64);
            }
        });
    };

    let on_canvas_mousemove = move |ev: web_sys::MouseEvent| {
        board.update(|b| {
            if let Some(b) = b {
                b.pointer_move(ev.client_x() as f64, ev.client_y() as f64);
            }
        });
    };

    let on_canvas_mouseup = move |_| {
        board.update(|b| {
            if let Some(b) = b {
                b.pointer_up();
            }
        });
    };

    let on_node_click = move |node_id: i64| {
        let mut outcome = ClickOutcome::Ignored;
        board.update(|b| {
            if let Some(b) = b {
                outcome = b.click_node(node_id);
            }
        });

        if let ClickOutcome::CreateLink { source, target } = outcome {
            let api_client = app_state.0.api_client.get_untracked();
            spawn_local(async move {
                match api_client.create_link(source, target).await {
                    Ok(link) => {
                        board.update(|b| {
                            if let Some(b) = b {
                                b.link_created(link);
                            }
                        });
                    }
                    Err(e) => {
                        // Conflict and every other failure alike: alert and
                        // drop back to armed-without-source.
                        board.update(|b| {
                            if let Some(b) = b {
                                b.link_create_failed();
                            }
                        });
                        if e.kind == ApiErrorKind::Unauthorized {
                            force_relogin(app_state);
                        } else if e.kind == ApiErrorKind::Conflict {
                            alert("These notes are already linked.");
                        } else {
                            alert(&format!("Could not link notes: {e}"));
                        }
                    }
                }
            });
        }
    };

    let on_delete_link = move |link_id: i64| {
        if !confirm("Remove this link?") {
            return;
        }
        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            match api_client.delete_link(link_id).await {
                // Local state changes only after backend success.
                Ok(()) => {
                    board.update(|b| {
                        if let Some(b) = b {
                            b.remove_link(link_id);
                        }
                    });
                }
                Err(e) => {
                    if e.kind == ApiErrorKind::Unauthorized {
                        force_relogin(app_state);
                    } else {
                        alert("Could not remove the link.");
                    }
                }
            }
        });
    };

    let linking_active = move || board.get().map(|b| b.is_linking()).unwrap_or(false);
    let link_source = move || board.get().and_then(|b| b.link_source());

    view! {
        <div class="flex flex-col gap-4">
            <div class="flex items-center justify-between">
                <div class="space-y-1">
                    <h1 class="text-xl font-semibold">"Board"</h1>
                    <p class="text-xs text-muted-foreground">"Visualize and connect your notes"</p>
                </div>

                <div class="flex items-center gap-2">
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        on:click=move |_| view_mode.set(BoardViewMode::Graph)
                    >
                        "Graph view"
                    </Button>
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        on:click=move |_| view_mode.set(BoardViewMode::Cards)
                    >
                        "Card view"
                    </Button>
                    <Show
                        when=move || linking_active()
                        fallback=move || view! {
                            <Button size=ButtonSize::Sm on:click=on_toggle_linking>"Link notes"</Button>
                        }
                    >
                        <Button
                            variant=ButtonVariant::Destructive
                            size=ButtonSize::Sm
                            on:click=on_toggle_linking
                        >
                            "Cancel linking"
                        </Button>
                    </Show>
                </div>
            </div>

            <ErrorBanner error=error />

            <Show when=move || linking_active() fallback=|| ().into_view()>
                <Alert>
                    <AlertDescription class="text-xs">
                        {move || match link_source() {
                            Some(id) => format!("Linking: pick the target note (source: note {id}; click it again to deselect)"),
                            None => "Linking: pick the source note".to_string(),
                        }}
                    </AlertDescription>
                </Alert>
            </Show>

            <Show when=move || loading.get() fallback=|| ().into_view()>
                <div class="flex items-center gap-2 text-xs text-muted-foreground">
                    <Spinner />
                    "Loading board..."
                </div>
            </Show>

            <Show when=move || view_mode.get() == BoardViewMode::Graph fallback=move || view! {
                <div class="grid grid-cols-1 gap-4 md:grid-cols-2 lg:grid-cols-3">
                    {move || {
                        board
                            .get()
                            .map(|b| {
                                b.nodes()
                                    .iter()
                                    .cloned()
                                    .map(|n| {
                                        let outgoing = b
                                            .links()
                                            .iter()
                                            .filter(|l| l.source_note_id == n.id)
                                            .count();
                                        view! {
                                            <Card class="gap-2 py-4" attr:style=format!("border-top: 3px solid {}", n.color)>
                                                <CardHeader class="px-4">
                                                    <CardTitle class="truncate text-sm">{n.title.clone()}</CardTitle>
                                                </CardHeader>
                                                <CardContent class="px-4">
                                                    <p class="line-clamp-3 text-xs text-muted-foreground">{n.content.clone()}</p>
                                                    <div class="mt-2 text-xs text-muted-foreground">
                                                        {format!("{outgoing} outgoing links")}
                                                    </div>
                                                </CardContent>
                                            </Card>
                                        }
                                    })
                                    .collect_view()
                            })
                    }}
                </div>
            }>
                <div
                    class="relative h-[640px] overflow-hidden rounded-xl border bg-muted/20"
                    on:mousemove=on_canvas_mousemove
                    on:mouseup=on_canvas_mouseup
                    on:mouseleave=on_canvas_mouseup
                >
                    <svg class="pointer-events-none absolute inset-0 h-full w-full">
                        {move || {
                            board
                                .get()
                                .map(|b| {
                                    b.links()
                                        .iter()
                                        .filter_map(|l| b.edge_endpoints(l))
                                        .map(|((x1, y1), (x2, y2))| {
                                            view! {
                                                <line
                                                    x1=x1.to_string()
                                                    y1=y1.to_string()
                                                    x2=x2.to_string()
                                                    y2=y2.to_string()
                                                    stroke="rgba(6, 182, 212, 0.4)"
                                                    stroke-width="2"
                                                    stroke-dasharray="5,5"
                                                />
                                            }
                                        })
                                        .collect_view()
                                })
                        }}
                    </svg>

                    // Delete affordances on the edge midpoints.
                    {move || {
                        board
                            .get()
                            .map(|b| {
                                b.links()
                                    .iter()
                                    .filter_map(|l| b.edge_midpoint(l).map(|mid| (l.id, mid)))
                                    .map(|(link_id, (mx, my))| {
                                        view! {
                                            <button
                                                class="absolute z-10 flex size-5 -translate-x-1/2 -translate-y-1/2 items-center justify-center rounded-full border bg-background text-[10px] text-destructive shadow-sm hover:bg-destructive hover:text-white"
                                                style=format!("left: {mx}px; top: {my}px")
                                                title="Remove link"
                                                on:click=move |_| on_delete_link(link_id)
                                            >
                                                "x"
                                            </button>
                                        }
                                    })
                                    .collect_view()
                            })
                    }}

                    {move || {
                        board
                            .get()
                            .map(|b| {
                                let source = b.link_source();
                                b.nodes()
                                    .iter()
                                    .cloned()
                                    .map(|n| {
                                        let node_id = n.id;
                                        let selected = source == Some(node_id);
                                        view! {
                                            <div
                                                class=move || {
                                                    if selected {
                                                        "absolute cursor-pointer select-none rounded-lg border-2 bg-background shadow-md ring-2 ring-primary"
                                                    } else {
                                                        "absolute cursor-pointer select-none rounded-lg border-2 bg-background shadow-md"
                                                    }
                                                }
                                                style=format!(
                                                    "left: {}px; top: {}px; width: {}px; height: {}px; border-color: {}",
                                                    n.x, n.y, NODE_WIDTH, NODE_HEIGHT, n.color,
                                                )
                                                on:mousedown=move |ev| on_node_mousedown(node_id, ev)
                                                on:click=move |_| on_node_click(node_id)
                                            >
                                                <div
                                                    class="truncate rounded-t-md px-2 py-1 text-xs font-medium text-white"
                                                    style=format!("background: {}", n.color)
                                                >
                                                    {n.title.clone()}
                                                </div>
                                                <p class="line-clamp-4 px-2 py-1 text-[11px] text-muted-foreground">
                                                    {n.content.clone()}
                                                </p>
                                            </div>
                                        }
                                    })
                                    .collect_view()
                            })
                    }}

                    <div class="absolute bottom-3 left-3 rounded-md border bg-background/90 px-3 py-1.5 text-[11px] text-muted-foreground">
                        "Drag notes to reposition. Toggle linking, then click two notes to connect them."
                    </div>
                </div>
            </Show>
        </div>
    }
}

#[component]
pub fn FilesPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    let files: RwSignal<Vec<FileRecord>> = RwSignal::new(vec![]);
    let loading: RwSignal<bool> = RwSignal::new(false);
    let uploading: RwSignal<bool> = RwSignal::new(false);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let success: RwSignal<Option<String>> = RwSignal::new(None);
    let picked_summary: RwSignal<Option<String>> = RwSignal::new(None);

    let file_input: NodeRef<html::Input> = NodeRef::new();

    let load_files = move || {
        if loading.get_untracked() {
            return;
        }
        let api_client = app_state.0.api_client.get_untracked();
        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.list_files().await {
                Ok(list) => files.set(list),
                Err(e) => surface_error(app_state, &e, error),
            }
            loading.set(false);
        });
    };

    Effect::new(move |_| {
        load_files();
    });

    // Advisory preview: the backend's category on the returned record is
    // what the list renders after upload.
    let on_pick = move |_| {
        let Some(input) = file_input.get_untracked() else {
            return;
        };
        let Some(list) = input.files() else {
            picked_summary.set(None);
            return;
        };
        if list.length() == 0 {
            picked_summary.set(None);
            return;
        }
        let mut parts = Vec::new();
        for i in 0..list.length() {
            if let Some(f) = list.get(i) {
                parts.push(format!("{} ({})", f.name(), sniff_category(&f.type_())));
            }
        }
        picked_summary.set(Some(parts.join(", ")));
    };

    let on_upload = move |_| {
        if uploading.get_untracked() {
            return;
        }
        let Some(input) = file_input.get_untracked() else {
            return;
        };
        let Some(list) = input.files() else {
            return;
        };
        if list.length() == 0 {
            error.set(Some("Choose a file first".to_string()));
            return;
        }

        let mut picked = Vec::new();
        for i in 0..list.length() {
            if let Some(f) = list.get(i) {
                picked.push(f);
            }
        }

        let api_client = app_state.0.api_client.get_untracked();
        uploading.set(true);
        error.set(None);
        success.set(None);

        spawn_local(async move {
            let mut payloads = Vec::with_capacity(picked.len());
            for file in picked {
                match read_file_payload(file).await {
                    Ok(p) => payloads.push(p),
                    Err(e) => {
                        error.set(Some(e));
                        uploading.set(false);
                        return;
                    }
                }
            }

            let uploaded = payloads.len();
            let result = if uploaded == 1 {
                api_client
                    .upload_file(payloads.remove(0))
                    .await
                    .map(|_| ())
            } else {
                api_client.upload_files(payloads).await.map(|_| ())
            };

            match result {
                Ok(()) => {
                    success.set(Some(format!("Uploaded {uploaded} file(s)")));
                    picked_summary.set(None);
                    if let Some(input) = file_input.get_untracked() {
                        input.set_value("");
                    }
                    load_files();
                }
                Err(e) => surface_error(app_state, &e, error),
            }
            uploading.set(false);
        });
    };

    let on_download = move |record: FileRecord| {
        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            match api_client.download_file(record.id).await {
                Ok(bytes) => {
                    if let Err(e) =
                        trigger_download(&bytes, &record.file_type, &record.original_file_name)
                    {
                        error.set(Some(e));
                    }
                }
                Err(e) => surface_error(app_state, &e, error),
            }
        });
    };

    let on_delete = move |id: i64| {
        if !confirm("Delete this file?") {
            return;
        }
        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            match api_client.delete_file(id).await {
                Ok(()) => {
                    success.set(Some("File deleted".to_string()));
                    load_files();
                }
                Err(e) => surface_error(app_state, &e, error),
            }
        });
    };

    view! {
        <div class="flex flex-col gap-4">
            <div class="flex items-center justify-between">
                <div class="space-y-1">
                    <h1 class="text-xl font-semibold">"Files"</h1>
                    <p class="text-xs text-muted-foreground">
                        {move || format!("{} stored", files.get().len())}
                    </p>
                </div>
            </div>

            <Card>
                <CardHeader>
                    <CardTitle class="text-sm">"Upload"</CardTitle>
                    <CardDescription class="text-xs">
                        "Pick one or more files; categories are assigned by the server."
                    </CardDescription>
                </CardHeader>
                <CardContent>
                    <div class="flex flex-wrap items-center gap-2">
                        <input
                            type="file"
                            multiple=true
                            class="text-xs"
                            node_ref=file_input
                            on:change=on_pick
                        />
                        <Button size=ButtonSize::Sm attr:disabled=move || uploading.get() on:click=on_upload>
                            <span class="inline-flex items-center gap-2">
                                <Show when=move || uploading.get() fallback=|| ().into_view()>
                                    <Spinner />
                                </Show>
                                {move || if uploading.get() { "Uploading..." } else { "Upload" }}
                            </span>
                        </Button>
                    </div>
                    <Show when=move || picked_summary.get().is_some() fallback=|| ().into_view()>
                        <p class="mt-2 text-xs text-muted-foreground">
                            {move || picked_summary.get().unwrap_or_default()}
                        </p>
                    </Show>
                </CardContent>
            </Card>

            <ErrorBanner error=error />
            <SuccessBanner message=success />

            <Show
                when=move || !files.get().is_empty()
                fallback=move || view! {
                    <Card>
                        <CardContent>
                            <div class="py-8 text-center text-xs text-muted-foreground">
                                {move || if loading.get() { "Loading files..." } else { "No files yet." }}
                            </div>
                        </CardContent>
                    </Card>
                }
            >
                <div class="flex flex-col gap-2">
                    {move || {
                        files
                            .get()
                            .into_iter()
                            .map(|record| {
                                let download_record = record.clone();
                                let record_id = record.id;
                                view! {
                                    <div class="flex items-center justify-between rounded-md border px-4 py-2.5">
                                        <div class="min-w-0">
                                            <div class="truncate text-sm font-medium">{record.original_file_name.clone()}</div>
                                            <div class="text-xs text-muted-foreground">
                                                {format!(
                                                    "{} · {} · {}",
                                                    record.category,
                                                    format_file_size(record.file_size),
                                                    format_date(&record.upload_date),
                                                )}
                                            </div>
                                        </div>
                                        <div class="flex shrink-0 gap-2">
                                            <Button
                                                variant=ButtonVariant::Outline
                                                size=ButtonSize::Sm
                                                on:click=move |_| on_download(download_record.clone())
                                            >
                                                "Download"
                                            </Button>
                                            <Button
                                                variant=ButtonVariant::Destructive
                                                size=ButtonSize::Sm
                                                on:click=move |_| on_delete(record_id)
                                            >
                                                "Delete"
                                            </Button>
                                        </div>
                                    </div>
                                }
                            })
                            .collect_view()
                    }}
                </div>
            </Show>
        </div>
    }
}

#[component]
pub fn ProfilePage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    let profile: RwSignal<Option<Profile>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);
    let saving: RwSignal<bool> = RwSignal::new(false);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let success: RwSignal<Option<String>> = RwSignal::new(None);

    let bio: RwSignal<String> = RwSignal::new(String::new());
    let location: RwSignal<String> = RwSignal::new(String::new());
    let phone: RwSignal<String> = RwSignal::new(String::new());
    let website: RwSignal<String> = RwSignal::new(String::new());
    let date_of_birth: RwSignal<String> = RwSignal::new(String::new());

    let image_input: NodeRef<html::Input> = NodeRef::new();

    let apply_profile = move |p: Profile| {
        bio.set(p.bio.clone().unwrap_or_default());
        location.set(p.location.clone().unwrap_or_default());
        phone.set(p.phone.clone().unwrap_or_default());
        website.set(p.website.clone().unwrap_or_default());
        date_of_birth.set(p.date_of_birth.clone().unwrap_or_default());
        profile.set(Some(p));
    };

    let load_profile = move || {
        if loading.get_untracked() {
            return;
        }
        let api_client = app_state.0.api_client.get_untracked();
        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.get_profile().await {
                Ok(p) => apply_profile(p),
                Err(e) => surface_error(app_state, &e, error),
            }
            loading.set(false);
        });
    };

    Effect::new(move |_| {
        load_profile();
    });

    let opt = |s: String| {
        let s = s.trim().to_string();
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    };

    let on_save = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if saving.get_untracked() {
            return;
        }

        let req = ProfileUpdateRequest {
            bio: opt(bio.get_untracked()),
            location: opt(location.get_untracked()),
            phone: opt(phone.get_untracked()),
            website: opt(website.get_untracked()),
            date_of_birth: opt(date_of_birth.get_untracked()),
        };

        let api_client = app_state.0.api_client.get_untracked();
        saving.set(true);
        error.set(None);
        success.set(None);

        spawn_local(async move {
            match api_client.update_profile(&req).await {
                Ok(p) => {
                    apply_profile(p);
                    success.set(Some("Profile updated".to_string()));
                }
                Err(e) => surface_error(app_state, &e, error),
            }
            saving.set(false);
        });
    };

    let on_upload_image = move |_| {
        let Some(input) = image_input.get_untracked() else {
            return;
        };
        let Some(list) = input.files() else {
            return;
        };
        let Some(file) = list.get(0) else {
            error.set(Some("Choose an image first".to_string()));
            return;
        };

        let api_client = app_state.0.api_client.get_untracked();
        error.set(None);
        success.set(None);

        spawn_local(async move {
            match read_file_payload(file).await {
                Ok(payload) => match api_client.upload_profile_image(payload).await {
                    Ok(p) => {
                        apply_profile(p);
                        success.set(Some("Profile image updated".to_string()));
                        if let Some(input) = image_input.get_untracked() {
                            input.set_value("");
                        }
                    }
                    Err(e) => surface_error(app_state, &e, error),
                },
                Err(e) => error.set(Some(e)),
            }
        });
    };

    view! {
        <div class="flex flex-col gap-4">
            <div class="space-y-1">
                <h1 class="text-xl font-semibold">"Profile"</h1>
                <p class="text-xs text-muted-foreground">
                    {move || profile.get().map(|p| p.email).unwrap_or_default()}
                </p>
            </div>

            <ErrorBanner error=error />
            <SuccessBanner message=success />

            <div class="grid grid-cols-1 gap-4 lg:grid-cols-3">
                <Card>
                    <CardHeader>
                        <CardTitle class="text-sm">
                            {move || profile.get().map(|p| p.full_name).unwrap_or_default()}
                        </CardTitle>
                        <CardDescription class="text-xs">
                            {move || {
                                profile
                                    .get()
                                    .map(|p| format!("Member since {}", format_date(&p.member_since)))
                                    .unwrap_or_default()
                            }}
                        </CardDescription>
                    </CardHeader>
                    <CardContent>
                        <Show
                            when=move || profile.get().and_then(|p| p.profile_image_url).is_some()
                            fallback=|| ().into_view()
                        >
                            <img
                                class="mb-3 size-20 rounded-full border object-cover"
                                src=move || {
                                    profile.get().and_then(|p| p.profile_image_url).unwrap_or_default()
                                }
                                alt="Profile image"
                            />
                        </Show>

                        <div class="flex flex-col gap-1 text-xs text-muted-foreground">
                            {move || {
                                profile
                                    .get()
                                    .map(|p| {
                                        view! {
                                            <span>{format!("{} notes", p.total_notes)}</span>
                                            <span>{format!("{} files", p.total_files)}</span>
                                            <span>{format!("{} board links", p.total_board_links)}</span>
                                        }
                                    })
                            }}
                        </div>

                        <div class="mt-4 flex flex-col gap-2">
                            <input type="file" accept="image/*" class="text-xs" node_ref=image_input />
                            <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=on_upload_image>
                                "Upload image"
                            </Button>
                        </div>
                    </CardContent>
                </Card>

                <Card class="lg:col-span-2">
                    <CardHeader>
                        <CardTitle class="text-sm">"Details"</CardTitle>
                        <CardDescription class="text-xs">"These fields are optional."</CardDescription>
                    </CardHeader>
                    <CardContent>
                        <form class="flex flex-col gap-3" on:submit=on_save>
                            <div class="flex flex-col gap-1.5">
                                <Label html_for="bio" class="text-xs">"Bio"</Label>
                                <Textarea id="bio" placeholder="A line about you" bind_value=bio rows=3 />
                            </div>
                            <div class="grid grid-cols-1 gap-3 sm:grid-cols-2">
                                <div class="flex flex-col gap-1.5">
                                    <Label html_for="location" class="text-xs">"Location"</Label>
                                    <Input id="location" r#type="text" bind_value=location class="h-8 text-sm" />
                                </div>
                                <div class="flex flex-col gap-1.5">
                                    <Label html_for="phone" class="text-xs">"Phone"</Label>
                                    <Input id="phone" r#type="text" bind_value=phone class="h-8 text-sm" />
                                </div>
                                <div class="flex flex-col gap-1.5">
                                    <Label html_for="website" class="text-xs">"Website"</Label>
                                    <Input id="website" r#type="text" bind_value=website class="h-8 text-sm" />
                                </div>
                                <div class="flex flex-col gap-1.5">
                                    <Label html_for="date_of_birth" class="text-xs">"Date of birth"</Label>
                                    <Input id="date_of_birth" r#type="date" bind_value=date_of_birth class="h-8 text-sm" />
                                </div>
                            </div>
                            <div class="flex justify-end">
                                <Button size=ButtonSize::Sm attr:disabled=move || saving.get()>
                                    {move || if saving.get() { "Saving..." } else { "Save changes" }}
                                </Button>
                            </div>
                        </form>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}
