use leptos::*;
use leptos_router::*;

use hrportal_auth::filter_for;

use crate::config::NAVIGATION;
use crate::frontend::auth::use_auth;

/// Main menu, restricted to what the current session may see.
#[component]
pub fn NavMenu() -> impl IntoView {
    let snapshot = use_auth().snapshot();

    view! {
        <nav class="main-nav">
            <ul>
                {move || {
                    let current = snapshot.get();
                    filter_for(NAVIGATION, &current.authority())
                        .into_iter()
                        .map(|item| {
                            view! {
                                <li>
                                    <A href=item.path>{item.label}</A>
                                </li>
                            }
                        })
                        .collect_view()
                }}
            </ul>
        </nav>
    }
}
