use wasm_bindgen::prelude::wasm_bindgen;
use yew::prelude::*;
use yew_router::prelude::*;

pub mod boc;
mod components;
pub mod config;
mod context;
pub mod deposit;
mod pages;
pub mod rewards;
pub mod services;
pub mod types;
pub mod wallet;

use components::layout::Layout;
use context::AppContext;
use pages::{home::Home, not_found::NotFound, profile::Profile};

#[derive(Clone, Routable, PartialEq)]
pub enum Route {
    #[at("/")]
    Home,
    #[at("/profile")]
    Profile,
    #[not_found]
    #[at("/404")]
    NotFound,
}

fn switch(routes: Route) -> Html {
    match &routes {
        Route::Home => html! { <Home /> },
        Route::Profile => html! { <Profile /> },
        Route::NotFound => html! { <NotFound /> },
    }
}

#[function_component(App)]
fn app() -> Html {
    let context = use_memo((), |_| AppContext::from_env());

    match &*context {
        Ok(context) => html! {
            <ContextProvider<AppContext> context={context.clone()}>
                <BrowserRouter>
                    <Layout>
                        <Switch<Route> render={switch} />
                    </Layout>
                </BrowserRouter>
            </ContextProvider<AppContext>>
        },
        Err(err) => html! {
            <div class="min-h-screen bg-black text-red-300 flex items-center justify-center p-6">
                <strong>{"Configuration error: "}</strong>{err.to_string()}
            </div>
        },
    }
}

#[wasm_bindgen(start)]
pub fn main() {
    wasm_logger::init(wasm_logger::Config::default());

    yew::Renderer::<App>::new().render();
}
