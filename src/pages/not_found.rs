use crate::Route;
use yew::prelude::*;
use yew_router::prelude::*;

#[function_component(NotFound)]
pub fn not_found() -> Html {
    html! {
        <div class="mt-8 text-center space-y-3">
            <h2 class="text-2xl font-climate">{"Page not found"}</h2>
            <Link<Route> to={Route::Home} classes="text-uiPurple">
                {"Back to staking"}
            </Link<Route>>
        </div>
    }
}
