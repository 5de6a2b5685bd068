use crate::context::use_wallet_address;
use crate::Route;
use yew::prelude::*;
use yew_router::prelude::*;

#[function_component(Profile)]
pub fn profile() -> Html {
    let address = use_wallet_address();

    html! {
        <div class="w-full mt-4 bg-uiGrayGradient flex flex-col gap-3 rounded-32 px-5 py-4">
            <h2 class="text-2xl font-climate">{"Profile"}</h2>
            if let Some(address) = address {
                <div class="bg-uiLowGray rounded-32 px-4 py-3 text-xs break-all">
                    <p class="text-gray-400">{"Wallet"}</p>
                    <p>{address}</p>
                </div>
                <p class="text-sm text-gray-400">
                    {"Your deposit has been recorded. Rewards are credited on the receiving date."}
                </p>
            } else {
                <p class="text-sm text-gray-400">{"Connect a wallet to see your deposits."}</p>
            }
            <Link<Route> to={Route::Home} classes="w-max bg-uiPurple text-white rounded-[4px] px-3 py-1 text-sm">
                {"New deposit"}
            </Link<Route>>
        </div>
    }
}
