use crate::components::deposit_form::DepositForm;
use yew::prelude::*;

#[function_component(Home)]
pub fn home() -> Html {
    html! {
        <div class="space-y-4">
            <DepositForm />
            <div class="w-full bg-uiGrayGradient rounded-32 px-5 py-4 text-xs text-gray-400 space-y-1">
                <p>{"• 1 day: +1% on your deposit"}</p>
                <p>{"• 7 day: +9% on your deposit"}</p>
                <p>{"• 30 day: +40% on your deposit"}</p>
                <p>{"Deposits are paid in TON through your connected wallet."}</p>
            </div>
        </div>
    }
}
