use crate::context::{use_clock, AppContext};
use crate::deposit::{
    receiving_date, submit_deposit, validate_amount, DepositError, DepositOrder, DepositState,
    SubmitLock, MAX_AMOUNT, MIN_AMOUNT,
};
use crate::rewards::{aggregate_totals, format_timestamp, projected_reward, statistic_for_window};
use crate::types::*;
use crate::Route;
use chrono::Utc;
use rust_decimal::Decimal;
use yew::prelude::*;
use yew_router::prelude::*;

#[derive(Debug, Clone, PartialEq)]
enum Statistics {
    Loading,
    Loaded(StatisticsSnapshot),
    Unavailable,
}

#[function_component(DepositForm)]
pub fn deposit_form() -> Html {
    let context = use_context::<AppContext>();
    let navigator = use_navigator();
    let now = use_clock();

    let period = use_state(Period::default);
    let raw_amount = use_state(String::new);
    let touched = use_state(|| false);
    let state = use_state(DepositState::default);
    let lock = use_memo((), |_| SubmitLock::default());

    let validation = validate_amount(&raw_amount);
    let amount = validation.as_ref().ok().copied();
    let show_error = *touched && validation.is_err();

    let on_input = {
        let raw_amount = raw_amount.clone();
        let touched = touched.clone();
        let state = state.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<web_sys::HtmlInputElement>() {
                let value = input.value();
                state.set(state.after_edit(&value));
                raw_amount.set(value);
                touched.set(true);
            }
        })
    };

    let on_submit = {
        let context = context.clone();
        let period = period.clone();
        let raw_amount = raw_amount.clone();
        let touched = touched.clone();
        let state = state.clone();
        let lock = lock.clone();

        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if lock.is_held() {
                return;
            }
            let Some(context) = context.clone() else {
                log::error!("Deposit form rendered without an app context");
                return;
            };
            let amount = match validate_amount(&raw_amount) {
                Ok(amount) => amount,
                Err(err) => {
                    log::warn!("Deposit blocked: {}", err);
                    touched.set(true);
                    return;
                }
            };

            let order = DepositOrder {
                amount,
                period: *period,
            };
            let Some(guard) = lock.try_acquire() else {
                return;
            };
            state.set(DepositState::TransactionRequested);
            let navigator = navigator.clone();
            let state = state.clone();

            wasm_bindgen_futures::spawn_local(async move {
                let _guard = guard;
                log::info!("Starting deposit of {} TON for {}", order.amount, order.period.label());

                let progress = state.clone();
                let result = submit_deposit(
                    context.wallet.as_ref(),
                    context.backend.as_ref(),
                    &context.config,
                    order,
                    Utc::now(),
                    move |next| progress.set(next),
                )
                .await;

                match result {
                    Ok(record) => {
                        log::info!("Deposit {} recorded", record.header.hash);
                        match navigator {
                            Some(navigator) => {
                                navigator.push(&Route::Profile);
                                state.set(DepositState::Navigated);
                            }
                            None => log::error!("No router available, staying on the form"),
                        }
                    }
                    Err(err) => {
                        log::error!("Deposit failed: {}", err);
                        state.set(DepositState::Failed(err));
                    }
                }
            });
        })
    };

    let Some(context) = context else {
        return html! {};
    };
    let terms = period.terms();
    let end_date = format_timestamp(&receiving_date(now, *period), &context.config.timezone);
    let busy = state.is_busy();

    html! {
        <div class="w-full h-max mt-4 bg-uiGrayGradient flex flex-col gap-3 rounded-32 px-5 py-4">
            <h2 class="text-2xl font-climate">{"Market Overview"}</h2>

            <PeriodSelector selected={*period} on_select={
                let period = period.clone();
                Callback::from(move |next: Period| period.set(next))
            } />

            <div class="w-full h-fit text-gray-400 flex flex-row justify-between text-xs">
                <p>{"Assets"}</p>
                <p>{format!("Earnings for {} day", terms.nominal_days)}</p>
            </div>

            <form onsubmit={on_submit} class="w-full h-max px-4 py-5 flex flex-col gap-2 bg-uiLowGray rounded-32">
                <FormHeader period={*period} {amount} />
                <div class="w-full h-fit flex flex-row items-center gap-3">
                    <input
                        type="text"
                        inputmode="decimal"
                        placeholder="+1"
                        value={(*raw_amount).clone()}
                        oninput={on_input}
                        disabled={busy}
                        class={classes!(
                            "w-[110px]", "bg-[#3F3F3F]", "rounded-[4px]", "border", "outline-none", "px-2", "py-1", "text-sm",
                            if show_error { "border-red-500" } else { "border-[#818181]" }
                        )}
                    />
                    <button
                        type="submit"
                        disabled={busy}
                        class="w-max bg-uiPurple text-white rounded-[4px] px-3 py-1 text-sm disabled:opacity-50"
                    >
                        {if busy { "Waiting..." } else { "Buy" }}
                    </button>
                </div>
                <p class={if show_error { "text-xs text-red-500" } else { "text-xs text-gray-400" }}>
                    {match &validation {
                        Err(err) if show_error => err.to_string(),
                        _ => format!("Min. {} - Max. {}", MIN_AMOUNT, MAX_AMOUNT),
                    }}
                </p>
                <p class="text-xs text-gray-400">{format!("Ends {}", end_date)}</p>
            </form>

            <StatusLine state={(*state).clone()} />
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct PeriodSelectorProps {
    pub selected: Period,
    pub on_select: Callback<Period>,
}

#[function_component(PeriodSelector)]
pub fn period_selector(props: &PeriodSelectorProps) -> Html {
    html! {
        <div class="w-full h-8 px-2 py-1 flex flex-row gap-x-1 bg-uiLowGray rounded-32">
            {Period::ALL.iter().map(|&period| {
                let on_select = props.on_select.clone();
                html! {
                    <ToggleButton
                        key={period.label()}
                        label={period.label()}
                        active={props.selected == period}
                        onclick={Callback::from(move |_| on_select.emit(period))}
                    />
                }
            }).collect::<Html>()}
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct ToggleButtonProps {
    label: &'static str,
    active: bool,
    onclick: Callback<MouseEvent>,
}

#[function_component(ToggleButton)]
fn toggle_button(props: &ToggleButtonProps) -> Html {
    html! {
        <button
            type="button"
            class={if props.active { "w-1/3 h-full rounded-full bg-black" } else { "w-1/3 h-full rounded-full bg-[#3F3F3F]" }}
            onclick={props.onclick.clone()}
        >
            {props.label}
        </button>
    }
}

#[derive(Properties, PartialEq)]
struct FormHeaderProps {
    period: Period,
    amount: Option<Decimal>,
}

#[function_component(FormHeader)]
fn form_header(props: &FormHeaderProps) -> Html {
    let context = use_context::<AppContext>();
    let statistics = use_state(|| Statistics::Loading);

    {
        let statistics = statistics.clone();
        use_effect_with((), move |_| {
            match context {
                Some(context) => wasm_bindgen_futures::spawn_local(async move {
                    match context.backend.get_statistics().await {
                        Ok(snapshot) => statistics.set(Statistics::Loaded(snapshot)),
                        Err(e) => {
                            log::error!("Failed to load statistics: {:#}", e);
                            statistics.set(Statistics::Unavailable);
                        }
                    }
                }),
                None => statistics.set(Statistics::Unavailable),
            }
            || ()
        });
    }

    let terms = props.period.terms();
    let statistic = match &*statistics {
        Statistics::Loading => "Loading...".to_string(),
        Statistics::Loaded(snapshot) => {
            statistic_for_window(aggregate_totals(snapshot), props.period.window_index())
        }
        Statistics::Unavailable => "0".to_string(),
    };
    let projected = projected_reward(props.amount, terms.reward_percent);

    html! {
        <div class="w-full h-full flex flex-row justify-between relative">
            <div class="w-max h-full flex flex-row items-center gap-x-3">
                <img src="assets/ton.svg" alt="" class="w-5" />
                <h2>{"TON"}</h2>
            </div>
            <div class="w-max h-full flex flex-row items-center gap-x-3">
                <p>{statistic}{"K"}</p>
                <p>{format!("+{}%", terms.reward_percent)}</p>
            </div>
            if props.amount.is_some() {
                <div class="w-max h-full flex flex-row items-center gap-x-3 border border-[#0FA958] rounded-md absolute right-0 top-8">
                    <p>{projected}</p>
                </div>
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct StatusLineProps {
    state: DepositState,
}

#[function_component(StatusLine)]
fn status_line(props: &StatusLineProps) -> Html {
    match &props.state {
        DepositState::TransactionRequested => html! {
            <p class="text-xs text-gray-400">{"Confirm the transfer in your wallet"}</p>
        },
        DepositState::TransactionConfirmed => html! {
            <p class="text-xs text-gray-400">{"Recording your deposit..."}</p>
        },
        DepositState::Failed(err) => html! {
            <div class="bg-red-900/40 border border-red-500 rounded-lg px-3 py-2 text-xs text-red-300">
                <strong>{"Error: "}</strong>{err.to_string()}
                if matches!(err, DepositError::Request { .. } | DepositError::BackendStatus { .. }) {
                    <p>{"Keep the payment hash and contact support."}</p>
                }
            </div>
        },
        _ => html! {},
    }
}
