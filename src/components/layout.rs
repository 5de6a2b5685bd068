use crate::context::use_wallet_address;
use crate::Route;
use yew::prelude::*;
use yew_router::prelude::*;

#[derive(Properties, PartialEq)]
pub struct LayoutProps {
    pub children: Children,
}

#[function_component(Layout)]
pub fn layout(props: &LayoutProps) -> Html {
    html! {
        <div class="min-h-screen bg-black text-white font-sans flex flex-col">
            <Header />
            <main class="flex-1 w-full max-w-md mx-auto px-4 pb-24">
                {props.children.clone()}
            </main>
            <Menu />
        </div>
    }
}

#[function_component(Header)]
pub fn header() -> Html {
    let address = use_wallet_address();

    html! {
        <header class="w-full max-w-md mx-auto px-4 pt-4 flex flex-row justify-between items-center">
            <Link<Route> to={Route::Home} classes="text-2xl font-climate">
                {"EarnTON"}
            </Link<Route>>
            <div class="bg-uiLowGray rounded-32 px-3 py-1 text-xs">
                {match address {
                    Some(address) => shorten_address(&address),
                    None => "Wallet not connected".to_string(),
                }}
            </div>
        </header>
    }
}

#[function_component(Menu)]
pub fn menu() -> Html {
    let route = use_route::<Route>();
    let item = |target: Route, label: &'static str| {
        let active = route.as_ref() == Some(&target);
        let classes = if active {
            "w-1/2 text-center py-2 rounded-full bg-uiPurple text-white"
        } else {
            "w-1/2 text-center py-2 rounded-full text-gray-400"
        };
        html! {
            <Link<Route> to={target} classes={classes}>
                {label}
            </Link<Route>>
        }
    };

    html! {
        <nav class="fixed bottom-0 inset-x-0 bg-uiGrayGradient">
            <div class="max-w-md mx-auto px-4 py-3 flex flex-row gap-x-2 text-sm">
                {item(Route::Home, "Stake")}
                {item(Route::Profile, "Profile")}
            </div>
        </nav>
    }
}

/// `EQAbcd…wxyz` style short form for narrow headers.
pub fn shorten_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 12 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_addresses_are_kept() {
        assert_eq!(shorten_address("EQabc"), "EQabc");
        assert_eq!(shorten_address(""), "");
    }

    #[test]
    fn long_addresses_are_shortened() {
        assert_eq!(
            shorten_address("UQBvW8Z5huBkMJYdnfAEM5JqTNkuWX3diqYENkWsIL0XggGG"),
            "UQBvW8…ggGG"
        );
    }
}
