use std::rc::Rc;

use chrono::{DateTime, Utc};
use gloo_timers::callback::Interval;
use yew::prelude::*;

use crate::config::{Config, ConfigError};
use crate::services::{DepositBackend, DepositService};
use crate::wallet::{DisconnectedWallet, TonConnectWallet, WalletConnector};

const TICK_MS: u32 = 1_000;

/// Collaborators handed down to every component through a `ContextProvider`.
#[derive(Clone)]
pub struct AppContext {
    pub config: Rc<Config>,
    pub wallet: Rc<dyn WalletConnector>,
    pub backend: Rc<dyn DepositBackend>,
}

impl PartialEq for AppContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.config, &other.config)
            && Rc::ptr_eq(&self.wallet, &other.wallet)
            && Rc::ptr_eq(&self.backend, &other.backend)
    }
}

impl AppContext {
    pub fn new(
        config: Config,
        wallet: Rc<dyn WalletConnector>,
        backend: Rc<dyn DepositBackend>,
    ) -> Self {
        Self {
            config: Rc::new(config),
            wallet,
            backend,
        }
    }

    /// Wires the browser wallet and the HTTP backend from build-time config.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Config::from_env()?;
        let wallet: Rc<dyn WalletConnector> = match TonConnectWallet::from_window() {
            Some(wallet) => Rc::new(wallet),
            None => Rc::new(DisconnectedWallet),
        };
        let backend = Rc::new(DepositService::new(&config));
        log::info!("Deposits go to {}", config.recipient_address);

        Ok(Self::new(config, wallet, backend))
    }
}

/// Connected wallet address, refreshed once a second.
#[hook]
pub fn use_wallet_address() -> Option<String> {
    let context = use_context::<AppContext>();
    let address = use_state_eq(|| context.as_ref().and_then(|ctx| ctx.wallet.address()));

    {
        let address = address.clone();
        use_effect_with(context, move |context| {
            let context = context.clone();
            let interval = Interval::new(TICK_MS, move || {
                address.set(context.as_ref().and_then(|ctx| ctx.wallet.address()));
            });
            move || drop(interval)
        });
    }

    (*address).clone()
}

/// Current time, re-rendering the caller once a second.
#[hook]
pub fn use_clock() -> DateTime<Utc> {
    let now = use_state(Utc::now);

    {
        let now = now.clone();
        use_effect_with((), move |_| {
            let interval = Interval::new(TICK_MS, move || now.set(Utc::now()));
            move || drop(interval)
        });
    }

    *now
}
