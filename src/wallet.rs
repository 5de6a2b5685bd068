//! Wallet access for the deposit flow.
//!
//! The browser side is a TON Connect UI instance that the host page exposes as
//! `window.tonConnectUI`.

use async_trait::async_trait;
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::types::{WalletTransactionRequest, WalletTransactionResult};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("wallet is not connected")]
    NotConnected,
    #[error("wallet rejected the transfer: {0}")]
    Rejected(String),
    #[error("could not encode transfer request: {0}")]
    Encode(String),
    #[error("unexpected wallet response: {0}")]
    BadResponse(String),
}

#[async_trait(?Send)]
pub trait WalletConnector {
    /// User-friendly address of the connected wallet, if any.
    fn address(&self) -> Option<String>;

    /// Asks the user to sign the transfer. `Ok(None)` means the wallet
    /// returned without a transaction.
    async fn send_transaction(
        &self,
        request: &WalletTransactionRequest,
    ) -> Result<Option<WalletTransactionResult>, WalletError>;
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = TonConnectUI)]
    type TonConnectUi;

    #[wasm_bindgen(method, getter)]
    fn connected(this: &TonConnectUi) -> bool;

    #[wasm_bindgen(method, getter)]
    fn account(this: &TonConnectUi) -> JsValue;

    #[wasm_bindgen(method, catch, js_name = sendTransaction)]
    async fn send_transaction(this: &TonConnectUi, request: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = TON_CONNECT_UI, js_name = toUserFriendlyAddress)]
    fn to_user_friendly_address(raw: &str) -> Result<JsValue, JsValue>;
}

/// TON Connect UI instance looked up on `window`.
#[derive(Clone)]
pub struct TonConnectWallet {
    ui: JsValue,
}

impl TonConnectWallet {
    const GLOBAL_NAME: &'static str = "tonConnectUI";

    pub fn from_window() -> Option<Self> {
        let window = web_sys::window()?;
        let ui = js_sys::Reflect::get(&window, &JsValue::from_str(Self::GLOBAL_NAME)).ok()?;
        if ui.is_undefined() || ui.is_null() {
            log::warn!("window.{} is not available", Self::GLOBAL_NAME);
            return None;
        }
        Some(Self { ui })
    }

    fn ui(&self) -> &TonConnectUi {
        self.ui.unchecked_ref()
    }
}

#[async_trait(?Send)]
impl WalletConnector for TonConnectWallet {
    fn address(&self) -> Option<String> {
        if !self.ui().connected() {
            return None;
        }
        let account = self.ui().account();
        let raw = js_sys::Reflect::get(&account, &JsValue::from_str("address"))
            .ok()?
            .as_string()?;
        to_user_friendly_address(&raw)
            .ok()
            .and_then(|address| address.as_string())
            .or(Some(raw))
    }

    async fn send_transaction(
        &self,
        request: &WalletTransactionRequest,
    ) -> Result<Option<WalletTransactionResult>, WalletError> {
        if !self.ui().connected() {
            return Err(WalletError::NotConnected);
        }

        let json = serde_json::to_string(request).map_err(|e| WalletError::Encode(e.to_string()))?;
        let request = js_sys::JSON::parse(&json).map_err(|e| WalletError::Encode(describe(&e)))?;

        let response = self
            .ui()
            .send_transaction(request)
            .await
            .map_err(|e| WalletError::Rejected(describe(&e)))?;

        if response.is_undefined() || response.is_null() {
            return Ok(None);
        }

        let boc = js_sys::Reflect::get(&response, &JsValue::from_str("boc"))
            .ok()
            .and_then(|boc| boc.as_string())
            .ok_or_else(|| WalletError::BadResponse("missing boc".to_string()))?;

        Ok(Some(WalletTransactionResult { boc }))
    }
}

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|error| String::from(error.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

/// Stand-in used when the page has no TON Connect UI.
pub struct DisconnectedWallet;

#[async_trait(?Send)]
impl WalletConnector for DisconnectedWallet {
    fn address(&self) -> Option<String> {
        None
    }

    async fn send_transaction(
        &self,
        _request: &WalletTransactionRequest,
    ) -> Result<Option<WalletTransactionResult>, WalletError> {
        Err(WalletError::NotConnected)
    }
}
