//! # Integration Flows

pub mod cancellation_flow;
pub mod relay_lifecycle;
pub mod rpc_relay_flow;

#[cfg(test)]
pub(crate) mod fixtures {
    use context_runtime::{ContextConfig, MainContext};
    use std::time::Duration;
    use xc_relay::{RelayConfig, RelayHandle, RelayProcess};

    /// Slow calls take two seconds unless cancelled.
    pub fn slow_config() -> ContextConfig {
        ContextConfig::default().with_slow_call(200, Duration::from_millis(10))
    }

    pub fn start(config: ContextConfig) -> (RelayHandle, MainContext) {
        let relay = RelayProcess::spawn(RelayConfig::default()).expect("relay starts");
        let main = MainContext::start(&relay, config).expect("contexts start");
        (relay, main)
    }
}
