//! Binding lifecycle demonstration
//!
//! Wires a consumer and a producer binding into a registry, brings them up,
//! and shuts them down while printing the events the registry publishes.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run -p core-binding --example binding_demo
//!
//! # JSON format, with a setup hook that fails
//! cargo run -p core-binding --example binding_demo -- json fail
//! ```

use anyhow::anyhow;
use binder_traits::error::Result as ComponentResult;
use binder_traits::{Lifecycle, LogLevel};
use core_binding::{
    BindingHooks, BindingInfo, BindingRegistry, DestinationDescriptor, StaticConsumerDestination,
    StaticProducerDestination,
};
use core_runtime::config::RuntimeConfig;
use core_runtime::events::EventStream;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug)]
struct PollLoop {
    name: String,
    running: AtomicBool,
}

impl PollLoop {
    fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            running: AtomicBool::new(false),
        })
    }
}

#[async_trait::async_trait]
impl Lifecycle for PollLoop {
    async fn start(&self) -> ComponentResult<()> {
        self.running.store(true, Ordering::SeqCst);
        info!(component = %self.name, "Poll loop started");
        Ok(())
    }

    async fn stop(&self) -> ComponentResult<()> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.running.store(false, Ordering::SeqCst);
        info!(component = %self.name, "Poll loop stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn component_name(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

struct ListenerRegistration {
    refuse: bool,
}

#[async_trait::async_trait]
impl BindingHooks for ListenerRegistration {
    async fn after_bind(&self, info: &BindingInfo) -> anyhow::Result<()> {
        if self.refuse {
            return Err(anyhow!("listener container is full"));
        }
        info!(binding = %info.name(), group = ?info.group(), "Listener registered");
        Ok(())
    }

    async fn after_unbind(&self, info: &BindingInfo) -> anyhow::Result<()> {
        info!(binding = %info.name(), "Listener deregistered");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };
    let refuse = args.get(2).map(String::as_str) == Some("fail");

    init_logging(
        LoggingConfig::default()
            .with_format(format)
            .with_level(LogLevel::Debug),
    )?;

    let config = RuntimeConfig::builder()
        .unbind_timeout(Duration::from_secs(5))
        .build()?;
    let registry: BindingRegistry<String> = BindingRegistry::new(config);

    if let Some(receiver) = registry.subscribe() {
        let mut stream = EventStream::new(receiver);
        tokio::spawn(async move {
            while let Ok(event) = stream.recv().await {
                println!("[event] {:?}: {}", event.severity(), event.description());
            }
        });
    }

    let consumer_loop = PollLoop::new("orders-consumer");
    consumer_loop.start().await?;

    let orders_in = registry
        .binding("orders-in")
        .group("billing")
        .target("orders-input-channel".to_string())
        .component(consumer_loop)
        .destination(DestinationDescriptor::consumer(StaticConsumerDestination::new(
            "orders",
        )))
        .hooks(Arc::new(ListenerRegistration { refuse }))
        .build()?;
    registry.register(orders_in).await?;

    let orders_out = registry
        .binding("orders-out")
        .target("orders-output-channel".to_string())
        .destination(DestinationDescriptor::producer(
            StaticProducerDestination::new("orders").with_partitions(4),
        ))
        .build()?;
    registry.register(orders_out).await?;

    let degraded = registry.bind_all().await;
    info!(degraded = ?degraded, "Bring-up finished");

    for binding in registry.names().await {
        if let Some(binding) = registry.get(&binding).await {
            println!("{}", binding);
        }
    }
    println!("{}", serde_json::to_string_pretty(&registry.snapshots().await)?);

    let report = registry.unbind_all().await;
    info!(clean = report.is_clean(), "Shutdown finished");

    // Let the printer task drain.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
