//! Lifecycle tests for bindings
//!
//! Covers:
//! - consumer and producer bindings going through bind/unbind
//! - component stopped before the cleanup hook, exactly once
//! - setup hook failures swallowed, recorded and published
//! - teardown error reporting
//! - repeated and concurrent unbind
//! - unbind from a binding that was never bound
//! - retries after a timed-out unbind

use anyhow::anyhow;
use binder_traits::error::Result as ComponentResult;
use binder_traits::{ComponentError, Lifecycle, ProducerDestination};
use core_binding::{
    Binding, BindingError, BindingHooks, BindingInfo, BindingState, DestinationDescriptor,
    StaticConsumerDestination, StaticProducerDestination,
};
use core_runtime::events::{BindingEvent, EventBus};
use mockall::mock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Probes
// ============================================================================

type Journal = Arc<Mutex<Vec<&'static str>>>;

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

#[derive(Debug, Clone, PartialEq)]
struct Channel(&'static str);

#[derive(Debug)]
struct ProbeComponent {
    name: &'static str,
    journal: Journal,
    running: AtomicBool,
    stops: AtomicUsize,
    fail_stop: bool,
    stop_delay: Option<Duration>,
}

impl ProbeComponent {
    fn new(name: &'static str, journal: Journal) -> Self {
        Self {
            name,
            journal,
            running: AtomicBool::new(true),
            stops: AtomicUsize::new(0),
            fail_stop: false,
            stop_delay: None,
        }
    }

    fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    fn slow_stop(mut self, delay: Duration) -> Self {
        self.stop_delay = Some(delay);
        self
    }

    fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Lifecycle for ProbeComponent {
    async fn start(&self) -> ComponentResult<()> {
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> ComponentResult<()> {
        if let Some(delay) = self.stop_delay {
            tokio::time::sleep(delay).await;
        }
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().unwrap().push("stop");
        if self.fail_stop {
            return Err(ComponentError::stop_failed(self.name, "broker connection reset"));
        }
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn component_name(&self) -> Option<String> {
        Some(self.name.to_string())
    }
}

#[derive(Default)]
struct ProbeHooks {
    journal: Option<Journal>,
    fail_bind: bool,
    fail_unbind: bool,
    first_unbind_delay: Option<Duration>,
    unbinds: AtomicUsize,
}

impl ProbeHooks {
    fn recording(journal: Journal) -> Self {
        Self {
            journal: Some(journal),
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl BindingHooks for ProbeHooks {
    async fn after_bind(&self, _info: &BindingInfo) -> anyhow::Result<()> {
        if let Some(journal) = &self.journal {
            journal.lock().unwrap().push("after_bind");
        }
        if self.fail_bind {
            return Err(anyhow!("listener container refused registration"));
        }
        Ok(())
    }

    async fn after_unbind(&self, _info: &BindingInfo) -> anyhow::Result<()> {
        let call = self.unbinds.fetch_add(1, Ordering::SeqCst);
        if let (0, Some(delay)) = (call, self.first_unbind_delay) {
            tokio::time::sleep(delay).await;
        }
        if let Some(journal) = &self.journal {
            journal.lock().unwrap().push("after_unbind");
        }
        if self.fail_unbind {
            return Err(anyhow!("partition handler already closed"));
        }
        Ok(())
    }
}

mock! {
    pub Hooks {}

    #[async_trait::async_trait]
    impl BindingHooks for Hooks {
        async fn after_bind(&self, info: &BindingInfo) -> anyhow::Result<()>;
        async fn after_unbind(&self, info: &BindingInfo) -> anyhow::Result<()>;
    }
}

fn consumer_destination() -> DestinationDescriptor {
    DestinationDescriptor::consumer(StaticConsumerDestination::new("orders"))
}

fn producer_destination() -> DestinationDescriptor {
    DestinationDescriptor::producer(StaticProducerDestination::new("orders").with_partitions(3))
}

// ============================================================================
// Construction and accessors
// ============================================================================

#[tokio::test]
async fn test_consumer_binding_lifecycle() {
    let log = journal();
    let component = Arc::new(ProbeComponent::new("orders-consumer", log.clone()));
    let destination = consumer_destination();

    let binding = Binding::new(
        "orders-in",
        "groupA",
        Some(Channel("orders-channel")),
        Some(component.clone() as Arc<dyn Lifecycle>),
        Some(destination.clone()),
    )
    .unwrap();

    assert_eq!(binding.name(), "orders-in");
    assert_eq!(binding.group(), Some("groupA"));
    assert_eq!(binding.target(), &Channel("orders-channel"));
    assert!(binding.destination().unwrap().same_as(&destination));
    assert!(binding.is_input());

    binding.bind().await;
    assert_eq!(binding.state(), BindingState::Bound);
    assert!(binding.bind_failure().is_none());

    binding.unbind().await.unwrap();
    assert_eq!(binding.state(), BindingState::Unbound);
    assert_eq!(component.stop_count(), 1);
    assert!(!component.is_running());
}

#[tokio::test]
async fn test_producer_binding_without_component() {
    let hooks = Arc::new(ProbeHooks::default());
    let binding = Binding::builder("orders-out")
        .group("")
        .target(Channel("orders-channel"))
        .destination(producer_destination())
        .hooks(hooks.clone())
        .build()
        .unwrap();

    assert_eq!(binding.group(), None);
    assert!(!binding.is_input());
    assert_eq!(
        binding.destination().and_then(|d| d.as_producer()).map(|p| p.name_for_partition(2)),
        Some("orders-2".to_string())
    );

    binding.bind().await;
    binding.unbind().await.unwrap();

    assert_eq!(binding.state(), BindingState::Unbound);
    assert_eq!(hooks.unbinds.load(Ordering::SeqCst), 1);
    assert!(binding.to_string().ends_with("lifecycle=null]"));
}

#[tokio::test]
async fn test_missing_target_fails_construction() {
    let log = journal();
    let result = Binding::<Channel>::new(
        "orders-in",
        "groupA",
        None,
        Some(Arc::new(ProbeComponent::new("orders-consumer", log)) as Arc<dyn Lifecycle>),
        Some(consumer_destination()),
    );

    assert!(matches!(result, Err(BindingError::InvalidArgument(_))));
}

// ============================================================================
// bind()
// ============================================================================

#[tokio::test]
async fn test_failing_after_bind_is_swallowed() {
    let bus = EventBus::new(8);
    let mut events = bus.subscribe();
    let hooks = Arc::new(ProbeHooks {
        fail_bind: true,
        ..ProbeHooks::default()
    });

    let binding = Binding::builder("orders-in")
        .group("groupA")
        .target(Channel("orders-channel"))
        .destination(consumer_destination())
        .hooks(hooks)
        .events(bus)
        .build()
        .unwrap();

    binding.bind().await;

    assert_eq!(binding.state(), BindingState::Bound);
    assert_eq!(binding.name(), "orders-in");
    assert_eq!(binding.group(), Some("groupA"));
    assert_eq!(binding.target(), &Channel("orders-channel"));
    assert_eq!(binding.destination().map(|d| d.name()), Some("orders"));
    let failure = binding.bind_failure().expect("failure is recorded");
    assert!(failure.message.contains("refused registration"));
    assert!(!binding.snapshot().is_healthy());

    match events.recv().await.unwrap() {
        BindingEvent::BindFailed { name, message, binding_id } => {
            assert_eq!(name, "orders-in");
            assert_eq!(binding_id, binding.id().to_string());
            assert!(message.contains("refused registration"));
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_bind_twice_runs_hook_once() {
    let log = journal();
    let binding = Binding::builder("orders-in")
        .target(Channel("orders-channel"))
        .hooks(Arc::new(ProbeHooks::recording(log.clone())))
        .build()
        .unwrap();

    binding.bind().await;
    binding.bind().await;

    assert_eq!(*log.lock().unwrap(), vec!["after_bind"]);
    assert_eq!(binding.state(), BindingState::Bound);
}

#[tokio::test]
async fn test_hooks_see_binding_identity() {
    let mut hooks = MockHooks::new();
    hooks
        .expect_after_bind()
        .withf(|info: &BindingInfo| {
            info.name() == "orders-in"
                && info.group() == Some("groupA")
                && info.destination().map(|d| d.is_consumer()) == Some(true)
        })
        .times(1)
        .returning(|_| Ok(()));
    hooks
        .expect_after_unbind()
        .times(1)
        .returning(|_| Ok(()));

    let binding = Binding::builder("orders-in")
        .group("groupA")
        .target(Channel("orders-channel"))
        .destination(consumer_destination())
        .hooks(Arc::new(hooks))
        .build()
        .unwrap();

    binding.bind().await;
    binding.unbind().await.unwrap();
}

// ============================================================================
// unbind()
// ============================================================================

#[tokio::test]
async fn test_component_stops_before_after_unbind() {
    let log = journal();
    let component = Arc::new(ProbeComponent::new("orders-consumer", log.clone()));
    let binding = Binding::builder("orders-in")
        .target(Channel("orders-channel"))
        .component(component)
        .hooks(Arc::new(ProbeHooks::recording(log.clone())))
        .build()
        .unwrap();

    binding.bind().await;
    binding.unbind().await.unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["after_bind", "stop", "after_unbind"]);
}

#[tokio::test]
async fn test_second_unbind_is_noop() {
    let log = journal();
    let component = Arc::new(ProbeComponent::new("orders-consumer", log.clone()));
    let hooks = Arc::new(ProbeHooks::default());
    let binding = Binding::builder("orders-in")
        .target(Channel("orders-channel"))
        .component(component.clone())
        .hooks(hooks.clone())
        .build()
        .unwrap();

    binding.bind().await;
    binding.unbind().await.unwrap();
    let first_unbound_at = binding.unbound_at();

    binding.unbind().await.unwrap();

    assert_eq!(component.stop_count(), 1);
    assert_eq!(hooks.unbinds.load(Ordering::SeqCst), 1);
    assert_eq!(binding.unbound_at(), first_unbound_at);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_unbind_stops_once() {
    let log = journal();
    let component = Arc::new(ProbeComponent::new("orders-consumer", log));
    let binding = Arc::new(
        Binding::builder("orders-in")
            .target(Channel("orders-channel"))
            .component(component.clone())
            .build()
            .unwrap(),
    );
    binding.bind().await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let binding = Arc::clone(&binding);
            tokio::spawn(async move { binding.unbind().await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    assert_eq!(component.stop_count(), 1);
    assert_eq!(binding.state(), BindingState::Unbound);
}

#[tokio::test]
async fn test_unbind_before_bind_still_stops_component() {
    let log = journal();
    let component = Arc::new(ProbeComponent::new("orders-consumer", log.clone()));
    let binding = Binding::builder("orders-in")
        .target(Channel("orders-channel"))
        .component(component.clone())
        .hooks(Arc::new(ProbeHooks::recording(log.clone())))
        .build()
        .unwrap();

    binding.unbind().await.unwrap();

    assert_eq!(binding.state(), BindingState::Unbound);
    assert_eq!(component.stop_count(), 1);
    assert!(!component.is_running());
    assert_eq!(*log.lock().unwrap(), vec!["stop", "after_unbind"]);
    assert!(binding.bound_at().is_none());
    assert!(binding.unbound_at().is_some());

    // Unbound is terminal: a late bind() is ignored.
    binding.bind().await;
    assert_eq!(binding.state(), BindingState::Unbound);
    assert_eq!(*log.lock().unwrap(), vec!["stop", "after_unbind"]);
}

#[tokio::test]
async fn test_stop_failure_still_runs_hook_and_unbinds() {
    let log = journal();
    let component = Arc::new(ProbeComponent::new("orders-consumer", log.clone()).failing_stop());
    let bus = EventBus::new(8);
    let mut events = bus.subscribe();
    let binding = Binding::builder("orders-in")
        .target(Channel("orders-channel"))
        .component(component)
        .hooks(Arc::new(ProbeHooks::recording(log.clone())))
        .events(bus)
        .build()
        .unwrap();

    binding.bind().await;
    let err = binding.unbind().await.unwrap_err();

    assert!(matches!(err, BindingError::ComponentStop { .. }));
    assert!(err.may_leak());
    assert_eq!(binding.state(), BindingState::Unbound);
    assert_eq!(*log.lock().unwrap(), vec!["after_bind", "stop", "after_unbind"]);

    assert!(matches!(events.recv().await.unwrap(), BindingEvent::Bound { .. }));
    assert!(matches!(
        events.recv().await.unwrap(),
        BindingEvent::UnbindFailed { .. }
    ));
}

#[tokio::test]
async fn test_after_unbind_failure_is_returned() {
    let log = journal();
    let component = Arc::new(ProbeComponent::new("orders-consumer", log));
    let binding = Binding::builder("orders-out")
        .target(Channel("orders-channel"))
        .component(component.clone())
        .hooks(Arc::new(ProbeHooks {
            fail_unbind: true,
            ..ProbeHooks::default()
        }))
        .build()
        .unwrap();

    binding.bind().await;
    let err = binding.unbind().await.unwrap_err();

    assert!(matches!(err, BindingError::UnbindHook { .. }));
    assert!(!err.may_leak());
    assert_eq!(component.stop_count(), 1);
    assert_eq!(binding.state(), BindingState::Unbound);
}

#[tokio::test]
async fn test_both_teardown_steps_failing() {
    let log = journal();
    let binding = Binding::builder("orders-in")
        .target(Channel("orders-channel"))
        .component(Arc::new(ProbeComponent::new("orders-consumer", log).failing_stop()))
        .hooks(Arc::new(ProbeHooks {
            fail_unbind: true,
            ..ProbeHooks::default()
        }))
        .build()
        .unwrap();

    binding.bind().await;
    let err = binding.unbind().await.unwrap_err();

    match &err {
        BindingError::Teardown { name, stop, hook } => {
            assert_eq!(name, "orders-in");
            assert!(stop.to_string().contains("broker connection reset"));
            assert!(hook.to_string().contains("already closed"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.binding_name(), Some("orders-in"));
}

#[tokio::test(start_paused = true)]
async fn test_unbind_within_times_out_and_can_retry() {
    let log = journal();
    let component = Arc::new(
        ProbeComponent::new("orders-consumer", log).slow_stop(Duration::from_secs(30)),
    );
    let binding = Binding::builder("orders-in")
        .target(Channel("orders-channel"))
        .component(component.clone())
        .build()
        .unwrap();
    binding.bind().await;

    let err = binding
        .unbind_within(Duration::from_millis(100))
        .await
        .unwrap_err();

    assert!(matches!(err, BindingError::Timeout { timeout_ms: 100, .. }));
    assert_eq!(binding.state(), BindingState::Bound);
    assert_eq!(component.stop_count(), 0);

    binding.unbind().await.unwrap();
    assert_eq!(binding.state(), BindingState::Unbound);
    assert_eq!(component.stop_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_slow_after_unbind_does_not_stop_again() {
    let log = journal();
    let component = Arc::new(ProbeComponent::new("orders-consumer", log.clone()));
    let hooks = Arc::new(ProbeHooks {
        journal: Some(log.clone()),
        first_unbind_delay: Some(Duration::from_secs(30)),
        ..ProbeHooks::default()
    });
    let binding = Binding::builder("orders-in")
        .target(Channel("orders-channel"))
        .component(component.clone())
        .hooks(hooks.clone())
        .build()
        .unwrap();
    binding.bind().await;

    let err = binding
        .unbind_within(Duration::from_millis(100))
        .await
        .unwrap_err();

    assert!(matches!(err, BindingError::Timeout { timeout_ms: 100, .. }));
    assert_eq!(binding.state(), BindingState::Bound);
    assert_eq!(component.stop_count(), 1);

    binding.unbind().await.unwrap();

    assert_eq!(binding.state(), BindingState::Unbound);
    assert_eq!(component.stop_count(), 1);
    assert_eq!(hooks.unbinds.load(Ordering::SeqCst), 2);
    assert_eq!(*log.lock().unwrap(), vec!["after_bind", "stop", "after_unbind"]);
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_timeout_reports_earlier_stop_failure() {
    let log = journal();
    let component = Arc::new(ProbeComponent::new("orders-consumer", log).failing_stop());
    let binding = Binding::builder("orders-in")
        .target(Channel("orders-channel"))
        .component(component.clone())
        .hooks(Arc::new(ProbeHooks {
            first_unbind_delay: Some(Duration::from_secs(30)),
            ..ProbeHooks::default()
        }))
        .build()
        .unwrap();
    binding.bind().await;

    assert!(binding
        .unbind_within(Duration::from_millis(100))
        .await
        .is_err());

    let err = binding.unbind().await.unwrap_err();

    assert!(matches!(err, BindingError::ComponentStop { .. }));
    assert_eq!(component.stop_count(), 1);
    assert_eq!(binding.state(), BindingState::Unbound);
}
