//! Destination descriptors handed to a binding by the provisioner.

use binder_traits::{ConsumerDestination, Destination, ProducerDestination};
use std::fmt;
use std::sync::Arc;

/// Provisioned destination, tagged by which side of the binding it serves.
///
/// The binding never inspects it beyond [`name`](Self::name); the descriptor
/// is returned exactly as it was supplied.
#[derive(Clone)]
pub enum DestinationDescriptor {
    Consumer(Arc<dyn ConsumerDestination>),
    Producer(Arc<dyn ProducerDestination>),
}

impl DestinationDescriptor {
    pub fn consumer(destination: impl ConsumerDestination + 'static) -> Self {
        Self::Consumer(Arc::new(destination))
    }

    pub fn producer(destination: impl ProducerDestination + 'static) -> Self {
        Self::Producer(Arc::new(destination))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Consumer(d) => d.name(),
            Self::Producer(d) => d.name(),
        }
    }

    pub fn is_consumer(&self) -> bool {
        matches!(self, Self::Consumer(_))
    }

    pub fn as_consumer(&self) -> Option<&Arc<dyn ConsumerDestination>> {
        match self {
            Self::Consumer(d) => Some(d),
            Self::Producer(_) => None,
        }
    }

    pub fn as_producer(&self) -> Option<&Arc<dyn ProducerDestination>> {
        match self {
            Self::Producer(d) => Some(d),
            Self::Consumer(_) => None,
        }
    }

    /// True when both descriptors point at the same provisioned object.
    pub fn same_as(&self, other: &DestinationDescriptor) -> bool {
        match (self, other) {
            (Self::Consumer(a), Self::Consumer(b)) => Arc::ptr_eq(a, b),
            (Self::Producer(a), Self::Producer(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for DestinationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Consumer(d) => f.debug_tuple("Consumer").field(d).finish(),
            Self::Producer(d) => f.debug_tuple("Producer").field(d).finish(),
        }
    }
}

/// Consumer destination that is nothing more than a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticConsumerDestination {
    name: String,
}

impl StaticConsumerDestination {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Destination for StaticConsumerDestination {
    fn name(&self) -> &str {
        &self.name
    }
}

impl ConsumerDestination for StaticConsumerDestination {}

/// Producer destination with a fixed partition count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticProducerDestination {
    name: String,
    partition_count: u32,
}

impl StaticProducerDestination {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition_count: 1,
        }
    }

    pub fn with_partitions(mut self, partition_count: u32) -> Self {
        self.partition_count = partition_count.max(1);
        self
    }

    pub fn partition_count(&self) -> u32 {
        self.partition_count
    }
}

impl Destination for StaticProducerDestination {
    fn name(&self) -> &str {
        &self.name
    }
}

impl ProducerDestination for StaticProducerDestination {
    fn name_for_partition(&self, partition: u32) -> String {
        if self.partition_count == 1 {
            self.name.clone()
        } else {
            format!("{}-{}", self.name, partition)
        }
    }
}
