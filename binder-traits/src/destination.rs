//! Provisioned Destinations
//!
//! Provisioners create physical resources on a broker (queues, topics,
//! partition sets) and hand back a descriptor. Bindings treat descriptors as
//! opaque and only ever read their names.

use std::fmt;

/// Common surface of every provisioned destination.
pub trait Destination: fmt::Debug + Send + Sync {
    /// Backend name of the destination (topic, queue, exchange...).
    fn name(&self) -> &str;
}

/// Destination provisioned for the consuming side of a binding.
pub trait ConsumerDestination: Destination {}

/// Destination provisioned for the producing side of a binding.
pub trait ProducerDestination: Destination {
    /// Backend name of a single partition of this destination.
    ///
    /// Backends without native partitioning typically suffix the partition
    /// index to the destination name.
    fn name_for_partition(&self, partition: u32) -> String {
        format!("{}-{}", self.name(), partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Topic(&'static str);

    impl Destination for Topic {
        fn name(&self) -> &str {
            self.0
        }
    }

    impl ProducerDestination for Topic {}

    #[test]
    fn test_default_partition_name() {
        let topic = Topic("orders");
        assert_eq!(topic.name_for_partition(0), "orders-0");
        assert_eq!(topic.name_for_partition(7), "orders-7");
    }
}
