//! Domain services - Pure rules over domain entities

mod attribute_aggregator;
mod topic_status;

pub use attribute_aggregator::aggregate;
pub use topic_status::derive_topic_statuses;
