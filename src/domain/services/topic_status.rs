//! Topic status derivation - Persisted completion records to locked/active/completed

use std::collections::HashMap;

use crate::domain::entities::{Topic, TopicProgress, TopicStatus, TopicWithStatus};
use crate::domain::value_objects::TopicId;

/// Derive the status of every topic of one dungeon.
///
/// Topics are walked by `position`. Everything before the first topic without
/// a completed record is `Completed`, that topic is `Active`, everything after
/// it is `Locked`. A fully completed dungeon has no active topic.
pub fn derive_topic_statuses(
    topics: &[Topic],
    progress: &[TopicProgress],
) -> Vec<TopicWithStatus> {
    let records: HashMap<TopicId, &TopicProgress> =
        progress.iter().map(|p| (p.topic_id, p)).collect();

    let mut ordered: Vec<&Topic> = topics.iter().collect();
    ordered.sort_by_key(|t| t.position);

    let mut frontier_reached = false;
    ordered
        .into_iter()
        .map(|topic| {
            let record = records.get(&topic.id);
            let completed = record.map(|p| p.completed).unwrap_or(false);

            let status = if frontier_reached {
                TopicStatus::Locked
            } else if completed {
                TopicStatus::Completed
            } else {
                frontier_reached = true;
                TopicStatus::Active
            };

            TopicWithStatus {
                topic: topic.clone(),
                status,
                stars: record.filter(|p| p.completed).map(|p| p.stars),
            }
        })
        .collect()
}
