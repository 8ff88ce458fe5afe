pub mod queue_manager;

pub use queue_manager::{create_shared_queue_manager, QueueManager, SharedQueueManager};
