pub mod bus;
pub mod error;
pub mod topic;

pub use bus::{BusEvent, EventBus, EventSink, Listener};
pub use error::{BusError, BusResult};
pub use topic::{
    NodeHighlight, TextHighlight, Topic, HIGHLIGHT_NODE, HIGHLIGHT_NODE_TOPIC, HIGHLIGHT_TEXT,
    HIGHLIGHT_TEXT_TOPIC,
};
