use anyhow::Context;
use raptor_bus::{
    BusResult, EventBus, EventSink, NodeHighlight, TextHighlight, HIGHLIGHT_NODE_TOPIC,
    HIGHLIGHT_TEXT_TOPIC,
};
use raptor_core::config::DEFAULT_CONFIG_FILE;
use raptor_core::logging::init_logging;
use raptor_core::{
    log_error, AppConfig, ChatMessage, ChatRole, GraphMode, GraphStatus, MockGraphData,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;

type Transcript = Arc<Mutex<Vec<ChatMessage>>>;

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let cfg = AppConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    init_logging(&cfg.logging.filter);

    if let Err(err) = run(&cfg) {
        log_error("raptor-console", &*err);
        return Err(err);
    }
    Ok(())
}

fn run(cfg: &AppConfig) -> anyhow::Result<()> {
    let graph = match cfg.graph.mode {
        GraphMode::Mock => {
            set_status(GraphStatus::Rendering);
            let graph = cfg.graph.mock_graph().context("loading mock graph")?;
            graph.validate().context("mock graph is inconsistent")?;
            graph
        }
        GraphMode::Neovis => {
            set_status(GraphStatus::Connecting);
            info!(
                neo4j = ?cfg.graph.neo4j,
                "neovis mode renders in the browser, nothing to highlight here"
            );
            return Ok(());
        }
    };
    set_status(GraphStatus::Ready);

    let bus = EventBus::new();
    let transcript = Transcript::default();
    wire_listeners(&bus, Arc::new(graph.clone()), Arc::clone(&transcript));

    let emitted = highlight_graph(&bus, &graph)?;
    info!(emitted, "highlight pass finished");

    let transcript = transcript
        .lock()
        .map_err(|_| anyhow::anyhow!("transcript lock poisoned"))?;
    println!("{}", serde_json::to_string_pretty(&*transcript)?);
    Ok(())
}

fn set_status(status: GraphStatus) {
    info!(%status, busy = status.is_busy(), "graph status");
}

fn wire_listeners(bus: &EventBus, graph: Arc<MockGraphData>, transcript: Transcript) {
    let log = Arc::clone(&transcript);
    bus.on_topic(HIGHLIGHT_NODE_TOPIC, move |highlight: NodeHighlight| {
        let Some(node) = graph.node(&highlight.id) else {
            tracing::warn!(id = %highlight.id, "highlight for unknown node");
            return;
        };
        let causes = graph.edges_of(&node.id).filter(|e| e.to == node.id).count();
        info!(id = %node.id, label = %node.label, causes, "node highlighted");
        if let Ok(mut entries) = log.lock() {
            entries.push(ChatMessage::now(
                ChatRole::Assistant,
                format!(
                    "{} ({}) has {} direct cause(s)",
                    node.label, node.group, causes
                ),
            ));
        }
    });

    bus.on_topic(HIGHLIGHT_TEXT_TOPIC, move |highlight: TextHighlight| {
        info!(text = %highlight.text, "text highlighted");
        if let Ok(mut entries) = transcript.lock() {
            entries.push(ChatMessage::now(ChatRole::User, highlight.text));
        }
    });
}

/// Highlights every node and its label, returning the number of events sent.
fn highlight_graph(sink: &dyn EventSink, graph: &MockGraphData) -> BusResult<usize> {
    let mut emitted = 0;
    for node in &graph.nodes {
        HIGHLIGHT_TEXT_TOPIC.emit(
            sink,
            &TextHighlight {
                text: node.label.clone(),
            },
        )?;
        HIGHLIGHT_NODE_TOPIC.emit(sink, &NodeHighlight::from(node))?;
        emitted += 2;
    }
    Ok(emitted)
}
