//! Sink node: terminal box that displays the last value it received

use log::info;

use crate::nodes::factory::{BehaviorFactory, BehaviorMetadata, DataType};
use crate::nodes::interface::{Behavior, BehaviorError, NodeContext, NodeData, PortLayout};
use crate::nodes::port::PortId;

#[derive(Debug, Default)]
pub struct SinkBehavior {
    label: Option<String>,
    last: Option<NodeData>,
}

impl SinkBehavior {
    pub fn last_value(&self) -> Option<&NodeData> {
        self.last.as_ref()
    }
}

impl BehaviorFactory for SinkBehavior {
    fn metadata() -> BehaviorMetadata {
        BehaviorMetadata::new("sink", "output", "Displays the last value received")
    }

    fn create() -> Box<dyn Behavior> {
        Box::new(SinkBehavior::default())
    }
}

impl Behavior for SinkBehavior {
    fn class_name(&self) -> &str {
        "sink"
    }

    fn port_layout(&self) -> Option<PortLayout> {
        Some(PortLayout::new(vec![DataType::Any], vec![]))
    }

    /// Arguments become a label used when logging received values
    fn init(&mut self, args: &[String], _node: &mut NodeContext<'_>) -> Result<(), BehaviorError> {
        self.label = (!args.is_empty()).then(|| args.join(" "));
        Ok(())
    }

    fn on_data(&mut self, _inlet: PortId, data: NodeData, node: &mut NodeContext<'_>) -> Result<(), BehaviorError> {
        match &self.label {
            Some(label) => info!("{}: {}", label, data),
            None => info!("sink {}: {}", node.node_id(), data),
        }
        self.last = Some(data);
        Ok(())
    }

    fn display(&self) -> Option<String> {
        self.last.as_ref().map(|value| value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::graph::NodeGraph;
    use egui::Pos2;

    #[test]
    fn test_sink_keeps_latest_value() {
        let mut graph = NodeGraph::new();
        let sink = graph.create_node(Pos2::ZERO, "sink result", 0, 0);
        assert_eq!(graph.node(sink).unwrap().inlet_count(), 1);
        assert_eq!(graph.display(sink), None);

        graph.deliver(sink, 0, NodeData::Float(1.5)).unwrap();
        graph.deliver(sink, 0, NodeData::Boolean(false)).unwrap();
        assert_eq!(graph.display(sink).as_deref(), Some("false"));
    }
}
