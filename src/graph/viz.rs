//! Mermaid export of a compiled graph's topology.

use std::fmt::Write;

use super::compiled::CompiledGraph;
use crate::types::NodeId;

fn mermaid_id(node: &NodeId) -> String {
    match node {
        NodeId::Start => "__start__".to_string(),
        NodeId::End => "__end__".to_string(),
        NodeId::Named(name) => name.replace(|c: char| !c.is_alphanumeric() && c != '_', "_"),
    }
}

impl CompiledGraph {
    /// Render the topology as a Mermaid `graph TD` diagram.
    ///
    /// Output is deterministic (nodes and edges sorted), so it can be
    /// committed next to the graph definition and diffed. Unconditional edges
    /// use solid arrows; mapped conditional edges use dotted arrows labeled
    /// with the router key. A router without a mapping has no static targets
    /// and is noted as a comment.
    #[must_use]
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");
        let _ = writeln!(out, "    __start__([Start])");
        let _ = writeln!(out, "    __end__([End])");
        for node in self.node_ids() {
            let _ = writeln!(out, "    {}[\"{}\"]", mermaid_id(&node), node);
        }

        let mut lines: Vec<String> = Vec::new();
        for (from, to) in &self.inner().edges {
            lines.push(format!(
                "    {} --> {}",
                mermaid_id(from),
                mermaid_id(to)
            ));
        }
        for (from, edge) in &self.inner().conditional_edges {
            match edge.mapping() {
                Some(mapping) => {
                    for (key, target) in mapping {
                        lines.push(format!(
                            "    {} -. \"{}\" .-> {}",
                            mermaid_id(from),
                            key,
                            mermaid_id(target)
                        ));
                    }
                }
                None => {
                    lines.push(format!(
                        "    %% {}: dynamic router, targets resolved at run time",
                        mermaid_id(from)
                    ));
                }
            }
        }
        lines.sort_unstable();
        for line in lines {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}
