//! Graphviz dump of the data dependency graph, for debugging.

use std::fmt::Write as _;

use petgraph::visit::EdgeRef;
use vanta_ir::Block;

use super::{Ddg, StmtId};

impl Ddg {
    /// Render the graph in graphviz dot format.
    ///
    /// Node labels include the statement text, its order, and the
    /// remaining-cycles annotation when present; edge labels show the
    /// weight and the causes of the dependency.
    pub fn dump_dot(&self, block: &Block) -> String {
        let mut out = String::new();
        out.push_str("digraph ddg {\n");
        out.push_str("\n");
        out.push_str("  graph [ rankdir=TD ]\n");
        out.push_str("  edge [ fontsize=16, arrowhead=vee, arrowsize=0.5 ]\n");
        out.push_str("\n");

        for index in self.graph.node_indices() {
            let node = &self.graph[index];
            let description = match node.stmt {
                StmtId::Source => "SOURCE".to_string(),
                StmtId::Sink => "SINK".to_string(),
                StmtId::Stmt(i) => match block.statement(i as usize) {
                    Some(instruction) => escape(&instruction.to_string()),
                    None => format!("stmt {i}"),
                },
            };
            let _ = write!(
                out,
                "  n{} [ label=<n{}, order {}",
                index.index(),
                index.index(),
                node.order
            );
            if let Some(remaining) = node.remaining {
                let _ = write!(out, ", remaining {remaining}");
            }
            let _ = writeln!(
                out,
                "<br/>{description}>, shape=box, style=filled, fontsize=16 ]"
            );
        }
        out.push_str("\n");

        for edge in self.graph.edge_references() {
            let _ = write!(
                out,
                "  n{} -> n{} [ label=<{}",
                edge.source().index(),
                edge.target().index(),
                edge.weight().weight
            );
            for cause in &edge.weight().causes {
                let _ = write!(out, "<br/>{}", escape(&cause.to_string()));
            }
            out.push_str("> ]\n");
        }

        out.push_str("\n}\n");
        out
    }
}

fn escape(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use crate::ddg::build::build;
    use vanta_ir::{Block, QubitId};

    #[test]
    fn test_dump_dot_mentions_all_statements() {
        let mut block = Block::with_size("dot", 2, 0);
        block.h(QubitId(0)).unwrap();
        block.cx(QubitId(0), QubitId(1)).unwrap();
        let ddg = build(&block, true, true);
        let dot = ddg.dump_dot(&block);
        assert!(dot.starts_with("digraph ddg {"));
        assert!(dot.contains("SOURCE"));
        assert!(dot.contains("SINK"));
        assert!(dot.contains("h q0"));
        assert!(dot.contains("cx q0, q1"));
        assert!(dot.contains("WAW") || dot.contains("XAW") || dot.contains("ZAW"));
    }
}
