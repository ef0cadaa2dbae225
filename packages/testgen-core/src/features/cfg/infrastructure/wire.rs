//! ControlFlowProgram JSON wire format
//!
//! `{ entry, successExit, errorExit, nodes, edges, functions }` with node
//! and edge types as string enums. Entry/exit references are reconstructed
//! by id lookup and fail loudly when an id is missing. Contraction metadata
//! is deliberately not part of this format: re-parsing a previously
//! contracted graph always yields an uncontracted graph.

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::shared::models::{Edge, Node};

use super::super::domain::{ControlFlowGraph, ControlFlowProgram, FunctionGraph};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphWire {
    entry: String,
    success_exit: String,
    error_exit: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FunctionWire {
    id: String,
    name: String,
    #[serde(flatten)]
    graph: GraphWire,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgramWire {
    #[serde(flatten)]
    graph: GraphWire,
    #[serde(default)]
    functions: Vec<FunctionWire>,
}

impl GraphWire {
    fn into_graph(self) -> Result<ControlFlowGraph> {
        ControlFlowGraph::new(
            self.entry,
            self.success_exit,
            self.error_exit,
            self.nodes,
            self.edges,
        )
    }

    fn from_graph(graph: &ControlFlowGraph) -> Self {
        Self {
            entry: graph.entry().clone(),
            success_exit: graph.success_exit().clone(),
            error_exit: graph.error_exit().clone(),
            nodes: graph.nodes().cloned().collect(),
            edges: graph.edges().cloned().collect(),
        }
    }
}

/// Parse a `ControlFlowProgram` from its JSON wire form
pub fn parse_program(json: &str) -> Result<ControlFlowProgram> {
    let wire: ProgramWire = serde_json::from_str(json)?;
    let graph = wire.graph.into_graph()?;
    let mut functions = Vec::with_capacity(wire.functions.len());
    for f in wire.functions {
        functions.push(FunctionGraph {
            id: f.id,
            name: f.name,
            graph: f.graph.into_graph()?,
        });
    }
    Ok(ControlFlowProgram::new(graph, functions))
}

/// Serialize a `ControlFlowProgram` back to the wire shape
pub fn serialize_program(program: &ControlFlowProgram) -> Result<String> {
    let wire = ProgramWire {
        graph: GraphWire::from_graph(&program.graph),
        functions: program
            .functions
            .iter()
            .map(|f| FunctionWire {
                id: f.id.clone(),
                name: f.name.clone(),
                graph: GraphWire::from_graph(&f.graph),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&wire)?)
}
