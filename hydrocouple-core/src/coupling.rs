//! The table of variable transfers between the coupled models.
//!
//! Each edge copies one named value from a source model to a destination model.
//! Edges are grouped into stages which the scheduler executes in a fixed order,
//! and within a stage they keep their insertion order.
//! The graph is held as a petgraph [`Graph`] with one node per model, so it can be
//! inspected and rendered for debugging.

use crate::errors::{CouplingError, CouplingResult};
use crate::handle::{ModelKind, ModelSet};
use crate::scheme::{RunoffScheme, SoilMoistureMethod};
use crate::standard_variables::*;
use crate::variable::VariableDefinition;
use petgraph::dot::{Config, Dot};
use petgraph::graph::NodeIndex;
use petgraph::Graph;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Points in the step sequence at which transfers happen
///
/// Listed in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TransferStage {
    /// Meteorological forcing into evapotranspiration, committed as one bundle
    ForcingToEvapotranspiration,
    ForcingToRunoff,
    EvapotranspirationToRunoff,
    /// The runoff scheme code, so the freeze-thaw model reports the matching ice fraction
    RunoffSchemeToFreezeThaw,
    /// Ice fraction under the active runoff scheme
    FreezeThawToRunoff,
    RunoffToSoilMoistureProfile,
    SoilMoistureProfileToFreezeThaw,
}

impl TransferStage {
    pub const ORDER: [TransferStage; 7] = [
        TransferStage::ForcingToEvapotranspiration,
        TransferStage::ForcingToRunoff,
        TransferStage::EvapotranspirationToRunoff,
        TransferStage::RunoffSchemeToFreezeThaw,
        TransferStage::FreezeThawToRunoff,
        TransferStage::RunoffToSoilMoistureProfile,
        TransferStage::SoilMoistureProfileToFreezeThaw,
    ];

    /// Whether the stage belongs to the optional ice fraction exchange
    pub fn is_frozen_fraction(self) -> bool {
        matches!(
            self,
            TransferStage::RunoffSchemeToFreezeThaw | TransferStage::FreezeThawToRunoff
        )
    }
}

/// Gate on a coupling edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EdgeCondition {
    Always,
    /// Only when the runoff model uses this scheme
    RunoffScheme(RunoffScheme),
}

/// The configuration the coupled models reported at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouplingSelection {
    pub runoff_scheme: RunoffScheme,
    pub soil_moisture_method: SoilMoistureMethod,
    /// Whether the ice fraction exchange runs at all
    pub frozen_fraction: bool,
}

impl EdgeCondition {
    pub fn is_active(&self, runoff_scheme: RunoffScheme) -> bool {
        match self {
            EdgeCondition::Always => true,
            EdgeCondition::RunoffScheme(scheme) => *scheme == runoff_scheme,
        }
    }
}

/// A one-step copy of a named value from one model to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CouplingEdge {
    pub stage: TransferStage,
    pub source: ModelKind,
    pub source_key: &'static str,
    pub destination: ModelKind,
    pub destination_key: &'static str,
    pub condition: EdgeCondition,
}

impl CouplingEdge {
    fn new(
        stage: TransferStage,
        source: ModelKind,
        source_var: &VariableDefinition,
        destination: ModelKind,
        destination_var: &VariableDefinition,
    ) -> Self {
        Self {
            stage,
            source,
            source_key: source_var.name,
            destination,
            destination_key: destination_var.name,
            condition: EdgeCondition::Always,
        }
    }

    fn when(self, condition: EdgeCondition) -> Self {
        Self { condition, ..self }
    }
}

impl fmt::Display for CouplingEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.source, self.source_key, self.destination, self.destination_key
        )
    }
}

/// The fixed set of transfers between the coupled models
#[derive(Debug, Clone, Serialize)]
pub struct CouplingGraph {
    graph: Graph<ModelKind, CouplingEdge>,
    nodes: HashMap<ModelKind, NodeIndex>,
}

impl Default for CouplingGraph {
    fn default() -> Self {
        Self::standard()
    }
}

impl CouplingGraph {
    /// An empty graph containing a node for each model
    pub fn empty() -> Self {
        let mut graph = Graph::new();
        let nodes = ModelKind::INITIALIZATION_ORDER
            .iter()
            .map(|kind| (*kind, graph.add_node(*kind)))
            .collect();
        Self { graph, nodes }
    }

    /// The transfers between forcing, evapotranspiration, runoff, freeze-thaw and
    /// soil moisture profile models
    pub fn standard() -> Self {
        use ModelKind::*;
        use TransferStage::*;

        let mut graph = Self::empty();

        for var in MET_FORCING_VARIABLES {
            graph.add_edge(CouplingEdge::new(
                ForcingToEvapotranspiration,
                Forcing,
                var,
                Evapotranspiration,
                var,
            ));
        }

        graph.add_edge(CouplingEdge::new(
            ForcingToRunoff,
            Forcing,
            &VAR_PRECIPITATION_RATE,
            Runoff,
            &VAR_PRECIPITATION_RATE,
        ));
        graph.add_edge(CouplingEdge::new(
            EvapotranspirationToRunoff,
            Evapotranspiration,
            &VAR_POTENTIAL_ET,
            Runoff,
            &VAR_POTENTIAL_ET,
        ));

        graph.add_edge(CouplingEdge::new(
            RunoffSchemeToFreezeThaw,
            Runoff,
            &VAR_SURFACE_RUNOFF_SCHEME,
            FreezeThaw,
            &VAR_ICE_FRACTION_SCHEME,
        ));
        graph.add_edge(
            CouplingEdge::new(
                FreezeThawToRunoff,
                FreezeThaw,
                &VAR_ICE_FRACTION_SCHAAKE,
                Runoff,
                &VAR_ICE_FRACTION_SCHAAKE,
            )
            .when(EdgeCondition::RunoffScheme(RunoffScheme::Schaake)),
        );
        graph.add_edge(
            CouplingEdge::new(
                FreezeThawToRunoff,
                FreezeThaw,
                &VAR_ICE_FRACTION_XINANJIANG,
                Runoff,
                &VAR_ICE_FRACTION_XINANJIANG,
            )
            .when(EdgeCondition::RunoffScheme(RunoffScheme::Xinanjiang)),
        );

        graph.add_edge(CouplingEdge::new(
            RunoffToSoilMoistureProfile,
            Runoff,
            &VAR_SOIL_STORAGE,
            SoilMoistureProfile,
            &VAR_SOIL_STORAGE_SMP,
        ));
        graph.add_edge(CouplingEdge::new(
            RunoffToSoilMoistureProfile,
            Runoff,
            &VAR_SOIL_STORAGE_CHANGE,
            SoilMoistureProfile,
            &VAR_SOIL_STORAGE_CHANGE_SMP,
        ));

        graph.add_edge(CouplingEdge::new(
            SoilMoistureProfileToFreezeThaw,
            SoilMoistureProfile,
            &VAR_SOIL_MOISTURE_PROFILE,
            FreezeThaw,
            &VAR_SOIL_MOISTURE_PROFILE,
        ));

        graph
    }

    pub fn add_edge(&mut self, edge: CouplingEdge) {
        let source = self.nodes[&edge.source];
        let destination = self.nodes[&edge.destination];
        self.graph.add_edge(source, destination, edge);
    }

    /// Every edge in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &CouplingEdge> {
        self.graph.edge_indices().map(move |index| &self.graph[index])
    }

    /// Edges of one stage, in insertion order
    pub fn stage(&self, stage: TransferStage) -> impl Iterator<Item = &CouplingEdge> {
        self.edges().filter(move |edge| edge.stage == stage)
    }

    /// Edges of one stage that are active under the given runoff scheme
    pub fn active_edges(
        &self,
        stage: TransferStage,
        runoff_scheme: RunoffScheme,
    ) -> Vec<&CouplingEdge> {
        self.stage(stage)
            .filter(|edge| edge.condition.is_active(runoff_scheme))
            .collect()
    }

    /// Check that both ends of every active edge recognise their keys
    ///
    /// Run once at startup so that a misnamed key is reported before the first step
    /// rather than part way through a run.
    pub fn validate(&self, models: &ModelSet, selection: &CouplingSelection) -> CouplingResult<()> {
        for stage in TransferStage::ORDER {
            if stage.is_frozen_fraction() && !selection.frozen_fraction {
                continue;
            }
            for edge in self.active_edges(stage, selection.runoff_scheme) {
                let source = models.get(edge.source);
                if !source.provides(edge.source_key) {
                    return Err(CouplingError::UnresolvedEdge {
                        edge: edge.to_string(),
                        component: source.component_name().to_string(),
                        key: edge.source_key.to_string(),
                        direction: "provide",
                    });
                }
                let destination = models.get(edge.destination);
                if !destination.accepts(edge.destination_key) {
                    return Err(CouplingError::UnresolvedEdge {
                        edge: edge.to_string(),
                        component: destination.component_name().to_string(),
                        key: edge.destination_key.to_string(),
                        direction: "accept",
                    });
                }
            }
        }
        Ok(())
    }

    /// Create a diagram that represents the coupling graph.
    ///
    /// Useful for debugging.
    pub fn as_dot(&self) -> Dot<'_, &Graph<ModelKind, CouplingEdge>> {
        Dot::with_attr_getters(
            &self.graph,
            &[Config::NodeNoLabel, Config::EdgeNoLabel],
            &|_, edge| {
                let weight = edge.weight();
                let label = if weight.source_key == weight.destination_key {
                    weight.source_key.to_string()
                } else {
                    format!("{} -> {}", weight.source_key, weight.destination_key)
                };
                format!("label = {:?}", label)
            },
            &|_, (_, kind)| format!("label = {:?}", kind.to_string()),
        )
    }
}
