//! Dependency resolution between entities
//!
//! An entity depends on another when it declares a `<name>_id` field whose
//! prefix names the other entity. Edges are inferred from this convention
//! only. [`resolve_order`] returns a depth-first topological order in which
//! every referenced entity precedes the entities referencing it; a cycle is
//! fatal and is never broken.

use crate::model::{Entity, Field};
use crate::{GeneratorError, Result};
use heck::ToSnakeCase;
use std::collections::HashSet;
use tracing::debug;

/// Whether `field` is a foreign key pointing at `target`
pub fn references(field: &Field, target: &Entity) -> bool {
    match field.foreign_key_prefix() {
        Some(prefix) => {
            prefix.eq_ignore_ascii_case(&target.name) || prefix == target.name.to_snake_case()
        }
        None => false,
    }
}

/// Find the entity a field points at, ignoring self references
pub fn referenced_entity<'a>(
    owner: &Entity,
    field: &Field,
    entities: &'a [Entity],
) -> Option<&'a Entity> {
    entities
        .iter()
        .find(|target| target.name != owner.name && references(field, target))
}

/// Dependency graph over a slice of entities, indexed by position
#[derive(Debug)]
pub struct DependencyGraph<'a> {
    entities: &'a [Entity],
    edges: Vec<Vec<usize>>,
}

impl<'a> DependencyGraph<'a> {
    /// Build the graph, rejecting duplicate entity names
    pub fn build(entities: &'a [Entity]) -> Result<Self> {
        let mut seen = HashSet::new();
        for entity in entities {
            if !seen.insert(entity.name.as_str()) {
                return Err(GeneratorError::DuplicateEntity {
                    name: entity.name.clone(),
                });
            }
        }

        let edges = entities
            .iter()
            .map(|owner| {
                let mut deps = Vec::new();
                for field in &owner.fields {
                    // A table may reference itself, so self references add no edge.
                    let target = entities
                        .iter()
                        .position(|t| t.name != owner.name && references(field, t));
                    if let Some(idx) = target {
                        if !deps.contains(&idx) {
                            deps.push(idx);
                        }
                    }
                }
                deps
            })
            .collect();

        Ok(Self { entities, edges })
    }

    /// Indices of the entities `idx` depends on, in field order
    pub fn dependencies(&self, idx: usize) -> &[usize] {
        &self.edges[idx]
    }

    /// Topological order of entity indices
    pub fn resolve(&self) -> Result<Vec<usize>> {
        let mut marks = vec![Mark::Unvisited; self.entities.len()];
        let mut stack = Vec::new();
        let mut order = Vec::with_capacity(self.entities.len());

        for idx in 0..self.entities.len() {
            if marks[idx] == Mark::Unvisited {
                self.visit(idx, &mut marks, &mut stack, &mut order)?;
            }
        }

        Ok(order)
    }

    fn visit(
        &self,
        idx: usize,
        marks: &mut [Mark],
        stack: &mut Vec<usize>,
        order: &mut Vec<usize>,
    ) -> Result<()> {
        marks[idx] = Mark::InProgress;
        stack.push(idx);

        for &dep in self.dependencies(idx) {
            match marks[dep] {
                Mark::Done => {}
                Mark::Unvisited => self.visit(dep, marks, stack, order)?,
                Mark::InProgress => return Err(self.cycle_error(stack, dep)),
            }
        }

        stack.pop();
        marks[idx] = Mark::Done;
        order.push(idx);
        Ok(())
    }

    fn cycle_error(&self, stack: &[usize], start: usize) -> GeneratorError {
        let from = stack.iter().position(|&i| i == start).unwrap_or(0);
        let mut cycle: Vec<String> = stack[from..]
            .iter()
            .map(|&i| self.entities[i].name.clone())
            .collect();
        cycle.push(self.entities[start].name.clone());
        GeneratorError::Cycle { cycle }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Resolve a generation order, returning entity indices
pub fn resolve_order(entities: &[Entity]) -> Result<Vec<usize>> {
    DependencyGraph::build(entities)?.resolve()
}

/// Reorder entities so that every dependency precedes its dependents
pub fn sort_entities(entities: Vec<Entity>) -> Result<Vec<Entity>> {
    let order = resolve_order(&entities)?;
    let mut slots: Vec<Option<Entity>> = entities.into_iter().map(Some).collect();
    let sorted: Vec<Entity> = order
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect();

    debug!(
        order = ?sorted.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
        "resolved generation order"
    );
    Ok(sorted)
}
