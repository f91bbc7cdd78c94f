//! Placed machines and the belts between them.
//!
//! A [`Layout`] is plain data. Its mutators do bookkeeping only (removing an
//! item also removes its belts); placement and wiring rules are enforced by
//! whoever owns the layout before calling them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::catalog::Catalog;
use crate::id::{BlueprintId, ConnectionId, ItemId, PortRef};
use crate::model::{Connection, MachineBlueprint, PlacedItem, Port};

/// Placed items and connections, keyed by generational ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layout {
    items: SlotMap<ItemId, PlacedItem>,
    connections: SlotMap<ConnectionId, Connection>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Items --

    pub fn item(&self, id: ItemId) -> Option<&PlacedItem> {
        self.items.get(id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut PlacedItem> {
        self.items.get_mut(id)
    }

    pub fn items(&self) -> impl Iterator<Item = (ItemId, &PlacedItem)> {
        self.items.iter()
    }

    pub fn contains_item(&self, id: ItemId) -> bool {
        self.items.contains_key(id)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn insert_item(&mut self, item: PlacedItem) -> ItemId {
        self.items.insert(item)
    }

    /// Remove an item and every connection touching it.
    pub fn remove_item(&mut self, id: ItemId) -> Option<PlacedItem> {
        let removed = self.items.remove(id)?;
        self.connections
            .retain(|_, c| c.source.item != id && c.target.item != id);
        Some(removed)
    }

    /// Remove every instance of a blueprint (and their connections).
    /// Returns the removed item ids.
    pub fn remove_instances_of(&mut self, blueprint: BlueprintId) -> Vec<ItemId> {
        let doomed: Vec<ItemId> = self
            .items
            .iter()
            .filter(|(_, item)| item.blueprint == blueprint)
            .map(|(id, _)| id)
            .collect();
        for &id in &doomed {
            self.remove_item(id);
        }
        doomed
    }

    // -- Connections --

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn connections(&self) -> impl Iterator<Item = (ConnectionId, &Connection)> {
        self.connections.iter()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn insert_connection(&mut self, connection: Connection) -> ConnectionId {
        self.connections.insert(connection)
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        self.connections.remove(id)
    }

    /// Connections whose source is on `item`.
    pub fn connections_from(
        &self,
        item: ItemId,
    ) -> impl Iterator<Item = (ConnectionId, &Connection)> {
        self.connections
            .iter()
            .filter(move |(_, c)| c.source.item == item)
    }

    /// Connections whose target is on `item`.
    pub fn connections_into(
        &self,
        item: ItemId,
    ) -> impl Iterator<Item = (ConnectionId, &Connection)> {
        self.connections
            .iter()
            .filter(move |(_, c)| c.target.item == item)
    }

    /// The connection leaving this port, if any.
    pub fn connection_from_port(&self, port: PortRef) -> Option<ConnectionId> {
        self.connections
            .iter()
            .find(|(_, c)| c.source == port)
            .map(|(id, _)| id)
    }

    /// The connection arriving at this port, if any.
    pub fn connection_into_port(&self, port: PortRef) -> Option<ConnectionId> {
        self.connections
            .iter()
            .find(|(_, c)| c.target == port)
            .map(|(id, _)| id)
    }

    /// Number of distinct ports on `item` that some connection targets.
    pub fn connected_input_count(&self, item: ItemId) -> usize {
        self.connections_into(item)
            .map(|(_, c)| c.target.port)
            .collect::<BTreeSet<_>>()
            .len()
    }

    // -- Catalog lookups --

    /// Blueprint of a placed item, if both exist.
    pub fn blueprint_of<'a>(
        &self,
        catalog: &'a Catalog,
        item: ItemId,
    ) -> Option<&'a MachineBlueprint> {
        catalog.blueprint(self.items.get(item)?.blueprint)
    }

    /// Resolve a port reference. Missing items, missing blueprints and
    /// out-of-range indices all yield `None`.
    pub fn port<'a>(&self, catalog: &'a Catalog, port: PortRef) -> Option<&'a Port> {
        self.blueprint_of(catalog, port.item)?.port(port.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn remove_item_cascades_connections() {
        let mut layout = Layout::new();
        let a = place(&mut layout, miner(), 0, 0);
        let b = place(&mut layout, assembler(), 5, 0);
        let c = place(&mut layout, assembler(), 10, 0);
        layout.insert_connection(Connection {
            source: PortRef::new(a, 0),
            target: PortRef::new(b, 0),
        });
        let kept = layout.insert_connection(Connection {
            source: PortRef::new(b, 2),
            target: PortRef::new(c, 0),
        });

        assert!(layout.remove_item(a).is_some());
        assert_eq!(layout.connection_count(), 1);
        assert!(layout.connection(kept).is_some());
        assert!(layout.remove_item(a).is_none());
    }

    #[test]
    fn remove_instances_of_blueprint() {
        let mut layout = Layout::new();
        let a = place(&mut layout, assembler(), 0, 0);
        let b = place(&mut layout, assembler(), 5, 0);
        let m = place(&mut layout, miner(), 10, 0);
        layout.insert_connection(Connection {
            source: PortRef::new(m, 0),
            target: PortRef::new(a, 0),
        });

        let removed = layout.remove_instances_of(assembler());
        assert_eq!(removed.len(), 2);
        assert!(removed.contains(&a) && removed.contains(&b));
        assert_eq!(layout.item_count(), 1);
        assert_eq!(layout.connection_count(), 0);
    }

    #[test]
    fn port_lookup_fails_closed() {
        let catalog = sample_catalog();
        let mut layout = Layout::new();
        let a = place(&mut layout, assembler(), 0, 0);
        let ghost = place(&mut layout, BlueprintId(999), 5, 5);

        assert!(layout.port(&catalog, PortRef::new(a, 0)).is_some());
        assert!(layout.port(&catalog, PortRef::new(a, 42)).is_none());
        assert!(layout.port(&catalog, PortRef::new(ghost, 0)).is_none());
    }

    #[test]
    fn connected_input_count_is_distinct_ports() {
        let mut layout = Layout::new();
        let m1 = place(&mut layout, miner(), 0, 0);
        let m2 = place(&mut layout, miner(), 0, 3);
        let a = place(&mut layout, assembler(), 5, 0);
        assert_eq!(layout.connected_input_count(a), 0);

        layout.insert_connection(Connection {
            source: PortRef::new(m1, 0),
            target: PortRef::new(a, 0),
        });
        layout.insert_connection(Connection {
            source: PortRef::new(m2, 0),
            target: PortRef::new(a, 1),
        });
        assert_eq!(layout.connected_input_count(a), 2);
        assert!(layout.connection_into_port(PortRef::new(a, 1)).is_some());
        assert!(layout.connection_from_port(PortRef::new(m1, 0)).is_some());
        assert!(layout.connection_from_port(PortRef::new(a, 2)).is_none());
    }
}
