//! Tile catalog: edge prototypes, tile prototypes and catalog loading.
//!
//! A [`Catalog`] is always valid: every edge type id is unique, every tile
//! side references a known edge type, weights are positive and costs are
//! finite and non-negative. The edit operations keep it that way.

use crate::edge::{Direction, EdgeAssignment, EdgePrototype};
use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Index of a tile prototype within its catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrototypeId(pub usize);

impl fmt::Display for PrototypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A catalog entry: one tile design before rotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TilePrototype {
    pub name: String,
    /// Relative selection weight. Always positive.
    pub weight: u32,
    pub cost: f64,
    /// Side assignments in north, east, south, west order.
    pub edges: [EdgeAssignment; 4],
}

impl TilePrototype {
    pub fn new(name: impl Into<String>, weight: u32, edges: [EdgeAssignment; 4]) -> Self {
        Self {
            name: name.into(),
            weight,
            cost: 0.0,
            edges,
        }
    }

    /// A tile whose four sides all carry the same assignment.
    pub fn uniform(name: impl Into<String>, weight: u32, edge: EdgeAssignment) -> Self {
        let edges = [edge.clone(), edge.clone(), edge.clone(), edge];
        Self::new(name, weight, edges)
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn edge(&self, direction: Direction) -> &EdgeAssignment {
        &self.edges[direction.index()]
    }

    /// True when no side has an edge type.
    pub fn is_blank(&self) -> bool {
        self.edges.iter().all(|e| !e.is_assigned())
    }
}

/// Edge prototypes plus the ordered list of tile prototypes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    edge_types: Vec<EdgePrototype>,
    tiles: Vec<TilePrototype>,
}

impl Catalog {
    /// Build and validate a catalog.
    pub fn new(
        edge_types: Vec<EdgePrototype>,
        tiles: Vec<TilePrototype>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self { edge_types, tiles };
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for edge_type in &self.edge_types {
            if !seen.insert(edge_type.id.as_str()) {
                return Err(CatalogError::DuplicateEdgeType(edge_type.id.clone()));
            }
        }
        for tile in &self.tiles {
            self.validate_tile(tile)?;
        }
        Ok(())
    }

    fn validate_tile(&self, tile: &TilePrototype) -> Result<(), CatalogError> {
        if tile.weight == 0 {
            return Err(CatalogError::InvalidWeight {
                tile: tile.name.clone(),
                weight: tile.weight,
            });
        }
        if !tile.cost.is_finite() || tile.cost < 0.0 {
            return Err(CatalogError::InvalidCost {
                tile: tile.name.clone(),
                cost: tile.cost,
            });
        }
        for edge in &tile.edges {
            if let Some(id) = &edge.edge_type {
                if self.edge_type(id).is_none() {
                    return Err(CatalogError::UnknownEdgeType {
                        tile: tile.name.clone(),
                        edge_type: id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn edge_types(&self) -> &[EdgePrototype] {
        &self.edge_types
    }

    pub fn tiles(&self) -> &[TilePrototype] {
        &self.tiles
    }

    pub fn tile(&self, id: PrototypeId) -> Option<&TilePrototype> {
        self.tiles.get(id.0)
    }

    pub fn edge_type(&self, id: &str) -> Option<&EdgePrototype> {
        self.edge_types.iter().find(|e| e.id == id)
    }

    /// Symmetry flag of an edge type, `None` if the id is unknown.
    pub fn is_symmetrical(&self, id: &str) -> Option<bool> {
        self.edge_type(id).map(|e| e.symmetrical)
    }

    pub fn add_edge_type(&mut self, edge_type: EdgePrototype) -> Result<(), CatalogError> {
        if self.edge_type(&edge_type.id).is_some() {
            return Err(CatalogError::DuplicateEdgeType(edge_type.id));
        }
        debug!("Adding edge type '{}'", edge_type.id);
        self.edge_types.push(edge_type);
        Ok(())
    }

    /// Replace an edge type. A changed id is renamed on every tile side
    /// that referenced the old one.
    pub fn edit_edge_type(
        &mut self,
        existing_id: &str,
        edge_type: EdgePrototype,
    ) -> Result<(), CatalogError> {
        let index = self
            .edge_types
            .iter()
            .position(|e| e.id == existing_id)
            .ok_or_else(|| CatalogError::MissingEdgeType(existing_id.to_string()))?;

        if edge_type.id != existing_id && self.edge_type(&edge_type.id).is_some() {
            return Err(CatalogError::DuplicateEdgeType(edge_type.id));
        }

        if edge_type.id != existing_id {
            let mut renamed = 0;
            for tile in &mut self.tiles {
                for edge in &mut tile.edges {
                    if edge.edge_type.as_deref() == Some(existing_id) {
                        edge.edge_type = Some(edge_type.id.clone());
                        renamed += 1;
                    }
                }
            }
            info!(
                "Renamed edge type '{}' to '{}' on {} tile sides",
                existing_id, edge_type.id, renamed
            );
        }

        self.edge_types[index] = edge_type;
        Ok(())
    }

    /// Remove an edge type. Tile sides that used it become unassigned.
    pub fn remove_edge_type(&mut self, id: &str) -> Result<EdgePrototype, CatalogError> {
        let index = self
            .edge_types
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| CatalogError::MissingEdgeType(id.to_string()))?;

        for tile in &mut self.tiles {
            for edge in &mut tile.edges {
                if edge.edge_type.as_deref() == Some(id) {
                    *edge = EdgeAssignment::unassigned();
                }
            }
        }
        debug!("Removed edge type '{}'", id);
        Ok(self.edge_types.remove(index))
    }

    /// Assign an edge type (or clear it with `None`) on one side of a tile.
    pub fn assign_edge(
        &mut self,
        tile: PrototypeId,
        direction: Direction,
        edge_type: Option<&str>,
        reversed: bool,
    ) -> Result<(), CatalogError> {
        if let Some(id) = edge_type {
            if self.edge_type(id).is_none() {
                let name = self
                    .tile(tile)
                    .map(|t| t.name.clone())
                    .ok_or(CatalogError::UnknownTile(tile.0))?;
                return Err(CatalogError::UnknownEdgeType {
                    tile: name,
                    edge_type: id.to_string(),
                });
            }
        }
        let prototype = self
            .tiles
            .get_mut(tile.0)
            .ok_or(CatalogError::UnknownTile(tile.0))?;
        prototype.edges[direction.index()] = EdgeAssignment {
            edge_type: edge_type.map(str::to_string),
            reversed,
        };
        Ok(())
    }

    pub fn set_weight(&mut self, tile: PrototypeId, weight: u32) -> Result<(), CatalogError> {
        let prototype = self
            .tiles
            .get_mut(tile.0)
            .ok_or(CatalogError::UnknownTile(tile.0))?;
        if weight == 0 {
            return Err(CatalogError::InvalidWeight {
                tile: prototype.name.clone(),
                weight,
            });
        }
        prototype.weight = weight;
        Ok(())
    }
}

/// Anything that can produce a validated catalog.
pub trait CatalogSource {
    fn load_catalog(&self) -> Result<Catalog, CatalogError>;
}

impl CatalogSource for Catalog {
    fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        Ok(self.clone())
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    edge_types: Vec<EdgePrototype>,
    tiles: Vec<TileRecord>,
}

#[derive(Debug, Deserialize)]
struct TileRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default = "default_weight")]
    weight: u32,
    #[serde(default)]
    cost: f64,
    edges: [Option<EdgeAssignment>; 4],
}

fn default_weight() -> u32 {
    1
}

/// Catalog stored as a JSON document.
///
/// ```json
/// {
///   "edge_types": [{ "id": "road", "color": "#808080", "symmetrical": true }],
///   "tiles": [
///     { "name": "straight", "weight": 4, "cost": 0.0,
///       "edges": [{ "type_id": "road" }, null, { "type_id": "road" }, null] }
///   ]
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse a catalog from JSON text.
    pub fn parse(json: &str) -> Result<Catalog, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let tiles = file
            .tiles
            .into_iter()
            .enumerate()
            .map(|(i, record)| TilePrototype {
                name: record.name.unwrap_or_else(|| format!("tile_{}", i)),
                weight: record.weight,
                cost: record.cost,
                edges: record.edges.map(Option::unwrap_or_default),
            })
            .collect();
        Catalog::new(file.edge_types, tiles)
    }
}

impl CatalogSource for JsonCatalog {
    fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        let json = std::fs::read_to_string(&self.path)?;
        let catalog = Self::parse(&json)?;
        info!(
            "Loaded catalog {:?}: {} edge types, {} tiles",
            self.path,
            catalog.edge_types().len(),
            catalog.tiles().len()
        );
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn road_catalog() -> Catalog {
        let road = EdgeAssignment::typed("road");
        let grass = EdgeAssignment::typed("grass");
        Catalog::new(
            vec![
                EdgePrototype::new("road", "gray", true),
                EdgePrototype::new("grass", "green", true),
            ],
            vec![
                TilePrototype::new(
                    "straight",
                    2,
                    [road.clone(), grass.clone(), road.clone(), grass.clone()],
                ),
                TilePrototype::uniform("field", 5, grass),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_unknown_edge_type_rejected() {
        let result = Catalog::new(
            vec![EdgePrototype::symmetrical("road")],
            vec![TilePrototype::uniform("t", 1, EdgeAssignment::typed("river"))],
        );
        assert!(matches!(
            result,
            Err(CatalogError::UnknownEdgeType { ref edge_type, .. }) if edge_type == "river"
        ));
    }

    #[test]
    fn test_duplicate_edge_type_rejected() {
        let result = Catalog::new(
            vec![
                EdgePrototype::symmetrical("road"),
                EdgePrototype::asymmetrical("road"),
            ],
            vec![],
        );
        assert!(matches!(result, Err(CatalogError::DuplicateEdgeType(_))));
    }

    #[test]
    fn test_zero_weight_rejected() {
        let result = Catalog::new(
            vec![],
            vec![TilePrototype::uniform("t", 0, EdgeAssignment::unassigned())],
        );
        assert!(matches!(result, Err(CatalogError::InvalidWeight { .. })));
    }

    #[test]
    fn test_negative_cost_rejected() {
        let tile = TilePrototype::uniform("t", 1, EdgeAssignment::unassigned()).with_cost(-1.0);
        let result = Catalog::new(vec![], vec![tile]);
        assert!(matches!(result, Err(CatalogError::InvalidCost { .. })));
    }

    #[test]
    fn test_add_edge_type() {
        let mut catalog = road_catalog();
        catalog
            .add_edge_type(EdgePrototype::new("river", "blue", false))
            .unwrap();
        assert_eq!(catalog.edge_types().len(), 3);
        assert_eq!(catalog.is_symmetrical("river"), Some(false));
        catalog
            .assign_edge(PrototypeId(1), Direction::North, Some("river"), false)
            .unwrap();

        let result = catalog.add_edge_type(EdgePrototype::symmetrical("road"));
        assert!(matches!(
            result,
            Err(CatalogError::DuplicateEdgeType(ref id)) if id == "road"
        ));
        assert_eq!(catalog.edge_types().len(), 3);
    }

    #[test]
    fn test_edit_edge_type_cascades_rename() {
        let mut catalog = road_catalog();
        catalog
            .edit_edge_type("road", EdgePrototype::new("street", "black", false))
            .unwrap();

        assert!(catalog.edge_type("road").is_none());
        assert_eq!(catalog.is_symmetrical("street"), Some(false));
        let straight = &catalog.tiles()[0];
        let edge_type = |d: Direction| straight.edge(d).edge_type.as_deref();
        assert_eq!(edge_type(Direction::North), Some("street"));
        assert_eq!(edge_type(Direction::South), Some("street"));
        assert_eq!(edge_type(Direction::East), Some("grass"));
    }

    #[test]
    fn test_edit_edge_type_rejects_collision() {
        let mut catalog = road_catalog();
        let result = catalog.edit_edge_type("road", EdgePrototype::symmetrical("grass"));
        assert!(matches!(result, Err(CatalogError::DuplicateEdgeType(_))));
    }

    #[test]
    fn test_remove_edge_type_unassigns_sides() {
        let mut catalog = road_catalog();
        catalog.remove_edge_type("grass").unwrap();
        assert!(catalog.tiles()[1].is_blank());
        assert!(!catalog.tiles()[0].edge(Direction::East).is_assigned());
        assert!(catalog.tiles()[0].edge(Direction::North).is_assigned());
    }

    #[test]
    fn test_assign_edge_checks_type() {
        let mut catalog = road_catalog();
        catalog
            .assign_edge(PrototypeId(1), Direction::West, Some("road"), true)
            .unwrap();
        assert_eq!(
            catalog.tiles()[1].edge(Direction::West),
            &EdgeAssignment::reversed("road")
        );

        let result = catalog.assign_edge(PrototypeId(1), Direction::West, Some("river"), false);
        assert!(matches!(result, Err(CatalogError::UnknownEdgeType { .. })));

        let result = catalog.assign_edge(PrototypeId(9), Direction::West, None, false);
        assert!(matches!(result, Err(CatalogError::UnknownTile(9))));
    }

    #[test]
    fn test_set_weight() {
        let mut catalog = road_catalog();
        catalog.set_weight(PrototypeId(0), 7).unwrap();
        assert_eq!(catalog.tiles()[0].weight, 7);
        assert!(catalog.set_weight(PrototypeId(0), 0).is_err());
    }

    #[test]
    fn test_parse_json_catalog() {
        let json = r#"{
            "edge_types": [
                { "id": "road", "color": "gray", "symmetrical": true },
                { "id": "ramp", "color": "red", "symmetrical": false }
            ],
            "tiles": [
                { "name": "straight", "weight": 3, "cost": 1.5,
                  "edges": [{ "type_id": "road" }, null, { "type_id": "road" }, null] },
                { "edges": [{ "type_id": "ramp", "reversed": true }, null, null, null] }
            ]
        }"#;
        let catalog = JsonCatalog::parse(json).unwrap();
        assert_eq!(catalog.tiles().len(), 2);
        assert_eq!(catalog.tiles()[0].weight, 3);
        assert_eq!(catalog.tiles()[0].cost, 1.5);
        assert!(!catalog.tiles()[0].edge(Direction::East).is_assigned());
        assert_eq!(catalog.tiles()[1].name, "tile_1");
        assert_eq!(catalog.tiles()[1].weight, 1);
        assert_eq!(
            catalog.tiles()[1].edge(Direction::North),
            &EdgeAssignment::reversed("ramp")
        );
    }

    #[test]
    fn test_parse_json_unknown_type() {
        let json = r#"{ "edge_types": [], "tiles": [
            { "edges": [{ "type_id": "road" }, null, null, null] } ] }"#;
        assert!(matches!(
            JsonCatalog::parse(json),
            Err(CatalogError::UnknownEdgeType { .. })
        ));
    }

    #[test]
    fn test_parse_json_malformed() {
        assert!(matches!(
            JsonCatalog::parse("{ not json"),
            Err(CatalogError::Parse(_))
        ));
    }
}
