//! Scene graph and projection geometry for multi-point perspective grids.
//!
//! A scene is a tree of vanishing points, planes, spaces and groups drawn
//! through one or more projections. Points carry a 3D direction and the
//! canvas position their view derives from it; dragging a point re-derives
//! the direction, and compute nodes keep derived geometry in step.
//!
//! ```
//! use vanishing::{GraphRecord, SceneGraph};
//!
//! let record: GraphRecord = serde_json::from_str(r#"{
//!     "root": "scene",
//!     "nodes": [
//!         {"type": "Group", "id": "scene"},
//!         {"type": "RectilinearProjection", "id": "view", "left": [-100, 0], "right": [100, 0]},
//!         {"type": "VP", "id": "right", "direction": [1, 0, 1]}
//!     ],
//!     "edges": [
//!         {"src": "scene", "dst": "view"},
//!         {"src": "view", "dst": "right"},
//!         {"src": "right", "dst": "view", "type": "VIEW"}
//!     ]
//! }"#).unwrap();
//!
//! let mut graph = SceneGraph::new();
//! graph.initialize_from_structure(&record).unwrap();
//! let right = graph.node(graph.main_view().unwrap()).unwrap().children()[0];
//! let position = graph.node(right).unwrap().as_point().unwrap().position;
//! assert!((position.x - 100.0).abs() < 1e-9);
//! ```

pub mod defaults;
pub mod errors;
pub mod exchange;
pub mod geometry;
mod log;
pub mod projection;
pub mod scene;
pub mod types;

pub use defaults::GraphConfig;
pub use errors::{GraphError, Result};
pub use exchange::{EdgeRecord, GraphRecord, NodeRecord, RecordKey, VisualizationRecord};
pub use projection::{
    CurvilinearPerspective, HorizonLine, Line, PerspectiveLine, Project, Projection,
    ProjectionFrame, RectilinearProjection,
};
pub use scene::{
    ComputeFn, Node, NodeKind, PerspectiveGroup, PerspectiveSpace, Plane, SceneGraph,
    VanishingPoint, VisualizationData,
};
pub use types::{EdgeKind, NodeId, Relation, VpRole};
