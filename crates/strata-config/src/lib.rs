//! Strata Config
//!
//! This crate contains the serializable workflow configuration types for Strata.
//! These types describe a workflow before it is bound to task executors and
//! turned into a runnable graph.
//!
//! Configuration can be loaded from:
//! - JSON files (via the CLI, `strata run workflow.json`)
//! - Any other store that can hand back JSON blobs
//!
//! Binding task kinds to executors is the caller's concern; these types only
//! carry the task kind name and its parameters.

mod edge;
mod node;
mod settings;
mod workflow;

pub use edge::EdgeDef;
pub use node::NodeDef;
pub use settings::ExecutionSettings;
pub use workflow::WorkflowDef;
