pub mod collab;
pub mod config;
pub mod ids;
pub mod plan;
pub mod profile;
pub mod regst;
pub mod task;
pub mod traits;

pub use config::{AvailableMemDesc, JobDescriptor};
pub use plan::{Plan, PlanIndex};
pub use regst::{MemCase, RegstDesc};
pub use task::{TaskProto, TaskType};
pub use traits::{ActEvent, ActivityGraph, IdentifierManager, PlanTaskGraph, PlanTaskGraphBuilder};

pub use regst_graph::{Error, Result};
