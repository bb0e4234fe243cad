pub mod job;
pub mod report;
pub mod target;

pub use job::{Job, JobSeed, OperationType};
pub use report::{EngineReport, JobTiming, RunReport, VerifyReport};
pub use target::{PayloadKind, TargetItem};
