// Analysis workflow: resolve a resume, fan out skill-gap + optimize, join,
// and publish the outcome. All service calls go through BackendGateway.

pub mod join;
pub mod orchestrator;
