//! Provisioning: task creation and dataset-bundle orchestration.
//!
//! - [`orchestrator`]: `Provisioner::create_task`, `Provisioner::provision_dataset_bundle`
//! - [`measures`]: measure text parsing

pub mod measures;
pub mod orchestrator;

pub use measures::parse_measures;
pub use orchestrator::Provisioner;
