// Guide generation: prompt template, model reply repair, retrying request service.
// All provider calls go through llm_client::VisionModel.

pub mod handlers;
pub mod json_repair;
pub mod model;
pub mod prompts;
pub mod service;

pub use service::GuideService;
